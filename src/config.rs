// SPDX-License-Identifier: GPL-3.0-or-later
// notestamp - Stamp markdown notes with frontmatter timestamps

use crate::ignore::IgnoreRules;
use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that points at an alternative config.toml.
pub const CONFIG_ENV: &str = "NOTESTAMP_CONFIG";

/// Settings from config.toml. Missing fields fall back to defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Vault root watched and scanned when no directory is given.
    pub notes_directory: String,
    /// Timestamp template: yyyy, MM, dd, HH, mm, ss.
    pub date_format: String,
    pub created_key: String,
    pub modified_key: String,
    /// Regexes tested against vault-relative paths.
    pub ignore_patterns: Vec<String>,
    /// Note extensions, without the dot.
    pub extensions: Vec<String>,
    /// Wait after a create event before reading the new file.
    pub create_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            notes_directory: "~/Documents/Notes".to_string(),
            date_format: "yyyy-MM-ddTHH:mm:ss".to_string(),
            created_key: "created".to_string(),
            modified_key: "modified".to_string(),
            ignore_patterns: Vec::new(),
            extensions: vec!["md".to_string()],
            create_delay_ms: 100,
        }
    }
}

impl Config {
    /// Check keys and compile ignore patterns.
    pub fn validate(&self) -> Result<()> {
        check_key("created_key", &self.created_key)?;
        check_key("modified_key", &self.modified_key)?;
        if self.created_key == self.modified_key {
            bail!("created_key and modified_key must differ");
        }
        self.ignore_rules()?;
        Ok(())
    }

    pub fn ignore_rules(&self) -> Result<IgnoreRules> {
        IgnoreRules::new(&self.ignore_patterns).context("Invalid ignore pattern")
    }

    pub fn notes_dir(&self) -> PathBuf {
        expand_path(&self.notes_directory)
    }

    /// True if `path` has one of the configured note extensions.
    pub fn is_note(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }

    /// Set a scalar field by its config.toml name.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut next = self.clone();
        match key {
            "notes_directory" => next.notes_directory = value.to_string(),
            "date_format" => next.date_format = value.to_string(),
            "created_key" => next.created_key = value.trim().to_string(),
            "modified_key" => next.modified_key = value.trim().to_string(),
            "create_delay_ms" => {
                next.create_delay_ms = value
                    .trim()
                    .parse()
                    .with_context(|| format!("create_delay_ms must be a number, got {:?}", value))?
            }
            "extensions" => {
                next.extensions = value
                    .split(',')
                    .map(|e| e.trim().trim_start_matches('.').to_string())
                    .filter(|e| !e.is_empty())
                    .collect()
            }
            _ => bail!("Unknown setting: {}", key),
        }
        next.validate()?;
        *self = next;
        Ok(())
    }

    pub fn add_ignore_pattern(&mut self, pattern: &str) -> Result<bool> {
        IgnoreRules::new([pattern])
            .with_context(|| format!("Invalid ignore pattern: {}", pattern))?;
        if self.ignore_patterns.iter().any(|p| p == pattern) {
            return Ok(false);
        }
        self.ignore_patterns.push(pattern.to_string());
        Ok(true)
    }

    pub fn remove_ignore_pattern(&mut self, pattern: &str) -> bool {
        let before = self.ignore_patterns.len();
        self.ignore_patterns.retain(|p| p != pattern);
        self.ignore_patterns.len() != before
    }
}

fn check_key(name: &str, key: &str) -> Result<()> {
    if key.is_empty() {
        bail!("{} must not be empty", name);
    }
    if key.contains(':') || key.contains('\n') || key.starts_with(char::is_whitespace) {
        bail!("{} must be a plain frontmatter key, got {:?}", name, key);
    }
    Ok(())
}

/// Returns the path to config.toml: explicit path, then $NOTESTAMP_CONFIG,
/// then the XDG config directory.
pub fn config_file_path(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        if !path.trim().is_empty() {
            return Ok(expand_path(&path));
        }
    }
    let dir = ensure_config_dir()?;
    Ok(dir.join("config.toml"))
}

/// Returns the notestamp config directory (~/.config/notestamp).
/// Creates it if it does not exist.
pub fn ensure_config_dir() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "notestamp")
        .context("Could not determine XDG config directory")?;
    let config_dir = dirs.config_dir().to_path_buf();
    fs::create_dir_all(&config_dir)
        .with_context(|| format!("Failed to create config directory: {}", config_dir.display()))?;
    Ok(config_dir)
}

/// Load config from `path`. Creates a commented default file if missing.
pub fn load_config(path: &Path) -> Result<Config> {
    let config = if path.exists() {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?
    } else {
        let default = Config::default();
        ensure_parent(path)?;
        fs::write(path, generate_default_config(&default))
            .with_context(|| format!("Failed to write default config: {}", path.display()))?;
        log::info!("Wrote default config to {}", path.display());
        default
    };

    config
        .validate()
        .with_context(|| format!("Invalid config: {}", path.display()))?;
    Ok(config)
}

/// Persist `config` to `path`.
pub fn save_config(path: &Path, config: &Config) -> Result<()> {
    let body = toml::to_string_pretty(config).context("Failed to serialize config")?;
    ensure_parent(path)?;
    fs::write(path, format!("# notestamp configuration\n\n{}", body))
        .with_context(|| format!("Failed to write config: {}", path.display()))?;
    log::debug!("Saved config to {}", path.display());
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
    }
    Ok(())
}

fn generate_default_config(config: &Config) -> String {
    format!(
        r#"# notestamp configuration

# Vault watched by `notestamp watch` and scanned by `notestamp scan`
notes_directory = {}

# Timestamp template. Placeholders: yyyy MM dd HH mm ss (first occurrence each)
date_format = {}

# Frontmatter keys written to each note
created_key = {}
modified_key = {}

# Regular expressions matched anywhere in the vault-relative path,
# e.g. ["^templates/", "\\.excalidraw\\.md$"]
ignore_patterns = []

# Files with these extensions are stamped
extensions = ["md"]

# Milliseconds to wait after a file is created before reading it
create_delay_ms = {}
"#,
        toml_str(&config.notes_directory),
        toml_str(&config.date_format),
        toml_str(&config.created_key),
        toml_str(&config.modified_key),
        config.create_delay_ms,
    )
}

/// Quoted and escaped TOML string.
fn toml_str(value: &str) -> String {
    toml::Value::String(value.to_string()).to_string()
}

/// Resolves ~ in paths to the user's home directory.
pub fn expand_path(path: &str) -> PathBuf {
    let path = path.trim();
    if path.starts_with("~/") || path == "~" {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/".to_string());
        PathBuf::from(path.replacen('~', &home, 1))
    } else {
        PathBuf::from(path)
    }
}
