// SPDX-License-Identifier: GPL-3.0-or-later
// notestamp - Stamp markdown notes with frontmatter timestamps

mod config;
mod datefmt;
mod frontmatter;
mod ignore;
mod stamper;
mod storage;
mod watcher;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use config::{config_file_path, load_config, save_config, Config};
use stamper::{Outcome, Stamper};
use std::path::{Path, PathBuf};
use std::time::Duration;
use storage::FsStorage;

#[derive(Parser, Debug)]
#[command(name = "notestamp")]
#[command(author = "Notestamp Contributors")]
#[command(version)]
#[command(about = "Keep created/modified timestamps in markdown frontmatter")]
struct CliArgs {
    /// Config file (default: $NOTESTAMP_CONFIG or ~/.config/notestamp/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Watch a vault and stamp notes as they are created and edited
    Watch {
        /// Vault directory (default: notes_directory from config)
        dir: Option<PathBuf>,
    },
    /// Add missing created/modified keys to notes, as on creation
    Stamp {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Refresh the modified key of notes that have frontmatter
    Touch {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Stamp every note in a vault that lacks timestamps
    Scan {
        /// Vault directory (default: notes_directory from config)
        dir: Option<PathBuf>,
        /// Only list the notes that would change
        #[arg(long)]
        dry_run: bool,
    },
    /// Report whether a vault-relative path matches an ignore pattern
    Check { path: String },
    /// Print the current timestamp
    Date {
        /// Template instead of date_format from config
        #[arg(long)]
        format: Option<String>,
    },
    /// Show or change settings
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Print the config file location
    Path,
    /// Print the effective settings
    Show,
    /// Change a setting and save it
    Set { key: String, value: String },
    /// Manage ignore patterns
    #[command(subcommand)]
    Ignore(IgnoreCommand),
}

#[derive(Subcommand, Debug)]
enum IgnoreCommand {
    List,
    Add { pattern: String },
    Remove { pattern: String },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = CliArgs::parse();
    let config_path = config_file_path(args.config.as_deref())?;

    match args.command {
        Command::Config(cmd) => run_config(cmd, &config_path),
        Command::Watch { dir } => watch(dir, load_config(&config_path)?),
        Command::Stamp { files } => stamp(files, load_config(&config_path)?),
        Command::Touch { files } => touch(files, load_config(&config_path)?),
        Command::Scan { dir, dry_run } => scan(dir, dry_run, load_config(&config_path)?),
        Command::Check { path } => {
            let config = load_config(&config_path)?;
            let path = path.replace('\\', "/");
            if ignore::should_ignore(&path, &config.ignore_patterns)? {
                println!("ignored {}", path);
            } else {
                println!("stamped {}", path);
            }
            Ok(())
        }
        Command::Date { format } => {
            let config = load_config(&config_path)?;
            println!("{}", datefmt::now(&format.unwrap_or(config.date_format)));
            Ok(())
        }
    }
}

fn watch(dir: Option<PathBuf>, config: Config) -> Result<()> {
    let root = vault_root(dir, &config)?;
    let mut stamper = Stamper::new(FsStorage, root, config)?;
    watcher::watch(&mut stamper)
}

fn stamp(files: Vec<PathBuf>, config: Config) -> Result<()> {
    let root = std::env::current_dir().context("Failed to read current directory")?;
    let mut stamper = Stamper::new(FsStorage, root, config)?.with_create_delay(Duration::ZERO);
    for file in files {
        let outcome = stamper.on_create(&file)?;
        report(&file, outcome);
    }
    Ok(())
}

fn touch(files: Vec<PathBuf>, config: Config) -> Result<()> {
    let root = std::env::current_dir().context("Failed to read current directory")?;
    let mut stamper = Stamper::new(FsStorage, root, config)?;
    for file in files {
        let outcome = stamper.on_modify(&file)?;
        report(&file, outcome);
    }
    Ok(())
}

fn scan(dir: Option<PathBuf>, dry_run: bool, config: Config) -> Result<()> {
    let root = vault_root(dir, &config)?;
    let mut stamper = Stamper::new(FsStorage, &root, config)?;
    let summary = stamper.scan(&root, dry_run)?;
    for path in &summary.stamped {
        println!("{}", ignore::vault_path(&root, path));
    }
    println!(
        "{} {}, {} unchanged, {} ignored, {} failed",
        summary.stamped.len(),
        if dry_run { "to stamp" } else { "stamped" },
        summary.unchanged,
        summary.ignored,
        summary.failed,
    );
    if summary.failed > 0 {
        bail!("{} notes could not be stamped", summary.failed);
    }
    Ok(())
}

fn run_config(cmd: ConfigCommand, path: &Path) -> Result<()> {
    let mut config = match cmd {
        ConfigCommand::Path => {
            println!("{}", path.display());
            return Ok(());
        }
        _ => load_config(path)?,
    };
    match cmd {
        ConfigCommand::Path => {}
        ConfigCommand::Show => {
            print!("{}", toml::to_string_pretty(&config).context("Failed to serialize config")?);
        }
        ConfigCommand::Set { key, value } => {
            config.set(&key, &value)?;
            save_config(path, &config)?;
        }
        ConfigCommand::Ignore(IgnoreCommand::List) => {
            for pattern in &config.ignore_patterns {
                println!("{}", pattern);
            }
        }
        ConfigCommand::Ignore(IgnoreCommand::Add { pattern }) => {
            if config.add_ignore_pattern(&pattern)? {
                save_config(path, &config)?;
            } else {
                log::warn!("Pattern already present: {}", pattern);
            }
        }
        ConfigCommand::Ignore(IgnoreCommand::Remove { pattern }) => {
            if !config.remove_ignore_pattern(&pattern) {
                bail!("No such ignore pattern: {}", pattern);
            }
            save_config(path, &config)?;
        }
    }
    Ok(())
}

fn vault_root(dir: Option<PathBuf>, config: &Config) -> Result<PathBuf> {
    let root = dir.unwrap_or_else(|| config.notes_dir());
    if !root.is_dir() {
        bail!("Not a directory: {}", root.display());
    }
    std::fs::canonicalize(&root).with_context(|| format!("Failed to resolve {}", root.display()))
}

fn report(path: &Path, outcome: Outcome) {
    match outcome {
        Outcome::Written => println!("stamped {}", path.display()),
        Outcome::Unchanged => println!("unchanged {}", path.display()),
        Outcome::Ignored => println!("ignored {}", path.display()),
        Outcome::Suppressed => {}
    }
}
