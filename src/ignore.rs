// SPDX-License-Identifier: GPL-3.0-or-later
// notestamp - Ignore patterns for vault paths

use regex::RegexSet;
use std::path::Path;

/// Compiled ignore patterns. A path is ignored when any pattern matches
/// anywhere in it.
#[derive(Debug, Clone)]
pub struct IgnoreRules {
    set: RegexSet,
}

impl IgnoreRules {
    pub fn new<I, S>(patterns: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self {
            set: RegexSet::new(patterns)?,
        })
    }

    pub fn is_ignored(&self, path: &str) -> bool {
        self.set.is_match(path)
    }
}

/// Test `path` against `patterns`, compiling them on the spot.
pub fn should_ignore<S: AsRef<str>>(path: &str, patterns: &[S]) -> Result<bool, regex::Error> {
    Ok(IgnoreRules::new(patterns)?.is_ignored(path))
}

/// Vault-relative path with `/` separators, the form ignore patterns are
/// written against. Paths outside `root` are returned whole.
pub fn vault_path(root: &Path, path: &Path) -> String {
    let Ok(rel) = path.strip_prefix(root) else {
        return path.to_string_lossy().into_owned();
    };
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
