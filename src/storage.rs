// SPDX-License-Identifier: GPL-3.0-or-later
// notestamp - Note storage

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Where note text is read from and written back to.
pub trait Storage {
    fn read(&self, path: &Path) -> Result<String>;
    fn write(&self, path: &Path, text: &str) -> Result<()>;
}

/// Plain files on disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsStorage;

impl Storage for FsStorage {
    fn read(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).with_context(|| format!("Failed to read note: {}", path.display()))
    }

    fn write(&self, path: &Path, text: &str) -> Result<()> {
        fs::write(path, text).with_context(|| format!("Failed to write note: {}", path.display()))
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn fs_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.md");
        FsStorage.write(&path, "hello").unwrap();
        assert_eq!(FsStorage.read(&path).unwrap(), "hello");
    }

    #[test]
    fn missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        let err = FsStorage.read(&dir.path().join("missing.md")).unwrap_err();
        assert!(err.to_string().contains("Failed to read note"));
    }
}
