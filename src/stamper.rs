// SPDX-License-Identifier: GPL-3.0-or-later
// notestamp - Apply timestamps to notes on create/modify

use crate::config::Config;
use crate::datefmt::format_date;
use crate::frontmatter::{add_frontmatter, update_modified_time};
use crate::ignore::{vault_path, IgnoreRules};
use crate::storage::Storage;
use anyhow::Result;
use chrono::{Local, NaiveDateTime};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use walkdir::WalkDir;

/// What a create/modify call did to the note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Path matched an ignore pattern.
    Ignored,
    /// Nothing to change; no write.
    Unchanged,
    Written,
    /// Event caused by our own previous write.
    Suppressed,
}

/// Totals for a vault scan.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanReport {
    pub stamped: Vec<PathBuf>,
    pub unchanged: usize,
    pub ignored: usize,
    pub failed: usize,
}

/// Applies frontmatter timestamps to notes under one vault root.
///
/// Text written by the stamper is remembered per path until the file holds
/// something else, so the modify events caused by that write are dropped
/// without touching other files.
pub struct Stamper<S: Storage> {
    storage: S,
    root: PathBuf,
    config: Config,
    ignore: IgnoreRules,
    create_delay: Duration,
    clock: fn() -> NaiveDateTime,
    in_flight: HashMap<PathBuf, String>,
}

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

impl<S: Storage> Stamper<S> {
    /// `root` is canonicalized when it exists, so it lines up with the
    /// absolute paths the watcher reports.
    pub fn new(storage: S, root: impl Into<PathBuf>, config: Config) -> Result<Self> {
        let root = root.into();
        let root = fs::canonicalize(&root).unwrap_or(root);
        let ignore = config.ignore_rules()?;
        let create_delay = Duration::from_millis(config.create_delay_ms);
        Ok(Self {
            storage,
            root,
            config,
            ignore,
            create_delay,
            clock: local_now,
            in_flight: HashMap::new(),
        })
    }

    pub fn with_create_delay(mut self, delay: Duration) -> Self {
        self.create_delay = delay;
        self
    }

    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn timestamp(&self) -> String {
        format_date(&(self.clock)(), &self.config.date_format)
    }

    pub fn is_ignored(&self, path: &Path) -> bool {
        self.ignore.is_ignored(&vault_path(&self.root, path))
    }

    /// A note was created: add both keys, synthesising a block if needed.
    pub fn on_create(&mut self, path: &Path) -> Result<Outcome> {
        if self.is_ignored(path) {
            log::debug!("Ignoring {}", path.display());
            return Ok(Outcome::Ignored);
        }
        if !self.create_delay.is_zero() {
            thread::sleep(self.create_delay);
        }
        let text = self.storage.read(path)?;
        let now = self.timestamp();
        let updated = add_frontmatter(
            &text,
            &now,
            &now,
            &self.config.created_key,
            &self.config.modified_key,
        );
        self.commit(path, &text, updated)
    }

    /// A note was modified: refresh the modified key of an existing block.
    pub fn on_modify(&mut self, path: &Path) -> Result<Outcome> {
        if self.is_ignored(path) {
            log::debug!("Ignoring {}", path.display());
            return Ok(Outcome::Ignored);
        }
        let text = self.storage.read(path)?;
        if let Some(written) = self.in_flight.get(path) {
            if *written == text {
                log::debug!("Skipping own write to {}", path.display());
                return Ok(Outcome::Suppressed);
            }
            self.in_flight.remove(path);
        }
        let now = self.timestamp();
        let updated = update_modified_time(
            &text,
            &now,
            &self.config.created_key,
            &self.config.modified_key,
        );
        self.commit(path, &text, updated)
    }

    /// Drop any in-flight marker for a path that went away.
    pub fn forget(&mut self, path: &Path) {
        self.in_flight.remove(path);
    }

    #[cfg(test)]
    pub fn in_flight(&self, path: &Path) -> bool {
        self.in_flight.contains_key(path)
    }

    fn commit(&mut self, path: &Path, before: &str, after: String) -> Result<Outcome> {
        if after == before {
            return Ok(Outcome::Unchanged);
        }
        self.storage.write(path, &after)?;
        log::info!("Stamped {}", vault_path(&self.root, path));
        self.in_flight.insert(path.to_path_buf(), after);
        Ok(Outcome::Written)
    }

    /// Add missing timestamps to every note under `dir`. Hidden directories
    /// are skipped. Per-file failures are counted and logged, not returned.
    pub fn scan(&mut self, dir: &Path, dry_run: bool) -> Result<ScanReport> {
        let mut report = ScanReport::default();
        let now = self.timestamp();
        let dir = fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf());

        let walker = WalkDir::new(&dir)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()));
        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(err) => {
                    log::warn!("Skipping unreadable entry: {}", err);
                    report.failed += 1;
                    continue;
                }
            };
            let path = entry.path();
            if !entry.file_type().is_file() || !self.config.is_note(path) {
                continue;
            }
            if self.is_ignored(path) {
                report.ignored += 1;
                continue;
            }
            let text = match self.storage.read(path) {
                Ok(t) => t,
                Err(err) => {
                    log::error!("{:#}", err);
                    report.failed += 1;
                    continue;
                }
            };
            let updated = add_frontmatter(
                &text,
                &now,
                &now,
                &self.config.created_key,
                &self.config.modified_key,
            );
            if updated == text {
                report.unchanged += 1;
                continue;
            }
            if !dry_run {
                if let Err(err) = self.storage.write(path, &updated) {
                    log::error!("{:#}", err);
                    report.failed += 1;
                    continue;
                }
                log::info!("Stamped {}", vault_path(&self.root, path));
            }
            report.stamped.push(path.to_path_buf());
        }
        Ok(report)
    }
}

pub fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|s| s.starts_with('.'))
}
