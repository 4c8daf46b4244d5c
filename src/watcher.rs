// SPDX-License-Identifier: GPL-3.0-or-later
// notestamp - Vault watcher: filesystem events to stamper calls

use crate::config::Config;
use crate::stamper::{is_hidden, Outcome, Stamper};
use crate::storage::Storage;
use anyhow::{Context, Result};
use notify::event::{CreateKind, ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Component, Path, PathBuf};
use std::sync::mpsc;

/// Note lifecycle event derived from a raw filesystem event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteEvent {
    Created(PathBuf),
    Modified(PathBuf),
    Removed(PathBuf),
}

/// Map a filesystem event to note events. Only notes (by extension) outside
/// hidden directories count. Metadata changes and rename targets are
/// dropped; a rename source counts as a removal.
pub fn classify(event: &Event, root: &Path, config: &Config) -> Vec<NoteEvent> {
    let make: fn(PathBuf) -> NoteEvent = match event.kind {
        EventKind::Create(CreateKind::File | CreateKind::Any) => NoteEvent::Created,
        EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Any | ModifyKind::Other) => {
            NoteEvent::Modified
        }
        EventKind::Remove(_)
        | EventKind::Modify(ModifyKind::Name(RenameMode::From | RenameMode::Both)) => {
            NoteEvent::Removed
        }
        _ => return Vec::new(),
    };
    event
        .paths
        .iter()
        .filter(|p| config.is_note(p) && !in_hidden_dir(root, p))
        .map(|p| make(p.clone()))
        .collect()
}

fn in_hidden_dir(root: &Path, path: &Path) -> bool {
    let Ok(rel) = path.strip_prefix(root) else {
        return path.file_name().is_some_and(is_hidden);
    };
    rel.components().any(|c| match c {
        Component::Normal(name) => is_hidden(name),
        _ => false,
    })
}

/// Hand one note event to the stamper. Failures are logged and dropped.
pub fn dispatch<S: Storage>(stamper: &mut Stamper<S>, event: NoteEvent) {
    let result = match &event {
        NoteEvent::Created(path) if path.is_file() => stamper.on_create(path),
        NoteEvent::Modified(path) if path.is_file() => stamper.on_modify(path),
        NoteEvent::Removed(path) => {
            stamper.forget(path);
            return;
        }
        _ => return,
    };
    match result {
        Ok(Outcome::Written) | Ok(Outcome::Unchanged) => {}
        Ok(outcome) => log::debug!("{:?}: {:?}", event, outcome),
        Err(err) => log::error!("{:#}", err),
    }
}

/// Watch the stamper's root until the event channel closes.
pub fn watch<S: Storage>(stamper: &mut Stamper<S>) -> Result<()> {
    let root = stamper.root().to_path_buf();
    let (tx, rx) = mpsc::channel::<notify::Result<Event>>();
    let mut watcher = RecommendedWatcher::new(tx, notify::Config::default())
        .context("Failed to start file watcher")?;
    watcher
        .watch(&root, RecursiveMode::Recursive)
        .with_context(|| format!("Failed to watch {}", root.display()))?;
    log::info!("Watching {}", root.display());

    for res in rx {
        match res {
            Ok(event) => {
                for note_event in classify(&event, &root, stamper.config()) {
                    dispatch(stamper, note_event);
                }
            }
            Err(err) => log::error!("Watch error: {}", err),
        }
    }
    Ok(())
}
