//! JSON-lines file store.
//!
//! One serialized `Event` per line, appended and flushed on every write.
//! Existing lines are loaded when the file is opened so a recorder can resume
//! the chain from the stored tail.  Lines are never rewritten; a failed
//! append is truncated away so the file only ever holds whole, committed
//! events.

use std::{
    fs::{self, File, OpenOptions},
    io::{self, BufRead, BufReader, Write},
    path::{Path, PathBuf},
};

use tracing::{debug, info, warn};

use folio_contracts::{
    error::{FolioError, FolioResult},
    event::Event,
};

use crate::store::EventStore;

/// An append-only event store backed by a `.jsonl` file.
#[derive(Debug)]
pub struct JsonlEventStore {
    path: PathBuf,
    file: File,
    events: Vec<Event>,
    poisoned: bool,
}

impl JsonlEventStore {
    /// Open (or create) the log at `path` and load any events already in it.
    ///
    /// Returns `StoreReadFailed` if the file cannot be read or a line is not
    /// a valid event.  Integrity is *not* checked here; run the verifier on
    /// `events()` for that.
    pub fn open(path: impl AsRef<Path>) -> FolioResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| FolioError::StoreReadFailed {
                reason: format!("failed to create directory '{}': {}", parent.display(), e),
            })?;
        }

        let events = if path.exists() {
            load_events(&path)?
        } else {
            Vec::new()
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| FolioError::StoreReadFailed {
                reason: format!("failed to open event log '{}': {}", path.display(), e),
            })?;

        info!(path = %path.display(), event_count = events.len(), "opened event log");

        Ok(Self {
            path,
            file,
            events,
            poisoned: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn load_events(path: &Path) -> FolioResult<Vec<Event>> {
    let file = File::open(path).map_err(|e| FolioError::StoreReadFailed {
        reason: format!("failed to open event log '{}': {}", path.display(), e),
    })?;

    let mut events = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| FolioError::StoreReadFailed {
            reason: format!("failed to read line {}: {}", idx + 1, e),
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let event: Event = serde_json::from_str(&line).map_err(|e| FolioError::StoreReadFailed {
            reason: format!("failed to parse event at line {}: {}", idx + 1, e),
        })?;
        events.push(event);
    }
    Ok(events)
}

impl JsonlEventStore {
    /// Append `event`, using `write` to put its line on disk.
    ///
    /// If `write` fails, the file is truncated back to its length before the
    /// call, so a failed append leaves no partial or orphaned line behind.
    /// If even that truncation fails, the store refuses further appends
    /// until it is reopened.
    pub(crate) fn append_with<F>(&mut self, event: &Event, write: F) -> FolioResult<()>
    where
        F: FnOnce(&mut File, &str) -> io::Result<()>,
    {
        if self.poisoned {
            return Err(FolioError::StoreWriteFailed {
                reason: format!(
                    "'{}' may hold a partial write from an earlier failure; reopen the store",
                    self.path.display()
                ),
            });
        }

        let line = serde_json::to_string(event).map_err(|e| FolioError::StoreWriteFailed {
            reason: format!("failed to serialize event {}: {}", event.id, e),
        })?;
        let prev_len = self
            .file
            .metadata()
            .map_err(|e| FolioError::StoreWriteFailed {
                reason: format!("failed to stat '{}': {}", self.path.display(), e),
            })?
            .len();

        if let Err(e) = write(&mut self.file, &line) {
            let rollback = self
                .file
                .set_len(prev_len)
                .and_then(|_| self.file.sync_data());
            let reason = match rollback {
                Ok(()) => {
                    warn!(
                        event_id = %event.id,
                        path = %self.path.display(),
                        error = %e,
                        "append failed; log truncated back to {} bytes",
                        prev_len
                    );
                    format!("failed to write '{}': {}", self.path.display(), e)
                }
                Err(rollback_err) => {
                    self.poisoned = true;
                    format!(
                        "failed to write '{}': {}; truncating back to {} bytes also failed: {}",
                        self.path.display(),
                        e,
                        prev_len,
                        rollback_err
                    )
                }
            };
            return Err(FolioError::StoreWriteFailed { reason });
        }

        self.events.push(event.clone());
        debug!(event_id = %event.id, path = %self.path.display(), "event appended to log file");
        Ok(())
    }
}

fn write_line(file: &mut File, line: &str) -> io::Result<()> {
    writeln!(file, "{}", line)?;
    file.flush()?;
    file.sync_data()
}

impl EventStore for JsonlEventStore {
    fn append(&mut self, event: &Event) -> FolioResult<()> {
        self.append_with(event, write_line)
    }

    fn events(&self) -> &[Event] {
        &self.events
    }
}
