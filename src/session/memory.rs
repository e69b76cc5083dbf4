//! In-process session storage.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::session::handler::{SessionHandler, ValidateId};

/// A stored payload and the time it was last written.
#[derive(Debug, Clone)]
struct Entry {
    payload: String,
    written_at: Instant,
}

/// In-process [`SessionHandler`] keeping payloads in a shared map.
///
/// Clones share the same underlying store, so one instance can be handed to a
/// [`Session`](crate::Session) while a clone stays behind to observe what was
/// committed, or to seed a second session. Entries carry their last write
/// time; [`gc`](SessionHandler::gc) purges entries that have outlived the
/// given lifetime.
#[derive(Debug, Clone, Default)]
pub struct MemoryHandler {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
}

impl MemoryHandler {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions.
    pub fn count(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    /// Check whether a session is stored under an id.
    pub fn contains(&self, id: &str) -> bool {
        self.entries
            .lock()
            .map(|entries| entries.contains_key(id))
            .unwrap_or(false)
    }
}

impl SessionHandler for MemoryHandler {
    fn open(&mut self, _save_path: &str, _name: &str) -> bool {
        true
    }

    fn read(&mut self, id: &str) -> String {
        self.entries
            .lock()
            .ok()
            .and_then(|entries| entries.get(id).map(|entry| entry.payload.clone()))
            .unwrap_or_default()
    }

    fn write(&mut self, id: &str, payload: &str) -> bool {
        match self.entries.lock() {
            Ok(mut entries) => {
                entries.insert(
                    id.to_string(),
                    Entry {
                        payload: payload.to_string(),
                        written_at: Instant::now(),
                    },
                );
                true
            }
            Err(_) => false,
        }
    }

    fn close(&mut self) -> bool {
        true
    }

    fn destroy(&mut self, id: &str) -> bool {
        match self.entries.lock() {
            Ok(mut entries) => {
                entries.remove(id);
                true
            }
            Err(_) => false,
        }
    }

    fn gc(&mut self, max_lifetime: u64) -> usize {
        let lifetime = Duration::from_secs(max_lifetime);
        match self.entries.lock() {
            Ok(mut entries) => {
                let before = entries.len();
                entries.retain(|_, entry| entry.written_at.elapsed() < lifetime);
                before - entries.len()
            }
            Err(_) => 0,
        }
    }

    fn id_validator(&mut self) -> Option<&mut dyn ValidateId> {
        Some(self)
    }
}

impl ValidateId for MemoryHandler {
    fn validate_id(&mut self, id: &str) -> bool {
        self.contains(id)
    }
}
