//! Session state machine.
//!
//! A [`Session`] owns its status, current id, payload and options, and
//! drives an injected [`SessionHandler`] through the open/read/write/close
//! protocol. Operations that require an active session fail with
//! [`SessionError::NotActive`] when called out of order; handler-level
//! failures come back as boolean results instead.

use std::fmt;
use std::mem;

use rand::Rng;
use tracing::{debug, warn};

use crate::error::{Result, SessionError};
use crate::session::data::SessionData;
use crate::session::handler::SessionHandler;
use crate::session::id::SessionIdManager;
use crate::session::options::SessionOptions;
use crate::session::status::SessionStatus;

/// An injectable session with explicit lifecycle state.
///
/// The session starts out inactive with an empty id. [`start`](Session::start)
/// opens the handler, resolves the id, reads stored data and moves the
/// session to [`SessionStatus::Active`]; [`commit`](Session::commit),
/// [`destroy`](Session::destroy) and [`abort`](Session::abort) move it back.
/// Options are read at the moment each operation needs them, so changes made
/// through [`options_mut`](Session::options_mut) between calls take effect
/// immediately.
pub struct Session {
    status: SessionStatus,
    id: String,
    handler: Box<dyn SessionHandler>,
    manager: Option<SessionIdManager>,
    data: Option<SessionData>,
    options: SessionOptions,
}

impl Session {
    /// Create an inactive session around a storage handler.
    pub fn new(handler: Box<dyn SessionHandler>) -> Self {
        Self::with_options(handler, SessionOptions::default())
    }

    /// Create an inactive session with explicit options.
    pub fn with_options(handler: Box<dyn SessionHandler>, options: SessionOptions) -> Self {
        Self {
            status: SessionStatus::None,
            id: String::new(),
            handler,
            manager: None,
            data: None,
            options,
        }
    }

    /// Current lifecycle status.
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Current session id, empty until one is set or generated.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Replace the session id, returning the previous one.
    ///
    /// An empty string means "unset" and cannot be stored; passing one
    /// leaves the id alone and returns the current value.
    pub fn set_id(&mut self, new: impl Into<String>) -> String {
        let new = new.into();
        if new.is_empty() {
            return self.id.clone();
        }
        mem::replace(&mut self.id, new)
    }

    /// Configured session name.
    pub fn name(&self) -> &str {
        &self.options.name
    }

    /// Replace the session name, returning the previous one.
    ///
    /// Empty names are ignored, as for [`set_id`](Session::set_id).
    pub fn set_name(&mut self, new: impl Into<String>) -> String {
        let new = new.into();
        if new.is_empty() {
            return self.options.name.clone();
        }
        mem::replace(&mut self.options.name, new)
    }

    /// Configured save path.
    pub fn save_path(&self) -> &str {
        &self.options.save_path
    }

    /// Replace the save path, returning the previous one.
    ///
    /// Empty paths are ignored, as for [`set_id`](Session::set_id).
    pub fn set_save_path(&mut self, new: impl Into<String>) -> String {
        let new = new.into();
        if new.is_empty() {
            return self.options.save_path.clone();
        }
        mem::replace(&mut self.options.save_path, new)
    }

    /// Borrow the session options.
    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Mutably borrow the session options.
    pub fn options_mut(&mut self) -> &mut SessionOptions {
        &mut self.options
    }

    /// Borrow the session payload, absent until a start has read it.
    pub fn data(&self) -> Option<&SessionData> {
        self.data.as_ref()
    }

    /// Mutably borrow the session payload, absent until a start has read it.
    pub fn data_mut(&mut self) -> Option<&mut SessionData> {
        self.data.as_mut()
    }

    /// Replace the storage handler.
    ///
    /// Only possible while the session is inactive; returns false and drops
    /// the replacement otherwise.
    pub fn set_save_handler(&mut self, handler: Box<dyn SessionHandler>) -> bool {
        if self.status.is_active() {
            return false;
        }
        self.handler = handler;
        true
    }

    /// Start the session.
    ///
    /// Opens the handler with the configured save path and name; a refusal
    /// yields `Ok(false)` with nothing else done. On success the session
    /// becomes active, the id is resolved (kept when already set and
    /// acceptable, freshly generated otherwise), stored data is read and the
    /// garbage collection chance is rolled. Returns
    /// [`SessionError::AlreadyStarted`] when the session is already active.
    pub fn start(&mut self) -> Result<bool> {
        if self.status.is_active() {
            return Err(SessionError::AlreadyStarted);
        }

        if !self.open() {
            debug!("handler refused to open, session stays inactive");
            return Ok(false);
        }

        // A missing id is always replaced; under strict mode an id that no
        // stored session answers to is replaced as well.
        let unset = self.id.is_empty();
        if unset || (self.options.use_strict_mode && !self.current_id_in_use()) {
            self.id = self.fresh_collision_free_id("");
        }

        self.read();

        if rand::rng().random::<f64>() < self.options.gc_chance() {
            // The session is active by this point, so gc cannot be a misuse.
            if let Ok(collected) = self.gc() {
                debug!(collected, "garbage collection pass");
            }
        }

        debug!(id = %self.id, "session started");
        Ok(true)
    }

    /// Build a session id with the given prefix without touching the session.
    ///
    /// While the session is active the id is checked against the store for
    /// collisions; while inactive there is no store context and the id comes
    /// back unchecked. The result takes effect only when passed to
    /// [`set_id`](Session::set_id). Returns
    /// [`SessionError::InvalidIdPrefix`] when the prefix contains characters
    /// other than alphanumerics, ',' and '-'.
    pub fn create_id(&mut self, prefix: &str) -> Result<String> {
        let allowed = prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == ',' || c == '-');
        if !allowed {
            return Err(SessionError::InvalidIdPrefix(prefix.to_string()));
        }

        if self.status.is_active() {
            Ok(self.fresh_collision_free_id(prefix))
        } else {
            Ok(self.fresh_id(prefix))
        }
    }

    /// Swap the current id for a freshly generated collision-free one.
    ///
    /// With `delete_old` the stored session under the old id is destroyed
    /// first; a destroy refusal yields `Ok(false)` with the id unchanged.
    /// Returns [`SessionError::NotActive`] when the session is inactive.
    pub fn regenerate_id(&mut self, delete_old: bool) -> Result<bool> {
        if !self.status.is_active() {
            return Err(SessionError::NotActive("regenerate session id"));
        }

        if delete_old && !self.handler.destroy(&self.id) {
            debug!(id = %self.id, "handler refused to destroy the old session");
            return Ok(false);
        }

        let previous = mem::take(&mut self.id);
        self.id = self.fresh_collision_free_id("");
        debug!(previous = %previous, id = %self.id, "regenerated session id");
        Ok(true)
    }

    /// Replace the payload with an empty one.
    ///
    /// Returns false without touching anything when the session is inactive.
    pub fn unset(&mut self) -> bool {
        if !self.status.is_active() {
            return false;
        }
        self.data = Some(SessionData::new());
        true
    }

    /// Close the session without writing.
    ///
    /// In-memory changes are discarded; the stored payload stays as it was.
    /// Returns the close result, or false when the session is inactive.
    pub fn abort(&mut self) -> bool {
        if !self.status.is_active() {
            return false;
        }
        debug!(id = %self.id, "session aborted without writing");
        self.close()
    }

    /// Throw away in-memory changes and re-read the stored payload.
    ///
    /// A no-op success when the session is inactive. While active the
    /// handler is re-opened first; a refusal yields false with the payload
    /// untouched.
    pub fn reset(&mut self) -> bool {
        if !self.status.is_active() {
            return true;
        }

        if !self.open() {
            return false;
        }

        self.read();
        true
    }

    /// Destroy the stored session and close the handler.
    ///
    /// A destroy refusal yields `Ok(false)` with the session left active and
    /// the handler still open. On success the close result is returned; the
    /// session goes inactive only when the close succeeds too. Returns
    /// [`SessionError::NotActive`] when the session is inactive.
    pub fn destroy(&mut self) -> Result<bool> {
        if !self.status.is_active() {
            return Err(SessionError::NotActive("destroy session"));
        }

        if !self.handler.destroy(&self.id) {
            debug!(id = %self.id, "handler refused to destroy the session");
            return Ok(false);
        }

        debug!(id = %self.id, "session destroyed");
        Ok(self.close())
    }

    /// Run garbage collection with the configured max lifetime.
    ///
    /// Returns the number of sessions the handler purged, or
    /// [`SessionError::NotActive`] when the session is inactive.
    pub fn gc(&mut self) -> Result<usize> {
        if !self.status.is_active() {
            return Err(SessionError::NotActive("collect expired sessions"));
        }
        Ok(self.handler.gc(self.options.gc_maxlifetime))
    }

    /// Alias for [`write_close`](Session::write_close).
    pub fn commit(&mut self) {
        self.write_close();
    }

    /// Write the payload and close the handler.
    ///
    /// A no-op when the session is inactive. Write and close failures are
    /// not surfaced; a failed write never blocks the close, and the session
    /// goes inactive whenever the close succeeds.
    pub fn write_close(&mut self) {
        if !self.status.is_active() {
            return;
        }
        let written = self.write();
        let closed = self.close();
        debug!(id = %self.id, written, closed, "session committed");
    }

    fn open(&mut self) -> bool {
        if self.handler.open(&self.options.save_path, &self.options.name) {
            self.status = SessionStatus::Active;
            return true;
        }
        false
    }

    fn close(&mut self) -> bool {
        if self.handler.close() {
            self.status = SessionStatus::None;
            return true;
        }
        false
    }

    fn read(&mut self) {
        let payload = self.handler.read(&self.id);
        let data = match SessionData::from_payload(&payload) {
            Ok(data) => data,
            Err(_) if payload.is_empty() => SessionData::new(),
            Err(error) => {
                warn!(id = %self.id, %error, "stored payload is malformed, session starts empty");
                SessionData::new()
            }
        };
        self.data = Some(data);
    }

    fn write(&mut self) -> bool {
        let payload = self.data.get_or_insert_with(SessionData::new).to_payload();
        self.handler.write(&self.id, &payload)
    }

    fn fresh_id(&mut self, prefix: &str) -> String {
        let manager = self.manager.get_or_insert_with(SessionIdManager::new);
        manager.generate(self.handler.as_mut(), &self.options, prefix)
    }

    fn fresh_collision_free_id(&mut self, prefix: &str) -> String {
        let manager = self.manager.get_or_insert_with(SessionIdManager::new);
        manager.generate_collision_free(self.handler.as_mut(), &self.options, prefix)
    }

    fn current_id_in_use(&mut self) -> bool {
        let manager = self.manager.get_or_insert_with(SessionIdManager::new);
        manager.is_valid(self.handler.as_mut(), &self.id)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("status", &self.status)
            .field("id", &self.id)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
