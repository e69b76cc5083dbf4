//! # session-kit
//!
//! Injectable session lifecycle with pluggable storage.
//!
//! A [`Session`] replaces a runtime's ambient, globally-scoped session
//! machinery with an explicit value: it owns its status, current id, payload
//! and options, and drives a caller-supplied [`SessionHandler`] through the
//! open/read/write/close protocol. Session ids come from a bit-packing
//! generator with collision avoidance against the store.
//!
//! ## Features
//!
//! - **Explicit lifecycle**: start, commit, destroy, abort, reset and
//!   regenerate are methods on an owned value, not process globals
//! - **Pluggable storage**: any backend implementing [`SessionHandler`],
//!   with optional id creation and validation capabilities
//! - **Collision-free ids**: entropy-driven generation retried against the
//!   store, plus strict-mode validation of externally supplied ids
//! - **Probabilistic gc**: per-start garbage collection with configurable
//!   odds and lifetime
//!
//! ## Quick Start
//!
//! ```
//! use session_kit::{MemoryHandler, Session};
//!
//! fn main() -> session_kit::Result<()> {
//!     // Initialize logging
//!     session_kit::logging::try_init().ok();
//!
//!     let store = MemoryHandler::new();
//!
//!     // First visit: start, stash a value, commit
//!     let mut session = Session::new(Box::new(store.clone()));
//!     session.start()?;
//!     if let Some(data) = session.data_mut() {
//!         data.set("user", "alice");
//!     }
//!     let id = session.id().to_string();
//!     session.commit();
//!
//!     // A later session presenting the same id sees the committed payload
//!     let mut session = Session::new(Box::new(store));
//!     session.set_id(id);
//!     session.start()?;
//!     assert_eq!(
//!         session.data().and_then(|data| data.get("user")),
//!         Some(&serde_json::json!("alice")),
//!     );
//!
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;
pub mod session;

// Re-export commonly used types
pub use error::{Result, SessionError};
pub use session::{
    CreateId, EntropySource, MemoryHandler, OsEntropy, Session, SessionData, SessionHandler,
    SessionIdManager, SessionOptions, SessionStatus, ValidateId,
};
