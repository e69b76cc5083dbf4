//! Session lifecycle module.
//!
//! This module provides the session state machine, id generation, the
//! storage handler contract, and the in-process reference backend.

mod data;
mod handler;
mod id;
mod lifecycle;
mod memory;
mod options;
mod status;

pub use data::SessionData;
pub use handler::{CreateId, SessionHandler, ValidateId};
pub use id::{EntropySource, OsEntropy, SessionIdManager};
pub use lifecycle::Session;
pub use memory::MemoryHandler;
pub use options::SessionOptions;
pub use status::SessionStatus;
