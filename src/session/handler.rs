//! Storage backend contract.
//!
//! A [`SessionHandler`] persists session payloads. The session core never
//! touches storage directly; it drives a handler through the six required
//! operations and probes for the two optional capabilities when generating
//! or validating ids.
//!
//! Operational failures are reported as `false` (or an empty read), not as
//! errors. The session core branches on them and degrades; it never retries
//! a failed handler call.

/// Storage backend for session payloads.
///
/// Implementations are driven strictly sequentially by a single
/// [`Session`](crate::Session): `open` first, then any number of
/// `read`/`write`/`destroy`/`gc` calls, then `close`.
pub trait SessionHandler: Send {
    /// Prepare the backend for the given save path and session name.
    ///
    /// Returns true when the backend is ready for reads and writes.
    fn open(&mut self, save_path: &str, name: &str) -> bool;

    /// Read the serialized payload stored under an id.
    ///
    /// Returns the empty string when no session exists under the id.
    fn read(&mut self, id: &str) -> String;

    /// Persist a serialized payload under an id.
    fn write(&mut self, id: &str, payload: &str) -> bool;

    /// Release the backend handle.
    fn close(&mut self) -> bool;

    /// Delete the session stored under an id.
    fn destroy(&mut self, id: &str) -> bool;

    /// Purge sessions older than `max_lifetime` seconds.
    ///
    /// Returns the number of sessions purged.
    fn gc(&mut self, max_lifetime: u64) -> usize;

    /// Probe for the custom id generation capability.
    ///
    /// Handlers that implement [`CreateId`] override this to return
    /// `Some(self)`; the default declines.
    fn id_creator(&mut self) -> Option<&mut dyn CreateId> {
        None
    }

    /// Probe for the custom id validation capability.
    ///
    /// Handlers that implement [`ValidateId`] override this to return
    /// `Some(self)`; the default declines.
    fn id_validator(&mut self) -> Option<&mut dyn ValidateId> {
        None
    }
}

/// Optional capability: the backend supplies its own session ids.
pub trait CreateId {
    /// Produce a new session id.
    fn create_id(&mut self) -> String;
}

/// Optional capability: the backend knows which ids denote live sessions.
///
/// When present this is preferred over probing with a read, which can be
/// expensive or imprecise for backends where an empty payload is a valid
/// stored state.
pub trait ValidateId {
    /// Check whether an id denotes an existing session.
    fn validate_id(&mut self, id: &str) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Plain;

    impl SessionHandler for Plain {
        fn open(&mut self, _save_path: &str, _name: &str) -> bool {
            true
        }
        fn read(&mut self, _id: &str) -> String {
            String::new()
        }
        fn write(&mut self, _id: &str, _payload: &str) -> bool {
            true
        }
        fn close(&mut self) -> bool {
            true
        }
        fn destroy(&mut self, _id: &str) -> bool {
            true
        }
        fn gc(&mut self, _max_lifetime: u64) -> usize {
            0
        }
    }

    struct Capable;

    impl SessionHandler for Capable {
        fn open(&mut self, _save_path: &str, _name: &str) -> bool {
            true
        }
        fn read(&mut self, _id: &str) -> String {
            String::new()
        }
        fn write(&mut self, _id: &str, _payload: &str) -> bool {
            true
        }
        fn close(&mut self) -> bool {
            true
        }
        fn destroy(&mut self, _id: &str) -> bool {
            true
        }
        fn gc(&mut self, _max_lifetime: u64) -> usize {
            0
        }
        fn id_creator(&mut self) -> Option<&mut dyn CreateId> {
            Some(self)
        }
        fn id_validator(&mut self) -> Option<&mut dyn ValidateId> {
            Some(self)
        }
    }

    impl CreateId for Capable {
        fn create_id(&mut self) -> String {
            "custom-id".to_string()
        }
    }

    impl ValidateId for Capable {
        fn validate_id(&mut self, id: &str) -> bool {
            id == "custom-id"
        }
    }

    #[test]
    fn test_probes_decline_by_default() {
        let mut handler = Plain;
        assert!(handler.id_creator().is_none());
        assert!(handler.id_validator().is_none());
    }

    #[test]
    fn test_probes_expose_capabilities() {
        let mut handler = Capable;

        let creator = handler.id_creator().unwrap();
        assert_eq!(creator.create_id(), "custom-id");

        let validator = handler.id_validator().unwrap();
        assert!(validator.validate_id("custom-id"));
        assert!(!validator.validate_id("other"));
    }

    #[test]
    fn test_handlers_box_as_trait_objects() {
        let mut handler: Box<dyn SessionHandler> = Box::new(Plain);
        assert!(handler.open("", "sid"));
        assert!(handler.close());
    }
}
