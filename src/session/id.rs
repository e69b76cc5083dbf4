//! Session id generation.
//!
//! Ids are produced by packing random bytes into a 64-symbol alphabet, a
//! configurable number of bits per character. A handler can take over
//! generation or validation through the capability probes on
//! [`SessionHandler`].

use rand::RngCore;
use tracing::trace;

use crate::session::handler::SessionHandler;
use crate::session::options::SessionOptions;

/// Characters a generated id is drawn from, indexed by packed bit value.
const ALPHABET: &[u8; 64] =
    b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ,-";

/// Source of random bytes for the default id algorithm.
pub trait EntropySource: Send {
    /// Fill the buffer with random bytes.
    fn fill(&mut self, buf: &mut [u8]);
}

/// Entropy drawn from the process-wide cryptographically secure generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&mut self, buf: &mut [u8]) {
        rand::rng().fill_bytes(buf);
    }
}

/// Generates session ids and checks them for collisions.
///
/// The manager holds nothing but its entropy source; the handler and options
/// are passed in on every call so configuration changes take effect
/// immediately.
pub struct SessionIdManager {
    entropy: Box<dyn EntropySource>,
}

impl SessionIdManager {
    /// Create a manager backed by the operating system generator.
    pub fn new() -> Self {
        Self {
            entropy: Box::new(OsEntropy),
        }
    }

    /// Create a manager backed by a caller-supplied entropy source.
    pub fn with_entropy(entropy: Box<dyn EntropySource>) -> Self {
        Self { entropy }
    }

    /// Generate a new id, prefixed with `prefix`.
    ///
    /// A handler exposing the id creation capability supplies the id body;
    /// otherwise the default packing algorithm runs with the configured
    /// length and bit density.
    pub fn generate(
        &mut self,
        handler: &mut dyn SessionHandler,
        options: &SessionOptions,
        prefix: &str,
    ) -> String {
        let body = match handler.id_creator() {
            Some(creator) => creator.create_id(),
            None => self.random_id(options),
        };
        format!("{}{}", prefix, body)
    }

    /// Generate an id no existing session is stored under.
    ///
    /// Colliding ids are discarded and generation retries until a free one
    /// comes up. There is no retry cap; termination relies on the id space
    /// being vastly larger than the set of stored sessions.
    pub fn generate_collision_free(
        &mut self,
        handler: &mut dyn SessionHandler,
        options: &SessionOptions,
        prefix: &str,
    ) -> String {
        loop {
            let id = self.generate(handler, options, prefix);
            if !self.is_valid(handler, &id) {
                return id;
            }
            trace!(id = %id, "generated id collides with a stored session, retrying");
        }
    }

    /// Check whether an id denotes an existing stored session.
    ///
    /// Prefers the handler's validation capability; falls back to probing
    /// with a read, where a non-empty payload means the id is in use.
    pub fn is_valid(&self, handler: &mut dyn SessionHandler, id: &str) -> bool {
        match handler.id_validator() {
            Some(validator) => validator.validate_id(id),
            None => !handler.read(id).is_empty(),
        }
    }

    fn random_id(&mut self, options: &SessionOptions) -> String {
        let length = options.sid_length;
        let bits = options.sid_bits_per_character.clamp(4, 6);

        let bytes_needed = (length * bits as usize).div_ceil(8);
        let mut bytes = vec![0u8; bytes_needed];
        self.entropy.fill(&mut bytes);

        encode(&bytes, bits, length)
    }
}

impl Default for SessionIdManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Pack `length` characters out of `bytes`, `bits` bits at a time.
fn encode(bytes: &[u8], bits: u32, length: usize) -> String {
    let mask = (1u32 << bits) - 1;
    let mut out = String::with_capacity(length);
    let mut cursor = bytes.iter();
    let mut window = 0u32;
    let mut have = 0u32;

    for _ in 0..length {
        if have < bits {
            match cursor.next() {
                Some(byte) => {
                    window |= u32::from(*byte) << have;
                    have += 8;
                }
                // Unreachable when the input was sized for length * bits.
                None => break,
            }
        }
        out.push(ALPHABET[(window & mask) as usize] as char);
        window >>= bits;
        have -= bits;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::handler::{CreateId, ValidateId};
    use std::collections::VecDeque;

    struct ScriptedEntropy {
        bytes: VecDeque<u8>,
    }

    impl ScriptedEntropy {
        fn new(bytes: &[u8]) -> Self {
            Self {
                bytes: bytes.iter().copied().collect(),
            }
        }
    }

    impl EntropySource for ScriptedEntropy {
        fn fill(&mut self, buf: &mut [u8]) {
            for slot in buf.iter_mut() {
                *slot = self.bytes.pop_front().expect("scripted entropy exhausted");
            }
        }
    }

    struct EmptyStore;

    impl SessionHandler for EmptyStore {
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

    struct TakenIds {
        taken: Vec<String>,
    }

    impl SessionHandler for TakenIds {
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
        fn id_validator(&mut self) -> Option<&mut dyn ValidateId> {
            Some(self)
        }
    }

    impl ValidateId for TakenIds {
        fn validate_id(&mut self, id: &str) -> bool {
            self.taken.iter().any(|taken| taken == id)
        }
    }

    struct NamingStore;

    impl SessionHandler for NamingStore {
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
    }

    impl CreateId for NamingStore {
        fn create_id(&mut self) -> String {
            "handler-made".to_string()
        }
    }

    fn scripted(bytes: &[u8]) -> SessionIdManager {
        SessionIdManager::with_entropy(Box::new(ScriptedEntropy::new(bytes)))
    }

    fn options(length: usize, bits: u32) -> SessionOptions {
        SessionOptions::default().with_sid(length, bits)
    }

    #[test]
    fn test_encode_four_bit() {
        assert_eq!(encode(&[0xAB], 4, 2), "ba");
        assert_eq!(encode(&[0x01, 0x23], 4, 4), "1032");
    }

    #[test]
    fn test_encode_five_bit() {
        assert_eq!(encode(&[0xFF, 0x00, 0xFF], 5, 4), "v70u");
    }

    #[test]
    fn test_encode_six_bit() {
        assert_eq!(encode(&[0x3F, 0x00], 6, 2), "-0");
    }

    #[test]
    fn test_generate_uses_scripted_entropy() {
        let mut manager = scripted(&[0xAB]);
        let id = manager.generate(&mut EmptyStore, &options(2, 4), "");
        assert_eq!(id, "ba");
    }

    #[test]
    fn test_generate_prepends_prefix() {
        let mut manager = scripted(&[0xAB]);
        let id = manager.generate(&mut EmptyStore, &options(2, 4), "app-");
        assert_eq!(id, "app-ba");
    }

    #[test]
    fn test_bits_out_of_range_are_clamped() {
        // 3 behaves as 4, 9 behaves as 6
        let mut manager = scripted(&[0xAB]);
        assert_eq!(manager.generate(&mut EmptyStore, &options(2, 3), ""), "ba");

        let mut manager = scripted(&[0x3F, 0x00]);
        assert_eq!(manager.generate(&mut EmptyStore, &options(2, 9), ""), "-0");
    }

    #[test]
    fn test_zero_length_yields_empty_id() {
        let mut manager = scripted(&[]);
        assert_eq!(manager.generate(&mut EmptyStore, &options(0, 4), ""), "");
    }

    #[test]
    fn test_handler_creator_takes_over() {
        let mut manager = scripted(&[]);
        let id = manager.generate(&mut NamingStore, &options(8, 4), "pre-");
        assert_eq!(id, "pre-handler-made");
    }

    #[test]
    fn test_is_valid_prefers_validator() {
        let manager = SessionIdManager::new();
        let mut handler = TakenIds {
            taken: vec!["busy".to_string()],
        };
        assert!(manager.is_valid(&mut handler, "busy"));
        assert!(!manager.is_valid(&mut handler, "free"));
    }

    #[test]
    fn test_is_valid_falls_back_to_read() {
        struct OneSession;

        impl SessionHandler for OneSession {
            fn open(&mut self, _save_path: &str, _name: &str) -> bool {
                true
            }
            fn read(&mut self, id: &str) -> String {
                if id == "stored" {
                    r#"{"k":"v"}"#.to_string()
                } else {
                    String::new()
                }
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

        let manager = SessionIdManager::new();
        assert!(manager.is_valid(&mut OneSession, "stored"));
        assert!(!manager.is_valid(&mut OneSession, "anything-else"));
    }

    #[test]
    fn test_collision_free_retries_until_free() {
        // First draw encodes to "ba", which the handler reports as taken;
        // the second draw encodes to "dc" and goes through.
        let mut manager = scripted(&[0xAB, 0xCD]);
        let mut handler = TakenIds {
            taken: vec!["ba".to_string()],
        };

        let id = manager.generate_collision_free(&mut handler, &options(2, 4), "");
        assert_eq!(id, "dc");
    }

    #[test]
    fn test_collision_free_returns_first_free_id() {
        let mut manager = scripted(&[0xAB]);
        let mut handler = TakenIds { taken: vec![] };

        let id = manager.generate_collision_free(&mut handler, &options(2, 4), "");
        assert_eq!(id, "ba");
    }

    #[test]
    fn test_os_entropy_ids_are_unique() {
        let mut manager = SessionIdManager::new();
        let options = SessionOptions::default();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..1_000 {
            let id = manager.generate(&mut EmptyStore, &options, "");
            assert_eq!(id.len(), options.sid_length);
            assert!(seen.insert(id), "duplicate id generated");
        }
    }

    #[test]
    fn test_generated_chars_stay_in_alphabet() {
        let mut manager = SessionIdManager::new();
        for bits in [4, 5, 6] {
            let id = manager.generate(&mut EmptyStore, &options(64, bits), "");
            assert!(id.bytes().all(|b| ALPHABET.contains(&b)));
        }
    }
}
