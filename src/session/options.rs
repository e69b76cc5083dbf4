//! Session configuration options.
//!
//! Options are plain mutable state owned by the [`Session`](crate::Session).
//! Every lifecycle operation reads the value it needs at the moment of use,
//! so changing an option between calls is observed by the next call.

use serde::{Deserialize, Serialize};

/// Configuration for a session and its id generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionOptions {
    /// Logical session namespace, passed to the handler on open.
    pub name: String,
    /// Backend location string, passed to the handler on open.
    pub save_path: String,
    /// Reject externally supplied ids that do not validate against the store.
    pub use_strict_mode: bool,
    /// Numerator of the per-start garbage collection chance.
    pub gc_probability: u32,
    /// Denominator of the per-start garbage collection chance. Zero disables
    /// the roll entirely.
    pub gc_divisor: u32,
    /// Age in seconds past which stored sessions are eligible for collection.
    pub gc_maxlifetime: u64,
    /// Length of generated session ids, in characters.
    pub sid_length: usize,
    /// Bits encoded per id character (4, 5, or 6).
    pub sid_bits_per_character: u32,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            name: "sid".to_string(),
            save_path: String::new(),
            use_strict_mode: false,
            gc_probability: 1,
            gc_divisor: 100,
            gc_maxlifetime: 1440,
            sid_length: 32,
            sid_bits_per_character: 4,
        }
    }
}

impl SessionOptions {
    /// Set the session name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the save path handed to the handler on open.
    pub fn with_save_path(mut self, save_path: impl Into<String>) -> Self {
        self.save_path = save_path.into();
        self
    }

    /// Enable or disable strict id validation.
    pub fn with_strict_mode(mut self, enabled: bool) -> Self {
        self.use_strict_mode = enabled;
        self
    }

    /// Set the garbage collection chance as a probability/divisor pair.
    pub fn with_gc_chance(mut self, probability: u32, divisor: u32) -> Self {
        self.gc_probability = probability;
        self.gc_divisor = divisor;
        self
    }

    /// Set the maximum stored session age, in seconds.
    pub fn with_gc_maxlifetime(mut self, seconds: u64) -> Self {
        self.gc_maxlifetime = seconds;
        self
    }

    /// Set the generated id length and bit density.
    pub fn with_sid(mut self, length: usize, bits_per_character: u32) -> Self {
        self.sid_length = length;
        self.sid_bits_per_character = bits_per_character;
        self
    }

    /// The per-start garbage collection chance as a fraction.
    ///
    /// A zero divisor yields 0.0 (never collect); a probability at or above
    /// the divisor yields at least 1.0 (always collect).
    pub fn gc_chance(&self) -> f64 {
        if self.gc_divisor == 0 {
            0.0
        } else {
            f64::from(self.gc_probability) / f64::from(self.gc_divisor)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = SessionOptions::default();
        assert_eq!(options.name, "sid");
        assert_eq!(options.save_path, "");
        assert!(!options.use_strict_mode);
        assert_eq!(options.gc_probability, 1);
        assert_eq!(options.gc_divisor, 100);
        assert_eq!(options.gc_maxlifetime, 1440);
        assert_eq!(options.sid_length, 32);
        assert_eq!(options.sid_bits_per_character, 4);
    }

    #[test]
    fn test_builders() {
        let options = SessionOptions::default()
            .with_name("app")
            .with_save_path("/tmp/sessions")
            .with_strict_mode(true)
            .with_gc_chance(1, 1)
            .with_gc_maxlifetime(60)
            .with_sid(16, 5);

        assert_eq!(options.name, "app");
        assert_eq!(options.save_path, "/tmp/sessions");
        assert!(options.use_strict_mode);
        assert_eq!(options.gc_probability, 1);
        assert_eq!(options.gc_divisor, 1);
        assert_eq!(options.gc_maxlifetime, 60);
        assert_eq!(options.sid_length, 16);
        assert_eq!(options.sid_bits_per_character, 5);
    }

    #[test]
    fn test_gc_chance() {
        let mut options = SessionOptions::default();
        assert!((options.gc_chance() - 0.01).abs() < f64::EPSILON);

        options.gc_probability = 0;
        assert_eq!(options.gc_chance(), 0.0);

        options.gc_probability = 100;
        assert!(options.gc_chance() >= 1.0);

        options.gc_divisor = 0;
        assert_eq!(options.gc_chance(), 0.0);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let options: SessionOptions =
            serde_json::from_str(r#"{"name": "app", "use_strict_mode": true}"#).unwrap();
        assert_eq!(options.name, "app");
        assert!(options.use_strict_mode);
        assert_eq!(options.sid_length, 32); // Default
    }

    #[test]
    fn test_serialization() {
        let json = serde_json::to_string(&SessionOptions::default()).unwrap();
        assert!(json.contains("\"name\""));
        assert!(json.contains("\"gc_divisor\""));
    }
}
