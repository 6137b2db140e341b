//! Error types for twister-core

use thiserror::Error;

/// Result type alias for twister-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in twister-core
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// MIDI transport error
    #[error("MIDI error: {0}")]
    Midi(String),

    /// Slot index outside of the 16 physical encoders
    #[error("Invalid slot index {0} (expected 0-15)")]
    InvalidSlot(usize),

    /// Animation rate outside of 0-7
    #[error("Invalid animation rate {0} (expected 0-7)")]
    InvalidRate(u8),

    /// Animation not available on the requested LED ring
    #[error("Animation not supported on the rotary ring")]
    UnsupportedAnimation,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}
