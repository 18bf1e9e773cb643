//! Error types for the physics crate
//!
//! Collision tests themselves never fail: a degenerate pair simply does not
//! interact. Errors only come from loading settings and from addressing bodies
//! that no longer exist.

use thiserror::Error;

use crate::body::BodyHandle;

/// Result type for world operations
pub type Result<T> = std::result::Result<T, WorldError>;

/// Errors raised when loading or validating [`PhysicsConfig`](crate::PhysicsConfig)
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// A setting is outside its allowed range
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Errors raised by [`PhysicsWorld`](crate::PhysicsWorld) operations
#[derive(Error, Debug, PartialEq, Eq)]
pub enum WorldError {
    /// The handle's slot was freed or reused
    #[error("Stale body handle: {0:?}")]
    StaleHandle(BodyHandle),

    /// The handle's slot was never allocated
    #[error("Unknown body handle: {0:?}")]
    UnknownHandle(BodyHandle),

    /// A pair operation was given the same body twice
    #[error("Body paired with itself: {0:?}")]
    SelfPair(BodyHandle),
}
