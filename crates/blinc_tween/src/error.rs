//! Tween error types

use thiserror::Error;

/// Errors raised while resolving or advancing tweens
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TweenError {
    /// A resolver callback rejected its inputs
    #[error("Resolver for `{key}` failed: {message}")]
    Resolver { key: String, message: String },

    /// The target does not expose the animated property
    #[error("Target {index} has no numeric property `{key}`")]
    MissingProperty { key: String, index: usize },

    /// A unit addresses a target the tween does not hold
    #[error("Target index {index} out of range ({len} targets)")]
    TargetOutOfRange { index: usize, len: usize },

    /// Malformed tween configuration
    #[error("Invalid tween config: {0}")]
    InvalidConfig(String),

    /// Seek target is NaN or infinite
    #[error("Cannot seek to non-finite time {0}")]
    InvalidSeek(f32),
}

impl TweenError {
    /// Convenience constructor for resolver callbacks
    pub fn resolver(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Resolver {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Result type for tween operations
pub type Result<T> = std::result::Result<T, TweenError>;
