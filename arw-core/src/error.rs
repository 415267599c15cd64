//! Error types for the ARW core library.

use thiserror::Error;

use crate::types::ActorId;

/// Failure reported by the hosting simulation at the boundary.
///
/// Every variant is recoverable: callers skip the dependent action and keep
/// whatever they had cached.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// The entity is not loaded or no longer exists.
    #[error("Entity not found: {0}")]
    EntityNotFound(ActorId),

    /// The entity exists but lacks a component the caller needs.
    #[error("Entity {actor} has no {component} component")]
    MissingComponent {
        /// Entity that was queried.
        actor: ActorId,
        /// Component name, e.g. `health` or `equippable`.
        component: &'static str,
    },

    /// The query target (chunk, dimension, block) is not available right now.
    #[error("Host query unavailable: {0}")]
    Unavailable(String),

    /// The host refused a write.
    #[error("Host rejected write: {0}")]
    Rejected(String),
}

/// Convenience Result type for host calls.
pub type HostResult<T> = std::result::Result<T, HostError>;

/// Top-level error type for all ARW operations.
#[derive(Error, Debug)]
pub enum ArwError {
    /// Configuration could not be parsed or failed validation.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A host call failed.
    #[error("Host error: {0}")]
    Host(#[from] HostError),

    /// An internal invariant did not hold.
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, ArwError>;
