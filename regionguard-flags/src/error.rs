//! Error types for flag parsing and registration.

use thiserror::Error;

/// Result type for flag operations.
pub type FlagResult<T> = Result<T, FlagError>;

/// Errors that can occur while parsing, marshalling or registering flags.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FlagError {
    /// User text or a persisted value does not fit the flag's type.
    #[error("invalid flag format: {0}")]
    InvalidFlagFormat(String),

    /// Flag names are limited to `[:A-Za-z0-9-]{1,40}`.
    #[error("invalid flag name: '{0}'")]
    InvalidName(String),

    /// A flag with this name or legacy code already exists.
    #[error("flag already registered: {0}")]
    DuplicateRegistration(String),

    /// The registry stops accepting flags once start-up has finished.
    #[error("flag registry is locked, cannot register '{0}'")]
    RegistryLocked(String),
}

impl FlagError {
    pub(crate) fn format(msg: impl Into<String>) -> Self {
        Self::InvalidFlagFormat(msg.into())
    }
}
