//! Error types for the Folio event log.
//!
//! Only operational failures are errors.  Broken links and hash mismatches
//! found while verifying a chain are ordinary data in `VerificationResult`,
//! never an `Err`.

use thiserror::Error;

/// The unified error type for the Folio crates.
#[derive(Debug, Error)]
pub enum FolioError {
    /// The event store could not durably append an event.
    ///
    /// Fatal to that single append: the chain head is left where it was and
    /// the caller must retry the whole append.
    #[error("event store write failed: {reason}")]
    StoreWriteFailed { reason: String },

    /// The event store could not be opened or its contents could not be read back.
    #[error("event store read failed: {reason}")]
    StoreReadFailed { reason: String },

    /// Query or export options are malformed or inconsistent.
    #[error("invalid options: {reason}")]
    InvalidOptions { reason: String },

    /// A value could not be serialized into an export format.
    #[error("serialization error: {reason}")]
    Serialization { reason: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// A file outside the event store (an export, an import) could not be
    /// read or written.
    #[error("i/o error: {reason}")]
    Io { reason: String },
}

/// Convenience alias used throughout the Folio crates.
pub type FolioResult<T> = Result<T, FolioError>;
