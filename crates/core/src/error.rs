//! Error types for Waitboard.

use crate::key::EntryKey;
use thiserror::Error as ThisError;

/// Result type alias for Waitboard operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Error types for roster operations.
///
/// None of these are fatal: callers log them and carry on with stale
/// derived values.
#[derive(Debug, ThisError)]
pub enum Error {
    /// An inbound patch could not be decoded.
    #[error("Invalid patch: {message}")]
    InvalidPatch { message: String },
    /// Configuration failed to load or validate.
    #[error("Invalid config: {message}")]
    InvalidConfig { message: String },
    /// No entry with the given key is in the roster.
    #[error("Entry not found: {key}")]
    EntryNotFound { key: EntryKey },
    /// The entry is already borrowed by an in-flight update.
    #[error("Entry {key} is busy with another update")]
    EntryBusy { key: EntryKey },
    /// A change subscriber panicked while handling a notification.
    #[error("Subscriber panicked while handling entry {key}: {message}")]
    SubscriberPanicked { key: EntryKey, message: String },
}

impl Error {
    /// Creates an invalid patch error.
    pub fn invalid_patch(message: impl Into<String>) -> Self {
        Error::InvalidPatch {
            message: message.into(),
        }
    }

    /// Creates an invalid config error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Error::InvalidConfig {
            message: message.into(),
        }
    }

    /// Creates an entry not found error.
    pub fn entry_not_found(key: EntryKey) -> Self {
        Error::EntryNotFound { key }
    }

    /// Creates an entry busy error.
    pub fn entry_busy(key: EntryKey) -> Self {
        Error::EntryBusy { key }
    }

    /// Creates a subscriber panic error.
    pub fn subscriber_panicked(key: EntryKey, message: impl Into<String>) -> Self {
        Error::SubscriberPanicked {
            key,
            message: message.into(),
        }
    }
}
