//! Emitter error types.

use thiserror::Error;

use crate::listener::ListenerError;

/// Errors that can occur with emitter operations.
#[derive(Debug, Error)]
pub enum EmitterError {
    /// The value handed to `on`/`once` does not resolve to a callable.
    #[error("listener must be a function")]
    InvalidListener,

    /// A listener failed while an event was being delivered.
    ///
    /// Listeners registered after the failing one did not run for that
    /// `emit` call.
    #[error("listener for event '{event}' failed: {source}")]
    Listener {
        /// Name of the event being emitted.
        event: String,
        /// Error returned by the listener.
        #[source]
        source: ListenerError,
    },
}

impl EmitterError {
    /// Returns `true` if this error came from a listener during `emit`.
    #[must_use]
    pub fn is_listener_failure(&self) -> bool {
        matches!(self, Self::Listener { .. })
    }
}

/// Result type for emitter operations.
pub type EmitterResult<T> = Result<T, EmitterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_listener_message() {
        let err = EmitterError::InvalidListener;
        assert_eq!(err.to_string(), "listener must be a function");
        assert!(!err.is_listener_failure());
    }

    #[test]
    fn test_listener_error_keeps_source() {
        let err = EmitterError::Listener {
            event: "save".to_string(),
            source: "disk full".into(),
        };

        assert!(err.is_listener_failure());
        assert_eq!(err.to_string(), "listener for event 'save' failed: disk full");

        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "disk full");
    }
}
