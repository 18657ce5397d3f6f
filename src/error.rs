//! Error types for the image load controller.

use thiserror::Error;

/// Errors raised synchronously to the host.
///
/// Load failures are not represented here: they are recovered into the
/// `error` load state and reported through the state-change hook.
#[derive(Error, Debug)]
pub enum LoaderError {
    /// A controlled input was declared but not supplied, or the
    /// configuration is otherwise unusable
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the misuse
        message: String,
    },

    /// The state machine was handed or reached a state it does not know
    #[error("Wrong state: {state}")]
    InvalidState {
        /// The offending state description
        state: String,
    },

    /// Configuration document could not be parsed or serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The platform binding could not acquire a resource
    #[error("Platform error: {message}")]
    Platform {
        /// Description of the platform failure
        message: String,
    },
}

impl LoaderError {
    /// Create a configuration error with a message.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an invalid state error.
    pub fn invalid_state(state: impl Into<String>) -> Self {
        Self::InvalidState {
            state: state.into(),
        }
    }

    /// Create a platform error with a message.
    pub fn platform(message: impl Into<String>) -> Self {
        Self::Platform {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LoaderError>;

/// Why a fetch did not produce a decoded image.
///
/// Recovered locally into the `error` load state, never raised to the host.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadFailure {
    /// The platform reported a network or format error
    #[error("load error")]
    Error,
    /// The platform aborted the transfer
    #[error("load aborted")]
    Aborted,
    /// An explicit decode request was rejected
    #[error("decode failed: {0}")]
    Decode(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = LoaderError::configuration("You should pass load value to controlled component");
        assert_eq!(
            err.to_string(),
            "Configuration error: You should pass load value to controlled component"
        );
        assert_eq!(
            LoaderError::invalid_state("bogus").to_string(),
            "Wrong state: bogus"
        );
    }

    #[test]
    fn test_failure_display() {
        assert_eq!(LoadFailure::Aborted.to_string(), "load aborted");
        assert_eq!(
            LoadFailure::Decode("EncodingError".into()).to_string(),
            "decode failed: EncodingError"
        );
    }
}
