use thiserror::Error;

/// Outcome classification for every backend call.
///
/// The combined controller only distinguishes "this backend cannot do this
/// exact call right now" from everything else: both cases make it move on
/// to the next candidate backend, and neither is ever surfaced to the
/// caller of a command.
#[derive(Error, Debug)]
pub enum ControllerError {
    #[error("operation '{operation}' is not supported by backend '{backend}'")]
    Unsupported { operation: String, backend: String },
    #[error("backend call failed: {0}")]
    Transient(#[from] anyhow::Error),
    #[error("connection to backend '{0}' was never established")]
    ConnectionFailed(String),
}

impl ControllerError {
    pub fn unsupported(operation: &str, backend: &str) -> Self {
        ControllerError::Unsupported {
            operation: operation.to_string(),
            backend: backend.to_string(),
        }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        ControllerError::Transient(anyhow::anyhow!(message.into()))
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, ControllerError::Unsupported { .. })
    }
}

/// Result type for media-controller operations.
pub type Result<T> = std::result::Result<T, ControllerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_is_distinguishable() {
        let err = ControllerError::unsupported("play", "session-bridge");
        assert!(err.is_unsupported());
        assert_eq!(
            err.to_string(),
            "operation 'play' is not supported by backend 'session-bridge'"
        );

        let err = ControllerError::transient("socket reset");
        assert!(!err.is_unsupported());
    }
}
