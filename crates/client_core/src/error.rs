use thiserror::Error;

/// Why a backend call produced no payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestFailure {
    /// The backend answered with a non-success status.
    #[error("{message}")]
    Backend { status: u16, message: String },
    /// No usable response: unreachable host, timeout, or an unreadable body.
    #[error("{0}")]
    Transport(String),
}

impl RequestFailure {
    pub fn message(&self) -> &str {
        match self {
            RequestFailure::Backend { message, .. } => message,
            RequestFailure::Transport(message) => message,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            RequestFailure::Backend { status, .. } => Some(*status),
            RequestFailure::Transport(_) => None,
        }
    }
}

pub type RequestOutcome<T> = std::result::Result<T, RequestFailure>;

/// History persistence failures. Logged by the history store, never returned to callers.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to read persisted history: {0}")]
    Read(String),
    #[error("failed to write persisted history: {0}")]
    Write(String),
    #[error("persisted history is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::RequestFailure;

    #[test]
    fn message_is_the_display_text() {
        let backend = RequestFailure::Backend {
            status: 400,
            message: "prompt too short".into(),
        };
        assert_eq!(backend.message(), "prompt too short");
        assert_eq!(backend.to_string(), "prompt too short");
        assert_eq!(backend.status(), Some(400));

        let transport = RequestFailure::Transport("connection refused".into());
        assert_eq!(transport.message(), "connection refused");
        assert_eq!(transport.status(), None);
    }
}
