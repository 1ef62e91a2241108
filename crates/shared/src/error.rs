use serde::{Deserialize, Serialize};

/// Error body returned by the backend alongside a non-success status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub detail: String,
}

impl ApiError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }

    /// Returns `None` unless the body is JSON with a non-blank string `detail`.
    pub fn from_body(body: &[u8]) -> Option<Self> {
        if body.is_empty() {
            return None;
        }
        serde_json::from_slice::<Self>(body)
            .ok()
            .filter(|err| !err.detail.trim().is_empty())
    }
}
