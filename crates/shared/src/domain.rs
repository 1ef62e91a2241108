use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! text_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

text_newtype!(Prompt);
text_newtype!(GenerationResult);

impl Prompt {
    /// Trims `raw` and rejects it when nothing is left.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }
}

impl GenerationResult {
    pub fn new(markup: impl Into<String>) -> Self {
        Self(markup.into())
    }

    pub fn line_count(&self) -> usize {
        self.0.split('\n').count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewState {
    #[default]
    Code,
    Preview,
}

impl fmt::Display for ViewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewState::Code => f.write_str("code"),
            ViewState::Preview => f.write_str("preview"),
        }
    }
}

/// Exported animation bytes as returned by the export endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryArtifact {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

impl BinaryArtifact {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
