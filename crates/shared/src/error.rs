use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pre-flight failures. Their display text is the exact alert shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationError {
    #[error("Oops! Please upload an image first.")]
    MissingImage,
    #[error("Please enter some wishes text (e.g., Happy Birthday).")]
    MissingWishesText,
    #[error("Who is this card for? Please enter a name.")]
    MissingNameText,
}

/// Failures of a dispatched card request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// Status >= 400 with a decodable `{"error": ...}` body.
    #[error("{message}")]
    ServerReported { status: u16, message: String },
    /// Status >= 400 without a usable body.
    #[error("Image processing failed. Status: {status}")]
    Server { status: u16 },
    /// Transport failure, unreadable upload, or a body that is not an image.
    #[error("{0}")]
    NetworkOrDecode(String),
}

impl SubmitError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::NetworkOrDecode(message.into())
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ServerReported { status, .. } | Self::Server { status } => Some(*status),
            Self::NetworkOrDecode(_) => None,
        }
    }

    pub fn alert_message(&self) -> String {
        format!("Failed to create card: {self}")
    }
}
