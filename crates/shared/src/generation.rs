//! Remote generation contract.
//!
//! The generation core only knows this trait; the Gemini client in
//! `providers` is one implementation and tests use scripted fakes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::mockup::{Category, ImageUpload};

/// Input to a single generation call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Base64 payload, with or without a `data:` prefix
    pub image_base64: String,
    pub mime_type: String,
    pub category: Category,
    /// Free text; empty means the default style
    pub description: String,
}

impl GenerationRequest {
    pub fn new(upload: &ImageUpload, category: Category, description: impl Into<String>) -> Self {
        Self {
            image_base64: upload.base64_payload().to_string(),
            mime_type: upload.mime_type().to_string(),
            category,
            description: description.into(),
        }
    }
}

/// Classified failure of a generation call.
///
/// The `Display` text is what a failed slot shows and what the suggestion
/// classifier matches against.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error("Generation blocked by the model. Reason: {reason}")]
    Blocked { reason: String },

    #[error("The model did not generate any content.")]
    EmptyResponse,

    #[error("The model returned text: \"{message}\"")]
    TextOnly { message: String },

    #[error("No image found in the response.")]
    NoImage,

    #[error("gemini error: {status}\n{body}")]
    Http { status: u16, body: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("Could not read the model response: {0}")]
    InvalidResponse(String),

    #[error("configuration error: {0}")]
    Config(String),
}

/// The remote operation that turns one upload into one mockup.
///
/// Single-shot: implementations must not retry on their own.
#[async_trait]
pub trait MockupGenerator: Send + Sync {
    /// Returns a `data:image/png;base64,...` URI on success
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_from_upload() {
        let upload = ImageUpload::from_data_uri("data:image/png;base64,AAAA").unwrap();
        let request = GenerationRequest::new(&upload, Category::Caneca, "");
        assert_eq!(request.image_base64, "AAAA");
        assert_eq!(request.mime_type, "image/png");
        assert_eq!(request.category, Category::Caneca);
    }

    #[test]
    fn test_error_messages() {
        let blocked = GenerationError::Blocked {
            reason: "SAFETY".into(),
        };
        assert_eq!(
            blocked.to_string(),
            "Generation blocked by the model. Reason: SAFETY"
        );
        let text = GenerationError::TextOnly {
            message: "I cannot do that".into(),
        };
        assert_eq!(
            text.to_string(),
            "The model returned text: \"I cannot do that\""
        );
    }
}
