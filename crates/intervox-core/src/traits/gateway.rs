// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway trait abstracting the generative backend.

use async_trait::async_trait;

use crate::error::IntervoxError;

/// One segment of an ordered prompt sent to the generative backend.
#[derive(Debug, Clone, PartialEq)]
pub enum PromptPart {
    /// Plain text segment.
    Text(String),
    /// Inline image bytes (already base64-encoded) with their MIME type.
    InlineImage { mime_type: String, data: String },
}

impl PromptPart {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn jpeg(data: impl Into<String>) -> Self {
        Self::InlineImage {
            mime_type: "image/jpeg".to_string(),
            data: data.into(),
        }
    }
}

/// Abstraction over the generative backend that turns prompts into interview
/// questions, frame analysis, and report text.
///
/// Implementations fail with [`IntervoxError::Backend`] on transport errors
/// or non-success statuses, and [`IntervoxError::MalformedResponse`] when the
/// response body does not match the expected schema.
#[async_trait]
pub trait AiGateway: Send + Sync + 'static {
    /// Generates text from an ordered list of prompt segments.
    async fn generate(&self, parts: Vec<PromptPart>) -> Result<String, IntervoxError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_part_constructors() {
        assert_eq!(PromptPart::text("hi"), PromptPart::Text("hi".into()));
        match PromptPart::jpeg("abc=") {
            PromptPart::InlineImage { mime_type, data } => {
                assert_eq!(mime_type, "image/jpeg");
                assert_eq!(data, "abc=");
            }
            other => panic!("unexpected part: {other:?}"),
        }
    }

    #[test]
    fn gateway_is_object_safe() {
        fn _assert(_: &dyn AiGateway) {}
    }
}
