// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gemini `generateContent` request/response types.
//!
//! The response schema is deliberately strict: anything the API returns that
//! does not match these shapes surfaces as a `MalformedResponse` at the
//! client boundary instead of propagating as a runtime fault deeper in.

use serde::{Deserialize, Serialize};

// --- Request types ---

/// A request to the `models/{model}:generateContent` endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    /// Conversation contents (a single entry carrying all prompt parts).
    pub contents: Vec<Content>,

    /// Sampling and length parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

/// One content entry holding an ordered list of parts.
#[derive(Debug, Clone, Serialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

/// A single prompt part: text or inline binary data.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Part {
    /// Plain text segment.
    Text { text: String },
    /// Inline base64 data with its MIME type.
    #[serde(rename_all = "camelCase")]
    InlineData { inline_data: InlineData },
}

/// Inline binary payload for image parts.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

/// Generation parameters.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub max_output_tokens: u32,
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: u32,
}

// --- Response types ---

/// A response from `generateContent`.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

/// One generation candidate.
#[derive(Debug, Clone, Deserialize)]
pub struct Candidate {
    pub content: CandidateContent,
}

/// Content of a candidate.
#[derive(Debug, Clone, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

/// A text part within a candidate.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponsePart {
    pub text: String,
}

/// API error response body.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

/// Error detail within an API error response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub status: String,
}
