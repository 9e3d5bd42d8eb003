// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Gemini `generateContent` API.
//!
//! Provides [`GeminiClient`], which handles request construction, key
//! handling, strict response decoding, and transient error retry. The
//! client implements [`AiGateway`] and is the only place in the workspace
//! that knows the Gemini wire format.

use std::time::Duration;

use async_trait::async_trait;
use intervox_config::GeminiConfig;
use intervox_core::{AiGateway, IntervoxError, PromptPart};
use tracing::{debug, warn};

use crate::types::{
    ApiErrorResponse, Content, GenerateContentRequest, GenerateContentResponse,
    GenerationConfig, InlineData, Part,
};

/// Base URL for the Gemini generative language API.
const API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// HTTP client for Gemini API communication.
///
/// Manages connection pooling and retry logic for transient errors
/// (429, 500, 503).
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    generation_config: GenerationConfig,
    max_retries: u32,
    base_url: String,
}

impl GeminiClient {
    /// Creates a client from the Gemini config section.
    ///
    /// Fails with `Config` when no API key is set.
    pub fn from_config(config: &GeminiConfig) -> Result<Self, IntervoxError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| IntervoxError::Config("gemini.api_key is not set".into()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| IntervoxError::Backend {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            api_key,
            model: config.model.clone(),
            generation_config: GenerationConfig {
                max_output_tokens: config.max_output_tokens,
                temperature: config.temperature,
                top_p: config.top_p,
                top_k: config.top_k,
            },
            max_retries: 1,
            base_url: API_BASE_URL.to_string(),
        })
    }

    /// Returns the configured model identifier.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Overrides the base URL (for testing with wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        )
    }

    /// Sends a request, retrying once on transient errors.
    async fn post_generate(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, IntervoxError> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying generateContent after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = self
                .client
                .post(self.endpoint())
                .json(request)
                .send()
                .await
                .map_err(|e| IntervoxError::Backend {
                    message: format!("HTTP request failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(status = %status, attempt, "generateContent response received");

            if status.is_success() {
                let body = response.text().await.map_err(|e| IntervoxError::Backend {
                    message: format!("failed to read response body: {e}"),
                    source: Some(Box::new(e)),
                })?;
                return serde_json::from_str(&body).map_err(|e| {
                    IntervoxError::MalformedResponse(format!(
                        "unexpected generateContent shape: {e}"
                    ))
                });
            }

            if is_transient_error(status) && attempt < self.max_retries {
                let body = response.text().await.unwrap_or_default();
                warn!(status = %status, body = %body, "transient error, will retry");
                last_error = Some(IntervoxError::backend(format!(
                    "API returned {status}: {body}"
                )));
                continue;
            }

            // Non-transient error or exhausted retries.
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_err) => format!(
                    "Gemini API error ({}): {}",
                    api_err.error.code, api_err.error.message
                ),
                Err(_) => format!("API returned {status}: {body}"),
            };
            return Err(IntervoxError::backend(message));
        }

        Err(last_error.unwrap_or_else(|| {
            IntervoxError::backend("generateContent failed after retries")
        }))
    }

    /// Extracts the generated text from a decoded response.
    fn extract_text(response: GenerateContentResponse) -> Result<String, IntervoxError> {
        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| IntervoxError::MalformedResponse("no candidates".into()))?;

        let text: String = candidate
            .content
            .parts
            .into_iter()
            .map(|p| p.text)
            .collect();

        if text.trim().is_empty() {
            return Err(IntervoxError::MalformedResponse(
                "candidate contained no text parts".into(),
            ));
        }
        Ok(text.trim().to_string())
    }
}

fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503)
}

#[async_trait]
impl AiGateway for GeminiClient {
    async fn generate(&self, parts: Vec<PromptPart>) -> Result<String, IntervoxError> {
        let wire_parts: Vec<Part> = parts
            .into_iter()
            .map(|p| match p {
                PromptPart::Text(text) => Part::Text { text },
                PromptPart::InlineImage { mime_type, data } => Part::InlineData {
                    inline_data: InlineData { mime_type, data },
                },
            })
            .collect();

        let request = GenerateContentRequest {
            contents: vec![Content { parts: wire_parts }],
            generation_config: Some(self.generation_config.clone()),
        };

        let response = self.post_generate(&request).await?;
        Self::extract_text(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: String) -> GeminiClient {
        let config = GeminiConfig {
            api_key: Some("test-key".into()),
            ..GeminiConfig::default()
        };
        GeminiClient::from_config(&config)
            .unwrap()
            .with_base_url(base_url)
    }

    fn candidate_body(text: &str) -> serde_json::Value {
        serde_json::json!({
            "candidates": [
                {"content": {"parts": [{"text": text}], "role": "model"}}
            ]
        })
    }

    #[test]
    fn from_config_requires_api_key() {
        let config = GeminiConfig::default();
        let result = GeminiClient::from_config(&config);
        assert!(matches!(result, Err(IntervoxError::Config(_))));
    }

    #[tokio::test]
    async fn generate_returns_candidate_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/gemini-2.0-flash:generateContent"))
            .and(query_param("key", "test-key"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(candidate_body("  First question?  ")),
            )
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let text = client
            .generate(vec![PromptPart::text("Start the interview.")])
            .await
            .unwrap();
        assert_eq!(text, "First question?");
    }

    #[tokio::test]
    async fn generate_sends_generation_config() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "generationConfig": {"maxOutputTokens": 500, "topK": 40}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(candidate_body("ok")))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        client.generate(vec![PromptPart::text("hi")]).await.unwrap();
    }

    #[tokio::test]
    async fn generate_retries_transient_errors_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(candidate_body("recovered")))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let text = client.generate(vec![PromptPart::text("hi")]).await.unwrap();
        assert_eq!(text, "recovered");
    }

    #[tokio::test]
    async fn generate_maps_api_error_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {"code": 400, "message": "invalid argument", "status": "INVALID_ARGUMENT"}
            })))
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let err = client
            .generate(vec![PromptPart::text("hi")])
            .await
            .unwrap_err();
        match err {
            IntervoxError::Backend { message, .. } => {
                assert!(message.contains("invalid argument"));
            }
            other => panic!("expected Backend, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_candidates_is_malformed_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"candidates": []})),
            )
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let err = client
            .generate(vec![PromptPart::text("hi")])
            .await
            .unwrap_err();
        assert!(matches!(err, IntervoxError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn image_parts_serialize_as_inline_data() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "contents": [{"parts": [
                    {"text": "Analyze this frame."},
                    {"inlineData": {"mimeType": "image/jpeg", "data": "aGVsbG8="}}
                ]}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(candidate_body("analysis")))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        client
            .generate(vec![
                PromptPart::text("Analyze this frame."),
                PromptPart::jpeg("aGVsbG8="),
            ])
            .await
            .unwrap();
    }
}
