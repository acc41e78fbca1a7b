use std::time::Duration;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use crate::error::{AppError, Result};

pub const GEMINI_MODEL: &str = "gemini-1.5-flash";

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Substituted when the provider answers successfully but with no text.
pub const EMPTY_OUTPUT_REPLY: &str = "Please contact the office.";

// The overall request timeout; a slow provider must not stall a handler.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct GenerateRequest {
    #[serde(rename = "systemInstruction")]
    system_instruction: Content,
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Default, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

/// Thin boundary to the Gemini `generateContent` endpoint. Every failure
/// class is mapped to `AppError::Generation`; callers never see a raw
/// transport or provider error.
pub struct GenerationClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GenerationClient {
    pub fn new(api_key: String) -> Result<Self> {
        Self::with_base_url(api_key, GEMINI_API_BASE.to_string())
    }

    /// Points the client at a different origin, used by tests to target a
    /// mock server.
    pub fn with_base_url(api_key: String, base_url: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url,
            api_key,
            model: GEMINI_MODEL.to_string(),
        })
    }

    pub async fn generate(
        &self,
        prompt: &str,
        system_instruction: &str,
        temperature: f32,
        max_output_tokens: u32,
    ) -> Result<String> {
        let body = GenerateRequest {
            system_instruction: Content {
                parts: vec![Part {
                    text: system_instruction.to_string(),
                }],
            },
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature,
                max_output_tokens,
            },
        };

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Generation(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::Generation(format!(
                "provider returned status {}",
                response.status()
            )));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AppError::Generation(format!("malformed provider response: {e}")))?;

        let text = parsed
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.trim())
            .unwrap_or_default();

        if text.is_empty() {
            Ok(EMPTY_OUTPUT_REPLY.to_string())
        } else {
            Ok(text.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client_for(server: &MockServer) -> GenerationClient {
        GenerationClient::with_base_url("test-key".to_string(), server.base_url()).unwrap()
    }

    #[tokio::test]
    async fn returns_generated_text() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path(format!("/models/{GEMINI_MODEL}:generateContent"))
                    .query_param("key", "test-key");
                then.status(200).json_body(json!({
                    "candidates": [
                        { "content": { "parts": [{ "text": "Library hours text" }] } }
                    ]
                }));
            })
            .await;

        let client = client_for(&server);
        let reply = client.generate("prompt", "instruction", 0.5, 500).await.unwrap();
        assert_eq!(reply, "Library hours text");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_success_status_is_a_generation_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(429).body("quota exceeded");
            })
            .await;

        let client = client_for(&server);
        let err = client.generate("p", "i", 0.5, 500).await.unwrap_err();
        assert!(matches!(err, AppError::Generation(_)));
    }

    #[tokio::test]
    async fn empty_candidates_fall_back_to_office_message() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(200).json_body(json!({ "candidates": [] }));
            })
            .await;

        let client = client_for(&server);
        let reply = client.generate("p", "i", 0.5, 500).await.unwrap();
        assert_eq!(reply, EMPTY_OUTPUT_REPLY);
    }

    #[tokio::test]
    async fn malformed_body_is_a_generation_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(200).body("not json");
            })
            .await;

        let client = client_for(&server);
        let err = client.generate("p", "i", 0.5, 500).await.unwrap_err();
        assert!(matches!(err, AppError::Generation(_)));
    }
}
