use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::generation::{GenerationError, GenerationRequest, MockupGenerator};
use shared::mockup::strip_data_uri_prefix;
use shared::settings::ModelProvider;
use std::env;
use std::time::Duration;

use crate::prompts::build_mockup_prompt;

/// Longest model refusal kept in a slot's error text
const MAX_REFUSAL_CHARS: usize = 150;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<GeminiInlineData>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

pub struct GeminiImageClient {
    http: Client,
    auth_token: String,
    model: String,
}

impl GeminiImageClient {
    pub fn from_settings(config: &ModelProvider) -> Result<Self, GenerationError> {
        let auth_token = if let Some(api_key) = &config.gemini_auth.api_key {
            api_key.clone()
        } else {
            // Try environment variable as fallback
            env::var("GEMINI_API_KEY")
                .map_err(|_| GenerationError::Config("No Gemini API key configured".into()))?
        };

        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| GenerationError::Config(e.to_string()))?;

        Ok(Self {
            http,
            auth_token,
            model: config.gemini_model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn call(&self, request: GenerationRequest) -> Result<String, GenerationError> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, self.auth_token
        );
        let req = build_request(&request);
        let resp = self
            .http
            .post(url)
            .json(&req)
            .send()
            .await
            .map_err(|e| GenerationError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(http_error(status.as_u16(), &body));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| GenerationError::Network(e.to_string()))?;
        interpret_response(decode_response(&body)?)
    }
}

/// A 2xx body that is not a generateContent response
fn decode_response(body: &str) -> Result<GeminiResponse, GenerationError> {
    serde_json::from_str(body).map_err(|e| GenerationError::InvalidResponse(e.to_string()))
}

#[async_trait]
impl MockupGenerator for GeminiImageClient {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationError> {
        let category = request.category;
        let result = self.call(request).await;
        if let Err(e) = &result {
            tracing::warn!(%category, error = %e, "Gemini image generation failed");
        }
        result
    }
}

fn build_request(request: &GenerationRequest) -> GeminiRequest {
    let image = GeminiPart {
        inline_data: Some(GeminiInlineData {
            mime_type: request.mime_type.clone(),
            data: strip_data_uri_prefix(&request.image_base64).to_string(),
        }),
        ..Default::default()
    };
    let prompt = GeminiPart {
        text: Some(build_mockup_prompt(request.category, &request.description)),
        ..Default::default()
    };
    GeminiRequest {
        contents: vec![GeminiContent {
            parts: vec![image, prompt],
        }],
    }
}

fn http_error(status: u16, body: &str) -> GenerationError {
    let body = body.trim();
    let body = if body.chars().count() > 800 {
        format!("{}...", body.chars().take(800).collect::<String>())
    } else {
        body.to_string()
    };
    GenerationError::Http { status, body }
}

/// Turn a generateContent response into an image URI or a classified failure
fn interpret_response(body: GeminiResponse) -> Result<String, GenerationError> {
    let candidate = body.candidates.into_iter().next();
    let finish_reason = candidate.as_ref().and_then(|c| c.finish_reason.clone());
    let parts = candidate
        .and_then(|c| c.content)
        .map(|c| c.parts)
        .unwrap_or_default();

    if parts.is_empty() {
        return Err(match finish_reason {
            Some(reason) => GenerationError::Blocked { reason },
            None => GenerationError::EmptyResponse,
        });
    }

    if let Some(data) = parts
        .iter()
        .filter_map(|p| p.inline_data.as_ref())
        .map(|d| d.data.as_str())
        .find(|d| !d.is_empty())
    {
        return Ok(format!("data:image/png;base64,{}", data));
    }

    if let Some(text) = parts
        .iter()
        .filter_map(|p| p.text.as_deref())
        .find(|t| !t.is_empty())
    {
        return Err(GenerationError::TextOnly {
            message: summarize_refusal(text),
        });
    }

    Err(GenerationError::NoImage)
}

/// Strip markdown markers and cap the length for display
fn summarize_refusal(text: &str) -> String {
    let cleaned: String = text.chars().filter(|c| *c != '*' && *c != '#').collect();
    let cleaned = cleaned.trim();
    if cleaned.chars().count() > MAX_REFUSAL_CHARS {
        format!(
            "{}...",
            cleaned.chars().take(MAX_REFUSAL_CHARS).collect::<String>()
        )
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::mockup::Category;

    fn response(json: serde_json::Value) -> GeminiResponse {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_request_strips_data_uri_prefix() {
        let req = build_request(&GenerationRequest {
            image_base64: "data:image/png;base64,QUJD".into(),
            mime_type: "image/png".into(),
            category: Category::Camiseta,
            description: String::new(),
        });
        let json = serde_json::to_value(&req).unwrap();
        let parts = &json["contents"][0]["parts"];
        assert_eq!(parts[0]["inlineData"]["data"], "QUJD");
        assert_eq!(parts[0]["inlineData"]["mimeType"], "image/png");
        assert!(parts[0].get("text").is_none());
        assert!(parts[1]["text"]
            .as_str()
            .unwrap()
            .contains("Cotton T-Shirt on a hanger or model"));
    }

    #[test]
    fn test_image_part_becomes_png_data_uri() {
        let body = response(serde_json::json!({
            "candidates": [{
                "content": {"parts": [
                    {"text": "Here you go"},
                    {"inlineData": {"mimeType": "image/png", "data": "iVBOR"}}
                ]},
                "finishReason": "STOP"
            }]
        }));
        assert_eq!(
            interpret_response(body).unwrap(),
            "data:image/png;base64,iVBOR"
        );
    }

    #[test]
    fn test_empty_parts_with_reason_is_blocked() {
        let body = response(serde_json::json!({
            "candidates": [{"finishReason": "PROHIBITED_CONTENT"}]
        }));
        assert_eq!(
            interpret_response(body),
            Err(GenerationError::Blocked {
                reason: "PROHIBITED_CONTENT".into()
            })
        );
    }

    #[test]
    fn test_no_candidates_is_empty_response() {
        let body = response(serde_json::json!({}));
        assert_eq!(interpret_response(body), Err(GenerationError::EmptyResponse));
    }

    #[test]
    fn test_text_only_is_cleaned_and_truncated() {
        let long = format!("**Sorry** # {}", "x".repeat(300));
        let body = response(serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": long}]}}]
        }));
        match interpret_response(body) {
            Err(GenerationError::TextOnly { message }) => {
                assert!(message.starts_with("Sorry  x"));
                assert!(message.ends_with("..."));
                assert_eq!(message.chars().count(), MAX_REFUSAL_CHARS + 3);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_short_refusal_is_kept_whole() {
        assert_eq!(
            summarize_refusal("  I cannot create that image.  "),
            "I cannot create that image."
        );
    }

    #[test]
    fn test_parts_without_image_or_text() {
        let body = response(serde_json::json!({
            "candidates": [{"content": {"parts": [{}]}}]
        }));
        assert_eq!(interpret_response(body), Err(GenerationError::NoImage));
    }

    #[test]
    fn test_malformed_body_is_not_a_network_error() {
        let err = decode_response("<html>Service Unavailable</html>").unwrap_err();
        assert!(matches!(err, GenerationError::InvalidResponse(_)));
        assert!(!err.to_string().to_lowercase().contains("network"));

        let ok = decode_response(r#"{"candidates":[]}"#).unwrap();
        assert_eq!(
            interpret_response(ok).unwrap_err(),
            GenerationError::EmptyResponse
        );
    }

    #[test]
    fn test_http_error_keeps_status() {
        let err = http_error(429, "RESOURCE_EXHAUSTED: quota exceeded");
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("quota"));
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let config = ModelProvider::default();
        if env::var("GEMINI_API_KEY").is_err() {
            assert!(matches!(
                GeminiImageClient::from_settings(&config),
                Err(GenerationError::Config(_))
            ));
        }
    }
}
