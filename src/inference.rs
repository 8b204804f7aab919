//! Builds and issues the upstream generateContent call and translates its
//! response into a stable outcome.

use anyhow::anyhow;
use reqwest::Url;
use serde::Serialize;
use serde_json::{Value, json};

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::image::InlineImage;

/// Instruction sent alongside every image. The response format is pinned to
/// strict JSON so clients can parse the verdict directly.
const ANALYSIS_PROMPT: &str = "You are an expert produce quality inspector. \
Analyze the fruit or vegetable in this image and respond with strict JSON only, \
no markdown fences, using exactly this schema: \
{\"produce_name\": string, \"ripeness\": integer 1-5, \"freshness\": integer 1-5, \
\"confidence\": integer 0-100, \"shelf_life\": string, \"defects\": [string], \
\"summary\": string, \"estimated_price\": string}.";

const GENERIC_UPSTREAM_MESSAGE: &str = "Upstream request failed";

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    response_mime_type: &'static str,
}

/// Successful upstream translation: extracted text plus the raw payload.
#[derive(Debug)]
pub struct InferenceOutcome {
    pub text: String,
    pub raw: Value,
}

/// Strip the `models/` prefix callers sometimes include; the REST path wants a
/// bare id. An absent candidate resolves to the configured default.
pub fn normalize_model<'a>(candidate: Option<&'a str>, default: &'a str) -> &'a str {
    let model = candidate.unwrap_or(default);
    model.strip_prefix("models/").unwrap_or(model)
}

fn build_generate_url(base_url: &str, model: &str) -> Result<Url, GatewayError> {
    let mut url = Url::parse(base_url)
        .map_err(|err| GatewayError::Internal(anyhow!("invalid upstream base URL: {err}")))?;
    url.path_segments_mut()
        .map_err(|()| GatewayError::Internal(anyhow!("upstream base URL cannot be a base")))?
        .pop_if_empty()
        .push("models")
        .push(&format!("{model}:generateContent"));
    Ok(url)
}

/// Issue a single generateContent call with the given inline image.
///
/// One attempt, no retries; upstream failures propagate to the caller with
/// their status, message and raw payload attached.
pub async fn infer(
    client: &reqwest::Client,
    config: &GatewayConfig,
    image: InlineImage,
    model: Option<&str>,
) -> Result<InferenceOutcome, GatewayError> {
    let model = normalize_model(model, &config.model);
    let url = build_generate_url(&config.base_url, model)?;

    let request = GenerateRequest {
        contents: vec![Content {
            parts: vec![
                Part {
                    text: Some(ANALYSIS_PROMPT.to_string()),
                    inline_data: None,
                },
                Part {
                    text: None,
                    inline_data: Some(InlineData {
                        mime_type: image.mime_type,
                        data: image.data,
                    }),
                },
            ],
        }],
        generation_config: GenerationConfig {
            temperature: 0.2,
            max_output_tokens: 1200,
            response_mime_type: "application/json",
        },
    };

    let response = client
        .post(url)
        .query(&[("key", config.api_key.as_str())])
        .json(&request)
        .send()
        .await?;
    let status = response.status();
    let body = response.bytes().await?;
    // A body that is not JSON is treated as an empty payload, not a failure.
    let raw: Value = serde_json::from_slice(&body).unwrap_or_else(|_| json!({}));

    if !status.is_success() {
        return Err(GatewayError::Upstream {
            status: status.as_u16(),
            message: upstream_error_message(&raw),
            payload: raw,
        });
    }

    let text = extract_text(&raw);
    Ok(InferenceOutcome { text, raw })
}

fn upstream_error_message(payload: &Value) -> String {
    payload
        .pointer("/error/message")
        .and_then(Value::as_str)
        .unwrap_or(GENERIC_UPSTREAM_MESSAGE)
        .to_string()
}

/// Concatenate the non-empty text parts of the first candidate. A response
/// with no candidates or no text parts yields an empty string.
fn extract_text(payload: &Value) -> String {
    let Some(parts) = payload
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
    else {
        return String::new();
    };
    parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
