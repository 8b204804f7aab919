//! Resolves a caller-supplied image reference into inline base64 data for the
//! upstream call.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::CONTENT_TYPE;

use crate::config::GatewayConfig;
use crate::error::GatewayError;

/// Mime type assumed when a fetched image carries no Content-Type header.
const FALLBACK_MIME_TYPE: &str = "image/jpeg";

/// An image payload ready for inline submission upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    /// Base64-encoded image bytes.
    pub data: String,
}

/// Parse a strict `data:<mime>;base64,<payload>` URL.
///
/// Returns `None` for anything else; the caller treats those references as
/// remote URLs rather than rejecting them.
pub fn parse_data_url(reference: &str) -> Option<InlineImage> {
    let rest = reference.strip_prefix("data:")?;
    let (mime_type, data) = rest.split_once(";base64,")?;
    Some(InlineImage {
        mime_type: mime_type.to_string(),
        data: data.to_string(),
    })
}

/// Resolve an optional image reference into an [`InlineImage`].
///
/// Absent references fall back to the configured placeholder image. Strict
/// data URLs are decoded in place with no network call; every other reference
/// is fetched over HTTP and re-encoded. Remote images are re-fetched on every
/// request, the placeholder included.
pub async fn resolve_image(
    client: &reqwest::Client,
    config: &GatewayConfig,
    image_ref: Option<&str>,
) -> Result<InlineImage, GatewayError> {
    let reference = image_ref.unwrap_or(&config.default_image_url);
    if let Some(inline) = parse_data_url(reference) {
        return Ok(inline);
    }
    fetch_remote(client, reference).await
}

async fn fetch_remote(
    client: &reqwest::Client,
    url: &str,
) -> Result<InlineImage, GatewayError> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(GatewayError::ImageFetch {
            status: status.as_u16(),
        });
    }
    let mime_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or(FALLBACK_MIME_TYPE)
        .to_string();
    let bytes = response.bytes().await?;
    Ok(InlineImage {
        mime_type,
        data: STANDARD.encode(&bytes),
    })
}
