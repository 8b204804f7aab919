//! Process-wide configuration, resolved once at startup and read-only
//! afterwards.

pub const DEFAULT_PORT: u16 = 8787;
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MAX_BODY_BYTES: usize = 15 * 1024 * 1024;

/// Placeholder fetched when a request carries no `imageData`.
pub const DEFAULT_IMAGE_URL: &str =
    "https://images.unsplash.com/photo-1560806887-1e4cd0b6cbd6?w=800&q=80";

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    /// Upstream credential, sent as a `key` query parameter.
    pub api_key: String,
    /// Model id used when the caller does not supply one.
    pub model: String,
    /// Base URL of the Generative Language API.
    pub base_url: String,
    /// Inbound request body cap in bytes.
    pub max_body_bytes: usize,
    /// Image fetched when the caller omits `imageData`.
    pub default_image_url: String,
}
