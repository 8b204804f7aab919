use clap::Parser;
use produce_gateway::config::{self, GatewayConfig};
use produce_gateway::server;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "produce-gateway")]
#[command(about = "HTTP gateway that forwards produce images to Gemini for quality inspection")]
struct CliArgs {
    /// Host address to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to bind
    #[arg(long, env = "PORT", default_value_t = config::DEFAULT_PORT)]
    port: u16,

    /// Upstream API key; the process refuses to start without one
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Model id used when a request does not specify one
    #[arg(long, env = "GEMINI_MODEL", default_value = config::DEFAULT_MODEL)]
    model: String,

    /// Base URL of the Generative Language API
    #[arg(long, env = "GEMINI_API_URL", default_value = config::DEFAULT_BASE_URL)]
    base_url: String,

    /// Maximum accepted request body size in bytes
    #[arg(long, env = "MAX_BODY_BYTES", default_value_t = config::DEFAULT_MAX_BODY_BYTES)]
    max_body_bytes: usize,
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = CliArgs::parse();
    let Some(api_key) = args.api_key else {
        anyhow::bail!("GEMINI_API_KEY is not set; refusing to start");
    };

    let gateway_config = GatewayConfig {
        host: args.host,
        port: args.port,
        api_key,
        model: args.model,
        base_url: args.base_url,
        max_body_bytes: args.max_body_bytes,
        default_image_url: config::DEFAULT_IMAGE_URL.to_string(),
    };
    server::startup(gateway_config).await
}
