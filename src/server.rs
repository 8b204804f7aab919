//! The client-facing HTTP surface: bounded body ingestion, orchestration of
//! the resolve/infer pipeline, and response mapping.

use actix_web::http::Method;
use actix_web::{App, Error, HttpRequest, HttpResponse, HttpServer, ResponseError as _};
use actix_web::{middleware, web};
use anyhow::Context as _;
use bytes::BytesMut;
use futures_util::StreamExt as _;
use serde_json::{Value, json};
use tracing::{error, info};

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::{image, inference};

/// Read-only per-process state shared across requests.
pub struct AppState {
    pub config: GatewayConfig,
    pub client: reqwest::Client,
}

impl AppState {
    pub fn new(config: GatewayConfig) -> anyhow::Result<Self> {
        // No global timeout: a hanging upstream call only ties up its own
        // request.
        let client = reqwest::Client::builder()
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { config, client })
    }
}

/// Accumulate the request body, rejecting it as soon as the running total
/// would exceed `limit`. The body cannot be re-read once partially consumed,
/// so there is no retry path.
pub async fn read_body(
    payload: &mut web::Payload,
    limit: usize,
) -> Result<BytesMut, GatewayError> {
    let mut body = BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk?;
        if body.len() + chunk.len() > limit {
            return Err(GatewayError::PayloadTooLarge { limit });
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

pub async fn analyze(mut payload: web::Payload, state: web::Data<AppState>) -> HttpResponse {
    match handle_analyze(&mut payload, &state).await {
        Ok(response) => response,
        Err(err) => {
            error!("analyze request failed: {err}");
            err.error_response()
        }
    }
}

async fn handle_analyze(
    payload: &mut web::Payload,
    state: &AppState,
) -> Result<HttpResponse, GatewayError> {
    let body = read_body(payload, state.config.max_body_bytes).await?;
    // An empty body is an empty request, not a parse error.
    let parsed: Value = if body.is_empty() {
        json!({})
    } else {
        serde_json::from_slice(&body).map_err(|_| GatewayError::InvalidJson)?
    };
    // Both fields are optional and extracted leniently: non-object bodies and
    // wrong-typed fields behave as if the fields were absent.
    let image_data = parsed.get("imageData").and_then(Value::as_str);
    let model = parsed.get("model").and_then(Value::as_str);

    let inline = image::resolve_image(&state.client, &state.config, image_data).await?;
    let outcome = inference::infer(&state.client, &state.config, inline, model).await?;

    Ok(HttpResponse::Ok().json(json!({
        "provider": "gemini",
        "choices": [{ "message": { "content": outcome.text } }],
        "raw": outcome.raw,
    })))
}

/// Preflight and unmatched-route handler. The payload is drained first so the
/// connection stays reusable.
pub async fn fallback(req: HttpRequest, mut payload: web::Payload) -> Result<HttpResponse, Error> {
    while let Some(chunk) = payload.next().await {
        if chunk.is_err() {
            break;
        }
    }
    if req.method() == Method::OPTIONS {
        return Ok(HttpResponse::NoContent().finish());
    }
    Ok(HttpResponse::NotFound().json(json!({ "error": "Not found" })))
}

/// Cross-origin headers attached to every response, errors included.
pub fn cors_headers() -> middleware::DefaultHeaders {
    middleware::DefaultHeaders::new()
        .add(("Access-Control-Allow-Origin", "*"))
        .add(("Access-Control-Allow-Methods", "POST, OPTIONS"))
        .add(("Access-Control-Allow-Headers", "Content-Type, Authorization"))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/analyze")
            .route(web::post().to(analyze))
            .default_service(web::route().to(fallback)),
    )
    .default_service(web::route().to(fallback));
}

pub async fn startup(config: GatewayConfig) -> anyhow::Result<()> {
    info!("Starting produce gateway on {}:{}", config.host, config.port);
    info!("Default model: {}", config.model);
    info!("Upstream base URL: {}", config.base_url);
    info!("Max request body: {} bytes", config.max_body_bytes);

    let bind_addr = (config.host.clone(), config.port);
    let state = web::Data::new(AppState::new(config)?);

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .wrap(cors_headers())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind(bind_addr)?
    .run()
    .await?;
    Ok(())
}
