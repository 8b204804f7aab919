//! Shared test fixtures: an in-process mock upstream that plays both the
//! inference endpoint and an image host, plus gateway config helpers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use actix_web::http::StatusCode;
use actix_web::{App, HttpRequest, HttpResponse, HttpServer, web};
use produce_gateway::config::GatewayConfig;
use serde_json::{Value, json};

/// Canned behavior for the mock upstream.
#[derive(Clone)]
pub struct MockUpstreamConfig {
    pub generate_status: u16,
    pub generate_body: Value,
    pub image_status: u16,
    pub image_body: Vec<u8>,
    pub image_content_type: Option<String>,
}

impl Default for MockUpstreamConfig {
    fn default() -> Self {
        Self {
            generate_status: 200,
            generate_body: json!({
                "candidates": [{ "content": { "parts": [{ "text": "{\"summary\":\"ripe\"}" }] } }]
            }),
            image_status: 200,
            // JFIF magic, enough to look like a jpeg body
            image_body: vec![0xFF, 0xD8, 0xFF, 0xE0],
            image_content_type: Some("image/jpeg".to_string()),
        }
    }
}

struct MockState {
    config: MockUpstreamConfig,
    generate_hits: AtomicUsize,
    image_hits: AtomicUsize,
    last_generate_path: Mutex<Option<String>>,
}

pub struct MockUpstream {
    pub base_url: String,
    state: Arc<MockState>,
    handle: actix_web::dev::ServerHandle,
}

impl MockUpstream {
    pub async fn start(config: MockUpstreamConfig) -> Self {
        let state = Arc::new(MockState {
            config,
            generate_hits: AtomicUsize::new(0),
            image_hits: AtomicUsize::new(0),
            last_generate_path: Mutex::new(None),
        });
        let data = web::Data::from(state.clone());
        let server = HttpServer::new(move || {
            App::new()
                .app_data(data.clone())
                .default_service(web::route().to(serve))
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .expect("failed to bind mock upstream");
        let addr = server.addrs()[0];
        let server = server.run();
        let handle = server.handle();
        actix_web::rt::spawn(server);
        Self {
            base_url: format!("http://{addr}"),
            state,
            handle,
        }
    }

    pub fn generate_hits(&self) -> usize {
        self.state.generate_hits.load(Ordering::SeqCst)
    }

    pub fn image_hits(&self) -> usize {
        self.state.image_hits.load(Ordering::SeqCst)
    }

    pub fn last_generate_path(&self) -> Option<String> {
        self.state.last_generate_path.lock().unwrap().clone()
    }

    pub async fn stop(self) {
        self.handle.stop(false).await;
    }
}

async fn serve(req: HttpRequest, state: web::Data<MockState>) -> HttpResponse {
    if req.path().ends_with(":generateContent") {
        state.generate_hits.fetch_add(1, Ordering::SeqCst);
        *state.last_generate_path.lock().unwrap() = Some(req.path().to_string());
        let status = StatusCode::from_u16(state.config.generate_status).unwrap();
        return HttpResponse::build(status).json(state.config.generate_body.clone());
    }

    state.image_hits.fetch_add(1, Ordering::SeqCst);
    let status = StatusCode::from_u16(state.config.image_status).unwrap();
    let mut response = HttpResponse::build(status);
    if let Some(content_type) = &state.config.image_content_type {
        response.content_type(content_type.as_str());
    }
    response.body(state.config.image_body.clone())
}

pub fn gateway_config(base_url: &str) -> GatewayConfig {
    GatewayConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        api_key: "test-key".to_string(),
        model: "gemini-2.0-flash".to_string(),
        base_url: base_url.to_string(),
        max_body_bytes: 15 * 1024 * 1024,
        default_image_url: format!("{base_url}/placeholder.jpg"),
    }
}
