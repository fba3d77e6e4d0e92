//! HTTP server for the Formbridge API.
//!
//! # API Endpoints
//!
//! | Method | Path              | Description                          |
//! |--------|-------------------|--------------------------------------|
//! | GET    | `/health`         | Health check                         |
//! | POST   | `/api/convert`    | Convert a JSON workbook              |
//! | GET    | `/api/logs`       | SSE stream for real-time logs        |

use axum::{
    extract::State,
    http::{header, Method, StatusCode},
    response::{sse::Event, IntoResponse, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_error, log_info, LOG_BROADCASTER};
use super::types::{error_response, ConvertRequest, ConvertResponse};
use crate::error::{PipelineError, ServerError, ServerResult};
use crate::transform::pipeline::{convert_workbook, ConvertOptions};

/// Options every request starts from.
type SharedOptions = Arc<ConvertOptions>;

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServerError::BadRequest(_) | ServerError::Pipeline(PipelineError::MissingSurvey) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        log_error(self.to_string());
        (status, Json(error_response(&self.to_string()))).into_response()
    }
}

/// Router with every endpoint and a permissive CORS layer.
pub fn router(defaults: ConvertOptions) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/convert", post(convert))
        .route("/api/logs", get(sse_logs))
        .layer(cors)
        .with_state(Arc::new(defaults))
}

/// Bind and serve until the process is stopped.
pub async fn start_server(port: u16, defaults: ConvertOptions) -> ServerResult<()> {
    let app = router(defaults);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🚀 Formbridge server running on http://localhost:{}", port);
    println!("   POST /api/convert - Convert a JSON workbook");
    println!("   GET  /api/logs    - SSE log stream");
    println!("   GET  /health      - Health check");
    println!();

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "formbridge",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "convert": "POST /api/convert",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    // Lagged receivers skip what they missed.
    let stream = BroadcastStream::new(rx).filter_map(|result| {
        let entry = result.ok()?;
        let json = serde_json::to_string(&entry).ok()?;
        Some(Ok(Event::default().data(json)))
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

async fn convert(
    State(defaults): State<SharedOptions>,
    Json(request): Json<ConvertRequest>,
) -> Result<Json<ConvertResponse>, ServerError> {
    if request.form_name.trim().is_empty() {
        return Err(ServerError::BadRequest("formName is required".to_string()));
    }
    let options = request.options(&defaults);

    println!("\n{}", "=".repeat(70));
    println!("📄 NEW CONVERSION: {}", options.form_name);
    println!("{}\n", "=".repeat(70));
    let missing = request.workbook.missing_sheets();
    if !missing.is_empty() {
        let names: Vec<&str> = missing.iter().map(|k| k.as_str()).collect();
        log_info(format!("Missing sheets: {}", names.join(", ")));
    }

    let workbook = request.workbook;
    let form = tokio::task::spawn_blocking(move || convert_workbook(workbook, &options))
        .await
        .map_err(|e| ServerError::Io(std::io::Error::other(e)))??;

    Ok(Json(ConvertResponse::from(form)))
}
