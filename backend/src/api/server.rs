//! HTTP server for the panel pipeline.
//!
//! # API Endpoints
//!
//! | Method | Path                  | Description                          |
//! |--------|-----------------------|--------------------------------------|
//! | GET    | `/health`             | Health check                         |
//! | POST   | `/api/analyze`        | Upload a TSV table for analysis      |
//! | GET    | `/api/resolve/{code}` | Display name and flag of a geo code  |
//! | GET    | `/api/logs`           | SSE stream for real-time logs        |

use axum::{
    extract::{Multipart, Path, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, Json, Sse},
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
use super::types::{error_response, AnalysisResponse};
use crate::error::{PipelineError, ServerError, ServerResult};
use crate::resolve::{resolve, CodeDisplay};
use crate::transform::pipeline::{analyze_bytes, AnalysisOptions};

type ApiError = (StatusCode, Json<Value>);

/// Build the router with `base` as the default analysis options.
pub fn router(base: AnalysisOptions) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/analyze", post(analyze_upload))
        .route("/api/resolve/{code}", get(resolve_code))
        .route("/api/logs", get(sse_logs))
        .with_state(Arc::new(base))
        .layer(cors)
}

/// Start the HTTP server
pub async fn start_server(port: u16, base: AnalysisOptions) -> ServerResult<()> {
    let app = router(base);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🚀 HTEC panel server running on http://localhost:{}", port);
    println!("   POST /api/analyze       - Upload TSV table");
    println!("   GET  /api/resolve/:code - Resolve a geo code");
    println!("   GET  /api/logs          - SSE log stream");
    println!("   GET  /health            - Health check");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))?;
    axum::serve(listener, app)
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))?;

    Ok(())
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "htec",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "analyze": "POST /api/analyze",
            "resolve": "GET /api/resolve/{code}",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

async fn resolve_code(Path(code): Path<String>) -> Json<CodeDisplay> {
    Json(resolve(&code))
}

async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Split a comma list form field. An empty field is an empty list.
pub fn parse_list(field: &str) -> Vec<String> {
    field
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn bad_request(message: String) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(error_response(&message)))
}

fn status_for(err: &ServerError) -> StatusCode {
    match err {
        ServerError::Pipeline(PipelineError::Schema(_)) => StatusCode::UNPROCESSABLE_ENTITY,
        ServerError::Pipeline(PipelineError::Tsv(_)) => StatusCode::BAD_REQUEST,
        ServerError::Pipeline(PipelineError::UnknownDimension(_)) => StatusCode::BAD_REQUEST,
        ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn into_api_error(err: ServerError) -> ApiError {
    log_error(err.to_string());
    (status_for(&err), Json(error_response(&err.to_string())))
}

/// Upload endpoint: multipart `file` plus optional selection fields.
async fn analyze_upload(
    State(base): State<Arc<AnalysisOptions>>,
    mut multipart: Multipart,
) -> Result<Json<AnalysisResponse>, ApiError> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;
    let mut options = (*base).clone();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(format!("Multipart error: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();

        if name == "file" {
            file_name = field.file_name().map(|s| s.to_string());
            file_data = Some(
                field
                    .bytes()
                    .await
                    .map_err(|e| bad_request(format!("Read error: {}", e)))?
                    .to_vec(),
            );
            continue;
        }

        let text = field
            .text()
            .await
            .map_err(|e| bad_request(format!("Read error: {}", e)))?;

        match name.as_str() {
            "education" => options.education = Some(parse_list(&text)),
            "geo" => options.geography = Some(parse_list(&text)),
            "sector" => options.sectors = parse_list(&text),
            "unit" => options.unit = text.trim().to_string(),
            "category" => {
                options.category = text
                    .parse()
                    .map_err(|e: PipelineError| into_api_error(e.into()))?
            }
            _ => {}
        }
    }

    let bytes = file_data.ok_or_else(|| bad_request("No file provided".to_string()))?;

    log_info(format!(
        "📄 New upload: {} ({} bytes)",
        file_name.as_deref().unwrap_or("unknown"),
        bytes.len()
    ));

    let output = tokio::task::spawn_blocking(move || analyze_bytes(&bytes, &options))
        .await
        .map_err(|e| into_api_error(ServerError::Internal(e.to_string())))?
        .map_err(|e| into_api_error(e.into()))?;

    Ok(Json(AnalysisResponse::from(output)))
}
