//! HTTP server for triggering and monitoring pipeline runs.
//!
//! The data boundary stays tabular: raw tables in, mart tables out. The
//! server only operates the batch — it triggers a full-refresh run over the
//! configured directories and streams the run narration.
//!
//! # API Endpoints
//!
//! | Method | Path              | Description                          |
//! |--------|-------------------|--------------------------------------|
//! | GET    | `/health`         | Health check                         |
//! | POST   | `/api/run`        | Run the full transformation pipeline |
//! | GET    | `/api/logs`       | SSE stream for real-time run logs    |

use axum::{
    http::{header, Method, StatusCode},
    response::{sse::Event, Json, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::LOG_BROADCASTER;
use super::types::{error_response, RunResponse};
use crate::transform::pipeline::{run_pipeline, PipelineOptions};

/// Start the HTTP server
pub async fn start_server(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    let app = Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/run", post(trigger_run))
        .route("/api/logs", get(sse_logs))
        .layer(cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🚀 sdgmart server running on http://localhost:{}", port);
    println!("   POST /api/run  - Run the transformation pipeline");
    println!("   GET  /api/logs - SSE log stream");
    println!("   GET  /health   - Health check");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "sdgmart",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "run": "POST /api/run",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time log streaming
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

/// Trigger a full-refresh pipeline run over the configured directories.
async fn trigger_run() -> Result<Json<RunResponse>, (StatusCode, Json<Value>)> {
    let options = PipelineOptions::from_env();

    println!("\n{}", "=".repeat(70));
    println!(
        "📄 RUN REQUESTED: {} → {}",
        options.data_dir.display(),
        options.mart_dir.display()
    );
    println!("{}\n", "=".repeat(70));

    let run = run_pipeline(options).await.map_err(|e| {
        eprintln!("❌ Pipeline error: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(error_response(&e.to_string())),
        )
    })?;

    println!("\n{}", "=".repeat(70));
    println!("📊 SUMMARY");
    println!("{}", "=".repeat(70));
    for (table, rows) in run.marts.row_counts() {
        println!("   {:25} {} rows", table, rows);
    }
    println!("{}\n", "=".repeat(70));

    Ok(Json(RunResponse::from(&run)))
}
