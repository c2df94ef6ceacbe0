use axum::{
    Json, Router,
    http::StatusCode,
    routing::{get, post},
};
use cut_layout::config::SolverConfig;
use cut_layout::request::{OptimizeRequest, OptimizeResponse};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

async fn optimize(
    Json(req): Json<OptimizeRequest>,
) -> Result<Json<OptimizeResponse>, (StatusCode, String)> {
    tracing::info!(
        body = serde_json::to_string(&req).unwrap_or_default(),
        "POST /optimize"
    );

    req.validate()
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    // The search is CPU bound and fans out on the rayon pool
    let response = tokio::task::spawn_blocking(move || req.solve(SolverConfig::default()))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "optimization task failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "optimization failed".to_string())
        })?
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    tracing::info!(
        bins = response.metrics.bins_used,
        placed = response.metrics.placed_pieces,
        total = response.metrics.total_pieces,
        waste_percent = response.metrics.waste_percent,
        "optimized"
    );
    Ok(Json(response))
}

fn init_logging() -> std::io::Result<()> {
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open("development.log")?;
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_target(false)
        .with_ansi(false)
        .with_max_level(Level::INFO)
        .init();
    Ok(())
}

fn router() -> Router {
    Router::new()
        .route("/up", get(|| async { "ok" }))
        .route("/optimize", post(optimize))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Reporting stays off unless a DSN is configured
    let _sentry = std::env::var("SENTRY_DSN").ok().map(|dsn| {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });
    init_logging()?;

    let port = std::env::var("PORT").unwrap_or_else(|_| "3001".to_string());
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "listening");
    eprintln!("Listening on {addr}");
    axum::serve(listener, router()).await
}
