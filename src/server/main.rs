//! HTTP server for coordinate → administrative location lookups.
//!
//! Serves `GET /geocode?longitude=..&latitude=..`, `POST /geocode` with a JSON
//! body, and `GET /health`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use adlocate::pip::CacheStats;
use adlocate::{Config, LocationResult, Resolver};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "adlocate")]
#[command(about = "Reverse administrative lookup server")]
struct Args {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address (overrides config)
    #[arg(short, long)]
    listen: Option<String>,

    /// Boundary data directory (overrides config)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Re-read child datasets on every request
    #[arg(long)]
    no_cache: bool,
}

impl Args {
    fn into_config(self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load_from_file(path)
                .with_context(|| format!("Loading config from {}", path.display()))?,
            None => Config::default(),
        };

        if let Some(listen) = self.listen {
            config.listen = listen;
        }
        if let Some(data_dir) = self.data_dir {
            config.data_dir = data_dir;
        }
        if self.no_cache {
            config.cache = false;
        }

        Ok(config)
    }
}

/// Application state shared across handlers
struct AppState {
    resolver: Arc<Resolver>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Args::parse().into_config()?;

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("adlocate server");
    info!(
        "Loading boundaries from {} (cache {})",
        config.data_dir.display(),
        if config.cache { "on" } else { "off" }
    );

    let loader_config = config.clone();
    let resolver = tokio::task::spawn_blocking(move || Resolver::from_config(&loader_config))
        .await?
        .context("Failed to load root dataset")?;
    info!("Root dataset ready with {} provinces", resolver.provinces().len());

    let state = Arc::new(AppState {
        resolver: Arc::new(resolver),
    });

    let app = router(state);

    info!("Starting server on {}", config.listen);

    let listener = tokio::net::TcpListener::bind(&config.listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/geocode", get(geocode_get_handler).post(geocode_post_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct Coordinates {
    longitude: f64,
    latitude: f64,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn api_error(status: StatusCode, detail: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorBody {
            detail: detail.into(),
        }),
    )
}

/// Health check endpoint
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        provinces: state.resolver.provinces().len(),
        cache_enabled: state.resolver.cache_enabled(),
        cache: state.resolver.cache_stats(),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    provinces: usize,
    cache_enabled: bool,
    cache: CacheStats,
}

/// Reverse lookup from query parameters
async fn geocode_get_handler(
    State(state): State<Arc<AppState>>,
    Query(coords): Query<Coordinates>,
) -> Result<Json<LocationResult>, ApiError> {
    resolve(&state, coords).await
}

/// Reverse lookup from a JSON body
async fn geocode_post_handler(
    State(state): State<Arc<AppState>>,
    Json(coords): Json<Coordinates>,
) -> Result<Json<LocationResult>, ApiError> {
    resolve(&state, coords).await
}

/// Run the lookup off the async workers; first loads of a dataset hit the disk.
async fn resolve(state: &AppState, coords: Coordinates) -> Result<Json<LocationResult>, ApiError> {
    let resolver = Arc::clone(&state.resolver);
    let outcome =
        tokio::task::spawn_blocking(move || resolver.resolve(coords.longitude, coords.latitude))
            .await
            .map_err(|e| {
                error!("Lookup task failed: {}", e);
                api_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            })?;

    match outcome {
        Ok(location) => Ok(Json(location)),
        Err(err) if err.is_client_error() => {
            Err(api_error(StatusCode::BAD_REQUEST, err.to_string()))
        }
        Err(err) => {
            error!("Lookup failed: {}", err);
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Boundary data unavailable",
            ))
        }
    }
}
