//! HTTP adapter exposing the crawl pipeline.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::{
    classify::ServerErrorsFailureClass,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};

use crate::error::CrawlError;
use crate::models::AdRecord;
use crate::scrapers::traits::ListingSource;
use crate::scrapers::types::SearchFilters;

const SEARCH_PATH: &str = "/inserate";
const HEALTH_PATH: &str = "/health";
const INDEX_PATH: &str = "/";
const HEALTH_STATUS: &str = "OK";
const SEARCH_EXAMPLE: &str =
    "/inserate?query=lampe&plz=10115&radius=20&category_id=c161&location_id=l3331";

pub type DynListingSource = Arc<dyn ListingSource>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind to {address}: {source}")]
    Bind {
        address: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("axum server error: {source}")]
    Serve {
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Serialize)]
struct SearchResponse {
    success: bool,
    data: Vec<AdRecord>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    success: bool,
    detail: String,
}

#[derive(Debug, Serialize)]
struct Endpoints {
    search: &'static str,
    health: &'static str,
}

#[derive(Debug, Serialize)]
struct IndexResponse {
    message: &'static str,
    version: &'static str,
    endpoints: Endpoints,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: String,
}

enum ApiError {
    BadRequest(String),
    Crawl(CrawlError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, detail),
            ApiError::Crawl(err) if err.is_client_error() => (StatusCode::BAD_REQUEST, err.to_string()),
            ApiError::Crawl(err) => {
                error!(error = %err, "crawl failed");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        };
        let body = ErrorResponse {
            success: false,
            detail,
        };
        (status, Json(body)).into_response()
    }
}

/// Routes with CORS open to every origin; request tracing is added by `serve`
pub fn build_api_router(source: DynListingSource) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(INDEX_PATH, get(index))
        .route(SEARCH_PATH, get(search_ads))
        .route(HEALTH_PATH, get(health))
        .with_state(source)
        .layer(cors)
}

async fn index() -> Json<IndexResponse> {
    Json(IndexResponse {
        message: "Kleinanzeigen listing search API",
        version: env!("CARGO_PKG_VERSION"),
        endpoints: Endpoints {
            search: SEARCH_EXAMPLE,
            health: HEALTH_PATH,
        },
    })
}

async fn search_ads(
    State(source): State<DynListingSource>,
    filters: Result<Query<SearchFilters>, QueryRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let Query(filters) = filters.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    info!(source = source.source_name(), pages = filters.page_count.get(), "search requested");

    let data = source.search(&filters).await.map_err(ApiError::Crawl)?;
    Ok(Json(SearchResponse {
        success: true,
        data,
    }))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: HEALTH_STATUS,
        timestamp: Utc::now().to_rfc3339(),
    })
}

fn build_app_router(source: DynListingSource) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<_>| {
            tracing::info_span!(
                "http.request",
                method = %request.method(),
                path = %request.uri().path(),
            )
        })
        .on_response(|response: &Response, latency: Duration, span: &tracing::Span| {
            let status = response.status().as_u16();
            let latency_ms = latency.as_millis() as u64;
            info!(parent: span, status, latency_ms, "request completed");
        })
        .on_failure(
            |error: ServerErrorsFailureClass, latency: Duration, span: &tracing::Span| {
                let latency_ms = latency.as_millis() as u64;
                error!(parent: span, latency_ms, error = %error, "request failed");
            },
        );

    build_api_router(source).layer(trace_layer)
}

/// Serve until Ctrl+C or SIGTERM
pub async fn serve(address: SocketAddr, source: DynListingSource) -> Result<(), ServerError> {
    let listener = TcpListener::bind(address)
        .await
        .map_err(|source| ServerError::Bind { address, source })?;
    let local_addr = listener.local_addr().unwrap_or(address);
    info!(%local_addr, "kleinanzeigen scout listening");

    axum::serve(listener, build_app_router(source))
        .with_graceful_shutdown(wait_for_shutdown())
        .await
        .map_err(|source| ServerError::Serve { source })?;

    info!("server shutdown complete");
    Ok(())
}

async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            warn!(%error, "failed to capture Ctrl+C signal");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(error) => {
                warn!(%error, "failed to capture SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = sigterm => {},
    }
}
