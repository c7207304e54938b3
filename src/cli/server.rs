//! HTTP server mode for paginated collection access

use axum::{
    extract::{OriginalUri, Path, RawQuery, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use url::Url;

use crate::catalog::Catalog;
use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::pagination::PaginationQuery;

/// Server configuration
#[derive(Clone)]
pub struct ServerConfig {
    /// Collections to serve
    pub catalog: Catalog,
    /// Public base URL for page links; the Host header is used when absent
    pub base_url: Option<Url>,
}

impl ServerConfig {
    /// Open every configured collection
    pub fn from_app_config(config: &AppConfig) -> Result<Self> {
        let base_url = config
            .server
            .base_url
            .as_deref()
            .map(Url::parse)
            .transpose()?;

        Ok(Self {
            catalog: Catalog::from_config(config)?,
            base_url,
        })
    }
}

/// App state shared across handlers
struct AppState {
    config: ServerConfig,
}

/// Build the router serving `config`
pub fn build_router(config: ServerConfig) -> Router {
    let state = AppState { config };

    // Build CORS layer - allow all origins
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/collections", get(list_collections))
        .route("/collections/:name", get(list_page))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Start the HTTP server
pub async fn serve(config: ServerConfig, port: u16) -> Result<()> {
    let app = build_router(config);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Starting HTTP server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::config(format!("Failed to bind to port {port}: {e}")))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| Error::config(format!("Server error: {e}")))?;

    Ok(())
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// List collection names
async fn list_collections(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({ "collections": state.config.catalog.names() }))
}

/// One page of a collection
async fn list_page(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    OriginalUri(uri): OriginalUri,
    RawQuery(raw): RawQuery,
    headers: HeaderMap,
) -> Response {
    let query = pagination_query(raw.as_deref().unwrap_or_default());

    let path_and_query = uri.path_and_query().map_or("/", |pq| pq.as_str());
    let url = match request_url(state.config.base_url.as_ref(), &headers, path_and_query) {
        Ok(url) => url,
        Err(e) => return error_response(&e),
    };

    match state.config.catalog.page(&name, &query, &url).await {
        Ok(envelope) => (StatusCode::OK, Json(envelope)).into_response(),
        Err(e) => error_response(&e),
    }
}

/// Pick the pagination parameters out of a query string. When a key
/// repeats, the last value wins.
fn pagination_query(raw: &str) -> PaginationQuery {
    let mut query = PaginationQuery::default();
    for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
        match key.as_ref() {
            "limit" => query.limit = Some(value.into_owned()),
            "cursor" => query.cursor = Some(value.into_owned()),
            _ => {}
        }
    }
    query
}

/// Absolute URL of the current request, used as the base for page links
fn request_url(base_url: Option<&Url>, headers: &HeaderMap, path_and_query: &str) -> Result<Url> {
    let base = match base_url {
        Some(url) => url.as_str().trim_end_matches('/').to_string(),
        None => {
            let host = headers
                .get(header::HOST)
                .and_then(|h| h.to_str().ok())
                .unwrap_or("localhost");
            format!("http://{host}")
        }
    };

    Ok(Url::parse(&format!("{base}{path_and_query}"))?)
}

fn error_response(error: &Error) -> Response {
    if let Some(field) = error.field() {
        let body = json!({
            "detail": [{
                "loc": ["query", field],
                "msg": error.to_string(),
                "type": "value_error",
            }]
        });
        return (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response();
    }

    let status = match error {
        Error::CollectionNotFound { .. } => StatusCode::NOT_FOUND,
        _ => {
            tracing::error!(error = %error, "Request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    (status, Json(json!({ "detail": error.to_string() }))).into_response()
}
