//! Read-only HTTP API over the artifact store.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/.well-known/healthcheck` | Liveness |
//! | `GET` | `/.well-known/readiness` | 200 once the store is loaded, 503 before |
//! | `GET` | `/bible` | Every book with verses and chapters |
//! | `GET` | `/bible/books` | Book names in reference order |
//! | `GET` | `/bible/{book}` | One book |
//! | `GET` | `/bible/{book}/{chapter}` | One chapter (1-based) |
//! | `GET` | `/bible/{book}/{chapter}/verses?start=&end=` | Verses `start..=end` (1-based) |
//! | `GET` | `/index/exact?query=` | Exact-form locations |
//! | `GET` | `/index/stemmed?query=` | Stemmed-form locations |
//!
//! URLs carry chapter and verse numbers as readers write them; handlers
//! convert them to the store's 0-based indexes.
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "not_found", "message": "book not found: Maccabees" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `out_of_range` (404),
//! `not_ready` (503), `internal` (500). An unknown index term is not an
//! error; it returns `[]`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::Error;
use crate::store::ArtifactStore;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
type AppState = Arc<ArtifactStore>;

/// Serve `store` on `[server].bind` until the process is terminated.
pub async fn run_server(config: &Config, store: Arc<ArtifactStore>) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let app = router(store);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(bind = %bind_addr, "concordance server listening");
    println!("Concordance server listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Build the route table. Exposed so other binaries can mount it.
pub fn router(store: Arc<ArtifactStore>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/.well-known/healthcheck", get(handle_health))
        .route("/.well-known/readiness", get(handle_readiness))
        .route("/bible", get(handle_full_text))
        .route("/bible/books", get(handle_books))
        .route("/bible/{book}", get(handle_book))
        .route("/bible/{book}/{chapter}", get(handle_chapter))
        .route("/bible/{book}/{chapter}/verses", get(handle_verses))
        .route("/index/exact", get(handle_lookup_exact))
        .route("/index/stemmed", get(handle_lookup_stemmed))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(store)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request",
        message: message.into(),
    }
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        if err.is_miss() {
            warn!(%err, "lookup miss");
            let code = match err {
                Error::OutOfRange { .. } => "out_of_range",
                _ => "not_found",
            };
            return AppError {
                status: StatusCode::NOT_FOUND,
                code,
                message: err.to_string(),
            };
        }

        error!(%err, "store failure");
        AppError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "internal",
            message: err.to_string(),
        }
    }
}

/// Parse a 1-based number from the URL into a 0-based index.
fn one_based(value: &str, name: &str) -> Result<usize, AppError> {
    match value.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(bad_request(format!(
            "{} must be a positive integer, got '{}'",
            name, value
        ))),
    }
}

// ============ Health ============

async fn handle_health() -> Json<&'static str> {
    Json("Healthy")
}

async fn handle_readiness(State(store): State<AppState>) -> Response {
    if store.is_loaded() {
        Json("Ready").into_response()
    } else {
        AppError {
            status: StatusCode::SERVICE_UNAVAILABLE,
            code: "not_ready",
            message: "artifact store is not loaded".to_string(),
        }
        .into_response()
    }
}

// ============ Corpus ============

async fn handle_full_text(State(store): State<AppState>) -> Result<Response, AppError> {
    Ok(Json(store.full_text()?).into_response())
}

async fn handle_books(State(store): State<AppState>) -> Result<Response, AppError> {
    Ok(Json(store.list_book_names()?).into_response())
}

async fn handle_book(
    State(store): State<AppState>,
    Path(book): Path<String>,
) -> Result<Response, AppError> {
    Ok(Json(store.book(&book)?).into_response())
}

async fn handle_chapter(
    State(store): State<AppState>,
    Path((book, chapter)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let chapter_index = one_based(&chapter, "chapter")?;
    Ok(Json(store.chapter(&book, chapter_index)?).into_response())
}

/// Inclusive 1-based verse numbers. Both default to the chapter's bounds.
#[derive(Deserialize)]
struct VerseQuery {
    start: Option<String>,
    end: Option<String>,
}

async fn handle_verses(
    State(store): State<AppState>,
    Path((book, chapter)): Path<(String, String)>,
    Query(q): Query<VerseQuery>,
) -> Result<Response, AppError> {
    let chapter_index = one_based(&chapter, "chapter")?;
    let start = match q.start.as_deref() {
        Some(s) => one_based(s, "start")?,
        None => 0,
    };
    let end = match q.end.as_deref() {
        Some(e) => one_based(e, "end")? + 1,
        None => store.chapter(&book, chapter_index)?.verses.len(),
    };

    Ok(Json(store.verse_range(&book, chapter_index, start, end)?).into_response())
}

// ============ Index ============

#[derive(Deserialize)]
struct TermQuery {
    query: Option<String>,
}

fn required_term(q: &TermQuery) -> Result<&str, AppError> {
    match q.query.as_deref().map(str::trim) {
        Some(term) if !term.is_empty() => Ok(term),
        _ => Err(bad_request("query must not be empty")),
    }
}

async fn handle_lookup_exact(
    State(store): State<AppState>,
    Query(q): Query<TermQuery>,
) -> Result<Response, AppError> {
    let term = required_term(&q)?;
    Ok(Json(store.lookup_exact(term)?).into_response())
}

async fn handle_lookup_stemmed(
    State(store): State<AppState>,
    Query(q): Query<TermQuery>,
) -> Result<Response, AppError> {
    let term = required_term(&q)?;
    Ok(Json(store.lookup_stemmed(term)?).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_misses_map_to_404() {
        let err = AppError::from(Error::NotFound {
            kind: "book",
            name: "Maccabees".to_string(),
        });
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.code, "not_found");
        assert_eq!(err.message, "book not found: Maccabees");

        let err = AppError::from(Error::OutOfRange {
            what: "chapter",
            detail: "Genesis has 2 chapters, index 8 requested".to_string(),
        });
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.code, "out_of_range");
    }

    #[test]
    fn test_store_failure_maps_to_500() {
        let err = AppError::from(Error::Config("store has no snapshot location".to_string()));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code, "internal");
    }

    #[test]
    fn test_one_based_rejects_zero_and_garbage() {
        assert_eq!(one_based("1", "chapter").ok(), Some(0));
        assert_eq!(one_based("12", "chapter").ok(), Some(11));
        for bad in ["0", "-1", "one", ""] {
            let err = one_based(bad, "chapter").err().unwrap();
            assert_eq!(err.code, "bad_request");
        }
    }
}
