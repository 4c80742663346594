//! In-process stand-in for the public Books REST API.
//!
//! Mirrors the remote's observable behavior: every successful call answers
//! 200 with JSON, date-only `publishDate` values come back with a time
//! suffix, unknown ids are 404 on read but 200 on update/delete. Fault
//! injection (latency, leading failures) exercises the client's retry path.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
    time::Duration,
};

use axum::{
    extract::{Path, Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const BOOKS_PATH: &str = "/api/v1/Books";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub page_count: i64,
    pub excerpt: String,
    pub publish_date: String,
}

#[derive(Clone, Debug)]
pub struct MockOptions {
    /// Books with ids `1..=seed_books` present at startup.
    pub seed_books: usize,
    /// Answer the first `fail_first` requests with `fail_status`.
    pub fail_first: u32,
    pub fail_status: u16,
    /// `Retry-After` seconds sent with injected failures.
    pub retry_after: Option<u64>,
    /// Delay applied before handling every request.
    pub latency: Duration,
}

impl Default for MockOptions {
    fn default() -> Self {
        Self {
            seed_books: 10,
            fail_first: 0,
            fail_status: 503,
            retry_after: None,
            latency: Duration::ZERO,
        }
    }
}

pub type Db = Arc<RwLock<HashMap<i64, Book>>>;

/// Number of requests the server has seen, injected failures included.
#[derive(Clone, Debug, Default)]
pub struct RequestCounter(Arc<AtomicU32>);

impl RequestCounter {
    pub fn get(&self) -> u32 {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Clone)]
struct AppState {
    db: Db,
    options: Arc<MockOptions>,
    hits: RequestCounter,
}

pub fn app() -> Router {
    app_with(MockOptions::default()).0
}

pub fn app_with(options: MockOptions) -> (Router, RequestCounter) {
    let hits = RequestCounter::default();
    let state = AppState {
        db: Arc::new(RwLock::new(seed(options.seed_books))),
        options: Arc::new(options),
        hits: hits.clone(),
    };
    let router = Router::new()
        .route(BOOKS_PATH, get(list_books).post(create_book))
        .route(
            "/api/v1/Books/{id}",
            get(get_book).put(update_book).delete(delete_book),
        )
        .layer(middleware::from_fn_with_state(state.clone(), inject_faults))
        .with_state(state);
    (router, hits)
}

pub async fn serve(listener: TcpListener, router: Router) -> Result<(), std::io::Error> {
    axum::serve(listener, router).await
}

fn seed(count: usize) -> HashMap<i64, Book> {
    (1..=count)
        .map(|n| {
            let id = i64::try_from(n).unwrap_or(i64::MAX);
            let book = Book {
                id,
                title: format!("Book {id}"),
                description: "Lorem lorem lorem. Lorem lorem lorem.".to_string(),
                page_count: id * 100,
                excerpt: "Lorem lorem lorem. Lorem lorem lorem.".to_string(),
                publish_date: format!("2026-01-{:02}T00:00:00", (n - 1) % 28 + 1),
            };
            (id, book)
        })
        .collect()
}

async fn inject_faults(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let hit = state.hits.0.fetch_add(1, Ordering::SeqCst);
    if !state.options.latency.is_zero() {
        tokio::time::sleep(state.options.latency).await;
    }
    if hit < state.options.fail_first {
        let status =
            StatusCode::from_u16(state.options.fail_status).unwrap_or(StatusCode::SERVICE_UNAVAILABLE);
        let mut response = error(status, "injected failure");
        if let Some(seconds) = state.options.retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(seconds));
        }
        return response;
    }
    next.run(request).await
}

fn error(status: StatusCode, message: impl Into<String>) -> Response {
    let body = json!({
        "error": status.canonical_reason().unwrap_or("Error"),
        "message": message.into(),
        "traceId": Uuid::new_v4(),
    });
    (status, Json(body)).into_response()
}

/// Accept a payload only if it is a complete Book with a parseable date.
fn parse_book(payload: Value) -> Result<Book, Response> {
    let mut book: Book = serde_json::from_value(payload)
        .map_err(|e| error(StatusCode::BAD_REQUEST, format!("invalid book: {e}")))?;
    book.publish_date = normalize_publish_date(&book.publish_date).ok_or_else(|| {
        error(
            StatusCode::BAD_REQUEST,
            format!("invalid publishDate: {}", book.publish_date),
        )
    })?;
    Ok(book)
}

/// `YYYY-MM-DD` gains a midnight time; values with a time part are kept.
pub fn normalize_publish_date(raw: &str) -> Option<String> {
    let bytes = raw.as_bytes();
    let date = bytes.get(..10)?;
    let shaped = date.iter().enumerate().all(|(i, b)| match i {
        4 | 7 => *b == b'-',
        _ => b.is_ascii_digit(),
    });
    if !shaped {
        return None;
    }
    match bytes.get(10) {
        None => Some(format!("{raw}T00:00:00")),
        Some(b'T') if bytes.len() > 11 => Some(raw.to_string()),
        Some(_) => None,
    }
}

async fn list_books(State(state): State<AppState>) -> Json<Vec<Book>> {
    let books = state.db.read().await;
    let mut all: Vec<Book> = books.values().cloned().collect();
    all.sort_by_key(|b| b.id);
    Json(all)
}

async fn get_book(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    match state.db.read().await.get(&id) {
        Some(book) => Json(book.clone()).into_response(),
        None => error(StatusCode::NOT_FOUND, format!("book {id} does not exist")),
    }
}

async fn create_book(State(state): State<AppState>, Json(payload): Json<Value>) -> Response {
    match parse_book(payload) {
        Ok(book) => {
            state.db.write().await.insert(book.id, book.clone());
            Json(book).into_response()
        }
        Err(rejection) => rejection,
    }
}

async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<Value>,
) -> Response {
    let book = match parse_book(payload) {
        Ok(book) => book,
        Err(rejection) => return rejection,
    };
    let mut books = state.db.write().await;
    if let Some(stored) = books.get_mut(&id) {
        *stored = Book { id, ..book.clone() };
    }
    Json(book).into_response()
}

async fn delete_book(State(state): State<AppState>, Path(id): Path<i64>) -> StatusCode {
    state.db.write().await.remove(&id);
    StatusCode::OK
}
