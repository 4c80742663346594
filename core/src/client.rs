//! HTTP client with retry policy, and its Books-resource binding.
//!
//! # Design
//! `ApiClient` is generic over a `Transport` so the retry loop can be driven
//! by a scripted transport in tests and by `UreqTransport` in real runs.
//! `BooksClient` keeps the build/execute split: every operation has a pure
//! `build_*` method producing an `HttpRequest`, and an executing method that
//! sends it through the `ApiClient`. Non-2xx responses are returned as data.

use std::thread;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::retry::RetryPolicy;
use crate::transport::{Transport, UreqTransport};

const JSON: &str = "application/json";

/// Generic client: uniform JSON headers, bounded retries, request logging.
#[derive(Debug, Clone)]
pub struct ApiClient<T = UreqTransport> {
    transport: T,
    policy: RetryPolicy,
    default_headers: Vec<(String, String)>,
}

impl ApiClient<UreqTransport> {
    pub fn from_config(config: &Config) -> Self {
        let client = Self::new(UreqTransport::from_config(config), RetryPolicy::from_config(config));
        info!(
            timeout_secs = config.request_timeout().as_secs(),
            max_retries = client.policy.max_retries,
            "API client initialized"
        );
        client
    }
}

impl<T: Transport> ApiClient<T> {
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        Self {
            transport,
            policy,
            default_headers: vec![
                ("Content-Type".to_string(), JSON.to_string()),
                ("Accept".to_string(), JSON.to_string()),
            ],
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn get(&self, url: &str) -> Result<HttpResponse, ApiError> {
        self.send(HttpRequest::new(HttpMethod::Get, url))
    }

    pub fn post<B: Serialize + ?Sized>(&self, url: &str, body: &B) -> Result<HttpResponse, ApiError> {
        let body = serde_json::to_string(body).map_err(ApiError::Serialization)?;
        self.send(HttpRequest::new(HttpMethod::Post, url).with_body(body))
    }

    pub fn put<B: Serialize + ?Sized>(&self, url: &str, body: &B) -> Result<HttpResponse, ApiError> {
        let body = serde_json::to_string(body).map_err(ApiError::Serialization)?;
        self.send(HttpRequest::new(HttpMethod::Put, url).with_body(body))
    }

    pub fn delete(&self, url: &str) -> Result<HttpResponse, ApiError> {
        self.send(HttpRequest::new(HttpMethod::Delete, url))
    }

    /// Send `request` with the default headers, retrying per the policy.
    ///
    /// Transient statuses are retried until the budget is spent and the last
    /// response is returned. Timeouts and connection failures are retried the
    /// same way and surface as `Err` once exhausted; other request failures
    /// are returned at once.
    pub fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let request = self
            .default_headers
            .iter()
            .fold(request, |req, (name, value)| req.with_default_header(name, value));
        let method = request.method;
        let url = request.url.as_str();

        let mut retry: u32 = 0;
        loop {
            debug!(%method, url, attempt = retry + 1, "Making request");
            let can_retry = retry < self.policy.max_retries && self.policy.allows(method);
            match self.transport.send(&request) {
                Ok(response) if can_retry && self.policy.is_retryable_status(method, response.status) => {
                    retry += 1;
                    let delay = self.policy.delay_after(retry, Some(&response));
                    warn!(%method, url, status = response.status, retry, ?delay, "transient status, retrying");
                    pause(delay);
                }
                Ok(response) => {
                    debug!(status = response.status, headers = ?response.headers, "Response received");
                    if response.status >= 400 {
                        warn!(%method, url, status = response.status, body = %response.body, "Request failed");
                    }
                    return Ok(response);
                }
                Err(err) if can_retry && err.is_retryable() => {
                    retry += 1;
                    let delay = self.policy.delay_after(retry, None);
                    warn!(%method, url, error = %err, retry, ?delay, "transport failure, retrying");
                    pause(delay);
                }
                Err(err) => {
                    if err.is_transport() {
                        error!(%method, url, error = %err, "Request error");
                    }
                    return Err(err);
                }
            }
        }
    }
}

fn pause(delay: std::time::Duration) {
    if !delay.is_zero() {
        thread::sleep(delay);
    }
}

/// `ApiClient` bound to the Books collection.
#[derive(Debug, Clone)]
pub struct BooksClient<T = UreqTransport> {
    api: ApiClient<T>,
    books_endpoint: String,
}

impl BooksClient<UreqTransport> {
    pub fn from_config(config: &Config) -> Self {
        Self::new(ApiClient::from_config(config), config)
    }
}

impl<T: Transport> BooksClient<T> {
    pub fn new(api: ApiClient<T>, config: &Config) -> Self {
        let books_endpoint = config.books_endpoint();
        info!(endpoint = %books_endpoint, "Books API client initialized");
        Self { api, books_endpoint }
    }

    pub fn api(&self) -> &ApiClient<T> {
        &self.api
    }

    pub fn books_endpoint(&self) -> &str {
        &self.books_endpoint
    }

    fn book_url(&self, book_id: i64) -> String {
        format!("{}/{book_id}", self.books_endpoint)
    }

    pub fn build_get_all_books(&self) -> HttpRequest {
        HttpRequest::new(HttpMethod::Get, self.books_endpoint.as_str())
    }

    pub fn build_get_book_by_id(&self, book_id: i64) -> HttpRequest {
        HttpRequest::new(HttpMethod::Get, self.book_url(book_id))
    }

    pub fn build_create_book<B: Serialize + ?Sized>(&self, payload: &B) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(payload).map_err(ApiError::Serialization)?;
        Ok(HttpRequest::new(HttpMethod::Post, self.books_endpoint.as_str()).with_body(body))
    }

    pub fn build_update_book<B: Serialize + ?Sized>(
        &self,
        book_id: i64,
        payload: &B,
    ) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(payload).map_err(ApiError::Serialization)?;
        Ok(HttpRequest::new(HttpMethod::Put, self.book_url(book_id)).with_body(body))
    }

    pub fn build_delete_book(&self, book_id: i64) -> HttpRequest {
        HttpRequest::new(HttpMethod::Delete, self.book_url(book_id))
    }

    pub fn get_all_books(&self) -> Result<HttpResponse, ApiError> {
        info!("Retrieving all books");
        self.api.send(self.build_get_all_books())
    }

    pub fn get_book_by_id(&self, book_id: i64) -> Result<HttpResponse, ApiError> {
        info!(book_id, "Retrieving book");
        self.api.send(self.build_get_book_by_id(book_id))
    }

    pub fn create_book<B: Serialize + ?Sized>(&self, payload: &B) -> Result<HttpResponse, ApiError> {
        let request = self.build_create_book(payload)?;
        info!(title = %title_of(request.body.as_deref()), "Creating book");
        self.api.send(request)
    }

    pub fn update_book<B: Serialize + ?Sized>(
        &self,
        book_id: i64,
        payload: &B,
    ) -> Result<HttpResponse, ApiError> {
        let request = self.build_update_book(book_id, payload)?;
        info!(book_id, "Updating book");
        self.api.send(request)
    }

    pub fn delete_book(&self, book_id: i64) -> Result<HttpResponse, ApiError> {
        info!(book_id, "Deleting book");
        self.api.send(self.build_delete_book(book_id))
    }

    /// Best-effort cleanup of a test-created book. Failures are only logged.
    pub fn delete_book_quietly(&self, book_id: i64) -> bool {
        match self.delete_book(book_id) {
            Ok(response) if response.is_success() => true,
            Ok(response) => {
                warn!(book_id, status = response.status, "Could not delete book");
                false
            }
            Err(err) => {
                warn!(book_id, error = %err, "Could not delete book");
                false
            }
        }
    }
}

fn title_of(body: Option<&str>) -> String {
    body.and_then(|b| serde_json::from_str::<Value>(b).ok())
        .and_then(|v| v.get("title").map(|t| t.as_str().map_or_else(|| t.to_string(), str::to_string)))
        .unwrap_or_else(|| "Unknown".to_string())
}
