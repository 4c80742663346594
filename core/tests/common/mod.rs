//! Shared setup for the integration suites.
//!
//! Every test gets its own mock server on a random port so state never leaks
//! between tests. The fixture bundle is loaded once per test binary.

#![allow(dead_code)]

use std::path::Path;
use std::sync::OnceLock;

use books_core::{
    logging, ApiClient, Book, BooksClient, Config, FixtureBundle, FixtureStore, HttpResponse,
    ResponseValidator, RetryPolicy, TestDataGenerator, UreqTransport,
};
use mock_server::{MockOptions, RequestCounter};
use serde_json::Value;

pub struct Harness {
    pub config: Config,
    pub client: BooksClient,
    pub validator: ResponseValidator,
    pub hits: RequestCounter,
}

/// Start a mock server on a background thread and return its base URL.
pub fn spawn_server(options: MockOptions) -> (String, RequestCounter) {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();
    let (router, hits) = mock_server::app_with(options);

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::serve(listener, router).await
        })
        .unwrap();
    });

    (format!("http://{addr}"), hits)
}

pub fn test_config(base_url: &str) -> Config {
    Config {
        api_timeout: 5,
        test_data_dir: Path::new(env!("CARGO_TARGET_TMPDIR")).join("test_data"),
        ..Config::default()
    }
    .with_base_url(base_url)
}

pub fn client_for(config: &Config, policy: RetryPolicy) -> BooksClient {
    BooksClient::new(
        ApiClient::new(UreqTransport::from_config(config), policy),
        config,
    )
}

pub fn harness() -> Harness {
    harness_with(MockOptions::default(), RetryPolicy::no_delay(2))
}

pub fn harness_with(options: MockOptions, policy: RetryPolicy) -> Harness {
    let (base_url, hits) = spawn_server(options);
    let config = test_config(&base_url);
    logging::init(&config);
    config.warn_if_invalid();
    Harness {
        client: client_for(&config, policy),
        validator: ResponseValidator::new().unwrap(),
        config,
        hits,
    }
}

/// Fixture bundle shared by every test in the binary.
pub fn session_bundle() -> &'static FixtureBundle {
    static BUNDLE: OnceLock<FixtureBundle> = OnceLock::new();
    BUNDLE.get_or_init(|| {
        let config = test_config("http://127.0.0.1");
        FixtureStore::from_config(&config).load_or_generate(&mut TestDataGenerator::new())
    })
}

/// A book created for one test and deleted, best-effort, when dropped.
pub struct CreatedBook<'a> {
    client: &'a BooksClient,
    pub id: i64,
    pub body: Value,
}

impl Drop for CreatedBook<'_> {
    fn drop(&mut self) {
        self.client.delete_book_quietly(self.id);
    }
}

pub fn create_tracked_book<'a>(h: &'a Harness, book: &Book) -> CreatedBook<'a> {
    let response = h.client.create_book(book).unwrap();
    assert_eq!(response.status, 200, "Error creating book: {}", response.body);
    let body: Value = response.json().unwrap();
    CreatedBook {
        client: &h.client,
        id: body["id"].as_i64().unwrap(),
        body,
    }
}

/// Clean up whatever a tolerated 200 response created.
pub fn cleanup(h: &Harness, response: &HttpResponse) {
    if let Some(id) = response.json_value().and_then(|v| v["id"].as_i64()) {
        h.client.delete_book_quietly(id);
    }
}

/// An id known to exist: the first listed book, or a freshly created one.
pub fn existing_book_id(h: &Harness) -> i64 {
    if let Ok(response) = h.client.get_all_books() {
        if let Some(id) = response
            .json_value()
            .and_then(|books| books.get(0).and_then(|b| b["id"].as_i64()))
        {
            return id;
        }
    }
    let book = TestDataGenerator::new().generate_book(None);
    match h.client.create_book(&book) {
        Ok(response) if response.status == 200 => book.id,
        _ => 1,
    }
}
