use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, app_with, Book, MockOptions};
use serde_json::Value;
use std::time::Duration;
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

const BOOK: &str = r#"{"id":1000,"title":"T","description":"D","pageCount":10,"excerpt":"E","publishDate":"2023-01-01"}"#;

// --- list ---

#[tokio::test]
async fn list_books_returns_seeded_books() {
    let resp = app().oneshot(get("/api/v1/Books")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers()[http::header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .contains("application/json"));
    let books: Vec<Book> = body_json(resp).await;
    assert_eq!(books.len(), 10);
    assert_eq!(books[0].id, 1);
}

#[tokio::test]
async fn list_books_empty_without_seed() {
    let (app, _) = app_with(MockOptions {
        seed_books: 0,
        ..MockOptions::default()
    });
    let resp = app.oneshot(get("/api/v1/Books")).await.unwrap();
    let books: Vec<Book> = body_json(resp).await;
    assert!(books.is_empty());
}

// --- create ---

#[tokio::test]
async fn create_book_returns_200_and_normalizes_date() {
    let resp = app()
        .oneshot(json_request("POST", "/api/v1/Books", BOOK))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let book: Book = body_json(resp).await;
    assert_eq!(book.title, "T");
    assert_eq!(book.publish_date, "2023-01-01T00:00:00");
}

#[tokio::test]
async fn create_book_missing_fields_returns_400() {
    let resp = app()
        .oneshot(json_request("POST", "/api/v1/Books", r#"{"id":9999,"pageCount":200}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = body_json(resp).await;
    assert!(body.get("error").is_some());
    assert!(body.get("traceId").is_some());
}

#[tokio::test]
async fn create_book_bad_date_returns_400() {
    let payload = BOOK.replace("2023-01-01", "not-a-date");
    let resp = app()
        .oneshot(json_request("POST", "/api/v1/Books", &payload))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- get ---

#[tokio::test]
async fn get_book_not_found_has_error_body() {
    let resp = app().oneshot(get("/api/v1/Books/99999")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = body_json(resp).await;
    assert_eq!(body["error"], "Not Found");
}

#[tokio::test]
async fn get_book_negative_id_is_not_found() {
    let resp = app().oneshot(get("/api/v1/Books/-1")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- update / delete on unknown ids ---

#[tokio::test]
async fn update_unknown_book_echoes_without_storing() {
    let (app, _) = app_with(MockOptions::default());
    let mut app = app.into_service();
    use tower::Service;

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("PUT", "/api/v1/Books/99999", BOOK))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get("/api/v1/Books/99999"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_unknown_book_returns_200() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/v1/Books/99999")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_bytes(resp).await.is_empty());
}

// --- fault injection ---

#[tokio::test]
async fn leading_requests_fail_with_injected_status() {
    let (app, hits) = app_with(MockOptions {
        fail_first: 2,
        fail_status: 503,
        retry_after: Some(1),
        ..MockOptions::default()
    });
    let mut app = app.into_service();
    use tower::Service;

    for expected in [StatusCode::SERVICE_UNAVAILABLE, StatusCode::SERVICE_UNAVAILABLE, StatusCode::OK] {
        let resp = ServiceExt::ready(&mut app)
            .await
            .unwrap()
            .call(get("/api/v1/Books"))
            .await
            .unwrap();
        assert_eq!(resp.status(), expected);
        if expected != StatusCode::OK {
            assert_eq!(resp.headers()[http::header::RETRY_AFTER], "1");
        }
    }
    assert_eq!(hits.get(), 3);
}

#[tokio::test]
async fn latency_delays_response() {
    let (app, _) = app_with(MockOptions {
        latency: Duration::from_millis(50),
        ..MockOptions::default()
    });
    let started = std::time::Instant::now();
    let resp = app.oneshot(get("/api/v1/Books/1")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(started.elapsed() >= Duration::from_millis(50));
}

// --- full CRUD lifecycle ---

#[tokio::test]
async fn crud_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();

    // create
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("POST", "/api/v1/Books", BOOK))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let created: Book = body_json(resp).await;
    assert_eq!(created.id, 1000);

    // get
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get("/api/v1/Books/1000"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let fetched: Book = body_json(resp).await;
    assert_eq!(fetched, created);

    // update
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "PUT",
            "/api/v1/Books/1000",
            &BOOK.replace("\"T\"", "\"Updated Title\""),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Book = body_json(resp).await;
    assert_eq!(updated.title, "Updated Title");

    // list: seeded books plus the new one
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get("/api/v1/Books"))
        .await
        .unwrap();
    let books: Vec<Book> = body_json(resp).await;
    assert_eq!(books.len(), 11);
    assert_eq!(books.last().unwrap().title, "Updated Title");

    // delete
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(
            Request::builder()
                .method("DELETE")
                .uri("/api/v1/Books/1000")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // get after delete is 404
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get("/api/v1/Books/1000"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
