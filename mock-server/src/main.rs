use std::time::Duration;

use mock_server::{app_with, serve, MockOptions, BOOKS_PATH};
use tokio::net::TcpListener;

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let defaults = MockOptions::default();
    let options = MockOptions {
        seed_books: env_or("MOCK_SEED_BOOKS", defaults.seed_books),
        fail_first: env_or("MOCK_FAIL_FIRST", defaults.fail_first),
        fail_status: env_or("MOCK_FAIL_STATUS", defaults.fail_status),
        retry_after: std::env::var("MOCK_RETRY_AFTER").ok().and_then(|v| v.parse().ok()),
        latency: Duration::from_millis(env_or("MOCK_LATENCY_MS", 0)),
    };

    let port: u16 = env_or("PORT", 3000);
    let listener = TcpListener::bind(("127.0.0.1", port)).await?;
    println!("Books mock serving http://{}{BOOKS_PATH}", listener.local_addr()?);

    let (router, _) = app_with(options);
    serve(listener, router).await
}
