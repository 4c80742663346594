//! Black-box test harness for a remote Books REST resource.
//!
//! # Overview
//! Sends list/get/create/update/delete requests to `{base}/api/{version}/Books`
//! and checks the responses: status codes, JSON Schema conformance, field
//! semantics and content fidelity. Payloads come from a seeded generator and
//! a cached fixture file.
//!
//! # Design
//! - `Config` is built once and passed explicitly; there is no global state.
//! - `BooksClient` builds `HttpRequest` values and sends them through an
//!   `ApiClient`, which owns the retry policy and a `Transport`.
//! - Only transport failures are `Err`; HTTP error statuses, schema results
//!   and violation lists are plain data for the test to branch on.
//! - Execution is sequential and blocking, matching how the test cases run.

pub mod assertions;
pub mod client;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod generator;
pub mod http;
pub mod logging;
pub mod retry;
pub mod transport;
pub mod types;
pub mod validator;

pub use client::{ApiClient, BooksClient};
pub use config::Config;
pub use error::{ApiError, AssertionError, ConfigIssue, FixtureError, SchemaError};
pub use fixtures::{FixtureState, FixtureStore};
pub use generator::TestDataGenerator;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use retry::RetryPolicy;
pub use transport::{Transport, UreqTransport};
pub use types::{Book, EdgeCase, EdgeCaseKind, FixtureBundle, InvalidMode};
pub use validator::{validate_book_data, ResponseValidator, ValidatedBook};
