//! Domain DTOs for the Books API and the fixture bundle.
//!
//! # Design
//! `Book` mirrors the wire schema but does not enforce its invariants: edge
//! case payloads need to carry values the server may reject. Invariants are
//! checked by `validator::ValidatedBook`. Invalid payloads are kept as raw
//! `serde_json::Value` because they deliberately break the schema.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Book fields in wire order.
pub const BOOK_FIELDS: [&str; 6] = ["id", "title", "description", "pageCount", "excerpt", "publishDate"];

/// A Book resource as sent to and returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub page_count: i64,
    pub excerpt: String,
    pub publish_date: String,
}

impl Book {
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Named boundary-condition and security-probe payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeCaseKind {
    VeryLongStrings,
    SpecialCharacters,
    ExtremeValues,
    UnicodeCharacters,
    SqlInjection,
    XssAttempt,
}

impl EdgeCaseKind {
    pub const ALL: [EdgeCaseKind; 6] = [
        EdgeCaseKind::VeryLongStrings,
        EdgeCaseKind::SpecialCharacters,
        EdgeCaseKind::ExtremeValues,
        EdgeCaseKind::UnicodeCharacters,
        EdgeCaseKind::SqlInjection,
        EdgeCaseKind::XssAttempt,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EdgeCaseKind::VeryLongStrings => "very_long_strings",
            EdgeCaseKind::SpecialCharacters => "special_characters",
            EdgeCaseKind::ExtremeValues => "extreme_values",
            EdgeCaseKind::UnicodeCharacters => "unicode_characters",
            EdgeCaseKind::SqlInjection => "sql_injection",
            EdgeCaseKind::XssAttempt => "xss_attempt",
        }
    }
}

impl fmt::Display for EdgeCaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeCase {
    pub name: EdgeCaseKind,
    pub data: Book,
}

/// Ways `TestDataGenerator::generate_invalid` corrupts a valid payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidMode {
    MissingRequired,
    WrongTypes,
    EmptyValues,
    NegativeValues,
    InvalidDate,
}

impl InvalidMode {
    pub const ALL: [InvalidMode; 5] = [
        InvalidMode::MissingRequired,
        InvalidMode::WrongTypes,
        InvalidMode::EmptyValues,
        InvalidMode::NegativeValues,
        InvalidMode::InvalidDate,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            InvalidMode::MissingRequired => "missing_required",
            InvalidMode::WrongTypes => "wrong_types",
            InvalidMode::EmptyValues => "empty_values",
            InvalidMode::NegativeValues => "negative_values",
            InvalidMode::InvalidDate => "invalid_date",
        }
    }
}

impl FromStr for InvalidMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InvalidMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| format!("unknown invalid mode: {s}"))
    }
}

/// Generated or cached payloads shared by the test cases of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FixtureBundle {
    pub valid_books: Vec<Book>,
    pub invalid_books: Vec<Value>,
    pub edge_cases: Vec<EdgeCase>,
}

impl FixtureBundle {
    pub fn edge_case(&self, kind: EdgeCaseKind) -> Option<&Book> {
        self.edge_cases.iter().find(|c| c.name == kind).map(|c| &c.data)
    }
}
