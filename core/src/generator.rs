//! Synthetic Book payloads: valid, deliberately invalid, and named edge cases.
//!
//! # Design
//! All randomness comes from one `StdRng`. `with_seed` plus a fixed `today`
//! makes every payload reproducible, which the fixture tests rely on.

use chrono::{Days, NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};
use tracing::debug;

use crate::types::{Book, EdgeCase, EdgeCaseKind, FixtureBundle, InvalidMode};

/// Ids handed to generated books; kept clear of the remote's own records.
pub const SYNTHETIC_ID_RANGE: std::ops::RangeInclusive<i64> = 1000..=9999;

const DESCRIPTION_MAX_CHARS: usize = 200;
const EXCERPT_MAX_CHARS: usize = 500;
const TEN_YEARS_IN_DAYS: u64 = 3652;

const ADJECTIVES: &[&str] = &[
    "Adaptive", "Balanced", "Centralized", "Cross-platform", "Digitized", "Distributed",
    "Ergonomic", "Focused", "Innovative", "Integrated", "Managed", "Optimized",
    "Persistent", "Proactive", "Reactive", "Robust", "Seamless", "Streamlined",
];
const MODIFIERS: &[&str] = &[
    "asynchronous", "bottom-line", "client-driven", "dynamic", "empowering",
    "fault-tolerant", "heuristic", "interactive", "modular", "multi-tasking",
    "real-time", "scalable", "tangible", "zero-defect",
];
const NOUNS: &[&str] = &[
    "algorithm", "architecture", "capability", "framework", "hierarchy", "initiative",
    "interface", "methodology", "middleware", "paradigm", "protocol", "solution",
    "strategy", "toolset",
];
const WORDS: &[&str] = &[
    "across", "against", "author", "beyond", "chapter", "city", "during", "evening",
    "family", "garden", "history", "journey", "letter", "memory", "morning", "night",
    "ocean", "people", "river", "road", "season", "story", "street", "summer",
    "through", "town", "water", "window", "winter", "world", "young",
];
const SPECIAL_CHARS: &str = "ñáéíóú@#$%^&*()_+-=[]{}|;':\",./<>?";
const UNICODE_TEXT: &str = "Unicode: 你好世界 🌍 🚀 📚";
const SQL_INJECTION: &str = "'; DROP TABLE books; --";
const XSS_ATTEMPT: &str = "<script>alert('XSS')</script>";

#[derive(Debug, Clone)]
pub struct TestDataGenerator {
    rng: StdRng,
    today: NaiveDate,
}

impl Default for TestDataGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl TestDataGenerator {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            today: Utc::now().date_naive(),
        }
    }

    /// Deterministic generator anchored to the given `today`.
    pub fn with_seed(seed: u64, today: NaiveDate) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            today,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn generate_book(&mut self, book_id: Option<i64>) -> Book {
        let id = book_id.unwrap_or_else(|| self.rng.gen_range(SYNTHETIC_ID_RANGE));
        let book = Book {
            id,
            title: self.catch_phrase(),
            description: self.text(DESCRIPTION_MAX_CHARS),
            page_count: self.rng.gen_range(50..=1000),
            excerpt: self.text(EXCERPT_MAX_CHARS),
            publish_date: self.recent_date().format("%Y-%m-%d").to_string(),
        };
        debug!(id, "Generated book data");
        book
    }

    pub fn generate_books(&mut self, count: usize) -> Vec<Book> {
        (0..count).map(|_| self.generate_book(None)).collect()
    }

    /// A valid payload corrupted according to `mode`.
    ///
    /// Without a mode the title is blanked, the page count negated and the
    /// date malformed all at once.
    pub fn generate_invalid(&mut self, mode: Option<InvalidMode>) -> Value {
        let mut data = self.generate_book(None).to_value();
        if let Value::Object(fields) = &mut data {
            match mode {
                Some(InvalidMode::MissingRequired) => {
                    for key in ["title", "description", "pageCount"] {
                        fields.remove(key);
                    }
                }
                Some(InvalidMode::WrongTypes) => {
                    fields.insert("id".to_string(), json!("not_an_integer"));
                    fields.insert("pageCount".to_string(), json!("not_a_number"));
                    fields.insert("title".to_string(), json!(12345));
                }
                Some(InvalidMode::EmptyValues) => {
                    for key in ["title", "description", "excerpt"] {
                        fields.insert(key.to_string(), json!(""));
                    }
                }
                Some(InvalidMode::NegativeValues) => {
                    fields.insert("id".to_string(), json!(-1));
                    fields.insert("pageCount".to_string(), json!(-100));
                }
                Some(InvalidMode::InvalidDate) => {
                    fields.insert("publishDate".to_string(), json!("invalid-date-format"));
                }
                None => {
                    fields.insert("title".to_string(), json!(""));
                    fields.insert("pageCount".to_string(), json!(-50));
                    fields.insert("publishDate".to_string(), json!("not-a-date"));
                }
            }
        }
        debug!(mode = mode.map_or("default", InvalidMode::as_str), "Generated invalid book data");
        data
    }

    /// One payload per `EdgeCaseKind`, in declaration order.
    pub fn generate_edge_cases(&mut self) -> Vec<EdgeCase> {
        let today = self.today.format("%Y-%m-%d").to_string();
        let cases: Vec<EdgeCase> = EdgeCaseKind::ALL
            .into_iter()
            .map(|kind| {
                let data = match kind {
                    EdgeCaseKind::VeryLongStrings => Book {
                        id: self.synthetic_id(),
                        title: "A".repeat(1000),
                        description: "B".repeat(2000),
                        page_count: 500,
                        excerpt: "C".repeat(5000),
                        publish_date: today.clone(),
                    },
                    EdgeCaseKind::SpecialCharacters => self.decorated(SPECIAL_CHARS, 300, &today),
                    EdgeCaseKind::ExtremeValues => Book {
                        id: 999_999_999,
                        title: "Book with extreme values".to_string(),
                        description: "Description".to_string(),
                        page_count: 999_999,
                        excerpt: "Excerpt".to_string(),
                        publish_date: "1900-01-01T00:00:00.000Z".to_string(),
                    },
                    EdgeCaseKind::UnicodeCharacters => {
                        let mut book = self.decorated(UNICODE_TEXT, 400, &today);
                        book.title = UNICODE_TEXT.to_string();
                        book
                    }
                    EdgeCaseKind::SqlInjection => {
                        let mut book = self.decorated(SQL_INJECTION, 250, &today);
                        book.title = SQL_INJECTION.to_string();
                        book
                    }
                    EdgeCaseKind::XssAttempt => {
                        let mut book = self.decorated(XSS_ATTEMPT, 350, &today);
                        book.title = XSS_ATTEMPT.to_string();
                        book
                    }
                };
                EdgeCase { name: kind, data }
            })
            .collect();
        debug!(count = cases.len(), "Generated edge case data sets");
        cases
    }

    /// Full bundle persisted to the fixture file.
    pub fn generate_bundle(&mut self) -> FixtureBundle {
        FixtureBundle {
            valid_books: self.generate_books(5),
            invalid_books: vec![
                self.generate_invalid(Some(InvalidMode::MissingRequired)),
                self.generate_invalid(Some(InvalidMode::WrongTypes)),
                self.generate_invalid(Some(InvalidMode::EmptyValues)),
            ],
            edge_cases: self.generate_edge_cases(),
        }
    }

    /// Smaller in-memory bundle used when the fixture file cannot be written.
    pub fn generate_fallback_bundle(&mut self) -> FixtureBundle {
        let mut edge_cases = self.generate_edge_cases();
        edge_cases.truncate(2);
        FixtureBundle {
            valid_books: self.generate_books(3),
            invalid_books: vec![
                self.generate_invalid(Some(InvalidMode::MissingRequired)),
                self.generate_invalid(Some(InvalidMode::WrongTypes)),
            ],
            edge_cases,
        }
    }

    fn synthetic_id(&mut self) -> i64 {
        self.rng.gen_range(SYNTHETIC_ID_RANGE)
    }

    fn decorated(&mut self, marker: &str, page_count: i64, date: &str) -> Book {
        Book {
            id: self.synthetic_id(),
            title: format!("Book with {marker}"),
            description: format!("Description with {marker}"),
            page_count,
            excerpt: format!("Excerpt with {marker}"),
            publish_date: date.to_string(),
        }
    }

    fn pick(&mut self, words: &[&'static str]) -> &'static str {
        words.choose(&mut self.rng).copied().unwrap_or("book")
    }

    fn catch_phrase(&mut self) -> String {
        let adjective = self.pick(ADJECTIVES);
        let modifier = self.pick(MODIFIERS);
        let noun = self.pick(NOUNS);
        format!("{adjective} {modifier} {noun}")
    }

    /// Sentences of filler prose, never longer than `max_chars`.
    fn text(&mut self, max_chars: usize) -> String {
        let mut out = String::new();
        loop {
            let count = self.rng.gen_range(4..=10);
            let mut sentence = (0..count).map(|_| self.pick(WORDS)).collect::<Vec<_>>().join(" ");
            if let Some(first) = sentence.get(..1) {
                let upper = first.to_uppercase();
                sentence.replace_range(..1, &upper);
            }
            sentence.push('.');
            let needed = if out.is_empty() { sentence.len() } else { sentence.len() + 1 };
            if out.len() + needed > max_chars {
                break;
            }
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(&sentence);
        }
        if out.is_empty() {
            out.push_str("Story.");
        }
        out
    }

    fn recent_date(&mut self) -> NaiveDate {
        let back = self.rng.gen_range(0..=TEN_YEARS_IN_DAYS);
        self.today.checked_sub_days(Days::new(back)).unwrap_or(self.today)
    }
}
