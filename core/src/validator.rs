//! Response validation: JSON Schema conformance and field-level semantics.
//!
//! # Design
//! Two independent paths. `ResponseValidator` checks shape against compiled
//! JSON Schemas and answers with a boolean. `ValidatedBook::try_from` builds a
//! typed record field by field and collects every violation as a message.
//! Neither path returns an error to the caller for bad data.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::error::SchemaError;
use crate::types::BOOK_FIELDS;

/// Date with optional time, fraction and offset.
pub const DATE_TIME_PATTERN: &str =
    r"^\d{4}-\d{2}-\d{2}([T ]\d{2}:\d{2}(:\d{2}(\.\d+)?)?(Z|[+-]\d{2}:?\d{2})?)?$";

/// Schema for one Book. No properties beyond the six Book fields.
pub fn book_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "id": {"type": "integer", "minimum": 1},
            "title": {"type": "string", "minLength": 1},
            "description": {"type": "string", "minLength": 1},
            "pageCount": {"type": "integer", "minimum": 1},
            "excerpt": {"type": "string"},
            "publishDate": {"type": "string", "format": "date-time", "pattern": DATE_TIME_PATTERN}
        },
        "required": BOOK_FIELDS,
        "additionalProperties": false
    })
}

pub fn books_list_schema() -> Value {
    json!({
        "type": "array",
        "items": book_schema(),
        "minItems": 0
    })
}

#[derive(Debug)]
pub struct ResponseValidator {
    book: jsonschema::Validator,
    books_list: jsonschema::Validator,
}

impl ResponseValidator {
    /// Compile the built-in schemas.
    ///
    /// `format` stays an annotation; `publishDate` shape is enforced by its
    /// `pattern` so date-only values echoed by the server still pass.
    pub fn new() -> Result<Self, SchemaError> {
        Ok(Self {
            book: compile("book", &book_schema())?,
            books_list: compile("books_list", &books_list_schema())?,
        })
    }

    pub fn validate_book_response(&self, data: &Value) -> bool {
        report("Book response", &self.book, data)
    }

    pub fn validate_books_list_response(&self, data: &Value) -> bool {
        report("Books list response", &self.books_list, data)
    }

    /// Validate a single object or an array of objects.
    pub fn validate_response(&self, data: &Value) -> bool {
        match data {
            Value::Array(_) => self.validate_books_list_response(data),
            _ => self.validate_book_response(data),
        }
    }

    /// Every schema violation as a message.
    pub fn schema_errors(&self, data: &Value) -> Vec<String> {
        let validator = if data.is_array() { &self.books_list } else { &self.book };
        validator.iter_errors(data).map(|err| err.to_string()).collect()
    }
}

fn compile(name: &'static str, schema: &Value) -> Result<jsonschema::Validator, SchemaError> {
    jsonschema::options()
        .should_validate_formats(false)
        .build(schema)
        .map_err(|e| SchemaError {
            name,
            message: e.to_string(),
        })
}

fn report(what: &str, validator: &jsonschema::Validator, data: &Value) -> bool {
    if validator.is_valid(data) {
        debug!("{what} validation passed");
        return true;
    }
    let first = validator
        .iter_errors(data)
        .next()
        .map(|err| err.to_string())
        .unwrap_or_default();
    warn!(error = %first, "{what} validation failed");
    false
}

/// Object-model check: an empty list means `data` is a valid Book.
pub fn validate_book_data(data: &Value) -> Vec<String> {
    match ValidatedBook::try_from(data) {
        Ok(_) => {
            debug!("Book data validation passed");
            Vec::new()
        }
        Err(errors) => {
            warn!(?errors, "Book data validation failed");
            errors
        }
    }
}

/// A Book whose fields passed semantic validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedBook {
    pub id: i64,
    /// Trimmed.
    pub title: String,
    /// Trimmed.
    pub description: String,
    pub page_count: i64,
    pub excerpt: String,
    pub publish_date: String,
    /// `publish_date` normalized to UTC.
    pub published_at: NaiveDateTime,
}

impl TryFrom<&Value> for ValidatedBook {
    type Error = Vec<String>;

    fn try_from(data: &Value) -> Result<Self, Self::Error> {
        let Some(fields) = data.as_object() else {
            return Err(vec!["book: must be a JSON object".to_string()]);
        };
        let mut errors = Vec::new();

        let id = positive_int(fields, "id", "Book ID must be positive", &mut errors);
        let title = non_blank(fields, "title", "Title cannot be empty", &mut errors);
        let description = non_blank(fields, "description", "Description cannot be empty", &mut errors);
        let page_count = positive_int(fields, "pageCount", "Page count must be positive", &mut errors);
        let excerpt = string_field(fields, "excerpt", "Excerpt must be a string", &mut errors);
        let publish_date = string_field(fields, "publishDate", "publishDate must be a string", &mut errors);
        let published_at = publish_date.as_deref().and_then(|raw| {
            let parsed = parse_iso8601(raw);
            if parsed.is_none() {
                errors.push("publishDate: Invalid date format. Expected ISO format".to_string());
            }
            parsed
        });

        match (id, title, description, page_count, excerpt, publish_date, published_at) {
            (Some(id), Some(title), Some(description), Some(page_count), Some(excerpt), Some(publish_date), Some(published_at))
                if errors.is_empty() =>
            {
                Ok(Self {
                    id,
                    title,
                    description,
                    page_count,
                    excerpt,
                    publish_date,
                    published_at,
                })
            }
            _ => Err(errors),
        }
    }
}

fn field<'a>(fields: &'a Map<String, Value>, name: &str, errors: &mut Vec<String>) -> Option<&'a Value> {
    let value = fields.get(name);
    if value.is_none() {
        errors.push(format!("{name}: field required"));
    }
    value
}

fn positive_int(fields: &Map<String, Value>, name: &str, message: &str, errors: &mut Vec<String>) -> Option<i64> {
    let value = field(fields, name, errors)?;
    let Some(n) = value.as_i64() else {
        errors.push(format!("{name}: must be an integer"));
        return None;
    };
    if n <= 0 {
        errors.push(format!("{name}: {message}"));
        return None;
    }
    Some(n)
}

fn string_field(fields: &Map<String, Value>, name: &str, message: &str, errors: &mut Vec<String>) -> Option<String> {
    let value = field(fields, name, errors)?;
    match value.as_str() {
        Some(s) => Some(s.to_string()),
        None => {
            errors.push(format!("{name}: {message}"));
            None
        }
    }
}

fn non_blank(fields: &Map<String, Value>, name: &str, message: &str, errors: &mut Vec<String>) -> Option<String> {
    let value = string_field(fields, name, "must be a string", errors)?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.push(format!("{name}: {message}"));
        return None;
    }
    Some(trimmed.to_string())
}

/// Parse an ISO-8601 date or date-time; a trailing `Z` means UTC.
pub fn parse_iso8601(raw: &str) -> Option<NaiveDateTime> {
    let normalized = match raw.strip_suffix('Z') {
        Some(head) => format!("{head}+00:00"),
        None => raw.to_string(),
    };
    if let Ok(dt) = DateTime::parse_from_rfc3339(&normalized) {
        return Some(dt.naive_utc());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M%:z"] {
        if let Ok(dt) = DateTime::parse_from_str(&normalized, format) {
            return Some(dt.naive_utc());
        }
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}
