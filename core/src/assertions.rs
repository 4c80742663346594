//! Small response checks used by the test cases.
//!
//! Every check returns `Result<(), AssertionError>` so a test can `unwrap()`
//! it and get the mismatch in the panic message.

use serde_json::Value;

use crate::error::AssertionError;
use crate::http::HttpResponse;

type Check = Result<(), AssertionError>;

pub fn status_code(response: &HttpResponse, expected: u16) -> Check {
    if response.status == expected {
        return Ok(());
    }
    Err(AssertionError::new(format!(
        "Expected status code {expected}, got {}",
        response.status
    )))
}

pub fn status_one_of(response: &HttpResponse, expected: &[u16]) -> Check {
    if expected.contains(&response.status) {
        return Ok(());
    }
    Err(AssertionError::new(format!(
        "Expected status code in {expected:?}, got {}",
        response.status
    )))
}

pub fn content_type(response: &HttpResponse, expected: &str) -> Check {
    let actual = response.content_type();
    if actual.contains(expected) {
        return Ok(());
    }
    Err(AssertionError::new(format!(
        "Expected content type containing '{expected}', got '{actual}'"
    )))
}

pub fn json_content_type(response: &HttpResponse) -> Check {
    content_type(response, "application/json")
}

/// All six Book fields present with the right JSON types.
pub fn book_structure(book: &Value) -> Check {
    let Some(fields) = book.as_object() else {
        return Err(AssertionError::new("Book data must be an object"));
    };
    let expectations: [(&str, &str, fn(&Value) -> bool); 6] = [
        ("id", "ID must be an integer", |v| v.is_i64() || v.is_u64()),
        ("title", "Title must be a string", Value::is_string),
        ("description", "Description must be a string", Value::is_string),
        ("pageCount", "PageCount must be an integer", |v| v.is_i64() || v.is_u64()),
        ("excerpt", "Excerpt must be a string", Value::is_string),
        ("publishDate", "PublishDate must be a string", Value::is_string),
    ];
    for (name, _, _) in &expectations {
        if !fields.contains_key(*name) {
            return Err(AssertionError::new(format!("Missing required field: {name}")));
        }
    }
    for (name, message, check) in expectations {
        if !fields.get(name).is_some_and(check) {
            return Err(AssertionError::new(message));
        }
    }
    Ok(())
}

pub fn books_list_structure(books: &Value) -> Check {
    let Some(items) = books.as_array() else {
        return Err(AssertionError::new("Books data must be a list"));
    };
    for (index, book) in items.iter().enumerate() {
        book_structure(book).map_err(|e| AssertionError::new(format!("book[{index}]: {e}")))?;
    }
    Ok(())
}

/// Every expected field also present in `actual` must match it.
///
/// `publishDate` is compared on its date part only, so
/// `2023-01-01` equals `2023-01-01T00:00:00.000Z`.
pub fn book_content(actual: &Value, expected: &Value) -> Check {
    let (Some(actual), Some(expected)) = (actual.as_object(), expected.as_object()) else {
        return Err(AssertionError::new("Book content must be compared as objects"));
    };
    for (name, expected_value) in expected {
        let Some(actual_value) = actual.get(name) else {
            continue;
        };
        if name == "publishDate" {
            let expected_date = date_part(expected_value);
            let actual_date = date_part(actual_value);
            if actual_date != expected_date {
                return Err(AssertionError::new(format!(
                    "Field '{name}' mismatch: expected '{expected_date}', got '{actual_date}'"
                )));
            }
        } else if actual_value != expected_value {
            return Err(AssertionError::new(format!(
                "Field '{name}' mismatch: expected '{expected_value}', got '{actual_value}'"
            )));
        }
    }
    Ok(())
}

fn date_part(value: &Value) -> String {
    match value.as_str() {
        Some(s) => s.split('T').next().unwrap_or(s).to_string(),
        None => value.to_string(),
    }
}

/// Expected status plus a recognizable error body.
pub fn error_response(response: &HttpResponse, expected: u16) -> Check {
    status_code(response, expected)?;
    match response.json_value() {
        Some(body) => {
            if body.get("error").is_some() || body.get("message").is_some() {
                Ok(())
            } else {
                Err(AssertionError::new(
                    "Error response should contain 'error' or 'message' field",
                ))
            }
        }
        None if !response.body.is_empty() => Ok(()),
        None => Err(AssertionError::new("Error response should have content")),
    }
}
