//! Application data carried at the end of a model reply.
//!
//! The prompt asks for an `<application_data>` block. Models do not always
//! comply, so a fenced ```json block and, as a last resort, a bare object
//! literal mentioning every expected field (in any order) are accepted too.
//! Whatever block is found is removed from the visible text, parsed or not.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::db::models::{ApplicationFields, Field};

pub const DATA_OPEN: &str = "<application_data>";
pub const DATA_CLOSE: &str = "</application_data>";

static DELIMITED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<application_data>\s*(.*?)\s*</application_data>").unwrap());
static FENCED: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```(?:json)?\s*\n(\{.*?\})\s*```").unwrap());
static BARE_OBJECT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{[^{}]*\}").unwrap());

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Extraction {
    /// Reply with the data block removed.
    pub text: String,
    /// Parsed answers; `None` when no block was found or it did not parse.
    pub data: Option<ApplicationFields>,
    pub found_block: bool,
}

pub fn extract_application_data(text: &str, expected: &[Field]) -> Extraction {
    let Some((span, body)) = locate_block(text, expected) else {
        return Extraction {
            text: text.to_string(),
            data: None,
            found_block: false,
        };
    };

    let mut visible = String::with_capacity(text.len());
    visible.push_str(&text[..span.0]);
    visible.push_str(&text[span.1..]);

    let data = match parse_fields(body) {
        Ok(fields) if !fields.is_empty() => Some(fields),
        Ok(_) => {
            debug!("Application data block carried no known fields");
            None
        }
        Err(e) => {
            warn!("Failed to parse application data block: {}", e);
            None
        }
    };

    Extraction {
        text: crate::relay::directive::tidy(&visible),
        data,
        found_block: true,
    }
}

fn locate_block<'a>(text: &'a str, expected: &[Field]) -> Option<((usize, usize), &'a str)> {
    for re in [&*DELIMITED, &*FENCED] {
        if let Some(cap) = re.captures(text) {
            let whole = cap.get(0)?;
            let body = cap.get(1)?;
            return Some(((whole.start(), whole.end()), body.as_str()));
        }
    }

    if expected.is_empty() {
        return None;
    }
    BARE_OBJECT
        .find_iter(text)
        .find(|m| {
            expected
                .iter()
                .all(|f| m.as_str().contains(&format!("\"{}\"", f.column())))
        })
        .map(|m| ((m.start(), m.end()), m.as_str()))
}

/// Keeps known keys; strings verbatim, `null` dropped, other scalars stringified.
pub fn parse_fields(body: &str) -> Result<ApplicationFields, serde_json::Error> {
    let object: Map<String, Value> = serde_json::from_str(body.trim())?;

    let mut fields = ApplicationFields::new();
    for (key, value) in object {
        let Ok(field) = key.parse::<Field>() else {
            debug!("Ignoring unknown application key '{}'", key);
            continue;
        };
        match value {
            Value::Null => {}
            Value::String(s) => {
                let s = s.trim();
                if !s.is_empty() && s != "null" {
                    fields.insert(field, s.to_string());
                }
            }
            other => {
                fields.insert(field, other.to_string());
            }
        }
    }
    Ok(fields)
}
