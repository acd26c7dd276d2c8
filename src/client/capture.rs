use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::QuestionTag;
use crate::db::models::{ApplicationFields, Field};

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap());
// A digit, then at least six digits/separators, then a digit
static PHONE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\+?\d[\d\s().-]{6,}\d").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Contact {
    Email(String),
    Phone(String),
}

/// Email wins over phone. When neither pattern matches the text is kept
/// verbatim as the phone number.
pub fn extract_contact(raw: &str) -> Contact {
    if let Some(m) = EMAIL.find(raw) {
        return Contact::Email(m.as_str().to_string());
    }
    if let Some(m) = PHONE.find(raw) {
        return Contact::Phone(m.as_str().trim().to_string());
    }
    Contact::Phone(raw.to_string())
}

/// The fields one answer fills for the active question.
pub fn capture_answer(tag: QuestionTag, answer: &str) -> ApplicationFields {
    let answer = answer.trim();
    let mut fields = ApplicationFields::new();
    if answer.is_empty() {
        return fields;
    }

    match tag {
        QuestionTag::Contact => match extract_contact(answer) {
            Contact::Email(email) => {
                fields.insert(Field::Email, email);
            }
            Contact::Phone(phone) => {
                fields.insert(Field::Phone, phone);
            }
        },
        other => {
            if let Some(field) = other.field() {
                fields.insert(field, answer.to_string());
            }
        }
    }
    fields
}
