use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use crate::config::QuestionTag;

static SHOW_BUTTON: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[SHOW_BUTTON:([^\]]+)\]").unwrap());
static QUESTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[QUESTION:\s*([A-Za-z_]+)\s*\]").unwrap());

/// Removes every `[SHOW_BUTTON:<url>]` token. The url of the first token is
/// returned exactly as written between the colon and the bracket.
pub fn extract_button(text: &str) -> (String, Option<String>) {
    let url = SHOW_BUTTON
        .captures(text)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().to_string());

    if url.is_none() {
        return (text.to_string(), None);
    }

    (tidy(&SHOW_BUTTON.replace_all(text, "")), url)
}

/// Removes every `[QUESTION:<tag>]` marker and reports the last recognised tag.
pub fn extract_question(text: &str) -> (String, Option<QuestionTag>) {
    let mut tag = None;
    for cap in QUESTION.captures_iter(text) {
        match cap[1].to_lowercase().parse::<QuestionTag>() {
            Ok(parsed) => tag = Some(parsed),
            Err(e) => warn!("Dropping question marker: {}", e),
        }
    }

    if !QUESTION.is_match(text) {
        return (text.to_string(), None);
    }

    (tidy(&QUESTION.replace_all(text, "")), tag)
}

/// Trims the text and folds the blank lines a removed token leaves behind.
pub(crate) fn tidy(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0;
    for line in text.trim().lines() {
        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(line);
    }
    out
}
