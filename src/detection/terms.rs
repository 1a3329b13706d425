//! Caller-supplied mask terms and the classification request.

use serde::Deserialize;

use crate::error::RedactError;

/// What the classifier is asked: the comma-joined span context plus extra
/// terms the caller always wants hidden.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClassificationRequest {
    pub context: String,
    pub extra_terms: Vec<String>,
}

impl ClassificationRequest {
    pub fn new(context: impl Into<String>, extra_terms: Vec<String>) -> Self {
        Self {
            context: context.into(),
            extra_terms,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MaskTextEntry {
    Object { text: String },
    Plain(String),
}

/// Split comma-separated entries into trimmed, non-empty terms.
pub fn split_terms<S: AsRef<str>>(entries: &[S]) -> Vec<String> {
    entries
        .iter()
        .flat_map(|entry| entry.as_ref().split(','))
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse the `maskTexts` form field: a JSON array of `{ "text": "a, b" }`
/// objects or plain strings. Each entry may hold several comma-separated terms.
pub fn parse_mask_texts(json: &str) -> Result<Vec<String>, RedactError> {
    if json.trim().is_empty() {
        return Ok(Vec::new());
    }
    let entries: Vec<MaskTextEntry> = serde_json::from_str(json)?;
    let raw: Vec<String> = entries
        .into_iter()
        .map(|entry| match entry {
            MaskTextEntry::Object { text } => text,
            MaskTextEntry::Plain(text) => text,
        })
        .collect();
    Ok(split_terms(&raw))
}
