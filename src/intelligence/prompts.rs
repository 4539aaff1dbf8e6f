//! Prompt templates and response parsing for the document operations.

use serde_json::Value;

use crate::error::{DocaiError, Result};

/// Document types the classifier may return.
pub const DOCUMENT_TYPES: &[&str] = &[
    "invoice",
    "receipt",
    "purchase_order",
    "resume",
    "report",
    "unknown",
];

pub fn classify_prompt(text: &str) -> String {
    let types: String = DOCUMENT_TYPES
        .iter()
        .map(|t| format!("- {t}\n"))
        .collect();
    format!(
        "Classify this document into:\n{types}\n\
         Respond ONLY in JSON including:\n\
         {{\n    \"document_type\": \"...\",\n    \"confidence\": 0.xx\n}}\n\n\
         TEXT:\n{text}\n"
    )
}

pub fn extract_prompt(text: &str, doc_type: &str) -> String {
    format!(
        "Extract structured fields from this {doc_type} document.\n\
         Return ONLY valid JSON. No explanations.\n\n\
         Document:\n{text}\n"
    )
}

pub fn summarize_prompt(text: &str) -> String {
    format!("Summarize this document concisely:\n{text}")
}

/// Parse a model response as JSON, tolerating a Markdown code fence around it.
pub fn parse_json_response(raw: &str) -> Result<Value> {
    let trimmed = raw.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Ok(value);
    }
    let unfenced = strip_code_fence(trimmed);
    serde_json::from_str(unfenced).map_err(|e| {
        DocaiError::Provider(format!("Model returned invalid JSON: {e}"))
    })
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the language tag line, e.g. ```json
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
    body.trim_end().trim_end_matches("```").trim()
}
