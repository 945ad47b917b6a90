//! Pull JSON out of free-form model output.
//!
//! Models asked for JSON still wrap it in prose or Markdown fences now and
//! then. Candidates are tried in order: the whole text, a fenced block,
//! then bracketed spans from widest to shortest.

use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;

use super::error::AiError;

static FENCED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json|JSON)?\s*\n?(.*?)```").expect("Invalid regex")
});

static ARRAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[.*\]").expect("Invalid regex"));

static OBJECT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("Invalid regex"));

static SHORT_ARRAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[.*?\]").expect("Invalid regex"));

static SHORT_OBJECT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*?\}").expect("Invalid regex"));

/// Deserialize the first JSON value in `text` that parses as `T`.
///
/// # Errors
///
/// Returns `AiError::InvalidModelOutput` if no candidate parses.
pub fn extract_json<T: DeserializeOwned>(text: &str) -> Result<T, AiError> {
    let trimmed = text.trim();
    let mut candidates = vec![trimmed];
    if let Some(block) = FENCED_RE.captures(trimmed).and_then(|c| c.get(1)) {
        candidates.push(block.as_str().trim());
    }
    for re in [&*ARRAY_RE, &*OBJECT_RE] {
        if let Some(span) = re.find(trimmed) {
            candidates.push(span.as_str());
        }
    }
    // Widest spans first; the shortest bracketed spans catch replies that
    // hold more than one bracket group.
    for re in [&*SHORT_ARRAY_RE, &*SHORT_OBJECT_RE] {
        candidates.extend(re.find_iter(trimmed).map(|m| m.as_str()));
    }

    candidates
        .into_iter()
        .find_map(|candidate| serde_json::from_str(candidate).ok())
        .ok_or_else(|| {
            AiError::InvalidModelOutput(format!(
                "no JSON found in: {}",
                trimmed.chars().take(120).collect::<String>()
            ))
        })
}
