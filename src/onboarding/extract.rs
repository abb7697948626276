//! Recovers a string list from LLM output.
//!
//! Three tiers, first success wins:
//! 1. the whole answer (or a fenced ```json block) parsed as JSON;
//! 2. the first balanced `{...}` in the text, parsed as-is and then with
//!    single quotes normalized to double quotes;
//! 3. the caller's default list.
//!
//! Falling through to tier 3 is not an error. The [`ExtractionSource`] on the
//! result tells callers which tier produced the value.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// Matches a markdown code fence, optionally tagged `json`.
static FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)\s*```").expect("fence pattern is valid")
});

/// Where an extracted value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionSource {
    /// The model's answer was valid JSON.
    Model,
    /// Pulled out of surrounding prose or fixed-up quoting.
    Recovered,
    /// Nothing usable in the answer; the default list was substituted.
    Default,
}

impl std::fmt::Display for ExtractionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Model => "model",
            Self::Recovered => "recovered",
            Self::Default => "default",
        };
        write!(f, "{s}")
    }
}

/// An extracted list plus its provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    pub value: Vec<String>,
    pub source: ExtractionSource,
}

impl Extracted {
    pub fn is_default_filled(&self) -> bool {
        self.source == ExtractionSource::Default
    }
}

/// Extract the list stored under `key` in `raw`, falling back to `default`.
pub fn extract_list(raw: &str, key: &str, default: &[String]) -> Extracted {
    if let Some(value) = parse_direct(raw, key) {
        return Extracted {
            value,
            source: ExtractionSource::Model,
        };
    }

    if let Some(value) = parse_recovered(raw, key) {
        debug!(key, "Recovered structured value from free-form answer");
        return Extracted {
            value,
            source: ExtractionSource::Recovered,
        };
    }

    warn!(
        key,
        raw_len = raw.len(),
        "No usable JSON in LLM answer; using default list"
    );
    Extracted {
        value: default.to_vec(),
        source: ExtractionSource::Default,
    }
}

/// Tier 1: the answer is JSON (possibly fenced).
fn parse_direct(raw: &str, key: &str) -> Option<Vec<String>> {
    let trimmed = raw.trim();
    let body = FENCE
        .captures(trimmed)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(trimmed);

    let value: Value = serde_json::from_str(body).ok()?;
    list_under_key(&value, key)
}

/// Tier 2: scan for balanced objects and try each in order.
fn parse_recovered(raw: &str, key: &str) -> Option<Vec<String>> {
    let mut offset = 0;
    while let Some((start, end)) = next_balanced_object(&raw[offset..]) {
        let candidate = &raw[offset + start..offset + end];
        let parsed = serde_json::from_str::<Value>(candidate)
            .ok()
            .or_else(|| serde_json::from_str::<Value>(&candidate.replace('\'', "\"")).ok());
        if let Some(list) = parsed.as_ref().and_then(|v| list_under_key(v, key)) {
            return Some(list);
        }
        offset += end;
    }
    None
}

/// Byte range of the first balanced `{...}` in `text`.
///
/// Braces inside single- or double-quoted runs within an object don't count;
/// quotes in surrounding prose are ignored. An opening brace that never
/// closes is skipped in favour of the next one that does. One pass over the
/// text, tracking open braces on a stack.
fn next_balanced_object(text: &str) -> Option<(usize, usize)> {
    let mut open: Vec<usize> = Vec::new();
    let mut earliest: Option<(usize, usize)> = None;
    let mut quote: Option<u8> = None;
    let mut escaped = false;

    for (i, &b) in text.as_bytes().iter().enumerate() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == q {
                quote = None;
            }
            continue;
        }
        match b {
            b'"' | b'\'' if !open.is_empty() => quote = Some(b),
            b'{' => open.push(i),
            b'}' => {
                let Some(start) = open.pop() else { continue };
                // Nothing still open to the left: no earlier object can close.
                if open.is_empty() {
                    return Some((start, i + 1));
                }
                if earliest.is_none_or(|(s, _)| start < s) {
                    earliest = Some((start, i + 1));
                }
            }
            _ => {}
        }
    }
    earliest
}

/// Read `key` from a JSON object as a non-empty list of strings.
///
/// Numbers and booleans are stringified; other items are dropped.
fn list_under_key(value: &Value, key: &str) -> Option<Vec<String>> {
    let items = value.as_object()?.get(key)?.as_array()?;
    let list: Vec<String> = items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => {
                let s = s.trim();
                (!s.is_empty()).then(|| s.to_string())
            }
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        })
        .collect();
    (!list.is_empty()).then_some(list)
}
