//! Response interpreter: extracts and repairs a JSON payload from untrusted
//! model output, then normalizes, deduplicates, and (for the self-check
//! pass) caps the accepted candidates per bucket.
//!
//! Never fails past this boundary: the worst case is an empty list.

use std::collections::{HashMap, HashSet};

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::models::query::{GeneratedQuery, QueryBucket, QueryStyle};

#[derive(Debug, Default, Deserialize)]
struct QueriesPayload {
    #[serde(default)]
    queries: Vec<Value>,
}

/// First-pass interpretation: extract, normalize, dedupe.
pub fn interpret(raw: &str) -> Vec<GeneratedQuery> {
    dedupe(normalize(parse_payload(raw)))
}

/// Self-check interpretation: as `interpret`, plus a hard per-bucket cap.
pub fn interpret_capped(raw: &str, per_bucket: usize) -> Vec<GeneratedQuery> {
    cap_buckets(dedupe(normalize(parse_payload(raw))), per_bucket)
}

/// Strict parse first; on failure, recover the substring between the first
/// `{` and the last `}`. The model is instructed to emit minified JSON but
/// routinely wraps it in prose or markdown fences, and brace extraction
/// handles that case without a tolerant-JSON parser.
fn parse_payload(raw: &str) -> QueriesPayload {
    let trimmed = raw.trim();
    if let Ok(payload) = serde_json::from_str::<QueriesPayload>(trimmed) {
        return payload;
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if end > start {
            match serde_json::from_str::<QueriesPayload>(&trimmed[start..=end]) {
                Ok(payload) => return payload,
                Err(e) => {
                    warn!(error = %e, "Failed to parse model output after brace extraction");
                    return QueriesPayload::default();
                }
            }
        }
    }

    warn!("No JSON object found in model output");
    QueriesPayload::default()
}

fn normalize(payload: QueriesPayload) -> Vec<GeneratedQuery> {
    payload.queries.iter().filter_map(query_from_value).collect()
}

/// Builds a normalized query from one raw candidate entry. Entries that are
/// not objects, or whose text is missing or blank, are dropped.
fn query_from_value(value: &Value) -> Option<GeneratedQuery> {
    let text = value.get("text")?.as_str()?.trim();
    if text.is_empty() {
        return None;
    }
    let style = value
        .get("style")
        .and_then(Value::as_str)
        .map(QueryStyle::from_raw)
        .unwrap_or(QueryStyle::Short);
    let bucket = value
        .get("bucket")
        .and_then(Value::as_str)
        .map(QueryBucket::from_raw)
        .unwrap_or(QueryBucket::Misc);
    Some(GeneratedQuery {
        text: text.to_string(),
        style,
        bucket,
    })
}

/// Drops later duplicates of (lower-cased text, style, bucket), preserving
/// first-seen order.
fn dedupe(queries: Vec<GeneratedQuery>) -> Vec<GeneratedQuery> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(queries.len());
    for query in queries {
        let key = (query.text.to_lowercase(), query.style, query.bucket);
        if seen.insert(key) {
            out.push(query);
        }
    }
    out
}

/// Keeps at most `per_bucket` queries per bucket, preserving first-seen
/// order and dropping the excess.
fn cap_buckets(queries: Vec<GeneratedQuery>, per_bucket: usize) -> Vec<GeneratedQuery> {
    let mut counts: HashMap<QueryBucket, usize> = HashMap::new();
    let mut out = Vec::with_capacity(queries.len());
    for query in queries {
        let count = counts.entry(query.bucket).or_insert(0);
        if *count < per_bucket {
            *count += 1;
            out.push(query);
        }
    }
    out
}
