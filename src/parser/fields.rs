use std::collections::HashSet;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

const TAG_NAME_KEYS: &[&str] = &["tagName", "localizedName", "label"];
const BADGE_TEXT_KEYS: &[&str] = &["setID", "title", "description"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PartnerStatus {
    Partnered,
    #[serde(rename = "Non-Partner")]
    NonPartner,
}

/// Whether a value carries anything: null, false, zero and empty values don't.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// First truthy value among `keys`, in key order.
pub fn first_truthy<'a>(node: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| node.get(*k))
        .find(|v| is_truthy(v))
}

/// Render a JSON value as text: strings unquoted, everything else as JSON.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Best-effort integer conversion; anything unconvertible yields `default`.
pub fn safe_int(value: Option<&Value>, default: i64) -> i64 {
    let converted = match value {
        Some(Value::Number(n)) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
                .map(|f| f.trunc() as i64)
        }),
        Some(Value::Bool(b)) => Some(i64::from(*b)),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    converted.unwrap_or_else(|| {
        debug!("Failed to convert {:?} to int, using default {}", value, default);
        default
    })
}

/// Flatten the many shapes a `tags` field takes into a clean list.
///
/// Strings are split on commas, objects contribute their values, and array
/// entries may be plain strings or tag objects (`tagName`, `localizedName`,
/// `label`). Duplicates are dropped case-insensitively, keeping the first
/// spelling seen.
pub fn normalize_tags(raw: Option<&Value>) -> Vec<String> {
    let mut tags = Vec::new();

    match raw {
        None | Some(Value::Null) => return tags,
        Some(Value::String(s)) => {
            tags.extend(
                s.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string),
            );
        }
        Some(Value::Array(items)) => tags.extend(items.iter().filter_map(tag_entry)),
        Some(Value::Object(map)) => tags.extend(map.values().filter_map(tag_entry)),
        Some(other) => {
            if is_truthy(other) {
                push_trimmed(&mut tags, &stringify(other));
            }
        }
    }

    dedup_case_insensitive(tags)
}

fn tag_entry(entry: &Value) -> Option<String> {
    let text = match entry {
        Value::Object(map) => first_truthy(map, TAG_NAME_KEYS).map(stringify)?,
        other if !is_truthy(other) => return None,
        other => stringify(other),
    };
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn push_trimmed(tags: &mut Vec<String>, text: &str) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        tags.push(trimmed.to_string());
    }
}

fn dedup_case_insensitive(tags: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    tags.into_iter()
        .filter(|t| seen.insert(t.to_lowercase()))
        .collect()
}

/// Partner flag from `broadcasterType`, or from any badge mentioning "partner".
pub fn partner_status(node: &Map<String, Value>) -> PartnerStatus {
    let typed_partner = node
        .get("broadcasterType")
        .and_then(Value::as_str)
        .is_some_and(|t| t.eq_ignore_ascii_case("PARTNER"));
    if typed_partner {
        return PartnerStatus::Partnered;
    }

    let badge_text = node
        .get("broadcasterBadges")
        .and_then(Value::as_array)
        .map(|badges| {
            badges
                .iter()
                .filter_map(Value::as_object)
                .map(|badge| {
                    BADGE_TEXT_KEYS
                        .iter()
                        .map(|k| {
                            badge
                                .get(*k)
                                .filter(|v| is_truthy(v))
                                .map(stringify)
                                .unwrap_or_default()
                        })
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default();

    if badge_text.to_lowercase().contains("partner") {
        PartnerStatus::Partnered
    } else {
        PartnerStatus::NonPartner
    }
}
