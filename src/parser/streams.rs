use std::collections::HashSet;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use super::fields::{self, PartnerStatus};

pub const CHANNEL_BASE_URL: &str = "https://www.twitch.tv";

const VIEWER_KEYS: &[&str] = &["viewCount", "viewersCount", "viewerCount"];
const LOGIN_KEYS: &[&str] = &["broadcasterLogin", "login", "channelLogin"];

/// One live channel, flattened from whatever shape the page state used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamRecord {
    pub url: Option<String>,
    pub game_name: Option<String>,
    pub partner_status: PartnerStatus,
    pub tags: Vec<String>,
    pub title: Option<String>,
    pub view_count: i64,
}

/// An object is stream-like when it has a viewer count, a title and a login.
fn is_stream_node(node: &Map<String, Value>) -> bool {
    VIEWER_KEYS.iter().any(|k| node.contains_key(*k))
        && node.contains_key("title")
        && LOGIN_KEYS.iter().any(|k| node.contains_key(*k))
}

/// Pre-order walk collecting every stream-like object, including ones nested
/// inside another match.
pub fn gather_stream_nodes<'a>(node: &'a Value, out: &mut Vec<&'a Map<String, Value>>) {
    match node {
        Value::Object(map) => {
            if is_stream_node(map) {
                out.push(map);
            }
            for child in map.values() {
                gather_stream_nodes(child, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                gather_stream_nodes(item, out);
            }
        }
        _ => {}
    }
}

fn login(node: &Map<String, Value>) -> Option<String> {
    fields::first_truthy(node, LOGIN_KEYS).map(fields::stringify)
}

fn title(node: &Map<String, Value>) -> Option<String> {
    node.get("title")
        .filter(|v| !v.is_null())
        .map(fields::stringify)
}

/// Keep the first node for each (login, title) pair, in discovery order.
pub fn dedup_nodes<'a>(nodes: Vec<&'a Map<String, Value>>) -> Vec<&'a Map<String, Value>> {
    let mut seen = HashSet::new();
    nodes
        .into_iter()
        .filter(|node| seen.insert((login(node), title(node))))
        .collect()
}

fn game_name(node: &Map<String, Value>) -> Option<String> {
    match node.get("game")? {
        Value::Null => None,
        Value::Object(game) => {
            fields::first_truthy(game, &["displayName", "name"]).map(fields::stringify)
        }
        other => Some(fields::stringify(other)),
    }
}

/// Map one stream-like node into a record. `game_name` may still be empty;
/// callers backfill it with the category they asked for.
pub fn to_record(node: &Map<String, Value>) -> StreamRecord {
    let url = login(node).map(|l| format!("{}/{}", CHANNEL_BASE_URL, l));
    let viewers = fields::first_truthy(node, VIEWER_KEYS);

    StreamRecord {
        url,
        game_name: game_name(node),
        partner_status: fields::partner_status(node),
        tags: fields::normalize_tags(node.get("tags")),
        title: title(node),
        view_count: fields::safe_int(viewers, 0),
    }
}

/// Find, dedupe, cap and map stream nodes from decoded page state.
pub fn parse_streams(data: Option<&Value>, max_streams: usize) -> Vec<StreamRecord> {
    let Some(data) = data else {
        return Vec::new();
    };

    let mut candidates = Vec::new();
    gather_stream_nodes(data, &mut candidates);
    if candidates.is_empty() {
        warn!("No stream nodes found in page data");
        return Vec::new();
    }

    dedup_nodes(candidates)
        .into_iter()
        .take(max_streams)
        .map(to_record)
        .collect()
}
