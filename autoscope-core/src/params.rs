//! Request parameters
//!
//! The engine reads parameters through [`RequestParams`], which canonicalizes
//! every key (numbers and strings alike) to one string form at construction
//! time. Lookups never need to care how the caller spelled a key.

use crate::value::{kind_name, is_present, Map, Value};
use crate::{ParamsError, ScopeResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::LazyLock;

/// Parameter naming the subtype to narrow to.
pub const TYPE_PARAM: &str = "type";
/// Parameter carrying the implicit identifier filter.
pub const IDS_PARAM: &str = "ids";
/// Pagination page number parameter.
pub const PAGE_PARAM: &str = "page";
/// Pagination page size parameter.
pub const PER_PAGE_PARAM: &str = "per_page";

/// Deepest bracket nesting `from_query` accepts in a single key.
pub const MAX_KEY_DEPTH: usize = 100;

static KEY_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([^\[\]]+)((?:\[[^\[\]]*\])*)$").expect("Invalid key path regex")
});

static KEY_SEGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([^\[\]]*)\]").expect("Invalid key segment regex")
});

/// Flat request parameters with indifferent key access.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestParams {
    values: Map<String, Value>,
}

impl RequestParams {
    /// Create an empty parameter bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a JSON value. Only objects are accepted.
    pub fn from_json(value: Value) -> ScopeResult<Self> {
        match value {
            Value::Object(map) => Ok(Self::from_map(map)),
            other => Err(ParamsError::NotAnObject {
                found: kind_name(&other).to_string(),
            }
            .into()),
        }
    }

    /// Build from an already-decoded JSON object.
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self {
            values: canonicalize_map(map),
        }
    }

    /// Build from key/value pairs; any `ToString` key is accepted, so `1` and
    /// `"1"` land on the same entry.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: ToString,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let map = pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.into()))
            .collect();
        Self::from_map(map)
    }

    /// Decode an URL query string with bracket nesting
    /// (`scope[arg]=1`, `scope[ids][]=1`).
    pub fn from_query(query: &str) -> ScopeResult<Self> {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut root = Map::new();

        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (raw_key, raw_value) = pair.split_once('=').unwrap_or((pair, ""));
            let key = decode_component(raw_key)?;
            if key.is_empty() {
                continue;
            }
            let (head, segments) = parse_key_path(&key)?;
            if head.is_empty() {
                continue;
            }
            let value = decode_component(raw_value)?;
            let slot = root.entry(head).or_insert(Value::Null);
            assign(slot, &segments, Value::String(value), &key)?;
        }

        Ok(Self { values: root })
    }

    /// Add or replace one entry, returning the updated bag.
    pub fn with(mut self, key: impl ToString, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Add or replace one entry.
    pub fn insert(&mut self, key: impl ToString, value: impl Into<Value>) {
        self.values
            .insert(key.to_string().trim().to_string(), canonicalize(value.into()));
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// True when the key exists and its value is not blank.
    pub fn is_present(&self, key: &str) -> bool {
        self.get(key).is_some_and(is_present)
    }

    /// The value under `key` when it is present (non-blank).
    pub fn present(&self, key: &str) -> Option<&Value> {
        self.get(key).filter(|v| is_present(v))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }
}

impl TryFrom<Value> for RequestParams {
    type Error = crate::ScopeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_json(value)
    }
}

impl FromStr for RequestParams {
    type Err = crate::ScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_query(s)
    }
}

fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(canonicalize_map(map)),
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

fn canonicalize_map(map: Map<String, Value>) -> Map<String, Value> {
    map.into_iter()
        .map(|(k, v)| (k.trim().to_string(), canonicalize(v)))
        .collect()
}

// ============================================================================
// QUERY STRING DECODING
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Push,
}

fn decode_component(raw: &str) -> Result<String, ParamsError> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|decoded| decoded.into_owned())
        .map_err(|e| ParamsError::MalformedQueryKey {
            key: raw.to_string(),
            reason: e.to_string(),
        })
}

fn parse_key_path(key: &str) -> Result<(String, Vec<Segment>), ParamsError> {
    let captures = KEY_PATH
        .captures(key)
        .ok_or_else(|| ParamsError::MalformedQueryKey {
            key: key.to_string(),
            reason: "unbalanced brackets".to_string(),
        })?;

    let head = captures[1].trim().to_string();
    let mut segments = Vec::new();
    for c in KEY_SEGMENT.captures_iter(&captures[2]) {
        if segments.len() == MAX_KEY_DEPTH {
            return Err(ParamsError::MalformedQueryKey {
                key: head,
                reason: "nesting too deep".to_string(),
            });
        }
        segments.push(match &c[1] {
            "" => Segment::Push,
            name => Segment::Key(name.trim().to_string()),
        });
    }

    Ok((head, segments))
}

fn assign(slot: &mut Value, rest: &[Segment], value: Value, key: &str) -> Result<(), ParamsError> {
    let conflict = || ParamsError::ConflictingQueryShape {
        key: key.to_string(),
    };

    let Some((segment, tail)) = rest.split_first() else {
        if slot.is_object() || slot.is_array() {
            return Err(conflict());
        }
        *slot = value;
        return Ok(());
    };

    match segment {
        Segment::Key(name) => {
            if slot.is_null() {
                *slot = Value::Object(Map::new());
            }
            let Value::Object(map) = slot else {
                return Err(conflict());
            };
            let child = map.entry(name.clone()).or_insert(Value::Null);
            assign(child, tail, value, key)
        }
        Segment::Push => {
            if slot.is_null() {
                *slot = Value::Array(Vec::new());
            }
            let Value::Array(items) = slot else {
                return Err(conflict());
            };
            if tail.is_empty() {
                items.push(value);
                return Ok(());
            }
            // `a[][b]=1&a[][c]=2` fills one element until a key repeats
            let reuse_last = match (items.last(), tail.first()) {
                (Some(Value::Object(last)), Some(Segment::Key(next))) => !last.contains_key(next),
                _ => false,
            };
            if !reuse_last {
                items.push(Value::Null);
            }
            let last = items.len() - 1;
            assign(&mut items[last], tail, value, key)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScopeError;
    use serde_json::json;

    #[test]
    fn test_from_pairs_normalizes_numeric_keys() {
        let params = RequestParams::from_pairs([(1, json!("one")), (2, json!("two"))]);
        assert_eq!(params.get("1"), Some(&json!("one")));
        assert_eq!(params.get("2"), Some(&json!("two")));
    }

    #[test]
    fn test_from_json_rejects_non_objects() {
        let err = RequestParams::from_json(json!(["type"])).unwrap_err();
        assert!(matches!(
            err,
            ScopeError::Params(ParamsError::NotAnObject { .. })
        ));
    }

    #[test]
    fn test_nested_keys_are_canonicalized() {
        let params = RequestParams::from_json(json!({
            " user_id_scope ": { " user_id ": "1" }
        }))
        .unwrap();
        assert_eq!(params.get("user_id_scope"), Some(&json!({ "user_id": "1" })));
    }

    #[test]
    fn test_presence() {
        let params = RequestParams::new()
            .with("blank", "")
            .with("flag", true)
            .with("off", false);
        assert!(!params.is_present("blank"));
        assert!(params.contains("blank"));
        assert!(params.is_present("flag"));
        assert!(!params.is_present("off"));
        assert!(!params.is_present("missing"));
        assert_eq!(params.present("flag"), Some(&json!(true)));
    }

    #[test]
    fn test_query_flat_pairs() {
        let params = RequestParams::from_query("?type=Admin&page=3&no_param_scope").unwrap();
        assert_eq!(params.get("type"), Some(&json!("Admin")));
        assert_eq!(params.get("page"), Some(&json!("3")));
        assert_eq!(params.get("no_param_scope"), Some(&json!("")));
    }

    #[test]
    fn test_query_nested_scope_arguments() {
        let params: RequestParams =
            "two_param_scope[id1]=1&two_param_scope[id2]=2&vararg_scope[ids][]=1&vararg_scope[ids][]=2"
                .parse()
                .unwrap();
        assert_eq!(
            params.get("two_param_scope"),
            Some(&json!({ "id1": "1", "id2": "2" }))
        );
        assert_eq!(params.get("vararg_scope"), Some(&json!({ "ids": ["1", "2"] })));
    }

    #[test]
    fn test_query_decoding() {
        let params = RequestParams::from_query("by_name%5Bname%5D=Dan+Smith&q=a%26b").unwrap();
        assert_eq!(params.get("by_name"), Some(&json!({ "name": "Dan Smith" })));
        assert_eq!(params.get("q"), Some(&json!("a&b")));
    }

    #[test]
    fn test_query_array_of_objects() {
        let params = RequestParams::from_query("a[][b]=1&a[][c]=2&a[][b]=3").unwrap();
        assert_eq!(
            params.get("a"),
            Some(&json!([{ "b": "1", "c": "2" }, { "b": "3" }]))
        );
    }

    #[test]
    fn test_query_last_scalar_wins() {
        let params = RequestParams::from_query("page=1&page=2").unwrap();
        assert_eq!(params.get("page"), Some(&json!("2")));
    }

    #[test]
    fn test_query_shape_conflict() {
        let err = RequestParams::from_query("a=1&a[b]=2").unwrap_err();
        assert!(matches!(
            err,
            ScopeError::Params(ParamsError::ConflictingQueryShape { .. })
        ));
    }

    #[test]
    fn test_query_unbalanced_brackets() {
        let err = RequestParams::from_query("a[b=1").unwrap_err();
        assert!(matches!(
            err,
            ScopeError::Params(ParamsError::MalformedQueryKey { .. })
        ));
    }

    #[test]
    fn test_query_skips_empty_pairs_and_keys() {
        let params = RequestParams::from_query("&&=x&ids[]=7").unwrap();
        assert_eq!(params.len(), 1);
        assert_eq!(params.get("ids"), Some(&json!(["7"])));
    }

    #[test]
    fn test_query_keys_are_trimmed() {
        let params = RequestParams::from_query("+page+=2&by_user[+user_id+]=1&+=x").unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params.get("page"), Some(&json!("2")));
        assert_eq!(params.get("by_user"), Some(&json!({ "user_id": "1" })));
    }

    #[test]
    fn test_query_rejects_deep_nesting() {
        let query = format!("a{}=1", "[x]".repeat(1000));
        let err = RequestParams::from_query(&query).unwrap_err();
        assert!(matches!(
            err,
            ScopeError::Params(ParamsError::MalformedQueryKey { ref reason, .. })
                if reason == "nesting too deep"
        ));
    }

    #[test]
    fn test_query_accepts_nesting_up_to_limit() {
        let query = format!("a{}=1", "[x]".repeat(MAX_KEY_DEPTH));
        let params = RequestParams::from_query(&query).unwrap();
        let mut node = params.get("a").unwrap();
        for _ in 0..MAX_KEY_DEPTH {
            node = &node["x"];
        }
        assert_eq!(node, &json!("1"));
    }
}
