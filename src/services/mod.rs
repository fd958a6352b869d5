//! Service adapters. Each fixes its endpoints, the scope its verticals need and the
//! parsers that turn raw items into records.

mod groupme;
mod strava;
mod tumblr;

pub use groupme::GroupMeTransferService;
pub use strava::StravaTransferService;
pub use tumblr::TumblrTransferService;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

/// An identifier some services send as a number and others as a string.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(u64),
    Text(String),
}

impl fmt::Display for RawId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawId::Number(id) => write!(f, "{}", id),
            RawId::Text(id) => f.write_str(id),
        }
    }
}

/// Deserializes a raw item, or `None` when it is not a JSON object of the expected
/// shape.
fn from_object<T: DeserializeOwned>(raw: &Value) -> Option<T> {
    if !raw.is_object() {
        return None;
    }
    T::deserialize(raw).ok()
}

/// Parses every item of a list response, keeping unparseable items as `None`.
fn parse_items<T>(items: &[Value], parse: impl Fn(&Value) -> Option<T>) -> Vec<Option<T>> {
    items.iter().map(parse).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Item {
        id: Option<RawId>,
    }

    #[test]
    fn ids_accept_numbers_and_strings() {
        let number: Item = from_object(&json!({"id": 12345})).unwrap();
        let text: Item = from_object(&json!({"id": "101010"})).unwrap();
        assert_eq!(number.id.unwrap().to_string(), "12345");
        assert_eq!(text.id.unwrap().to_string(), "101010");
    }

    #[test]
    fn non_objects_are_not_parsed() {
        assert!(from_object::<Item>(&json!("fake")).is_none());
        assert!(from_object::<Item>(&Value::Null).is_none());
        assert!(from_object::<Item>(&json!([])).is_none());
    }

    #[test]
    fn unparseable_items_keep_their_position() {
        let items = vec![json!({"id": 1}), json!("list"), json!({"id": "b"})];
        let parsed = parse_items(&items, |raw| from_object::<Item>(raw));
        assert_eq!(parsed.len(), 3);
        assert!(parsed[0].is_some());
        assert!(parsed[1].is_none());
        assert!(parsed[2].is_some());
    }
}
