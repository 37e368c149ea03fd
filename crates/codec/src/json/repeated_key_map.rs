//! Map codec that tolerates repeated object keys.
//!
//! Some cookbook listings come back from the Chef server with the same key
//! twice; the last occurrence carries the wanted value. Decoding folds the
//! members in document order, so a later key overwrites an earlier one, and
//! members whose value is `null` are dropped rather than stored.

use std::{
    collections::{hash_map, HashMap},
    fmt,
    hash::Hash,
    marker::PhantomData,
};

use serde::{
    de::{DeserializeOwned, MapAccess, Visitor},
    ser::SerializeMap,
    Deserialize, Deserializer, Serialize, Serializer,
};

use crate::error::{record_failure, CodecError, CodecResult};

/// Key-unique mapping built with last-write-wins semantics.
#[derive(Debug, Clone)]
pub struct RepeatedKeyMap<K, V> {
    entries: HashMap<K, V>,
}

impl<K, V> RepeatedKeyMap<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Folds `(key, value)` pairs in order. A `None` value is skipped and does
    /// not remove an earlier entry for the same key.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Option<V>)>,
    {
        let mut map = Self::new();
        for (key, value) in pairs {
            if let Some(value) = value {
                map.entries.insert(key, value);
            }
        }
        map
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> hash_map::Keys<'_, K, V> {
        self.entries.keys()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, K, V> {
        self.entries.iter()
    }

    pub fn into_inner(self) -> HashMap<K, V> {
        self.entries
    }
}

impl<K, V> Default for RepeatedKeyMap<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> PartialEq for RepeatedKeyMap<K, V>
where
    K: Eq + Hash,
    V: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<K, V> Eq for RepeatedKeyMap<K, V>
where
    K: Eq + Hash,
    V: Eq,
{
}

impl<K, V> FromIterator<(K, V)> for RepeatedKeyMap<K, V>
where
    K: Eq + Hash,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_pairs(iter.into_iter().map(|(key, value)| (key, Some(value))))
    }
}

impl<K, V> IntoIterator for RepeatedKeyMap<K, V> {
    type Item = (K, V);
    type IntoIter = hash_map::IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K, V> Serialize for RepeatedKeyMap<K, V>
where
    K: Serialize,
    V: Serialize,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de, K, V> Deserialize<'de> for RepeatedKeyMap<K, V>
where
    K: Deserialize<'de> + Eq + Hash,
    V: Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(KeepLastVisitor(PhantomData))
    }
}

struct KeepLastVisitor<K, V>(PhantomData<fn() -> (K, V)>);

impl<'de, K, V> Visitor<'de> for KeepLastVisitor<K, V>
where
    K: Deserialize<'de> + Eq + Hash,
    V: Deserialize<'de>,
{
    type Value = RepeatedKeyMap<K, V>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a json object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut map = RepeatedKeyMap::new();
        while let Some((key, value)) = access.next_entry::<K, Option<V>>()? {
            if let Some(value) = value {
                map.entries.insert(key, value);
            }
        }
        Ok(map)
    }
}

/// Decodes a JSON object into a [`RepeatedKeyMap`].
pub fn decode_map<K, V>(text: &str) -> CodecResult<RepeatedKeyMap<K, V>>
where
    K: DeserializeOwned + Eq + Hash,
    V: DeserializeOwned,
{
    serde_json::from_str(text)
        .map_err(|err| CodecError::malformed(err, text))
        .inspect_err(record_failure)
}

pub fn encode_map<K, V>(map: &RepeatedKeyMap<K, V>) -> CodecResult<String>
where
    K: Serialize,
    V: Serialize,
{
    serde_json::to_string(map)
        .map_err(|err| CodecError::malformed(err, "<map>"))
        .inspect_err(record_failure)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_last_value_for_repeated_keys() {
        let map: RepeatedKeyMap<String, String> =
            decode_map(r#"{"apache2":"first","nginx":"only","apache2":"last"}"#).unwrap();

        assert_eq!(map.len(), 2);
        assert_eq!(map.get(&"apache2".to_string()).map(String::as_str), Some("last"));
        assert_eq!(map.get(&"nginx".to_string()).map(String::as_str), Some("only"));
    }

    #[test]
    fn drops_null_values() {
        let map: RepeatedKeyMap<String, u32> =
            decode_map(r#"{"a":1,"b":null,"c":3}"#).unwrap();
        assert_eq!(map.len(), 2);
        assert!(map.get(&"b".to_string()).is_none());
    }

    #[test]
    fn null_after_value_keeps_earlier_value() {
        let map: RepeatedKeyMap<String, u32> = decode_map(r#"{"a":1,"a":null}"#).unwrap();
        assert_eq!(map.get(&"a".to_string()), Some(&1));
    }

    #[test]
    fn from_pairs_matches_decode_semantics() {
        let folded = RepeatedKeyMap::from_pairs([
            ("x".to_string(), Some(1)),
            ("y".to_string(), None),
            ("x".to_string(), Some(2)),
        ]);
        let decoded: RepeatedKeyMap<String, i32> =
            decode_map(r#"{"x":1,"y":null,"x":2}"#).unwrap();
        assert_eq!(folded, decoded);
    }

    #[test]
    fn encode_then_decode_reproduces_unique_map() {
        let map: RepeatedKeyMap<String, Vec<String>> = [
            ("apache2".to_string(), vec!["0.1.8".to_string()]),
            ("mysql".to_string(), vec!["1.0.0".to_string(), "1.1.0".to_string()]),
        ]
        .into_iter()
        .collect();

        let text = encode_map(&map).unwrap();
        let back: RepeatedKeyMap<String, Vec<String>> = decode_map(&text).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn nested_maps_collapse_too() {
        let outer: RepeatedKeyMap<String, RepeatedKeyMap<String, u8>> =
            decode_map(r#"{"o":{"k":1,"k":2}}"#).unwrap();
        let inner = outer.get(&"o".to_string()).unwrap();
        assert_eq!(inner.get(&"k".to_string()), Some(&2));
    }

    #[test]
    fn malformed_json_is_reported_with_text() {
        let err = decode_map::<String, String>(r#"{"a":"b""#).unwrap_err();
        match err {
            CodecError::MalformedDocument { document, .. } => assert_eq!(document, r#"{"a":"b""#),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn non_object_is_rejected() {
        let err = decode_map::<String, String>(r#"["a","b"]"#).unwrap_err();
        assert_eq!(err.kind(), "malformed_document");
    }
}
