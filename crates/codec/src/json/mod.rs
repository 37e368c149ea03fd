//! JSON document codecs layered on `serde_json`.

mod id_member;
mod identified_item;
mod repeated_key_map;

pub use identified_item::{decode_item, encode_item, item_document};
pub use repeated_key_map::{decode_map, encode_map, RepeatedKeyMap};
