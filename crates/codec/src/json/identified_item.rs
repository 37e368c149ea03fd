//! Data bag items: the identifier travels inside the JSON body but callers
//! see it as a separate field.

use chef_wire_domain::model::{IdentifiedItem, ITEM_ID_KEY};

use super::id_member::{locate_id, IdMember};
use crate::error::{record_failure, CodecError, CodecResult};

const MISSING_ID: &str =
    r#"data bag item must be a json object with an "id" member, e.g. {"id":"item1","my_key":"my_data"}"#;
const NOT_A_STRING: &str = "data bag item identifier must be a json string";

/// Splits the `id` member out of `text`, keeping every other byte as the
/// item payload.
pub fn decode_item(text: &str) -> CodecResult<IdentifiedItem> {
    split_identifier(text).inspect_err(record_failure)
}

/// Puts the identifier back as the first member of the payload.
///
/// A payload that already carries an identifier is returned untouched when
/// it matches the item, and rejected when it does not.
pub fn encode_item(item: &IdentifiedItem) -> CodecResult<String> {
    inject_identifier(item).inspect_err(record_failure)
}

fn split_identifier(text: &str) -> CodecResult<IdentifiedItem> {
    let (layout, member) = locate_id(text)?;
    let (index, id) = match member {
        IdMember::Text { index, id } => (index, id),
        IdMember::Other { raw } => return Err(not_a_string(&raw, text)),
        IdMember::Absent => return Err(CodecError::malformed(MISSING_ID, text)),
    };

    let (from, to) = layout.removal_range(index);
    let payload = format!("{}{}", &text[..from], &text[to..]);
    IdentifiedItem::new(id, payload).map_err(|err| CodecError::malformed(err, text))
}

fn inject_identifier(item: &IdentifiedItem) -> CodecResult<String> {
    let payload = item.payload();
    let (layout, member) = locate_id(payload)?;
    match member {
        IdMember::Text { id, .. } if id == item.id() => Ok(payload.to_string()),
        IdMember::Text { id, .. } => Err(CodecError::ConsistencyViolation {
            stored: item.id().to_string(),
            embedded: id,
        }),
        IdMember::Other { raw } => Err(not_a_string(&raw, payload)),
        IdMember::Absent => {
            let id = serde_json::to_string(item.id())
                .map_err(|err| CodecError::malformed(err, item.id()))?;
            let separator = if layout.members.is_empty() { "" } else { "," };
            let insert_at = layout.open_brace + 1;

            Ok(format!(
                "{}\"{ITEM_ID_KEY}\":{id}{separator}{}",
                &payload[..insert_at],
                &payload[insert_at..]
            ))
        }
    }
}

fn not_a_string(raw: &str, document: &str) -> CodecError {
    CodecError::malformed(format!("{NOT_A_STRING}, found `{raw}`"), document)
}

/// `#[serde(with = "item_document")]` adapter so an [`IdentifiedItem`] field
/// reads and writes the full JSON document rather than its parts.
pub mod item_document {
    use chef_wire_domain::model::IdentifiedItem;
    use serde::{de::Error as _, ser::Error as _, Deserialize, Deserializer, Serialize, Serializer};
    use serde_json::value::RawValue;

    pub fn serialize<S: Serializer>(item: &IdentifiedItem, serializer: S) -> Result<S::Ok, S::Error> {
        let text = super::encode_item(item).map_err(S::Error::custom)?;
        let raw = RawValue::from_string(text).map_err(S::Error::custom)?;
        raw.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<IdentifiedItem, D::Error> {
        let raw = Box::<RawValue>::deserialize(deserializer)?;
        super::decode_item(raw.get()).map_err(D::Error::custom)
    }
}
