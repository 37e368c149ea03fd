//! Lightweight inspection of JSON object text.
//!
//! `serde_json` validates the document and reads the identifier; the member
//! scan below only runs on text that already parsed, and reports byte ranges
//! so callers can cut or splice members without re-serialising the rest.

use chef_wire_domain::model::ITEM_ID_KEY;
use serde::{de::IgnoredAny, Deserialize};

use crate::error::{CodecError, CodecResult};

// Validates the document and rejects a repeated top-level `id`.
#[derive(Deserialize)]
struct IdShape {
    #[serde(rename = "id", default)]
    _id: Option<IgnoredAny>,
}

/// What a document carries under its top-level `id` key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum IdMember {
    Absent,
    /// A JSON string, with the member's index in the layout.
    Text { index: usize, id: String },
    /// Any other JSON value, `null` included, as raw text.
    Other { raw: String },
}

/// Validates `text` as a JSON object and locates its top-level `id` member.
pub(crate) fn locate_id(text: &str) -> CodecResult<(ObjectLayout, IdMember)> {
    if !text.trim_start().starts_with('{') {
        return Err(CodecError::malformed("expected a json object", text));
    }
    serde_json::from_str::<IdShape>(text).map_err(|err| CodecError::malformed(err, text))?;
    let layout =
        ObjectLayout::scan(text).ok_or_else(|| CodecError::malformed("unbalanced object", text))?;

    let member = match layout.position(text, ITEM_ID_KEY) {
        None => IdMember::Absent,
        Some(index) => {
            let raw = layout.members[index].value(text);
            match serde_json::from_str::<String>(raw) {
                Ok(id) => IdMember::Text { index, id },
                Err(_) => IdMember::Other {
                    raw: raw.to_string(),
                },
            }
        }
    };
    Ok((layout, member))
}

/// Byte range of one top-level `"key": value` member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MemberSpan {
    /// Offset of the opening quote of the key.
    pub start: usize,
    /// Offset of the closing quote of the key, plus one.
    pub key_end: usize,
    /// Offset just past the last byte of the value.
    pub end: usize,
}

impl MemberSpan {
    pub fn key(&self, text: &str) -> Option<String> {
        serde_json::from_str(&text[self.start..self.key_end]).ok()
    }

    pub fn value<'a>(&self, text: &'a str) -> &'a str {
        let after_key = &text[self.key_end..self.end];
        after_key
            .trim_start()
            .strip_prefix(':')
            .unwrap_or(after_key)
            .trim()
    }
}

/// Layout of a validated JSON object: where its opening brace sits and the
/// spans of its top-level members in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ObjectLayout {
    pub open_brace: usize,
    pub members: Vec<MemberSpan>,
}

impl ObjectLayout {
    pub fn scan(text: &str) -> Option<Self> {
        let bytes = text.as_bytes();
        let mut open_brace = None;
        let mut members = Vec::new();
        let mut depth = 0usize;
        let mut in_string = false;
        let mut escaped = false;
        let mut expect_key = false;
        let mut reading_key = false;
        let mut current: Option<(usize, usize)> = None;

        for (idx, &byte) in bytes.iter().enumerate() {
            if in_string {
                if escaped {
                    escaped = false;
                } else if byte == b'\\' {
                    escaped = true;
                } else if byte == b'"' {
                    in_string = false;
                    if reading_key {
                        reading_key = false;
                        if let Some((start, _)) = current {
                            current = Some((start, idx + 1));
                        }
                    }
                }
                continue;
            }

            match byte {
                b'"' => {
                    in_string = true;
                    if depth == 1 && expect_key {
                        expect_key = false;
                        reading_key = true;
                        current = Some((idx, idx));
                    }
                }
                b'{' | b'[' => {
                    if depth == 0 {
                        if byte != b'{' {
                            return None;
                        }
                        open_brace = Some(idx);
                        expect_key = true;
                    }
                    depth += 1;
                }
                b'}' | b']' => {
                    if depth == 1 {
                        close_member(text, idx, &mut current, &mut members);
                    }
                    depth = depth.checked_sub(1)?;
                    if depth == 0 {
                        return open_brace.map(|open_brace| Self {
                            open_brace,
                            members,
                        });
                    }
                }
                b',' if depth == 1 => {
                    close_member(text, idx, &mut current, &mut members);
                    expect_key = true;
                }
                _ => {}
            }
        }

        None
    }

    /// Index into `members` of the first member whose decoded key is `key`.
    pub fn position(&self, text: &str, key: &str) -> Option<usize> {
        self.members
            .iter()
            .position(|member| member.key(text).as_deref() == Some(key))
    }

    /// Byte range to delete so that member `index` disappears together with
    /// exactly one separating comma.
    pub fn removal_range(&self, index: usize) -> (usize, usize) {
        let member = self.members[index];
        if let Some(next) = self.members.get(index + 1) {
            (member.start, next.start)
        } else if index > 0 {
            (self.members[index - 1].end, member.end)
        } else {
            (member.start, member.end)
        }
    }
}

fn close_member(
    text: &str,
    delimiter: usize,
    current: &mut Option<(usize, usize)>,
    members: &mut Vec<MemberSpan>,
) {
    if let Some((start, key_end)) = current.take() {
        let end = text[..delimiter].trim_end().len();
        members.push(MemberSpan {
            start,
            key_end,
            end,
        });
    }
}
