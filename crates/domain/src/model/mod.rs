//! Value types exchanged between the codec layer and its callers.

mod bootstrap;

use thiserror::Error;

pub use bootstrap::{BootstrapConfig, BootstrapConfigBuilder, BootstrapConfigError};

/// Canonical name of the identifier member embedded in data bag items.
pub const ITEM_ID_KEY: &str = "id";

/// Errors emitted when an identified item is constructed from invalid parts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ItemIdError {
    #[error("item identifier must not be empty")]
    Empty,
}

/// A JSON document whose identifier is stored separately from the rest of
/// its members.
///
/// `payload` is raw JSON object text that no longer carries the identifier;
/// codecs re-insert it when the item goes back on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentifiedItem {
    id: String,
    payload: String,
}

impl IdentifiedItem {
    pub fn new(id: impl Into<String>, payload: impl Into<String>) -> Result<Self, ItemIdError> {
        let id = id.into();
        if id.is_empty() {
            return Err(ItemIdError::Empty);
        }
        Ok(Self {
            id,
            payload: payload.into(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn into_parts(self) -> (String, String) {
        (self.id, self.payload)
    }
}
