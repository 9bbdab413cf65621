//! Typed entity ↔ searchable text + payload.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::{KnowledgeError, Result};
use crate::keyword::SEARCH_TEXT_KEY;
use crate::record::Payload;

/// Payload flag recording whether the stored vector is a real embedding.
pub const HAS_EMBEDDING_KEY: &str = "hasEmbedding";

/// An entity kept in an [`crate::EntityStore`].
///
/// The document id is the identity: `to_payload` omits nothing, and
/// `from_payload` re-inserts `id` from the document id before decoding.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Short name used in logs (`capability`, `pattern`, ...).
    const KIND: &'static str;

    fn extract_id(&self) -> &str;

    /// Text that is embedded and keyword-scanned.
    fn to_search_text(&self) -> String;

    /// Structured fields stored next to the vector.
    fn to_payload(&self) -> Result<Payload> {
        match serde_json::to_value(self)? {
            Value::Object(m) => Ok(m),
            other => Err(KnowledgeError::InvalidPayload {
                id: self.extract_id().to_string(),
                reason: format!("entity serialized to non-object: {other}"),
            }),
        }
    }

    fn from_payload(id: &str, payload: &Payload) -> Result<Self> {
        let mut m = payload.clone();
        m.remove(SEARCH_TEXT_KEY);
        m.remove(HAS_EMBEDDING_KEY);
        m.insert("id".into(), Value::String(id.to_string()));
        serde_json::from_value(Value::Object(m)).map_err(|e| KnowledgeError::InvalidPayload {
            id: id.to_string(),
            reason: e.to_string(),
        })
    }
}
