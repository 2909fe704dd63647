//! Traits shared by every stored entity, and the record envelope.
//!
//! An entity type holds only its domain fields. The store assigns the ID and
//! the resource layer stamps `created_at`/`updated_at`; [`Record`] carries all
//! of them together.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{DocumentId, Timestamp};

/// Document field holding the creation timestamp.
pub const CREATED_AT: &str = "created_at";
/// Document field holding the last-update timestamp.
pub const UPDATED_AT: &str = "updated_at";

/// Sort direction for a collection listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Field ordering applied by the store when listing a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SortOrder {
    pub field: &'static str,
    pub direction: Direction,
}

impl SortOrder {
    #[must_use]
    pub const fn ascending(field: &'static str) -> Self {
        Self {
            field,
            direction: Direction::Ascending,
        }
    }

    #[must_use]
    pub const fn descending(field: &'static str) -> Self {
        Self {
            field,
            direction: Direction::Descending,
        }
    }
}

/// A typed partial update.
///
/// Implementors list every mutable field as an `Option` that is skipped when
/// `None`, and reject unknown fields when deserialized.
pub trait Patch:
    Serialize + DeserializeOwned + Clone + Default + fmt::Debug + Send + Sync + 'static
{
}

/// A flat record stored in one document collection.
pub trait Entity:
    Serialize + DeserializeOwned + Clone + fmt::Debug + Send + Sync + 'static
{
    /// Collection the entity lives in.
    const COLLECTION: &'static str;

    /// Order used by a full fetch.
    const NATURAL_ORDER: SortOrder = SortOrder::descending(CREATED_AT);

    /// Fields that may be changed after creation.
    type Patch: Patch;
}

/// An entity that supports search-as-you-type on one text field.
pub trait Searchable: Entity {
    /// Field matched by prefix; results are ordered by it ascending.
    const SEARCH_FIELD: &'static str;
}

/// A configuration entity of which at most one document should exist.
pub trait Singleton: Entity {
    /// Well-known ID of the single document.
    const DOCUMENT_ID: &'static str;

    /// Document seeded when the collection is empty.
    fn defaults() -> Self;
}

/// A stored entity together with its ID and write timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<E> {
    pub id: DocumentId,
    #[serde(flatten)]
    pub data: E,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl<E: Entity> Record<E> {
    /// Decode a record from a stored document body.
    ///
    /// # Errors
    ///
    /// Returns an error if the body does not match the entity's shape.
    pub fn decode(
        id: DocumentId,
        mut fields: Map<String, Value>,
    ) -> Result<Self, serde_json::Error> {
        fields.insert("id".to_owned(), Value::String(id.into_inner()));
        serde_json::from_value(Value::Object(fields))
    }
}

/// Encode a new entity as a document body stamped with both timestamps.
///
/// # Errors
///
/// Returns an error if the entity does not serialize to a JSON object.
pub fn encode_new<E: Entity>(
    data: &E,
    at: Timestamp,
) -> Result<Map<String, Value>, serde_json::Error> {
    let mut fields = to_object(data)?;
    fields.insert(CREATED_AT.to_owned(), serde_json::to_value(at)?);
    fields.insert(UPDATED_AT.to_owned(), serde_json::to_value(at)?);
    Ok(fields)
}

/// Encode a patch as the partial document body to merge, with a refreshed
/// `updated_at`.
///
/// # Errors
///
/// Returns an error if the patch does not serialize to a JSON object.
pub fn encode_patch<P: Patch>(
    patch: &P,
    at: Timestamp,
) -> Result<Map<String, Value>, serde_json::Error> {
    let mut fields = to_object(patch)?;
    fields.remove(CREATED_AT);
    fields.insert(UPDATED_AT.to_owned(), serde_json::to_value(at)?);
    Ok(fields)
}

fn to_object<T: Serialize>(value: &T) -> Result<Map<String, Value>, serde_json::Error> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(<serde_json::Error as serde::ser::Error>::custom(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::{Customer, CustomerPatch};
    use crate::types::PhoneNumber;

    fn customer() -> Customer {
        Customer {
            name: "Kim".to_owned(),
            phone: PhoneNumber::parse("010-1111-2222").unwrap(),
            email: None,
            address: Some("Mapo-gu".to_owned()),
            memo: None,
        }
    }

    #[test]
    fn test_encode_new_stamps_both_timestamps() {
        let at = Timestamp::from_millis(1_000);
        let fields = encode_new(&customer(), at).unwrap();
        assert_eq!(fields.get(CREATED_AT), Some(&Value::from(1_000)));
        assert_eq!(fields.get(UPDATED_AT), Some(&Value::from(1_000)));
        assert_eq!(fields.get("name"), Some(&Value::from("Kim")));
    }

    #[test]
    fn test_encode_patch_only_carries_supplied_fields() {
        let patch = CustomerPatch {
            memo: Some("prefers roses".to_owned()),
            ..CustomerPatch::default()
        };
        let fields = encode_patch(&patch, Timestamp::from_millis(2_000)).unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields.get("memo"), Some(&Value::from("prefers roses")));
        assert_eq!(fields.get(UPDATED_AT), Some(&Value::from(2_000)));
    }

    #[test]
    fn test_record_decode_roundtrip() {
        let at = Timestamp::from_millis(5_000);
        let fields = encode_new(&customer(), at).unwrap();
        let record: Record<Customer> = Record::decode(DocumentId::new("c1"), fields).unwrap();
        assert_eq!(record.id.as_str(), "c1");
        assert_eq!(record.data, customer());
        assert_eq!(record.created_at, at);
        assert_eq!(record.updated_at, at);
    }

    #[test]
    fn test_record_decode_rejects_wrong_shape() {
        let mut fields = Map::new();
        fields.insert("name".to_owned(), Value::from(42));
        assert!(Record::<Customer>::decode(DocumentId::new("bad"), fields).is_err());
    }
}
