//! Entity identifiers and the identifier codec
//!
//! An [`EntityId`] is a type tag plus a canonical serialization such as `Q42`.
//! Most ids carry a numeric part; the index only stores ids whose numeric part
//! fits a positive `i32`, exposed through the [`Int32EntityId`] view.
//!
//! Format handled by [`PrefixedIdCodec`]: `{prefix}{numeric_id}`
//! Example: `Q42` (item), `P31` (property)

use serde::{Serialize, Serializer};
use std::fmt;

/// Type tag for items
pub const ITEM: &str = "item";

/// Type tag for properties
pub const PROPERTY: &str = "property";

/// A structured entity identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityId {
    entity_type: String,
    serialization: String,
    numeric_id: Option<u64>,
}

impl EntityId {
    /// Build a numeric id with a single-letter prefix, e.g. `('Q', 42)` -> `Q42`
    pub fn numeric(entity_type: impl Into<String>, prefix: char, numeric_id: u64) -> Self {
        Self {
            entity_type: entity_type.into(),
            serialization: format!("{prefix}{numeric_id}"),
            numeric_id: Some(numeric_id),
        }
    }

    /// Build an id with no numeric part (e.g. sub-entity or foreign ids)
    pub fn opaque(entity_type: impl Into<String>, serialization: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            serialization: serialization.into(),
            numeric_id: None,
        }
    }

    pub fn item(numeric_id: u64) -> Self {
        Self::numeric(ITEM, 'Q', numeric_id)
    }

    pub fn property(numeric_id: u64) -> Self {
        Self::numeric(PROPERTY, 'P', numeric_id)
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    /// Canonical string form, as stored in redirect targets
    pub fn serialization(&self) -> &str {
        &self.serialization
    }

    pub fn numeric_id(&self) -> Option<u64> {
        self.numeric_id
    }

    /// Narrow to the 32-bit capability view required by the index
    pub fn as_int32(&self) -> Result<Int32EntityId, IdError> {
        Int32EntityId::try_from(self)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.serialization)
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.serialization
    }
}

impl Serialize for EntityId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.serialization)
    }
}

/// An entity id whose numeric part fits `1..=i32::MAX`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Int32EntityId {
    entity_type: String,
    numeric_id: i32,
}

impl Int32EntityId {
    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn numeric_id(&self) -> i32 {
        self.numeric_id
    }
}

impl TryFrom<&EntityId> for Int32EntityId {
    type Error = IdError;

    fn try_from(id: &EntityId) -> Result<Self, Self::Error> {
        let numeric_id = id
            .numeric_id
            .and_then(|n| i32::try_from(n).ok())
            .filter(|n| *n > 0)
            .ok_or_else(|| IdError::NotInt32(id.serialization.clone()))?;

        Ok(Self {
            entity_type: id.entity_type.clone(),
            numeric_id,
        })
    }
}

/// Errors that can occur when parsing or composing an entity id
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    #[error("malformed entity id: {0}")]
    Malformed(String),
    #[error("unsupported entity type: {0}")]
    UnsupportedType(String),
    #[error("entity id is not representable as a 32-bit numeric id: {0}")]
    NotInt32(String),
}

/// Parses serialized ids
pub trait EntityIdParser: Send + Sync {
    fn parse(&self, serialization: &str) -> Result<EntityId, IdError>;
}

/// Builds ids from a stored (type tag, numeric id) pair
pub trait EntityIdComposer: Send + Sync {
    fn compose(&self, entity_type: &str, numeric_id: i64) -> Result<EntityId, IdError>;
}

/// Codec mapping each type tag to a single-letter prefix
#[derive(Debug, Clone)]
pub struct PrefixedIdCodec {
    types: Vec<(String, char)>,
}

impl Default for PrefixedIdCodec {
    fn default() -> Self {
        Self {
            types: vec![(ITEM.to_string(), 'Q'), (PROPERTY.to_string(), 'P')],
        }
    }
}

impl PrefixedIdCodec {
    /// A codec that knows no types at all
    pub fn empty() -> Self {
        Self { types: Vec::new() }
    }

    /// Register (or re-register) a type tag with its prefix
    pub fn with_type(mut self, entity_type: impl Into<String>, prefix: char) -> Self {
        let entity_type = entity_type.into();
        let prefix = prefix.to_ascii_uppercase();
        self.types
            .retain(|(known, p)| *known != entity_type && *p != prefix);
        self.types.push((entity_type, prefix));
        self
    }

    pub fn supports(&self, entity_type: &str) -> bool {
        self.prefix_for(entity_type).is_some()
    }

    pub fn prefix_for(&self, entity_type: &str) -> Option<char> {
        self.types
            .iter()
            .find(|(known, _)| known == entity_type)
            .map(|(_, prefix)| *prefix)
    }

    fn type_for(&self, prefix: char) -> Option<&str> {
        self.types
            .iter()
            .find(|(_, p)| *p == prefix)
            .map(|(known, _)| known.as_str())
    }
}

impl EntityIdParser for PrefixedIdCodec {
    fn parse(&self, serialization: &str) -> Result<EntityId, IdError> {
        let mut chars = serialization.chars();
        let prefix = chars
            .next()
            .map(|c| c.to_ascii_uppercase())
            .ok_or_else(|| IdError::Malformed(serialization.to_string()))?;
        let digits = chars.as_str();

        // No sign, no leading zero, at least one digit
        if digits.is_empty()
            || digits.starts_with('0')
            || !digits.chars().all(|c| c.is_ascii_digit())
        {
            return Err(IdError::Malformed(serialization.to_string()));
        }

        let entity_type = self
            .type_for(prefix)
            .ok_or_else(|| IdError::UnsupportedType(prefix.to_string()))?;
        let numeric_id: u64 = digits
            .parse()
            .map_err(|_| IdError::Malformed(serialization.to_string()))?;

        Ok(EntityId::numeric(entity_type, prefix, numeric_id))
    }
}

impl EntityIdComposer for PrefixedIdCodec {
    fn compose(&self, entity_type: &str, numeric_id: i64) -> Result<EntityId, IdError> {
        let prefix = self
            .prefix_for(entity_type)
            .ok_or_else(|| IdError::UnsupportedType(entity_type.to_string()))?;
        let numeric_id = u64::try_from(numeric_id)
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| IdError::Malformed(format!("{entity_type}:{numeric_id}")))?;

        Ok(EntityId::numeric(entity_type, prefix, numeric_id))
    }
}
