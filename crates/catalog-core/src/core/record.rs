// crates/catalog-core/src/core/record.rs
// ============================================================================
// Module: Record Schema
// Description: Generic record and patch contracts shared by all record types.
// Purpose: Let one matcher and one merge engine serve every record shape.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`Record`] is a persisted entity with a unique [`RecordId`] and a fixed
//! set of mandatory fields. Each record type pairs with a [`RecordPatch`]: a
//! sparse mirror of the record where every field is optional. The same patch
//! type acts as a filter (absent = unconstrained) and as an update (absent =
//! unchanged).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::core::error::CatalogError;

// ============================================================================
// SECTION: Identifiers
// ============================================================================

/// Non-negative record identifier, unique within a record store.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RecordId(u64);

impl RecordId {
    /// Creates a record identifier from its raw value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw identifier value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for RecordId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

// ============================================================================
// SECTION: Record Contract
// ============================================================================

/// Schema description for a catalog record type.
pub trait Record:
    fmt::Debug + Clone + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Sparse patch type used to filter and update this record.
    type Patch: RecordPatch<Self>;

    /// Resource name, used for storage keys and error messages.
    const RESOURCE: &'static str;

    /// Mandatory non-id fields, in declaration order.
    const FIELDS: &'static [&'static str];

    /// Returns the record identifier.
    fn id(&self) -> RecordId;

    /// Replaces the record identifier.
    fn set_id(&mut self, id: RecordId);

    /// Returns true when every non-id field equals the other record's.
    fn same_attributes(&self, other: &Self) -> bool;

    /// Validates field constraints for a fully populated record.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Validation`] when a field violates its bound.
    fn validate(&self) -> Result<(), CatalogError>;
}

/// Sparse, all-optional mirror of a [`Record`].
pub trait RecordPatch<R: Record>: fmt::Debug + Clone + Default + Send + Sync {
    /// Returns the identifier constraint or update, when present.
    fn id(&self) -> Option<RecordId>;

    /// Returns the names of the present non-id fields.
    fn present_fields(&self) -> Vec<&'static str>;

    /// Returns true when every present field equals the record's value.
    ///
    /// The identifier participates like any other field.
    fn matches(&self, record: &R) -> bool;

    /// Overwrites the record's fields with every present non-id field.
    fn apply(&self, record: &mut R);

    /// Builds a complete record under `id` from this patch.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::IncompleteForCreate`] when a mandatory field
    /// is absent.
    fn build(&self, id: RecordId) -> Result<R, CatalogError>;

    /// Validates every present field against its declared bound.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Validation`] when a present field is invalid.
    fn validate(&self) -> Result<(), CatalogError>;

    /// Returns true when no field, including the identifier, is present.
    fn is_empty(&self) -> bool {
        self.id().is_none() && self.present_fields().is_empty()
    }

    /// Returns the mandatory fields that are absent from this patch.
    fn missing_fields(&self) -> Vec<&'static str> {
        let present = self.present_fields();
        R::FIELDS.iter().copied().filter(|field| !present.contains(field)).collect()
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Compares one optional filter field against a record value.
///
/// An absent filter value matches anything.
#[must_use]
pub fn field_matches<T: PartialEq + ?Sized>(filter: Option<&T>, value: &T) -> bool {
    filter.is_none_or(|expected| expected == value)
}

/// Collects the names of present fields from `(name, is_present)` pairs.
pub(crate) fn present<const N: usize>(fields: [(&'static str, bool); N]) -> Vec<&'static str> {
    fields.into_iter().filter_map(|(name, is_present)| is_present.then_some(name)).collect()
}

/// Unwraps a mandatory patch field or records it as missing.
pub(crate) fn required<T: Clone>(
    value: Option<&T>,
    name: &'static str,
    missing: &mut Vec<&'static str>,
) -> Option<T> {
    if value.is_none() {
        missing.push(name);
    }
    value.cloned()
}
