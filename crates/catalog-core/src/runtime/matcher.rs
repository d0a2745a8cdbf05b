// crates/catalog-core/src/runtime/matcher.rs
// ============================================================================
// Module: Query Matcher
// Description: Conjunctive sparse-filter matching over record stores.
// Purpose: Serve selection, existence, and duplicate checks from one rule.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! A filter matches a record when every present field equals the record's
//! value. Absent fields never constrain, so an empty filter matches all.
//!
//! Existence checks treat a present identifier as authoritative: when the
//! filter names an id, only that id is consulted and attribute fields are
//! ignored.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::Record;
use crate::core::RecordId;
use crate::core::RecordPatch;
use crate::interfaces::RecordStore;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Matching
// ============================================================================

/// Returns true when `record` satisfies every present field of `filter`.
#[must_use]
pub fn matches<R: Record>(record: &R, filter: &R::Patch) -> bool {
    filter.matches(record)
}

/// Returns every record matching `filter`, in store iteration order.
///
/// # Errors
///
/// Returns [`StoreError`] when the store cannot be read.
pub fn select<R, S>(store: &S, filter: &R::Patch) -> Result<Vec<R>, StoreError>
where
    R: Record,
    S: RecordStore<R> + ?Sized,
{
    Ok(store.get_all()?.into_iter().filter(|record| filter.matches(record)).collect())
}

/// Resolves the single record a filter refers to.
///
/// A present `filter.id` is checked directly against the store. Otherwise the
/// lowest id whose attributes match is returned.
///
/// # Errors
///
/// Returns [`StoreError`] when the store cannot be read.
pub fn find_existing<R, S>(store: &S, filter: &R::Patch) -> Result<Option<RecordId>, StoreError>
where
    R: Record,
    S: RecordStore<R> + ?Sized,
{
    if let Some(id) = filter.id() {
        return Ok(store.contains(id)?.then_some(id));
    }
    Ok(store
        .get_all()?
        .iter()
        .filter(|record| filter.matches(*record))
        .map(Record::id)
        .min())
}

/// Finds another record whose non-id fields all equal `candidate`'s.
///
/// The record stored under `except` is skipped so an update never collides
/// with itself.
///
/// # Errors
///
/// Returns [`StoreError`] when the store cannot be read.
pub fn find_duplicate<R, S>(
    store: &S,
    candidate: &R,
    except: Option<RecordId>,
) -> Result<Option<RecordId>, StoreError>
where
    R: Record,
    S: RecordStore<R> + ?Sized,
{
    Ok(store
        .get_all()?
        .iter()
        .filter(|record| Some(record.id()) != except)
        .filter(|record| record.same_attributes(candidate))
        .map(Record::id)
        .min())
}
