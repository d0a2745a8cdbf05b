// crates/catalog-core/src/runtime/allocator.rs
// ============================================================================
// Module: Identity Allocator
// Description: Smallest-free identifier computation.
// Purpose: Allocate record identifiers that reuse gaps left by deletes.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Identifiers are allocated as the smallest non-negative value not already
//! in use, so ids freed by deletes are handed out again before the maximum
//! grows.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use crate::core::RecordId;

// ============================================================================
// SECTION: Allocation
// ============================================================================

/// Returns the smallest non-negative identifier not present in `existing`.
///
/// Walks the ids in ascending order; the first id that skips past its
/// predecessor exposes a gap. With no gap the result is `max + 1`, and an
/// empty set yields `0`.
#[must_use]
pub fn next_id(existing: &BTreeSet<RecordId>) -> RecordId {
    let mut candidate = 0_u64;
    for id in existing {
        if id.get() != candidate {
            break;
        }
        candidate = candidate.saturating_add(1);
    }
    RecordId::new(candidate)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
