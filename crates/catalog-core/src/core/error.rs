// crates/catalog-core/src/core/error.rs
// ============================================================================
// Module: Catalog Errors
// Description: Error taxonomy reported by every catalog operation.
// Purpose: Give callers one stable failure kind per rejected operation.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Every core operation fails with exactly one [`CatalogError`] kind. The
//! transport maps kinds to status classes; the core never retries.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Failure kinds for catalog operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// Target record (by id or by filter) does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// Identifier collision on create or on an id change.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Update requested with an entirely empty patch.
    #[error("no fields provided for update")]
    NoFieldsProvided,
    /// Create path is missing mandatory fields.
    #[error("incomplete record for create; missing fields: {}", missing.join(", "))]
    IncompleteForCreate {
        /// Names of the absent mandatory fields.
        missing: Vec<&'static str>,
    },
    /// Field violates its declared constraint.
    #[error("validation error: {0}")]
    Validation(String),
    /// Upstream call failed or returned malformed data.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),
    /// Storage backend failed or returned corrupt data.
    #[error("store error: {0}")]
    Store(String),
}

impl CatalogError {
    /// Returns a stable label for the error kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::NoFieldsProvided => "no_fields_provided",
            Self::IncompleteForCreate {
                ..
            } => "incomplete_for_create",
            Self::Validation(_) => "validation_error",
            Self::UpstreamUnavailable(_) => "upstream_unavailable",
            Self::Store(_) => "store_error",
        }
    }
}
