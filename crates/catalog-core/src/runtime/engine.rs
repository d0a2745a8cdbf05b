// crates/catalog-core/src/runtime/engine.rs
// ============================================================================
// Module: Catalog Merge Engine
// Description: Create, update, upsert, and delete flows over a record store.
// Purpose: Apply sparse patches to records with uniform identity rules.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! [`Catalog`] is the single execution path for record mutations. It resolves
//! the target record by id or by filter, merges the sparse patch, and either
//! updates, creates, or rejects. Every check runs before the store is
//! touched, so a rejected call leaves the store unchanged.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::marker::PhantomData;

use crate::core::CatalogError;
use crate::core::Record;
use crate::core::RecordId;
use crate::core::RecordPatch;
use crate::interfaces::RecordStore;
use crate::interfaces::StoreError;
use crate::runtime::allocator::next_id;
use crate::runtime::matcher;

// ============================================================================
// SECTION: Outcomes
// ============================================================================

/// Result of an update-or-create call.
#[derive(Debug, Clone, PartialEq)]
pub enum UpsertOutcome<R> {
    /// An existing record was updated.
    Updated(R),
    /// A new record was created.
    Created(R),
}

impl<R> UpsertOutcome<R> {
    /// Returns the resulting record.
    #[must_use]
    pub const fn record(&self) -> &R {
        match self {
            Self::Updated(record) | Self::Created(record) => record,
        }
    }

    /// Consumes the outcome and returns the resulting record.
    #[must_use]
    pub fn into_record(self) -> R {
        match self {
            Self::Updated(record) | Self::Created(record) => record,
        }
    }

    /// Returns the response label for the outcome.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Updated(_) => "updated",
            Self::Created(_) => "added",
        }
    }
}

// ============================================================================
// SECTION: Engine
// ============================================================================

/// Record engine over a store `S` holding records of type `R`.
#[derive(Debug, Clone)]
pub struct Catalog<R: Record, S> {
    /// Authoritative record store.
    store: S,
    /// Record type marker.
    _record: PhantomData<fn() -> R>,
}

impl<R: Record, S: RecordStore<R>> Catalog<R, S> {
    /// Creates an engine over `store`.
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self {
            store,
            _record: PhantomData,
        }
    }

    /// Returns the underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    // ------------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------------

    /// Returns the record stored under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] when the id is absent.
    pub fn get(&self, id: RecordId) -> Result<R, CatalogError> {
        self.store.get(id).map_err(store_error::<R>)?.ok_or_else(|| not_found::<R>(id))
    }

    /// Returns every record in store order.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Store`] when the store cannot be read.
    pub fn list(&self) -> Result<Vec<R>, CatalogError> {
        self.store.get_all().map_err(store_error::<R>)
    }

    /// Returns every record matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Validation`] when a filter value breaks a field
    /// constraint and [`CatalogError::Store`] when the store cannot be read.
    pub fn select(&self, filter: &R::Patch) -> Result<Vec<R>, CatalogError> {
        filter.validate()?;
        matcher::select::<R, S>(&self.store, filter).map_err(store_error::<R>)
    }

    // ------------------------------------------------------------------------
    // Creates
    // ------------------------------------------------------------------------

    /// Inserts a complete record under its own id.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Validation`] for invalid fields and
    /// [`CatalogError::Conflict`] when the id is taken.
    pub fn insert(&self, record: R) -> Result<R, CatalogError> {
        record.validate()?;
        self.store.insert(record.clone()).map_err(store_error::<R>)?;
        Ok(record)
    }

    /// Creates a record from a complete patch, rejecting attribute duplicates.
    ///
    /// Uses `patch.id` when present, otherwise allocates the smallest free id.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Conflict`] when the id is taken or an identical
    /// record exists, and [`CatalogError::IncompleteForCreate`] when mandatory
    /// fields are absent.
    pub fn create_unique(&self, patch: &R::Patch) -> Result<R, CatalogError> {
        if let Some(id) = patch.id()
            && self.store.contains(id).map_err(store_error::<R>)?
        {
            return Err(conflict::<R>(id));
        }
        patch.validate()?;
        let missing = patch.missing_fields();
        if !missing.is_empty() {
            return Err(CatalogError::IncompleteForCreate {
                missing,
            });
        }
        let id = match patch.id() {
            Some(id) => id,
            None => next_id(&self.store.ids().map_err(store_error::<R>)?),
        };
        let record = patch.build(id)?;
        record.validate()?;
        if let Some(existing) =
            matcher::find_duplicate(&self.store, &record, None).map_err(store_error::<R>)?
        {
            return Err(duplicate::<R>(existing));
        }
        self.store.insert(record.clone()).map_err(store_error::<R>)?;
        Ok(record)
    }

    // ------------------------------------------------------------------------
    // Updates
    // ------------------------------------------------------------------------

    /// Updates the record stored under `id` with the present patch fields.
    ///
    /// A `patch.id` different from `id` moves the record to the new id.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] when `id` is absent,
    /// [`CatalogError::NoFieldsProvided`] for an empty patch, and
    /// [`CatalogError::Conflict`] when the new id is taken.
    pub fn update(&self, id: RecordId, patch: &R::Patch) -> Result<R, CatalogError> {
        let current = self.get(id)?;
        if patch.is_empty() {
            return Err(CatalogError::NoFieldsProvided);
        }
        patch.validate()?;
        self.apply_update(current, patch, false)
    }

    /// Updates the record under `id`, or creates it from a complete patch.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NoFieldsProvided`] for an empty patch,
    /// [`CatalogError::IncompleteForCreate`] when creating from a partial
    /// patch, and [`CatalogError::Conflict`] when an id change collides.
    pub fn upsert(&self, id: RecordId, patch: &R::Patch) -> Result<UpsertOutcome<R>, CatalogError> {
        if patch.is_empty() {
            return Err(CatalogError::NoFieldsProvided);
        }
        patch.validate()?;
        if let Some(current) = self.store.get(id).map_err(store_error::<R>)? {
            return self.apply_update(current, patch, false).map(UpsertOutcome::Updated);
        }
        if let Some(requested) = patch.id()
            && requested != id
        {
            return Err(CatalogError::Validation(format!(
                "cannot create {} {id} under a different id {requested}",
                R::RESOURCE
            )));
        }
        let record = patch.build(id)?;
        record.validate()?;
        self.store.insert(record.clone()).map_err(store_error::<R>)?;
        Ok(UpsertOutcome::Created(record))
    }

    /// Updates the record matched by `old`, or creates one when `old` is empty.
    ///
    /// The merged record may not duplicate another record's attributes.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NoFieldsProvided`] for an empty `new`,
    /// [`CatalogError::Validation`] when either patch holds an invalid value,
    /// [`CatalogError::NotFound`] when `old` matches nothing, and
    /// [`CatalogError::Conflict`] on id or attribute collisions.
    pub fn upsert_matching(
        &self,
        old: &R::Patch,
        new: &R::Patch,
    ) -> Result<UpsertOutcome<R>, CatalogError> {
        if new.is_empty() {
            return Err(CatalogError::NoFieldsProvided);
        }
        new.validate()?;
        if old.is_empty() {
            return self.create_unique(new).map(UpsertOutcome::Created);
        }
        self.update_target(old, new).map(UpsertOutcome::Updated)
    }

    /// Updates the record matched by `old`; never creates.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NoFieldsProvided`] for an empty `new`,
    /// [`CatalogError::Validation`] when either patch holds an invalid value,
    /// [`CatalogError::NotFound`] when `old` is empty or matches nothing, and
    /// [`CatalogError::Conflict`] on id or attribute collisions.
    pub fn update_matching(&self, old: &R::Patch, new: &R::Patch) -> Result<R, CatalogError> {
        if new.is_empty() {
            return Err(CatalogError::NoFieldsProvided);
        }
        new.validate()?;
        if old.is_empty() {
            return Err(no_match::<R>());
        }
        self.update_target(old, new)
    }

    // ------------------------------------------------------------------------
    // Deletes
    // ------------------------------------------------------------------------

    /// Deletes and returns the record stored under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] when the id is absent.
    pub fn delete(&self, id: RecordId) -> Result<R, CatalogError> {
        self.store.remove(id).map_err(store_error::<R>)
    }

    /// Deletes the record named by `filter`.
    ///
    /// The filter must carry an id or every mandatory field.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Validation`] for an underspecified or invalid
    /// filter and [`CatalogError::NotFound`] when nothing matches.
    pub fn delete_matching(&self, filter: &R::Patch) -> Result<R, CatalogError> {
        filter.validate()?;
        if let Some(id) = filter.id() {
            return self.delete(id);
        }
        let missing = filter.missing_fields();
        if !missing.is_empty() {
            return Err(CatalogError::Validation(format!(
                "delete requires an id or every field; missing: {}",
                missing.join(", ")
            )));
        }
        let id = matcher::find_existing::<R, S>(&self.store, filter)
            .map_err(store_error::<R>)?
            .ok_or_else(no_match::<R>)?;
        self.delete(id)
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    /// Resolves the record matched by `old` and applies `new` to it.
    fn update_target(&self, old: &R::Patch, new: &R::Patch) -> Result<R, CatalogError> {
        old.validate()?;
        let target = matcher::find_existing::<R, S>(&self.store, old)
            .map_err(store_error::<R>)?
            .ok_or_else(no_match::<R>)?;
        let current = self.get(target)?;
        self.apply_update(current, new, true)
    }

    /// Merges `patch` into `current` and writes the result.
    fn apply_update(
        &self,
        current: R,
        patch: &R::Patch,
        check_duplicates: bool,
    ) -> Result<R, CatalogError> {
        let from = current.id();
        let mut next = current;
        patch.apply(&mut next);
        if let Some(to) = patch.id() {
            next.set_id(to);
        }
        next.validate()?;
        let to = next.id();

        if check_duplicates
            && let Some(existing) =
                matcher::find_duplicate(&self.store, &next, Some(from)).map_err(store_error::<R>)?
        {
            return Err(duplicate::<R>(existing));
        }

        if to == from {
            self.store.replace(next.clone()).map_err(store_error::<R>)?;
        } else {
            if self.store.contains(to).map_err(store_error::<R>)? {
                return Err(conflict::<R>(to));
            }
            self.store.relocate(from, next.clone()).map_err(store_error::<R>)?;
        }
        Ok(next)
    }
}

// ============================================================================
// SECTION: Error Helpers
// ============================================================================

/// Builds a not-found error for `id`.
fn not_found<R: Record>(id: RecordId) -> CatalogError {
    CatalogError::NotFound(format!("{} record {id} does not exist", R::RESOURCE))
}

/// Builds an id conflict error for `id`.
fn conflict<R: Record>(id: RecordId) -> CatalogError {
    CatalogError::Conflict(format!("{} record {id} already exists", R::RESOURCE))
}

/// Builds an attribute duplicate error naming the existing record.
fn duplicate<R: Record>(existing: RecordId) -> CatalogError {
    CatalogError::Conflict(format!(
        "{} record {existing} already has the same attributes",
        R::RESOURCE
    ))
}

/// Builds the error for a filter that matches nothing.
fn no_match<R: Record>() -> CatalogError {
    CatalogError::NotFound(format!("no {} record matches the filter", R::RESOURCE))
}

/// Maps store errors to catalog errors with resource-aware messages.
fn store_error<R: Record>(error: StoreError) -> CatalogError {
    match error {
        StoreError::NotFound(id) => not_found::<R>(id),
        StoreError::Conflict(id) => conflict::<R>(id),
        other => CatalogError::from(other),
    }
}
