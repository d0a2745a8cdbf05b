// crates/catalog-config/src/lib.rs
// ============================================================================
// Module: Catalog Config Library
// Description: Canonical config model, validation, and example generation.
// Purpose: Single source of truth for catalog.toml semantics.
// Dependencies: catalog-core, catalog-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `catalog-config` defines the configuration model for the catalog service.
//! Loading is strict and fail-closed: oversized, non-UTF-8, malformed, or
//! inconsistent configuration is rejected before the server starts.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
