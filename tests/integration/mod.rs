//! Integration test suite for bulkgen
//!
//! End-to-end tests of the generation engine through its public API and of
//! the `bulkgen` binary.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **generation**: dimensions, cartesian products, child matching
//! - **inheritance**: `extends` templates and base children
//! - **context**: template variables (`inp`, `par`, `len`, `global`)
//! - **fields**: field schemas, casts, required fields, presets
//! - **materialize**: handing generated trees to a store
//! - **commands**: the `bulkgen` binary

// Shared test utilities (from parent tests/ directory)
#[path = "../common/mod.rs"]
mod common;

mod commands;
mod context;
mod fields;
mod inheritance;
mod materialize;
