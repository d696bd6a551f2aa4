//! bulkgen - declarative tree generator
//!
//! Expands a compact schema of repeating naming patterns into a tree of
//! records, e.g. a warehouse of rooms, shelves and drawers, or a catalogue of
//! part categories. Each node definition names its *dimensions* (value lists
//! such as `A-E` or `*NUMERIC(count=4)`), renders one record per element of
//! their cartesian product, and attaches children chosen by
//! `parent_name_match` conditions.
//!
//! # Architecture Overview
//!
//! ```text
//! schema document ──► schema ──► generator ──► Vec<GeneratedNode> ──► materialize
//!                       │            │
//!                       │            ├── dimensions ──► generators
//!                       │            ├── templating (Tera)
//!                       │            └── fields (typed output, casts, presets)
//!                       └── merge (extends, base child)
//! ```
//!
//! # Core Modules
//!
//! - [`schema`] - Schema documents, node definitions and the merge rule
//! - [`generator`] - The expansion engine ([`generator::BulkGenerator`])
//! - [`dimensions`] - Parsing and resolving dimension strings
//! - [`generators`] - Infinite value generators (`*NUMERIC`, `*ALPHA`) and their registry
//! - [`templating`] - Template engine abstraction and the Tera implementation
//! - [`fields`] - Field schemas, value casting and built-in presets
//! - [`materialize`] - Persisting generated trees through a host store
//!
//! ## Supporting Modules
//! - [`cli`] - Command-line interface
//! - [`config`] - Configuration file (`~/.bulkgen/config.toml`)
//! - [`core`] - Error types and user-facing error reporting
//! - [`constants`] - Engine version and defaults
//! - [`utils`] - Small string helpers
//!
//! # Example
//!
//! ```rust,no_run
//! use bulkgen_cli::generator::BulkGenerator;
//! use bulkgen_cli::schema::{DocumentFormat, Schema};
//!
//! # fn main() -> anyhow::Result<()> {
//! let schema = Schema::parse(
//!     r#"
//! version: "1.0.0"
//! output:
//!   dimensions: ["A-B", "*NUMERIC"]
//!   count: [null, 3]
//!   generate:
//!     name: "{{ dim.1 }}{{ dim.2 }}"
//! "#,
//!     DocumentFormat::Yaml,
//! )?;
//!
//! let nodes = BulkGenerator::new(schema).generate()?;
//! assert_eq!(nodes.len(), 6);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod dimensions;
pub mod fields;
pub mod generator;
pub mod generators;
pub mod materialize;
pub mod schema;
pub mod templating;
pub mod utils;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
