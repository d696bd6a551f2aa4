//! Global constants used throughout the bulkgen codebase.
//!
//! This module contains the engine version, the truthy token set and the
//! default limits that are used across multiple modules.

/// Version of the schema format understood by this engine.
///
/// Schemas declare a `version`; its major component must equal the major
/// component of this value or the schema is rejected before any expansion.
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Tokens that count as `true` when a template renders a boolean-like value.
///
/// Matching is case-insensitive. Used for `parent_name_match` and for the
/// `boolean` field cast.
pub const TRUTHY_TOKENS: &[&str] = &["1", "y", "yes", "t", "true", "ok", "on"];

/// `parent_name_match` used when neither the child nor any template sets one.
pub const DEFAULT_PARENT_NAME_MATCH: &str = "true";

/// Default maximum nesting depth of node definitions during expansion.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Default budget of nodes one expansion may generate.
pub const DEFAULT_MAX_NODES: usize = 100_000;

/// Environment variable overriding the configuration file location.
pub const CONFIG_PATH_ENV: &str = "BULKGEN_CONFIG";
