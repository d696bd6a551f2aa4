//! Templating collaborator used by the generation engine.
//!
//! Every `generate` leaf, every `parent_name_match` and every
//! `global_context` is a template. The engine only depends on the
//! [`TemplateEngine`] trait: templates are compiled once per node definition
//! and rendered once per generated instance with a JSON object of variables.
//! [`TeraEngine`] is the implementation shipped with the crate.
//!
//! # Template Variables
//!
//! See [`Context`] for the variables available while rendering `generate`.
//! `parent_name_match` sees `inp` and `par`, where `par` is the context the
//! prospective child would receive. `dimensions` and textual `count` entries
//! are rendered once before expansion and only see `inp`.
//!
//! # Global Context
//!
//! A node's `global_context` is a template made of `{% set name = ... %}`
//! tags. It is rendered once per instance before `generate`; every name it
//! binds is available as `global.name`:
//!
//! ```text
//! global_context: "{% set code = inp.prefix ~ dim.1 %}"
//! generate:
//!   name: "{{ global.code }}"
//!   description: "Location {{ global.code }}"
//! ```
//!
//! # Custom Filters
//!
//! - `from_json` / `to_json(indent=N)`
//! - `from_csv(delimiter=",")` / `to_csv(delimiter=",")`
//!
//! Hosts register more with [`TeraEngine::with_filter`].

pub mod context;
pub mod error;
pub mod filters;
pub mod renderer;

pub use context::{Context, DimValue};
pub use error::TemplateError;
pub use renderer::TeraEngine;

/// A parsed template ready to be rendered any number of times
pub trait CompiledTemplate: Send + Sync {
    /// The template source as written.
    fn source(&self) -> &str;

    /// Render with a JSON object of variables.
    fn render(&self, vars: &serde_json::Value) -> Result<String, TemplateError>;
}

/// A parsed `global_context` template
pub trait CompiledBindings: Send + Sync {
    /// The template source as written.
    fn source(&self) -> &str;

    /// Render and return every binding made by the template.
    fn render(
        &self,
        vars: &serde_json::Value,
    ) -> Result<serde_json::Map<String, serde_json::Value>, TemplateError>;
}

/// A template language implementation
pub trait TemplateEngine: Send + Sync {
    /// Parse a template.
    fn compile(&self, source: &str) -> Result<Box<dyn CompiledTemplate>, TemplateError>;

    /// Parse a `global_context` template whose local bindings are exported.
    fn compile_bindings(&self, source: &str) -> Result<Box<dyn CompiledBindings>, TemplateError>;
}
