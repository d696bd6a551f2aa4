//! Tera implementation of the templating collaborator.
//!
//! Every compiled template owns a private `Tera` instance holding exactly one
//! template plus the registered filters. Templates are parsed once at
//! compile time and rendered many times with different contexts.

use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tera::{Context as TeraContext, Tera};

use super::error::TemplateError;
use super::filters;
use super::{CompiledBindings, CompiledTemplate, TemplateEngine};

/// Name under which the single template of a compiled instance is stored.
///
/// Has no `.html` suffix so Tera does not autoescape.
const TEMPLATE_NAME: &str = "generate";

/// Separates the `global_context` output from the serialized bindings.
const BINDINGS_MARKER: &str = "\u{1e}bulkgen:bindings\u{1e}";

/// Terminating key of the serialized bindings object, removed after parsing.
const BINDINGS_END: &str = "__bulkgen_bindings_end__";

/// Filter shared between the Tera instances of all compiled templates
#[derive(Clone)]
struct SharedFilter(Arc<dyn tera::Filter>);

impl tera::Filter for SharedFilter {
    fn filter(&self, value: &tera::Value, args: &HashMap<String, tera::Value>) -> tera::Result<tera::Value> {
        self.0.filter(value, args)
    }

    fn is_safe(&self) -> bool {
        self.0.is_safe()
    }
}

/// Tera-based [`TemplateEngine`]
///
/// Comes with the `from_json`, `to_json`, `from_csv` and `to_csv` filters;
/// hosts add their own with [`TeraEngine::with_filter`].
///
/// # Examples
///
/// ```rust,no_run
/// use bulkgen_cli::templating::{TemplateEngine, TeraEngine};
/// use serde_json::json;
///
/// let engine = TeraEngine::new();
/// let template = engine.compile("Drawer {{ dim.1 }}").unwrap();
/// assert_eq!(template.render(&json!({"dim": {"1": "A"}})).unwrap(), "Drawer A");
/// ```
#[derive(Clone)]
pub struct TeraEngine {
    filters: Vec<(String, SharedFilter)>,
}

impl Default for TeraEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TeraEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.filters.iter().map(|(name, _)| name.as_str()).collect();
        f.debug_struct("TeraEngine").field("filters", &names).finish()
    }
}

impl TeraEngine {
    /// Create an engine with the built-in filters registered.
    #[must_use]
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
        .with_filter("from_json", filters::create_from_json_filter())
        .with_filter("to_json", filters::create_to_json_filter())
        .with_filter("from_csv", filters::create_from_csv_filter())
        .with_filter("to_csv", filters::create_to_csv_filter())
    }

    /// Register an additional filter; a filter with the same name is replaced.
    #[must_use]
    pub fn with_filter(mut self, name: &str, filter: impl tera::Filter + 'static) -> Self {
        self.filters.retain(|(existing, _)| existing != name);
        self.filters.push((name.to_string(), SharedFilter(Arc::new(filter))));
        self
    }

    fn build(&self, source: &str) -> Result<Tera, TemplateError> {
        let mut tera = Tera::default();
        for (name, filter) in &self.filters {
            tera.register_filter(name, filter.clone());
        }
        tera.add_raw_template(TEMPLATE_NAME, source).map_err(|e| parse_tera_error(&e, true))?;
        Ok(tera)
    }
}

impl TemplateEngine for TeraEngine {
    fn compile(&self, source: &str) -> Result<Box<dyn CompiledTemplate>, TemplateError> {
        tracing::trace!("Compiling template '{}'", source);
        Ok(Box::new(TeraTemplate {
            source: source.to_string(),
            tera: self.build(source)?,
        }))
    }

    fn compile_bindings(&self, source: &str) -> Result<Box<dyn CompiledBindings>, TemplateError> {
        let names = binding_names(source);

        // append a JSON object of every name still bound after rendering;
        // names set only in untaken branches or loop bodies are skipped
        let entries: String = names
            .iter()
            .map(|name| {
                format!("{{% if {name} is defined %}}\"{name}\": {{{{ {name} | json_encode() | safe }}}}, {{% endif %}}")
            })
            .collect();
        let extended = format!("{source}{BINDINGS_MARKER}{{{entries}\"{BINDINGS_END}\": null}}");

        tracing::trace!("Compiling global context with bindings {:?}", names);
        Ok(Box::new(TeraBindings {
            source: source.to_string(),
            tera: self.build(&extended)?,
        }))
    }
}

/// Names of every `{% set name = ... %}` tag, in order, deduplicated.
fn binding_names(source: &str) -> Vec<String> {
    static SET_TAG: OnceLock<Regex> = OnceLock::new();
    let re = SET_TAG.get_or_init(|| {
        Regex::new(r"\{%-?\s*set(?:_global)?\s+([A-Za-z_][A-Za-z0-9_]*)\s*=").expect("set tag pattern is valid")
    });

    let mut names: Vec<String> = Vec::new();
    for caps in re.captures_iter(source) {
        if let Some(name) = caps.get(1) {
            let name = name.as_str().to_string();
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    names
}

fn render_tera(tera: &Tera, vars: &serde_json::Value) -> Result<String, TemplateError> {
    let context = TeraContext::from_value(vars.clone()).map_err(|e| TemplateError::Render {
        message: format_tera_error(&e),
    })?;
    tera.render(TEMPLATE_NAME, &context).map_err(|e| parse_tera_error(&e, false))
}

struct TeraTemplate {
    source: String,
    tera: Tera,
}

impl CompiledTemplate for TeraTemplate {
    fn source(&self) -> &str {
        &self.source
    }

    fn render(&self, vars: &serde_json::Value) -> Result<String, TemplateError> {
        render_tera(&self.tera, vars)
    }
}

struct TeraBindings {
    source: String,
    tera: Tera,
}

impl CompiledBindings for TeraBindings {
    fn source(&self) -> &str {
        &self.source
    }

    fn render(&self, vars: &serde_json::Value) -> Result<serde_json::Map<String, serde_json::Value>, TemplateError> {
        let output = render_tera(&self.tera, vars)?;
        let (_, bindings) = output.rsplit_once(BINDINGS_MARKER).unwrap_or(("", "{}"));
        match serde_json::from_str(bindings) {
            Ok(serde_json::Value::Object(mut map)) => {
                map.remove(BINDINGS_END);
                Ok(map)
            }
            Ok(other) => Err(TemplateError::Render {
                message: format!("global context bindings are not a mapping: {other}"),
            }),
            Err(e) => Err(TemplateError::Render {
                message: format!("global context bindings are not serializable: {e}"),
            }),
        }
    }
}

/// Parse a Tera error into a structured [`TemplateError`].
///
/// Walks the error chain, since Tera wraps the interesting message in a
/// generic "Failed to render" error.
fn parse_tera_error(error: &tera::Error, parsing: bool) -> TemplateError {
    use std::error::Error;

    let mut current: Option<&dyn Error> = Some(error);
    while let Some(err) = current {
        if let Some(variable) = extract_variable_name(&err.to_string()) {
            return TemplateError::VariableNotFound {
                variable,
            };
        }
        current = err.source();
    }

    let message = format_tera_error(error);
    if parsing {
        TemplateError::Syntax {
            line: extract_line_from_tera_error(error),
            message,
        }
    } else {
        TemplateError::Render {
            message,
        }
    }
}

/// Extract variable name from "Variable `foo` not found" message
fn extract_variable_name(error_msg: &str) -> Option<String> {
    static VARIABLE: OnceLock<Regex> = OnceLock::new();
    let re = VARIABLE.get_or_init(|| {
        Regex::new(r"(?:Variable|Unknown variable) `([^`]+)`").expect("variable pattern is valid")
    });
    re.captures(error_msg).and_then(|caps| caps.get(1)).map(|m| m.as_str().to_string())
}

/// Extract line number from a Tera parse error (`--> 1:7`).
fn extract_line_from_tera_error(error: &tera::Error) -> Option<usize> {
    static POSITION: OnceLock<Regex> = OnceLock::new();
    let re = POSITION.get_or_init(|| Regex::new(r"(\d+):(\d+)").expect("position pattern is valid"));
    let error_msg = format!("{:?}", error);
    re.captures(&error_msg).and_then(|caps| caps.get(1)).and_then(|m| m.as_str().parse().ok())
}

/// Format a Tera error chain into one message without internal template names.
pub fn format_tera_error(error: &tera::Error) -> String {
    use std::error::Error;

    let mut all_messages = vec![error.to_string()];
    let mut current_error: Option<&dyn Error> = error.source();
    while let Some(err) = current_error {
        all_messages.push(err.to_string());
        current_error = err.source();
    }

    let quoted = format!("'{TEMPLATE_NAME}'");
    let messages: Vec<String> = all_messages
        .into_iter()
        .map(|msg| {
            msg.replace(&format!("while rendering {quoted}"), "")
                .replace(&format!("Failed to render {quoted}"), "")
                .replace(&format!("Failed to parse {quoted}"), "")
                .replace(&quoted, "template")
                .trim()
                .to_string()
        })
        .filter(|msg| !msg.is_empty())
        .collect();

    if messages.is_empty() {
        "Template error".to_string()
    } else {
        messages.join(": ")
    }
}
