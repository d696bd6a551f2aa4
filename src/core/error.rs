//! Error handling for bulkgen
//!
//! This module provides the error type of the generation engine and the
//! user-friendly error reporting used by the CLI. The error system follows two
//! principles:
//! 1. **Strongly-typed errors** so hosts can react to a specific failure kind
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Architecture
//!
//! - [`BulkError`] - Enumerated error kinds for every way a generation request fails
//! - [`ErrorKind`] - Fieldless discriminant of a [`BulkError`] for matching and reporting
//! - [`ErrorContext`] - Wrapper that adds user-friendly suggestions and details
//!
//! Every [`BulkError`] is fatal to the current generation request. The engine
//! never retries and never returns partial trees; the first failure aborts the
//! whole expansion, except for [`BulkError::MissingRequiredFields`] which
//! aggregates every missing path of one node before failing.
//!
//! # Examples
//!
//! ```rust,no_run
//! use bulkgen_cli::core::{BulkError, ErrorKind};
//!
//! let error = BulkError::UnknownTemplateReference {
//!     name: "Drawer".to_string(),
//!     closest: None,
//! };
//! assert_eq!(error.kind(), ErrorKind::UnknownTemplateReference);
//! assert_eq!(error.to_string(), "template Drawer is not defined");
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

use crate::utils::did_you_mean;

/// Top-level variables of the template context.
const TEMPLATE_VARIABLES: &[&str] = &["inp", "dim", "dim_len", "len", "par", "global"];

/// Render the optional field path suffix of template errors.
fn at(path: &Option<String>) -> String {
    match path {
        Some(path) if !path.is_empty() => format!(" at: '{}'", path),
        _ => String::new(),
    }
}

/// The error type of the generation engine
///
/// Each variant corresponds to one failure kind of a generation request. The
/// messages are written for the person who authored the schema, since hosts
/// usually forward them verbatim.
///
/// # Error Categories
///
/// ## Schema
/// - [`VersionIncompatible`] - schema major version differs from the engine's
/// - [`SchemaShapeInvalid`] - malformed schema document
/// - [`UnknownTemplateReference`] - `extends` names an undefined template
///
/// ## Dimensions
/// - [`UnknownDimensionGenerator`] - `*NAME` names no known generator
/// - [`DimensionTypeMismatch`] - range endpoints belong to different generators
/// - [`InvalidDimensionSetting`] - a `(key=value)` setting cannot be used
/// - [`MissingCount`] - an unbounded generator has no count
///
/// ## Templates and fields
/// - [`TemplateSyntax`], [`UndefinedVariable`], [`TemplateRender`]
/// - [`MissingRequiredFields`], [`RequiredFieldEmpty`], [`FieldCast`]
/// - [`FieldNotAllowed`], [`InvalidGenerateShape`]
///
/// ## Expansion
/// - [`NoChildMatch`] - no child definition matched a generated instance
/// - [`MaxDepthExceeded`] - recursion guard for runaway schemas
/// - [`TooManyNodes`] - node budget guard for oversized schemas
///
/// [`VersionIncompatible`]: BulkError::VersionIncompatible
/// [`SchemaShapeInvalid`]: BulkError::SchemaShapeInvalid
/// [`UnknownTemplateReference`]: BulkError::UnknownTemplateReference
/// [`UnknownDimensionGenerator`]: BulkError::UnknownDimensionGenerator
/// [`DimensionTypeMismatch`]: BulkError::DimensionTypeMismatch
/// [`InvalidDimensionSetting`]: BulkError::InvalidDimensionSetting
/// [`MissingCount`]: BulkError::MissingCount
/// [`TemplateSyntax`]: BulkError::TemplateSyntax
/// [`UndefinedVariable`]: BulkError::UndefinedVariable
/// [`TemplateRender`]: BulkError::TemplateRender
/// [`MissingRequiredFields`]: BulkError::MissingRequiredFields
/// [`RequiredFieldEmpty`]: BulkError::RequiredFieldEmpty
/// [`FieldCast`]: BulkError::FieldCast
/// [`FieldNotAllowed`]: BulkError::FieldNotAllowed
/// [`InvalidGenerateShape`]: BulkError::InvalidGenerateShape
/// [`NoChildMatch`]: BulkError::NoChildMatch
/// [`MaxDepthExceeded`]: BulkError::MaxDepthExceeded
/// [`TooManyNodes`]: BulkError::TooManyNodes
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BulkError {
    /// Schema major version differs from the engine major version
    #[error("The engine runs on v{engine} which is incompatible to v{schema}.")]
    VersionIncompatible {
        /// Version of this engine
        engine: String,
        /// Version declared by the schema
        schema: String,
    },

    /// Malformed schema document
    #[error("Invalid schema at '{path}': {reason}")]
    SchemaShapeInvalid {
        /// Location inside the document (e.g. `output.childs.0.count`)
        path: String,
        /// What is wrong at that location
        reason: String,
    },

    /// `extends` references a template that is not part of `templates`
    #[error("template {name} is not defined")]
    UnknownTemplateReference {
        /// The referenced template name
        name: String,
        /// Most similar defined template name, if any
        closest: Option<String>,
    },

    /// `*NAME` references a generator that does not exist
    #[error("No generator named: '{token}'")]
    UnknownDimensionGenerator {
        /// The dimension token as written
        token: String,
    },

    /// `A-B` endpoints sniff to different generators or mixed casing
    #[error(
        "No generator can produce the range '{token}': '{start}' and '{end}' must both be numbers or letters of the same casing"
    )]
    DimensionTypeMismatch {
        /// The dimension token as written
        token: String,
        /// Start literal
        start: String,
        /// End literal
        end: String,
    },

    /// A `(key=value)` setting of a dimension token cannot be used
    #[error("Invalid setting '{key}={value}' for generator '{token}': {reason}")]
    InvalidDimensionSetting {
        /// The dimension token as written
        token: String,
        /// Setting name
        key: String,
        /// Setting value
        value: String,
        /// Why the value was rejected
        reason: String,
    },

    /// An unbounded generator has neither settings nor a positional count
    #[error("Missing count for generator: '{token}' or dimension count")]
    MissingCount {
        /// The dimension token as written
        token: String,
    },

    /// Template could not be compiled
    #[error("Invalid generator template '{template}'{}\nException: {message}", at(.path))]
    TemplateSyntax {
        /// Template source text
        template: String,
        /// Field path the template belongs to, if any
        path: Option<String>,
        /// Message from the template engine
        message: String,
    },

    /// Template referenced a variable that is not in the context
    #[error("Invalid generator template '{template}'{}\nException: '{variable}' is undefined", at(.path))]
    UndefinedVariable {
        /// The missing variable
        variable: String,
        /// Template source text
        template: String,
        /// Field path the template belongs to, if any
        path: Option<String>,
    },

    /// Template failed while rendering for another reason (e.g. a filter failed)
    #[error("Invalid generator template '{template}'{}\nException: {message}", at(.path))]
    TemplateRender {
        /// Template source text
        template: String,
        /// Field path the template belongs to, if any
        path: Option<String>,
        /// Message from the template engine
        message: String,
    },

    /// Required fields have no template in `generate`
    #[error("'{}' are missing in generated keys.", .paths.join(","))]
    MissingRequiredFields {
        /// Every missing dotted path
        paths: Vec<String>,
    },

    /// Required field rendered to an empty string
    #[error("'{path}' is a required field, but template '{template}' returned empty string")]
    RequiredFieldEmpty {
        /// Dotted field path
        path: String,
        /// Template source text
        template: String,
    },

    /// Cast hook rejected a rendered value
    #[error("{path}: {message}")]
    FieldCast {
        /// Dotted field path
        path: String,
        /// Message from the cast hook
        message: String,
    },

    /// `generate` contains a key the field schema does not know (reject mode)
    #[error("'{path}' is not allowed to be generated")]
    FieldNotAllowed {
        /// Dotted field path
        path: String,
    },

    /// `generate` value has the wrong structure for its field
    #[error("'{path}' expects {expected}")]
    InvalidGenerateShape {
        /// Dotted field path
        path: String,
        /// Description of the expected structure
        expected: String,
    },

    /// Node has child definitions but none matched a generated instance
    #[error("No match for {instance}")]
    NoChildMatch {
        /// Description of the unmatched instance
        instance: String,
    },

    /// Recursion went deeper than the configured maximum
    #[error(
        "Maximum nesting depth of {max_depth} exceeded, check for templates that extend themselves through their childs"
    )]
    MaxDepthExceeded {
        /// Configured maximum depth
        max_depth: usize,
    },

    /// Expansion would produce more nodes than allowed
    #[error("Schema expands to more than the configured maximum of {max_nodes} nodes")]
    TooManyNodes {
        /// Configured node budget
        max_nodes: usize,
    },

    /// Invalid engine configuration
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error
        message: String,
    },
}

/// Fieldless discriminant of [`BulkError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    VersionIncompatible,
    SchemaShapeInvalid,
    UnknownTemplateReference,
    UnknownDimensionGenerator,
    DimensionTypeMismatch,
    InvalidDimensionSetting,
    MissingCount,
    TemplateSyntax,
    UndefinedVariable,
    TemplateRender,
    MissingRequiredFields,
    RequiredFieldEmpty,
    FieldCast,
    FieldNotAllowed,
    InvalidGenerateShape,
    NoChildMatch,
    MaxDepthExceeded,
    TooManyNodes,
    Config,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::VersionIncompatible => "VersionIncompatible",
            ErrorKind::SchemaShapeInvalid => "SchemaShapeInvalid",
            ErrorKind::UnknownTemplateReference => "UnknownTemplateReference",
            ErrorKind::UnknownDimensionGenerator => "UnknownDimensionGenerator",
            ErrorKind::DimensionTypeMismatch => "DimensionTypeMismatch",
            ErrorKind::InvalidDimensionSetting => "InvalidDimensionSetting",
            ErrorKind::MissingCount => "MissingCount",
            ErrorKind::TemplateSyntax => "TemplateSyntaxError",
            ErrorKind::UndefinedVariable => "UndefinedVariable",
            ErrorKind::TemplateRender => "TemplateRenderError",
            ErrorKind::MissingRequiredFields => "MissingRequiredFields",
            ErrorKind::RequiredFieldEmpty => "RequiredFieldEmpty",
            ErrorKind::FieldCast => "FieldCastError",
            ErrorKind::FieldNotAllowed => "FieldNotAllowed",
            ErrorKind::InvalidGenerateShape => "InvalidGenerateShape",
            ErrorKind::NoChildMatch => "NoChildMatch",
            ErrorKind::MaxDepthExceeded => "MaxDepthExceeded",
            ErrorKind::TooManyNodes => "TooManyNodes",
            ErrorKind::Config => "ConfigError",
        };
        f.write_str(name)
    }
}

impl BulkError {
    /// The kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            BulkError::VersionIncompatible {
                ..
            } => ErrorKind::VersionIncompatible,
            BulkError::SchemaShapeInvalid {
                ..
            } => ErrorKind::SchemaShapeInvalid,
            BulkError::UnknownTemplateReference {
                ..
            } => ErrorKind::UnknownTemplateReference,
            BulkError::UnknownDimensionGenerator {
                ..
            } => ErrorKind::UnknownDimensionGenerator,
            BulkError::DimensionTypeMismatch {
                ..
            } => ErrorKind::DimensionTypeMismatch,
            BulkError::InvalidDimensionSetting {
                ..
            } => ErrorKind::InvalidDimensionSetting,
            BulkError::MissingCount {
                ..
            } => ErrorKind::MissingCount,
            BulkError::TemplateSyntax {
                ..
            } => ErrorKind::TemplateSyntax,
            BulkError::UndefinedVariable {
                ..
            } => ErrorKind::UndefinedVariable,
            BulkError::TemplateRender {
                ..
            } => ErrorKind::TemplateRender,
            BulkError::MissingRequiredFields {
                ..
            } => ErrorKind::MissingRequiredFields,
            BulkError::RequiredFieldEmpty {
                ..
            } => ErrorKind::RequiredFieldEmpty,
            BulkError::FieldCast {
                ..
            } => ErrorKind::FieldCast,
            BulkError::FieldNotAllowed {
                ..
            } => ErrorKind::FieldNotAllowed,
            BulkError::InvalidGenerateShape {
                ..
            } => ErrorKind::InvalidGenerateShape,
            BulkError::NoChildMatch {
                ..
            } => ErrorKind::NoChildMatch,
            BulkError::MaxDepthExceeded {
                ..
            } => ErrorKind::MaxDepthExceeded,
            BulkError::TooManyNodes {
                ..
            } => ErrorKind::TooManyNodes,
            BulkError::Config {
                ..
            } => ErrorKind::Config,
        }
    }

    /// The dotted field path this error is attached to, if any.
    #[must_use]
    pub fn field_path(&self) -> Option<&str> {
        match self {
            BulkError::SchemaShapeInvalid {
                path,
                ..
            }
            | BulkError::RequiredFieldEmpty {
                path,
                ..
            }
            | BulkError::FieldCast {
                path,
                ..
            }
            | BulkError::FieldNotAllowed {
                path,
            }
            | BulkError::InvalidGenerateShape {
                path,
                ..
            } => Some(path),
            BulkError::TemplateSyntax {
                path,
                ..
            }
            | BulkError::UndefinedVariable {
                path,
                ..
            }
            | BulkError::TemplateRender {
                path,
                ..
            } => path.as_deref(),
            _ => None,
        }
    }

    /// Attach a field path to template errors that do not carry one yet.
    #[must_use]
    pub fn at_path(self, field_path: &str) -> Self {
        match self {
            BulkError::TemplateSyntax {
                template,
                path: None,
                message,
            } => BulkError::TemplateSyntax {
                template,
                path: Some(field_path.to_string()),
                message,
            },
            BulkError::UndefinedVariable {
                variable,
                template,
                path: None,
            } => BulkError::UndefinedVariable {
                variable,
                template,
                path: Some(field_path.to_string()),
            },
            BulkError::TemplateRender {
                template,
                path: None,
                message,
            } => BulkError::TemplateRender {
                template,
                path: Some(field_path.to_string()),
                message,
            },
            other => other,
        }
    }
}

/// Error context wrapper that provides user-friendly error information
///
/// `ErrorContext` carries a message and optional suggestion and details. The
/// CLI prints it with terminal colors; [`fmt::Display`] gives the plain form.
///
/// # Examples
///
/// ```rust,no_run
/// use bulkgen_cli::core::ErrorContext;
///
/// let context = ErrorContext::new("template Drawer is not defined")
///     .with_suggestion("Add a template named 'Drawer' to the 'templates' list")
///     .with_details("Templates are matched by their exact name");
/// context.display();
/// ```
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// Kind of the underlying engine error, if the error came from the engine
    pub kind: Option<ErrorKind>,
    /// Main error message
    pub message: String,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context without suggestions or details.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            kind: None,
            message: message.into(),
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add details explaining the error.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr with terminal colors.
    pub fn display(&self) {
        eprintln!("{} {}", "error:".red().bold(), self.message);

        if let Some(kind) = self.kind {
            eprintln!("{} {}", "kind:".dimmed(), kind);
        }

        if let Some(details) = &self.details {
            eprintln!("{} {}", "details:".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{} {}", "suggestion:".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {}", details)?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {}", suggestion)?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Build an [`ErrorContext`] with a suggestion tailored to the error kind.
#[must_use]
pub fn create_error_context(error: &BulkError) -> ErrorContext {
    let context = ErrorContext {
        kind: Some(error.kind()),
        message: error.to_string(),
        suggestion: None,
        details: None,
    };

    match error {
        BulkError::VersionIncompatible {
            engine,
            ..
        } => context.with_suggestion(format!(
            "Set \"version\" in the schema to a {}.x.y version",
            engine.split('.').next().unwrap_or(engine)
        )),
        BulkError::SchemaShapeInvalid {
            ..
        } => context.with_suggestion(
            "Check the schema structure: it needs 'version', 'input', 'templates' and 'output'",
        ),
        BulkError::UnknownTemplateReference {
            name,
            closest,
        } => match closest {
            Some(closest) => context.with_suggestion(format!("Did you mean '{}'?", closest)),
            None => context.with_suggestion(format!(
                "Add a template named '{}' to the 'templates' list or fix the 'extends' value",
                name
            )),
        },
        BulkError::UnknownDimensionGenerator {
            token,
        } => {
            let names = crate::generators::GeneratorRegistry::default().names();
            let name = token.trim_start_matches('*').split('(').next().unwrap_or_default();
            let context = context.with_details(format!("Available generators: {}", names.join(", ")));
            match did_you_mean(name, names.iter().copied()) {
                Some(closest) => context.with_suggestion(format!("Did you mean '*{}'?", closest)),
                None => context.with_suggestion("Use one of the available generators, e.g. '*NUMERIC'"),
            }
        }
        BulkError::DimensionTypeMismatch {
            ..
        } => context.with_suggestion("Use endpoints of the same kind, e.g. '1-10', 'a-f' or 'A-F'"),
        BulkError::MissingCount {
            ..
        } => context.with_suggestion(
            "Add a 'count' entry for this dimension or a setting like '*NUMERIC(count=5)'",
        ),
        BulkError::MissingRequiredFields {
            ..
        }
        | BulkError::RequiredFieldEmpty {
            ..
        } => context.with_suggestion("Provide a non-empty template for every required field"),
        BulkError::UndefinedVariable {
            variable,
            ..
        } => {
            let root = variable.split('.').next().unwrap_or_default();
            let context = context.with_details(format!("Available variables: {}", TEMPLATE_VARIABLES.join(", ")));
            match did_you_mean(root, TEMPLATE_VARIABLES.iter().copied()).filter(|closest| *closest != root) {
                Some(closest) => context.with_suggestion(format!("Did you mean '{}'?", closest)),
                None => context.with_suggestion("Check the variable name and the context it is rendered in"),
            }
        }
        BulkError::TemplateSyntax {
            ..
        }
        | BulkError::TemplateRender {
            ..
        } => context
            .with_suggestion("Check your template syntax and variable names")
            .with_details(format!("Available variables: {}", TEMPLATE_VARIABLES.join(", "))),
        BulkError::NoChildMatch {
            ..
        } => context.with_suggestion(
            "Make sure one 'parent_name_match' of the childs renders to a truthy value (1, y, yes, t, true, ok, on)",
        ),
        BulkError::MaxDepthExceeded {
            ..
        } => context.with_suggestion("Raise 'max_depth' in the configuration if the nesting is intended"),
        BulkError::TooManyNodes {
            ..
        } => context.with_suggestion("Reduce the dimension counts or raise 'max_nodes' in the configuration"),
        _ => context,
    }
}

/// Convert any error into a user-friendly format with contextual suggestions
///
/// Walks the error chain looking for a [`BulkError`]; if one is found, the
/// engine error's kind and suggestion are used. Otherwise the top-level
/// message is shown and the chain is added as details.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    for cause in error.chain() {
        if let Some(bulk_error) = cause.downcast_ref::<BulkError>() {
            let context = create_error_context(bulk_error);
            return if cause.to_string() == error.to_string() {
                context
            } else {
                context.with_details(error.to_string())
            };
        }
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>()
        && io_error.kind() == std::io::ErrorKind::NotFound
    {
        return ErrorContext::new(error.to_string())
            .with_suggestion("Check that the file exists and the path is correct");
    }

    let causes: Vec<String> = error.chain().skip(1).map(ToString::to_string).collect();
    let context = ErrorContext::new(error.to_string());
    if causes.is_empty() {
        context
    } else {
        context.with_details(causes.join(": "))
    }
}
