//! Template errors
//!
//! [`TemplateError`] is what the templating collaborator reports. The engine
//! converts it into a [`BulkError`] once it knows which template text and
//! which field the failure belongs to.

use thiserror::Error;

use crate::core::BulkError;

/// Failure of the templating collaborator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// Template source could not be parsed
    #[error("{message}")]
    Syntax {
        /// Cleaned message of the template engine
        message: String,
        /// 1-based line of the error if the engine reported one
        line: Option<usize>,
    },

    /// Template referenced a variable that is not in the context
    #[error("'{variable}' is undefined")]
    VariableNotFound {
        /// Dotted name of the variable as written in the template
        variable: String,
    },

    /// Rendering failed for another reason, e.g. a filter error
    #[error("{message}")]
    Render {
        /// Cleaned message of the template engine
        message: String,
    },
}

impl TemplateError {
    /// Convert into an engine error for the given template text.
    ///
    /// The returned error carries no field path; use [`BulkError::at_path`]
    /// to attach one.
    #[must_use]
    pub fn into_bulk_error(self, template: &str) -> BulkError {
        let template = template.to_string();
        match self {
            TemplateError::Syntax {
                message,
                ..
            } => BulkError::TemplateSyntax {
                template,
                path: None,
                message,
            },
            TemplateError::VariableNotFound {
                variable,
            } => BulkError::UndefinedVariable {
                variable,
                template,
                path: None,
            },
            TemplateError::Render {
                message,
            } => BulkError::TemplateRender {
                template,
                path: None,
                message,
            },
        }
    }
}
