//! Core types for bulkgen
//!
//! This module holds the error system shared by every part of the engine and
//! the CLI:
//! - [`BulkError`] - Enumerated error kinds of a generation request
//! - [`ErrorKind`] - Fieldless discriminant for matching and reporting
//! - [`ErrorContext`] - User-friendly error wrapper with suggestions and details
//! - [`user_friendly_error`] - Convert any error to the user-friendly format
//!
//! # Examples
//!
//! ```rust,no_run
//! use bulkgen_cli::core::{BulkError, user_friendly_error};
//!
//! fn example_operation() -> anyhow::Result<()> {
//!     Err(BulkError::MissingCount {
//!         token: "*NUMERIC".to_string(),
//!     }
//!     .into())
//! }
//!
//! if let Err(e) = example_operation() {
//!     user_friendly_error(e).display();
//! }
//! ```

pub mod error;

pub use error::{BulkError, ErrorContext, ErrorKind, create_error_context, user_friendly_error};

/// Result type of engine operations
pub type Result<T, E = BulkError> = std::result::Result<T, E>;
