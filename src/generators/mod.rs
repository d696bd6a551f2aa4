//! Index-sequence generators for dimension tokens.
//!
//! A generator produces an ordered, indexable, unbounded sequence of string
//! tokens for one kind of dimension. Two generators are built in:
//!
//! - [`NumericGenerator`] (`NUMERIC`): `"0", "1", "2", ...`
//! - [`AlphaGenerator`] (`ALPHA`): `"a", "b", ..., "z", "aa", "ab", ...`
//!   (bijective base-26, like spreadsheet columns)
//!
//! Generators are created per dimension token through a [`GeneratorFactory`],
//! which also performs the type sniffing for `A-B` range tokens. Factories are
//! collected in a [`GeneratorRegistry`]; hosts can register their own.
//!
//! # Examples
//!
//! ```rust,no_run
//! use bulkgen_cli::generators::GeneratorRegistry;
//!
//! let registry = GeneratorRegistry::default();
//! assert!(registry.find_by_name("ALPHA").is_some());
//! assert_eq!(registry.find_for_range("1", "9").map(|f| f.name()), Some("NUMERIC"));
//! ```

mod alpha;
mod numeric;

pub use alpha::{AlphaFactory, AlphaGenerator, Casing};
pub use numeric::{NumericFactory, NumericGenerator};

use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

use crate::core::{BulkError, Result};

/// How a dimension token selects its values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `*NAME` - named unbounded generator, bounded by settings or a count
    Infinity,
    /// `A-B` - explicit endpoints, generator chosen by type sniffing
    Range,
    /// bare literal, yields itself once
    Word,
}

/// Settings every generator understands
///
/// `start` and `end` are literal tokens of the generator's alphabet and only
/// apply to [`TokenKind::Infinity`] tokens. `count` caps the length and wins
/// over `end`. `step` is the stride through the zero-based index range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseSettings {
    pub start: Option<String>,
    pub end: Option<String>,
    pub count: Option<usize>,
    pub step: usize,
}

impl Default for BaseSettings {
    fn default() -> Self {
        Self {
            start: None,
            end: None,
            count: None,
            step: 1,
        }
    }
}

impl BaseSettings {
    /// Read the shared settings from the raw `key=value` pairs of a token.
    ///
    /// Unknown keys are ignored here; generator-specific keys are read by the
    /// factories themselves.
    pub fn from_raw(token: &str, raw: &IndexMap<String, String>) -> Result<Self> {
        let mut settings = Self::default();

        if let Some(start) = raw.get("start") {
            settings.start = Some(start.trim().to_string());
        }
        if let Some(end) = raw.get("end") {
            settings.end = Some(end.trim().to_string());
        }
        if let Some(count) = raw.get("count") {
            settings.count = Some(parse_setting(token, "count", count)?);
        }
        if let Some(step) = raw.get("step") {
            let step = parse_setting(token, "step", step)?;
            if step == 0 {
                return Err(invalid_setting(token, "step", "0", "step must be at least 1"));
            }
            settings.step = step;
        }

        Ok(settings)
    }
}

fn parse_setting(token: &str, key: &str, value: &str) -> Result<usize> {
    value
        .trim()
        .parse::<usize>()
        .map_err(|_| invalid_setting(token, key, value, "expected a non-negative integer"))
}

/// Build an [`BulkError::InvalidDimensionSetting`].
pub(crate) fn invalid_setting(token: &str, key: &str, value: &str, reason: &str) -> BulkError {
    BulkError::InvalidDimensionSetting {
        token: token.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Everything a factory needs to create a generator for one token
#[derive(Debug, Clone, Copy)]
pub struct GeneratorSpec<'a> {
    /// Token kind (never [`TokenKind::Word`])
    pub kind: TokenKind,
    /// The token as written, used in error messages
    pub token: &'a str,
    /// Range endpoints for [`TokenKind::Range`] tokens
    pub range: Option<(&'a str, &'a str)>,
    /// Raw `key=value` settings
    pub settings: &'a IndexMap<String, String>,
}

/// A configured generator for one dimension token
pub trait Generator: fmt::Debug + Send + Sync {
    /// Settings this generator was created with.
    fn settings(&self) -> &BaseSettings;

    /// Zero-based position of a literal value, `None` if the value is not
    /// part of this generator's alphabet.
    fn index_of(&self, value: &str) -> Option<usize>;

    /// Token at a zero-based position.
    fn token_at(&self, index: usize) -> String;

    /// Unbounded lazy sequence of tokens, starting at index 0.
    ///
    /// Every call starts a fresh sequence.
    fn sequence(&self) -> Box<dyn Iterator<Item = String> + '_> {
        Box::new((0..).map(move |index| self.token_at(index)))
    }
}

/// Creates generators of one type and sniffs range endpoints
pub trait GeneratorFactory: Send + Sync {
    /// Name used in `*NAME` tokens.
    fn name(&self) -> &'static str;

    /// Whether both range literals belong to this generator's alphabet.
    fn matches_range(&self, start: &str, end: &str) -> bool;

    /// Create a generator for a token.
    fn create(&self, spec: &GeneratorSpec<'_>) -> Result<Box<dyn Generator>>;
}

/// Ordered collection of generator factories
///
/// Lookup by name is exact; range sniffing asks every factory in
/// registration order and takes the first match.
#[derive(Clone)]
pub struct GeneratorRegistry {
    factories: Vec<Arc<dyn GeneratorFactory>>,
}

impl Default for GeneratorRegistry {
    fn default() -> Self {
        Self {
            factories: vec![Arc::new(NumericFactory), Arc::new(AlphaFactory)],
        }
    }
}

impl fmt::Debug for GeneratorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorRegistry").field("generators", &self.names()).finish()
    }
}

impl GeneratorRegistry {
    /// Registry without any generators.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            factories: Vec::new(),
        }
    }

    /// Add a factory after the existing ones.
    pub fn register(&mut self, factory: Arc<dyn GeneratorFactory>) {
        self.factories.push(factory);
    }

    /// Names of all registered generators.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.factories.iter().map(|f| f.name()).collect()
    }

    /// Find the factory for a `*NAME` token.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&Arc<dyn GeneratorFactory>> {
        self.factories.iter().find(|f| f.name() == name)
    }

    /// Find the first factory whose alphabet contains both range literals.
    #[must_use]
    pub fn find_for_range(&self, start: &str, end: &str) -> Option<&Arc<dyn GeneratorFactory>> {
        self.factories.iter().find(|f| f.matches_range(start, end))
    }
}
