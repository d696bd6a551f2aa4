//! Dimension specifications and their resolution into token sequences.
//!
//! A dimension is one axis of a naming pattern. It is written as a comma
//! separated list of tokens, each optionally followed by `(key=value,...)`
//! settings:
//!
//! | Token           | Kind                       | Yields                                |
//! |-----------------|----------------------------|---------------------------------------|
//! | `Shelf`         | [`TokenKind::Word`]        | the literal, once                     |
//! | `*NUMERIC(...)` | [`TokenKind::Infinity`]    | a slice of a named generator          |
//! | `A-F(step=2)`   | [`TokenKind::Range`]       | the endpoints and everything between  |
//!
//! Tokens are resolved left to right and their values concatenated. When the
//! node supplies a positional count for the dimension, resolution stops as
//! soon as that many values were produced.
//!
//! # Examples
//!
//! ```rust,no_run
//! use bulkgen_cli::dimensions::DimensionResolver;
//!
//! let resolver = DimensionResolver::default();
//! let values = resolver.resolve("0-2,hello,world", Some(4))?;
//! assert_eq!(values, vec!["0", "1", "2", "hello"]);
//! # Ok::<(), bulkgen_cli::core::BulkError>(())
//! ```

use indexmap::IndexMap;
use regex::Regex;
use std::sync::OnceLock;
use tracing::trace;

use crate::core::{BulkError, Result};
use crate::generators::{Generator, GeneratorRegistry, GeneratorSpec, TokenKind, invalid_setting};

fn token_regex() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN.get_or_init(|| {
        Regex::new(r"(?:(?:(\w+)-(\w+))|(\*?\w+))(?:\((.*?)\))?(?:,|$)")
            .expect("dimension token pattern is valid")
    })
}

fn setting_regex() -> &'static Regex {
    static SETTING: OnceLock<Regex> = OnceLock::new();
    SETTING.get_or_init(|| {
        Regex::new(r"([A-Za-z_]+?)=([^=]+)(?:,|$)").expect("dimension setting pattern is valid")
    })
}

/// One parsed token of a dimension string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionToken {
    /// Kind of the token
    pub kind: TokenKind,
    /// Generator name for `*NAME`, the literal for words, start literal for ranges
    pub value: String,
    /// End literal, only set for ranges
    pub end: Option<String>,
    /// Raw settings in declaration order
    pub settings: IndexMap<String, String>,
    /// The token as written (without the separating comma)
    pub raw: String,
}

impl DimensionToken {
    /// Range endpoints, `None` unless this is a range token.
    #[must_use]
    pub fn range(&self) -> Option<(&str, &str)> {
        self.end.as_deref().map(|end| (self.value.as_str(), end))
    }
}

/// Split a dimension string into its tokens.
///
/// Characters that belong to no token are skipped. An empty string yields
/// no tokens at all.
#[must_use]
pub fn parse_dimension(dimension: &str) -> Vec<DimensionToken> {
    token_regex()
        .captures_iter(dimension)
        .filter_map(|caps| {
            let raw = caps.get(0)?.as_str().trim_end_matches(',').to_string();

            let settings = caps
                .get(4)
                .map(|group| {
                    setting_regex()
                        .captures_iter(group.as_str())
                        .filter_map(|s| Some((s.get(1)?.as_str().to_string(), s.get(2)?.as_str().to_string())))
                        .collect()
                })
                .unwrap_or_default();

            if let Some(name) = caps.get(3) {
                let name = name.as_str();
                let (kind, value) = match name.strip_prefix('*') {
                    Some(generator) => (TokenKind::Infinity, generator),
                    None => (TokenKind::Word, name),
                };
                return Some(DimensionToken {
                    kind,
                    value: value.to_string(),
                    end: None,
                    settings,
                    raw,
                });
            }

            Some(DimensionToken {
                kind: TokenKind::Range,
                value: caps.get(1)?.as_str().to_string(),
                end: Some(caps.get(2)?.as_str().to_string()),
                settings,
                raw,
            })
        })
        .collect()
}

/// A token bound to its generator and slice, ready to produce values
struct ResolvedToken {
    token: DimensionToken,
    /// Either a generator or the literal of a word token
    source: TokenSource,
    start: usize,
    /// Exclusive end index, `None` when unbounded
    end: Option<usize>,
    step: usize,
}

enum TokenSource {
    Word(String),
    Generator(Box<dyn Generator>),
}

impl ResolvedToken {
    fn values(&self, start: usize, end: Option<usize>) -> Vec<String> {
        match &self.source {
            TokenSource::Word(word) => {
                if start == 0 && end.is_none_or(|end| end > 0) {
                    vec![word.clone()]
                } else {
                    Vec::new()
                }
            }
            TokenSource::Generator(generator) => {
                let indices = (start..end.unwrap_or(usize::MAX)).step_by(self.step);
                indices.map(|index| generator.token_at(index)).collect()
            }
        }
    }

    /// Number of values [`ResolvedToken::values`] yields for the same slice.
    fn len(&self, start: usize, end: Option<usize>) -> usize {
        match &self.source {
            TokenSource::Word(_) => usize::from(start == 0 && end.is_none_or(|end| end > 0)),
            TokenSource::Generator(_) => end.unwrap_or(usize::MAX).saturating_sub(start).div_ceil(self.step),
        }
    }
}

/// A resolved token with the exclusive end it is cut at
struct Slice {
    token: ResolvedToken,
    end: Option<usize>,
}

/// Resolves dimension strings against a set of generators
#[derive(Debug, Clone, Default)]
pub struct DimensionResolver {
    registry: GeneratorRegistry,
}

impl DimensionResolver {
    /// Create a resolver using the given generators.
    #[must_use]
    pub fn new(registry: GeneratorRegistry) -> Self {
        Self {
            registry,
        }
    }

    /// Generators known to this resolver.
    #[must_use]
    pub fn registry(&self) -> &GeneratorRegistry {
        &self.registry
    }

    /// Resolve a dimension string into its ordered values.
    ///
    /// `count` is the node's positional count for this dimension. It bounds
    /// unbounded tokens and truncates the overall result.
    ///
    /// # Errors
    ///
    /// - [`BulkError::UnknownDimensionGenerator`] for `*NAME` with an unknown name
    /// - [`BulkError::DimensionTypeMismatch`] for ranges no generator accepts
    /// - [`BulkError::InvalidDimensionSetting`] for unusable settings
    /// - [`BulkError::MissingCount`] for unbounded tokens without a count
    pub fn resolve(&self, dimension: &str, count: Option<usize>) -> Result<Vec<String>> {
        let mut values: Vec<String> = Vec::new();
        for slice in self.slices(dimension, count)? {
            values.extend(slice.token.values(slice.token.start, slice.end));
        }

        trace!("Resolved dimension '{}' into {} values", dimension, values.len());
        Ok(values)
    }

    /// Number of values [`DimensionResolver::resolve`] would produce.
    ///
    /// Nothing is generated, so this is cheap even for very long dimensions.
    ///
    /// # Errors
    ///
    /// The same errors as [`DimensionResolver::resolve`].
    pub fn resolved_len(&self, dimension: &str, count: Option<usize>) -> Result<usize> {
        let slices = self.slices(dimension, count)?;
        Ok(slices.iter().fold(0usize, |total, slice| total.saturating_add(slice.token.len(slice.token.start, slice.end))))
    }

    /// Cut every token of `dimension` so that together they yield at most `count` values.
    fn slices(&self, dimension: &str, count: Option<usize>) -> Result<Vec<Slice>> {
        let tokens = parse_dimension(dimension);
        let resolved = tokens.into_iter().map(|token| self.resolve_token(token)).collect::<Result<Vec<_>>>()?;

        let mut slices = Vec::with_capacity(resolved.len());
        let mut taken = 0usize;
        for token in resolved {
            let bounded = token.end.is_some();
            if count.is_none() && !bounded {
                return Err(BulkError::MissingCount {
                    token: token.token.raw.clone(),
                });
            }

            let mut end = token.end;
            if let Some(count) = count {
                let remaining = count.saturating_sub(taken);
                if remaining == 0 {
                    break;
                }
                let limit = token.start.saturating_add(remaining.saturating_mul(token.step));
                end = Some(end.map_or(limit, |end| end.min(limit)));
            }

            taken = taken.saturating_add(token.len(token.start, end));
            slices.push(Slice {
                token,
                end,
            });
        }
        Ok(slices)
    }

    fn resolve_token(&self, token: DimensionToken) -> Result<ResolvedToken> {
        if token.kind == TokenKind::Word {
            return Ok(ResolvedToken {
                source: TokenSource::Word(token.value.clone()),
                token,
                start: 0,
                end: Some(1),
                step: 1,
            });
        }

        let factory = match token.range() {
            Some((start, end)) => {
                self.registry.find_for_range(start, end).ok_or_else(|| BulkError::DimensionTypeMismatch {
                    token: token.raw.clone(),
                    start: start.to_string(),
                    end: end.to_string(),
                })?
            }
            None => self.registry.find_by_name(&token.value).ok_or_else(|| {
                BulkError::UnknownDimensionGenerator {
                    token: token.raw.clone(),
                }
            })?,
        };

        let generator = factory.create(&GeneratorSpec {
            kind: token.kind,
            token: &token.raw,
            range: token.range(),
            settings: &token.settings,
        })?;

        let index_of = |key: &str, literal: &str| {
            generator.index_of(literal).ok_or_else(|| {
                invalid_setting(&token.raw, key, literal, &format!("not a {} value", factory.name()))
            })
        };

        let end_after = |literal: &str| {
            index_of("end", literal)?
                .checked_add(1)
                .ok_or_else(|| invalid_setting(&token.raw, "end", literal, "value is too large"))
        };

        // end indices are exclusive from here on
        let settings = generator.settings();
        let (start, end) = match token.range() {
            Some((start, end)) => (index_of("start", start)?, Some(end_after(end)?)),
            None => {
                let start = match &settings.start {
                    Some(start) => index_of("start", start)?,
                    None => 0,
                };
                let end = match (settings.count, &settings.end) {
                    (Some(count), _) => Some(start.saturating_add(count)),
                    (None, Some(end)) => Some(end_after(end)?),
                    (None, None) => None,
                };
                (start, end)
            }
        };

        let step = settings.step;
        Ok(ResolvedToken {
            source: TokenSource::Generator(generator),
            token,
            start,
            end,
            step,
        })
    }
}
