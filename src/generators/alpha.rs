//! Letter generator (`ALPHA`).
//!
//! Tokens are enumerated in bijective base 26: there is no zero letter, so
//! after `z` comes `aa`, after `az` comes `ba` and after `zz` comes `aaa`,
//! exactly like spreadsheet column names.

use super::{BaseSettings, Generator, GeneratorFactory, GeneratorSpec, TokenKind, invalid_setting};
use crate::core::Result;

const RADIX: usize = 26;

/// Letter casing of an [`AlphaGenerator`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Casing {
    #[default]
    Lower,
    Upper,
}

impl Casing {
    /// Casing of a literal: `None` if empty, not purely ASCII letters, or mixed.
    #[must_use]
    pub fn of(value: &str) -> Option<Self> {
        if value.is_empty() || !value.bytes().all(|b| b.is_ascii_alphabetic()) {
            return None;
        }
        if value.bytes().all(|b| b.is_ascii_lowercase()) {
            Some(Casing::Lower)
        } else if value.bytes().all(|b| b.is_ascii_uppercase()) {
            Some(Casing::Upper)
        } else {
            None
        }
    }

    fn first_letter(self) -> u8 {
        match self {
            Casing::Lower => b'a',
            Casing::Upper => b'A',
        }
    }
}

/// Yields `"a", ..., "z", "aa", "ab", ...` in the configured casing.
#[derive(Debug, Clone)]
pub struct AlphaGenerator {
    settings: BaseSettings,
    casing: Casing,
}

impl AlphaGenerator {
    /// Create a generator with the given settings and casing.
    #[must_use]
    pub fn new(settings: BaseSettings, casing: Casing) -> Self {
        Self {
            settings,
            casing,
        }
    }

    /// Casing this generator emits.
    #[must_use]
    pub fn casing(&self) -> Casing {
        self.casing
    }
}

/// One-based bijective value of a letter string; `""` is 0.
///
/// `value(x) = 1 + (last(x) - 'A') + 26 * value(x without last)`, computed on
/// the uppercased letters. Returns `None` on non-letters or overflow.
fn alpha_value(value: &str) -> Option<usize> {
    let Some(last) = value.bytes().last() else {
        return Some(0);
    };
    if !last.is_ascii_alphabetic() {
        return None;
    }
    let digit = 1 + usize::from(last.to_ascii_uppercase() - b'A');
    let rest = alpha_value(&value[..value.len() - 1])?;
    rest.checked_mul(RADIX)?.checked_add(digit)
}

impl Generator for AlphaGenerator {
    fn settings(&self) -> &BaseSettings {
        &self.settings
    }

    fn index_of(&self, value: &str) -> Option<usize> {
        alpha_value(value.trim())?.checked_sub(1)
    }

    fn token_at(&self, index: usize) -> String {
        let first = self.casing.first_letter();
        let mut letters = Vec::new();
        let mut n = index + 1;
        while n > 0 {
            n -= 1;
            letters.push(first + (n % RADIX) as u8);
            n /= RADIX;
        }
        letters.reverse();
        String::from_utf8(letters).unwrap_or_default()
    }
}

/// Factory for [`AlphaGenerator`]
///
/// Range tokens take their casing from the start literal; `*ALPHA` tokens use
/// the `casing` setting (`lower` by default).
#[derive(Debug, Clone, Copy, Default)]
pub struct AlphaFactory;

impl GeneratorFactory for AlphaFactory {
    fn name(&self) -> &'static str {
        "ALPHA"
    }

    fn matches_range(&self, start: &str, end: &str) -> bool {
        match (Casing::of(start), Casing::of(end)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    fn create(&self, spec: &GeneratorSpec<'_>) -> Result<Box<dyn Generator>> {
        let settings = BaseSettings::from_raw(spec.token, spec.settings)?;

        let casing = match (spec.kind, spec.range) {
            (TokenKind::Range, Some((start, _))) => Casing::of(start).unwrap_or_default(),
            _ => match spec.settings.get("casing").map(|c| c.trim()) {
                None => Casing::Lower,
                Some("lower") => Casing::Lower,
                Some("upper") => Casing::Upper,
                Some(other) => {
                    return Err(invalid_setting(
                        spec.token,
                        "casing",
                        other,
                        "expected 'lower' or 'upper'",
                    ));
                }
            },
        };

        Ok(Box::new(AlphaGenerator::new(settings, casing)))
    }
}
