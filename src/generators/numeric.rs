//! Decimal number generator (`NUMERIC`).

use super::{BaseSettings, Generator, GeneratorFactory, GeneratorSpec, TokenKind};
use crate::core::Result;

/// `*NUMERIC` tokens count from 1 unless `start` says otherwise.
const DEFAULT_START: &str = "1";

/// Yields `"0", "1", "2", ...`; a token's index is its integer value.
#[derive(Debug, Clone)]
pub struct NumericGenerator {
    settings: BaseSettings,
}

impl NumericGenerator {
    /// Create a generator with the given settings.
    #[must_use]
    pub fn new(settings: BaseSettings) -> Self {
        Self {
            settings,
        }
    }
}

impl Generator for NumericGenerator {
    fn settings(&self) -> &BaseSettings {
        &self.settings
    }

    fn index_of(&self, value: &str) -> Option<usize> {
        let value = value.trim();
        if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        value.parse().ok()
    }

    fn token_at(&self, index: usize) -> String {
        index.to_string()
    }
}

/// Factory for [`NumericGenerator`]
#[derive(Debug, Clone, Copy, Default)]
pub struct NumericFactory;

impl GeneratorFactory for NumericFactory {
    fn name(&self) -> &'static str {
        "NUMERIC"
    }

    fn matches_range(&self, start: &str, end: &str) -> bool {
        let is_number = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
        is_number(start) && is_number(end)
    }

    fn create(&self, spec: &GeneratorSpec<'_>) -> Result<Box<dyn Generator>> {
        let mut settings = BaseSettings::from_raw(spec.token, spec.settings)?;
        if spec.kind == TokenKind::Infinity && settings.start.is_none() {
            settings.start = Some(DEFAULT_START.to_string());
        }
        Ok(Box::new(NumericGenerator::new(settings)))
    }
}
