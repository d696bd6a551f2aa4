//! Test utilities for bulkgen
//!
//! Shared by unit tests and the integration suite (through the `test-utils`
//! feature).

use serde_json::Value;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::generator::GeneratedNode;
use crate::materialize::Materializer;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. Uses `level` if given, otherwise
/// `RUST_LOG`; without either, logging stays off.
///
/// ```bash
/// RUST_LOG=bulkgen_cli=trace cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}

/// Names of a generated forest, depth first, as `parent/child` paths.
///
/// Nodes without a textual `name` field show as `?`.
#[must_use]
pub fn name_paths(nodes: &[GeneratedNode]) -> Vec<String> {
    fn walk(nodes: &[GeneratedNode], prefix: &str, out: &mut Vec<String>) {
        for node in nodes {
            let name = node.fields.get("name").and_then(Value::as_str).unwrap_or("?");
            let path = if prefix.is_empty() { name.to_string() } else { format!("{prefix}/{name}") };
            out.push(path.clone());
            walk(&node.children, &path, out);
        }
    }
    let mut out = Vec::new();
    walk(nodes, "", &mut out);
    out
}

/// Record stored by [`MemoryStore`]
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub id: usize,
    pub parent: Option<usize>,
    pub fields: serde_json::Map<String, Value>,
}

/// In-memory [`Materializer`] with transaction semantics
///
/// Records created inside a transaction are discarded on rollback. Creation
/// fails for a record whose `name` is listed in `fail_on`, commit fails while
/// `fail_commit` is set.
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub records: Vec<StoredRecord>,
    pub fail_on: Vec<String>,
    pub fail_commit: bool,
    pub committed: usize,
    pub rolled_back: usize,
    pub(crate) checkpoint: Option<usize>,
}

impl MemoryStore {
    /// Store that rejects records named `name`.
    #[must_use]
    pub fn failing_on(name: &str) -> Self {
        Self {
            fail_on: vec![name.to_string()],
            ..Self::default()
        }
    }
}

impl Materializer for MemoryStore {
    type Id = usize;
    type Error = String;

    fn begin(&mut self) -> Result<(), String> {
        self.checkpoint = Some(self.records.len());
        Ok(())
    }

    fn create(&mut self, fields: serde_json::Map<String, Value>, parent: Option<&usize>) -> Result<usize, String> {
        if let Some(name) = fields.get("name").and_then(Value::as_str).filter(|name| self.fail_on.iter().any(|f| f == name)) {
            return Err(format!("cannot store '{name}'"));
        }
        let id = self.records.len() + 1;
        self.records.push(StoredRecord {
            id,
            parent: parent.copied(),
            fields,
        });
        Ok(id)
    }

    fn commit(&mut self) -> Result<(), String> {
        if self.fail_commit {
            return Err("commit rejected".to_string());
        }
        self.checkpoint = None;
        self.committed += 1;
        Ok(())
    }

    fn rollback(&mut self) {
        if let Some(len) = self.checkpoint.take() {
            self.records.truncate(len);
        }
        self.rolled_back += 1;
    }
}
