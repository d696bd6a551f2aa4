//! Resolve a single dimension string, one value per line.
//!
//! ```bash
//! bulkgen dimension "A-C,X"
//! bulkgen dimension "*NUMERIC(start=10,step=5)" --count 3
//! ```

use anyhow::{Context, Result};
use clap::Args;

use crate::dimensions::DimensionResolver;

/// Command to resolve a dimension string
#[derive(Args, Debug)]
pub struct DimensionCommand {
    /// Dimension string, e.g. `*NUMERIC(count=5)` or `A-F,Z`
    spec: String,

    /// Count bounding unbounded tokens and the total
    #[arg(long)]
    count: Option<usize>,
}

impl DimensionCommand {
    pub async fn execute(self) -> Result<()> {
        print!("{}", self.run()?);
        Ok(())
    }

    /// Resolved values joined by newlines.
    pub fn run(&self) -> Result<String> {
        let values = DimensionResolver::default()
            .resolve(&self.spec, self.count)
            .with_context(|| format!("Failed to resolve dimension '{}'", self.spec))?;
        Ok(values.iter().map(|value| format!("{value}\n")).collect())
    }
}
