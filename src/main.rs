//! bulkgen CLI entry point
//!
//! Parses arguments, sets up logging and runs the selected command:
//! - `generate` - expand a schema into a tree of records
//! - `validate` - check a schema without expanding it
//! - `dimension` - resolve a dimension string
//! - `fields` - print the built-in field schemas

use anyhow::Result;
use bulkgen_cli::cli;
use bulkgen_cli::core::error::user_friendly_error;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let config = cli.build_config();
    config.init_logging();

    match cli.execute_with_config(config).await {
        Ok(()) => Ok(()),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
