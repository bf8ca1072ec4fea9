//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Omniroute: route customer-service queries across domain databases.
///
/// A CLI front end for the orchestration pipeline: parses a query,
/// asks for missing identifiers, plans and executes per-domain SQL,
/// and prints a synthesized answer.
#[derive(Parser, Debug)]
#[command(name = "omniroute")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Directory holding the four domain database files.
    ///
    /// Defaults to `db/` in the current directory.
    #[arg(short, long, env = "OMNI_DB_DIR")]
    pub db_dir: Option<PathBuf>,

    /// Directory for JSONL audit logs. Audit is disabled when unset.
    #[arg(long, env = "OMNI_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Comma-separated model fallback chain (OpenRouter slugs).
    #[arg(long, env = "OMNI_MODELS", value_delimiter = ',')]
    pub models: Option<Vec<String>>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Process one query end to end and print the response.
    #[command(after_help = r#"Examples:
  omniroute ask "Where is order 4?"
  omniroute ask "I'm a premium user, show my last order"   # asks for email
  omniroute --format json ask "refund for order 3" | jq '.response'
  OPENROUTER_API_KEY=sk-... omniroute ask "any open tickets for user 1?"
"#)]
    Ask {
        /// The customer-service query.
        query: String,
    },

    /// Interactive loop: read queries until "exit" or EOF.
    #[command(after_help = r#"Examples:
  omniroute repl
  omniroute --db-dir ./fixtures repl --verbose
"#)]
    Repl,

    /// Print the introspected schema of one domain's database.
    #[command(after_help = r#"Examples:
  omniroute schema ShopCore
  omniroute schema CareDesk
"#)]
    Schema {
        /// Domain name (ShopCore, ShipStream, PayGuard, CareDesk).
        domain: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_models_value_delimiter() {
        let cli = Cli::parse_from([
            "omniroute",
            "--models",
            "a/b:free,c/d:free",
            "ask",
            "test",
        ]);
        assert_eq!(
            cli.models,
            Some(vec!["a/b:free".to_string(), "c/d:free".to_string()])
        );
    }
}
