use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::translate::{DEFAULT_ENDPOINT, DEFAULT_MODEL};

#[derive(Parser, Debug)]
#[command(name = "jobquery")]
#[command(version, about = "Query vessel maintenance jobs in SQLite, in SQL or plain English")]
pub struct Cli {
    /// SQLite database path (default: platform data dir, or $JOBQUERY_DATABASE)
    #[arg(short, long, global = true)]
    pub database: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create all tables and seed the job list
    Setup,

    /// Bulk-load a CSV file into makermodels or workorders
    Load {
        /// Target table
        table: String,

        /// CSV file whose header matches the table's columns
        csv: PathBuf,
    },

    /// Run a SQL statement and print the result
    Query {
        sql: String,

        /// Print rows as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the live schema as JSON
    Schema,

    /// Ask a question in plain English
    Ask {
        question: String,

        /// Chat completions endpoint
        #[arg(long, default_value = DEFAULT_ENDPOINT)]
        endpoint: String,

        /// Model name
        #[arg(long, default_value = DEFAULT_MODEL)]
        model: String,

        /// API key for the endpoint
        #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        /// Print rows as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the tables this tool knows how to create
    ListTables,
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_load() {
        let cli = Cli::parse_from(["jobquery", "--database", "/tmp/j.db", "load", "workorders", "wo.csv"]);
        assert_eq!(cli.database, Some(PathBuf::from("/tmp/j.db")));
        match cli.command {
            Commands::Load { table, csv } => {
                assert_eq!(table, "workorders");
                assert_eq!(csv, PathBuf::from("wo.csv"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["jobquery", "schema", "-v"]);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Schema));
    }
}
