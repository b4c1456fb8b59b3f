use anyhow::{bail, Context, Result};
use jobquery::{
    cli::{Cli, Commands},
    config::Config,
    introspect::describe_schema,
    query::execute,
    schema::{get_table, table_names},
    seed::{define_all_tables, setup_joblist},
    translate::{ask, ChatClient},
    writer::load_table,
};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::resolve(cli.database)?;

    match cli.command {
        Commands::Setup => {
            let defined = define_all_tables(&config);
            println!("Defined tables: {}", defined.join(", "));

            let seeded = setup_joblist(&config).context("Failed to seed joblist")?;
            println!("Seeded {} jobs into {:?}", seeded, config.db_path());
        }

        Commands::Load { table, csv } => {
            let Some(schema) = get_table(&table) else {
                bail!("Unknown table: {} (expected one of {:?})", table, table_names());
            };

            let start = Instant::now();
            let count = load_table(&config, &csv, schema)
                .with_context(|| format!("Failed to load {:?} into {}", csv, table))?;
            println!(
                "Loaded {} rows into {} in {:.1}s",
                count,
                table,
                start.elapsed().as_secs_f64()
            );
        }

        Commands::Query { sql, json } => {
            let rows = execute(&config, &sql)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                println!("{}", rows);
            }
        }

        Commands::Schema => {
            let schema = describe_schema(&config)?;
            println!("{}", schema.to_json_pretty()?);
        }

        Commands::Ask {
            question,
            endpoint,
            model,
            api_key,
            json,
        } => {
            let client = ChatClient::new(endpoint, model, api_key)?;
            let answer = ask(&config, &client, &question)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&answer)?);
            } else {
                println!("{}\n", answer.query);
                println!("{}", answer.rows);
            }
        }

        Commands::ListTables => {
            println!("Available tables:\n");
            for name in table_names() {
                println!("  {}", name);
            }
        }
    }

    Ok(())
}
