pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "mandi",
    about = "Mandi discovery operator CLI",
    long_about = "Operate the mandi discovery service: migrations, demo fixtures, config \
                  inspection, readiness checks, and ad-hoc discovery queries.",
    after_help = "Examples:\n  mandi doctor --json\n  mandi seed\n  mandi trending --category Spices --limit 5\n  mandi similar prod-pepper-001"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load and verify the deterministic demo catalog fixtures")]
    Seed,
    #[command(
        about = "Inspect effective configuration values with secrets redacted"
    )]
    Config,
    #[command(about = "Validate config, database connectivity, and delegate reachability")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "List trending products, optionally filtered by state and category")]
    Trending {
        #[arg(long, help = "Filter by supplier state")]
        state: Option<String>,
        #[arg(long, help = "Filter by product category")]
        category: Option<String>,
        #[arg(long, help = "Maximum number of results")]
        limit: Option<i64>,
    },
    #[command(about = "List products similar to a reference product")]
    Similar {
        #[arg(help = "Reference product id")]
        product_id: String,
        #[arg(long, help = "Maximum number of results")]
        limit: Option<i64>,
    },
    #[command(about = "Fetch personalized recommendations through the delegate")]
    Recommend {
        #[arg(help = "User id to personalize for")]
        user_id: String,
        #[arg(long, help = "Filter by product category")]
        category: Option<String>,
        #[arg(long, help = "Maximum number of results")]
        limit: Option<i64>,
    },
    #[command(about = "Text-search the catalog over names, descriptions, and tags")]
    Search {
        #[arg(help = "Search phrase")]
        query: String,
        #[arg(long, help = "Maximum number of results")]
        limit: Option<i64>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::Trending { state, category, limit } => {
            commands::query::trending(state, category, limit)
        }
        Command::Similar { product_id, limit } => commands::query::similar(product_id, limit),
        Command::Recommend { user_id, category, limit } => {
            commands::query::recommend(user_id, category, limit)
        }
        Command::Search { query, limit } => commands::query::search(query, limit),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
