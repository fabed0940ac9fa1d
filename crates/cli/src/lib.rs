pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "resin",
    about = "Resin operator CLI",
    long_about = "Inspect Resin configuration, check Salesforce readiness, and preview the SOQL that donor criteria and questions classify into.",
    after_help = "Examples:\n  resin doctor --json\n  resin segment \"major donors over $10k\"\n  resin ask \"top 5 donors this year\"\n  resin templates --name lapsed_donors"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, OAuth readiness, and the template catalog")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Classify natural language donor criteria into a segment and its SOQL")]
    Segment {
        criteria: String,
        #[arg(long, default_value_t = 25, help = "Row limit, clamped to 1..=100")]
        limit: i64,
    },
    #[command(about = "Translate a fundraising question into SOQL")]
    Ask {
        question: String,
        #[arg(long, default_value_t = 25, help = "Row limit, clamped to 1..=100")]
        limit: i64,
    },
    #[command(about = "List query templates, or render one with its defaults")]
    Templates {
        #[arg(long, help = "Template name, e.g. lapsed_donors")]
        name: Option<String>,
        #[arg(long, default_value_t = 25, help = "Row limit, clamped to 1..=100")]
        limit: i64,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => commands::config::run(),
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Segment { criteria, limit } => commands::segment::run(&criteria, limit),
        Command::Ask { question, limit } => commands::ask::run(&question, limit),
        Command::Templates { name, limit } => commands::templates::run(name.as_deref(), limit),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
