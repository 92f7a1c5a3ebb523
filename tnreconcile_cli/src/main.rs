mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "tnreconcile")]
#[command(about = "Reconcile Tamil Nadu assembly constituency names across data sources")]
struct Cli {
    /// Output format: table, json, csv or markdown
    #[arg(long, default_value = "table", global = true)]
    output: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the comparison key, reservation and display name for raw names
    Normalize(commands::normalize::NormalizeArgs),
    /// Resolve every name in a CSV or GeoJSON source against the canonical list
    Resolve(Box<commands::resolve::ResolveArgs>),
    /// Print the effective alias table
    Aliases(commands::aliases::AliasesArgs),
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("tnreconcile=info".parse()?),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let format = OutputFormat::parse(&cli.output);

    match &cli.command {
        Commands::Normalize(args) => commands::normalize::run(args, &format)?,
        Commands::Resolve(args) => commands::resolve::run(args.as_ref(), &format)?,
        Commands::Aliases(args) => commands::aliases::run(args, &format)?,
    }

    Ok(())
}
