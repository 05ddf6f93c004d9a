use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};

use crate::error::AppError;
use crate::infra::InMemoryConfigStore;
use crate::scoring::{ScoringService, TestLead};
use crate::server;

#[derive(Parser, Debug)]
#[command(
    name = "Lead Scoring Engine",
    about = "Run the lead scoring service or score leads from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Score a lead from a JSON file against the baseline configuration
    Score(ScoreArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Path to a JSON file holding one TestLead or an array of them
    #[arg(long)]
    pub(crate) lead: PathBuf,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Score(args) => run_score(args),
    }
}

fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let raw = fs::read_to_string(&args.lead)?;

    let leads: Vec<TestLead> = if raw.trim_start().starts_with('[') {
        serde_json::from_str(&raw)?
    } else {
        vec![serde_json::from_str(&raw)?]
    };

    let service = ScoringService::new(Arc::new(InMemoryConfigStore::default()));
    let results = service.batch_test(&leads)?;

    for entry in &results {
        println!("{}", serde_json::to_string_pretty(&entry.scoring)?);
    }
    Ok(())
}
