//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    campaign::CampaignCommands, completions::CompletionsArgs, init::InitArgs, seed::SeedArgs,
    serve::ServeArgs, status::StatusArgs, sup::SupCommands, token::TokenCommands,
};

#[derive(Parser)]
#[command(name = "sect")]
#[command(author, version, about = "Supplier Engagement Control Tower")]
#[command(long_about = "Supplier Engagement Control Tower.\n\nTrack supplier engagement for IMDS material data and PCF carbon footprints: \
run the HTTP API, issue supplier portal tokens and inspect campaigns from the terminal.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Workspace root (default: auto-detect by finding .sect/)
    #[arg(long, global = true)]
    pub workspace: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new SECT workspace
    Init(InitArgs),

    /// Run the HTTP API
    Serve(ServeArgs),

    /// Load the demo dataset
    Seed(SeedArgs),

    /// Supplier management
    #[command(subcommand)]
    Sup(SupCommands),

    /// Engagement campaigns
    #[command(subcommand)]
    Campaign(CampaignCommands),

    /// Supplier portal access tokens
    #[command(subcommand)]
    Token(TokenCommands),

    /// Show the engagement dashboard
    Status(StatusArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Automatically detect based on context (yaml for show, tsv for list)
    #[default]
    Auto,
    /// YAML format (full fidelity)
    Yaml,
    /// Tab-separated values (for piping)
    Tsv,
    /// JSON format (for programming)
    Json,
    /// CSV format (for spreadsheets)
    Csv,
    /// Markdown tables
    Md,
    /// Just IDs, one per line
    Id,
}
