//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};

use crate::cli::commands::{check::CheckArgs, completions::CompletionsArgs, serve::ServeArgs};

#[derive(Parser)]
#[command(name = "apival")]
#[command(author, version, about = "Check JSON payloads against YAML schemas")]
#[command(long_about = "Validate JSON payloads against JSON Schemas written in YAML, from the command line or through a small upload form.")]
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

    /// Enable verbose output (debug logging on stderr)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check JSON payloads against a YAML schema
    Check(CheckArgs),

    /// Serve the upload form
    Serve(ServeArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text with source-annotated diagnostics
    #[default]
    Auto,
    /// JSON format (for programming)
    Json,
}
