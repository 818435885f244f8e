//! CLI entry points

pub mod serve;

use clap::{Parser, Subcommand};

/// LLM Relay - caching reverse proxy for generative AI providers
#[derive(Parser)]
#[command(name = "llm-relay")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the relay server
    Serve,
}
