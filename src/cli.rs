//! CLI interface for genai-gateway.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::warn;

use crate::gateway::{Gateway, GatewayConfig};

pub mod ai;
pub mod config;

/// genai-gateway: one front end for several generative AI backends.
#[derive(Parser)]
#[command(name = "genai-gateway")]
#[command(about = "Ask questions, read images and generate pictures through Google AI backends", long_about = None)]
#[command(version)]
pub struct Cli {
    /// The main command to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Main commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Asks a text question.
    Ask(ai::AskCommand),
    /// Extracts or analyzes the text in an image.
    Ocr(ai::OcrCommand),
    /// Generates an image from a description.
    Imagine(ai::ImagineCommand),
    /// Shows which backends are configured and what they serve.
    Backends(config::BackendsCommand),
}

impl Cli {
    /// Executes the CLI command.
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Ask(cmd) => cmd.execute().await,
            Commands::Ocr(cmd) => cmd.execute().await,
            Commands::Imagine(cmd) => cmd.execute().await,
            Commands::Backends(cmd) => cmd.execute(),
        }
    }
}

/// Loads configuration and builds every eligible backend.
pub(crate) fn open_gateway() -> Result<Gateway> {
    let config = GatewayConfig::from_env().context("Failed to load configuration")?;
    Gateway::from_config(&config).context("Failed to initialize AI gateway")
}

/// Closes the gateway; a failed close is reported but does not fail the command.
pub(crate) fn shutdown(gateway: Gateway) {
    if let Err(err) = gateway.close() {
        warn!(error = %err, "Gateway did not shut down cleanly");
    }
}
