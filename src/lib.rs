//! # genai-gateway
//!
//! A gateway over several Google generative AI backends.
//!
//! ## Features
//!
//! - Text questions, image text extraction and image generation behind one API
//! - Capability-based routing with graceful degradation
//! - Per-call time budgets, deadlines and cancellation
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use genai_gateway::{Gateway, GatewayConfig};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = GatewayConfig::from_env()?;
//! let gateway = Gateway::from_config(&config)?;
//! println!("{}", gateway.ask("What is Rust?", "user-1").await?);
//! gateway.close()?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod cli;
pub mod gateway;
pub mod utils;

pub use crate::cli::Cli;
pub use crate::gateway::{
    BackendKind, CallOptions, Capability, ExtractMode, Gateway, GatewayConfig, GatewayError,
};

/// The current version of genai-gateway.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
