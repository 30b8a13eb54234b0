//! AI commands.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{open_gateway, shutdown};
use crate::gateway::{BackendKind, CallOptions, ExtractMode};
use crate::utils::image;

/// Options shared by every AI command.
#[derive(Args, Debug)]
pub struct CallArgs {
    /// Serves the call from this backend (legacy-predict, chat-sdk, keyed-rest).
    #[arg(long)]
    pub backend: Option<BackendKind>,

    /// Overall deadline in seconds; the per-operation budget still applies.
    #[arg(long, value_name = "SECS")]
    pub deadline: Option<u64>,

    /// User id forwarded into prompts.
    #[arg(long, default_value = "cli")]
    pub user_id: String,
}

impl CallArgs {
    /// Builds call options, cancelling the call on Ctrl+C.
    fn options(&self) -> CallOptions {
        let token = CancellationToken::new();
        let on_interrupt = token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                on_interrupt.cancel();
            }
        });

        let mut options = CallOptions::new().cancel_token(token);
        if let Some(kind) = self.backend {
            options = options.backend(kind);
        }
        if let Some(secs) = self.deadline {
            options = options.deadline(Instant::now() + Duration::from_secs(secs));
        }
        options
    }
}

/// Asks a text question.
#[derive(Parser)]
pub struct AskCommand {
    /// The question.
    pub question: String,

    #[command(flatten)]
    pub call: CallArgs,
}

impl AskCommand {
    /// Executes the ask command.
    pub async fn execute(self) -> Result<()> {
        let gateway = open_gateway()?;
        let result = gateway
            .call_with(self.call.options())
            .ask(&self.question, &self.call.user_id)
            .await;
        shutdown(gateway);

        let answer = result.context("Question failed")?;
        println!("{answer}");
        Ok(())
    }
}

/// Extracts or analyzes the text in an image.
#[derive(Parser)]
pub struct OcrCommand {
    /// Image file path or http(s) URL.
    pub image: String,

    /// What to do with the text (text, translate, summarize, analyze).
    #[arg(long, default_value = "text")]
    pub mode: ExtractMode,

    /// Asks this question about the image instead of extracting text.
    #[arg(long, conflicts_with = "mode")]
    pub question: Option<String>,

    #[command(flatten)]
    pub call: CallArgs,
}

impl OcrCommand {
    /// Executes the ocr command.
    pub async fn execute(self) -> Result<()> {
        let loaded = image::load(&self.image).await?;
        debug!(mime_type = %loaded.mime_type, size = loaded.bytes.len(), "Image ready");

        let gateway = open_gateway()?;
        let call = gateway.call_with(self.call.options());
        let result = match &self.question {
            Some(question) => {
                call.ask_about_image(question, &loaded.bytes, &loaded.mime_type, &self.call.user_id)
                    .await
            }
            None => {
                call.extract(&loaded.bytes, &loaded.mime_type, self.mode, &self.call.user_id)
                    .await
            }
        };
        drop(call);
        shutdown(gateway);

        let text = result.context("Image analysis failed")?;
        println!("{text}");
        Ok(())
    }
}

/// Generates an image from a description.
#[derive(Parser)]
pub struct ImagineCommand {
    /// Description of the image.
    pub prompt: String,

    /// Output file.
    #[arg(short, long, default_value = "image.png")]
    pub output: PathBuf,

    #[command(flatten)]
    pub call: CallArgs,
}

impl ImagineCommand {
    /// Executes the imagine command.
    pub async fn execute(self) -> Result<()> {
        let gateway = open_gateway()?;
        let result = gateway
            .call_with(self.call.options())
            .generate_image(&self.prompt, &self.call.user_id)
            .await;
        shutdown(gateway);

        let bytes = result.context("Image generation failed")?;
        fs::write(&self.output, &bytes)
            .with_context(|| format!("Failed to write {}", self.output.display()))?;
        eprintln!("Wrote {} bytes to {}", bytes.len(), self.output.display());
        Ok(())
    }
}
