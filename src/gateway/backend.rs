//! Backend adapter trait and shared helpers.

pub mod chat_sdk;
pub mod generate_content;
pub mod keyed_rest;
pub mod legacy_predict;

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use super::capability::{BackendKind, Capability};
use super::error::AdapterError;
use super::prompts::ExtractMode;

pub use chat_sdk::ChatSdkBackend;
pub use keyed_rest::KeyedRestBackend;
pub use legacy_predict::LegacyPredictBackend;

/// Upper bound on a single HTTP exchange.
///
/// The facade enforces the tighter per-capability budget; this only keeps a
/// stuck socket from outliving the process-wide expectations.
pub(crate) const HTTP_TIMEOUT: Duration = Duration::from_secs(120);

/// Connection establishment timeout.
pub(crate) const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Boxed future returned by every adapter operation.
pub type BackendFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, AdapterError>> + Send + 'a>>;

/// Adapter translating the gateway contract into one provider protocol.
///
/// Operations a kind does not implement keep the default body, which fails
/// with [`AdapterError::Unsupported`].
pub trait Backend: Send + Sync {
    /// Protocol this adapter speaks.
    fn kind(&self) -> BackendKind;

    /// Sends a single-turn question.
    fn ask<'a>(&'a self, question: &'a str, user_id: &'a str) -> BackendFuture<'a, String>;

    /// Extracts or analyzes the text in an image.
    fn extract<'a>(
        &'a self,
        _image: &'a [u8],
        _mime_type: &'a str,
        _mode: ExtractMode,
        _user_id: &'a str,
    ) -> BackendFuture<'a, String> {
        unsupported(Capability::ImageExtract)
    }

    /// Answers a free-form question about an image.
    fn ask_about_image<'a>(
        &'a self,
        _question: &'a str,
        _image: &'a [u8],
        _mime_type: &'a str,
        _user_id: &'a str,
    ) -> BackendFuture<'a, String> {
        unsupported(Capability::ImageExtract)
    }

    /// Generates an image and returns its encoded bytes.
    fn generate_image<'a>(
        &'a self,
        _prompt: &'a str,
        _user_id: &'a str,
    ) -> BackendFuture<'a, Vec<u8>> {
        unsupported(Capability::ImageGenerate)
    }

    /// Returns the closable view of adapters that own a network handle.
    fn as_closable(&mut self) -> Option<&mut dyn Closable> {
        None
    }
}

/// Marker for adapters holding a handle that must be released explicitly.
pub trait Closable {
    /// Releases the handle. A second call fails with [`AdapterError::Closed`].
    fn close(&mut self) -> Result<(), AdapterError>;
}

fn unsupported<'a, T: 'a>(capability: Capability) -> BackendFuture<'a, T> {
    Box::pin(async move { Err(AdapterError::Unsupported(capability)) })
}

/// Builds an HTTP client with the standard timeouts.
pub(crate) fn build_http_client() -> Result<Client, AdapterError> {
    Client::builder()
        .timeout(HTTP_TIMEOUT)
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .map_err(|e| AdapterError::Network(format!("failed to build HTTP client: {e}")))
}

/// Strips a trailing slash so paths can be appended with `/`.
pub(crate) fn trim_base_url(base_url: &str) -> &str {
    base_url.trim_end_matches('/')
}

/// Logs successful text extraction from a provider response.
pub(crate) fn log_response_success(backend: BackendKind, result: &Result<String, AdapterError>) {
    if let Ok(text) = result {
        debug!(
            backend = %backend,
            response_len = text.len(),
            "Extracted text content from provider response"
        );
    }
}
