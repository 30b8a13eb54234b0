//! Caller-facing gateway.
//!
//! Routes each call to a backend from the static capability table, bounds
//! it by the capability budget and normalizes adapter failures.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::backend::{Backend, BackendFuture};
use super::bundle::ServiceBundle;
use super::capability::{BackendKind, Capability};
use super::config::{Budgets, GatewayConfig};
use super::error::{AdapterError, GatewayError};
use super::factory;
use super::prompts::ExtractMode;

/// Per-call routing and cancellation controls.
#[derive(Clone, Debug, Default)]
pub struct CallOptions {
    backend: Option<BackendKind>,
    deadline: Option<Instant>,
    cancel: Option<CancellationToken>,
}

impl CallOptions {
    /// Options with no override.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves the call from `backend` instead of the route order.
    pub fn backend(mut self, backend: BackendKind) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Caller deadline; the effective limit is the sooner of this and the
    /// capability budget.
    pub fn deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Aborts the in-flight call when `token` is cancelled.
    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// The gateway facade.
#[derive(Debug)]
pub struct Gateway {
    bundle: ServiceBundle,
    budgets: Budgets,
}

impl Gateway {
    /// Wraps an existing bundle.
    pub fn new(bundle: ServiceBundle, budgets: Budgets) -> Self {
        info!(
            available = ?bundle.available(),
            primary = %bundle.primary_backend(),
            "AI gateway ready"
        );
        Self { bundle, budgets }
    }

    /// Builds every eligible backend from `config`.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let bundle = factory::create_services(config)?;
        Ok(Self::new(bundle, config.budgets))
    }

    /// Constructed adapters and diagnostics.
    pub fn bundle(&self) -> &ServiceBundle {
        &self.bundle
    }

    /// Backend advertised as primary. Display only.
    pub fn primary_backend(&self) -> BackendKind {
        self.bundle.primary_backend()
    }

    /// Starts a call with per-call options.
    pub fn call_with(&self, options: CallOptions) -> GatewayCall<'_> {
        GatewayCall {
            gateway: self,
            options,
        }
    }

    /// Answers a single-turn text question.
    pub async fn ask(&self, question: &str, user_id: &str) -> Result<String, GatewayError> {
        self.call_with(CallOptions::default())
            .ask(question, user_id)
            .await
    }

    /// Extracts or analyzes text in an image.
    pub async fn extract(
        &self,
        image: &[u8],
        mime_type: &str,
        mode: ExtractMode,
        user_id: &str,
    ) -> Result<String, GatewayError> {
        self.call_with(CallOptions::default())
            .extract(image, mime_type, mode, user_id)
            .await
    }

    /// Answers a question about an image.
    pub async fn ask_about_image(
        &self,
        question: &str,
        image: &[u8],
        mime_type: &str,
        user_id: &str,
    ) -> Result<String, GatewayError> {
        self.call_with(CallOptions::default())
            .ask_about_image(question, image, mime_type, user_id)
            .await
    }

    /// Generates an image from a text prompt.
    pub async fn generate_image(&self, prompt: &str, user_id: &str) -> Result<Vec<u8>, GatewayError> {
        self.call_with(CallOptions::default())
            .generate_image(prompt, user_id)
            .await
    }

    /// Releases network handles. Call once, after in-flight calls finish.
    pub fn close(self) -> Result<(), GatewayError> {
        info!("Shutting down AI gateway");
        self.bundle.close()
    }

    fn select(
        &self,
        capability: Capability,
        requested: Option<BackendKind>,
    ) -> Result<&dyn Backend, GatewayError> {
        let unavailable = GatewayError::CapabilityUnavailable { capability };
        let kind = match requested {
            Some(kind) if kind.supports(capability) => kind,
            Some(kind) => {
                debug!(backend = %kind, %capability, "Requested backend cannot serve capability");
                return Err(unavailable);
            }
            None => capability
                .route()
                .iter()
                .copied()
                .find(|kind| self.bundle.has(*kind))
                .ok_or(unavailable)?,
        };
        self.bundle
            .get(kind)
            .ok_or(GatewayError::CapabilityUnavailable { capability })
    }

    async fn run<'a, T>(
        &'a self,
        capability: Capability,
        options: &CallOptions,
        call: impl FnOnce(&'a dyn Backend) -> BackendFuture<'a, T>,
    ) -> Result<T, GatewayError> {
        let backend = self.select(capability, options.backend)?;
        let kind = backend.kind();
        let limit = effective_limit(self.budgets.for_capability(capability), options.deadline);
        let timed_out = || GatewayError::Timeout {
            backend: kind,
            capability,
            budget: limit,
        };
        debug!(backend = %kind, %capability, limit_ms = limit.as_millis(), "Routing call");

        let bounded = tokio::time::timeout(limit, call(backend));
        let outcome = match &options.cancel {
            Some(token) => tokio::select! {
                biased;
                () = token.cancelled() => {
                    warn!(backend = %kind, %capability, "Call cancelled by caller");
                    return Err(timed_out());
                }
                outcome = bounded => outcome,
            },
            None => bounded.await,
        };

        match outcome {
            Ok(Ok(value)) => Ok(value),
            // The HTTP client's own timeout can fire before a longer budget.
            Ok(Err(AdapterError::TimedOut(detail))) => {
                warn!(backend = %kind, %capability, %detail, "Backend request timed out");
                Err(timed_out())
            }
            Ok(Err(err)) => {
                warn!(backend = %kind, %capability, error = %err, "Backend call failed");
                Err(GatewayError::from_adapter(kind, err))
            }
            Err(_) => {
                warn!(backend = %kind, %capability, limit_ms = limit.as_millis(), "Backend call timed out");
                Err(timed_out())
            }
        }
    }
}

fn effective_limit(budget: Duration, deadline: Option<Instant>) -> Duration {
    match deadline {
        Some(deadline) => budget.min(deadline.saturating_duration_since(Instant::now())),
        None => budget,
    }
}

/// A gateway call carrying [`CallOptions`].
pub struct GatewayCall<'g> {
    gateway: &'g Gateway,
    options: CallOptions,
}

impl GatewayCall<'_> {
    /// See [`Gateway::ask`].
    pub async fn ask(&self, question: &str, user_id: &str) -> Result<String, GatewayError> {
        self.gateway
            .run(Capability::TextAsk, &self.options, |backend| {
                backend.ask(question, user_id)
            })
            .await
    }

    /// See [`Gateway::extract`].
    pub async fn extract(
        &self,
        image: &[u8],
        mime_type: &str,
        mode: ExtractMode,
        user_id: &str,
    ) -> Result<String, GatewayError> {
        self.gateway
            .run(Capability::ImageExtract, &self.options, |backend| {
                backend.extract(image, mime_type, mode, user_id)
            })
            .await
    }

    /// See [`Gateway::ask_about_image`].
    pub async fn ask_about_image(
        &self,
        question: &str,
        image: &[u8],
        mime_type: &str,
        user_id: &str,
    ) -> Result<String, GatewayError> {
        self.gateway
            .run(Capability::ImageExtract, &self.options, |backend| {
                backend.ask_about_image(question, image, mime_type, user_id)
            })
            .await
    }

    /// See [`Gateway::generate_image`].
    pub async fn generate_image(&self, prompt: &str, user_id: &str) -> Result<Vec<u8>, GatewayError> {
        self.gateway
            .run(Capability::ImageGenerate, &self.options, |backend| {
                backend.generate_image(prompt, user_id)
            })
            .await
    }
}
