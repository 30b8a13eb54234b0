//! Builds the service bundle from configuration.
//!
//! Every eligible backend is constructed independently. Failures are logged
//! and kept as diagnostics; only a configuration where nothing could be
//! built is fatal.

use tracing::{info, warn};

use super::backend::{Backend, ChatSdkBackend, KeyedRestBackend, LegacyPredictBackend};
use super::bundle::ServiceBundle;
use super::capability::BackendKind;
use super::config::GatewayConfig;
use super::error::{AdapterError, GatewayError};

/// Constructs one adapter of a given kind.
pub trait BackendBuilder {
    /// Builds the adapter for `kind`.
    fn build(&self, kind: BackendKind, config: &GatewayConfig)
        -> Result<Box<dyn Backend>, AdapterError>;
}

/// Builds the real network adapters.
#[derive(Debug, Default, Clone, Copy)]
pub struct LiveBuilder;

impl BackendBuilder for LiveBuilder {
    fn build(
        &self,
        kind: BackendKind,
        config: &GatewayConfig,
    ) -> Result<Box<dyn Backend>, AdapterError> {
        Ok(match kind {
            BackendKind::LegacyPredict => Box::new(LegacyPredictBackend::new(config)?),
            BackendKind::ChatSdk => Box::new(ChatSdkBackend::new(config)?),
            BackendKind::KeyedRest => Box::new(KeyedRestBackend::new(config)?),
        })
    }
}

/// Backend kinds the configuration makes eligible, in construction order.
///
/// An API key enables the keyed REST backend, with or without the
/// prefer-REST flag. A project id always enables both Vertex AI backends
/// together, since only the predict backend generates images.
pub fn eligible_backends(config: &GatewayConfig) -> Vec<BackendKind> {
    let mut kinds = Vec::with_capacity(3);
    if config.api_key().is_some() {
        kinds.push(BackendKind::KeyedRest);
    }
    if config.project_id().is_some() {
        kinds.push(BackendKind::ChatSdk);
        kinds.push(BackendKind::LegacyPredict);
    }
    kinds
}

/// Creates the bundle with the real adapters.
pub fn create_services(config: &GatewayConfig) -> Result<ServiceBundle, GatewayError> {
    create_services_with(config, &LiveBuilder)
}

/// Creates the bundle using `builder` for each eligible kind.
pub fn create_services_with(
    config: &GatewayConfig,
    builder: &impl BackendBuilder,
) -> Result<ServiceBundle, GatewayError> {
    let eligible = eligible_backends(config);
    if eligible.is_empty() {
        return Err(GatewayError::NoUsableBackend(
            "no AI backend is configured; set GOOGLE_AI_STUDIO_API_KEY or GOOGLE_CLOUD_PROJECT_ID"
                .to_string(),
        ));
    }

    let attempts: Vec<(BackendKind, Result<Box<dyn Backend>, AdapterError>)> = eligible
        .into_iter()
        .map(|kind| (kind, builder.build(kind, config)))
        .collect();

    let mut adapters = Vec::new();
    let mut failures = Vec::new();
    for (kind, attempt) in attempts {
        match attempt {
            Ok(adapter) => {
                info!(backend = %kind, "Initialized {}", kind.display_name());
                adapters.push(adapter);
            }
            Err(err) => {
                warn!(backend = %kind, error = %err, "Failed to initialize {}", kind.display_name());
                failures.push(GatewayError::ConstructionFailure {
                    backend: kind,
                    message: err.to_string(),
                });
            }
        }
    }

    if adapters.is_empty() {
        let reasons: Vec<String> = failures.iter().map(ToString::to_string).collect();
        return Err(GatewayError::NoUsableBackend(reasons.join("; ")));
    }

    ServiceBundle::with_failures(adapters, failures)
}
