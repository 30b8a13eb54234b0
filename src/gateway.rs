//! Multi-backend generative AI gateway.
//!
//! Three interchangeable backends serve text questions, image text
//! extraction and image generation behind one [`Gateway`]:
//!
//! - [`BackendKind::ChatSdk`]: Vertex AI Gemini `generateContent`
//! - [`BackendKind::KeyedRest`]: Google AI Studio with an API key
//! - [`BackendKind::LegacyPredict`]: Vertex AI `predict`, the only image generator

pub mod backend;
pub mod bundle;
pub mod capability;
pub mod config;
pub mod credentials;
pub mod error;
pub mod facade;
pub mod factory;
pub mod prompts;

#[cfg(test)]
pub(crate) mod test_utils;

pub use backend::{Backend, BackendFuture, Closable};
pub use bundle::ServiceBundle;
pub use capability::{BackendKind, Capability};
pub use config::{Budgets, GatewayConfig, Persona};
pub use error::{AdapterError, GatewayError};
pub use facade::{CallOptions, Gateway, GatewayCall};
pub use factory::{create_services, create_services_with, eligible_backends, BackendBuilder};
pub use prompts::ExtractMode;
