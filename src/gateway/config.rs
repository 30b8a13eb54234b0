//! Gateway configuration.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;

use super::capability::Capability;
use crate::utils::settings::Settings;

/// Default Vertex AI region.
pub const DEFAULT_LOCATION: &str = "us-central1";
/// Default Gemini model for text and image-conditioned requests.
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash-lite";
/// Default Imagen model for image generation.
pub const DEFAULT_IMAGE_MODEL: &str = "imagen-4.0-fast-generate-preview-06-06";
/// Default Google AI Studio endpoint.
pub const DEFAULT_REST_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Per-capability call budgets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Budgets {
    /// Budget for text questions.
    pub ask: Duration,
    /// Budget for image extraction and image-conditioned questions.
    pub extract: Duration,
    /// Budget for image generation.
    pub generate_image: Duration,
}

impl Default for Budgets {
    fn default() -> Self {
        Self {
            ask: Duration::from_secs(30),
            extract: Duration::from_secs(45),
            generate_image: Duration::from_secs(60),
        }
    }
}

impl Budgets {
    /// Returns the budget applying to `capability`.
    pub fn for_capability(&self, capability: Capability) -> Duration {
        match capability {
            Capability::TextAsk => self.ask,
            Capability::ImageExtract => self.extract,
            Capability::ImageGenerate => self.generate_image,
        }
    }
}

/// Assistant persona folded into every prompt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Persona {
    /// Name the assistant calls itself.
    pub name: String,
    /// Language answers are written in.
    pub language: String,
}

impl Default for Persona {
    fn default() -> Self {
        Self {
            name: "Luna".to_string(),
            language: "Japanese".to_string(),
        }
    }
}

/// Immutable gateway input, supplied once at startup.
#[derive(Clone)]
pub struct GatewayConfig {
    /// Google Cloud project id; enables the Vertex AI backends.
    pub project_id: Option<String>,
    /// Vertex AI region.
    pub location: String,
    /// Path to a credential file for the Vertex AI backends.
    pub credentials_path: Option<PathBuf>,
    /// Explicit bearer token for the Vertex AI backends.
    pub access_token: Option<String>,
    /// Google AI Studio API key; enables the keyed REST backend.
    pub api_key: Option<String>,
    /// Explicit opt-in to the keyed REST backend. An API key already enables
    /// it; the flag never disables the Vertex AI backends.
    pub prefer_rest: bool,
    /// Gemini model id.
    pub text_model: String,
    /// Imagen model id.
    pub image_model: String,
    /// Assistant persona.
    pub persona: Persona,
    /// Per-call budgets.
    pub budgets: Budgets,
    /// Google AI Studio endpoint base.
    pub rest_base_url: String,
    /// Vertex AI endpoint base override; derived from `location` when unset.
    pub vertex_base_url: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            location: DEFAULT_LOCATION.to_string(),
            credentials_path: None,
            access_token: None,
            api_key: None,
            prefer_rest: false,
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            persona: Persona::default(),
            budgets: Budgets::default(),
            rest_base_url: DEFAULT_REST_BASE_URL.to_string(),
            vertex_base_url: None,
        }
    }
}

impl GatewayConfig {
    /// Loads configuration from the environment, falling back to
    /// `$HOME/.genai-gateway/settings.json`.
    pub fn from_env() -> Result<Self> {
        let settings = Settings::load()?;
        Ok(Self::from_lookup(|key| settings.get_env_var(key)))
    }

    /// Builds configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let secs = |key: &str, default: Duration| {
            get(key)
                .and_then(|value| value.parse::<u64>().ok())
                .filter(|value| *value > 0)
                .map_or(default, Duration::from_secs)
        };
        let defaults = Budgets::default();

        Self {
            project_id: get("GOOGLE_CLOUD_PROJECT_ID"),
            location: get("GOOGLE_CLOUD_LOCATION").unwrap_or_else(|| DEFAULT_LOCATION.to_string()),
            credentials_path: get("GOOGLE_APPLICATION_CREDENTIALS").map(PathBuf::from),
            access_token: get("GOOGLE_CLOUD_ACCESS_TOKEN"),
            api_key: get("GOOGLE_AI_STUDIO_API_KEY"),
            prefer_rest: get("USE_GOOGLE_AI_STUDIO")
                .and_then(|value| value.to_ascii_lowercase().parse().ok())
                .unwrap_or(false),
            text_model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_TEXT_MODEL.to_string()),
            image_model: get("IMAGEN_MODEL").unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string()),
            persona: Persona {
                name: get("GATEWAY_PERSONA_NAME").unwrap_or_else(|| Persona::default().name),
                language: get("GATEWAY_RESPONSE_LANGUAGE")
                    .unwrap_or_else(|| Persona::default().language),
            },
            budgets: Budgets {
                ask: secs("GATEWAY_ASK_TIMEOUT_SECS", defaults.ask),
                extract: secs("GATEWAY_EXTRACT_TIMEOUT_SECS", defaults.extract),
                generate_image: secs("GATEWAY_IMAGE_TIMEOUT_SECS", defaults.generate_image),
            },
            rest_base_url: get("GATEWAY_REST_BASE_URL")
                .unwrap_or_else(|| DEFAULT_REST_BASE_URL.to_string()),
            vertex_base_url: get("GATEWAY_VERTEX_BASE_URL"),
        }
    }

    /// Returns the non-empty API key, if any.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|key| !key.trim().is_empty())
    }

    /// Returns the non-empty project id, if any.
    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref().filter(|id| !id.trim().is_empty())
    }

    /// Vertex AI endpoint base for the configured region.
    pub fn vertex_base_url(&self) -> String {
        self.vertex_base_url
            .clone()
            .unwrap_or_else(|| format!("https://{}-aiplatform.googleapis.com/v1", self.location))
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("project_id", &self.project_id)
            .field("location", &self.location)
            .field("credentials_path", &self.credentials_path)
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("prefer_rest", &self.prefer_rest)
            .field("text_model", &self.text_model)
            .field("image_model", &self.image_model)
            .field("persona", &self.persona)
            .field("budgets", &self.budgets)
            .field("rest_base_url", &self.rest_base_url)
            .field("vertex_base_url", &self.vertex_base_url)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> GatewayConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        GatewayConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config_from(&[]);
        assert_eq!(config.project_id, None);
        assert_eq!(config.api_key, None);
        assert_eq!(config.location, DEFAULT_LOCATION);
        assert_eq!(config.text_model, DEFAULT_TEXT_MODEL);
        assert_eq!(config.image_model, DEFAULT_IMAGE_MODEL);
        assert_eq!(config.budgets, Budgets::default());
        assert!(!config.prefer_rest);
        assert_eq!(
            config.vertex_base_url(),
            "https://us-central1-aiplatform.googleapis.com/v1"
        );
    }

    #[test]
    fn reads_all_keys() {
        let config = config_from(&[
            ("GOOGLE_CLOUD_PROJECT_ID", "my-project"),
            ("GOOGLE_CLOUD_LOCATION", "asia-northeast1"),
            ("GOOGLE_APPLICATION_CREDENTIALS", "/tmp/creds.json"),
            ("GOOGLE_AI_STUDIO_API_KEY", "key-123"),
            ("USE_GOOGLE_AI_STUDIO", "TRUE"),
            ("GEMINI_MODEL", "gemini-2.5-pro"),
            ("GATEWAY_ASK_TIMEOUT_SECS", "5"),
        ]);
        assert_eq!(config.project_id(), Some("my-project"));
        assert_eq!(config.api_key(), Some("key-123"));
        assert!(config.prefer_rest);
        assert_eq!(config.text_model, "gemini-2.5-pro");
        assert_eq!(config.budgets.ask, Duration::from_secs(5));
        assert_eq!(config.budgets.extract, Duration::from_secs(45));
        assert_eq!(
            config.credentials_path.as_deref(),
            Some(std::path::Path::new("/tmp/creds.json"))
        );
        assert_eq!(
            config.vertex_base_url(),
            "https://asia-northeast1-aiplatform.googleapis.com/v1"
        );
    }

    #[test]
    fn blank_and_unparseable_values_fall_back() {
        let config = config_from(&[
            ("GOOGLE_AI_STUDIO_API_KEY", "   "),
            ("USE_GOOGLE_AI_STUDIO", "yes please"),
            ("GATEWAY_IMAGE_TIMEOUT_SECS", "soon"),
            ("GATEWAY_EXTRACT_TIMEOUT_SECS", "0"),
        ]);
        assert_eq!(config.api_key(), None);
        assert!(!config.prefer_rest);
        assert_eq!(config.budgets.generate_image, Duration::from_secs(60));
        assert_eq!(config.budgets.extract, Duration::from_secs(45));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let config = config_from(&[
            ("GOOGLE_AI_STUDIO_API_KEY", "secret_api_key"),
            ("GOOGLE_CLOUD_ACCESS_TOKEN", "ya29.secret_token"),
        ]);
        let debug_output = format!("{config:?}");
        assert!(!debug_output.contains("secret_api_key"));
        assert!(!debug_output.contains("ya29.secret_token"));
        assert!(debug_output.contains("[REDACTED]"));
    }

    #[test]
    fn budgets_map_to_capabilities() {
        let budgets = Budgets::default();
        assert_eq!(
            budgets.for_capability(Capability::TextAsk),
            Duration::from_secs(30)
        );
        assert_eq!(
            budgets.for_capability(Capability::ImageExtract),
            Duration::from_secs(45)
        );
        assert_eq!(
            budgets.for_capability(Capability::ImageGenerate),
            Duration::from_secs(60)
        );
    }
}
