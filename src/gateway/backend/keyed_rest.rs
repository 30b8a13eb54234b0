//! Google AI Studio adapter, authenticated with an API key.
//!
//! Stateless over plain HTTP, so it is never part of shutdown.

use reqwest::Client;
use tracing::{debug, info};

use super::generate_content::{
    parse_response, GenerateContentRequest, Part, CHAT_GENERATION, OCR_GENERATION,
};
use super::{build_http_client, log_response_success, trim_base_url, Backend, BackendFuture};
use crate::gateway::capability::BackendKind;
use crate::gateway::config::{GatewayConfig, Persona};
use crate::gateway::error::AdapterError;
use crate::gateway::prompts::{self, ExtractMode};

/// Used when the configuration leaves the model blank.
const FALLBACK_MODEL: &str = "gemini-2.5-flash";

/// Keyed REST adapter.
pub struct KeyedRestBackend {
    /// HTTP client for API requests.
    client: Client,
    /// API key passed as the `key` query parameter.
    api_key: String,
    /// Model identifier.
    model: String,
    /// Endpoint base, e.g. `https://generativelanguage.googleapis.com/v1beta`.
    base_url: String,
    /// Persona folded into prompts.
    persona: Persona,
}

impl KeyedRestBackend {
    /// Creates the adapter from configuration.
    pub fn new(config: &GatewayConfig) -> Result<Self, AdapterError> {
        let api_key = config
            .api_key()
            .ok_or_else(|| AdapterError::Credentials("API key not configured".to_string()))?;
        let model = if config.text_model.trim().is_empty() {
            FALLBACK_MODEL.to_string()
        } else {
            config.text_model.clone()
        };

        Ok(Self {
            client: build_http_client()?,
            api_key: api_key.to_string(),
            model,
            base_url: config.rest_base_url.clone(),
            persona: config.persona.clone(),
        })
    }

    fn api_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            trim_base_url(&self.base_url),
            self.model
        )
    }

    async fn send(&self, request: GenerateContentRequest) -> Result<String, AdapterError> {
        let url = self.api_url();
        // The key is attached as a query parameter after logging.
        info!(url = %url, model = %self.model, "Sending request to Google AI Studio");

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(status, body_len = body.len(), "Received Google AI Studio response");

        let result = parse_response(status, &body)?.first_part_text();
        log_response_success(BackendKind::KeyedRest, &result);
        result
    }
}

impl Backend for KeyedRestBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::KeyedRest
    }

    fn ask<'a>(&'a self, question: &'a str, user_id: &'a str) -> BackendFuture<'a, String> {
        Box::pin(async move {
            debug!(question_len = question.len(), user_id, "Preparing Google AI Studio question");
            let prompt = prompts::ask_prompt(&self.persona, question, user_id);
            let request =
                GenerateContentRequest::user_turn(vec![Part::text(prompt)], CHAT_GENERATION);
            self.send(request).await
        })
    }

    fn extract<'a>(
        &'a self,
        image: &'a [u8],
        mime_type: &'a str,
        mode: ExtractMode,
        user_id: &'a str,
    ) -> BackendFuture<'a, String> {
        Box::pin(async move {
            debug!(image_len = image.len(), mime_type, %mode, "Preparing Google AI Studio extraction");
            let prompt = prompts::extract_prompt(&self.persona, mode, user_id);
            let request = GenerateContentRequest::user_turn(
                vec![Part::text(prompt), Part::image(image, mime_type)],
                OCR_GENERATION,
            );
            self.send(request).await
        })
    }

    fn ask_about_image<'a>(
        &'a self,
        question: &'a str,
        image: &'a [u8],
        mime_type: &'a str,
        _user_id: &'a str,
    ) -> BackendFuture<'a, String> {
        Box::pin(async move {
            let prompt = prompts::image_question_prompt(&self.persona, question);
            let request = GenerateContentRequest::user_turn(
                vec![Part::text(prompt), Part::image(image, mime_type)],
                CHAT_GENERATION,
            );
            self.send(request).await
        })
    }
}
