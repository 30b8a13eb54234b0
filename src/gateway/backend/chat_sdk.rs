//! Vertex AI Gemini adapter.
//!
//! Holds an authenticated session for the lifetime of the gateway; the
//! session is dropped on close and every later call fails with
//! [`AdapterError::Closed`].

use reqwest::Client;
use tracing::{debug, info};
use url::Url;

use super::generate_content::{
    parse_response, GenerateContentRequest, Part, CHAT_GENERATION, OCR_GENERATION,
};
use super::{
    build_http_client, log_response_success, trim_base_url, Backend, BackendFuture, Closable,
};
use crate::gateway::capability::BackendKind;
use crate::gateway::config::{GatewayConfig, Persona};
use crate::gateway::credentials::{self, TokenSource};
use crate::gateway::error::AdapterError;
use crate::gateway::prompts::{self, ExtractMode};

/// Authenticated connection state.
struct Session {
    client: Client,
    token: TokenSource,
}

/// Chat SDK adapter.
pub struct ChatSdkBackend {
    session: Option<Session>,
    endpoint: Url,
    model: String,
    persona: Persona,
}

impl ChatSdkBackend {
    /// Creates the adapter, resolving credentials up front.
    pub fn new(config: &GatewayConfig) -> Result<Self, AdapterError> {
        let project_id = config.project_id().ok_or_else(|| {
            AdapterError::Credentials("GOOGLE_CLOUD_PROJECT_ID not configured".to_string())
        })?;
        let token = credentials::resolve(config)?;

        let raw = format!(
            "{}/projects/{}/locations/{}/publishers/google/models/{}:generateContent",
            trim_base_url(&config.vertex_base_url()),
            project_id,
            config.location,
            config.text_model
        );
        let endpoint = Url::parse(&raw)
            .map_err(|e| AdapterError::Credentials(format!("invalid Vertex AI endpoint {raw}: {e}")))?;

        info!(
            project_id,
            location = %config.location,
            model = %config.text_model,
            "Vertex AI Gemini session opened"
        );

        Ok(Self {
            session: Some(Session {
                client: build_http_client()?,
                token,
            }),
            endpoint,
            model: config.text_model.clone(),
            persona: config.persona.clone(),
        })
    }

    async fn send(&self, request: GenerateContentRequest) -> Result<String, AdapterError> {
        let session = self.session.as_ref().ok_or(AdapterError::Closed)?;
        info!(url = %self.endpoint, model = %self.model, "Sending request to Vertex AI Gemini");

        let bearer = session.token.bearer(&session.client).await?;
        let response = session
            .client
            .post(self.endpoint.clone())
            .header("Authorization", bearer)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(status, body_len = body.len(), "Received Vertex AI Gemini response");

        let result = parse_response(status, &body)?.concatenated_text();
        log_response_success(BackendKind::ChatSdk, &result);
        result
    }
}

impl Backend for ChatSdkBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::ChatSdk
    }

    fn ask<'a>(&'a self, question: &'a str, user_id: &'a str) -> BackendFuture<'a, String> {
        Box::pin(async move {
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
            debug!(image_len = image.len(), mime_type, %mode, "Preparing Vertex AI extraction");
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

    fn as_closable(&mut self) -> Option<&mut dyn Closable> {
        Some(self)
    }
}

impl Closable for ChatSdkBackend {
    fn close(&mut self) -> Result<(), AdapterError> {
        match self.session.take() {
            Some(_) => {
                debug!("Vertex AI Gemini session closed");
                Ok(())
            }
            None => Err(AdapterError::Closed),
        }
    }
}
