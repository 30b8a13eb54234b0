//! Vertex AI `:predict` adapter.
//!
//! The predict endpoint speaks a generic instance/prediction shape. Answers
//! are navigated as untyped JSON so every missing level can be reported by
//! name.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use url::Url;

use super::generate_content::{GenerateContentRequest, Part, CHAT_GENERATION};
use super::{build_http_client, trim_base_url, Backend, BackendFuture, Closable};
use crate::gateway::capability::BackendKind;
use crate::gateway::config::{GatewayConfig, Persona};
use crate::gateway::credentials::{self, TokenSource};
use crate::gateway::error::AdapterError;
use crate::gateway::prompts;

/// Generic predict request body.
#[derive(Serialize, Debug)]
struct PredictRequest<I: Serialize> {
    instances: Vec<I>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<Value>,
}

struct Session {
    client: Client,
    token: TokenSource,
}

/// Legacy predict adapter.
pub struct LegacyPredictBackend {
    session: Option<Session>,
    text_endpoint: Url,
    image_endpoint: Url,
    persona: Persona,
}

fn predict_url(config: &GatewayConfig, project_id: &str, model: &str) -> Result<Url, AdapterError> {
    let raw = format!(
        "{}/projects/{}/locations/{}/publishers/google/models/{}:predict",
        trim_base_url(&config.vertex_base_url()),
        project_id,
        config.location,
        model
    );
    Url::parse(&raw)
        .map_err(|e| AdapterError::Credentials(format!("invalid Vertex AI endpoint {raw}: {e}")))
}

impl LegacyPredictBackend {
    /// Creates the adapter, resolving credentials up front.
    pub fn new(config: &GatewayConfig) -> Result<Self, AdapterError> {
        let project_id = config.project_id().ok_or_else(|| {
            AdapterError::Credentials("GOOGLE_CLOUD_PROJECT_ID not configured".to_string())
        })?;
        let token = credentials::resolve(config)?;
        let text_endpoint = predict_url(config, project_id, &config.text_model)?;
        let image_endpoint = predict_url(config, project_id, &config.image_model)?;

        info!(
            project_id,
            location = %config.location,
            image_model = %config.image_model,
            "Vertex AI prediction client opened"
        );

        Ok(Self {
            session: Some(Session {
                client: build_http_client()?,
                token,
            }),
            text_endpoint,
            image_endpoint,
            persona: config.persona.clone(),
        })
    }

    async fn predict<I: Serialize>(
        &self,
        endpoint: &Url,
        request: &PredictRequest<I>,
    ) -> Result<Value, AdapterError> {
        let session = self.session.as_ref().ok_or(AdapterError::Closed)?;
        info!(url = %endpoint, "Sending predict request to Vertex AI");

        let bearer = session.token.bearer(&session.client).await?;
        let response = session
            .client
            .post(endpoint.clone())
            .header("Authorization", bearer)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(status, body_len = body.len(), "Received predict response");
        decode_predict_body(status, &body)
    }
}

/// Decodes a predict response, surfacing structured errors first.
fn decode_predict_body(status: u16, body: &str) -> Result<Value, AdapterError> {
    let parsed = serde_json::from_str::<Value>(body);

    if let Ok(error) = parsed.as_ref().map(|value| &value["error"]) {
        if error.is_object() {
            return Err(AdapterError::Api {
                status,
                code: error["status"].as_str().map(str::to_string),
                message: error["message"].as_str().unwrap_or_default().to_string(),
            });
        }
    }

    if !(200..300).contains(&status) {
        return Err(AdapterError::Http {
            status,
            body: body.to_string(),
        });
    }

    parsed.map_err(|e| AdapterError::Decode(e.to_string()))
}

/// Returns `predictions[0]`, or why it is absent.
fn first_prediction(value: &Value) -> Result<&Value, AdapterError> {
    value
        .get("predictions")
        .and_then(Value::as_array)
        .ok_or(AdapterError::MissingField("predictions"))?
        .first()
        .ok_or(AdapterError::NoCandidates)
}

/// Walks `candidates[0].content.parts[0].text`, naming the first missing level.
fn prediction_text(prediction: &Value) -> Result<String, AdapterError> {
    let candidate = prediction
        .get("candidates")
        .and_then(Value::as_array)
        .ok_or(AdapterError::MissingField("predictions[0].candidates"))?
        .first()
        .ok_or(AdapterError::MissingField("predictions[0].candidates[0]"))?;
    let content = candidate
        .get("content")
        .filter(|content| content.is_object())
        .ok_or(AdapterError::MissingField(
            "predictions[0].candidates[0].content",
        ))?;
    let part = content
        .get("parts")
        .and_then(Value::as_array)
        .ok_or(AdapterError::MissingField(
            "predictions[0].candidates[0].content.parts",
        ))?
        .first()
        .ok_or(AdapterError::MissingField(
            "predictions[0].candidates[0].content.parts[0]",
        ))?;
    let text = part
        .get("text")
        .and_then(Value::as_str)
        .ok_or(AdapterError::MissingField(
            "predictions[0].candidates[0].content.parts[0].text",
        ))?;
    Ok(text.trim().to_string())
}

/// Decodes the generated image, or reports why the model withheld it.
fn prediction_image(prediction: &Value) -> Result<Vec<u8>, AdapterError> {
    if let Some(reason) = prediction.get("raiFilteredReason").and_then(Value::as_str) {
        return Err(AdapterError::Blocked(reason.to_string()));
    }
    let encoded = prediction
        .get("bytesBase64Encoded")
        .and_then(Value::as_str)
        .ok_or(AdapterError::MissingField("predictions[0].bytesBase64Encoded"))?;
    BASE64
        .decode(encoded)
        .map_err(|e| AdapterError::Decode(format!("invalid image payload: {e}")))
}

fn image_parameters() -> Value {
    json!({
        "sampleCount": 1,
        "aspectRatio": "1:1",
        "safetyFilterLevel": "block_some",
        "personGeneration": "allow_adult",
        "addWatermark": false,
    })
}

impl Backend for LegacyPredictBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::LegacyPredict
    }

    fn ask<'a>(&'a self, question: &'a str, user_id: &'a str) -> BackendFuture<'a, String> {
        Box::pin(async move {
            let prompt = prompts::ask_prompt(&self.persona, question, user_id);
            let request = PredictRequest {
                instances: vec![GenerateContentRequest::user_turn(
                    vec![Part::text(prompt)],
                    CHAT_GENERATION,
                )],
                parameters: None,
            };
            let value = self.predict(&self.text_endpoint, &request).await?;
            let text = prediction_text(first_prediction(&value)?)?;
            if text.is_empty() {
                return Err(AdapterError::EmptyContent);
            }
            Ok(text)
        })
    }

    fn generate_image<'a>(&'a self, prompt: &'a str, user_id: &'a str) -> BackendFuture<'a, Vec<u8>> {
        Box::pin(async move {
            debug!(prompt_len = prompt.len(), user_id, "Preparing image generation");
            let request = PredictRequest {
                instances: vec![json!({ "prompt": prompts::image_generation_prompt(prompt) })],
                parameters: Some(image_parameters()),
            };
            let value = self.predict(&self.image_endpoint, &request).await?;
            let image = prediction_image(first_prediction(&value)?)?;
            info!(image_len = image.len(), "Image generated");
            Ok(image)
        })
    }

    fn as_closable(&mut self) -> Option<&mut dyn Closable> {
        Some(self)
    }
}

impl Closable for LegacyPredictBackend {
    fn close(&mut self) -> Result<(), AdapterError> {
        if self.session.take().is_none() {
            warn!("Vertex AI prediction client closed twice");
            return Err(AdapterError::Closed);
        }
        debug!("Vertex AI prediction client closed");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn config(base_url: &str) -> GatewayConfig {
        GatewayConfig {
            project_id: Some("demo".to_string()),
            access_token: Some("ya29.test".to_string()),
            text_model: "gemini-test".to_string(),
            image_model: "imagen-test".to_string(),
            vertex_base_url: Some(base_url.to_string()),
            ..GatewayConfig::default()
        }
    }

    #[test]
    fn names_each_missing_level() {
        let cases = [
            (json!({}), "predictions[0].candidates"),
            (json!({"candidates": []}), "predictions[0].candidates[0]"),
            (json!({"candidates": [{}]}), "predictions[0].candidates[0].content"),
            (
                json!({"candidates": [{"content": {}}]}),
                "predictions[0].candidates[0].content.parts",
            ),
            (
                json!({"candidates": [{"content": {"parts": []}}]}),
                "predictions[0].candidates[0].content.parts[0]",
            ),
            (
                json!({"candidates": [{"content": {"parts": [{"inlineData": {}}]}}]}),
                "predictions[0].candidates[0].content.parts[0].text",
            ),
        ];
        for (prediction, expected) in cases {
            match prediction_text(&prediction) {
                Err(AdapterError::MissingField(field)) => assert_eq!(field, expected),
                other => panic!("expected missing {expected}, got {other:?}"),
            }
        }
    }

    #[test]
    fn empty_predictions_are_no_candidates() {
        assert!(matches!(
            first_prediction(&json!({"predictions": []})),
            Err(AdapterError::NoCandidates)
        ));
        assert!(matches!(
            first_prediction(&json!({})),
            Err(AdapterError::MissingField("predictions"))
        ));
    }

    #[test]
    fn filtered_image_is_blocked() {
        let prediction = json!({"raiFilteredReason": "Prompt contains sensitive words."});
        assert!(matches!(
            prediction_image(&prediction),
            Err(AdapterError::Blocked(_))
        ));
    }

    #[tokio::test]
    async fn ask_navigates_prediction_path() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(
                "/projects/demo/locations/us-central1/publishers/google/models/gemini-test:predict",
            ))
            .and(header("Authorization", "Bearer ya29.test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "predictions": [{
                    "candidates": [{"content": {"parts": [{"text": " 42 "}]}}]
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let backend = LegacyPredictBackend::new(&config(&server.uri())).unwrap();
        assert_eq!(backend.ask("meaning of life?", "u").await.unwrap(), "42");
    }

    #[tokio::test]
    async fn generate_image_decodes_bytes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(
                "/projects/demo/locations/us-central1/publishers/google/models/imagen-test:predict",
            ))
            .and(body_partial_json(json!({
                "parameters": {"sampleCount": 1, "aspectRatio": "1:1", "addWatermark": false}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "predictions": [{"bytesBase64Encoded": "iVBORw==", "mimeType": "image/png"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let backend = LegacyPredictBackend::new(&config(&server.uri())).unwrap();
        let image = backend.generate_image("a red fox", "u").await.unwrap();
        assert_eq!(image, vec![0x89, b'P', b'N', b'G']);
    }

    #[tokio::test]
    async fn extraction_is_unsupported_and_close_is_single_shot() {
        let mut backend = LegacyPredictBackend::new(&config("http://localhost:9")).unwrap();
        assert!(matches!(
            backend
                .extract(b"img", "image/png", prompts::ExtractMode::PlainText, "u")
                .await,
            Err(AdapterError::Unsupported(_))
        ));

        backend.as_closable().unwrap().close().unwrap();
        assert!(matches!(
            backend.generate_image("p", "u").await,
            Err(AdapterError::Closed)
        ));
        assert!(matches!(
            backend.as_closable().unwrap().close(),
            Err(AdapterError::Closed)
        ));
    }
}
