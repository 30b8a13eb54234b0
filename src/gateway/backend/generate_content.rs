//! Gemini `generateContent` wire format.
//!
//! Shared by the keyed REST and Vertex AI chat adapters, which accept the
//! same body and answer with the same envelope.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::gateway::error::AdapterError;
use crate::gateway::prompts::{SAFETY_CATEGORIES, SAFETY_THRESHOLD};

/// Request body.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
    pub safety_settings: Vec<SafetySetting>,
}

/// One conversation turn.
#[derive(Serialize, Debug)]
pub(crate) struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

/// Request part: either text or inline binary data.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
}

/// Base64 payload attached to a request part.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InlineData {
    pub mime_type: String,
    pub data: String,
}

/// Sampling parameters.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

/// Conversational answers.
pub(crate) const CHAT_GENERATION: GenerationConfig = GenerationConfig {
    temperature: 0.8,
    top_p: 0.95,
    top_k: 64,
    max_output_tokens: 2048,
};

/// Transcription favours low temperature.
pub(crate) const OCR_GENERATION: GenerationConfig = GenerationConfig {
    temperature: 0.4,
    top_p: 0.8,
    top_k: 32,
    max_output_tokens: 2048,
};

/// Harm category threshold.
#[derive(Serialize, Debug)]
pub(crate) struct SafetySetting {
    pub category: String,
    pub threshold: String,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    pub fn image(bytes: &[u8], mime_type: &str) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: mime_type.to_string(),
                data: BASE64.encode(bytes),
            }),
        }
    }
}

impl GenerateContentRequest {
    /// Builds a single user turn with the standard safety settings.
    pub fn user_turn(parts: Vec<Part>, generation_config: GenerationConfig) -> Self {
        Self {
            contents: vec![Content {
                role: "user".to_string(),
                parts,
            }],
            generation_config,
            safety_settings: SAFETY_CATEGORIES
                .iter()
                .map(|category| SafetySetting {
                    category: (*category).to_string(),
                    threshold: SAFETY_THRESHOLD.to_string(),
                })
                .collect(),
        }
    }
}

/// Response envelope.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub error: Option<ApiErrorBody>,
    pub prompt_feedback: Option<PromptFeedback>,
}

/// One answer candidate.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Candidate {
    pub content: Option<CandidateContent>,
    pub finish_reason: Option<String>,
}

/// Ordered parts of a candidate.
#[derive(Deserialize, Debug)]
pub(crate) struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

/// Response part. Non-text parts deserialize with `text: None`.
#[derive(Deserialize, Debug)]
pub(crate) struct CandidatePart {
    pub text: Option<String>,
}

/// Why the prompt itself was refused.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PromptFeedback {
    pub block_reason: Option<String>,
}

/// Top-level error object.
#[derive(Deserialize, Debug)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub message: String,
    pub status: Option<String>,
}

/// Decodes a provider body, checking the error object before anything else.
///
/// The provider can report logical failures with HTTP 200, so the status
/// alone never decides success.
pub(crate) fn parse_response(status: u16, body: &str) -> Result<GenerateContentResponse, AdapterError> {
    let parsed = serde_json::from_str::<GenerateContentResponse>(body);

    if let Ok(GenerateContentResponse {
        error: Some(error),
        ..
    }) = &parsed
    {
        return Err(AdapterError::Api {
            status,
            code: error.status.clone(),
            message: error.message.clone(),
        });
    }

    if !(200..300).contains(&status) {
        return Err(AdapterError::Http {
            status,
            body: body.to_string(),
        });
    }

    let response = parsed.map_err(|e| AdapterError::Decode(e.to_string()))?;
    debug!(
        candidate_count = response.candidates.len(),
        block_reason = ?response.prompt_feedback.as_ref().and_then(|f| f.block_reason.as_deref()),
        "Decoded generateContent response"
    );
    Ok(response)
}

impl GenerateContentResponse {
    /// Returns the first candidate, or why there is none.
    fn first_candidate(&self) -> Result<&Candidate, AdapterError> {
        if let Some(reason) = self
            .prompt_feedback
            .as_ref()
            .and_then(|feedback| feedback.block_reason.as_deref())
        {
            return Err(AdapterError::Blocked(reason.to_string()));
        }
        self.candidates.first().ok_or(AdapterError::NoCandidates)
    }

    /// Concatenates every text part of the first candidate.
    pub fn concatenated_text(&self) -> Result<String, AdapterError> {
        let candidate = self.first_candidate()?;
        let text: String = candidate
            .content
            .iter()
            .flat_map(|content| content.parts.iter())
            .filter_map(|part| part.text.as_deref())
            .collect();
        non_empty(candidate, text)
    }

    /// Returns the text of the first part of the first candidate.
    pub fn first_part_text(&self) -> Result<String, AdapterError> {
        let candidate = self.first_candidate()?;
        let text = candidate
            .content
            .as_ref()
            .and_then(|content| content.parts.first())
            .and_then(|part| part.text.as_deref())
            .unwrap_or_default()
            .trim()
            .to_string();
        non_empty(candidate, text)
    }
}

fn non_empty(candidate: &Candidate, text: String) -> Result<String, AdapterError> {
    if !text.is_empty() {
        return Ok(text);
    }
    match candidate.finish_reason.as_deref() {
        Some(reason @ ("SAFETY" | "BLOCKLIST" | "PROHIBITED_CONTENT" | "SPII")) => {
            Err(AdapterError::Blocked(reason.to_string()))
        }
        _ => Err(AdapterError::EmptyContent),
    }
}
