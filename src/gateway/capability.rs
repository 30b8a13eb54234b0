//! Backend kinds, capabilities and the static routing tables.
//!
//! Both the factory (what to construct) and the facade (where to route a
//! call) read from the constants in this module; nothing here is mutable.

use std::fmt;
use std::str::FromStr;

/// Wire protocol an adapter speaks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BackendKind {
    /// Vertex AI `:predict` endpoint with a generic instance/prediction shape.
    LegacyPredict,
    /// Vertex AI `:generateContent` endpoint authenticated with a bearer token.
    ChatSdk,
    /// Google AI Studio `:generateContent` endpoint authenticated with an API key.
    KeyedRest,
}

/// Operation kinds a backend may support.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Single-turn text question.
    TextAsk,
    /// Text extraction and analysis from an image.
    ImageExtract,
    /// Text-to-image generation.
    ImageGenerate,
}

/// All backend kinds, in declaration order.
pub const ALL_BACKENDS: [BackendKind; 3] = [
    BackendKind::LegacyPredict,
    BackendKind::ChatSdk,
    BackendKind::KeyedRest,
];

/// Priority used to advertise the "primary" backend. Display only.
pub const PRIMARY_ORDER: [BackendKind; 3] = [
    BackendKind::ChatSdk,
    BackendKind::KeyedRest,
    BackendKind::LegacyPredict,
];

const LEGACY_PREDICT_CAPS: &[Capability] = &[Capability::TextAsk, Capability::ImageGenerate];
const CHAT_SDK_CAPS: &[Capability] = &[Capability::TextAsk, Capability::ImageExtract];
const KEYED_REST_CAPS: &[Capability] = &[Capability::TextAsk, Capability::ImageExtract];

const TEXT_ASK_ROUTE: &[BackendKind] = &[
    BackendKind::ChatSdk,
    BackendKind::KeyedRest,
    BackendKind::LegacyPredict,
];
// Used only when the caller does not pick a backend explicitly.
const IMAGE_EXTRACT_ROUTE: &[BackendKind] = &[BackendKind::KeyedRest, BackendKind::ChatSdk];
const IMAGE_GENERATE_ROUTE: &[BackendKind] = &[BackendKind::LegacyPredict];

impl BackendKind {
    /// Returns the capabilities this backend kind implements.
    pub const fn capabilities(self) -> &'static [Capability] {
        match self {
            Self::LegacyPredict => LEGACY_PREDICT_CAPS,
            Self::ChatSdk => CHAT_SDK_CAPS,
            Self::KeyedRest => KEYED_REST_CAPS,
        }
    }

    /// Returns true if the kind implements `capability`.
    pub fn supports(self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }

    /// Returns true if adapters of this kind own a handle that must be closed.
    pub const fn owns_handle(self) -> bool {
        match self {
            Self::LegacyPredict | Self::ChatSdk => true,
            Self::KeyedRest => false,
        }
    }

    /// Stable machine name, also accepted by [`FromStr`].
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LegacyPredict => "legacy-predict",
            Self::ChatSdk => "chat-sdk",
            Self::KeyedRest => "keyed-rest",
        }
    }

    /// Human-readable provider name.
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::LegacyPredict => "Vertex AI Predict",
            Self::ChatSdk => "Vertex AI Gemini",
            Self::KeyedRest => "Google AI Studio",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "legacy-predict" | "legacy" | "predict" => Ok(Self::LegacyPredict),
            "chat-sdk" | "vertex" | "sdk" => Ok(Self::ChatSdk),
            "keyed-rest" | "studio" | "rest" => Ok(Self::KeyedRest),
            other => Err(format!(
                "unknown backend '{other}' (expected legacy-predict, chat-sdk or keyed-rest)"
            )),
        }
    }
}

impl Capability {
    /// Backends able to serve this capability, most preferred first.
    pub const fn route(self) -> &'static [BackendKind] {
        match self {
            Self::TextAsk => TEXT_ASK_ROUTE,
            Self::ImageExtract => IMAGE_EXTRACT_ROUTE,
            Self::ImageGenerate => IMAGE_GENERATE_ROUTE,
        }
    }

    /// Stable machine name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TextAsk => "text-ask",
            Self::ImageExtract => "image-extract",
            Self::ImageGenerate => "image-generate",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
