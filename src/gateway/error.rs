//! Gateway error handling.
//!
//! Adapters report protocol-level failures as [`AdapterError`]; the facade
//! folds those into the closed [`GatewayError`] set callers branch on.

use std::time::Duration;

use thiserror::Error;

use super::capability::{BackendKind, Capability};

/// Protocol-level failures raised inside a single adapter.
#[derive(Error, Debug)]
pub enum AdapterError {
    /// The request never produced an HTTP response.
    #[error("network error: {0}")]
    Network(String),

    /// The HTTP client gave up waiting for the provider.
    #[error("request timed out: {0}")]
    TimedOut(String),

    /// Non-success HTTP status without a structured error body.
    #[error("HTTP {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The provider returned a structured error object.
    #[error("API error (HTTP {status}{}): {message}", code_suffix(.code.as_deref()))]
    Api {
        /// HTTP status code of the response carrying the error.
        status: u16,
        /// Provider status code, e.g. `INVALID_ARGUMENT`.
        code: Option<String>,
        /// Provider message.
        message: String,
    },

    /// Content was blocked by provider safety filters.
    #[error("blocked by safety filters: {0}")]
    Blocked(String),

    /// The response held no candidates or predictions at all.
    #[error("response contained no candidates")]
    NoCandidates,

    /// Candidates were present but none carried text.
    #[error("response candidates contained no text")]
    EmptyContent,

    /// A fixed field path was interrupted at the named level.
    #[error("response is missing `{0}`")]
    MissingField(&'static str),

    /// The body could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// Credentials could not be loaded or were rejected.
    #[error("credential error: {0}")]
    Credentials(String),

    /// The adapter does not implement the requested capability.
    #[error("operation {0} is not supported by this backend")]
    Unsupported(Capability),

    /// The adapter's handle has already been released.
    #[error("backend handle is closed")]
    Closed,
}

fn code_suffix(code: Option<&str>) -> String {
    code.map(|c| format!(", {c}")).unwrap_or_default()
}

/// Returns true when an HTTP status points at transport or auth trouble
/// rather than at the request content.
pub(crate) fn is_transport_status(status: u16) -> bool {
    matches!(status, 401 | 403 | 408 | 429) || status >= 500
}

impl From<reqwest::Error> for AdapterError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::TimedOut(err.to_string())
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Normalized gateway errors.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// A single backend failed to initialize.
    #[error("{backend} backend failed to initialize: {message}")]
    ConstructionFailure {
        /// Backend that failed.
        backend: BackendKind,
        /// Underlying reason.
        message: String,
    },

    /// No backend could be constructed.
    #[error("no AI backends could be initialized: {0}")]
    NoUsableBackend(String),

    /// No configured backend implements the requested operation.
    #[error("no configured backend supports {capability}")]
    CapabilityUnavailable {
        /// Requested operation.
        capability: Capability,
    },

    /// The call exceeded its budget or was cancelled by the caller.
    #[error("{backend} did not answer {capability} within {budget:?}")]
    Timeout {
        /// Backend serving the call.
        backend: BackendKind,
        /// Requested operation.
        capability: Capability,
        /// Budget that was exceeded.
        budget: Duration,
    },

    /// The provider refused the request (safety filter, malformed prompt).
    #[error("{backend} rejected the request: {message}")]
    UpstreamRejected {
        /// Backend serving the call.
        backend: BackendKind,
        /// Provider message.
        message: String,
    },

    /// The provider answered without usable content.
    #[error("{backend} returned no answer: {detail}")]
    NoAnswer {
        /// Backend serving the call.
        backend: BackendKind,
        /// What was missing.
        detail: String,
    },

    /// Network, serialization or authentication failure.
    #[error("{backend} transport failure: {message}")]
    TransportFailure {
        /// Backend serving the call.
        backend: BackendKind,
        /// Underlying reason.
        message: String,
    },
}

impl GatewayError {
    /// Folds an adapter failure into the normalized set, keeping the
    /// adapter message as context.
    pub fn from_adapter(backend: BackendKind, err: AdapterError) -> Self {
        let message = err.to_string();
        match err {
            AdapterError::Unsupported(capability) => Self::CapabilityUnavailable { capability },
            AdapterError::Blocked(_) => Self::UpstreamRejected { backend, message },
            AdapterError::Api { status, .. } | AdapterError::Http { status, .. } => {
                if is_transport_status(status) {
                    Self::TransportFailure { backend, message }
                } else {
                    Self::UpstreamRejected { backend, message }
                }
            }
            AdapterError::NoCandidates
            | AdapterError::EmptyContent
            | AdapterError::MissingField(_) => Self::NoAnswer {
                backend,
                detail: message,
            },
            AdapterError::TimedOut(_)
            | AdapterError::Network(_)
            | AdapterError::Decode(_)
            | AdapterError::Credentials(_)
            | AdapterError::Closed => Self::TransportFailure { backend, message },
        }
    }

    /// Returns true if retrying the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::NoAnswer { .. } | Self::TransportFailure { .. }
        )
    }

    /// Backend the error originated from, when one was involved.
    pub fn backend(&self) -> Option<BackendKind> {
        match self {
            Self::ConstructionFailure { backend, .. }
            | Self::Timeout { backend, .. }
            | Self::UpstreamRejected { backend, .. }
            | Self::NoAnswer { backend, .. }
            | Self::TransportFailure { backend, .. } => Some(*backend),
            Self::NoUsableBackend(_) | Self::CapabilityUnavailable { .. } => None,
        }
    }
}
