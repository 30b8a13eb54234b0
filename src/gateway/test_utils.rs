//! Shared test utilities for the `gateway` module.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::backend::{Backend, BackendFuture, Closable};
use super::capability::{BackendKind, Capability};
use super::error::AdapterError;
use super::prompts::ExtractMode;

/// Mock backend with a pre-programmed queue of text responses.
///
/// Responses are returned in FIFO order; an exhausted queue yields
/// [`AdapterError::NoCandidates`]. Every call records the operation name,
/// readable through [`call_handle`](Self::call_handle) after the mock has
/// been moved into a bundle. Operations the mocked kind does not support
/// fail with [`AdapterError::Unsupported`], as real adapters do.
pub(crate) struct MockBackend {
    kind: BackendKind,
    responses: Arc<Mutex<VecDeque<Result<String, AdapterError>>>>,
    image: Option<Vec<u8>>,
    pending: bool,
    close_result: Option<AdapterError>,
    calls: Arc<Mutex<Vec<&'static str>>>,
    closes: Arc<Mutex<usize>>,
}

impl MockBackend {
    /// Creates a mock of `kind` answering with the given responses in order.
    pub(crate) fn new(kind: BackendKind, responses: Vec<Result<String, AdapterError>>) -> Self {
        Self {
            kind,
            responses: Arc::new(Mutex::new(VecDeque::from(responses))),
            image: None,
            pending: false,
            close_result: None,
            calls: Arc::new(Mutex::new(Vec::new())),
            closes: Arc::new(Mutex::new(0)),
        }
    }

    /// Mock that answers every text call with `answer`.
    pub(crate) fn answering(kind: BackendKind, answer: &str) -> Self {
        Self::new(kind, (0..8).map(|_| Ok(answer.to_string())).collect())
    }

    /// Returns `bytes` from image generation.
    pub(crate) fn with_image(mut self, bytes: Vec<u8>) -> Self {
        self.image = Some(bytes);
        self
    }

    /// Makes every call wait forever, for timeout and cancellation tests.
    pub(crate) fn pending(mut self) -> Self {
        self.pending = true;
        self
    }

    /// Makes `close` fail with `err`.
    pub(crate) fn failing_close(mut self, err: AdapterError) -> Self {
        self.close_result = Some(err);
        self
    }

    /// Handle for inspecting recorded calls.
    pub(crate) fn call_handle(&self) -> CallHandle {
        CallHandle {
            calls: self.calls.clone(),
            closes: self.closes.clone(),
        }
    }

    fn respond<'a>(&'a self, operation: &'static str, capability: Capability) -> BackendFuture<'a, String> {
        self.calls.lock().unwrap().push(operation);
        let supported = self.kind.supports(capability);
        let pending = self.pending;
        let next = self.responses.lock().unwrap().pop_front();
        Box::pin(async move {
            if !supported {
                return Err(AdapterError::Unsupported(capability));
            }
            if pending {
                std::future::pending::<()>().await;
            }
            next.unwrap_or(Err(AdapterError::NoCandidates))
        })
    }
}

/// Shared view of a mock's recorded activity.
#[derive(Clone)]
pub(crate) struct CallHandle {
    calls: Arc<Mutex<Vec<&'static str>>>,
    closes: Arc<Mutex<usize>>,
}

impl CallHandle {
    /// Operation names in call order.
    pub(crate) fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of operations invoked.
    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Number of times `close` was invoked.
    pub(crate) fn close_count(&self) -> usize {
        *self.closes.lock().unwrap()
    }
}

impl Backend for MockBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn ask<'a>(&'a self, _question: &'a str, _user_id: &'a str) -> BackendFuture<'a, String> {
        self.respond("ask", Capability::TextAsk)
    }

    fn extract<'a>(
        &'a self,
        _image: &'a [u8],
        _mime_type: &'a str,
        _mode: ExtractMode,
        _user_id: &'a str,
    ) -> BackendFuture<'a, String> {
        self.respond("extract", Capability::ImageExtract)
    }

    fn ask_about_image<'a>(
        &'a self,
        _question: &'a str,
        _image: &'a [u8],
        _mime_type: &'a str,
        _user_id: &'a str,
    ) -> BackendFuture<'a, String> {
        self.respond("ask_about_image", Capability::ImageExtract)
    }

    fn generate_image<'a>(&'a self, _prompt: &'a str, _user_id: &'a str) -> BackendFuture<'a, Vec<u8>> {
        self.calls.lock().unwrap().push("generate_image");
        let supported = self.kind.supports(Capability::ImageGenerate);
        let pending = self.pending;
        let image = self.image.clone();
        Box::pin(async move {
            if !supported {
                return Err(AdapterError::Unsupported(Capability::ImageGenerate));
            }
            if pending {
                std::future::pending::<()>().await;
            }
            image.ok_or(AdapterError::NoCandidates)
        })
    }

    fn as_closable(&mut self) -> Option<&mut dyn Closable> {
        if self.kind.owns_handle() {
            Some(self)
        } else {
            None
        }
    }
}

impl Closable for MockBackend {
    fn close(&mut self) -> Result<(), AdapterError> {
        *self.closes.lock().unwrap() += 1;
        match self.close_result.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
