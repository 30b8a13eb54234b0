//! Constructed adapters and their availability.

use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, warn};

use super::backend::Backend;
use super::capability::{BackendKind, Capability, PRIMARY_ORDER};
use super::error::GatewayError;

/// The ready-to-use set of adapters, at most one per kind.
///
/// Read-only after construction; concurrent calls share it through `&self`.
pub struct ServiceBundle {
    adapters: BTreeMap<BackendKind, Box<dyn Backend>>,
    primary: BackendKind,
    construction_failures: Vec<GatewayError>,
}

impl ServiceBundle {
    /// Builds a bundle from constructed adapters.
    ///
    /// Fails with [`GatewayError::NoUsableBackend`] when `adapters` is empty
    /// or holds two adapters of the same kind.
    pub fn from_adapters(adapters: Vec<Box<dyn Backend>>) -> Result<Self, GatewayError> {
        Self::with_failures(adapters, Vec::new())
    }

    pub(crate) fn with_failures(
        adapters: Vec<Box<dyn Backend>>,
        construction_failures: Vec<GatewayError>,
    ) -> Result<Self, GatewayError> {
        if adapters.is_empty() {
            return Err(GatewayError::NoUsableBackend(
                "bundle needs at least one adapter".to_string(),
            ));
        }

        let mut slots = BTreeMap::new();
        for adapter in adapters {
            let kind = adapter.kind();
            if slots.insert(kind, adapter).is_some() {
                return Err(GatewayError::NoUsableBackend(format!(
                    "duplicate {kind} adapter in bundle"
                )));
            }
        }

        let primary = PRIMARY_ORDER
            .into_iter()
            .find(|kind| slots.contains_key(kind))
            .ok_or_else(|| GatewayError::NoUsableBackend("bundle has no ranked adapter".to_string()))?;

        Ok(Self {
            adapters: slots,
            primary,
            construction_failures,
        })
    }

    /// Returns the adapter of `kind`, if constructed.
    pub fn get(&self, kind: BackendKind) -> Option<&dyn Backend> {
        self.adapters.get(&kind).map(|adapter| &**adapter)
    }

    /// Returns true if an adapter of `kind` was constructed.
    pub fn has(&self, kind: BackendKind) -> bool {
        self.adapters.contains_key(&kind)
    }

    /// Constructed kinds, in declaration order.
    pub fn available(&self) -> Vec<BackendKind> {
        self.adapters.keys().copied().collect()
    }

    /// Backends that were eligible but failed to initialize.
    pub fn construction_failures(&self) -> &[GatewayError] {
        &self.construction_failures
    }

    /// Returns true if some constructed adapter serves `capability`.
    pub fn supports(&self, capability: Capability) -> bool {
        capability.route().iter().any(|kind| self.has(*kind))
    }

    /// Advertised primary backend. Display only; routing never reads it.
    pub fn primary_backend(&self) -> BackendKind {
        self.primary
    }

    /// Releases every adapter that owns a network handle.
    ///
    /// All handles are attempted even after a failure; the first failure is
    /// returned.
    pub fn close(mut self) -> Result<(), GatewayError> {
        let mut first_error = None;

        for (kind, adapter) in &mut self.adapters {
            let Some(closable) = adapter.as_closable() else {
                continue;
            };
            match closable.close() {
                Ok(()) => debug!(backend = %kind, "Closed backend"),
                Err(err) => {
                    warn!(backend = %kind, error = %err, "Failed to close backend");
                    if first_error.is_none() {
                        first_error = Some(GatewayError::TransportFailure {
                            backend: *kind,
                            message: format!("close failed: {err}"),
                        });
                    }
                }
            }
        }

        first_error.map_or(Ok(()), Err)
    }
}

impl fmt::Debug for ServiceBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceBundle")
            .field("available", &self.available())
            .field("primary", &self.primary)
            .field("construction_failures", &self.construction_failures.len())
            .finish()
    }
}
