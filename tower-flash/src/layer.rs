use std::sync::Arc;

use flash_limit::Gate;
use tower::Layer;

use crate::service::AdmissionService;

/// Applies flash-sale admission control to requests.
#[derive(Debug)]
pub struct AdmissionLayer<G>
where
    G: ?Sized,
{
    gate: Arc<G>,
}

impl<G> Clone for AdmissionLayer<G>
where
    G: ?Sized,
{
    fn clone(&self) -> Self {
        Self {
            gate: Arc::clone(&self.gate),
        }
    }
}

impl<G> AdmissionLayer<G>
where
    G: Gate + ?Sized,
{
    /// Create an AdmissionLayer
    ///
    /// Every service produced by this layer shares the same gate, and so the
    /// same admission budget.
    pub fn new(gate: Arc<G>) -> Self {
        AdmissionLayer { gate }
    }
}

impl<G, S> Layer<S> for AdmissionLayer<G>
where
    G: ?Sized,
{
    type Service = AdmissionService<G, S>;

    fn layer(&self, service: S) -> Self::Service {
        AdmissionService::new(service, self.gate.clone())
    }
}
