use std::sync::Arc;

use tower::ServiceBuilder;
use tower::layer::util::Stack;

use flash_limit::Gate;

use crate::AdmissionLayer;

/// Service Builder Extension with additional useful functions for tower::ServiceBuilder.
pub trait ServiceBuilderExt<L> {
    /// Add a flash-sale admission layer
    fn admission_control(
        self,
        gate: Arc<dyn Gate + Send + Sync + 'static>,
    ) -> ServiceBuilder<Stack<AdmissionLayer<dyn Gate + Send + Sync + 'static>, L>>;
}

impl<L> ServiceBuilderExt<L> for ServiceBuilder<L> {
    fn admission_control(
        self,
        gate: Arc<dyn Gate + Send + Sync + 'static>,
    ) -> ServiceBuilder<Stack<AdmissionLayer<dyn Gate + Send + Sync + 'static>, L>> {
        self.layer(AdmissionLayer::new(gate))
    }
}
