use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use flash_limit::Gate;
use tower::BoxError;
use tower::Layer;
use tower::Service;
use tower::util::BoxCloneSyncService;

use crate::AdmissionService;
use crate::FlashError;

/// A pre-composed admission stack with a hard deadline.
///
/// ### Error Responsibilities:
/// - **Admission (`FlashError::NotStarted`, `FlashError::SoldOut`)**: Decided
///   once per call, before the inner service sees the request. Rejections
///   never wait.
/// - **Timeout (`FlashError::Timeout`)**: Occurs if an admitted request takes
///   longer than `max_wait` in the inner service.
/// - **Inner (`FlashError::Inner`)**: Any other inner service error.
pub struct ManagedAdmissionLayer<G, Req>
where
    G: ?Sized,
{
    gate: Arc<G>,
    max_wait: Duration,
    _phantom: PhantomData<fn(Req)>,
}

// Deriving Clone would needlessly require `Req: Clone`.
impl<G, Req> Clone for ManagedAdmissionLayer<G, Req>
where
    G: ?Sized,
{
    fn clone(&self) -> Self {
        Self {
            gate: self.gate.clone(),
            max_wait: self.max_wait,
            _phantom: PhantomData,
        }
    }
}

impl<S, G, Req> Layer<S> for ManagedAdmissionLayer<G, Req>
where
    G: Gate + ?Sized + Send + Sync + 'static,
    S: Service<Req, Error = BoxError> + Clone + Send + Sync + 'static,
    S::Future: Send + 'static,
    S::Response: 'static,
    Req: Send + 'static,
{
    type Service = BoxCloneSyncService<Req, S::Response, BoxError>;

    fn layer(&self, inner: S) -> Self::Service {
        let admission = AdmissionService::new(inner, self.gate.clone());

        // Timeout is outer to ensure a hard deadline on the entire process.
        let svc = tower::ServiceBuilder::new()
            .map_err(|err: BoxError| {
                if err.is::<tower::timeout::error::Elapsed>() {
                    BoxError::from(FlashError::Timeout)
                } else if let Some(flash_err) = err.downcast_ref::<FlashError>() {
                    BoxError::from(flash_err.clone())
                } else {
                    // Wrap any other inner service errors
                    Box::from(FlashError::Inner(err.to_string()))
                }
            })
            .timeout(self.max_wait)
            .service(admission);

        BoxCloneSyncService::new(svc)
    }
}

impl<G, Req> ManagedAdmissionLayer<G, Req>
where
    G: Gate + ?Sized,
{
    pub fn new(gate: Arc<G>, max_wait: Duration) -> Self {
        Self {
            gate,
            max_wait,
            _phantom: PhantomData,
        }
    }
}
