use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::Context;
use std::task::Poll;

use opentelemetry::KeyValue;
use opentelemetry::global;
use opentelemetry::metrics::Counter;
use pin_project_lite::pin_project;
use tower::BoxError;
use tower::Service;

use flash_limit::Gate;
use flash_limit::Verdict;

use crate::error::FlashError;

#[derive(Clone, Debug)]
struct AdmissionServiceMetrics {
    verdicts: Counter<u64>,
}

/// Decides every request once, forwarding only admitted requests to the inner service.
#[derive(Debug)]
pub struct AdmissionService<G, S>
where
    G: ?Sized,
{
    inner: S,
    gate: Arc<G>,
    instruments: AdmissionServiceMetrics,
}

pin_project! {
    /// Either the inner service future or an immediate rejection.
    pub struct ResponseFuture<F> {
        #[pin]
        state: State<F>,
    }
}

pin_project! {
    #[project = StateProj]
    enum State<F> {
        Admitted {
            #[pin]
            inner: F,
        },
        Rejected {
            error: Option<FlashError>,
        },
    }
}

impl<F> ResponseFuture<F> {
    fn admitted(inner: F) -> Self {
        Self {
            state: State::Admitted { inner },
        }
    }

    fn rejected(error: FlashError) -> Self {
        Self {
            state: State::Rejected { error: Some(error) },
        }
    }
}

impl<F, T, E> Future for ResponseFuture<F>
where
    F: Future<Output = Result<T, E>>,
    E: From<BoxError>,
{
    type Output = Result<T, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.project().state.project() {
            StateProj::Admitted { inner } => inner.poll(cx),
            StateProj::Rejected { error } => {
                // Only polled again after completion by a misbehaving caller
                let error = error.take().unwrap_or(FlashError::SoldOut);
                Poll::Ready(Err(E::from(BoxError::from(error))))
            }
        }
    }
}

impl<G, S> Clone for AdmissionService<G, S>
where
    G: ?Sized,
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            gate: Arc::clone(&self.gate),
            instruments: self.instruments.clone(),
        }
    }
}

impl<G, S, Req> Service<Req> for AdmissionService<G, S>
where
    G: Gate + ?Sized + Send + Sync + 'static,
    S: Service<Req, Error = BoxError>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = ResponseFuture<S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        // Admission is decided per call, so readiness is purely the inner service's
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Req) -> Self::Future {
        let verdict = self.gate.decide();
        self.instruments
            .verdicts
            .add(1, &[KeyValue::new("verdict", verdict.as_str())]);

        match verdict {
            Verdict::Admit => ResponseFuture::admitted(self.inner.call(req)),
            Verdict::NotStarted => ResponseFuture::rejected(FlashError::NotStarted {
                opens_in: self.gate.opens_in(),
            }),
            Verdict::Blocked => ResponseFuture::rejected(FlashError::SoldOut),
        }
    }
}

impl<G, S> AdmissionService<G, S>
where
    G: ?Sized,
{
    pub fn new(inner: S, gate: Arc<G>) -> Self {
        let meter = global::meter("admission_service");
        let instruments = AdmissionServiceMetrics {
            verdicts: meter.u64_counter("admission_verdicts").build(),
        };

        Self {
            inner,
            gate,
            instruments,
        }
    }

    /// The gate shared by every clone of this service.
    pub fn gate(&self) -> &Arc<G> {
        &self.gate
    }
}
