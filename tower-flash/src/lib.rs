//! # Tower Flash
//!
//! `tower-flash` puts a [`flash_limit`] admission gate in front of any
//! [Tower](https://github.com/tower-rs/tower) service.
//!
//! ## The Managed Stack
//! [`AdmissionLayer`] decides every request exactly once, when it is called, and
//! forwards only admitted requests. The [`ManagedAdmissionLayer`] adds the
//! production concerns around it:
//!
//! 1. **Immediate Rejection**: Requests arriving before the sale opens fail with
//!    `FlashError::NotStarted`; blocked requests fail with `FlashError::SoldOut`.
//!    Neither ever waits in a queue.
//! 2. **Timeouts**: Admitted requests must complete within a defined duration,
//!    failing with `FlashError::Timeout` otherwise.
//! 3. **Error Mapping**: Internal Tower errors (like `tower::timeout::error::Elapsed`)
//!    are converted into a unified, cloneable [`FlashError`] domain.
//!
//! ## Cluster Counter
//! [`QueuedCounter`] forwards admissions to a shared counter service on a
//! bounded queue, so reporting never blocks a decision.
//!
//! ## Feature Flags
//!
//! - `axum`: Enables `IntoResponse` for [`FlashError`], allowing automatic conversion
//!   to HTTP status codes (403, 503, 408, 500).

mod counter;
mod error;
mod layer;
mod managed_layer;
mod service;
mod utils;


pub use counter::CounterForwarder;
pub use counter::QueuedCounter;
pub use error::FlashError;
pub use layer::AdmissionLayer;
pub use managed_layer::ManagedAdmissionLayer;
pub use service::AdmissionService;
pub use service::ResponseFuture;
pub use utils::ServiceBuilderExt;
