//! # flash-limit
//!
//! `flash-limit` decides, per request, whether a flash sale lets the request through.
//!
//! ## Core Philosophy
//!
//! Admission is decided locally and without blocking. Each [`AdmissionController`] owns an
//! atomic budget of permits and combines it with a wall-clock gate and a randomized
//! load-shedding filter. The only synchronization point is a single Compare-And-Swap on
//! the permit counter, so the configured capacity is never overshot even when many
//! threads decide at once.
//!
//! ## Key Concepts
//!
//! * **Clock Gate**: Requests arriving before the sale start are rejected as
//!   [`Verdict::NotStarted`] without touching any state.
//! * **Load Shedding**: A uniform sample is compared against the configured block ratio,
//!   randomly rejecting a share of otherwise eligible requests.
//! * **Capacity Cap**: At most `max_permission` requests are admitted per controller.
//! * **Cluster Counter**: Admissions are reported to a [`CounterClient`] on a best-effort
//!   basis. The value is observed and logged but never gates a decision.
//!
//! ## Example
//!
//! ```rust
//! use flash_limit::AdmissionConfig;
//! use flash_limit::AdmissionController;
//! use flash_limit::BlockRatio;
//! use flash_limit::Gate;
//! use flash_limit::Verdict;
//! use std::time::SystemTime;
//!
//! let config = AdmissionConfig::new(100, BlockRatio::new(0.0).unwrap(), SystemTime::UNIX_EPOCH);
//! let controller = AdmissionController::new(config);
//!
//! if controller.decide() == Verdict::Admit {
//!     // Request allowed
//! }
//! ```

use std::fmt::Debug;
use std::time::Duration;

mod clock;
mod config;
mod controller;
mod counter;
mod error;
mod shed;

pub use clock::ClockGate;
pub use clock::ClockSource;
pub use clock::SystemClock;
pub use config::AdmissionConfig;
pub use config::DEFAULT_COUNTER_NAME;
pub use controller::AdmissionController;
pub use counter::CounterClient;
pub use counter::LocalCounter;
pub use counter::NoopCounter;
pub use error::ConfigError;
pub use error::CoordinationError;
pub use shed::BlockRatio;
pub use shed::EntropySource;
pub use shed::LoadShedFilter;
pub use shed::ThreadRngEntropy;

/// The outcome of a single admission decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// The request may proceed to the real handler.
    Admit,
    /// The sale has not opened yet.
    NotStarted,
    /// Capacity is exhausted or the request was shed.
    Blocked,
}

impl Verdict {
    pub fn is_admit(&self) -> bool {
        matches!(self, Verdict::Admit)
    }

    /// A short, stable label suitable for metric attributes and log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Admit => "admit",
            Verdict::NotStarted => "not_started",
            Verdict::Blocked => "blocked",
        }
    }
}

/// The core trait for admission decision units.
///
/// Gates must be `Send` and `Sync` to allow sharing across thread boundaries
/// via `Arc`.
pub trait Gate: Debug {
    /// Decides the fate of a single request.
    ///
    /// This method is non-blocking and total: it always produces exactly one
    /// [`Verdict`].
    fn decide(&self) -> Verdict;

    /// How long until this gate starts admitting requests, if it has not opened yet.
    fn opens_in(&self) -> Option<Duration> {
        None
    }
}
