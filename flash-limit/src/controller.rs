use std::fmt;
use std::sync::Arc;
use std::sync::atomic::AtomicI64;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;

use tracing::debug;
use tracing::warn;

use crate::AdmissionConfig;
use crate::ClockGate;
use crate::ClockSource;
use crate::CounterClient;
use crate::EntropySource;
use crate::Gate;
use crate::LoadShedFilter;
use crate::SystemClock;
use crate::ThreadRngEntropy;
use crate::Verdict;

const NOT_OBSERVED: i64 = i64::MIN;

/// The per-instance admission decision unit.
///
/// Combines a [`ClockGate`], a capacity cap and a [`LoadShedFilter`]. The permit
/// count is only ever raised through a single atomic check-and-increment, so
/// concurrent callers can never push it past `max_permission`.
///
/// Admissions are reported to an optional [`CounterClient`]. The cluster value
/// is advisory: it is recorded and logged, never consulted to gate a request.
/// A fleet of `n` controllers therefore admits up to `n * max_permission`
/// requests in total.
pub struct AdmissionController {
    config: AdmissionConfig,
    filter: LoadShedFilter,
    permitted: AtomicU64,
    last_cluster_count: AtomicI64,
    clock: Box<dyn ClockSource>,
    entropy: Box<dyn EntropySource>,
    counter: Option<Arc<dyn CounterClient>>,
}

impl fmt::Debug for AdmissionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdmissionController")
            .field("config", &self.config)
            .field("permitted", &self.permitted())
            .field("last_cluster_count", &self.last_cluster_count())
            .finish_non_exhaustive()
    }
}

impl Gate for AdmissionController {
    fn decide(&self) -> Verdict {
        let now = self.clock.now();
        if !ClockGate::is_open(now, self.config.start_time()) {
            debug!(verdict = Verdict::NotStarted.as_str(), "admission decided");
            return Verdict::NotStarted;
        }

        // Always sample once the sale is open so the shed share stays meaningful.
        let sampled = self.filter.should_admit_sample(self.entropy.as_ref());

        let verdict = if sampled && self.try_permit() {
            self.signal_cluster();
            Verdict::Admit
        } else {
            Verdict::Blocked
        };

        debug!(
            verdict = verdict.as_str(),
            permitted = self.permitted(),
            cluster_count = ?self.last_cluster_count(),
            "admission decided"
        );
        verdict
    }

    fn opens_in(&self) -> Option<Duration> {
        ClockGate::opens_in(self.clock.now(), self.config.start_time())
    }
}

impl AdmissionController {
    /// Creates a controller using the system clock, the thread RNG and no cluster counter.
    pub fn new(config: AdmissionConfig) -> Self {
        Self {
            filter: LoadShedFilter::new(config.block_ratio()),
            config,
            permitted: AtomicU64::new(0),
            last_cluster_count: AtomicI64::new(NOT_OBSERVED),
            clock: Box::new(SystemClock),
            entropy: Box::new(ThreadRngEntropy),
            counter: None,
        }
    }

    /// Replaces the wall clock consulted by the clock gate.
    pub fn with_clock<C>(mut self, clock: C) -> Self
    where
        C: ClockSource + 'static,
    {
        self.clock = Box::new(clock);
        self
    }

    /// Replaces the uniform sampler consumed by the load-shed filter.
    pub fn with_entropy<E>(mut self, entropy: E) -> Self
    where
        E: EntropySource + 'static,
    {
        self.entropy = Box::new(entropy);
        self
    }

    /// Reports every admission to `counter`.
    ///
    /// The client is called on the decision path and must not block.
    pub fn with_counter(mut self, counter: Arc<dyn CounterClient>) -> Self {
        self.counter = Some(counter);
        self
    }

    pub fn config(&self) -> &AdmissionConfig {
        &self.config
    }

    /// The number of requests admitted so far. Never decreases.
    pub fn permitted(&self) -> u64 {
        self.permitted.load(Ordering::Acquire)
    }

    /// The number of permits left before every request is blocked.
    pub fn remaining(&self) -> u64 {
        self.config.max_permission().saturating_sub(self.permitted())
    }

    /// The last value reported by the cluster counter, if any update succeeded.
    pub fn last_cluster_count(&self) -> Option<i64> {
        match self.last_cluster_count.load(Ordering::Acquire) {
            NOT_OBSERVED => None,
            count => Some(count),
        }
    }

    fn try_permit(&self) -> bool {
        let max = self.config.max_permission();
        self.permitted
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |val| {
                if val < max { Some(val + 1) } else { None }
            })
            .is_ok()
    }

    fn signal_cluster(&self) {
        let Some(counter) = &self.counter else {
            return;
        };
        let name = self.config.counter_name();
        match counter.increment(name, 1) {
            Ok(count) => {
                // Concurrent admissions can report out of order; keep the highest seen
                self.last_cluster_count.fetch_max(count, Ordering::AcqRel);
            }
            Err(e) => warn!(counter = name, error = %e, "cluster counter update skipped"),
        }
    }
}
