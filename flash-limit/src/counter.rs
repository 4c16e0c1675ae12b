use std::collections::HashMap;
use std::sync::Arc;
use std::sync::PoisonError;
use std::sync::RwLock;
use std::sync::atomic::AtomicI64;
use std::sync::atomic::Ordering;

use crate::CoordinationError;

/// The capability consumed from the cluster-wide coordination service.
///
/// Implementations must not block the caller: `increment` sits on the request
/// hot path. Remote clients should enqueue the update and return immediately.
pub trait CounterClient: Send + Sync {
    /// Adds `delta` to the named counter and returns the new (or last observed) value.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinationError`] when the update could not be delivered.
    fn increment(&self, name: &str, delta: i64) -> Result<i64, CoordinationError>;
}

impl<C> CounterClient for Arc<C>
where
    C: CounterClient + ?Sized,
{
    fn increment(&self, name: &str, delta: i64) -> Result<i64, CoordinationError> {
        self.as_ref().increment(name, delta)
    }
}

/// Discards every update.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopCounter;

impl CounterClient for NoopCounter {
    fn increment(&self, _name: &str, _delta: i64) -> Result<i64, CoordinationError> {
        Ok(0)
    }
}

/// A set of named counters held in process memory.
///
/// Useful when every controller of a "cluster" lives in the same process, and as
/// a stand-in for the real service in tests.
#[derive(Debug, Default)]
pub struct LocalCounter {
    counters: RwLock<HashMap<String, Arc<AtomicI64>>>,
}

impl LocalCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current value of `name`, or `0` if it was never incremented.
    pub fn get(&self, name: &str) -> i64 {
        self.counters
            .read()
            .ok()
            .and_then(|counters| counters.get(name).map(|c| c.load(Ordering::Acquire)))
            .unwrap_or(0)
    }

    fn slot(&self, name: &str) -> Result<Arc<AtomicI64>, CoordinationError> {
        if let Some(slot) = self.counters.read().map_err(poisoned)?.get(name) {
            return Ok(Arc::clone(slot));
        }
        let mut counters = self.counters.write().map_err(poisoned)?;
        Ok(Arc::clone(counters.entry(name.to_string()).or_default()))
    }
}

fn poisoned<T>(_: PoisonError<T>) -> CoordinationError {
    CoordinationError::Unreachable("counter table poisoned".to_string())
}

impl CounterClient for LocalCounter {
    fn increment(&self, name: &str, delta: i64) -> Result<i64, CoordinationError> {
        let slot = self.slot(name)?;
        Ok(slot.fetch_add(delta, Ordering::AcqRel) + delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_tracks_named_counters_independently() {
        let counter = LocalCounter::new();

        assert_eq!(counter.increment("counter", 1), Ok(1));
        assert_eq!(counter.increment("counter", 2), Ok(3));
        assert_eq!(counter.increment("other", 5), Ok(5));
        assert_eq!(counter.get("counter"), 3);
        assert_eq!(counter.get("missing"), 0);
    }

    #[tokio::test]
    async fn test_actual_concurrency() {
        let counter = Arc::new(LocalCounter::new());
        let mut handles = vec![];

        for _ in 0..64 {
            let counter = Arc::clone(&counter);
            handles.push(tokio::spawn(async move { counter.increment("counter", 1) }));
        }

        let results = futures::future::join_all(handles).await;
        assert!(results.iter().all(|r| matches!(r, Ok(Ok(_)))));
        assert_eq!(counter.get("counter"), 64);
    }

    #[test]
    fn test_noop_counter() {
        assert_eq!(NoopCounter.increment("counter", 10), Ok(0));
    }
}
