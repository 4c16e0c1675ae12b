use std::num::NonZeroUsize;
use std::io;
use std::sync::Arc;
use std::sync::RwLock;
use std::sync::atomic::AtomicI64;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::thread;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::debug;
use tracing::warn;

use flash_limit::CoordinationError;
use flash_limit::CounterClient;

#[derive(Debug)]
struct Update {
    name: Arc<str>,
    delta: i64,
}

/// A non-blocking [`CounterClient`] that forwards updates on a bounded queue.
///
/// `increment` never waits: when the queue is full the update is dropped and
/// [`CoordinationError::QueueFull`] is returned. The value returned on success is
/// the last one observed from the downstream client, so it lags queued updates.
#[derive(Clone, Debug)]
pub struct QueuedCounter {
    sender: mpsc::Sender<Update>,
    observed: Arc<AtomicI64>,
    dropped: Arc<AtomicU64>,
    // Admissions nearly always report to the same counter
    last_name: Arc<RwLock<Arc<str>>>,
}

/// Drains a [`QueuedCounter`] into the real counter client.
#[derive(Debug)]
pub struct CounterForwarder {
    receiver: mpsc::Receiver<Update>,
    observed: Arc<AtomicI64>,
}

impl QueuedCounter {
    /// Creates a queue holding at most `capacity` pending updates, and the
    /// forwarder that drains it.
    pub fn new(capacity: NonZeroUsize) -> (Self, CounterForwarder) {
        let (sender, receiver) = mpsc::channel(capacity.get());
        let observed = Arc::new(AtomicI64::new(0));

        let queue = Self {
            sender,
            observed: Arc::clone(&observed),
            dropped: Arc::new(AtomicU64::new(0)),
            last_name: Arc::new(RwLock::new(Arc::from(""))),
        };
        (queue, CounterForwarder { receiver, observed })
    }

    /// Creates a queue and runs its forwarder on a dedicated `cluster-counter` thread.
    ///
    /// The forwarder exits once every clone of the returned `QueuedCounter` is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned.
    pub fn spawn<C>(
        client: C,
        capacity: NonZeroUsize,
    ) -> io::Result<(Self, thread::JoinHandle<()>)>
    where
        C: CounterClient + 'static,
    {
        let (queue, forwarder) = Self::new(capacity);
        let handle = thread::Builder::new()
            .name("cluster-counter".to_string())
            .spawn(move || forwarder.run(client))?;
        Ok((queue, handle))
    }

    /// The number of updates dropped because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn intern(&self, name: &str) -> Arc<str> {
        if let Ok(last) = self.last_name.read() {
            if &**last == name {
                return Arc::clone(&last);
            }
        }
        let interned: Arc<str> = Arc::from(name);
        if let Ok(mut last) = self.last_name.write() {
            *last = Arc::clone(&interned);
        }
        interned
    }
}

impl CounterClient for QueuedCounter {
    fn increment(&self, name: &str, delta: i64) -> Result<i64, CoordinationError> {
        let update = Update {
            name: self.intern(name),
            delta,
        };
        match self.sender.try_send(update) {
            Ok(()) => Ok(self.observed.load(Ordering::Acquire)),
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                Err(CoordinationError::QueueFull)
            }
            Err(TrySendError::Closed(_)) => Err(CoordinationError::Closed),
        }
    }
}

impl CounterForwarder {
    /// Forwards queued updates to `client` until every sender is gone.
    ///
    /// This blocks the current thread; run it on a dedicated or blocking thread.
    pub fn run<C>(mut self, client: C)
    where
        C: CounterClient,
    {
        while let Some(update) = self.receiver.blocking_recv() {
            match client.increment(&update.name, update.delta) {
                Ok(count) => {
                    debug!(counter = &*update.name, count, "cluster counter updated");
                    self.observed.store(count, Ordering::Release);
                }
                Err(e) => warn!(counter = &*update.name, error = %e, "cluster counter update lost"),
            }
        }
    }
}
