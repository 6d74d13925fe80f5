//! TTL Scheduler
//!
//! One timer thread per engine. Requests arrive over a crossbeam channel and
//! deadlines are kept in a min-heap; the thread sleeps on the channel until
//! the earliest deadline, then fires every due timer.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;

use crate::error::Result;

use super::{deadline_after, ExpiryTarget, ShutdownMode, TimerId, TtlConfig};

/// Requests sent to the timer thread
enum Message {
    Schedule {
        id: TimerId,
        key: String,
        deadline: Instant,
    },
    Cancel {
        id: TimerId,
    },
    Shutdown(ShutdownMode),
}

/// Handle to the timer thread
///
/// Dropping the handle cancels every pending expiry and joins the thread.
pub struct TtlScheduler {
    sender: Sender<Message>,
    worker: Mutex<Option<JoinHandle<()>>>,
    pending: Arc<AtomicUsize>,
    next_id: AtomicU64,
}

impl TtlScheduler {
    /// Spawn the timer thread
    pub fn start(target: Arc<dyn ExpiryTarget>, config: TtlConfig) -> Result<Self> {
        let (sender, receiver) = channel::unbounded();
        let pending = Arc::new(AtomicUsize::new(0));

        let worker = Worker {
            target,
            config,
            receiver,
            heap: BinaryHeap::new(),
            timers: HashMap::new(),
            by_key: HashMap::new(),
            pending: Arc::clone(&pending),
        };

        let handle = thread::Builder::new()
            .name("linekv-ttl".to_string())
            .spawn(move || worker.run())?;

        tracing::debug!("TTL scheduler started");

        Ok(Self {
            sender,
            worker: Mutex::new(Some(handle)),
            pending,
            next_id: AtomicU64::new(0),
        })
    }

    /// Expire `key` once `ttl` has elapsed
    ///
    /// Fails with `TtlOutOfRange` if the deadline overflows; nothing is
    /// scheduled in that case.
    pub fn schedule(&self, key: &str, ttl: Duration) -> Result<TimerId> {
        Ok(self.schedule_at(key, deadline_after(ttl)?))
    }

    /// Expire `key` at `deadline`
    ///
    /// Replaces any timer already pending for the same key.
    pub fn schedule_at(&self, key: &str, deadline: Instant) -> TimerId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let message = Message::Schedule {
            id,
            key: key.to_string(),
            deadline,
        };
        if self.sender.send(message).is_err() {
            tracing::warn!(key = %key, "TTL scheduler stopped, expiry not scheduled");
        }
        id
    }

    /// Drop timer `id` if it is still pending
    pub fn cancel(&self, id: TimerId) {
        let _ = self.sender.send(Message::Cancel { id });
    }

    /// Timers the worker has accepted and not yet fired
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Stop the timer thread and wait for it
    ///
    /// `Cancel` discards pending timers; `Drain` waits for each to fire.
    /// Calling this more than once is a no-op.
    pub fn shutdown(&self, mode: ShutdownMode) {
        let Some(handle) = self.worker.lock().take() else {
            return;
        };

        let _ = self.sender.send(Message::Shutdown(mode));
        if handle.join().is_err() {
            tracing::error!("TTL scheduler thread panicked");
        }
    }
}

impl Drop for TtlScheduler {
    fn drop(&mut self) {
        self.shutdown(ShutdownMode::Cancel);
    }
}

/// A timer waiting in the heap
struct Timer {
    key: String,
    attempts: u32,
}

/// State owned by the timer thread
struct Worker {
    target: Arc<dyn ExpiryTarget>,
    config: TtlConfig,
    receiver: Receiver<Message>,

    /// (deadline, timer id), earliest first. Entries whose id is no longer
    /// in `timers` were cancelled or replaced and are skipped.
    heap: BinaryHeap<Reverse<(Instant, TimerId)>>,
    timers: HashMap<TimerId, Timer>,
    by_key: HashMap<String, TimerId>,

    pending: Arc<AtomicUsize>,
}

impl Worker {
    fn run(mut self) {
        loop {
            self.fire_due();

            let received = match self.next_deadline() {
                Some(deadline) => match self.receiver.recv_deadline(deadline) {
                    Ok(message) => Some(message),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => break,
                },
                None => match self.receiver.recv() {
                    Ok(message) => Some(message),
                    Err(_) => break,
                },
            };

            match received {
                Some(Message::Schedule { id, key, deadline }) => self.add(id, key, deadline),
                Some(Message::Cancel { id }) => self.remove(id),
                Some(Message::Shutdown(ShutdownMode::Cancel)) => break,
                Some(Message::Shutdown(ShutdownMode::Drain)) => {
                    self.drain();
                    break;
                }
                None => {}
            }
            self.publish_pending();
        }

        if !self.timers.is_empty() {
            tracing::info!(cancelled = self.timers.len(), "Pending expiries cancelled");
        }
        self.timers.clear();
        self.publish_pending();
        tracing::debug!("TTL scheduler stopped");
    }

    fn add(&mut self, id: TimerId, key: String, deadline: Instant) {
        if let Some(previous) = self.by_key.get(&key).copied() {
            self.remove(previous);
        }

        tracing::debug!(key = %key, id, "Expiry scheduled");
        self.heap.push(Reverse((deadline, id)));
        self.by_key.insert(key.clone(), id);
        self.timers.insert(id, Timer { key, attempts: 0 });
    }

    fn remove(&mut self, id: TimerId) {
        if let Some(timer) = self.timers.remove(&id) {
            if self.by_key.get(&timer.key) == Some(&id) {
                self.by_key.remove(&timer.key);
            }
            tracing::trace!(key = %timer.key, id, "Expiry cancelled");
        }
    }

    fn next_deadline(&mut self) -> Option<Instant> {
        // Discard stale heap entries so the thread never wakes for them.
        while let Some(Reverse((deadline, id))) = self.heap.peek().copied() {
            if self.timers.contains_key(&id) {
                return Some(deadline);
            }
            self.heap.pop();
        }
        None
    }

    fn fire_due(&mut self) {
        let now = Instant::now();

        while let Some(Reverse((deadline, id))) = self.heap.peek().copied() {
            if deadline > now {
                break;
            }
            self.heap.pop();

            let Some(timer) = self.timers.remove(&id) else {
                continue;
            };
            if self.by_key.get(&timer.key) == Some(&id) {
                self.by_key.remove(&timer.key);
            }
            self.fire(id, timer);
        }

        self.publish_pending();
    }

    fn fire(&mut self, id: TimerId, timer: Timer) {
        match self.target.expire(&timer.key, id) {
            Ok(()) => {
                tracing::debug!(key = %timer.key, "Record expired");
            }
            Err(e) if e.is_not_found() => {
                tracing::debug!(key = %timer.key, "Expired record already absent");
            }
            Err(e) if e.is_transient() && timer.attempts < self.config.max_retries => {
                tracing::debug!(
                    key = %timer.key,
                    attempt = timer.attempts + 1,
                    "Lock busy on expiry, retrying"
                );
                let deadline = Instant::now() + self.config.retry_interval;
                self.heap.push(Reverse((deadline, id)));
                self.by_key.insert(timer.key.clone(), id);
                self.timers.insert(
                    id,
                    Timer {
                        key: timer.key,
                        attempts: timer.attempts + 1,
                    },
                );
            }
            Err(e) => {
                tracing::warn!(key = %timer.key, error = %e, "Expiry failed");
            }
        }
    }

    /// Fire every remaining timer at its deadline, ignoring new requests
    fn drain(&mut self) {
        tracing::debug!(pending = self.timers.len(), "Draining pending expiries");

        while let Some(deadline) = self.next_deadline() {
            let wait = deadline.saturating_duration_since(Instant::now());
            if !wait.is_zero() {
                thread::sleep(wait);
            }
            self.fire_due();
        }
    }

    fn publish_pending(&self) {
        self.pending.store(self.timers.len(), Ordering::SeqCst);
    }
}
