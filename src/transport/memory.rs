//! In-memory transport implementations.
//!
//! Used by the integration tests and for local experimentation. Delay
//! visibility is driven by the tokio clock, so paused-time tests advance
//! delayed units deterministically.

use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use super::{ConsumerGate, QueueUnit, TransportError, WorkQueue};

struct DelayedUnit {
    body: String,
    delay: Duration,
    visible_at: Instant,
}

struct QueueInner {
    ready: VecDeque<String>,
    delayed: Vec<DelayedUnit>,
    in_flight: HashMap<String, String>,
    next_receipt: u64,
    /// Number of upcoming `receive_one` calls that fail as unavailable.
    fail_receives: u32,
    /// Number of upcoming `delete` calls that fail as unavailable.
    fail_deletes: u32,
}

/// In-memory [`WorkQueue`] with delay visibility and receipt tracking.
pub struct InMemoryQueue {
    inner: Mutex<QueueInner>,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(QueueInner {
                ready: VecDeque::new(),
                delayed: Vec::new(),
                in_flight: HashMap::new(),
                next_receipt: 0,
                fail_receives: 0,
                fail_deletes: 0,
            }),
        }
    }

    /// Push a unit that is immediately visible.
    pub fn push(&self, body: impl Into<String>) {
        self.inner.lock().unwrap().ready.push_back(body.into());
    }

    /// Make the next `n` receives fail with a transient error.
    pub fn fail_next_receives(&self, n: u32) {
        self.inner.lock().unwrap().fail_receives = n;
    }

    /// Make the next `n` deletes fail with a transient error.
    pub fn fail_next_deletes(&self, n: u32) {
        self.inner.lock().unwrap().fail_deletes = n;
    }

    /// Number of immediately visible units.
    pub fn ready_len(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.ready.len()
            + inner
                .delayed
                .iter()
                .filter(|d| d.visible_at <= Instant::now())
                .count()
    }

    /// Number of received-but-not-deleted units.
    pub fn in_flight_len(&self) -> usize {
        self.inner.lock().unwrap().in_flight.len()
    }

    /// The enqueue delays of all still-delayed units, in seconds.
    pub fn delayed_delays(&self) -> Vec<u64> {
        self.inner
            .lock()
            .unwrap()
            .delayed
            .iter()
            .map(|d| d.delay.as_secs())
            .collect()
    }
}

impl Default for InMemoryQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WorkQueue for InMemoryQueue {
    async fn receive_one(&self) -> Result<Option<QueueUnit>, TransportError> {
        let mut inner = self.inner.lock().unwrap();

        if inner.fail_receives > 0 {
            inner.fail_receives -= 1;
            return Err(TransportError::Unavailable("injected receive failure".into()));
        }

        // Promote delayed units whose visibility deadline has passed.
        let now = Instant::now();
        let mut i = 0;
        while i < inner.delayed.len() {
            if inner.delayed[i].visible_at <= now {
                let unit = inner.delayed.swap_remove(i);
                inner.ready.push_back(unit.body);
            } else {
                i += 1;
            }
        }

        match inner.ready.pop_front() {
            Some(body) => {
                inner.next_receipt += 1;
                let receipt = format!("rcpt-{}", inner.next_receipt);
                inner.in_flight.insert(receipt.clone(), body.clone());
                Ok(Some(QueueUnit { body, receipt }))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, receipt: &str) -> Result<(), TransportError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_deletes > 0 {
            inner.fail_deletes -= 1;
            return Err(TransportError::Unavailable("injected delete failure".into()));
        }
        // Idempotent: a second delete of the same receipt is a no-op.
        inner.in_flight.remove(receipt);
        Ok(())
    }

    async fn enqueue(&self, body: String, delay: Duration) -> Result<(), TransportError> {
        let mut inner = self.inner.lock().unwrap();
        if delay.is_zero() {
            inner.ready.push_back(body);
        } else {
            inner.delayed.push(DelayedUnit {
                body,
                delay,
                visible_at: Instant::now() + delay,
            });
        }
        Ok(())
    }
}

/// In-memory [`ConsumerGate`] with programmable failures and a call log.
pub struct InMemoryGate {
    enabled: Mutex<HashMap<String, bool>>,
    calls: Mutex<Vec<(String, bool)>>,
    fail_calls: AtomicU32,
}

impl InMemoryGate {
    pub fn new() -> Self {
        Self {
            enabled: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            fail_calls: AtomicU32::new(0),
        }
    }

    /// Make the next `n` gate calls fail.
    pub fn fail_next_calls(&self, n: u32) {
        self.fail_calls.store(n, Ordering::SeqCst);
    }

    /// Whether a consumer's intake is currently enabled. Consumers start
    /// enabled.
    pub fn is_enabled(&self, consumer_id: &str) -> bool {
        *self
            .enabled
            .lock()
            .unwrap()
            .get(consumer_id)
            .unwrap_or(&true)
    }

    /// Every `set_enabled` call observed, in order.
    pub fn calls(&self) -> Vec<(String, bool)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for InMemoryGate {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConsumerGate for InMemoryGate {
    async fn set_enabled(&self, consumer_id: &str, enabled: bool) -> Result<(), TransportError> {
        if self
            .fail_calls
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(TransportError::Unavailable("injected gate failure".into()));
        }

        self.calls
            .lock()
            .unwrap()
            .push((consumer_id.to_string(), enabled));
        self.enabled
            .lock()
            .unwrap()
            .insert(consumer_id.to_string(), enabled);
        Ok(())
    }
}
