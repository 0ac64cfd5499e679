//! Single-slot inter-task mailboxes.
//!
//! Two deliberately distinct disciplines:
//!
//! - [`Latest`] — *overwrite* slot. A publish always succeeds and discards
//!   the previous value; consumers get freshness, never history. Used for
//!   temperature samples and pending job descriptors.
//! - [`Outbox`] — *blocking producer* channel. A send waits until the
//!   consumer has drained the previous message, so competing producers
//!   serialize instead of racing to overwrite each other. Used for outbound
//!   status messages.
//!
//! Collapsing the two would lose either the freshness guarantee or the
//! backpressure guarantee, so both primitives stay.
//!
//! Timed waits are reactor-driven polls (`async-io-mini` timers) at a short
//! fixed step; every consumer in the system tolerates far more latency than
//! one step.

use core::cell::RefCell;
use core::time::Duration;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, TrySendError};

/// Step between probes of a timed wait.
pub(crate) const POLL_STEP: Duration = Duration::from_millis(20);

/// Probe `f` until it yields a value or `timeout` elapses.
///
/// Probes once immediately, so an already-satisfied wait never sleeps.
/// `Duration::MAX` waits indefinitely.
pub(crate) async fn poll_deadline<T>(
    timeout: Duration,
    mut probe: impl FnMut() -> Option<T>,
) -> Option<T> {
    if let Some(v) = probe() {
        return Some(v);
    }
    let mut remaining = timeout;
    loop {
        if remaining.is_zero() {
            return None;
        }
        let step = POLL_STEP.min(remaining);
        async_io_mini::Timer::after(step).await;
        remaining = remaining.saturating_sub(step);
        if let Some(v) = probe() {
            return Some(v);
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Latest — overwrite slot
// ───────────────────────────────────────────────────────────────

/// Size-one "latest value wins" slot.
///
/// One writer, any number of readers. `peek` clones without consuming (for
/// control loops that re-read the freshest sample every iteration); `take`
/// consumes (for forwarders that must see each publish at most once).
pub struct Latest<T: Clone> {
    cell: Mutex<CriticalSectionRawMutex, RefCell<Option<T>>>,
}

impl<T: Clone> Latest<T> {
    pub const fn new() -> Self {
        Self {
            cell: Mutex::new(RefCell::new(None)),
        }
    }

    /// Publish a value, discarding any previous one. Never blocks.
    pub fn publish(&self, value: T) {
        self.cell.lock(|c| {
            *c.borrow_mut() = Some(value);
        });
    }

    /// Clone the current value without consuming it.
    pub fn try_peek(&self) -> Option<T> {
        self.cell.lock(|c| c.borrow().clone())
    }

    /// Remove and return the current value.
    pub fn try_take(&self) -> Option<T> {
        self.cell.lock(|c| c.borrow_mut().take())
    }

    /// True if a value is waiting.
    pub fn is_pending(&self) -> bool {
        self.cell.lock(|c| c.borrow().is_some())
    }

    /// Wait up to `timeout` for a value, without consuming it.
    pub async fn peek(&self, timeout: Duration) -> Option<T> {
        poll_deadline(timeout, || self.try_peek()).await
    }

    /// Wait up to `timeout` for a value and consume it.
    pub async fn take(&self, timeout: Duration) -> Option<T> {
        poll_deadline(timeout, || self.try_take()).await
    }

    /// Wait indefinitely for a value and consume it.
    pub async fn recv(&self) -> T {
        // Duration::MAX never hits the deadline arm.
        match poll_deadline(Duration::MAX, || self.try_take()).await {
            Some(v) => v,
            None => unreachable!("unbounded wait returned without a value"),
        }
    }
}

impl<T: Clone> Default for Latest<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ───────────────────────────────────────────────────────────────
// Outbox — blocking-producer channel
// ───────────────────────────────────────────────────────────────

/// Bounded channel whose producers block until there is room.
///
/// With `N = 1` this is the outbound-message slot: no update is silently
/// dropped, at the cost of a coalescing delay for the producer.
pub struct Outbox<T, const N: usize = 1> {
    ch: Channel<CriticalSectionRawMutex, T, N>,
}

impl<T, const N: usize> Outbox<T, N> {
    pub const fn new() -> Self {
        Self { ch: Channel::new() }
    }

    /// Send, waiting for room. Producers serialize here.
    pub async fn send(&self, value: T) {
        self.ch.send(value).await;
    }

    /// Send only if there is room; returns the value back when full.
    pub fn try_send(&self, value: T) -> core::result::Result<(), T> {
        self.ch.try_send(value).map_err(|TrySendError::Full(v)| v)
    }

    /// Non-blocking receive.
    pub fn try_recv(&self) -> Option<T> {
        self.ch.try_receive().ok()
    }

    /// Wait indefinitely for the next message.
    pub async fn recv(&self) -> T {
        self.ch.receive().await
    }

    pub fn is_empty(&self) -> bool {
        self.ch.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ch.len()
    }
}

impl<T, const N: usize> Default for Outbox<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
