//! Device status registry.
//!
//! A process-wide set of named condition flags read and written by every
//! task; the only shared state besides the mailboxes. Owned explicitly (an
//! `Arc<DeviceStatus>` handed to each task at spawn), not an ambient global.
//!
//! Write authority is by convention, enforced nowhere else:
//! - `EMERGENCY_STOP` is set and cleared **only** by the external safety
//!   input wiring. Neither the cooking controller nor the relay arbiter may
//!   clear it.
//! - `IS_COOKING` is set and cleared **only** by the cooking controller and
//!   is the sole signal other tasks use to know a job is in flight.
//! - `WIFI_CONNECTED` belongs to the WiFi adapter; `CONNECTION_READY` and
//!   `REGISTERED` to the remote messaging client.
//!
//! Timeouts on [`DeviceStatus::wait`] are a normal outcome, not a failure —
//! the arbiter and acquisition loops use them as their poll tick.

use core::sync::atomic::{AtomicU32, Ordering};
use core::time::Duration;

use crate::mailbox::poll_deadline;

/// Hardware emergency stop is asserted.
pub const EMERGENCY_STOP: u32 = 1 << 0;
/// Station association with the access point is up.
pub const WIFI_CONNECTED: u32 = 1 << 1;
/// Transport-level backend connection is open.
pub const CONNECTION_READY: u32 = 1 << 2;
/// The backend has acknowledged this device's registration.
pub const REGISTERED: u32 = 1 << 3;
/// A cooking job is in flight.
pub const IS_COOKING: u32 = 1 << 4;

/// How a multi-bit [`DeviceStatus::wait`] mask is satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitMode {
    /// Any bit of the mask satisfies the wait.
    Any,
    /// Every bit of the mask must be set.
    All,
}

/// Thread-safe flag registry with timed condition waits.
pub struct DeviceStatus {
    bits: AtomicU32,
}

impl DeviceStatus {
    pub const fn new() -> Self {
        Self {
            bits: AtomicU32::new(0),
        }
    }

    /// Set the given flag bits.
    pub fn set(&self, mask: u32) {
        self.bits.fetch_or(mask, Ordering::SeqCst);
    }

    /// Clear the given flag bits.
    pub fn clear(&self, mask: u32) {
        self.bits.fetch_and(!mask, Ordering::SeqCst);
    }

    /// Snapshot of all flags.
    pub fn get(&self) -> u32 {
        self.bits.load(Ordering::SeqCst)
    }

    /// True if any bit of `mask` is set.
    pub fn any_set(&self, mask: u32) -> bool {
        self.get() & mask != 0
    }

    /// Wait until `mask` is satisfied per `mode`, or until `timeout`.
    ///
    /// Returns the flag snapshot at wake plus whether the wait timed out.
    /// The wait is reactor-timer polled; wake latency is bounded by one
    /// poll step (well under every consumer's tick interval).
    pub async fn wait(&self, mask: u32, mode: WaitMode, timeout: Duration) -> (u32, bool) {
        let satisfied = poll_deadline(timeout, || {
            let bits = self.get();
            let hit = match mode {
                WaitMode::Any => bits & mask != 0,
                WaitMode::All => bits & mask == mask,
            };
            hit.then_some(bits)
        })
        .await;

        match satisfied {
            Some(bits) => (bits, false),
            None => (self.get(), true),
        }
    }
}

impl Default for DeviceStatus {
    fn default() -> Self {
        Self::new()
    }
}
