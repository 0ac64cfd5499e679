//! Wall-clock adapter.
//!
//! Implements [`ClockPort`] for job timing.
//!
//! - **`target_os = "espidf"`** — wraps `gettimeofday()`; meaningful once
//!   SNTP has synced (the binary starts SNTP at boot).
//! - **all other targets** — a simulated clock: an injectable base epoch
//!   plus real elapsed time, so tests control validity and progression.

use crate::ports::ClockPort;

// ───────────────────────────────────────────────────────────────
// ESP-IDF
// ───────────────────────────────────────────────────────────────

/// System wall clock (SNTP-synced).
#[cfg(target_os = "espidf")]
pub struct SystemClock;

#[cfg(target_os = "espidf")]
impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(target_os = "espidf")]
impl ClockPort for SystemClock {
    fn epoch_secs(&self) -> u64 {
        use core::ptr;
        let mut tv = esp_idf_svc::sys::timeval { tv_sec: 0, tv_usec: 0 };
        if unsafe { esp_idf_svc::sys::gettimeofday(&mut tv, ptr::null_mut()) } != 0 {
            return 0;
        }
        tv.tv_sec.max(0) as u64
    }
}

// ───────────────────────────────────────────────────────────────
// Simulation
// ───────────────────────────────────────────────────────────────

/// Simulated wall clock for host targets: base epoch + real elapsed time.
///
/// A base of `0` models an unsynced clock; `set_epoch` models an SNTP step.
pub struct SimClock {
    base: std::sync::Arc<core::sync::atomic::AtomicU64>,
    started: std::time::Instant,
}

impl SimClock {
    /// Start at epoch 0 (unsynced).
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    /// Start at the given epoch second.
    pub fn starting_at(epoch_secs: u64) -> Self {
        Self {
            base: std::sync::Arc::new(core::sync::atomic::AtomicU64::new(epoch_secs)),
            started: std::time::Instant::now(),
        }
    }

    /// Handle for stepping the clock from a test while tasks hold the clock.
    pub fn handle(&self) -> std::sync::Arc<core::sync::atomic::AtomicU64> {
        self.base.clone()
    }

    /// Step the base epoch (models a time sync).
    pub fn set_epoch(&self, epoch_secs: u64) {
        self.base
            .store(epoch_secs, core::sync::atomic::Ordering::SeqCst);
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockPort for SimClock {
    fn epoch_secs(&self) -> u64 {
        let base = self.base.load(core::sync::atomic::Ordering::SeqCst);
        if base == 0 {
            return 0;
        }
        base + self.started.elapsed().as_secs()
    }
}
