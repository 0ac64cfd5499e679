//! System configuration parameters
//!
//! All tunable parameters for the oven control core. Values can be
//! overridden via the flash store (see `adapters::nvs`); integration tests
//! shrink the intervals to keep scenario runtimes short.

use core::time::Duration;

use serde::{Deserialize, Serialize};

/// Convert a millisecond tunable into a [`Duration`].
pub(crate) fn millis(ms: u32) -> Duration {
    Duration::from_millis(u64::from(ms))
}

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OvenConfig {
    // --- Temperature acquisition ---
    /// Sampling interval while a job is cooking (milliseconds)
    pub temp_poll_cooking_ms: u32,
    /// Park timeout on the cooking flag while idle (milliseconds)
    pub temp_idle_park_ms: u32,

    // --- Relay arbitration ---
    /// Arbiter poll tick (milliseconds)
    pub arbiter_poll_ms: u32,
    /// Emergency-stop re-poll interval inside the emergency regime (milliseconds)
    pub estop_recheck_ms: u32,

    // --- Cooking control ---
    /// Control-loop iteration pace (milliseconds)
    pub control_tick_ms: u32,
    /// Timeout for the per-iteration temperature peek (milliseconds)
    pub temp_wait_ms: u32,
    /// Hysteresis half-band around the target, in the job's unit (degrees)
    pub hysteresis_band_deg: f32,
    /// Consecutive temperature misses before a sensor fault is reported
    pub sensor_miss_limit: u32,
    /// Hold-off after a job exits before the next one is picked up (milliseconds)
    pub cooldown_ms: u32,
    /// Retry interval while waiting for a plausible wall clock (milliseconds)
    pub clock_retry_ms: u32,

    // --- Remote link ---
    /// Demand-driven connect poll while disconnected (milliseconds)
    pub connect_poll_ms: u32,
    /// Quiet period after which the connection is torn down (milliseconds)
    pub idle_disconnect_ms: u32,
    /// Registration re-send interval until the ack arrives (milliseconds)
    pub register_retry_ms: u32,

    // --- Reporting ---
    /// Cooking-state edge detector poll (milliseconds)
    pub cooking_state_poll_ms: u32,
}

impl Default for OvenConfig {
    fn default() -> Self {
        Self {
            // Temperature acquisition
            temp_poll_cooking_ms: 1_000,
            temp_idle_park_ms: 30_000,

            // Relay arbitration
            arbiter_poll_ms: 1_000,
            estop_recheck_ms: 500,

            // Cooking control
            control_tick_ms: 250,
            temp_wait_ms: 100,
            hysteresis_band_deg: 5.0,
            sensor_miss_limit: 10,
            cooldown_ms: 5_000,
            clock_retry_ms: 1_000,

            // Remote link
            connect_poll_ms: 1_000,
            idle_disconnect_ms: 10_000,
            register_retry_ms: 5_000,

            // Reporting
            cooking_state_poll_ms: 1_000,
        }
    }
}
