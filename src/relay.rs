//! Relay arbitration.
//!
//! The arbiter owns the physical actuator bus. Every poll tick it settles
//! one of three mutually exclusive regimes, strictly in priority order:
//!
//! ```text
//!  EMERGENCY  (stop flag set)      — every output de-energized, re-poll
//!     ≻                              every 500 ms until the flag lifts
//!  IDLE       (no cooking job)     — every output de-energized; stale
//!     ≻                              requested bits are ignored
//!  ACTIVE     (job in flight)      — requested bits mirrored onto the
//!                                    outputs, one output per bit
//! ```
//!
//! No recoverable error path exists here: loss of the actuator bus is fatal
//! and outside this component's scope (surfaced via logging only).
//!
//! ## Polarity
//!
//! The relay bank is wired active-low: a channel energizes when its GPIO is
//! driven low. [`ACTIVE_LOW`] names that convention in one place; the
//! arbiter computes logical on/off and maps to electrical levels through it.
//! Verify against the actuator driver datasheet before changing.

use std::sync::Arc;

use core::sync::atomic::{AtomicU8, Ordering};

use log::{error, info};

use crate::bus::Bus;
use crate::config::{OvenConfig, millis};
use crate::status::{self, WaitMode};

/// The relay bank energizes a channel by driving its GPIO low.
pub const ACTIVE_LOW: bool = true;

// ───────────────────────────────────────────────────────────────
// Actuator bits
// ───────────────────────────────────────────────────────────────

/// One bit per relay channel, in board wiring order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Actuator {
    IndicatorLight = 1 << 0,
    TopElement = 1 << 1,
    BottomElement = 1 << 2,
    ConvectionFan = 1 << 3,
    Rotisserie = 1 << 4,
}

impl Actuator {
    /// Number of relay channels.
    pub const COUNT: usize = 5;

    /// Mask covering every channel.
    pub const ALL: u8 = 0b0001_1111;

    /// Channels in bit order (index 0 = bit 0).
    pub const ORDER: [Actuator; Self::COUNT] = [
        Self::IndicatorLight,
        Self::TopElement,
        Self::BottomElement,
        Self::ConvectionFan,
        Self::Rotisserie,
    ];

    /// The bitmask for this channel.
    pub const fn mask(self) -> u8 {
        self as u8
    }
}

/// Requested actuator state, written only by the cooking controller and
/// read only by the relay arbiter (single-writer invariant — no further
/// synchronization needed beyond the atomic).
pub struct RequestRegister {
    bits: AtomicU8,
}

impl RequestRegister {
    pub const fn new() -> Self {
        Self {
            bits: AtomicU8::new(0),
        }
    }

    pub fn set(&self, mask: u8) {
        self.bits.fetch_or(mask, Ordering::SeqCst);
    }

    pub fn clear(&self, mask: u8) {
        self.bits.fetch_and(!mask, Ordering::SeqCst);
    }

    /// Clear every bit (job start / job end).
    pub fn reset(&self) {
        self.bits.store(0, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> u8 {
        self.bits.load(Ordering::SeqCst)
    }
}

impl Default for RequestRegister {
    fn default() -> Self {
        Self::new()
    }
}

// ───────────────────────────────────────────────────────────────
// Regimes
// ───────────────────────────────────────────────────────────────

/// The three mutually exclusive arbitration regimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Regime {
    Emergency,
    Idle,
    Active,
}

/// Classify the registry snapshot into a regime. Emergency strictly
/// pre-empts Idle strictly pre-empts Active.
pub fn classify(status_bits: u32) -> Regime {
    if status_bits & status::EMERGENCY_STOP != 0 {
        Regime::Emergency
    } else if status_bits & status::IS_COOKING == 0 {
        Regime::Idle
    } else {
        Regime::Active
    }
}

/// Electrical level on a relay GPIO.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

impl Level {
    /// Map a logical energize/de-energize through the board polarity.
    pub const fn energized(on: bool) -> Self {
        if on == ACTIVE_LOW { Self::Low } else { Self::High }
    }
}

/// Compute the electrical level of every channel for a regime.
///
/// Emergency and Idle de-energize everything regardless of `requested`;
/// Active mirrors the requested bits, one channel per bit position.
pub fn output_levels(regime: Regime, requested: u8) -> [Level; Actuator::COUNT] {
    let mut levels = [Level::energized(false); Actuator::COUNT];
    if regime == Regime::Active {
        for (i, actuator) in Actuator::ORDER.iter().enumerate() {
            levels[i] = Level::energized(requested & actuator.mask() != 0);
        }
    }
    levels
}

/// The physical actuator bus, owned exclusively by the arbiter task.
pub trait OutputPort {
    fn apply(&mut self, levels: &[Level; Actuator::COUNT]);
}

// ───────────────────────────────────────────────────────────────
// Arbiter task
// ───────────────────────────────────────────────────────────────

/// Relay arbiter task. Settles a regime every poll tick; the emergency
/// regime holds the outputs off and re-polls faster until the stop lifts.
pub async fn arbiter_task(mut port: impl OutputPort, bus: Arc<Bus>, cfg: OvenConfig) {
    info!("relay arbiter started");
    loop {
        // Wakes early when the stop asserts; otherwise this is the tick.
        let (bits, _) = bus
            .status
            .wait(status::EMERGENCY_STOP, WaitMode::Any, millis(cfg.arbiter_poll_ms))
            .await;

        match classify(bits) {
            Regime::Emergency => {
                error!("EMERGENCY STOP: all actuators off");
                port.apply(&output_levels(Regime::Emergency, 0));
                while bus.status.any_set(status::EMERGENCY_STOP) {
                    async_io_mini::Timer::after(millis(cfg.estop_recheck_ms)).await;
                }
                info!("emergency stop lifted");
            }
            Regime::Idle => {
                port.apply(&output_levels(Regime::Idle, 0));
            }
            Regime::Active => {
                port.apply(&output_levels(Regime::Active, bus.requested.snapshot()));
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const OFF: Level = Level::energized(false);
    const ON: Level = Level::energized(true);

    #[test]
    fn polarity_constant_is_active_low() {
        assert!(ACTIVE_LOW);
        assert_eq!(ON, Level::Low);
        assert_eq!(OFF, Level::High);
    }

    #[test]
    fn emergency_preempts_everything() {
        let bits = status::EMERGENCY_STOP | status::IS_COOKING;
        assert_eq!(classify(bits), Regime::Emergency);
    }

    #[test]
    fn idle_preempts_active() {
        assert_eq!(classify(0), Regime::Idle);
        assert_eq!(classify(status::WIFI_CONNECTED), Regime::Idle);
        assert_eq!(classify(status::IS_COOKING), Regime::Active);
    }

    #[test]
    fn emergency_deasserts_every_output() {
        // Regardless of prior requested bits.
        let levels = output_levels(Regime::Emergency, Actuator::ALL);
        assert_eq!(levels, [OFF; Actuator::COUNT]);
    }

    #[test]
    fn idle_ignores_stale_requested_bits() {
        let stale = Actuator::TopElement.mask() | Actuator::BottomElement.mask();
        let levels = output_levels(Regime::Idle, stale);
        assert_eq!(levels, [OFF; Actuator::COUNT]);
    }

    #[test]
    fn active_mirrors_requested_bits() {
        let requested = Actuator::TopElement.mask() | Actuator::IndicatorLight.mask();
        let levels = output_levels(Regime::Active, requested);
        assert_eq!(levels[0], ON); // indicator
        assert_eq!(levels[1], ON); // top element
        assert_eq!(levels[2], OFF);
        assert_eq!(levels[3], OFF);
        assert_eq!(levels[4], OFF);
    }

    #[test]
    fn request_register_bit_ops() {
        let reg = RequestRegister::new();
        reg.set(Actuator::ConvectionFan.mask() | Actuator::TopElement.mask());
        assert_eq!(
            reg.snapshot(),
            Actuator::ConvectionFan.mask() | Actuator::TopElement.mask()
        );
        reg.clear(Actuator::TopElement.mask());
        assert_eq!(reg.snapshot(), Actuator::ConvectionFan.mask());
        reg.reset();
        assert_eq!(reg.snapshot(), 0);
    }

    #[test]
    fn actuator_masks_are_distinct() {
        let mut seen = 0u8;
        for a in Actuator::ORDER {
            assert_eq!(a.mask().count_ones(), 1);
            assert_eq!(seen & a.mask(), 0);
            seen |= a.mask();
        }
        assert_eq!(seen, Actuator::ALL);
    }
}
