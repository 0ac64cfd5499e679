//! Relay bank GPIO adapter.
//!
//! Implements [`OutputPort`] for the five-channel relay board. The relays
//! are dumb actuators: all arbitration lives in `relay::arbiter_task`, this
//! adapter only pushes electrical levels to pins.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives the relay GPIOs via `esp-idf-hal` pin drivers.
//! On host/test: logs level changes only (tests use their own recording
//! port).

use log::trace;

use crate::relay::{Actuator, Level, OutputPort};

// ───────────────────────────────────────────────────────────────
// ESP-IDF
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub struct RelayBank {
    pins: [esp_idf_hal::gpio::PinDriver<'static, esp_idf_hal::gpio::AnyOutputPin, esp_idf_hal::gpio::Output>;
        Actuator::COUNT],
}

#[cfg(target_os = "espidf")]
impl RelayBank {
    /// Take ownership of the relay pins, in actuator bit order.
    pub fn new(
        pins: [esp_idf_hal::gpio::AnyOutputPin; Actuator::COUNT],
    ) -> crate::error::Result<Self> {
        let mut drivers = Vec::with_capacity(Actuator::COUNT);
        for pin in pins {
            let mut driver = esp_idf_hal::gpio::PinDriver::output(pin)
                .map_err(|_| crate::error::Error::Init("relay GPIO"))?;
            // Power-on default: everything de-energized.
            driver
                .set_level(level_to_hal(Level::energized(false)))
                .map_err(|_| crate::error::Error::Init("relay GPIO level"))?;
            drivers.push(driver);
        }
        let pins = drivers
            .try_into()
            .map_err(|_| crate::error::Error::Init("relay pin count"))?;
        Ok(Self { pins })
    }
}

#[cfg(target_os = "espidf")]
fn level_to_hal(level: Level) -> esp_idf_hal::gpio::Level {
    match level {
        Level::High => esp_idf_hal::gpio::Level::High,
        Level::Low => esp_idf_hal::gpio::Level::Low,
    }
}

#[cfg(target_os = "espidf")]
impl OutputPort for RelayBank {
    fn apply(&mut self, levels: &[Level; Actuator::COUNT]) {
        for (pin, level) in self.pins.iter_mut().zip(levels) {
            // A failed write here means the actuator bus is gone — fatal,
            // not recoverable; keep driving the rest.
            if pin.set_level(level_to_hal(*level)).is_err() {
                log::error!("relay GPIO write failed");
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Simulation
// ───────────────────────────────────────────────────────────────

/// Host-side relay bank: traces level changes.
pub struct SimRelayBank {
    last: Option<[Level; Actuator::COUNT]>,
}

impl SimRelayBank {
    pub fn new() -> Self {
        Self { last: None }
    }

    /// The most recently applied levels.
    pub fn last(&self) -> Option<[Level; Actuator::COUNT]> {
        self.last
    }
}

impl Default for SimRelayBank {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputPort for SimRelayBank {
    fn apply(&mut self, levels: &[Level; Actuator::COUNT]) {
        if self.last.as_ref() != Some(levels) {
            trace!("relays: {levels:?}");
        }
        self.last = Some(*levels);
    }
}
