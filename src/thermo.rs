//! Thermocouple acquisition.
//!
//! Decodes the 16-bit word from the SPI thermocouple converter into
//! quarter-degree Celsius plus a rounded Fahrenheit companion, and runs the
//! acquisition loop that overwrite-publishes the latest sample.
//!
//! Converter word layout: bit 2 is the open-circuit flag; the temperature
//! occupies the bits above bit 3 in quarter-degree counts (sign-extended).
//!
//! A disconnected or unreadable sensor publishes [`SENSOR_FAULT_C`] so that
//! consumers detect the fault by threshold rather than a separate error
//! channel — no retries, the next cycle simply republishes.
//!
//! ## Cadence
//!
//! ~1 s while the registry reports a cooking job (the control loop needs
//! fresh data); otherwise the loop parks on the cooking flag with a long
//! timeout to keep SPI traffic and power draw down.

use std::sync::Arc;

use log::{info, warn};

use crate::bus::Bus;
use crate::config::{OvenConfig, millis};
use crate::error::SensorError;
use crate::status::{self, WaitMode};

/// Sentinel Celsius value published when the sensor cannot be read.
pub const SENSOR_FAULT_C: f32 = 1000.0;

/// Open-thermocouple flag in the raw converter word.
pub const OPEN_CIRCUIT_BIT: u16 = 1 << 2;

/// Converter resolution: one count = 0.25 °C after the 3-bit shift.
const QUARTER_DEGREE_C: f32 = 0.25;

/// Temperature unit requested by a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TempUnit {
    Celsius,
    Fahrenheit,
}

impl TempUnit {
    /// Parse the wire symbol ("C" / "F").
    pub fn from_symbol(s: &str) -> Option<Self> {
        match s {
            "C" => Some(Self::Celsius),
            "F" => Some(Self::Fahrenheit),
            _ => None,
        }
    }
}

/// A calibrated temperature sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempSample {
    pub celsius: f32,
    pub fahrenheit: f32,
}

impl TempSample {
    /// Build a sample from Celsius; Fahrenheit is rounded to a whole degree.
    pub fn from_celsius(celsius: f32) -> Self {
        Self {
            celsius,
            fahrenheit: (celsius * 1.8 + 32.0).round(),
        }
    }

    /// The reading in the given unit.
    pub fn in_unit(&self, unit: TempUnit) -> f32 {
        match unit {
            TempUnit::Celsius => self.celsius,
            TempUnit::Fahrenheit => self.fahrenheit,
        }
    }

    /// True if this sample is the disconnected-sensor sentinel.
    pub fn is_fault(&self) -> bool {
        self.celsius >= SENSOR_FAULT_C
    }
}

/// Decode a raw converter word into Celsius.
///
/// Returns [`SENSOR_FAULT_C`] when the open-circuit flag is set. The value
/// is treated as signed so sub-zero readings survive the shift.
pub fn decode_raw(raw: u16) -> f32 {
    if raw & OPEN_CIRCUIT_BIT != 0 {
        return SENSOR_FAULT_C;
    }
    f32::from((raw as i16) >> 3) * QUARTER_DEGREE_C
}

/// The raw SPI transaction, owned exclusively by the acquisition loop.
pub trait ThermoPort {
    fn read_raw(&mut self) -> Result<u16, SensorError>;
}

/// Temperature acquisition task.
///
/// Publishes every sample into the overwrite slot on `bus.temperature`.
pub async fn acquisition_task(mut port: impl ThermoPort, bus: Arc<Bus>, cfg: OvenConfig) {
    info!("temperature acquisition started");
    loop {
        let celsius = match port.read_raw() {
            Ok(raw) => decode_raw(raw),
            Err(e) => {
                warn!("thermocouple read failed: {e}");
                SENSOR_FAULT_C
            }
        };
        bus.temperature.publish(TempSample::from_celsius(celsius));

        let (bits, _) = bus
            .status
            .wait(status::IS_COOKING, WaitMode::Any, millis(cfg.temp_idle_park_ms))
            .await;
        if bits & status::IS_COOKING != 0 {
            async_io_mini::Timer::after(millis(cfg.temp_poll_cooking_ms)).await;
        }
    }
}
