//! Thermocouple converter SPI adapter.
//!
//! The converter (MAX6675-class) shifts out one big-endian 16-bit word per
//! chip select. [`Max6675`] is generic over any `embedded-hal` `SpiDevice`,
//! so the same driver runs against the ESP-IDF SPI master on the device and
//! against a stub bus in tests.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: [`spi_thermo_port`] wires the VSPI pins into an
//! `esp-idf-hal` SPI device and wraps it in the driver.
//! On host/test: [`SimThermo`] reads an injectable atomic raw word.

use embedded_hal::spi::SpiDevice;

use crate::error::SensorError;
use crate::thermo::ThermoPort;

// ───────────────────────────────────────────────────────────────
// Generic driver
// ───────────────────────────────────────────────────────────────

/// MAX6675-class thermocouple converter over SPI.
pub struct Max6675<SPI> {
    spi: SPI,
}

impl<SPI> Max6675<SPI> {
    pub fn new(spi: SPI) -> Self {
        Self { spi }
    }
}

impl<SPI: SpiDevice> ThermoPort for Max6675<SPI> {
    fn read_raw(&mut self) -> Result<u16, SensorError> {
        let mut word = [0u8; 2];
        self.spi
            .read(&mut word)
            .map_err(|_| SensorError::SpiReadFailed)?;
        Ok(u16::from_be_bytes(word))
    }
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF wiring
// ───────────────────────────────────────────────────────────────

/// Build the device thermocouple port on the VSPI pins.
#[cfg(target_os = "espidf")]
pub fn spi_thermo_port(
    spi2: esp_idf_hal::spi::SPI2,
    sclk: esp_idf_hal::gpio::AnyIOPin,
    miso: esp_idf_hal::gpio::AnyIOPin,
    cs: esp_idf_hal::gpio::AnyIOPin,
) -> crate::error::Result<Max6675<esp_idf_hal::spi::SpiDeviceDriver<'static, esp_idf_hal::spi::SpiDriver<'static>>>> {
    use esp_idf_hal::spi::config::{Config, DriverConfig};
    use esp_idf_hal::spi::{SpiDeviceDriver, SpiDriver};
    use esp_idf_hal::units::FromValueType;

    let driver = SpiDriver::new(
        spi2,
        sclk,
        esp_idf_hal::gpio::AnyIOPin::none(),
        Some(miso),
        &DriverConfig::new(),
    )
    .map_err(|_| crate::error::Error::Init("thermo SPI bus"))?;

    let device = SpiDeviceDriver::new(driver, Some(cs), &Config::new().baudrate(2.MHz().into()))
        .map_err(|_| crate::error::Error::Init("thermo SPI device"))?;

    Ok(Max6675::new(device))
}

// ───────────────────────────────────────────────────────────────
// Simulation
// ───────────────────────────────────────────────────────────────

/// Host-side thermocouple: reads an injectable raw word.
pub struct SimThermo {
    raw: std::sync::Arc<core::sync::atomic::AtomicU16>,
    fail: std::sync::Arc<core::sync::atomic::AtomicBool>,
}

/// Injection handle for a [`SimThermo`], shared with the test body.
#[derive(Clone)]
pub struct SimThermoHandle {
    raw: std::sync::Arc<core::sync::atomic::AtomicU16>,
    fail: std::sync::Arc<core::sync::atomic::AtomicBool>,
}

impl SimThermo {
    /// Create a sim sensor preloaded with `raw_word`.
    pub fn new(raw_word: u16) -> (Self, SimThermoHandle) {
        let raw = std::sync::Arc::new(core::sync::atomic::AtomicU16::new(raw_word));
        let fail = std::sync::Arc::new(core::sync::atomic::AtomicBool::new(false));
        (
            Self {
                raw: raw.clone(),
                fail: fail.clone(),
            },
            SimThermoHandle { raw, fail },
        )
    }
}

impl SimThermoHandle {
    /// Inject a raw converter word.
    pub fn set_raw(&self, raw_word: u16) {
        self.raw.store(raw_word, core::sync::atomic::Ordering::Relaxed);
    }

    /// Inject a Celsius temperature (quarter-degree resolution).
    pub fn set_celsius(&self, celsius: f32) {
        let counts = (celsius / 0.25) as i16;
        self.set_raw((counts << 3) as u16);
    }

    /// Make subsequent reads fail at the SPI level.
    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, core::sync::atomic::Ordering::Relaxed);
    }
}

impl ThermoPort for SimThermo {
    fn read_raw(&mut self) -> Result<u16, SensorError> {
        if self.fail.load(core::sync::atomic::Ordering::Relaxed) {
            return Err(SensorError::SpiReadFailed);
        }
        Ok(self.raw.load(core::sync::atomic::Ordering::Relaxed))
    }
}
