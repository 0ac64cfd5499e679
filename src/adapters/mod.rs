//! Peripheral-boundary adapters.
//!
//! Each adapter implements a port trait from the core (`ports`, `relay`,
//! `thermo`, `remote::transport`) twice:
//! - **`target_os = "espidf"`** — real ESP-IDF peripheral calls,
//! - **all other targets** — simulation backends for host-side tests.

pub mod clock;
pub mod device_id;
pub mod nvs;
pub mod panel;
pub mod relay_gpio;
pub mod thermo_spi;
pub mod wifi;

#[cfg(target_os = "espidf")]
pub mod ws;
