//! GPIO pin assignments for the oven main board (ESP32).
//!
//! Relay channel order matches [`crate::relay::Actuator`] bit order.

/// Indicator light relay.
pub const INDICATOR_LIGHT_GPIO: i32 = 26;
/// Top heating element relay.
pub const TOP_ELEMENT_GPIO: i32 = 25;
/// Bottom heating element relay.
pub const BOTTOM_ELEMENT_GPIO: i32 = 23;
/// Convection fan relay.
pub const CONVECTION_FAN_GPIO: i32 = 22;
/// Rotisserie motor relay.
pub const ROTISSERIE_GPIO: i32 = 21;

/// Relay GPIOs in actuator bit order.
pub const RELAY_GPIOS: [i32; 5] = [
    INDICATOR_LIGHT_GPIO,
    TOP_ELEMENT_GPIO,
    BOTTOM_ELEMENT_GPIO,
    CONVECTION_FAN_GPIO,
    ROTISSERIE_GPIO,
];

/// Thermocouple converter SPI (VSPI).
pub const THERMO_SPI_MISO_GPIO: i32 = 19;
pub const THERMO_SPI_SCLK_GPIO: i32 = 18;
pub const THERMO_SPI_CS_GPIO: i32 = 5;

/// Emergency-stop input (external safety circuit, active low).
pub const ESTOP_GPIO: i32 = 34;
