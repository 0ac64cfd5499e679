//! Unified error types for the oven firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! top-level task loops' error handling uniform. All variants are `Copy` so
//! they can be cheaply passed between tasks without allocation.
//!
//! The taxonomy mirrors how faults are actually handled:
//! - sensor faults are tolerated transiently and logged,
//! - protocol faults drop the offending message,
//! - safety faults abort the running job and force actuators off,
//! - connectivity faults are absorbed by the reconnect policy.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The temperature peripheral could not be read.
    Sensor(SensorError),
    /// An inbound or outbound wire message was unusable.
    Protocol(ProtocolError),
    /// A safety override is asserted.
    Safety(SafetyFault),
    /// The backend link or network association failed.
    Comms(CommsError),
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Protocol(e) => write!(f, "protocol: {e}"),
            Self::Safety(e) => write!(f, "safety: {e}"),
            Self::Comms(e) => write!(f, "comms: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// SPI transaction with the thermocouple converter failed.
    SpiReadFailed,
    /// The converter reports an open thermocouple circuit.
    Disconnected,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SpiReadFailed => write!(f, "SPI read failed"),
            Self::Disconnected => write!(f, "thermocouple disconnected"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Protocol errors
// ---------------------------------------------------------------------------

/// Faults in the backend message exchange. These never retry: the offending
/// message is logged and dropped (at-most-once delivery).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    /// Payload was not parseable JSON.
    MalformedMessage,
    /// A job assignment was missing fields or carried bad values.
    MalformedAssignment,
    /// The reply carried a server-side error object.
    ServerError,
    /// The echoed correlation id did not split into two non-empty tokens.
    BadCorrelationId,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedMessage => write!(f, "malformed message"),
            Self::MalformedAssignment => write!(f, "malformed job assignment"),
            Self::ServerError => write!(f, "server-side error"),
            Self::BadCorrelationId => write!(f, "bad correlation id"),
        }
    }
}

impl From<ProtocolError> for Error {
    fn from(e: ProtocolError) -> Self {
        Self::Protocol(e)
    }
}

// ---------------------------------------------------------------------------
// Safety faults
// ---------------------------------------------------------------------------

/// Safety faults are a special category: they pre-empt every other concern,
/// force all actuators off, and are never cleared by software — only the
/// external safety input may lift them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafetyFault {
    /// The hardware emergency-stop input is asserted.
    EmergencyStop,
}

impl fmt::Display for SafetyFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmergencyStop => write!(f, "emergency stop"),
        }
    }
}

impl From<SafetyFault> for Error {
    fn from(e: SafetyFault) -> Self {
        Self::Safety(e)
    }
}

// ---------------------------------------------------------------------------
// Communications errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommsError {
    WifiConnectFailed,
    WifiDisconnected,
    ConnectFailed,
    NotConnected,
    SendFailed,
}

impl fmt::Display for CommsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WifiConnectFailed => write!(f, "WiFi connect failed"),
            Self::WifiDisconnected => write!(f, "WiFi disconnected"),
            Self::ConnectFailed => write!(f, "backend connect failed"),
            Self::NotConnected => write!(f, "not connected"),
            Self::SendFailed => write!(f, "send failed"),
        }
    }
}

impl From<CommsError> for Error {
    fn from(e: CommsError) -> Self {
        Self::Comms(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
