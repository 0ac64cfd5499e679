//! Outbound status updates.
//!
//! The set of paths and payload shapes the appliance produces is closed and
//! known at compile time, so updates are a tagged enum rather than a generic
//! JSON tree. Each variant knows its RPC path and how to render its payload.

use serde_json::{Value, json};

use crate::cook::Notice;
use crate::thermo::TempSample;

/// RPC paths used on the appliance link.
pub mod paths {
    /// Device registration call (and its ack on the reply side).
    pub const REGISTER: &str = "appliance.esp32Register";
    pub const UPDATE_TEMPERATURE: &str = "appliance.updateTemperature";
    pub const UPDATE_STATUS: &str = "appliance.updateStatus";
    pub const START_COOKING: &str = "appliance.startCooking";
    pub const STOP_COOKING: &str = "appliance.stopCooking";
    /// Outbound: scanned-code job selection. Inbound reply: job assignment.
    pub const SET_RECIPE: &str = "appliance.setRecipe";
}

/// All updates are mutations on the backend.
pub const METHOD_MUTATION: &str = "mutation";

/// One outbound status message.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusUpdate {
    /// Latest temperature sample.
    Temperature(TempSample),
    /// A short status notice (job started/finished, sensor fault).
    Status(Notice),
    /// The cooking flag rose.
    CookingStarted,
    /// The cooking flag fell.
    CookingStopped,
    /// A code scanned at the appliance, selecting a job remotely.
    ScannedCode(String),
}

impl StatusUpdate {
    /// The RPC path this update is sent to.
    pub fn path(&self) -> &'static str {
        match self {
            Self::Temperature(_) => paths::UPDATE_TEMPERATURE,
            Self::Status(_) => paths::UPDATE_STATUS,
            Self::CookingStarted => paths::START_COOKING,
            Self::CookingStopped => paths::STOP_COOKING,
            Self::ScannedCode(_) => paths::SET_RECIPE,
        }
    }

    /// Render the payload carried inside the envelope.
    pub fn payload(&self, device_id: &str) -> Value {
        match self {
            Self::Temperature(sample) => json!({
                "id": device_id,
                "temperatureC": sample.celsius,
                "temperatureF": sample.fahrenheit,
            }),
            Self::Status(notice) => json!({
                "id": device_id,
                "type": notice.kind.wire_name(),
                "message": notice.message,
            }),
            Self::CookingStarted | Self::CookingStopped => json!({
                "id": device_id,
            }),
            Self::ScannedCode(code) => json!({
                "id": device_id,
                "qrCode": code,
            }),
        }
    }
}

/// Payload of the registration call.
pub fn registration_payload(device_id: &str, name: &str, pairing_id: &str) -> Value {
    json!({
        "id": device_id,
        "name": name,
        "BLEId": pairing_id,
    })
}
