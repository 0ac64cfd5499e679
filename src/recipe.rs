//! Job descriptors assigned by the backend.
//!
//! A [`Recipe`] is the unit of cooking work: mode, target temperature with
//! unit, duration, and identity. It is decoded from the inbound assignment
//! payload and overwrite-published into the job slot — a new arrival
//! replaces, never queues behind, the pending one.

use core::time::Duration;

use serde::Deserialize;

use crate::error::ProtocolError;
use crate::relay::Actuator;
use crate::thermo::TempUnit;

// ───────────────────────────────────────────────────────────────
// Cooking mode
// ───────────────────────────────────────────────────────────────

/// Appliance cooking mode. Drives both the heating-element mask and any
/// auxiliary actuator (fan or rotisserie — at most one is meaningful).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CookMode {
    Bake,
    Broil,
    Convection,
    Rotisserie,
}

impl CookMode {
    /// Parse the wire mode string. Unknown modes fall back to `Bake`,
    /// the both-elements default.
    pub fn from_wire(s: &str) -> Self {
        match s {
            "Broil" => Self::Broil,
            "Convection" => Self::Convection,
            "Rotisserie" => Self::Rotisserie,
            _ => Self::Bake,
        }
    }

    /// Heating elements cycled by the control law for this mode.
    pub const fn heat_mask(self) -> u8 {
        match self {
            Self::Broil => Actuator::TopElement.mask(),
            _ => Actuator::TopElement.mask() | Actuator::BottomElement.mask(),
        }
    }

    /// Auxiliary actuator held on for the whole job, if any.
    pub const fn aux_mask(self) -> u8 {
        match self {
            Self::Convection => Actuator::ConvectionFan.mask(),
            Self::Rotisserie => Actuator::Rotisserie.mask(),
            _ => 0,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Recipe
// ───────────────────────────────────────────────────────────────

/// A cooking job as consumed by the controller.
#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    pub mode: CookMode,
    /// Target temperature in `unit`.
    pub target_temperature: f32,
    pub unit: TempUnit,
    /// Total cooking time. Converted from wire milliseconds exactly once,
    /// here at the decode boundary.
    pub duration: Duration,
    pub job_id: String,
}

/// Inbound assignment payload as it appears on the wire.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssignmentWire {
    appliance_mode: String,
    temperature: f64,
    temperature_unit: String,
    #[allow(dead_code)]
    appliance_type: String,
    /// Milliseconds.
    cooking_time: u64,
    #[allow(dead_code)]
    expiry_date: i64,
    id: String,
}

/// Decode an inbound job assignment.
///
/// Missing or malformed fields are a fatal decode error for the message:
/// it is logged by the caller and dropped, and no job is dispatched.
pub fn decode(payload: &serde_json::Value) -> Result<Recipe, ProtocolError> {
    let wire: AssignmentWire =
        serde_json::from_value(payload.clone()).map_err(|_| ProtocolError::MalformedAssignment)?;
    let unit = TempUnit::from_symbol(&wire.temperature_unit)
        .ok_or(ProtocolError::MalformedAssignment)?;
    Ok(Recipe {
        mode: CookMode::from_wire(&wire.appliance_mode),
        target_temperature: wire.temperature as f32,
        unit,
        duration: Duration::from_millis(wire.cooking_time),
        job_id: wire.id,
    })
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
