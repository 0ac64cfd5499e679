//! Cooking process controller.
//!
//! Consumes job descriptors from the job slot and runs the control loop:
//!
//! ```text
//!  Idle ──[job arrives]──▶ Running ──[exit]──▶ Cooldown ──▶ Idle
//! ```
//!
//! The cycle is terminal-free: every job — completed, replaced, or
//! emergency-aborted — clears its actuator bits, drops `IS_COOKING`, emits a
//! finished notice, and holds a short cooldown before the next pickup (no
//! instantaneous restart oscillation).
//!
//! The control law is a plain hysteresis band: within ±5° of target the
//! actuator state is held (no chatter); under-temperature asserts the mode's
//! heat mask, over-temperature clears it. The fan or rotisserie bit and the
//! indicator light stay asserted for the whole job.

use std::sync::Arc;

use core::time::Duration;

use log::{debug, error, info, warn};

use crate::bus::Bus;
use crate::config::{OvenConfig, millis};
use crate::ports::{ChimePort, ClockPort, DisplayPort, Tone};
use crate::recipe::Recipe;
use crate::relay::Actuator;
use crate::status;

/// Display row and column for the remaining-time readout.
const TIME_ROW: u8 = 2;
const TIME_COL: u8 = 11;

// ───────────────────────────────────────────────────────────────
// Control law
// ───────────────────────────────────────────────────────────────

/// Outcome of one hysteresis evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeatAction {
    /// Within the band: leave the actuator state untouched.
    Hold,
    /// Under temperature: assert the heat mask.
    Heat,
    /// Over temperature: clear the heat mask.
    Coast,
}

/// Compare a reading (in the job's unit) against the target.
pub fn heat_action(reading: f32, target: f32, band: f32) -> HeatAction {
    if (reading - target).abs() < band {
        HeatAction::Hold
    } else if reading < target {
        HeatAction::Heat
    } else {
        HeatAction::Coast
    }
}

/// Render a remaining time as `HH:MM:SS`.
pub fn format_remaining(remaining: Duration) -> String {
    let total = remaining.as_secs();
    format!("{:02}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}

// ───────────────────────────────────────────────────────────────
// Notices
// ───────────────────────────────────────────────────────────────

/// Kind of status notice, as reported upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    JobStarted,
    JobFinished,
    SensorFault,
}

impl NoticeKind {
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::JobStarted => "jobStarted",
            Self::JobFinished => "jobFinished",
            Self::SensorFault => "sensorFault",
        }
    }
}

/// A short status event for the display/backend reporters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn job_started(recipe: &Recipe) -> Self {
        Self {
            kind: NoticeKind::JobStarted,
            message: format!("{} ({:?})", recipe.job_id, recipe.mode),
        }
    }

    pub fn job_finished(recipe: &Recipe, outcome: &str) -> Self {
        Self {
            kind: NoticeKind::JobFinished,
            message: format!("{}: {}", recipe.job_id, outcome),
        }
    }

    pub fn sensor_fault() -> Self {
        Self {
            kind: NoticeKind::SensorFault,
            message: "unable to read temperature sensor".to_string(),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Controller task
// ───────────────────────────────────────────────────────────────

/// Cooking controller task: block on the job slot, run each job, cool down.
pub async fn controller_task(
    bus: Arc<Bus>,
    cfg: OvenConfig,
    clock: impl ClockPort,
    mut display: impl DisplayPort,
    mut chime: impl ChimePort,
) {
    info!("cooking controller started");
    loop {
        let recipe = bus.jobs.recv().await;
        run_job(&bus, &cfg, &clock, &mut display, &mut chime, recipe).await;
        async_io_mini::Timer::after(millis(cfg.cooldown_ms)).await;
    }
}

async fn run_job(
    bus: &Bus,
    cfg: &OvenConfig,
    clock: &impl ClockPort,
    display: &mut impl DisplayPort,
    chime: &mut impl ChimePort,
    recipe: Recipe,
) {
    // Never time a job against an unset clock.
    while !clock.is_valid() {
        warn!("wall clock not yet synced, delaying job start");
        async_io_mini::Timer::after(millis(cfg.clock_retry_ms)).await;
    }
    let start = clock.epoch_secs();

    info!(
        "job {} started: {:?} to {}\u{b0} for {:?}",
        recipe.job_id, recipe.mode, recipe.target_temperature, recipe.duration
    );
    bus.status.set(status::IS_COOKING);
    chime.play(Tone::MealStarted);
    if bus.notices.try_send(Notice::job_started(&recipe)).is_err() {
        debug!("notice queue full, start notice dropped");
    }
    display.line(TIME_ROW, 0, "Time Left: ");

    // Indicator light plus the mode's auxiliary actuator hold for the whole
    // job; the heat mask cycles under the control law.
    bus.requested.reset();
    bus.requested
        .set(Actuator::IndicatorLight.mask() | recipe.mode.aux_mask());
    let heat_mask = recipe.mode.heat_mask();

    let mut misses: u32 = 0;
    let mut sensor_fault_reported = false;
    let mut shown_secs = u64::MAX;
    let outcome;

    loop {
        let elapsed = clock.elapsed_since(start);
        if elapsed >= recipe.duration {
            outcome = "completed";
            break;
        }

        match bus.temperature.peek(millis(cfg.temp_wait_ms)).await {
            None => {
                misses += 1;
                if misses > cfg.sensor_miss_limit && !sensor_fault_reported {
                    // Tolerated: the job keeps its last actuator state.
                    error!("unable to read temperature sensor");
                    if bus.notices.try_send(Notice::sensor_fault()).is_err() {
                        debug!("notice queue full, sensor-fault notice dropped");
                    }
                    sensor_fault_reported = true;
                }
            }
            Some(sample) => {
                misses = 0;
                let reading = sample.in_unit(recipe.unit);
                match heat_action(reading, recipe.target_temperature, cfg.hysteresis_band_deg) {
                    HeatAction::Hold => {}
                    HeatAction::Heat => bus.requested.set(heat_mask),
                    HeatAction::Coast => bus.requested.clear(heat_mask),
                }
            }
        }

        // A replacement job aborts this one; it is picked up on the next
        // Idle transition, not here.
        if bus.jobs.is_pending() {
            warn!("replacement job received, aborting current job");
            outcome = "replaced";
            break;
        }

        if bus.status.any_set(status::EMERGENCY_STOP) {
            error!("EMERGENCY STOP: aborting job");
            outcome = "emergency stop";
            break;
        }

        let remaining = recipe.duration.saturating_sub(elapsed);
        if remaining.as_secs() != shown_secs {
            shown_secs = remaining.as_secs();
            display.line(TIME_ROW, TIME_COL, &format_remaining(remaining));
        }

        async_io_mini::Timer::after(millis(cfg.control_tick_ms)).await;
    }

    bus.requested.reset();
    bus.status.clear(status::IS_COOKING);
    chime.play(Tone::MealFinished);
    if bus
        .notices
        .try_send(Notice::job_finished(&recipe, outcome))
        .is_err()
    {
        debug!("notice queue full, finish notice dropped");
    }
    info!("job {} ended: {}", recipe.job_id, outcome);
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
