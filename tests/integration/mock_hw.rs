//! Recording port implementations for integration tests.
//!
//! Each mock records every call behind an `Arc<Mutex<_>>` so the test body
//! can inspect what a task did while the task owns the port itself.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use smartoven::config::OvenConfig;
use smartoven::ports::{ChimePort, DisplayPort, Tone};
use smartoven::relay::{Actuator, Level, OutputPort};

/// Shrunk intervals so scenario tests run in milliseconds.
pub fn fast_config() -> OvenConfig {
    OvenConfig {
        temp_poll_cooking_ms: 20,
        temp_idle_park_ms: 100,
        arbiter_poll_ms: 40,
        estop_recheck_ms: 10,
        control_tick_ms: 10,
        temp_wait_ms: 10,
        hysteresis_band_deg: 5.0,
        sensor_miss_limit: 3,
        cooldown_ms: 50,
        clock_retry_ms: 10,
        connect_poll_ms: 30,
        idle_disconnect_ms: 10_000,
        register_retry_ms: 100,
        cooking_state_poll_ms: 20,
    }
}

/// Poll `pred` until it holds or `timeout` elapses.
pub fn wait_until(timeout: Duration, mut pred: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if pred() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
}

// ── Relay bank ────────────────────────────────────────────────

/// Records every level set applied by the arbiter.
#[derive(Clone)]
pub struct RecordingRelays {
    history: Arc<Mutex<Vec<[Level; Actuator::COUNT]>>>,
}

#[allow(dead_code)]
impl RecordingRelays {
    pub fn new() -> Self {
        Self {
            history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn last(&self) -> Option<[Level; Actuator::COUNT]> {
        self.history.lock().unwrap().last().copied()
    }

    pub fn history(&self) -> Vec<[Level; Actuator::COUNT]> {
        self.history.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.history.lock().unwrap().clear();
    }
}

impl OutputPort for RecordingRelays {
    fn apply(&mut self, levels: &[Level; Actuator::COUNT]) {
        self.history.lock().unwrap().push(*levels);
    }
}

// ── Operator panel ────────────────────────────────────────────

/// Records display lines and chime tones.
#[derive(Clone)]
pub struct RecordingPanel {
    pub tones: Arc<Mutex<Vec<Tone>>>,
    pub lines: Arc<Mutex<Vec<(u8, u8, String)>>>,
}

#[allow(dead_code)]
impl RecordingPanel {
    pub fn new() -> Self {
        Self {
            tones: Arc::new(Mutex::new(Vec::new())),
            lines: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn tone_count(&self) -> usize {
        self.tones.lock().unwrap().len()
    }
}

impl DisplayPort for RecordingPanel {
    fn line(&mut self, row: u8, col: u8, text: &str) {
        self.lines.lock().unwrap().push((row, col, text.to_string()));
    }
}

impl ChimePort for RecordingPanel {
    fn play(&mut self, tone: Tone) {
        self.tones.lock().unwrap().push(tone);
    }
}
