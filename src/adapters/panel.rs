//! Operator-panel adapters: display, chime, scanner, pairing.
//!
//! These peripherals are thin collaborators — they consume short status
//! strings and tone descriptors, or yield input tokens. The log-backed
//! implementations serve both the host build and the device until the
//! character LCD / buzzer / scanner UART wiring is attached.

use log::{debug, info};

use crate::ports::{ChimePort, DisplayPort, PairingInfo, PairingPort, ScannerPort, Tone};

/// Display adapter that mirrors lines to the log.
pub struct LogDisplay;

impl LogDisplay {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayPort for LogDisplay {
    fn line(&mut self, row: u8, col: u8, text: &str) {
        debug!("LCD[{row},{col}]: {text}");
    }
}

/// Chime adapter that logs tone events.
pub struct LogChime;

impl LogChime {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogChime {
    fn default() -> Self {
        Self::new()
    }
}

impl ChimePort for LogChime {
    fn play(&mut self, tone: Tone) {
        info!("chime: {tone:?}");
    }
}

/// Scanner adapter with an injectable queue (simulation).
pub struct SimScanner {
    pending: std::collections::VecDeque<String>,
}

impl SimScanner {
    pub fn new() -> Self {
        Self {
            pending: std::collections::VecDeque::new(),
        }
    }

    /// Inject a scanned code.
    pub fn inject(&mut self, code: impl Into<String>) {
        self.pending.push_back(code.into());
    }
}

impl Default for SimScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl ScannerPort for SimScanner {
    fn poll_scan(&mut self) -> Option<String> {
        self.pending.pop_front()
    }
}

/// Pairing adapter with injectable credentials (simulation).
pub struct SimPairing {
    pending: Option<PairingInfo>,
}

impl SimPairing {
    pub fn new() -> Self {
        Self { pending: None }
    }

    /// Inject provisioning data as if received over the pairing channel.
    pub fn provision(&mut self, info: PairingInfo) {
        self.pending = Some(info);
    }
}

impl Default for SimPairing {
    fn default() -> Self {
        Self::new()
    }
}

impl PairingPort for SimPairing {
    fn take_credentials(&mut self) -> Option<PairingInfo> {
        self.pending.take()
    }
}
