//! Shared wiring between the firmware tasks.
//!
//! One [`Bus`] instance is built at startup and handed to every task as an
//! `Arc`. It owns the only shared state in the system: the status registry,
//! the requested-bits register, and the mailboxes. Tasks never call across
//! task boundaries and never share any other mutable object — this is the
//! design's core invariant.

use crate::cook::Notice;
use crate::mailbox::{Latest, Outbox};
use crate::recipe::Recipe;
use crate::relay::RequestRegister;
use crate::remote::update::StatusUpdate;
use crate::status::DeviceStatus;
use crate::thermo::TempSample;

/// Shared state hub.
///
/// | field | discipline | writer(s) | reader |
/// |---|---|---|---|
/// | `status` | flag registry | several (by flag) | all |
/// | `requested` | atomic bitset | cooking controller | relay arbiter |
/// | `temperature` | overwrite slot | acquisition loop | controller (peek), reporter (take) |
/// | `jobs` | overwrite slot | messaging client | cooking controller |
/// | `outbox` | blocking slot | reporters | messaging client |
/// | `notices` | bounded queue | cooking controller | notice reporter |
/// | `scans` | overwrite slot | scanner wiring | scan reporter |
pub struct Bus {
    pub status: DeviceStatus,
    pub requested: RequestRegister,
    pub temperature: Latest<TempSample>,
    pub jobs: Latest<Recipe>,
    pub outbox: Outbox<StatusUpdate, 1>,
    pub notices: Outbox<Notice, 3>,
    pub scans: Latest<String>,
}

impl Bus {
    pub const fn new() -> Self {
        Self {
            status: DeviceStatus::new(),
            requested: RequestRegister::new(),
            temperature: Latest::new(),
            jobs: Latest::new(),
            outbox: Outbox::new(),
            notices: Outbox::new(),
            scans: Latest::new(),
        }
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}
