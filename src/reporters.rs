//! Message-forwarding tasks.
//!
//! Small producers that turn internal state into outbound status updates.
//! Each blocks on the capacity-one outbox, so competing reporters serialize
//! instead of overwriting each other, and nothing is sent until the
//! messaging client drains the slot (which is also what arms its
//! demand-driven connect).
//!
//! All four loops are cheap and event-driven, so they share one thread on a
//! local executor rather than each owning a stack.

use std::sync::Arc;

use log::info;

use crate::bus::Bus;
use crate::config::{OvenConfig, millis};
use crate::remote::update::StatusUpdate;
use crate::status;

/// Forward every fresh temperature sample to the backend.
pub async fn temperature_report(bus: Arc<Bus>) {
    loop {
        let sample = bus.temperature.recv().await;
        bus.outbox.send(StatusUpdate::Temperature(sample)).await;
    }
}

/// Watch the cooking flag and report its edges.
pub async fn cooking_state_report(bus: Arc<Bus>, cfg: OvenConfig) {
    let mut was_cooking = false;
    loop {
        let cooking = bus.status.any_set(status::IS_COOKING);
        if cooking != was_cooking {
            was_cooking = cooking;
            let update = if cooking {
                StatusUpdate::CookingStarted
            } else {
                StatusUpdate::CookingStopped
            };
            bus.outbox.send(update).await;
        } else {
            async_io_mini::Timer::after(millis(cfg.cooking_state_poll_ms)).await;
        }
    }
}

/// Forward controller notices (job started/finished, sensor fault).
pub async fn notice_report(bus: Arc<Bus>) {
    loop {
        let notice = bus.notices.recv().await;
        bus.outbox.send(StatusUpdate::Status(notice)).await;
    }
}

/// Forward scanned codes as remote job selections.
pub async fn scan_report(bus: Arc<Bus>) {
    loop {
        let code = bus.scans.recv().await;
        bus.outbox.send(StatusUpdate::ScannedCode(code)).await;
    }
}

/// Drive all four reporters on one thread.
///
/// The executor runs the loops cooperatively; the enclosing thread blocks
/// on the reactor.
pub fn run_forwarders(bus: Arc<Bus>, cfg: OvenConfig) {
    let executor: edge_executor::LocalExecutor<'_, 8> = edge_executor::LocalExecutor::new();

    executor.spawn(temperature_report(bus.clone())).detach();
    executor
        .spawn(cooking_state_report(bus.clone(), cfg))
        .detach();
    executor.spawn(notice_report(bus.clone())).detach();
    executor.spawn(scan_report(bus)).detach();

    info!("status reporters started");
    futures_lite::future::block_on(executor.run(core::future::pending::<()>()));
}
