//! Scenario tests for the cooking controller, relay arbiter, and
//! temperature acquisition running as real task threads against mocks.

use std::sync::Arc;
use std::time::Duration;

use super::mock_hw::{RecordingPanel, RecordingRelays, fast_config, wait_until};

use smartoven::adapters::clock::SimClock;
use smartoven::adapters::thermo_spi::SimThermo;
use smartoven::bus::Bus;
use smartoven::cook::{self, Notice, NoticeKind};
use smartoven::ports::{CLOCK_VALID_EPOCH, Tone};
use smartoven::recipe::{CookMode, Recipe};
use smartoven::relay::{self, Actuator, Regime};
use smartoven::status;
use smartoven::tasks::{Core, spawn_task};
use smartoven::thermo::{self, TempSample, TempUnit};

fn recipe(mode: CookMode, target: f32, unit: TempUnit, duration: Duration, id: &str) -> Recipe {
    Recipe {
        mode,
        target_temperature: target,
        unit,
        duration,
        job_id: id.to_string(),
    }
}

fn spawn_controller(bus: Arc<Bus>, clock: SimClock) -> RecordingPanel {
    let panel = RecordingPanel::new();
    spawn_task(
        Core::App,
        5,
        256,
        "cook\0",
        cook::controller_task(bus, fast_config(), clock, panel.clone(), panel.clone()),
    );
    panel
}

fn synced_clock() -> SimClock {
    SimClock::starting_at(CLOCK_VALID_EPOCH + 1_000)
}

fn drain_notices(bus: &Bus, into: &mut Vec<Notice>) {
    while let Some(n) = bus.notices.try_recv() {
        into.push(n);
    }
}

// ── Mode mask + arbiter mirroring ─────────────────────────────

#[test]
fn broil_drives_only_the_top_element() {
    let bus = Arc::new(Bus::new());
    let relays = RecordingRelays::new();
    spawn_task(
        Core::App,
        6,
        256,
        "relay\0",
        relay::arbiter_task(relays.clone(), bus.clone(), fast_config()),
    );
    let _panel = spawn_controller(bus.clone(), synced_clock());

    // Far under target, so the control law asserts the heat mask.
    bus.temperature.publish(TempSample::from_celsius(20.0));
    bus.jobs.publish(recipe(
        CookMode::Broil,
        400.0,
        TempUnit::Fahrenheit,
        Duration::from_secs(600),
        "job-broil",
    ));

    assert!(wait_until(Duration::from_secs(2), || {
        bus.status.any_set(status::IS_COOKING)
    }));
    assert!(wait_until(Duration::from_secs(2), || {
        bus.requested.snapshot() & Actuator::TopElement.mask() != 0
    }));

    // Bottom element, fan, and rotisserie must never energize under Broil.
    let forbidden = Actuator::BottomElement.mask()
        | Actuator::ConvectionFan.mask()
        | Actuator::Rotisserie.mask();
    for _ in 0..20 {
        assert_eq!(bus.requested.snapshot() & forbidden, 0);
        std::thread::sleep(Duration::from_millis(10));
    }

    // The arbiter mirrors indicator + top element onto the outputs.
    let expected = relay::output_levels(
        Regime::Active,
        Actuator::IndicatorLight.mask() | Actuator::TopElement.mask(),
    );
    assert!(wait_until(Duration::from_secs(2), || {
        relays.last() == Some(expected)
    }));
}

// ── Emergency stop ────────────────────────────────────────────

#[test]
fn emergency_stop_deasserts_every_output_within_one_poll() {
    let bus = Arc::new(Bus::new());
    let relays = RecordingRelays::new();
    let cfg = fast_config();
    spawn_task(
        Core::App,
        6,
        256,
        "relay\0",
        relay::arbiter_task(relays.clone(), bus.clone(), cfg.clone()),
    );
    let _panel = spawn_controller(bus.clone(), synced_clock());

    bus.temperature.publish(TempSample::from_celsius(20.0));
    bus.jobs.publish(recipe(
        CookMode::Bake,
        200.0,
        TempUnit::Celsius,
        Duration::from_secs(600),
        "job-estop",
    ));
    assert!(wait_until(Duration::from_secs(2), || {
        bus.requested.snapshot() & Actuator::TopElement.mask() != 0
    }));

    // The external safety input asserts the stop.
    bus.status.set(status::EMERGENCY_STOP);

    let all_off = relay::output_levels(Regime::Emergency, 0);
    // One arbiter poll interval (40 ms here) plus margin.
    assert!(wait_until(Duration::from_secs(1), || {
        relays.last() == Some(all_off)
    }));

    // The running job aborts and releases its state.
    assert!(wait_until(Duration::from_secs(2), || {
        !bus.status.any_set(status::IS_COOKING)
    }));
    assert!(wait_until(Duration::from_secs(1), || {
        bus.requested.snapshot() == 0
    }));

    let mut notices = Vec::new();
    drain_notices(&bus, &mut notices);
    assert!(
        notices
            .iter()
            .any(|n| n.kind == NoticeKind::JobFinished && n.message.contains("emergency stop"))
    );

    // Only the external safety input may clear the flag.
    bus.status.clear(status::EMERGENCY_STOP);
    assert!(wait_until(Duration::from_secs(1), || {
        relays.last() == Some(relay::output_levels(Regime::Idle, 0))
    }));
}

// ── Job replacement ───────────────────────────────────────────

#[test]
fn replacement_job_preempts_and_restarts_cooking_once() {
    let bus = Arc::new(Bus::new());
    let _panel = spawn_controller(bus.clone(), synced_clock());

    bus.temperature.publish(TempSample::from_celsius(20.0));
    bus.jobs.publish(recipe(
        CookMode::Bake,
        200.0,
        TempUnit::Celsius,
        Duration::from_secs(600),
        "job-a",
    ));
    assert!(wait_until(Duration::from_secs(2), || {
        bus.status.any_set(status::IS_COOKING)
    }));

    // Replacement arrives mid-job.
    bus.jobs.publish(recipe(
        CookMode::Convection,
        180.0,
        TempUnit::Celsius,
        Duration::from_secs(600),
        "job-b",
    ));

    let mut notices = Vec::new();
    assert!(wait_until(Duration::from_secs(5), || {
        drain_notices(&bus, &mut notices);
        notices
            .iter()
            .any(|n| n.kind == NoticeKind::JobStarted && n.message.contains("job-b"))
    }));

    // Job A exited as replaced, not completed.
    assert!(
        notices
            .iter()
            .any(|n| n.kind == NoticeKind::JobFinished && n.message.contains("job-a: replaced"))
    );
    // Exactly one fresh Idle→Running transition for the replacement.
    let b_starts = notices
        .iter()
        .filter(|n| n.kind == NoticeKind::JobStarted && n.message.contains("job-b"))
        .count();
    assert_eq!(b_starts, 1);
    assert!(bus.status.any_set(status::IS_COOKING));

    // The convection job holds its fan bit.
    assert!(wait_until(Duration::from_secs(1), || {
        bus.requested.snapshot() & Actuator::ConvectionFan.mask() != 0
    }));
}

// ── Hysteresis ────────────────────────────────────────────────

#[test]
fn hysteresis_band_holds_actuator_state() {
    let bus = Arc::new(Bus::new());
    let _panel = spawn_controller(bus.clone(), synced_clock());
    let heat = CookMode::Bake.heat_mask();

    bus.temperature.publish(TempSample::from_celsius(150.0));
    bus.jobs.publish(recipe(
        CookMode::Bake,
        200.0,
        TempUnit::Celsius,
        Duration::from_secs(600),
        "job-hyst",
    ));
    assert!(wait_until(Duration::from_secs(2), || {
        bus.requested.snapshot() & heat == heat
    }));

    // Inside the band: state is held, not cleared.
    bus.temperature.publish(TempSample::from_celsius(198.0));
    std::thread::sleep(Duration::from_millis(150));
    assert_eq!(bus.requested.snapshot() & heat, heat);

    // Over the band: heat mask clears.
    bus.temperature.publish(TempSample::from_celsius(206.0));
    assert!(wait_until(Duration::from_secs(2), || {
        bus.requested.snapshot() & heat == 0
    }));

    // Back inside the band: cleared state is held too.
    bus.temperature.publish(TempSample::from_celsius(198.0));
    std::thread::sleep(Duration::from_millis(150));
    assert_eq!(bus.requested.snapshot() & heat, 0);

    // Under the band: heat mask asserts again.
    bus.temperature.publish(TempSample::from_celsius(190.0));
    assert!(wait_until(Duration::from_secs(2), || {
        bus.requested.snapshot() & heat == heat
    }));
}

// ── Completion ────────────────────────────────────────────────

#[test]
fn completed_job_clears_state_and_chimes() {
    let bus = Arc::new(Bus::new());
    let panel = spawn_controller(bus.clone(), synced_clock());

    bus.temperature.publish(TempSample::from_celsius(199.0));
    bus.jobs.publish(recipe(
        CookMode::Bake,
        200.0,
        TempUnit::Celsius,
        Duration::from_secs(1),
        "job-short",
    ));
    assert!(wait_until(Duration::from_secs(2), || {
        bus.status.any_set(status::IS_COOKING)
    }));
    assert!(wait_until(Duration::from_secs(5), || {
        !bus.status.any_set(status::IS_COOKING)
    }));

    assert_eq!(bus.requested.snapshot(), 0);

    let mut notices = Vec::new();
    drain_notices(&bus, &mut notices);
    assert!(
        notices
            .iter()
            .any(|n| n.kind == NoticeKind::JobFinished && n.message.contains("completed"))
    );

    let tones = panel.tones.lock().unwrap().clone();
    assert_eq!(tones, vec![Tone::MealStarted, Tone::MealFinished]);
}

// ── Sensor fault tolerance ────────────────────────────────────

#[test]
fn sensor_miss_streak_is_reported_but_does_not_abort() {
    let bus = Arc::new(Bus::new());
    let _panel = spawn_controller(bus.clone(), synced_clock());

    // No temperature is ever published.
    bus.jobs.publish(recipe(
        CookMode::Bake,
        200.0,
        TempUnit::Celsius,
        Duration::from_secs(600),
        "job-nosensor",
    ));
    assert!(wait_until(Duration::from_secs(2), || {
        bus.status.any_set(status::IS_COOKING)
    }));

    let mut notices = Vec::new();
    assert!(wait_until(Duration::from_secs(3), || {
        drain_notices(&bus, &mut notices);
        notices.iter().any(|n| n.kind == NoticeKind::SensorFault)
    }));

    // The job keeps running on its last actuator state.
    assert!(bus.status.any_set(status::IS_COOKING));
}

// ── Clock gate ────────────────────────────────────────────────

#[test]
fn job_start_waits_for_a_plausible_clock() {
    let bus = Arc::new(Bus::new());
    let clock = SimClock::new();
    let epoch = clock.handle();
    let _panel = spawn_controller(bus.clone(), clock);

    bus.temperature.publish(TempSample::from_celsius(20.0));
    bus.jobs.publish(recipe(
        CookMode::Bake,
        200.0,
        TempUnit::Celsius,
        Duration::from_secs(600),
        "job-clock",
    ));

    // Clock is unset: the job must not start.
    std::thread::sleep(Duration::from_millis(300));
    assert!(!bus.status.any_set(status::IS_COOKING));

    // Time sync arrives.
    epoch.store(CLOCK_VALID_EPOCH + 1, std::sync::atomic::Ordering::SeqCst);
    assert!(wait_until(Duration::from_secs(2), || {
        bus.status.any_set(status::IS_COOKING)
    }));
}

// ── Acquisition loop ──────────────────────────────────────────

#[test]
fn acquisition_publishes_samples_and_fault_sentinel() {
    let bus = Arc::new(Bus::new());
    let (sensor, handle) = SimThermo::new(0);
    handle.set_celsius(100.0);
    spawn_task(
        Core::App,
        5,
        256,
        "thermo\0",
        thermo::acquisition_task(sensor, bus.clone(), fast_config()),
    );

    assert!(wait_until(Duration::from_secs(2), || {
        bus.temperature.is_pending()
    }));
    let sample = bus.temperature.try_peek().unwrap();
    assert!((sample.celsius - 100.0).abs() < 0.25);
    assert!(!sample.is_fault());

    // SPI failure: the loop republishes the sentinel, no error channel.
    handle.set_failing(true);
    let _ = bus.temperature.try_take();
    assert!(wait_until(Duration::from_secs(2), || {
        bus.temperature
            .try_peek()
            .is_some_and(|s| s.is_fault())
    }));
}
