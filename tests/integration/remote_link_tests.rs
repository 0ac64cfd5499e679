//! Scenario tests for the remote messaging client task, including the full
//! acquisition → reporter → client pipeline over a scripted transport.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::mock_hw::{RecordingPanel, fast_config, wait_until};

use smartoven::adapters::clock::SimClock;
use smartoven::adapters::thermo_spi::SimThermo;
use smartoven::bus::Bus;
use smartoven::config::OvenConfig;
use smartoven::cook;
use smartoven::ports::CLOCK_VALID_EPOCH;
use smartoven::remote::client::{Identity, RemoteClient};
use smartoven::remote::transport::{Frame, Transport};
use smartoven::remote::update::{StatusUpdate, paths};
use smartoven::reporters;
use smartoven::status;
use smartoven::tasks::{Core, spawn_on_core, spawn_task};
use smartoven::thermo::{self, TempSample};

// ── Scripted transport shared with the test body ──────────────

struct LinkState {
    connected: bool,
    connects: u32,
    inbound: VecDeque<Frame>,
    sent: Vec<String>,
}

#[derive(Clone)]
struct SharedTransport {
    inner: Arc<Mutex<LinkState>>,
}

impl SharedTransport {
    fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(LinkState {
                connected: false,
                connects: 0,
                inbound: VecDeque::new(),
                sent: Vec::new(),
            })),
        }
    }

    fn connects(&self) -> u32 {
        self.inner.lock().unwrap().connects
    }

    fn connected(&self) -> bool {
        self.inner.lock().unwrap().connected
    }

    fn sent(&self) -> Vec<String> {
        self.inner.lock().unwrap().sent.clone()
    }

    fn inject_text(&self, text: String) {
        self.inner.lock().unwrap().inbound.push_back(Frame::Text(text));
    }

    fn inject_ack(&self, device_id: &str) {
        self.inject_text(
            serde_json::json!({
                "id": format!("{device_id}::{}", paths::REGISTER),
                "result": {"data": {"json": {}}},
            })
            .to_string(),
        );
    }
}

impl Transport for SharedTransport {
    type Error = &'static str;

    fn connect(&mut self) -> Result<(), Self::Error> {
        let mut s = self.inner.lock().unwrap();
        s.connected = true;
        s.connects += 1;
        Ok(())
    }

    fn disconnect(&mut self) {
        self.inner.lock().unwrap().connected = false;
    }

    fn is_connected(&self) -> bool {
        self.inner.lock().unwrap().connected
    }

    fn poll_frame(&mut self) -> Result<Option<Frame>, Self::Error> {
        Ok(self.inner.lock().unwrap().inbound.pop_front())
    }

    fn send_text(&mut self, text: &str) -> Result<usize, Self::Error> {
        let mut s = self.inner.lock().unwrap();
        if !s.connected {
            return Err("not connected");
        }
        s.sent.push(text.to_string());
        Ok(text.len())
    }
}

fn identity() -> Identity {
    Identity {
        device_id: "OV-TEST01".into(),
        name: "test oven".into(),
        pairing_id: "pair-test".into(),
    }
}

fn spawn_client(bus: Arc<Bus>, transport: SharedTransport, cfg: OvenConfig) {
    spawn_task(
        Core::Pro,
        4,
        256,
        "remote\0",
        RemoteClient::new(transport, identity(), cfg).run(bus),
    );
}

// ── Demand-driven connect + registration gate ─────────────────

#[test]
fn pending_message_triggers_connect_within_one_poll_interval() {
    let bus = Arc::new(Bus::new());
    let transport = SharedTransport::new();
    spawn_client(bus.clone(), transport.clone(), fast_config());

    // Nothing to send: no connection is held open.
    std::thread::sleep(Duration::from_millis(200));
    assert_eq!(transport.connects(), 0);

    bus.outbox
        .try_send(StatusUpdate::Temperature(TempSample::from_celsius(180.0)))
        .unwrap();

    // Connect poll is 30 ms here; one interval plus margin.
    assert!(wait_until(Duration::from_millis(300), || {
        transport.connects() == 1
    }));

    // Registration goes out immediately, but the outbox stays gated.
    assert!(wait_until(Duration::from_secs(1), || {
        transport.sent().iter().any(|s| s.contains(paths::REGISTER))
    }));
    std::thread::sleep(Duration::from_millis(100));
    assert_eq!(bus.outbox.len(), 1);
    assert!(
        transport
            .sent()
            .iter()
            .all(|s| !s.contains(paths::UPDATE_TEMPERATURE))
    );

    // The ack opens the send path.
    transport.inject_ack("OV-TEST01");
    assert!(wait_until(Duration::from_secs(2), || {
        bus.status.any_set(status::REGISTERED) && bus.outbox.is_empty()
    }));
    assert!(wait_until(Duration::from_secs(1), || {
        transport
            .sent()
            .iter()
            .any(|s| s.contains(paths::UPDATE_TEMPERATURE))
    }));
}

// ── Idle timeout ──────────────────────────────────────────────

#[test]
fn idle_timeout_disconnects_and_demand_reconnects() {
    let bus = Arc::new(Bus::new());
    let transport = SharedTransport::new();
    let cfg = OvenConfig {
        idle_disconnect_ms: 150,
        ..fast_config()
    };
    spawn_client(bus.clone(), transport.clone(), cfg);

    bus.outbox
        .try_send(StatusUpdate::CookingStarted)
        .unwrap();
    assert!(wait_until(Duration::from_secs(1), || transport.connects() == 1));
    transport.inject_ack("OV-TEST01");
    assert!(wait_until(Duration::from_secs(2), || {
        bus.status.any_set(status::REGISTERED)
    }));

    // Quiet link: torn down after the idle period, readiness cleared.
    assert!(wait_until(Duration::from_secs(2), || !transport.connected()));
    assert!(!bus.status.any_set(status::CONNECTION_READY | status::REGISTERED));

    // A fresh pending message re-arms the demand-driven connect.
    bus.outbox
        .try_send(StatusUpdate::CookingStopped)
        .unwrap();
    assert!(wait_until(Duration::from_secs(1), || transport.connects() == 2));
    let registrations = transport
        .sent()
        .iter()
        .filter(|s| s.contains(paths::REGISTER))
        .count();
    assert!(registrations >= 2, "re-registration after reconnect");
}

// ── Full pipeline: assignment in, telemetry + state out ───────

#[test]
fn assignment_flows_to_controller_and_state_flows_back() {
    let bus = Arc::new(Bus::new());
    let transport = SharedTransport::new();
    let cfg = fast_config();

    // Acquisition + controller + reporters + client: the firmware minus
    // the relay arbiter and real peripherals.
    let (sensor, thermo_handle) = SimThermo::new(0);
    thermo_handle.set_celsius(20.0);
    spawn_task(
        Core::App,
        5,
        256,
        "thermo\0",
        thermo::acquisition_task(sensor, bus.clone(), cfg.clone()),
    );
    let panel = RecordingPanel::new();
    spawn_task(
        Core::App,
        5,
        256,
        "cook\0",
        cook::controller_task(
            bus.clone(),
            cfg.clone(),
            SimClock::starting_at(CLOCK_VALID_EPOCH + 1_000),
            panel.clone(),
            panel.clone(),
        ),
    );
    {
        let bus = bus.clone();
        let cfg = cfg.clone();
        spawn_on_core(Core::Pro, 3, 256, "report\0", move || {
            reporters::run_forwarders(bus, cfg);
        });
    }
    spawn_client(bus.clone(), transport.clone(), cfg);

    // The temperature reporter arms the demand-driven connect by itself.
    assert!(wait_until(Duration::from_secs(3), || transport.connects() >= 1));
    assert!(wait_until(Duration::from_secs(2), || {
        transport.sent().iter().any(|s| s.contains(paths::REGISTER))
    }));
    transport.inject_ack("OV-TEST01");
    assert!(wait_until(Duration::from_secs(2), || {
        bus.status.any_set(status::REGISTERED)
    }));

    // Telemetry drains once the link is ready.
    assert!(wait_until(Duration::from_secs(3), || {
        transport
            .sent()
            .iter()
            .any(|s| s.contains(paths::UPDATE_TEMPERATURE))
    }));

    // Backend assigns a job.
    transport.inject_text(
        serde_json::json!({
            "id": format!("OV-TEST01::{}", paths::SET_RECIPE),
            "result": {"data": {"json": {
                "applianceMode": "Broil",
                "temperature": 400.0,
                "temperatureUnit": "F",
                "applianceType": "Toaster Oven",
                "cookingTime": 600_000u64,
                "expiryDate": 0,
                "id": "job-remote",
            }}},
        })
        .to_string(),
    );

    assert!(wait_until(Duration::from_secs(3), || {
        bus.status.any_set(status::IS_COOKING)
    }));

    // The cooking edge and the start notice both flow back out.
    assert!(wait_until(Duration::from_secs(3), || {
        transport
            .sent()
            .iter()
            .any(|s| s.contains(paths::START_COOKING))
    }));
    assert!(wait_until(Duration::from_secs(3), || {
        transport
            .sent()
            .iter()
            .any(|s| s.contains(paths::UPDATE_STATUS) && s.contains("job-remote"))
    }));
}
