//! SmartOven firmware — main entry point (ESP-IDF).
//!
//! Boot order:
//!
//! 1. ESP-IDF bootstrap (link patches, logger)
//! 2. Flash store + device identity + config
//! 3. SNTP time sync (jobs refuse to start until the clock is plausible)
//! 4. WiFi station association
//! 5. Peripheral wiring (relay bank, thermocouple SPI, emergency-stop input)
//! 6. Task spawning: relay arbiter, temperature acquisition, cooking
//!    controller, remote messaging client, status reporters
//! 7. Main wiring loop: safety input, scanner, pairing channel

use std::sync::Arc;

use anyhow::Result;
use log::{error, info, warn};

use smartoven::adapters::clock::SystemClock;
use smartoven::adapters::nvs::{self, NvsStore};
use smartoven::adapters::panel::{LogChime, LogDisplay, SimPairing, SimScanner};
use smartoven::adapters::relay_gpio::RelayBank;
use smartoven::adapters::thermo_spi;
use smartoven::adapters::wifi::{ConnectivityPort, WifiAdapter};
use smartoven::adapters::ws::EspWsTransport;
use smartoven::bus::Bus;
use smartoven::ports::{PairingPort, ScannerPort, StoragePort};
use smartoven::remote::client::RemoteClient;
use smartoven::tasks::{Core, spawn_on_core, spawn_task};
use smartoven::{cook, relay, reporters, status, thermo};

/// Backend endpoint key in flash, with the lab default.
const BACKEND_URL_KEY: &str = "BACKEND_URL";
const DEFAULT_BACKEND_URL: &str = "ws://10.0.0.146:3001";

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("SmartOven v{}", env!("CARGO_PKG_VERSION"));

    let peripherals = esp_idf_hal::peripherals::Peripherals::take()?;

    // ── 2. Flash store, identity, config ──────────────────────
    let mut store = match NvsStore::new() {
        Ok(s) => s,
        Err(e) => {
            error!("flash store init failed: {e} — halting");
            return Err(anyhow::anyhow!("{e}"));
        }
    };
    let identity = nvs::load_identity(&mut store);
    info!("Device ID: {}", identity.device_id);

    let appliance_type = nvs::string_or_default(
        &mut store,
        nvs::NAMESPACE,
        nvs::APPLIANCE_TYPE_KEY,
        nvs::DEFAULT_APPLIANCE_TYPE,
    );
    info!("Appliance type: {appliance_type}");

    let config = nvs::load_config(&store);
    let backend_url =
        nvs::string_or_default(&mut store, nvs::NAMESPACE, BACKEND_URL_KEY, DEFAULT_BACKEND_URL);

    // ── 3. Time sync ──────────────────────────────────────────
    let _sntp = esp_idf_svc::sntp::EspSntp::new_default()?;
    info!("SNTP started");

    // ── 4. WiFi station ───────────────────────────────────────
    let bus = Arc::new(Bus::new());
    let mut wifi = WifiAdapter::new(bus.clone());
    let ssid = nvs::string_or_default(&mut store, nvs::CRED_NAMESPACE, nvs::WIFI_SSID_KEY, "");
    let pass = nvs::string_or_default(&mut store, nvs::CRED_NAMESPACE, nvs::WIFI_PASS_KEY, "");
    if ssid.is_empty() {
        warn!("no WiFi credentials stored; waiting for pairing channel");
    } else {
        if let Err(e) = wifi.set_credentials(&ssid, &pass) {
            warn!("stored WiFi credentials invalid: {e}");
        } else if let Err(e) = wifi.connect() {
            warn!("WiFi connect failed: {e} (reconnect policy armed)");
        }
    }

    // ── 5. Peripheral wiring ──────────────────────────────────
    // Emergency stop: external safety circuit, active low, input-only pin.
    let estop = esp_idf_hal::gpio::PinDriver::input(peripherals.pins.gpio34)?;

    // Board map per the `pins` module constants.
    use esp_idf_hal::gpio::AnyOutputPin;
    let relay_pins: [AnyOutputPin; relay::Actuator::COUNT] = [
        peripherals.pins.gpio26.into(),
        peripherals.pins.gpio25.into(),
        peripherals.pins.gpio23.into(),
        peripherals.pins.gpio22.into(),
        peripherals.pins.gpio21.into(),
    ];
    let relay_bank = RelayBank::new(relay_pins).map_err(|e| anyhow::anyhow!("{e}"))?;

    let thermo_port = thermo_spi::spi_thermo_port(
        peripherals.spi2,
        peripherals.pins.gpio18.into(),
        peripherals.pins.gpio19.into(),
        peripherals.pins.gpio5.into(),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))?;

    // ── 6. Tasks ──────────────────────────────────────────────
    let _relay_task = spawn_task(
        Core::App,
        6,
        8,
        "relay\0",
        relay::arbiter_task(relay_bank, bus.clone(), config.clone()),
    );
    let _thermo_task = spawn_task(
        Core::App,
        5,
        8,
        "thermo\0",
        thermo::acquisition_task(thermo_port, bus.clone(), config.clone()),
    );
    let _cook_task = spawn_task(
        Core::App,
        5,
        12,
        "cook\0",
        cook::controller_task(
            bus.clone(),
            config.clone(),
            SystemClock::new(),
            LogDisplay::new(),
            LogChime::new(),
        ),
    );
    let transport = EspWsTransport::new(backend_url);
    let _remote_task = spawn_task(
        Core::Pro,
        4,
        16,
        "remote\0",
        RemoteClient::new(transport, identity, config.clone()).run(bus.clone()),
    );
    let _report_task = {
        let bus = bus.clone();
        let cfg = config.clone();
        spawn_on_core(Core::Pro, 3, 12, "report\0", move || {
            reporters::run_forwarders(bus, cfg);
        })
    };

    info!("System ready");

    // ── 7. Main wiring loop ───────────────────────────────────
    // Scanner and pairing remain log/stub adapters until their UART/radio
    // wiring is attached; the forwarding paths are live.
    let mut scanner = SimScanner::new();
    let mut pairing = SimPairing::new();

    loop {
        // External safety signal owns the EMERGENCY_STOP flag exclusively.
        if estop.is_low() {
            if !bus.status.any_set(status::EMERGENCY_STOP) {
                error!("EMERGENCY STOP asserted");
            }
            bus.status.set(status::EMERGENCY_STOP);
        } else if bus.status.any_set(status::EMERGENCY_STOP) {
            info!("emergency stop released");
            bus.status.clear(status::EMERGENCY_STOP);
        }

        if let Some(code) = scanner.poll_scan() {
            info!("scanned code: {code}");
            bus.scans.publish(code);
        }

        if let Some(creds) = pairing.take_credentials() {
            info!("pairing: credentials for '{}'", creds.ssid);
            if store
                .write(nvs::CRED_NAMESPACE, nvs::WIFI_SSID_KEY, creds.ssid.as_bytes())
                .is_err()
                || store
                    .write(nvs::CRED_NAMESPACE, nvs::WIFI_PASS_KEY, creds.password.as_bytes())
                    .is_err()
            {
                warn!("pairing: failed to persist credentials");
            }
            if store
                .write(nvs::NAMESPACE, nvs::DEVICE_NAME_KEY, creds.device_name.as_bytes())
                .is_err()
            {
                warn!("pairing: failed to persist device name");
            }
            match wifi.set_credentials(&creds.ssid, &creds.password) {
                Ok(()) => {
                    if let Err(e) = wifi.connect() {
                        warn!("pairing: WiFi connect failed: {e}");
                    }
                }
                Err(e) => warn!("pairing: invalid credentials — {e}"),
            }
        }

        wifi.poll();
        std::thread::sleep(core::time::Duration::from_millis(100));
    }
}
