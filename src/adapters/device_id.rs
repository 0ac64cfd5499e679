//! Device identity derived from the ESP32 factory MAC address.
//!
//! Produces a stable, human-readable device ID in the form `OV-XXYYZZ`
//! (last 3 bytes of the 6-byte MAC in uppercase hex). Used as the fallback
//! when the flash store holds no provisioned identity, as the correlation-id
//! prefix on the backend link, and as the pairing advertising name
//! (`smartoven-xxyyzz`).

/// Fixed-size device ID string: "OV-XXYYZZ".
pub type DeviceIdString = heapless::String<16>;

/// Full 6-byte MAC address.
pub type MacAddress = [u8; 6];

/// Read the factory MAC address from eFuse.
#[cfg(target_os = "espidf")]
pub fn read_mac() -> MacAddress {
    let mut mac: MacAddress = [0u8; 6];
    unsafe {
        esp_idf_svc::sys::esp_efuse_mac_get_default(mac.as_mut_ptr());
    }
    mac
}

/// Simulation: returns a deterministic fake MAC.
#[cfg(not(target_os = "espidf"))]
pub fn read_mac() -> MacAddress {
    [0xDE, 0xAD, 0xBE, 0xEF, 0x0A, 0xEB]
}

/// Derive the short device ID from the last 3 MAC bytes.
/// Format: `OV-XXYYZZ` (e.g., `OV-EF0AEB`).
pub fn device_id(mac: &MacAddress) -> DeviceIdString {
    let mut id = DeviceIdString::new();
    use core::fmt::Write;
    let _ = write!(id, "OV-{:02X}{:02X}{:02X}", mac[3], mac[4], mac[5]);
    id
}

/// Derive the pairing/mDNS hostname from the last 3 MAC bytes.
/// Format: `smartoven-xxyyzz` (lowercase).
pub fn hostname(mac: &MacAddress) -> heapless::String<24> {
    let mut name = heapless::String::<24>::new();
    use core::fmt::Write;
    let _ = write!(name, "smartoven-{:02x}{:02x}{:02x}", mac[3], mac[4], mac[5]);
    name
}
