//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`StoragePort`] for the oven: device identity, appliance
//! type, network credentials, pairing identity, and the postcard-encoded
//! [`OvenConfig`] blob.
//!
//! - Namespace isolation: credentials live under their own namespace.
//! - Atomic writes: ESP-IDF NVS commits are atomic per `nvs_commit()`;
//!   the in-memory simulation is trivially atomic.

use log::{info, warn};

use crate::adapters::device_id;
use crate::config::OvenConfig;
use crate::error::Error;
use crate::ports::{StorageError, StoragePort};
use crate::remote::client::Identity;

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

/// General appliance namespace.
pub const NAMESPACE: &str = "smartoven";
/// Credentials namespace (encrypted partition on the device).
pub const CRED_NAMESPACE: &str = "auth";

pub const ID_KEY: &str = "ID";
pub const APPLIANCE_TYPE_KEY: &str = "APPLIANCE_TYPE";
pub const DEVICE_NAME_KEY: &str = "DEVICE_NAME";
pub const PAIRING_ID_KEY: &str = "PAIR_ID";
pub const WIFI_SSID_KEY: &str = "WIFI_SSID";
pub const WIFI_PASS_KEY: &str = "WIFI_PASS";
const CONFIG_KEY: &str = "syscfg";

pub const DEFAULT_APPLIANCE_TYPE: &str = "Toaster Oven";

pub struct NvsStore {
    #[cfg(not(target_os = "espidf"))]
    store: std::cell::RefCell<HashMap<String, Vec<u8>>>,
}

impl NvsStore {
    /// Create the store and initialise NVS flash.
    ///
    /// On first boot or after a version mismatch the NVS partition is
    /// erased and re-initialised automatically.
    pub fn new() -> Result<Self, Error> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: nvs_flash_init / nvs_flash_erase are called from the
            // single main-task context before any concurrent NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("NVS: erasing and re-initialising flash partition");
                if unsafe { nvs_flash_erase() } != ESP_OK {
                    return Err(Error::Init("nvs_flash_erase"));
                }
                if unsafe { nvs_flash_init() } != ESP_OK {
                    return Err(Error::Init("nvs_flash_init"));
                }
            } else if ret != ESP_OK {
                return Err(Error::Init("nvs_flash_init"));
            }
            info!("NvsStore: ESP-IDF NVS initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsStore: simulation backend");

        Ok(Self {
            #[cfg(not(target_os = "espidf"))]
            store: std::cell::RefCell::new(HashMap::new()),
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn composite_key(namespace: &str, key: &str) -> String {
        format!("{}::{}", namespace, key)
    }

    /// Open an NVS namespace, run `f` with the handle, then close.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T>(namespace: &str, write: bool, f: F) -> Result<T, i32>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, i32>,
    {
        let mut ns_buf = [0u8; 16];
        let ns_bytes = namespace.as_bytes();
        let len = ns_bytes.len().min(15);
        ns_buf[..len].copy_from_slice(&ns_bytes[..len]);

        let mut handle: nvs_handle_t = 0;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };

        let ret = unsafe { nvs_open(ns_buf.as_ptr() as *const _, mode, &mut handle) };
        if ret != ESP_OK {
            return Err(ret);
        }

        let result = f(handle);
        unsafe {
            nvs_close(handle);
        }
        result
    }

    #[cfg(target_os = "espidf")]
    fn key_buf(key: &str) -> [u8; 16] {
        let mut buf = [0u8; 16];
        let bytes = key.as_bytes();
        let len = bytes.len().min(15);
        buf[..len].copy_from_slice(&bytes[..len]);
        buf
    }
}

// ───────────────────────────────────────────────────────────────
// StoragePort
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
impl StoragePort for NvsStore {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let key_buf = Self::key_buf(key);
        Self::with_nvs_handle(namespace, false, |handle| {
            let mut len: usize = buf.len();
            let ret = unsafe {
                nvs_get_blob(
                    handle,
                    key_buf.as_ptr() as *const _,
                    buf.as_mut_ptr() as *mut _,
                    &mut len,
                )
            };
            if ret == ESP_OK { Ok(len) } else { Err(ret) }
        })
        .map_err(|ret| {
            if ret == ESP_ERR_NVS_NOT_FOUND {
                StorageError::NotFound
            } else {
                StorageError::IoError
            }
        })
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        let key_buf = Self::key_buf(key);
        Self::with_nvs_handle(namespace, true, |handle| {
            let ret = unsafe {
                nvs_set_blob(
                    handle,
                    key_buf.as_ptr() as *const _,
                    data.as_ptr() as *const _,
                    data.len(),
                )
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            let ret = unsafe { nvs_commit(handle) };
            if ret == ESP_OK { Ok(()) } else { Err(ret) }
        })
        .map_err(|ret| {
            if ret == ESP_ERR_NVS_NOT_ENOUGH_SPACE {
                StorageError::Full
            } else {
                StorageError::IoError
            }
        })
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        let key_buf = Self::key_buf(key);
        Self::with_nvs_handle(namespace, true, |handle| {
            let ret = unsafe { nvs_erase_key(handle, key_buf.as_ptr() as *const _) };
            if ret == ESP_OK || ret == ESP_ERR_NVS_NOT_FOUND {
                let _ = unsafe { nvs_commit(handle) };
                Ok(())
            } else {
                Err(ret)
            }
        })
        .map_err(|_| StorageError::IoError)
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        let mut probe = [0u8; 1];
        !matches!(self.read(namespace, key, &mut probe), Err(StorageError::NotFound))
    }
}

#[cfg(not(target_os = "espidf"))]
impl StoragePort for NvsStore {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let k = Self::composite_key(namespace, key);
        match self.store.borrow().get(&k) {
            Some(v) => {
                let n = v.len().min(buf.len());
                buf[..n].copy_from_slice(&v[..n]);
                Ok(n)
            }
            None => Err(StorageError::NotFound),
        }
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        let k = Self::composite_key(namespace, key);
        self.store.borrow_mut().insert(k, data.to_vec());
        Ok(())
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        self.store
            .borrow_mut()
            .remove(&Self::composite_key(namespace, key));
        Ok(())
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.store
            .borrow()
            .contains_key(&Self::composite_key(namespace, key))
    }
}

// ───────────────────────────────────────────────────────────────
// String and config helpers
// ───────────────────────────────────────────────────────────────

/// Read a UTF-8 string value.
pub fn read_string(store: &impl StoragePort, namespace: &str, key: &str) -> Option<String> {
    let mut buf = [0u8; 128];
    let n = store.read(namespace, key, &mut buf).ok()?;
    core::str::from_utf8(&buf[..n]).ok().map(str::to_string)
}

/// Read a string value, persisting and returning `default` when absent.
pub fn string_or_default(
    store: &mut impl StoragePort,
    namespace: &str,
    key: &str,
    default: &str,
) -> String {
    if let Some(v) = read_string(store, namespace, key) {
        return v;
    }
    if let Err(e) = store.write(namespace, key, default.as_bytes()) {
        warn!("flash write of {key} default failed: {e}");
    }
    default.to_string()
}

/// Load the system config blob, falling back to defaults.
pub fn load_config(store: &impl StoragePort) -> OvenConfig {
    let mut buf = [0u8; 256];
    match store.read(NAMESPACE, CONFIG_KEY, &mut buf) {
        Ok(n) => match postcard::from_bytes(&buf[..n]) {
            Ok(cfg) => {
                info!("config loaded from flash");
                cfg
            }
            Err(_) => {
                warn!("stored config corrupt, using defaults");
                OvenConfig::default()
            }
        },
        Err(_) => OvenConfig::default(),
    }
}

/// Persist the system config blob.
pub fn save_config(store: &mut impl StoragePort, cfg: &OvenConfig) -> Result<(), StorageError> {
    let bytes = postcard::to_allocvec(cfg).map_err(|_| StorageError::IoError)?;
    store.write(NAMESPACE, CONFIG_KEY, &bytes)
}

/// Load the device identity, deriving and persisting MAC-based defaults
/// for anything the flash store does not hold yet.
pub fn load_identity(store: &mut impl StoragePort) -> Identity {
    let mac = device_id::read_mac();
    let device_id = string_or_default(
        store,
        NAMESPACE,
        ID_KEY,
        device_id::device_id(&mac).as_str(),
    );
    let name = string_or_default(
        store,
        NAMESPACE,
        DEVICE_NAME_KEY,
        device_id::hostname(&mac).as_str(),
    );
    let pairing_id = string_or_default(store, CRED_NAMESPACE, PAIRING_ID_KEY, "unknown");
    Identity {
        device_id,
        name,
        pairing_id,
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
