//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`SettingsPort`] and [`FlowLogPort`].  Both records are
//! postcard blobs under one namespace:
//!
//! | Key        | Type         | Written                          |
//! |------------|--------------|----------------------------------|
//! | `settings` | `Settings`   | on leaving the settings page     |
//! | `flow`     | `FlowTotals` | whenever dispensing stops        |
//!
//! - **`target_os = "espidf"`**: ESP-IDF NVS; commits are atomic per
//!   `nvs_commit()`.
//! - **host**: an in-memory map, for tests and simulation.

use crate::app::ports::{ConfigError, FlowLogPort, SettingsPort};
use crate::config::Settings;
use crate::dispense::FlowTotals;
use log::{info, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

const NAMESPACE: &str = "cocktail";
const SETTINGS_KEY: &str = "settings";
const FLOW_KEY: &str = "flow";

/// Larger blobs are treated as corrupt rather than allocated.
#[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
const MAX_BLOB_SIZE: usize = 512;

pub struct NvsAdapter {
    #[cfg(not(target_os = "espidf"))]
    store: std::cell::RefCell<HashMap<String, Vec<u8>>>,
}

impl NvsAdapter {
    /// Create a new NvsAdapter and initialise NVS flash.
    ///
    /// Returns `Err(ConfigError::IoError)` if flash initialisation fails
    /// unrecoverably.  On first boot or after a version mismatch the NVS
    /// partition is erased and re-initialised automatically.
    pub fn new() -> Result<Self, ConfigError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: nvs_flash_init / nvs_flash_erase are called from the
            // single main-task context before any concurrent NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("NVS: erasing and re-initialising flash partition");
                if unsafe { nvs_flash_erase() } != ESP_OK {
                    return Err(ConfigError::IoError);
                }
                if unsafe { nvs_flash_init() } != ESP_OK {
                    return Err(ConfigError::IoError);
                }
            } else if ret != ESP_OK {
                return Err(ConfigError::IoError);
            }
            info!("NvsAdapter: ESP-IDF NVS initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsAdapter: simulation backend");

        Ok(Self {
            #[cfg(not(target_os = "espidf"))]
            store: std::cell::RefCell::new(HashMap::new()),
        })
    }

    fn load<T: DeserializeOwned>(&self, key: &str) -> Result<T, ConfigError> {
        let bytes = self.read_blob(key)?;
        postcard::from_bytes(&bytes).map_err(|_| {
            warn!("NvsAdapter: '{}' failed to decode ({} bytes)", key, bytes.len());
            ConfigError::Corrupted
        })
    }

    fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<(), ConfigError> {
        let bytes = postcard::to_allocvec(value).map_err(|_| ConfigError::IoError)?;
        if bytes.len() > MAX_BLOB_SIZE {
            return Err(ConfigError::StorageFull);
        }
        self.write_blob(key, &bytes)?;
        info!("NvsAdapter: '{}' saved ({} bytes)", key, bytes.len());
        Ok(())
    }

    // ── Host backend ──────────────────────────────────────────

    #[cfg(not(target_os = "espidf"))]
    fn composite_key(key: &str) -> String {
        format!("{}::{}", NAMESPACE, key)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_blob(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        self.store
            .borrow()
            .get(&Self::composite_key(key))
            .cloned()
            .ok_or(ConfigError::NotFound)
    }

    #[cfg(not(target_os = "espidf"))]
    fn write_blob(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        self.store
            .borrow_mut()
            .insert(Self::composite_key(key), data.to_vec());
        Ok(())
    }

    // ── ESP-IDF backend ───────────────────────────────────────

    /// Open the namespace, execute a closure with the handle, then close.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T>(write: bool, f: F) -> Result<T, i32>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, i32>,
    {
        let mut ns_buf = [0u8; 16];
        let ns_bytes = NAMESPACE.as_bytes();
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
        let kb = key.as_bytes();
        let kl = kb.len().min(15);
        buf[..kl].copy_from_slice(&kb[..kl]);
        buf
    }

    #[cfg(target_os = "espidf")]
    fn read_blob(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        let key_buf = Self::key_buf(key);
        let result = Self::with_nvs_handle(false, |handle| {
            let mut size: usize = 0;
            // First call: get size
            let ret = unsafe {
                nvs_get_blob(
                    handle,
                    key_buf.as_ptr() as *const _,
                    core::ptr::null_mut(),
                    &mut size,
                )
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            if size == 0 || size > MAX_BLOB_SIZE {
                return Err(ESP_ERR_NVS_INVALID_LENGTH);
            }

            let mut buf = vec![0u8; size];
            let ret = unsafe {
                nvs_get_blob(
                    handle,
                    key_buf.as_ptr() as *const _,
                    buf.as_mut_ptr() as *mut _,
                    &mut size,
                )
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(buf)
        });

        match result {
            Ok(bytes) => Ok(bytes),
            // A missing namespace on first boot reports NOT_FOUND from nvs_open.
            Err(e) if e == ESP_ERR_NVS_NOT_FOUND => Err(ConfigError::NotFound),
            Err(e) if e == ESP_ERR_NVS_INVALID_LENGTH => Err(ConfigError::Corrupted),
            Err(e) => {
                warn!("NvsAdapter: NVS read error {}", e);
                Err(ConfigError::IoError)
            }
        }
    }

    #[cfg(target_os = "espidf")]
    fn write_blob(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        let key_buf = Self::key_buf(key);
        let result = Self::with_nvs_handle(true, |handle| {
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
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(())
        });
        result.map_err(|e| {
            warn!("NvsAdapter: NVS write error {}", e);
            if e == ESP_ERR_NVS_NOT_ENOUGH_SPACE {
                ConfigError::StorageFull
            } else {
                ConfigError::IoError
            }
        })
    }
}

impl SettingsPort for NvsAdapter {
    fn load_settings(&self) -> Result<Settings, ConfigError> {
        self.load(SETTINGS_KEY)
    }

    fn save_settings(&self, settings: &Settings) -> Result<(), ConfigError> {
        self.save(SETTINGS_KEY, settings)
    }
}

impl FlowLogPort for NvsAdapter {
    fn load_flow(&self) -> Result<FlowTotals, ConfigError> {
        self.load(FLOW_KEY)
    }

    fn save_flow(&self, flow: &FlowTotals) -> Result<(), ConfigError> {
        self.save(FLOW_KEY, flow)
    }
}
