//! Fuzz target: `DeviceConfig::from_json`
//!
//! Feeds arbitrary bytes to the profile parser and verifies:
//! - No panics on malformed UTF-8, JSON or field values
//! - Anything accepted passes `validate()` and yields factory settings
//!   that need no sanitizing
//!
//! cargo fuzz run fuzz_profile_json

#![no_main]

use cocktailcube::config::{DeviceConfig, Settings};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    if let Ok(config) = DeviceConfig::from_json(text) {
        assert!(config.validate().is_ok());
        let mut settings = Settings::defaults_for(&config, "fuzz");
        assert!(!settings.sanitize(&config));
    }
});
