//! JSON profile store.
//!
//! Implements [`ProfilePort`] over profile documents compiled into the
//! firmware image.  Every load parses and validates the document, so a
//! broken profile is reported to the caller instead of half-applied.

use log::{debug, warn};

use crate::app::ports::{ConfigError, ProfilePort};
use crate::config::{DeviceConfig, ProfileName, label};

/// Profiles shipped with the firmware, in switching order.
pub const BUILTIN_PROFILES: [(&str, &str); 2] = [
    ("cocktailcube", include_str!("../../profiles/cocktailcube.json")),
    ("winebar", include_str!("../../profiles/winebar.json")),
];

pub struct JsonProfileStore {
    documents: Vec<(ProfileName, String)>,
}

impl Default for JsonProfileStore {
    fn default() -> Self {
        Self::builtin()
    }
}

impl JsonProfileStore {
    /// Store holding the built-in profiles.
    pub fn builtin() -> Self {
        let mut store = Self::empty();
        for (name, json) in BUILTIN_PROFILES {
            store.insert(name, json);
        }
        store
    }

    pub fn empty() -> Self {
        Self {
            documents: Vec::new(),
        }
    }

    /// Add or replace a document.  It is validated on load, not here.
    pub fn insert(&mut self, name: &str, json: &str) {
        let name: ProfileName = label(name);
        match self.documents.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = json.to_owned(),
            None => self.documents.push((name, json.to_owned())),
        }
    }
}

impl ProfilePort for JsonProfileStore {
    fn names(&self) -> Vec<ProfileName> {
        self.documents.iter().map(|(n, _)| n.clone()).collect()
    }

    fn load(&self, name: &str) -> Result<DeviceConfig, ConfigError> {
        let (_, json) = self
            .documents
            .iter()
            .find(|(n, _)| n.as_str() == name)
            .ok_or(ConfigError::NotFound)?;
        let config = DeviceConfig::from_json(json).inspect_err(|e| {
            warn!("profile '{}' rejected: {}", name, e);
        })?;
        debug!("profile '{}' loaded: {:?}", name, config.kind());
        Ok(config)
    }
}
