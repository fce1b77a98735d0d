//! Device profile and persisted user settings.
//!
//! [`DeviceConfig`] is the *profile*: everything that describes a
//! particular build of the appliance (mixer or pour device, liquid names,
//! default set-point, timing bounds).  Profiles ship as JSON documents and
//! are switched at runtime from the settings page.
//!
//! [`Settings`] are the user's choices on top of a profile.  They are
//! persisted to NVS after every visit to the settings page.

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::mixing::bottles::{Bottle, BottleRack};
use crate::mixing::{DeviceKind, angular_distance};

/// Profile name as stored in settings and listed by the profile store.
pub type ProfileName = heapless::String<24>;

/// Name of the profile used when nothing else is known.
pub const DEFAULT_PROFILE: &str = "cocktailcube";

/// Cycle-time change per encoder step on the settings page.
pub const CYCLE_STEP_MS: u32 = 20;

/// Hard limits any profile's cycle bounds must fall inside.
pub const CYCLE_LIMIT_MS: (u32, u32) = (100, 5000);

/// Copy `text` into a fixed-capacity string, truncating at capacity.
pub fn label<const N: usize>(text: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for ch in text.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
    out
}

// ───────────────────────────────────────────────────────────────
// Enumerated settings
// ───────────────────────────────────────────────────────────────

/// Closed enumerations that the settings page steps through with wrap.
pub trait Cyclic: Copy + PartialEq + 'static {
    const ALL: &'static [Self];

    /// Move one entry in the direction of `dir`'s sign, wrapping.
    fn step(self, dir: i32) -> Self {
        let len = Self::ALL.len() as i32;
        let idx = Self::ALL.iter().position(|v| *v == self).unwrap_or(0) as i32;
        Self::ALL[(idx + dir.signum()).rem_euclid(len) as usize]
    }
}

/// Status LED behaviour selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedMode {
    Off,
    On,
    BlinkSlow,
    BlinkFast,
    FadeSlow,
    FadeFast,
}

impl Cyclic for LedMode {
    const ALL: &'static [Self] = &[
        Self::Off,
        Self::On,
        Self::BlinkSlow,
        Self::BlinkFast,
        Self::FadeSlow,
        Self::FadeFast,
    ];
}

/// Rotary encoder polarity, applied where increments are counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncoderDirection {
    Normal,
    Inverted,
}

impl EncoderDirection {
    pub fn sign(self) -> i32 {
        match self {
            Self::Normal => 1,
            Self::Inverted => -1,
        }
    }
}

impl Cyclic for EncoderDirection {
    const ALL: &'static [Self] = &[Self::Normal, Self::Inverted];
}

/// Inactivity period before the screensaver takes over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScreensaverTimeout {
    Off,
    Sec2,
    Sec15,
    Sec30,
    Min1,
    Min5,
}

impl ScreensaverTimeout {
    /// `None` when the screensaver is disabled.
    pub fn timeout_ms(self) -> Option<u32> {
        match self {
            Self::Off => None,
            Self::Sec2 => Some(2_000),
            Self::Sec15 => Some(15_000),
            Self::Sec30 => Some(30_000),
            Self::Min1 => Some(60_000),
            Self::Min5 => Some(300_000),
        }
    }
}

impl Cyclic for ScreensaverTimeout {
    const ALL: &'static [Self] = &[
        Self::Off,
        Self::Sec2,
        Self::Sec15,
        Self::Sec30,
        Self::Min1,
        Self::Min5,
    ];
}

/// Entries of the settings page, in cursor order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingItem {
    CycleTime,
    RemoteAccess,
    Profile,
    LedIdle,
    LedDispensing,
    EncoderDirection,
    Screensaver,
    Bottle1,
    Bottle2,
    Bottle3,
}

impl SettingItem {
    const ORDER: [Self; 10] = [
        Self::CycleTime,
        Self::RemoteAccess,
        Self::Profile,
        Self::LedIdle,
        Self::LedDispensing,
        Self::EncoderDirection,
        Self::Screensaver,
        Self::Bottle1,
        Self::Bottle2,
        Self::Bottle3,
    ];

    /// Bottle slot edited by this item, if any.
    pub fn bottle_slot(self) -> Option<usize> {
        match self {
            Self::Bottle1 => Some(0),
            Self::Bottle2 => Some(1),
            Self::Bottle3 => Some(2),
            _ => None,
        }
    }

    /// Bottle items only exist on pour devices.
    pub fn available_on(self, kind: DeviceKind) -> bool {
        self.bottle_slot().is_none() || kind == DeviceKind::Pour
    }

    /// Next available item, wrapping back to the first.
    pub fn next(self, kind: DeviceKind) -> Self {
        let idx = Self::ORDER.iter().position(|i| *i == self).unwrap_or(0);
        (1..=Self::ORDER.len())
            .map(|k| Self::ORDER[(idx + k) % Self::ORDER.len()])
            .find(|item| item.available_on(kind))
            .unwrap_or(Self::CycleTime)
    }
}

// ───────────────────────────────────────────────────────────────
// DeviceConfig (profile)
// ───────────────────────────────────────────────────────────────

/// One device profile.  Missing JSON fields fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    // --- Identity ---
    /// `true` for a three-way blend mixer, `false` for a pour/bar device.
    pub is_mixer: bool,
    /// Name shown on the start page and used as the access point name.
    pub mixer_name: heapless::String<15>,
    /// Display names of the three liquids.
    pub liquid_names: [heapless::String<10>; 3],

    // --- Default set-point ---
    /// Dial boundary positions in degrees (mixer).
    pub default_angles: [i16; 3],
    /// Sparkling share per slot in percent (pour).
    pub default_percentages: [u8; 3],
    /// Bottle in each slot at first boot (pour).
    pub default_bottles: [Bottle; 3],
    /// Degrees per encoder step; also the smallest settable distance.
    pub step_angle_deg: i16,

    // --- Timing ---
    pub cycle_min_ms: u32,
    pub cycle_max_ms: u32,
    pub default_cycle_ms: u32,
    /// Confirmation pause on the reset page.
    pub reset_pause_ms: u32,
    /// Input settle pause after every page change.
    pub settle_ms: u32,
    pub default_screensaver: ScreensaverTimeout,

    // --- Flow ---
    /// Nominal delivery of one pump in ml/min.
    pub flow_ml_per_min: u16,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            is_mixer: true,
            mixer_name: label("CocktailCube"),
            liquid_names: [label("Liquid 1"), label("Liquid 2"), label("Liquid 3")],

            default_angles: [0, 120, 240],
            default_percentages: [0, 0, 0],
            default_bottles: [Bottle::RedWine, Bottle::WhiteWine, Bottle::RoseWine],
            step_angle_deg: 3,

            cycle_min_ms: 200,
            cycle_max_ms: 1000,
            default_cycle_ms: 500,
            reset_pause_ms: 2000,
            settle_ms: 500,
            default_screensaver: ScreensaverTimeout::Min1,

            flow_ml_per_min: 250,
        }
    }
}

impl DeviceConfig {
    pub fn kind(&self) -> DeviceKind {
        if self.is_mixer {
            DeviceKind::Mixer
        } else {
            DeviceKind::Pour
        }
    }

    /// Parse and validate a JSON profile document.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(text).map_err(|e| {
            log::warn!("profile: JSON parse failed: {}", e);
            ConfigError::Corrupted
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Every check must pass; the first failing field is reported.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=45).contains(&self.step_angle_deg) {
            return Err(ConfigError::ValidationFailed("step_angle_deg must be 1–45"));
        }
        if self.default_angles.iter().any(|a| !(0..360).contains(a)) {
            return Err(ConfigError::ValidationFailed("default_angles must be 0–359"));
        }
        let [a1, a2, a3] = self.default_angles;
        let distances = [
            angular_distance(a1, a2),
            angular_distance(a2, a3),
            angular_distance(a3, a1),
        ];
        if distances.iter().map(|d| i32::from(*d)).sum::<i32>() != 360
            || distances.iter().any(|d| *d < self.step_angle_deg)
        {
            return Err(ConfigError::ValidationFailed(
                "default_angles must be ordered and at least one step apart",
            ));
        }
        if self.default_percentages.iter().any(|p| *p > 95) {
            return Err(ConfigError::ValidationFailed(
                "default_percentages must be 0–95",
            ));
        }
        if BottleRack::from_slots(self.default_bottles).is_err() {
            return Err(ConfigError::ValidationFailed(
                "default_bottles may hold sparkling in one slot only",
            ));
        }
        let (lo, hi) = CYCLE_LIMIT_MS;
        if self.cycle_min_ms < lo || self.cycle_max_ms > hi || self.cycle_min_ms >= self.cycle_max_ms
        {
            return Err(ConfigError::ValidationFailed(
                "cycle bounds must satisfy 100 <= min < max <= 5000",
            ));
        }
        if !(self.cycle_min_ms..=self.cycle_max_ms).contains(&self.default_cycle_ms) {
            return Err(ConfigError::ValidationFailed(
                "default_cycle_ms must lie within the cycle bounds",
            ));
        }
        if self.reset_pause_ms > 10_000 {
            return Err(ConfigError::ValidationFailed("reset_pause_ms must be <= 10000"));
        }
        if self.settle_ms > 2_000 {
            return Err(ConfigError::ValidationFailed("settle_ms must be <= 2000"));
        }
        if self.flow_ml_per_min == 0 {
            return Err(ConfigError::ValidationFailed("flow_ml_per_min must be > 0"));
        }
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Settings (persisted user choices)
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub cycle_ms: u32,
    pub remote_access: bool,
    pub profile: ProfileName,
    pub led_idle: LedMode,
    pub led_dispensing: LedMode,
    pub encoder_direction: EncoderDirection,
    pub screensaver: ScreensaverTimeout,
    pub bottles: BottleRack,
}

impl Default for Settings {
    fn default() -> Self {
        Self::defaults_for(&DeviceConfig::default(), DEFAULT_PROFILE)
    }
}

impl Settings {
    /// Factory settings for a given profile.
    pub fn defaults_for(config: &DeviceConfig, profile: &str) -> Self {
        Self {
            cycle_ms: config.default_cycle_ms,
            remote_access: false,
            profile: label(profile),
            led_idle: LedMode::FadeSlow,
            led_dispensing: LedMode::BlinkFast,
            encoder_direction: EncoderDirection::Normal,
            screensaver: config.default_screensaver,
            bottles: BottleRack::from_slots(config.default_bottles).unwrap_or_default(),
        }
    }

    /// Pull stored values back inside the profile's bounds.
    /// Returns `true` if anything had to change.
    pub fn sanitize(&mut self, config: &DeviceConfig) -> bool {
        let mut changed = false;
        if !(config.cycle_min_ms..=config.cycle_max_ms).contains(&self.cycle_ms) {
            log::warn!(
                "settings: cycle {} ms outside {}..={}, using {}",
                self.cycle_ms,
                config.cycle_min_ms,
                config.cycle_max_ms,
                config.default_cycle_ms
            );
            self.cycle_ms = config.default_cycle_ms;
            changed = true;
        }
        if BottleRack::from_slots(self.bottles.slots()).is_err() {
            self.bottles = BottleRack::from_slots(config.default_bottles).unwrap_or_default();
            changed = true;
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let c = DeviceConfig::default();
        assert!(c.validate().is_ok());
        assert_eq!(c.kind(), DeviceKind::Mixer);
        assert_eq!(c.default_cycle_ms, 500);
    }

    #[test]
    fn validation_checks_every_field() {
        // A single bad field must fail even when every other field is fine.
        let cases = [
            DeviceConfig {
                step_angle_deg: 0,
                ..Default::default()
            },
            DeviceConfig {
                default_angles: [0, 120, 360],
                ..Default::default()
            },
            DeviceConfig {
                default_percentages: [0, 96, 0],
                ..Default::default()
            },
            DeviceConfig {
                default_bottles: [Bottle::Sparkling, Bottle::Sparkling, Bottle::RedWine],
                ..Default::default()
            },
            DeviceConfig {
                default_cycle_ms: 1500,
                ..Default::default()
            },
            DeviceConfig {
                flow_ml_per_min: 0,
                ..Default::default()
            },
        ];
        for cfg in cases {
            assert!(
                matches!(cfg.validate(), Err(ConfigError::ValidationFailed(_))),
                "expected rejection for {:?}",
                cfg
            );
        }
    }

    #[test]
    fn angles_closer_than_one_step_are_rejected() {
        let cfg = DeviceConfig {
            default_angles: [0, 1, 240],
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn json_profile_fills_missing_fields() {
        let cfg = DeviceConfig::from_json(r#"{ "is_mixer": false, "mixer_name": "WineBar" }"#)
            .unwrap();
        assert_eq!(cfg.kind(), DeviceKind::Pour);
        assert_eq!(cfg.mixer_name.as_str(), "WineBar");
        assert_eq!(cfg.default_angles, [0, 120, 240]);
    }

    #[test]
    fn json_profile_with_long_name_is_corrupted() {
        let r = DeviceConfig::from_json(r#"{ "mixer_name": "A name far too long for the field" }"#);
        assert!(matches!(r, Err(ConfigError::Corrupted)));
    }

    #[test]
    fn serde_roundtrip() {
        let c = DeviceConfig::default();
        let json = serde_json::to_string(&c).unwrap();
        let c2: DeviceConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(c, c2);
    }

    #[test]
    fn settings_postcard_roundtrip() {
        let s = Settings::default();
        let bytes = postcard::to_allocvec(&s).unwrap();
        let s2: Settings = postcard::from_bytes(&bytes).unwrap();
        assert_eq!(s, s2);
    }

    #[test]
    fn sanitize_pulls_cycle_back_into_bounds() {
        let cfg = DeviceConfig::default();
        let mut s = Settings {
            cycle_ms: 40,
            ..Settings::default()
        };
        assert!(s.sanitize(&cfg));
        assert_eq!(s.cycle_ms, 500);
        assert!(!s.sanitize(&cfg));
    }

    #[test]
    fn cyclic_step_wraps_both_ways() {
        assert_eq!(LedMode::FadeFast.step(1), LedMode::Off);
        assert_eq!(LedMode::Off.step(-3), LedMode::FadeFast);
        assert_eq!(ScreensaverTimeout::Sec2.step(5), ScreensaverTimeout::Sec15);
        assert_eq!(EncoderDirection::Normal.step(-1), EncoderDirection::Inverted);
    }

    #[test]
    fn setting_cursor_skips_bottles_on_mixer() {
        assert_eq!(
            SettingItem::Screensaver.next(DeviceKind::Mixer),
            SettingItem::CycleTime
        );
        assert_eq!(
            SettingItem::Screensaver.next(DeviceKind::Pour),
            SettingItem::Bottle1
        );
        assert_eq!(SettingItem::Bottle3.next(DeviceKind::Pour), SettingItem::CycleTime);
    }
}
