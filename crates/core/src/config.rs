//! User configuration model and persistence contract.
//!
//! The host owns persistence; the core defines the document shape and a
//! [`ConfigStore`] trait it loads/saves through. Every field carries a
//! serde default so documents written by older versions (which lacked
//! per-district and scope fields) still deserialize.

use serde::{Deserialize, Serialize};

use crate::format::OutputFormat;

/// Mist.
pub const DISTRICT_MIST: u16 = 339;
/// The Lavender Beds.
pub const DISTRICT_LAVENDER_BEDS: u16 = 340;
/// The Goblet.
pub const DISTRICT_GOBLET: u16 = 341;
/// Shirogane.
pub const DISTRICT_SHIROGANE: u16 = 641;
/// Empyreum.
pub const DISTRICT_EMPYREUM: u16 = 979;

/// Which worlds' events the user wants to hear about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyScope {
    /// Only the player's home world.
    #[default]
    Homeworld,
    /// Any world on the player's datacenter.
    Datacenter,
    /// Every world.
    All,
}

/// Per-district notification toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistrictFilter {
    pub small: bool,
    pub medium: bool,
    pub large: bool,
    pub free_company: bool,
    pub individual: bool,
}

impl Default for DistrictFilter {
    fn default() -> Self {
        Self {
            small: true,
            medium: true,
            large: true,
            free_company: true,
            individual: true,
        }
    }
}

/// The recognized filter options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    /// Master switch for the whole pipeline.
    pub enabled: bool,

    pub mist: DistrictFilter,
    pub lavender_beds: DistrictFilter,
    pub goblet: DistrictFilter,
    pub shirogane: DistrictFilter,
    pub empyreum: DistrictFilter,

    pub scope: NotifyScope,

    pub output_format: OutputFormat,
    /// Template used when `output_format` is [`OutputFormat::Custom`].
    pub custom_template: String,

    /// Chat channel tag the host routes notifications to. Empty means
    /// the host's default channel.
    pub chat_channel: String,

    /// Whether per-sweep "began"/"completed" lines are emitted.
    pub announce_sweep_progress: bool,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mist: DistrictFilter::default(),
            lavender_beds: DistrictFilter::default(),
            goblet: DistrictFilter::default(),
            shirogane: DistrictFilter::default(),
            empyreum: DistrictFilter::default(),
            scope: NotifyScope::default(),
            output_format: OutputFormat::default(),
            custom_template: String::new(),
            chat_channel: String::new(),
            announce_sweep_progress: true,
        }
    }
}

impl UserConfig {
    /// The per-district toggles for a district id, or `None` for a
    /// district the filter does not recognize.
    pub fn district_filter(&self, district_id: u16) -> Option<&DistrictFilter> {
        match district_id {
            DISTRICT_MIST => Some(&self.mist),
            DISTRICT_LAVENDER_BEDS => Some(&self.lavender_beds),
            DISTRICT_GOBLET => Some(&self.goblet),
            DISTRICT_SHIROGANE => Some(&self.shirogane),
            DISTRICT_EMPYREUM => Some(&self.empyreum),
            _ => None,
        }
    }
}

/// Failures loading or saving the config document.
///
/// The core never acts on these; they are surfaced to the host.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(String),

    #[error("failed to write config: {0}")]
    Write(String),

    #[error("malformed config document: {0}")]
    Malformed(String),
}

/// Host-provided persistence for [`UserConfig`].
pub trait ConfigStore: Send + Sync {
    fn load(&self) -> Result<UserConfig, ConfigError>;
    fn save(&self, config: &UserConfig) -> Result<(), ConfigError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_permissive_homeworld_simple() {
        let config = UserConfig::default();
        assert!(config.enabled);
        assert_eq!(config.scope, NotifyScope::Homeworld);
        assert_eq!(config.output_format, OutputFormat::Simple);
        assert!(config.mist.small && config.mist.medium && config.mist.large);
        assert!(config.announce_sweep_progress);
    }

    #[test]
    fn old_documents_without_new_fields_still_load() {
        // A document from before per-district and scope options existed.
        let json = r#"{"enabled": false, "output_format": "pings"}"#;
        let config: UserConfig = serde_json::from_str(json).unwrap();

        assert!(!config.enabled);
        assert_eq!(config.output_format, OutputFormat::Pings);
        assert_eq!(config.scope, NotifyScope::Homeworld);
        assert_eq!(config.shirogane, DistrictFilter::default());
        assert_eq!(config.custom_template, "");
    }

    #[test]
    fn partial_district_block_fills_defaults() {
        let json = r#"{"goblet": {"small": false}}"#;
        let config: UserConfig = serde_json::from_str(json).unwrap();
        assert!(!config.goblet.small);
        assert!(config.goblet.medium);
        assert!(config.goblet.free_company);
    }

    #[test]
    fn round_trips_through_json() {
        let mut config = UserConfig::default();
        config.scope = NotifyScope::Datacenter;
        config.empyreum.large = false;
        config.custom_template = "{districtName} {wardNum}".to_string();

        let json = serde_json::to_string(&config).unwrap();
        let back: UserConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn district_filter_lookup() {
        let config = UserConfig::default();
        assert!(config.district_filter(DISTRICT_MIST).is_some());
        assert!(config.district_filter(DISTRICT_EMPYREUM).is_some());
        assert!(config.district_filter(123).is_none());
    }

    /// In-memory store double standing in for the host's persistence.
    #[derive(Default)]
    struct MemoryConfigStore(std::sync::Mutex<Option<String>>);

    impl ConfigStore for MemoryConfigStore {
        fn load(&self) -> Result<UserConfig, ConfigError> {
            match self.0.lock().unwrap().as_ref() {
                Some(doc) => {
                    serde_json::from_str(doc).map_err(|e| ConfigError::Malformed(e.to_string()))
                }
                None => Ok(UserConfig::default()),
            }
        }

        fn save(&self, config: &UserConfig) -> Result<(), ConfigError> {
            let doc =
                serde_json::to_string(config).map_err(|e| ConfigError::Write(e.to_string()))?;
            *self.0.lock().unwrap() = Some(doc);
            Ok(())
        }
    }

    #[test]
    fn store_round_trips_and_defaults_when_empty() {
        let store = MemoryConfigStore::default();
        assert_eq!(store.load().unwrap(), UserConfig::default());

        let mut config = UserConfig::default();
        config.scope = NotifyScope::All;
        config.chat_channel = "shout".to_string();
        store.save(&config).unwrap();
        assert_eq!(store.load().unwrap(), config);
    }
}
