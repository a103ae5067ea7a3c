use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::monitor::LogPolicy;

const DEFAULT_PORT_POLL_INTERVAL_MS: u64 = 500;

/// User settings, kept in the eframe app storage.
///
/// Message history is deliberately not part of it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub client_name: String,
    pub log_policy: LogPolicy,
    pub port_poll_interval_ms: u64,
    pub follows_cursor: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            client_name: crate::APP_NAME.to_string(),
            log_policy: LogPolicy::default(),
            port_poll_interval_ms: DEFAULT_PORT_POLL_INTERVAL_MS,
            follows_cursor: true,
        }
    }
}

impl Settings {
    pub fn load(storage: Option<&dyn eframe::Storage>) -> Self {
        match storage.and_then(|storage| eframe::get_value::<Settings>(storage, eframe::APP_KEY)) {
            Some(settings) => {
                log::debug!("Loaded {:?}", settings);
                settings
            }
            None => Self::default(),
        }
    }

    pub fn save(&self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, eframe::APP_KEY, self);
    }

    pub fn port_poll_interval(&self) -> Duration {
        // A zero interval would spin the port watcher
        Duration::from_millis(self.port_poll_interval_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let settings = Settings::default();
        assert_eq!(settings.client_name, "MIDI Monitor");
        assert_eq!(settings.log_policy, LogPolicy::Accumulate);
        assert_eq!(settings.port_poll_interval(), Duration::from_millis(500));
        assert!(settings.follows_cursor);
    }

    #[test]
    fn zero_interval_is_clamped() {
        let settings = Settings {
            port_poll_interval_ms: 0,
            ..Default::default()
        };
        assert_eq!(settings.port_poll_interval(), Duration::from_millis(1));
    }

    #[test]
    fn missing_storage_falls_back_to_defaults() {
        assert_eq!(Settings::load(None), Settings::default());
    }
}
