/// Extension-wide settings record, stored under `settings`

use serde::{Deserialize, Serialize};

/// Which dashboard features are switched on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnabledFeatures {
    pub home: bool,
    pub snippets: bool,
    pub tasks: bool,
    pub resources: bool,
    pub focus: bool,
}

impl Default for EnabledFeatures {
    fn default() -> Self {
        EnabledFeatures {
            home: true,
            snippets: true,
            tasks: true,
            resources: true,
            focus: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Settings shared by the dashboard and both enforcement points.
///
/// Callers load this once per evaluation and pass it down explicitly; there
/// is no process-wide copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub enabled_features: EnabledFeatures,
    pub theme: Theme,
    pub notifications: bool,
    pub auto_start_breaks: bool,
    pub auto_start_pomodoros: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            enabled_features: EnabledFeatures::default(),
            theme: Theme::Light,
            notifications: true,
            auto_start_breaks: false,
            auto_start_pomodoros: false,
        }
    }
}

impl Settings {
    pub fn focus_enabled(&self) -> bool {
        self.enabled_features.focus
    }

    pub fn with_focus(mut self, enabled: bool) -> Self {
        self.enabled_features.focus = enabled;
        self
    }
}
