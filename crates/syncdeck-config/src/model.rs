//! Typed configuration model exchanged with the `/config` endpoint.
//!
//! # Design
//! - Every field is optional so a section can be empty after a wholesale
//!   replace; baselines only apply when a value is first seeded.
//! - Wire names are `PascalCase`; empty fields are omitted on the wire.
//! - Keys this client does not model are kept in `extra` and sent back
//!   unchanged, at the top level and inside every section.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Canonical settings value with its four sections.
///
/// [`Default`] yields the baseline of every section. Deserializing a server
/// response instead leaves missing or `null` sections empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Configuration {
    /// Log file rotation settings.
    #[serde(default, deserialize_with = "nullable_section")]
    pub logs: Logs,
    /// Self-update policy.
    #[serde(default, deserialize_with = "nullable_section")]
    pub updates: Updates,
    /// Developer-facing toggles.
    #[serde(default, deserialize_with = "nullable_section")]
    pub debugging: Debugging,
    /// Background service settings.
    #[serde(default, deserialize_with = "nullable_section")]
    pub service: Service,
    /// Top-level entries without a typed section.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            logs: Logs::baseline(),
            updates: Updates::baseline(),
            debugging: Debugging::baseline(),
            service: Service::baseline(),
            extra: Map::new(),
        }
    }
}

impl Configuration {
    /// Build a configuration from partial data, filling every absent or `null`
    /// section with its baseline. Present sections are taken verbatim.
    ///
    /// # Errors
    ///
    /// Returns an error when `seed` is neither `null` nor an object, or when a
    /// present section does not fit its shape.
    pub fn from_seed(seed: &Value) -> Result<Self, serde_json::Error> {
        if seed.is_null() {
            return Ok(Self::default());
        }
        let seed = SeedConfiguration::deserialize(seed)?;
        Ok(Self {
            logs: seed.logs.unwrap_or_else(Logs::baseline),
            updates: seed.updates.unwrap_or_else(Updates::baseline),
            debugging: seed.debugging.unwrap_or_else(Debugging::baseline),
            service: seed.service.unwrap_or_else(Service::baseline),
            extra: seed.extra,
        })
    }

    /// Parse a server response. Missing or `null` sections become empty.
    ///
    /// # Errors
    ///
    /// Returns an error when the body is not an object or a section does not
    /// fit its shape.
    pub fn from_response(body: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(body)
    }

    /// Serialize into the wire representation.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Overwrite every section with the ones from `next`.
    pub fn replace_sections(&mut self, next: Self) {
        self.logs = next.logs;
        self.updates = next.updates;
        self.debugging = next.debugging;
        self.service = next.service;
        self.extra = next.extra;
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SeedConfiguration {
    #[serde(default)]
    logs: Option<Logs>,
    #[serde(default)]
    updates: Option<Updates>,
    #[serde(default)]
    debugging: Option<Debugging>,
    #[serde(default)]
    service: Option<Service>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

fn nullable_section<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Log rotation settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Logs {
    /// Directory receiving log files; empty means the platform default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    /// Number of rotated files kept on disk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_files_number: Option<i64>,
    /// Size cap of a single log file, in megabytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_files_size: Option<i64>,
    /// Age after which rotated files are deleted; negative keeps them
    /// forever.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_age_days: Option<i64>,
    /// Fields without a typed counterpart.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Logs {
    /// Fixed client-side default.
    #[must_use]
    pub fn baseline() -> Self {
        Self {
            folder: Some(String::new()),
            max_files_number: Some(1),
            max_files_size: Some(30),
            max_age_days: Some(30),
            extra: Map::new(),
        }
    }
}

/// Self-update settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Updates {
    /// When the client checks for new releases.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<UpdateFrequency>,
    /// Download new releases without asking.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_auto: Option<bool>,
    /// Release channel name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_channel: Option<String>,
    /// Update server override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_url: Option<String>,
    /// Public key used to verify downloaded releases.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_public_key: Option<String>,
    /// Fields without a typed counterpart.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Updates {
    /// Fixed client-side default.
    #[must_use]
    pub fn baseline() -> Self {
        Self {
            frequency: Some(UpdateFrequency::Restart),
            download_auto: Some(true),
            update_channel: Some(String::new()),
            update_url: Some(String::new()),
            update_public_key: Some(String::new()),
            extra: Map::new(),
        }
    }
}

/// Update check policy. Unrecognised values are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UpdateFrequency {
    /// Check on every start.
    Restart,
    /// Check once a day.
    Daily,
    /// Check once a week.
    Weekly,
    /// Check once a month.
    Monthly,
    /// Never check automatically.
    Manual,
    /// Value this client does not know about.
    Other(String),
}

impl UpdateFrequency {
    /// Wire representation of the policy.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Restart => "restart",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Manual => "manual",
            Self::Other(value) => value.as_str(),
        }
    }
}

impl From<String> for UpdateFrequency {
    fn from(value: String) -> Self {
        match value.as_str() {
            "restart" => Self::Restart,
            "daily" => Self::Daily,
            "weekly" => Self::Weekly,
            "monthly" => Self::Monthly,
            "manual" => Self::Manual,
            _ => Self::Other(value),
        }
    }
}

impl From<UpdateFrequency> for String {
    fn from(value: UpdateFrequency) -> Self {
        match value {
            UpdateFrequency::Other(value) => value,
            known => known.as_str().to_string(),
        }
    }
}

impl Display for UpdateFrequency {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Developer toggles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Debugging {
    /// Show internal diagnostic panels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_panels: Option<bool>,
    /// Fields without a typed counterpart.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Debugging {
    /// Fixed client-side default.
    #[must_use]
    pub fn baseline() -> Self {
        Self {
            show_panels: Some(false),
            extra: Map::new(),
        }
    }
}

/// Background service settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Service {
    /// Start the sync service when the session opens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_start: Option<bool>,
    /// Fields without a typed counterpart.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Service {
    /// Fixed client-side default.
    #[must_use]
    pub fn baseline() -> Self {
        Self {
            auto_start: Some(false),
            extra: Map::new(),
        }
    }
}
