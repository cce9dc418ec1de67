//! Field-level editing and client-side validation helpers.
//!
//! # Design
//! - Editing goes through the wire representation so the section types stay
//!   the single source of truth for field names and value shapes.
//! - Validation is advisory; the server stays the authority on what is stored.

use serde_json::{Map, Value};
use url::Url;

use crate::error::{ConfigError, ConfigResult};
use crate::model::Configuration;

/// Editable fields per section, using wire names.
pub const SECTION_FIELDS: &[(&str, &[&str])] = &[
    (
        "Logs",
        &["Folder", "MaxFilesNumber", "MaxFilesSize", "MaxAgeDays"],
    ),
    (
        "Updates",
        &[
            "Frequency",
            "DownloadAuto",
            "UpdateChannel",
            "UpdateUrl",
            "UpdatePublicKey",
        ],
    ),
    ("Debugging", &["ShowPanels"]),
    ("Service", &["AutoStart"]),
];

impl Configuration {
    /// Set a single field addressed as `Section.Field` (case-insensitive).
    ///
    /// `raw` is read as JSON when it parses (`5`, `true`, `null`) and as a
    /// plain string otherwise. `null` clears the field.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownField`] for unknown names and
    /// [`ConfigError::InvalidField`] when the value does not fit the field.
    pub fn assign(&mut self, key: &str, raw: &str) -> ConfigResult<()> {
        let (section, field) = resolve_key(key)?;

        let parsed = serde_json::from_str::<Value>(raw).ok();
        let mut candidates = Vec::with_capacity(2);
        if let Some(value) = parsed.filter(|value| !value.is_string()) {
            candidates.push(value);
        }
        candidates.push(Value::String(raw.to_string()));

        for candidate in candidates {
            if let Ok(updated) = self.with_field(section, field, candidate) {
                self.replace_sections(updated);
                return Ok(());
            }
        }

        Err(ConfigError::InvalidField {
            section: section.to_string(),
            field: field.to_string(),
            reason: "value does not fit the field type",
        })
    }

    /// Check the invariants the client can verify locally.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] for the first violation found.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.logs.max_files_number.is_some_and(|count| count < 1) {
            return Err(invalid("Logs", "MaxFilesNumber", "must be at least 1"));
        }
        if self.logs.max_files_size.is_some_and(|size| size < 1) {
            return Err(invalid("Logs", "MaxFilesSize", "must be positive"));
        }
        if let Some(url) = self.updates.update_url.as_deref().filter(|url| !url.is_empty()) {
            if Url::parse(url).is_err() {
                return Err(invalid("Updates", "UpdateUrl", "must be an absolute URL"));
            }
        }
        Ok(())
    }

    fn with_field(
        &self,
        section: &str,
        field: &str,
        value: Value,
    ) -> Result<Self, serde_json::Error> {
        let mut document = self.to_value()?;
        if let Value::Object(root) = &mut document {
            let entry = root
                .entry(section.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            if let Value::Object(fields) = entry {
                fields.insert(field.to_string(), value);
            }
        }
        Self::from_response(document)
    }
}

fn resolve_key(key: &str) -> ConfigResult<(&'static str, &'static str)> {
    let (section, field) = key.split_once('.').ok_or_else(|| ConfigError::InvalidField {
        section: key.to_string(),
        field: String::new(),
        reason: "expected Section.Field",
    })?;

    let &(section_name, fields) = SECTION_FIELDS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(section.trim()))
        .ok_or_else(|| ConfigError::UnknownField {
            section: section.to_string(),
            field: field.to_string(),
        })?;

    let field_name = fields
        .iter()
        .find(|name| name.eq_ignore_ascii_case(field.trim()))
        .copied()
        .ok_or_else(|| ConfigError::UnknownField {
            section: section_name.to_string(),
            field: field.to_string(),
        })?;

    Ok((section_name, field_name))
}

fn invalid(section: &str, field: &str, reason: &'static str) -> ConfigError {
    ConfigError::InvalidField {
        section: section.to_string(),
        field: field.to_string(),
        reason,
    }
}
