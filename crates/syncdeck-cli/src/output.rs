//! Output renderers and formatting helpers for CLI commands.

use anyhow::anyhow;
use serde_json::Value;
use syncdeck_config::{Configuration, SECTION_FIELDS};

use crate::cli::OutputFormat;
use crate::client::{CliError, CliResult};

pub(crate) fn render_configuration(config: &Configuration, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => {
            let text = serde_json::to_string_pretty(config)
                .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
            println!("{text}");
        }
        OutputFormat::Table => {
            for line in configuration_rows(config)? {
                println!("{line}");
            }
        }
    }
    Ok(())
}

/// One `Section.Field  value` line per known field, in wire order, followed
/// by any keys the service sent that have no typed field.
pub(crate) fn configuration_rows(config: &Configuration) -> CliResult<Vec<String>> {
    let document = config
        .to_value()
        .map_err(|err| CliError::failure(anyhow!("failed to encode configuration: {err}")))?;

    let width = SECTION_FIELDS
        .iter()
        .flat_map(|(section, fields)| fields.iter().map(move |field| section.len() + field.len() + 1))
        .max()
        .unwrap_or(0);

    let mut rows = Vec::new();
    for (section, fields) in SECTION_FIELDS {
        for field in *fields {
            let key = format!("{section}.{field}");
            let value = document
                .get(section)
                .and_then(|entries| entries.get(field))
                .map_or_else(|| "<unset>".to_string(), format_value);
            rows.push(format!("{key:<width$}  {value}"));
        }
        if let Some(Value::Object(entries)) = document.get(section) {
            for (field, value) in entries {
                if !fields.contains(&field.as_str()) {
                    let key = format!("{section}.{field}");
                    rows.push(format!("{key:<width$}  {}", format_value(value)));
                }
            }
        }
    }
    for (key, value) in &config.extra {
        rows.push(format!("{key:<width$}  {}", format_value(value)));
    }
    Ok(rows)
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(text) if text.is_empty() => "\"\"".to_string(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
