//! JSON inputs read by the commands.

use std::path::Path;

use anyhow::{Context, Result};
use metrica_formula::IndicatorDefinition;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Read and deserialize a JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parsing {}", path.display()))
}

/// Write `value` as pretty JSON, creating parent directories.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))
}

/// An indicator definition with an optional catalog id.
#[derive(Debug, Clone, Deserialize)]
pub struct IndicatorEntry {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(flatten)]
    pub definition: IndicatorDefinition,
}

/// Read indicator definitions; entries without an id are numbered from 1
/// by position.
pub fn read_indicators(path: &Path) -> Result<Vec<(i64, IndicatorDefinition)>> {
    let entries: Vec<IndicatorEntry> = read_json(path)?;
    Ok(entries
        .into_iter()
        .zip(1..)
        .map(|(entry, position)| (entry.id.unwrap_or(position), entry.definition))
        .collect())
}
