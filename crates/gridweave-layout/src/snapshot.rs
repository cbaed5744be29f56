#![forbid(unsafe_code)]

//! Versioned, serializable form of a [`LayoutModel`].
//!
//! A snapshot carries the three tables an embedder needs to persist: item
//! sizes, the canonical position table, and override position tables keyed by
//! column count. Subscribers are not part of the snapshot.
//!
//! Forward-compatible: unknown data can ride along in `extensions`.

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use gridweave_core::{PositionTable, SizeTable};
use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, Result};
use crate::model::LayoutModel;

/// Current layout snapshot schema version.
pub const LAYOUT_SNAPSHOT_SCHEMA_VERSION: u16 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutSnapshot {
    #[serde(default = "default_snapshot_version")]
    pub schema_version: u16,
    pub max_columns: u16,
    /// Column count in effect when the snapshot was taken.
    #[serde(default)]
    pub current_columns: Option<u16>,
    pub sizes: SizeTable,
    pub canonical: PositionTable,
    #[serde(default)]
    pub overrides: BTreeMap<u16, PositionTable>,
    #[serde(default)]
    pub extensions: BTreeMap<String, String>,
}

fn default_snapshot_version() -> u16 {
    LAYOUT_SNAPSHOT_SCHEMA_VERSION
}

impl LayoutSnapshot {
    /// Check the version and that every table agrees with the size table.
    pub fn validate(&self) -> Result<()> {
        if self.schema_version != LAYOUT_SNAPSHOT_SCHEMA_VERSION {
            return Err(LayoutError::UnsupportedSchemaVersion {
                found: self.schema_version,
                expected: LAYOUT_SNAPSHOT_SCHEMA_VERSION,
            });
        }
        let in_range = |columns: u16| columns >= 1 && columns <= self.max_columns;
        if self.max_columns == 0 {
            return Err(LayoutError::InvalidColumnCount {
                columns: 0,
                max_columns: 0,
            });
        }
        if let Some(current) = self.current_columns
            && !in_range(current)
        {
            return Err(LayoutError::InvalidColumnCount {
                columns: current,
                max_columns: self.max_columns,
            });
        }

        self.check_table(self.max_columns, &self.canonical)?;
        for (&columns, table) in &self.overrides {
            // max_columns always resolves to the canonical table.
            if !in_range(columns) || columns == self.max_columns {
                return Err(LayoutError::InvalidColumnCount {
                    columns,
                    max_columns: self.max_columns,
                });
            }
            self.check_table(columns, table)?;
        }
        Ok(())
    }

    fn check_table(&self, columns: u16, table: &PositionTable) -> Result<()> {
        if let Some(id) = table.keys().find(|id| !self.sizes.contains_key(*id)) {
            return Err(LayoutError::UnknownItem { id: id.clone() });
        }
        if let Some(id) = self.sizes.keys().find(|id| !table.contains_key(*id)) {
            return Err(LayoutError::MissingPosition {
                id: id.clone(),
                columns,
            });
        }
        Ok(())
    }

    /// Deterministic hash for state diagnostics.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        self.schema_version.hash(&mut hasher);
        self.max_columns.hash(&mut hasher);
        self.current_columns.hash(&mut hasher);
        self.sizes.hash(&mut hasher);
        self.canonical.hash(&mut hasher);
        self.overrides.hash(&mut hasher);
        for (k, v) in &self.extensions {
            k.hash(&mut hasher);
            v.hash(&mut hasher);
        }
        hasher.finish()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and validate.
    pub fn from_json(input: &str) -> Result<Self> {
        let snapshot: Self = serde_json::from_str(input)?;
        snapshot.validate()?;
        Ok(snapshot)
    }
}

impl LayoutModel {
    #[must_use]
    pub fn snapshot(&self) -> LayoutSnapshot {
        LayoutSnapshot {
            schema_version: LAYOUT_SNAPSHOT_SCHEMA_VERSION,
            max_columns: self.max_columns(),
            current_columns: Some(self.current_columns()),
            sizes: self.sizes().clone(),
            canonical: self.canonical().clone(),
            overrides: self.overrides().clone(),
            extensions: BTreeMap::new(),
        }
    }

    /// Rebuild a model from a validated snapshot. Subscribers start empty.
    pub fn from_snapshot(snapshot: LayoutSnapshot) -> Result<Self> {
        snapshot.validate()?;
        let current = snapshot.current_columns.unwrap_or(snapshot.max_columns);
        tracing::debug!(
            target: "gridweave.snapshot",
            max_columns = snapshot.max_columns,
            items = snapshot.sizes.len(),
            overrides = snapshot.overrides.len(),
            "layout model restored"
        );
        Ok(LayoutModel::from_tables(
            snapshot.max_columns,
            snapshot.sizes,
            snapshot.canonical,
            snapshot.overrides,
        )
        .with_current_columns(current))
    }
}
