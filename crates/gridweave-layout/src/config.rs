#![forbid(unsafe_code)]

//! Engine configuration.
//!
//! [`EngineConfig`] collects the grid dimensions used for breakpoint
//! thresholds and the ceilings that bound every placement algorithm.
//! Missing fields fall back to defaults, so a partial JSON or TOML document
//! is valid input.
//!
//! # Usage
//!
//! ```
//! use gridweave_layout::config::EngineConfig;
//!
//! let config = EngineConfig::from_json_str(r#"{ "max_columns": 6, "gap": 8 }"#).unwrap();
//! assert_eq!(config.max_columns, 6);
//! assert_eq!(config.gap, 8);
//! assert_eq!(config.max_push_depth, 50);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, Result};

/// Push-down recursion ceiling. Exceeding it stops displacement.
pub const DEFAULT_MAX_PUSH_DEPTH: u16 = 50;

/// Per-item ceiling on upward compaction steps.
pub const DEFAULT_MAX_COMPACTION_STEPS: u16 = 100;

/// Rows scanned by first-fit placement before forcing a placement.
pub const DEFAULT_MAX_SCAN_ROWS: u16 = 100;

pub const DEFAULT_MAX_COLUMNS: u16 = 12;
pub const DEFAULT_CELL_SIZE: u32 = 80;
pub const DEFAULT_GAP: u32 = 16;

/// Ceilings shared by the push, reflow, and derivation algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementLimits {
    pub max_push_depth: u16,
    pub max_compaction_steps: u16,
    pub max_scan_rows: u16,
}

impl Default for PlacementLimits {
    fn default() -> Self {
        Self {
            max_push_depth: DEFAULT_MAX_PUSH_DEPTH,
            max_compaction_steps: DEFAULT_MAX_COMPACTION_STEPS,
            max_scan_rows: DEFAULT_MAX_SCAN_ROWS,
        }
    }
}

/// Grid engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Column count of the canonical arrangement.
    pub max_columns: u16,
    /// Cell edge length in pixels, for breakpoint thresholds.
    pub cell_size: u32,
    /// Gap between cells in pixels.
    pub gap: u32,
    pub max_push_depth: u16,
    pub max_compaction_steps: u16,
    pub max_scan_rows: u16,
    /// Run the compaction pass after push-down.
    pub compact_on_push: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let limits = PlacementLimits::default();
        Self {
            max_columns: DEFAULT_MAX_COLUMNS,
            cell_size: DEFAULT_CELL_SIZE,
            gap: DEFAULT_GAP,
            max_push_depth: limits.max_push_depth,
            max_compaction_steps: limits.max_compaction_steps,
            max_scan_rows: limits.max_scan_rows,
            compact_on_push: true,
        }
    }
}

impl EngineConfig {
    /// Set the canonical column count (builder pattern).
    #[must_use]
    pub fn with_max_columns(mut self, max_columns: u16) -> Self {
        self.max_columns = max_columns;
        self
    }

    /// Set cell size and gap in pixels (builder pattern).
    #[must_use]
    pub fn with_cell_metrics(mut self, cell_size: u32, gap: u32) -> Self {
        self.cell_size = cell_size;
        self.gap = gap;
        self
    }

    /// Enable or disable compaction after push-down (builder pattern).
    #[must_use]
    pub fn with_compaction(mut self, compact: bool) -> Self {
        self.compact_on_push = compact;
        self
    }

    /// Override the algorithm ceilings (builder pattern).
    #[must_use]
    pub fn with_limits(mut self, limits: PlacementLimits) -> Self {
        self.max_push_depth = limits.max_push_depth;
        self.max_compaction_steps = limits.max_compaction_steps;
        self.max_scan_rows = limits.max_scan_rows;
        self
    }

    #[must_use]
    pub const fn limits(&self) -> PlacementLimits {
        PlacementLimits {
            max_push_depth: self.max_push_depth,
            max_compaction_steps: self.max_compaction_steps,
            max_scan_rows: self.max_scan_rows,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |message: &str| -> Result<()> {
            Err(LayoutError::InvalidConfig {
                message: message.to_string(),
            })
        };
        if self.max_columns == 0 {
            return invalid("max_columns must be at least 1");
        }
        if self.cell_size == 0 {
            return invalid("cell_size must be at least 1");
        }
        let widest = u64::from(self.max_columns) * (u64::from(self.cell_size) + u64::from(self.gap));
        if widest > u64::from(u32::MAX) {
            return invalid("max_columns * (cell_size + gap) must fit in a u32 pixel width");
        }
        if self.max_push_depth == 0 {
            return invalid("max_push_depth must be at least 1");
        }
        if self.max_scan_rows == 0 {
            return invalid("max_scan_rows must be at least 1");
        }
        Ok(())
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(input: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a TOML document.
    #[cfg(feature = "policy-config")]
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }
}
