#![forbid(unsafe_code)]

//! Breakpoint derivation: re-packing the canonical arrangement into fewer
//! columns, and describing each column count's layout for a renderer.
//!
//! A column count `n` becomes active once the container is at least
//! `n * cell_size + (n - 1) * gap` pixels wide. [`emit_layout_descriptions`]
//! produces one [`LayoutDescription`] per column count, widest first: an
//! unconditional canonical entry followed by width-bounded entries for every
//! narrower count. [`emit_css`] renders them as container-query rules of the
//! form `grid-column: column / span width; grid-row: row / span height`.
//!
//! # Invariants
//!
//! 1. Deriving at `max_columns` returns the canonical arrangement unchanged,
//!    regardless of earlier derivations at other counts.
//! 2. A saved override is returned verbatim.
//! 3. Derivation is pure: same canonical table and sizes, same output.
//! 4. Descriptions are in strictly descending column count and only the
//!    canonical entry is unbounded.
//!
//! # Failure Modes
//!
//! - Column count outside `1..=max_columns`:
//!   [`crate::error::LayoutError::InvalidColumnCount`].
//! - First-fit row ceiling reached: the item is force-placed at column 1 of
//!   the next free row (see [`crate::reflow::FirstFitPacker`]).

use std::fmt::Write as _;

use gridweave_core::{Arrangement, GridItem, ItemId, PositionTable, SizeTable};

use crate::error::Result;
use crate::model::LayoutModel;
use crate::reflow::pack_in_order;

/// Re-pack the canonical table into `columns` columns.
///
/// Items are taken in canonical reading order (id breaks ties) and placed
/// first-fit with widths clamped to `columns`.
#[must_use]
pub fn derive_arrangement(
    canonical: &PositionTable,
    sizes: &SizeTable,
    columns: u16,
    max_scan_rows: u16,
) -> Arrangement {
    let mut ordered: Vec<GridItem> = canonical
        .iter()
        .filter_map(|(id, cell)| {
            sizes
                .get(id)
                .map(|span| GridItem::new(id.clone(), *cell, *span))
        })
        .collect();
    // BTreeMap iteration is id-sorted; the stable sort keeps ids as tie-break.
    ordered.sort_by_key(|item| item.cell.reading_key());

    let outcome = pack_in_order(&ordered, columns, max_scan_rows);
    tracing::debug!(
        target: "gridweave.breakpoint",
        columns,
        items = ordered.len(),
        forced = outcome.forced.len(),
        "layout derived"
    );
    outcome.arrangement
}

/// Positions for `columns`: canonical, saved override, or derived.
pub fn derive_layout(model: &LayoutModel, columns: u16) -> Result<PositionTable> {
    model.derive_layout(columns)
}

/// Container width thresholds for each column count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakpointLadder {
    max_columns: u16,
    cell_size: u32,
    gap: u32,
}

/// One column count and the minimum container width at which it applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Breakpoint {
    pub columns: u16,
    pub min_width: u32,
}

impl BreakpointLadder {
    #[must_use]
    pub const fn new(max_columns: u16, cell_size: u32, gap: u32) -> Self {
        Self {
            max_columns,
            cell_size,
            gap,
        }
    }

    #[must_use]
    pub const fn max_columns(&self) -> u16 {
        self.max_columns
    }

    /// `columns * cell_size + (columns - 1) * gap`, saturating at `u32::MAX`.
    #[must_use]
    pub const fn min_width(&self, columns: u16) -> u32 {
        let n = columns as u32;
        n.saturating_mul(self.cell_size)
            .saturating_add(n.saturating_sub(1).saturating_mul(self.gap))
    }

    /// Column count active at container `width`: the largest count whose
    /// minimum width fits, never less than 1.
    #[must_use]
    pub fn columns_for_width(&self, width: u32) -> u16 {
        (1..=self.max_columns)
            .rev()
            .find(|&n| self.min_width(n) <= width)
            .unwrap_or(1)
    }

    /// Every column count with its threshold, widest first.
    #[must_use]
    pub fn breakpoints(&self) -> Vec<Breakpoint> {
        (1..=self.max_columns)
            .rev()
            .map(|columns| Breakpoint {
                columns,
                min_width: self.min_width(columns),
            })
            .collect()
    }

    /// Whether resizing the container from `old_width` to `new_width` changes
    /// the column count. Returns `Some((old, new))` on a transition.
    #[must_use]
    pub fn detect_transition(&self, old_width: u32, new_width: u32) -> Option<(u16, u16)> {
        let old = self.columns_for_width(old_width);
        let new = self.columns_for_width(new_width);
        (old != new).then_some((old, new))
    }
}

/// One column count's layout plus the container widths it applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutDescription {
    pub columns: u16,
    /// `None` for the unconditional canonical entry.
    pub min_width: Option<u32>,
    /// Inclusive upper bound. `None` for the canonical entry.
    pub max_width: Option<u32>,
    pub arrangement: Arrangement,
}

impl LayoutDescription {
    #[must_use]
    pub fn is_canonical(&self) -> bool {
        self.min_width.is_none() && self.max_width.is_none()
    }

    /// Placement rules for this description, wrapped in a container query
    /// unless canonical.
    #[must_use]
    pub fn css_rules(&self, selector: impl Fn(&ItemId) -> String) -> String {
        let mut out = String::new();
        let indent = if self.max_width.is_some() { "  " } else { "" };
        if let Some(max_width) = self.max_width {
            let _ = writeln!(out, "@container (max-width: {max_width}px) {{");
        }
        for item in &self.arrangement {
            let _ = writeln!(
                out,
                "{indent}{} {{ grid-column: {} / span {}; grid-row: {} / span {}; }}",
                selector(&item.id),
                item.cell.column,
                item.span.width(),
                item.cell.row,
                item.span.height(),
            );
        }
        if self.max_width.is_some() {
            out.push_str("}\n");
        }
        out
    }
}

/// Attribute selector for an item: `[data-grid-item="id"]`.
#[must_use]
pub fn default_item_selector(id: &ItemId) -> String {
    format!("[data-grid-item=\"{id}\"]")
}

/// One description per column count, widest first.
///
/// The first entry is the canonical arrangement with no width bounds. Each
/// following entry for `n` columns applies from `min_width(n)` up to one
/// pixel below `min_width(n + 1)`.
#[must_use]
pub fn emit_layout_descriptions(
    model: &LayoutModel,
    cell_size: u32,
    gap: u32,
) -> Vec<LayoutDescription> {
    let max_columns = model.max_columns();
    let ladder = BreakpointLadder::new(max_columns, cell_size, gap);

    let mut descriptions = Vec::with_capacity(usize::from(max_columns));
    descriptions.push(LayoutDescription {
        columns: max_columns,
        min_width: None,
        max_width: None,
        arrangement: model.materialize(max_columns),
    });
    for columns in (1..max_columns).rev() {
        descriptions.push(LayoutDescription {
            columns,
            min_width: Some(ladder.min_width(columns)),
            max_width: Some(ladder.min_width(columns + 1).saturating_sub(1)),
            arrangement: model.materialize(columns),
        });
    }
    descriptions
}

/// Render descriptions as one stylesheet, in the given (widest-first) order so
/// narrower container queries win the cascade.
#[must_use]
pub fn emit_css(descriptions: &[LayoutDescription], selector: impl Fn(&ItemId) -> String) -> String {
    descriptions
        .iter()
        .map(|description| description.css_rules(&selector))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridweave_core::{Cell, Span};

    fn item(id: &str, column: u16, row: u16, width: u16, height: u16) -> GridItem {
        GridItem::new(id, Cell::new(column, row), Span::new(width, height).unwrap())
    }

    fn two_item_model() -> LayoutModel {
        let arrangement = Arrangement::new(vec![item("wide", 1, 1, 2, 1), item("narrow", 3, 1, 1, 1)]);
        LayoutModel::from_arrangement(4, &arrangement).unwrap()
    }

    #[test]
    fn narrow_item_wraps_below_wide_item() {
        let model = two_item_model();
        let positions = derive_layout(&model, 2).unwrap();
        assert_eq!(positions[&ItemId::from("wide")], Cell::new(1, 1));
        assert_eq!(positions[&ItemId::from("narrow")], Cell::new(1, 2));
    }

    #[test]
    fn single_column_stacks_in_reading_order() {
        let arrangement = Arrangement::new(vec![
            item("c", 2, 3, 1, 1),
            item("a", 1, 1, 3, 2),
            item("b", 3, 4, 1, 1),
        ]);
        let model = LayoutModel::from_arrangement(3, &arrangement).unwrap();
        let derived = model.arrangement_for(1).unwrap();
        let cells: Vec<(&str, Cell)> = derived.iter().map(|i| (i.id.as_str(), i.cell)).collect();
        assert_eq!(
            cells,
            vec![("a", Cell::new(1, 1)), ("c", Cell::new(1, 3)), ("b", Cell::new(1, 4))]
        );
    }

    #[test]
    fn derivation_does_not_leak_into_canonical() {
        let model = two_item_model();
        let before = derive_layout(&model, 4).unwrap();
        for columns in 1..4 {
            let _ = derive_layout(&model, columns).unwrap();
        }
        assert_eq!(derive_layout(&model, 4).unwrap(), before);
        assert_eq!(&before, model.canonical());
    }

    #[test]
    fn ladder_thresholds() {
        let ladder = BreakpointLadder::new(4, 100, 10);
        assert_eq!(ladder.min_width(1), 100);
        assert_eq!(ladder.min_width(4), 430);
        assert_eq!(ladder.columns_for_width(50), 1);
        assert_eq!(ladder.columns_for_width(209), 1);
        assert_eq!(ladder.columns_for_width(210), 2);
        assert_eq!(ladder.columns_for_width(10_000), 4);
        assert_eq!(ladder.detect_transition(300, 320), Some((2, 3)));
        assert_eq!(ladder.detect_transition(320, 330), None);
        let columns: Vec<u16> = ladder.breakpoints().iter().map(|b| b.columns).collect();
        assert_eq!(columns, vec![4, 3, 2, 1]);
    }

    #[test]
    fn oversized_metrics_saturate() {
        let ladder = BreakpointLadder::new(12, 400_000_000, 16);
        assert_eq!(ladder.min_width(12), u32::MAX);
        assert_eq!(ladder.min_width(1), 400_000_000);
        assert_eq!(ladder.columns_for_width(u32::MAX), 12);
        assert_eq!(ladder.columns_for_width(800_000_015), 1);
    }

    #[test]
    fn descriptions_descend_and_canonical_is_unbounded() {
        let model = two_item_model();
        let descriptions = emit_layout_descriptions(&model, 100, 10);
        assert_eq!(descriptions.len(), 4);
        assert!(descriptions[0].is_canonical());
        assert_eq!(descriptions[0].columns, 4);
        assert!(descriptions.windows(2).all(|w| w[0].columns > w[1].columns));
        assert!(descriptions[1..].iter().all(|d| d.max_width.is_some()));

        let three = &descriptions[1];
        assert_eq!(three.min_width, Some(320));
        assert_eq!(three.max_width, Some(429));
    }

    #[test]
    fn css_uses_span_syntax_and_container_queries() {
        let model = two_item_model();
        let descriptions = emit_layout_descriptions(&model, 100, 10);
        let css = emit_css(&descriptions, default_item_selector);
        assert!(css.starts_with(
            "[data-grid-item=\"wide\"] { grid-column: 1 / span 2; grid-row: 1 / span 1; }\n\
             [data-grid-item=\"narrow\"] { grid-column: 3 / span 1; grid-row: 1 / span 1; }\n"
        ));
        assert!(css.contains("@container (max-width: 319px) {"));
        assert!(css.contains(
            "  [data-grid-item=\"narrow\"] { grid-column: 1 / span 1; grid-row: 2 / span 1; }"
        ));
        let canonical_end = css.find("@container").unwrap();
        assert!(!css[..canonical_end].contains("@container"));
    }
}
