#![forbid(unsafe_code)]

//! Reflow/reorder placement and the shared first-fit packer.
//!
//! Instead of pushing colliders out of the way, reflow treats the grid as an
//! ordered list: the moved item is inserted into reading order at its target
//! cell and the whole list is re-packed with first-fit placement. This is the
//! strategy for layouts where insertion order, not free-form position, is the
//! meaningful thing.
//!
//! # Invariants
//!
//! 1. Widths are clamped to the column count before placement.
//! 2. The scan is row-major: rows from 1 upward, and within a row every start
//!    column that keeps the item inside the grid.
//! 3. With no row ceiling hit, packed items never overlap.
//!
//! # Failure Modes
//!
//! - Row ceiling reached: the item is force-placed at column 1 of the next
//!   free row (one past the lowest occupied row), which still cannot overlap.

use gridweave_core::{Arrangement, Cell, GridItem, GridRect, ItemId, Span};
use rustc_hash::FxHashSet;

use crate::config::PlacementLimits;
use crate::error::{LayoutError, Result};

/// One first-fit placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub cell: Cell,
    /// Span after width clamping.
    pub span: Span,
    /// Placed past the row ceiling instead of by the scan.
    pub forced: bool,
}

/// Occupancy grid with row-major first-fit placement.
#[derive(Debug, Clone)]
pub struct FirstFitPacker {
    columns: u16,
    max_scan_rows: u16,
    occupied: FxHashSet<Cell>,
    /// Exclusive bottom edge of the lowest placed item.
    next_free_row: u16,
}

impl FirstFitPacker {
    /// `columns == 0` is treated as a single column.
    #[must_use]
    pub fn new(columns: u16, max_scan_rows: u16) -> Self {
        Self {
            columns: columns.max(1),
            max_scan_rows,
            occupied: FxHashSet::default(),
            next_free_row: 1,
        }
    }

    #[must_use]
    pub const fn columns(&self) -> u16 {
        self.columns
    }

    /// Place one item at the first free rectangle and mark it occupied.
    pub fn place(&mut self, span: Span) -> Placement {
        let span = span.clamped_width(self.columns);
        let last_column = self.columns - span.width() + 1;

        for row in 1..=self.max_scan_rows {
            for column in 1..=last_column {
                let rect = GridRect::from_parts(Cell::new(column, row), span);
                if self.is_free(&rect) {
                    self.occupy(&rect);
                    return Placement {
                        cell: rect.origin(),
                        span,
                        forced: false,
                    };
                }
            }
        }

        let rect = GridRect::from_parts(Cell::new(1, self.next_free_row), span);
        self.occupy(&rect);
        Placement {
            cell: rect.origin(),
            span,
            forced: true,
        }
    }

    /// Whether every cell of `rect` is unoccupied.
    #[must_use]
    pub fn is_free(&self, rect: &GridRect) -> bool {
        rect.cells().all(|cell| !self.occupied.contains(&cell))
    }

    fn occupy(&mut self, rect: &GridRect) {
        self.occupied.extend(rect.cells());
        self.next_free_row = self.next_free_row.max(rect.bottom());
    }
}

/// Result of one reflow, with items listed in their new logical order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflowOutcome {
    pub arrangement: Arrangement,
    /// Items placed past the row ceiling.
    pub forced: Vec<ItemId>,
}

/// Re-pack `items` in the given order with first-fit placement.
pub fn pack_in_order<'a, I>(items: I, columns: u16, max_scan_rows: u16) -> ReflowOutcome
where
    I: IntoIterator<Item = &'a GridItem>,
{
    let mut packer = FirstFitPacker::new(columns, max_scan_rows);
    let mut forced = Vec::new();
    let arrangement = items
        .into_iter()
        .map(|item| {
            let placement = packer.place(item.span);
            if placement.forced {
                forced.push(item.id.clone());
            }
            GridItem::new(item.id.clone(), placement.cell, placement.span)
        })
        .collect();
    if !forced.is_empty() {
        tracing::warn!(
            target: "gridweave.reflow",
            forced = forced.len(),
            max_scan_rows,
            "first-fit row ceiling reached; items force-placed"
        );
    }
    ReflowOutcome { arrangement, forced }
}

/// Reading order of `arrangement` with `moved` re-inserted at `target`.
///
/// The moved item goes in front of the first item that is not strictly
/// before `target`. Returns `None` when `moved` is absent.
#[must_use]
pub fn reorder<'a>(
    arrangement: &'a Arrangement,
    moved: &ItemId,
    target: Cell,
) -> Option<Vec<&'a GridItem>> {
    let moved_item = arrangement.find(moved)?;
    let mut order: Vec<&GridItem> = arrangement
        .reading_order()
        .into_iter()
        .filter(|item| &item.id != moved)
        .collect();
    let insert_at = order
        .iter()
        .position(|item| !item.cell.is_before(target))
        .unwrap_or(order.len());
    order.insert(insert_at, moved_item);
    Some(order)
}

/// Move `moved` to `target` in reading order and re-pack into `columns`.
pub fn reflow_layout(
    arrangement: &Arrangement,
    moved: &ItemId,
    target: Cell,
    columns: u16,
    limits: &PlacementLimits,
) -> Result<ReflowOutcome> {
    let order = reorder(arrangement, moved, target).ok_or_else(|| LayoutError::unknown(moved))?;
    let outcome = pack_in_order(order, columns, limits.max_scan_rows);
    tracing::debug!(
        target: "gridweave.reflow",
        item = %moved,
        column = target.column,
        row = target.row,
        columns,
        "reflow layout computed"
    );
    Ok(outcome)
}

/// Reflow with default ceilings, returning `Err` on an unknown id.
pub fn try_compute_reflow_layout(
    arrangement: &Arrangement,
    moved: &ItemId,
    target: Cell,
    columns: u16,
) -> Result<Arrangement> {
    reflow_layout(
        arrangement,
        moved,
        target,
        columns,
        &PlacementLimits::default(),
    )
    .map(|outcome| outcome.arrangement)
}

/// Reflow with default ceilings.
///
/// An unknown `moved` id is logged and the input is returned unchanged.
#[must_use]
pub fn compute_reflow_layout(
    arrangement: &Arrangement,
    moved: &ItemId,
    target: Cell,
    columns: u16,
) -> Arrangement {
    match try_compute_reflow_layout(arrangement, moved, target, columns) {
        Ok(result) => result,
        Err(err) => {
            tracing::warn!(target: "gridweave.reflow", error = %err, "reflow layout skipped");
            arrangement.clone()
        }
    }
}
