#![forbid(unsafe_code)]

//! Long-lived layout model: item sizes, the canonical arrangement, and
//! per-column-count overrides.
//!
//! The canonical arrangement is stored at the maximum column count. Every
//! other column count resolves to a saved override if one exists, or is
//! derived on demand from the canonical arrangement (see
//! [`crate::breakpoint`]). Derivation is never cached, so saving the
//! canonical arrangement is immediately visible at every derived width.
//!
//! # Invariants
//!
//! 1. Every id in the canonical table has a size, and vice versa.
//! 2. Override tables only name known items and cover all of them.
//! 3. No override is ever stored for `max_columns`.
//! 4. The initial arrangement has unique ids, fits `max_columns`, and has no
//!    overlaps.
//! 5. Each mutation updates the maps first, then notifies subscribers
//!    synchronously in subscription order.

use std::collections::BTreeMap;
use std::fmt;

use gridweave_core::{Arrangement, GridItem, ItemId, PositionTable, SizeTable, Span, overlaps};

use crate::breakpoint::derive_arrangement;
use crate::config::DEFAULT_MAX_SCAN_ROWS;
use crate::error::{LayoutError, Result};

/// What changed in a [`LayoutModel`] mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelChange {
    LayoutSaved { columns: u16, canonical: bool },
    ItemResized { id: ItemId, span: Span },
    OverrideCleared { columns: u16 },
    ColumnsChanged { from: u16, to: u16 },
}

/// Handle returned by [`LayoutModel::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&ModelChange)>;

pub struct LayoutModel {
    max_columns: u16,
    current_columns: u16,
    max_scan_rows: u16,
    sizes: SizeTable,
    canonical: PositionTable,
    overrides: BTreeMap<u16, PositionTable>,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
}

impl fmt::Debug for LayoutModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutModel")
            .field("max_columns", &self.max_columns)
            .field("current_columns", &self.current_columns)
            .field("sizes", &self.sizes)
            .field("canonical", &self.canonical)
            .field("overrides", &self.overrides)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl LayoutModel {
    /// Build a model from the initial arrangement at `max_columns`.
    ///
    /// Duplicate ids, items that do not fit the grid, and overlapping items
    /// are rejected.
    pub fn from_arrangement(max_columns: u16, arrangement: &Arrangement) -> Result<Self> {
        if max_columns == 0 {
            return Err(LayoutError::InvalidColumnCount {
                columns: 0,
                max_columns,
            });
        }
        if let Err(err) = check_arrangement(arrangement, max_columns) {
            tracing::warn!(target: "gridweave.model", error = %err, "initial arrangement rejected");
            return Err(err);
        }
        Ok(Self::from_tables(
            max_columns,
            arrangement.sizes(),
            arrangement.positions(),
            BTreeMap::new(),
        ))
    }

    pub(crate) fn from_tables(
        max_columns: u16,
        sizes: SizeTable,
        canonical: PositionTable,
        overrides: BTreeMap<u16, PositionTable>,
    ) -> Self {
        Self {
            max_columns,
            current_columns: max_columns,
            max_scan_rows: DEFAULT_MAX_SCAN_ROWS,
            sizes,
            canonical,
            overrides,
            subscribers: Vec::new(),
            next_subscription: 0,
        }
    }

    pub(crate) fn with_current_columns(mut self, columns: u16) -> Self {
        self.current_columns = columns;
        self
    }

    /// Set the first-fit row ceiling used by derivation (builder pattern).
    #[must_use]
    pub fn with_max_scan_rows(mut self, max_scan_rows: u16) -> Self {
        self.max_scan_rows = max_scan_rows.max(1);
        self
    }

    #[must_use]
    pub const fn max_columns(&self) -> u16 {
        self.max_columns
    }

    #[must_use]
    pub const fn current_columns(&self) -> u16 {
        self.current_columns
    }

    #[must_use]
    pub const fn max_scan_rows(&self) -> u16 {
        self.max_scan_rows
    }

    #[must_use]
    pub fn sizes(&self) -> &SizeTable {
        &self.sizes
    }

    #[must_use]
    pub fn size_of(&self, id: &ItemId) -> Option<Span> {
        self.sizes.get(id).copied()
    }

    #[must_use]
    pub fn canonical(&self) -> &PositionTable {
        &self.canonical
    }

    #[must_use]
    pub fn override_for(&self, columns: u16) -> Option<&PositionTable> {
        self.overrides.get(&columns)
    }

    #[must_use]
    pub fn has_override(&self, columns: u16) -> bool {
        self.overrides.contains_key(&columns)
    }

    /// Column counts with a saved override, ascending.
    pub fn override_columns(&self) -> impl Iterator<Item = u16> + '_ {
        self.overrides.keys().copied()
    }

    pub(crate) fn overrides(&self) -> &BTreeMap<u16, PositionTable> {
        &self.overrides
    }

    pub(crate) fn check_columns(&self, columns: u16) -> Result<()> {
        if columns == 0 || columns > self.max_columns {
            return Err(LayoutError::InvalidColumnCount {
                columns,
                max_columns: self.max_columns,
            });
        }
        Ok(())
    }

    /// Positions for `columns`: canonical, override, or derived.
    pub fn derive_layout(&self, columns: u16) -> Result<PositionTable> {
        self.check_columns(columns)?;
        if columns == self.max_columns {
            return Ok(self.canonical.clone());
        }
        if let Some(saved) = self.overrides.get(&columns) {
            return Ok(saved.clone());
        }
        Ok(self.derived(columns).positions())
    }

    /// Full arrangement (positions and spans) for `columns`.
    ///
    /// Spans are clamped to the column count. Items are listed in reading
    /// order of the resolved positions.
    pub fn arrangement_for(&self, columns: u16) -> Result<Arrangement> {
        self.check_columns(columns)?;
        Ok(self.materialize(columns))
    }

    /// Arrangement at the current column count.
    #[must_use]
    pub fn current_arrangement(&self) -> Arrangement {
        self.materialize(self.current_columns)
    }

    pub(crate) fn materialize(&self, columns: u16) -> Arrangement {
        let table = if columns == self.max_columns {
            &self.canonical
        } else if let Some(saved) = self.overrides.get(&columns) {
            saved
        } else {
            return self.derived(columns);
        };
        let mut items: Vec<GridItem> = table
            .iter()
            .filter_map(|(id, cell)| {
                self.sizes
                    .get(id)
                    .map(|span| GridItem::new(id.clone(), *cell, span.clamped_width(columns)))
            })
            .collect();
        items.sort_by_key(|item| item.cell.reading_key());
        Arrangement::new(items)
    }

    fn derived(&self, columns: u16) -> Arrangement {
        derive_arrangement(&self.canonical, &self.sizes, columns, self.max_scan_rows)
    }

    /// Check that `positions` could be saved at `columns` without error.
    pub(crate) fn check_table(&self, columns: u16, positions: &PositionTable) -> Result<()> {
        self.check_columns(columns)?;
        if let Some(unknown) = positions.keys().find(|id| !self.sizes.contains_key(*id)) {
            return Err(LayoutError::unknown(unknown));
        }
        if let Some(missing) = self.sizes.keys().find(|id| !positions.contains_key(*id)) {
            return Err(LayoutError::MissingPosition {
                id: missing.clone(),
                columns,
            });
        }
        Ok(())
    }

    /// Replace the canonical arrangement (`columns == max_columns`) or the
    /// override for `columns`.
    pub fn save_layout(&mut self, columns: u16, positions: PositionTable) -> Result<()> {
        self.check_table(columns, &positions)?;

        let canonical = columns == self.max_columns;
        if canonical {
            self.canonical = positions;
        } else {
            self.overrides.insert(columns, positions);
        }
        tracing::debug!(target: "gridweave.model", columns, canonical, "layout saved");
        self.notify(&ModelChange::LayoutSaved { columns, canonical });
        Ok(())
    }

    /// Change an item's declared size.
    ///
    /// An unknown id is logged and nothing changes.
    pub fn update_item_size(&mut self, id: &ItemId, span: Span) -> Result<()> {
        let Some(slot) = self.sizes.get_mut(id) else {
            tracing::warn!(target: "gridweave.model", item = %id, "size update for unknown item");
            return Err(LayoutError::unknown(id));
        };
        if *slot == span {
            return Ok(());
        }
        *slot = span;
        tracing::debug!(target: "gridweave.model", item = %id, span = %span, "item resized");
        self.notify(&ModelChange::ItemResized {
            id: id.clone(),
            span,
        });
        Ok(())
    }

    /// Drop the override for `columns`. Returns whether one existed.
    pub fn clear_override(&mut self, columns: u16) -> bool {
        if self.overrides.remove(&columns).is_none() {
            return false;
        }
        tracing::debug!(target: "gridweave.model", columns, "override cleared");
        self.notify(&ModelChange::OverrideCleared { columns });
        true
    }

    /// Drop every override except `keep` that no longer fits the declared
    /// sizes. Returns the cleared column counts.
    pub(crate) fn clear_stale_overrides(&mut self, keep: u16) -> Vec<u16> {
        let stale: Vec<u16> = self
            .overrides
            .keys()
            .copied()
            .filter(|&columns| columns != keep)
            .filter(|&columns| check_arrangement(&self.materialize(columns), columns).is_err())
            .collect();
        for &columns in &stale {
            self.clear_override(columns);
        }
        stale
    }

    /// Record the column count the grid is currently rendered at.
    pub fn set_current_column_count(&mut self, columns: u16) -> Result<()> {
        self.check_columns(columns)?;
        let from = self.current_columns;
        if from == columns {
            return Ok(());
        }
        self.current_columns = columns;
        tracing::debug!(target: "gridweave.model", from, to = columns, "column count changed");
        self.notify(&ModelChange::ColumnsChanged { from, to: columns });
        Ok(())
    }

    /// Register a callback run after every mutation.
    pub fn subscribe(&mut self, callback: impl FnMut(&ModelChange) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Remove a subscriber. Returns whether it was registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub, _)| *sub != id);
        self.subscribers.len() != before
    }

    fn notify(&mut self, change: &ModelChange) {
        for (_, callback) in &mut self.subscribers {
            callback(change);
        }
    }
}

/// Unique ids, every item inside `columns`, no overlapping pair.
fn check_arrangement(arrangement: &Arrangement, columns: u16) -> Result<()> {
    let mut seen = std::collections::BTreeSet::new();
    for item in arrangement.iter() {
        if !seen.insert(&item.id) {
            return Err(LayoutError::DuplicateItem { id: item.id.clone() });
        }
        let right = u32::from(item.cell.column) + u32::from(item.span.width()) - 1;
        if item.cell.column == 0 || item.cell.row == 0 || right > u32::from(columns) {
            return Err(LayoutError::OutOfBounds {
                id: item.id.clone(),
                columns,
            });
        }
    }
    let items = arrangement.items();
    for (i, a) in items.iter().enumerate() {
        if let Some(b) = items[i + 1..]
            .iter()
            .find(|b| overlaps(&a.rect(), &b.rect()))
        {
            return Err(LayoutError::Overlapping {
                first: a.id.clone(),
                second: b.id.clone(),
            });
        }
    }
    Ok(())
}
