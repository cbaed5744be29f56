#![forbid(unsafe_code)]

//! Collision and displacement ("push") placement.
//!
//! Moving or resizing one item pushes every item it now overlaps straight
//! down, cascading through whatever those items land on, and then optionally
//! compacts the rest of the grid upward to remove the slack the move left.
//!
//! # Invariants
//!
//! 1. The moved item always ends exactly at the requested cell.
//! 2. Colliders are processed bottom-most first, then left to right, so
//!    stacked collisions resolve deterministically.
//! 3. A collider is only ever moved down, to exactly the moved item's bottom
//!    edge, and then becomes the mover one level deeper.
//! 4. Compaction never introduces an overlap and never moves the moved item.
//! 5. With no ceiling hit, the result contains no overlapping pair.
//!
//! # Failure Modes
//!
//! - Depth ceiling reached: displacement below that depth stops. Items keep
//!   whatever row they reached. Reported via [`PushOutcome::depth_limit_hit`].
//! - Compaction step ceiling reached: the item stays where it got to.
//!   Reported via [`PushOutcome::compaction_limit_hit`].
//! - Unknown moved id: [`push_layout`] returns
//!   [`LayoutError::UnknownItem`]; [`compute_push_layout`] returns the input
//!   unchanged.

use gridweave_core::{Arrangement, Cell, GridItem, ItemId, Span, overlaps};

use crate::config::PlacementLimits;
use crate::error::{LayoutError, Result};

/// Result of one push placement, with ceiling diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushOutcome {
    pub arrangement: Arrangement,
    /// Items moved by push-down, in the order they were first displaced.
    pub displaced: Vec<ItemId>,
    pub depth_limit_hit: bool,
    pub compaction_limit_hit: bool,
}

/// Report of one compaction pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompactionReport {
    /// Total rows reclaimed across all items.
    pub rows_reclaimed: u32,
    pub limit_hit: bool,
}

#[derive(Default)]
struct PushState {
    displaced: Vec<ItemId>,
    depth_limit_hit: bool,
}

/// Place `moved` at `target` (optionally with a new span) and resolve
/// collisions by pushing down, then compact when `compact` is set.
pub fn push_layout(
    arrangement: &Arrangement,
    moved: &ItemId,
    target: Cell,
    span: Option<Span>,
    compact: bool,
    limits: &PlacementLimits,
) -> Result<PushOutcome> {
    let index = arrangement
        .index_of(moved)
        .ok_or_else(|| LayoutError::unknown(moved))?;

    let mut working = arrangement.clone();
    {
        let item = &mut working.items_mut()[index];
        item.cell = target;
        if let Some(span) = span {
            item.span = span;
        }
    }

    let mut state = PushState::default();
    push_down(
        working.items_mut(),
        index,
        0,
        limits.max_push_depth,
        &mut state,
    );
    if state.depth_limit_hit {
        tracing::warn!(
            target: "gridweave.push",
            item = %moved,
            max_depth = limits.max_push_depth,
            "push-down depth ceiling reached; displacement truncated"
        );
    }

    let report = if compact {
        compact_arrangement(&mut working, Some(moved), limits.max_compaction_steps)
    } else {
        CompactionReport::default()
    };

    tracing::debug!(
        target: "gridweave.push",
        item = %moved,
        column = target.column,
        row = target.row,
        displaced = state.displaced.len(),
        rows_reclaimed = report.rows_reclaimed,
        "push layout computed"
    );

    Ok(PushOutcome {
        arrangement: working,
        displaced: state.displaced,
        depth_limit_hit: state.depth_limit_hit,
        compaction_limit_hit: report.limit_hit,
    })
}

/// Push placement with default ceilings, returning `Err` on an unknown id.
pub fn try_compute_push_layout(
    arrangement: &Arrangement,
    moved: &ItemId,
    target: Cell,
    compact: bool,
) -> Result<Arrangement> {
    push_layout(
        arrangement,
        moved,
        target,
        None,
        compact,
        &PlacementLimits::default(),
    )
    .map(|outcome| outcome.arrangement)
}

/// Push placement with default ceilings.
///
/// An unknown `moved` id is logged and the input is returned unchanged.
#[must_use]
pub fn compute_push_layout(
    arrangement: &Arrangement,
    moved: &ItemId,
    target: Cell,
    compact: bool,
) -> Arrangement {
    match try_compute_push_layout(arrangement, moved, target, compact) {
        Ok(result) => result,
        Err(err) => {
            tracing::warn!(target: "gridweave.push", error = %err, "push layout skipped");
            arrangement.clone()
        }
    }
}

fn push_down(
    items: &mut [GridItem],
    mover: usize,
    depth: u16,
    max_depth: u16,
    state: &mut PushState,
) {
    if depth >= max_depth {
        state.depth_limit_hit = true;
        return;
    }

    let mover_rect = items[mover].rect();
    let floor = mover_rect.bottom();

    let mut colliders: Vec<usize> = items
        .iter()
        .enumerate()
        .filter(|&(i, item)| i != mover && overlaps(&mover_rect, &item.rect()))
        .map(|(i, _)| i)
        .collect();
    colliders.sort_by(|&a, &b| {
        let (a, b) = (items[a].cell, items[b].cell);
        b.row.cmp(&a.row).then(a.column.cmp(&b.column))
    });

    for collider in colliders {
        // Earlier cascades may already have moved this one clear.
        if items[collider].cell.row < floor {
            items[collider].cell.row = floor;
            if !state.displaced.contains(&items[collider].id) {
                state.displaced.push(items[collider].id.clone());
            }
            push_down(items, collider, depth + 1, max_depth, state);
        }
    }
}

/// Pull every item except `pinned` upward until blocked.
///
/// Items are visited in reading order. Each item rises one row at a time
/// while its row stays at least 1 and the new position overlaps nothing,
/// for at most `max_steps` rows.
pub fn compact_arrangement(
    arrangement: &mut Arrangement,
    pinned: Option<&ItemId>,
    max_steps: u16,
) -> CompactionReport {
    let mut order: Vec<usize> = (0..arrangement.len())
        .filter(|&i| Some(&arrangement.items()[i].id) != pinned)
        .collect();
    order.sort_by_key(|&i| arrangement.items()[i].cell.reading_key());

    let items = arrangement.items_mut();
    let mut report = CompactionReport::default();
    for index in order {
        let mut steps = 0u16;
        while items[index].cell.row > 1 {
            if steps >= max_steps {
                report.limit_hit = true;
                tracing::warn!(
                    target: "gridweave.push",
                    item = %items[index].id,
                    max_steps,
                    "compaction step ceiling reached"
                );
                break;
            }
            let candidate = items[index].rect().with_row(items[index].cell.row - 1);
            let blocked = items
                .iter()
                .enumerate()
                .any(|(j, other)| j != index && overlaps(&candidate, &other.rect()));
            if blocked {
                break;
            }
            items[index].cell.row -= 1;
            steps += 1;
        }
        report.rows_reclaimed += u32::from(steps);
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, column: u16, row: u16, width: u16, height: u16) -> GridItem {
        GridItem::new(id, Cell::new(column, row), Span::new(width, height).unwrap())
    }

    fn cell_of(arrangement: &Arrangement, id: &str) -> Cell {
        arrangement.find(&ItemId::from(id)).unwrap().cell
    }

    #[test]
    fn moved_item_lands_at_target() {
        let arrangement = Arrangement::new(vec![item("a", 1, 1, 1, 1), item("b", 2, 1, 1, 1)]);
        let result = compute_push_layout(&arrangement, &"a".into(), Cell::new(3, 2), false);
        assert_eq!(cell_of(&result, "a"), Cell::new(3, 2));
        assert_eq!(cell_of(&result, "b"), Cell::new(2, 1));
    }

    #[test]
    fn collider_is_pushed_to_mover_bottom() {
        let arrangement = Arrangement::new(vec![item("a", 1, 3, 2, 2), item("b", 1, 1, 1, 1)]);
        let result = compute_push_layout(&arrangement, &"a".into(), Cell::new(1, 1), false);
        assert_eq!(cell_of(&result, "a"), Cell::new(1, 1));
        assert_eq!(cell_of(&result, "b"), Cell::new(1, 3));
        assert!(!result.has_overlaps());
    }

    #[test]
    fn cascade_pushes_stacked_items() {
        let arrangement = Arrangement::new(vec![
            item("x", 2, 1, 1, 1),
            item("a", 1, 1, 1, 1),
            item("b", 1, 2, 1, 1),
            item("c", 1, 3, 1, 1),
        ]);
        let outcome = push_layout(
            &arrangement,
            &"x".into(),
            Cell::new(1, 1),
            Some(Span::new(1, 2).unwrap()),
            false,
            &PlacementLimits::default(),
        )
        .unwrap();
        let result = &outcome.arrangement;
        assert_eq!(cell_of(result, "x"), Cell::new(1, 1));
        assert!(!result.has_overlaps());
        assert_eq!(cell_of(result, "a"), Cell::new(1, 3));
        assert_eq!(cell_of(result, "b"), Cell::new(1, 4));
        assert_eq!(cell_of(result, "c"), Cell::new(1, 5));
        assert!(!outcome.depth_limit_hit);
        assert!(outcome.displaced.contains(&ItemId::from("a")));
    }

    #[test]
    fn compaction_removes_vertical_slack() {
        let arrangement = Arrangement::new(vec![item("a", 1, 1, 1, 1), item("b", 2, 5, 1, 1)]);
        let result = compute_push_layout(&arrangement, &"a".into(), Cell::new(1, 1), true);
        assert_eq!(cell_of(&result, "b"), Cell::new(2, 1));
    }

    #[test]
    fn compaction_never_moves_the_moved_item() {
        let arrangement = Arrangement::new(vec![item("a", 1, 1, 1, 1), item("b", 2, 1, 1, 1)]);
        let result = compute_push_layout(&arrangement, &"a".into(), Cell::new(1, 6), true);
        assert_eq!(cell_of(&result, "a"), Cell::new(1, 6));
    }

    #[test]
    fn compaction_is_idempotent() {
        let mut arrangement = Arrangement::new(vec![
            item("a", 1, 4, 2, 1),
            item("b", 2, 7, 1, 2),
            item("c", 3, 3, 1, 1),
            item("d", 1, 9, 3, 1),
        ]);
        let first = compact_arrangement(&mut arrangement, None, 100);
        assert!(first.rows_reclaimed > 0);
        let snapshot = arrangement.clone();
        let second = compact_arrangement(&mut arrangement, None, 100);
        assert_eq!(second.rows_reclaimed, 0);
        assert_eq!(arrangement, snapshot);
    }

    #[test]
    fn compaction_step_ceiling_is_reported() {
        let mut arrangement = Arrangement::new(vec![item("a", 1, 10, 1, 1)]);
        let report = compact_arrangement(&mut arrangement, None, 3);
        assert!(report.limit_hit);
        assert_eq!(arrangement.items()[0].cell, Cell::new(1, 7));
    }

    #[test]
    fn depth_ceiling_truncates_cascade() {
        let mut items = vec![item("m", 2, 1, 1, 1)];
        for row in 1..=6 {
            items.push(item(&format!("s{row}"), 1, row, 1, 1));
        }
        let arrangement = Arrangement::new(items);
        let limits = PlacementLimits {
            max_push_depth: 2,
            ..PlacementLimits::default()
        };
        let outcome = push_layout(
            &arrangement,
            &"m".into(),
            Cell::new(1, 1),
            None,
            false,
            &limits,
        )
        .unwrap();
        assert!(outcome.depth_limit_hit);
        assert_eq!(cell_of(&outcome.arrangement, "m"), Cell::new(1, 1));
    }

    #[test]
    fn unknown_item_returns_input() {
        let arrangement = Arrangement::new(vec![item("a", 1, 1, 1, 1)]);
        let result = compute_push_layout(&arrangement, &"ghost".into(), Cell::new(2, 2), true);
        assert_eq!(result, arrangement);
        let err = try_compute_push_layout(&arrangement, &"ghost".into(), Cell::new(2, 2), true)
            .unwrap_err();
        assert!(err.is_unknown_item());
    }
}
