#![forbid(unsafe_code)]

//! Placement strategies injected into [`crate::engine::GridEngine`].
//!
//! A strategy turns "this item wants to be here" or "this item wants to be
//! this big" into a complete non-overlapping [`Arrangement`]. Strategies are
//! chosen at construction time; there is no global registry.

use gridweave_core::{Arrangement, Cell, ItemId, Span};

use crate::config::{EngineConfig, PlacementLimits};
use crate::error::{LayoutError, Result};
use crate::push::push_layout;
use crate::reflow::{pack_in_order, reflow_layout};

/// Computes drag and resize layouts.
///
/// Implementations must be deterministic and must not mutate anything but
/// their return value.
pub trait PlacementStrategy {
    /// Short stable name, used in logs.
    fn name(&self) -> &'static str;

    /// Arrangement after moving `moved` to `target`.
    fn compute_drag_layout(
        &self,
        arrangement: &Arrangement,
        moved: &ItemId,
        target: Cell,
        columns: u16,
    ) -> Result<Arrangement>;

    /// Arrangement after giving `resized` the span `span`.
    fn compute_resize_layout(
        &self,
        arrangement: &Arrangement,
        resized: &ItemId,
        span: Span,
        columns: u16,
    ) -> Result<Arrangement>;
}

/// Free-form placement: colliders are pushed down, then the grid optionally
/// compacts upward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushStrategy {
    pub compact: bool,
    pub limits: PlacementLimits,
}

impl Default for PushStrategy {
    fn default() -> Self {
        Self {
            compact: true,
            limits: PlacementLimits::default(),
        }
    }
}

impl PushStrategy {
    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            compact: config.compact_on_push,
            limits: config.limits(),
        }
    }
}

impl PlacementStrategy for PushStrategy {
    fn name(&self) -> &'static str {
        "push"
    }

    fn compute_drag_layout(
        &self,
        arrangement: &Arrangement,
        moved: &ItemId,
        target: Cell,
        _columns: u16,
    ) -> Result<Arrangement> {
        push_layout(arrangement, moved, target, None, self.compact, &self.limits)
            .map(|outcome| outcome.arrangement)
    }

    fn compute_resize_layout(
        &self,
        arrangement: &Arrangement,
        resized: &ItemId,
        span: Span,
        columns: u16,
    ) -> Result<Arrangement> {
        let cell = arrangement
            .find(resized)
            .map(|item| item.cell)
            .ok_or_else(|| LayoutError::unknown(resized))?;
        let span = span.clamped_width(columns);
        push_layout(
            arrangement,
            resized,
            cell,
            Some(span),
            self.compact,
            &self.limits,
        )
        .map(|outcome| outcome.arrangement)
    }
}

/// Ordered placement: items keep a reading order and are re-packed first-fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReflowStrategy {
    pub limits: PlacementLimits,
}

impl ReflowStrategy {
    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            limits: config.limits(),
        }
    }
}

impl PlacementStrategy for ReflowStrategy {
    fn name(&self) -> &'static str {
        "reflow"
    }

    fn compute_drag_layout(
        &self,
        arrangement: &Arrangement,
        moved: &ItemId,
        target: Cell,
        columns: u16,
    ) -> Result<Arrangement> {
        reflow_layout(arrangement, moved, target, columns, &self.limits)
            .map(|outcome| outcome.arrangement)
    }

    /// The order is unchanged; only the resized item's span differs before
    /// re-packing.
    fn compute_resize_layout(
        &self,
        arrangement: &Arrangement,
        resized: &ItemId,
        span: Span,
        columns: u16,
    ) -> Result<Arrangement> {
        let mut working = arrangement.clone();
        working
            .find_mut(resized)
            .ok_or_else(|| LayoutError::unknown(resized))?
            .span = span;
        let order = working.reading_order();
        Ok(pack_in_order(order, columns, self.limits.max_scan_rows).arrangement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridweave_core::GridItem;

    fn item(id: &str, column: u16, row: u16, width: u16, height: u16) -> GridItem {
        GridItem::new(id, Cell::new(column, row), Span::new(width, height).unwrap())
    }

    fn row_of_three() -> Arrangement {
        Arrangement::new(vec![
            item("a", 1, 1, 1, 1),
            item("b", 2, 1, 1, 1),
            item("c", 3, 1, 1, 1),
        ])
    }

    #[test]
    fn strategies_are_object_safe() {
        let strategies: Vec<Box<dyn PlacementStrategy>> =
            vec![Box::new(PushStrategy::default()), Box::new(ReflowStrategy::default())];
        let names: Vec<&str> = strategies.iter().map(|s| s.name()).collect();
        assert_eq!(names, ["push", "reflow"]);
    }

    #[test]
    fn push_resize_pushes_neighbour_below() {
        let arrangement = Arrangement::new(vec![item("a", 1, 1, 1, 1), item("b", 1, 2, 1, 1)]);
        let result = PushStrategy::default()
            .compute_resize_layout(&arrangement, &"a".into(), Span::new(1, 2).unwrap(), 3)
            .unwrap();
        assert_eq!(result.find(&"a".into()).unwrap().span, Span::new(1, 2).unwrap());
        assert_eq!(result.find(&"b".into()).unwrap().cell, Cell::new(1, 3));
        assert!(!result.has_overlaps());
    }

    #[test]
    fn push_resize_clamps_width_to_columns() {
        let arrangement = Arrangement::new(vec![item("a", 1, 1, 1, 1)]);
        let result = PushStrategy::default()
            .compute_resize_layout(&arrangement, &"a".into(), Span::new(9, 1).unwrap(), 3)
            .unwrap();
        assert_eq!(result.find(&"a".into()).unwrap().span.width(), 3);
    }

    #[test]
    fn reflow_resize_keeps_order() {
        let result = ReflowStrategy::default()
            .compute_resize_layout(&row_of_three(), &"a".into(), Span::new(2, 1).unwrap(), 3)
            .unwrap();
        let cells: Vec<(&str, Cell)> = result.iter().map(|i| (i.id.as_str(), i.cell)).collect();
        assert_eq!(
            cells,
            vec![("a", Cell::new(1, 1)), ("b", Cell::new(3, 1)), ("c", Cell::new(1, 2))]
        );
    }

    #[test]
    fn reflow_drag_reorders() {
        let result = ReflowStrategy::default()
            .compute_drag_layout(&row_of_three(), &"c".into(), Cell::ORIGIN, 3)
            .unwrap();
        let order: Vec<&str> = result.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(order, ["c", "a", "b"]);
    }

    #[test]
    fn unknown_items_error() {
        let arrangement = row_of_three();
        let push = PushStrategy::default();
        let reflow = ReflowStrategy::default();
        let missing: ItemId = "zz".into();
        assert!(push.compute_drag_layout(&arrangement, &missing, Cell::ORIGIN, 3).is_err());
        assert!(push.compute_resize_layout(&arrangement, &missing, Span::UNIT, 3).is_err());
        assert!(reflow.compute_drag_layout(&arrangement, &missing, Cell::ORIGIN, 3).is_err());
        assert!(reflow.compute_resize_layout(&arrangement, &missing, Span::UNIT, 3).is_err());
    }

    #[test]
    fn from_config_copies_limits() {
        let config = EngineConfig::default().with_compaction(false);
        let push = PushStrategy::from_config(&config);
        assert!(!push.compact);
        assert_eq!(push.limits, config.limits());
        assert_eq!(ReflowStrategy::from_config(&config).limits, config.limits());
    }
}
