#![forbid(unsafe_code)]

//! Grid items and arrangements.
//!
//! An [`Arrangement`] is one complete snapshot of item positions and sizes at
//! a single column count. It keeps insertion order; algorithms that care
//! about reading order sort explicitly via [`Arrangement::reading_order`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::{Cell, GridRect, Span, overlaps};

/// Stable identifier for a grid item.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for ItemId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

/// Item id to top-left cell.
pub type PositionTable = BTreeMap<ItemId, Cell>;

/// Item id to declared size.
pub type SizeTable = BTreeMap<ItemId, Span>;

/// One placed item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridItem {
    pub id: ItemId,
    pub cell: Cell,
    pub span: Span,
}

impl GridItem {
    pub fn new(id: impl Into<ItemId>, cell: Cell, span: Span) -> Self {
        Self {
            id: id.into(),
            cell,
            span,
        }
    }

    /// Occupied rectangle.
    #[inline]
    pub fn rect(&self) -> GridRect {
        GridRect::from_parts(self.cell, self.span)
    }
}

/// Ordered set of placed items at one column count.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Arrangement {
    items: Vec<GridItem>,
}

impl Arrangement {
    #[must_use]
    pub fn new(items: Vec<GridItem>) -> Self {
        Self { items }
    }

    #[must_use]
    pub fn items(&self) -> &[GridItem] {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut [GridItem] {
        &mut self.items
    }

    #[must_use]
    pub fn into_items(self) -> Vec<GridItem> {
        self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GridItem> {
        self.items.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn push(&mut self, item: GridItem) {
        self.items.push(item);
    }

    /// Index of the item with `id`.
    #[must_use]
    pub fn index_of(&self, id: &ItemId) -> Option<usize> {
        self.items.iter().position(|item| &item.id == id)
    }

    #[must_use]
    pub fn find(&self, id: &ItemId) -> Option<&GridItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    pub fn find_mut(&mut self, id: &ItemId) -> Option<&mut GridItem> {
        self.items.iter_mut().find(|item| &item.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: &ItemId) -> bool {
        self.index_of(id).is_some()
    }

    /// Item id to cell.
    #[must_use]
    pub fn positions(&self) -> PositionTable {
        self.items
            .iter()
            .map(|item| (item.id.clone(), item.cell))
            .collect()
    }

    /// Item id to span.
    #[must_use]
    pub fn sizes(&self) -> SizeTable {
        self.items
            .iter()
            .map(|item| (item.id.clone(), item.span))
            .collect()
    }

    /// Items sorted row-major (row, then column). Ties keep insertion order.
    #[must_use]
    pub fn reading_order(&self) -> Vec<&GridItem> {
        let mut ordered: Vec<&GridItem> = self.items.iter().collect();
        ordered.sort_by_key(|item| item.cell.reading_key());
        ordered
    }

    /// Every pair of distinct items whose rectangles overlap, as index pairs.
    #[must_use]
    pub fn overlapping_pairs(&self) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        for (i, a) in self.items.iter().enumerate() {
            for (j, b) in self.items.iter().enumerate().skip(i + 1) {
                if overlaps(&a.rect(), &b.rect()) {
                    pairs.push((i, j));
                }
            }
        }
        pairs
    }

    #[must_use]
    pub fn has_overlaps(&self) -> bool {
        let rects: Vec<GridRect> = self.items.iter().map(GridItem::rect).collect();
        rects
            .iter()
            .enumerate()
            .any(|(i, a)| rects[i + 1..].iter().any(|b| overlaps(a, b)))
    }

    /// Number of rows in use (the largest exclusive bottom edge, minus one).
    #[must_use]
    pub fn rows_used(&self) -> u16 {
        self.items
            .iter()
            .map(|item| item.rect().bottom().saturating_sub(1))
            .max()
            .unwrap_or(0)
    }
}

impl FromIterator<GridItem> for Arrangement {
    fn from_iter<I: IntoIterator<Item = GridItem>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Arrangement {
    type Item = GridItem;
    type IntoIter = std::vec::IntoIter<GridItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Arrangement {
    type Item = &'a GridItem;
    type IntoIter = std::slice::Iter<'a, GridItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, column: u16, row: u16, width: u16, height: u16) -> GridItem {
        GridItem::new(id, Cell::new(column, row), Span::new(width, height).unwrap())
    }

    #[test]
    fn reading_order_is_row_major() {
        let arrangement = Arrangement::new(vec![
            item("c", 1, 2, 1, 1),
            item("b", 2, 1, 1, 1),
            item("a", 1, 1, 1, 1),
        ]);
        let order: Vec<_> = arrangement
            .reading_order()
            .into_iter()
            .map(|i| i.id.as_str())
            .collect();
        assert_eq!(order, ["a", "b", "c"]);
    }

    #[test]
    fn overlap_detection() {
        let clean = Arrangement::new(vec![item("a", 1, 1, 2, 1), item("b", 3, 1, 1, 1)]);
        assert!(!clean.has_overlaps());
        assert!(clean.overlapping_pairs().is_empty());

        let dirty = Arrangement::new(vec![
            item("a", 1, 1, 2, 2),
            item("b", 3, 1, 1, 1),
            item("c", 2, 2, 1, 1),
        ]);
        assert!(dirty.has_overlaps());
        assert_eq!(dirty.overlapping_pairs(), vec![(0, 2)]);
    }

    #[test]
    fn lookup_by_id() {
        let mut arrangement = Arrangement::new(vec![item("a", 1, 1, 1, 1), item("b", 2, 1, 1, 1)]);
        let b = ItemId::from("b");
        assert_eq!(arrangement.index_of(&b), Some(1));
        assert!(arrangement.find(&ItemId::from("zzz")).is_none());
        arrangement.find_mut(&b).unwrap().cell = Cell::new(1, 3);
        assert_eq!(arrangement.positions()[&b], Cell::new(1, 3));
    }

    #[test]
    fn rows_used_tracks_tallest_bottom() {
        let arrangement = Arrangement::new(vec![item("a", 1, 1, 1, 3), item("b", 2, 2, 1, 1)]);
        assert_eq!(arrangement.rows_used(), 3);
        assert_eq!(Arrangement::default().rows_used(), 0);
    }

    #[test]
    fn serde_shape_is_a_plain_list() {
        let arrangement = Arrangement::new(vec![item("a", 2, 1, 1, 1)]);
        let json = serde_json::to_string(&arrangement).unwrap();
        assert_eq!(
            json,
            r#"[{"id":"a","cell":{"column":2,"row":1},"span":{"width":1,"height":1}}]"#
        );
        let back: Arrangement = serde_json::from_str(&json).unwrap();
        assert_eq!(back, arrangement);
    }
}
