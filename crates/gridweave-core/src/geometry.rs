#![forbid(unsafe_code)]

//! Grid geometry primitives.
//!
//! Grid coordinates are 1-indexed: the top-left cell is `(column 1, row 1)`.
//! Spans are measured in whole cells and are never zero.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A 1-indexed grid cell (the top-left corner of an item).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub column: u16,
    pub row: u16,
}

impl Cell {
    /// Top-left cell of the grid.
    pub const ORIGIN: Self = Self { column: 1, row: 1 };

    #[inline]
    pub const fn new(column: u16, row: u16) -> Self {
        Self { column, row }
    }

    /// Row-major ordering: `self` comes strictly before `other` in reading order.
    #[inline]
    pub const fn is_before(self, other: Cell) -> bool {
        self.row < other.row || (self.row == other.row && self.column < other.column)
    }

    /// Sort key for reading order (row first, then column).
    #[inline]
    pub const fn reading_key(self) -> (u16, u16) {
        (self.row, self.column)
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::ORIGIN
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.column, self.row)
    }
}

#[derive(Deserialize)]
struct RawSpan {
    width: u16,
    height: u16,
}

/// Size of an item in grid cells. Both axes are at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawSpan")]
pub struct Span {
    width: u16,
    height: u16,
}

impl Span {
    /// A single cell.
    pub const UNIT: Self = Self {
        width: 1,
        height: 1,
    };

    /// Create a span, rejecting zero on either axis.
    #[must_use]
    pub const fn new(width: u16, height: u16) -> Option<Self> {
        if width == 0 || height == 0 {
            None
        } else {
            Some(Self { width, height })
        }
    }

    #[inline]
    #[must_use]
    pub const fn width(self) -> u16 {
        self.width
    }

    #[inline]
    #[must_use]
    pub const fn height(self) -> u16 {
        self.height
    }

    /// Clamp the width so the span fits into `columns` columns.
    ///
    /// `columns == 0` is treated as a single column.
    #[must_use]
    pub fn clamped_width(self, columns: u16) -> Self {
        Self {
            width: self.width.min(columns.max(1)),
            height: self.height,
        }
    }
}

impl Default for Span {
    fn default() -> Self {
        Self::UNIT
    }
}

impl TryFrom<RawSpan> for Span {
    type Error = String;

    fn try_from(raw: RawSpan) -> Result<Self, Self::Error> {
        Span::new(raw.width, raw.height)
            .ok_or_else(|| format!("span must be non-zero, got {}x{}", raw.width, raw.height))
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// The cells occupied by an item: origin plus span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridRect {
    pub column: u16,
    pub row: u16,
    pub width: u16,
    pub height: u16,
}

impl GridRect {
    #[inline]
    pub const fn new(column: u16, row: u16, width: u16, height: u16) -> Self {
        Self {
            column,
            row,
            width,
            height,
        }
    }

    #[inline]
    pub const fn from_parts(cell: Cell, span: Span) -> Self {
        Self::new(cell.column, cell.row, span.width, span.height)
    }

    /// First column past the right edge (exclusive).
    #[inline]
    pub const fn right(&self) -> u16 {
        self.column.saturating_add(self.width)
    }

    /// First row past the bottom edge (exclusive).
    #[inline]
    pub const fn bottom(&self) -> u16 {
        self.row.saturating_add(self.height)
    }

    #[inline]
    pub const fn origin(&self) -> Cell {
        Cell::new(self.column, self.row)
    }

    /// Whether `cell` lies inside the rectangle.
    #[inline]
    pub const fn contains(&self, cell: Cell) -> bool {
        cell.column >= self.column
            && cell.column < self.right()
            && cell.row >= self.row
            && cell.row < self.bottom()
    }

    /// Same rectangle with its top edge at `row`.
    #[inline]
    #[must_use]
    pub const fn with_row(self, row: u16) -> Self {
        Self { row, ..self }
    }

    /// Iterate every cell covered by the rectangle, row-major.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (self.row..self.bottom())
            .flat_map(move |row| (self.column..self.right()).map(move |column| Cell::new(column, row)))
    }

    /// See [`overlaps`].
    #[inline]
    pub const fn overlaps(&self, other: &GridRect) -> bool {
        overlaps(self, other)
    }
}

/// Whether two rectangles share at least one cell.
///
/// Touching edges do not count: far edges are exclusive.
#[inline]
pub const fn overlaps(a: &GridRect, b: &GridRect) -> bool {
    a.column < b.right() && b.column < a.right() && a.row < b.bottom() && b.row < a.bottom()
}
