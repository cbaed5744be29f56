#![forbid(unsafe_code)]

//! Core: grid geometry, items, and arrangements.
//!
//! # Role in gridweave
//! `gridweave-core` is the leaf crate. It owns the 1-indexed cell model,
//! the non-zero [`Span`] type, the rectangle overlap test, and the
//! [`Arrangement`] snapshot type every algorithm consumes and produces.
//!
//! # How it fits in the system
//! `gridweave-layout` builds the placement algorithms, breakpoint derivation,
//! the layout model, and the interaction state machine on these types.
//! Nothing here allocates beyond the arrangement itself or performs I/O.

pub mod geometry;
pub mod item;

pub use geometry::{Cell, GridRect, Span, overlaps};
pub use item::{Arrangement, GridItem, ItemId, PositionTable, SizeTable};
