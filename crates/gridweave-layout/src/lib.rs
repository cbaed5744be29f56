#![forbid(unsafe_code)]

//! Placement algorithms, breakpoint derivation, and interaction state.
//!
//! - [`push`] and [`reflow`] turn one moved or resized item into a complete
//!   non-overlapping [`Arrangement`](gridweave_core::Arrangement).
//! - [`breakpoint`] re-packs the canonical arrangement for narrower column
//!   counts and describes each count for a renderer.
//! - [`model`] holds sizes, the canonical arrangement, and overrides.
//! - [`interaction`] gates when placement may run.
//! - [`engine`] wires those together behind an injected
//!   [`PlacementStrategy`].
//!
//! Everything is synchronous and single-threaded. Embedders that share a
//! [`GridEngine`] or [`LayoutModel`] across threads must serialize access.

pub mod breakpoint;
pub mod config;
pub mod engine;
pub mod error;
pub mod interaction;
pub mod model;
pub mod push;
pub mod reflow;
pub mod snapshot;
pub mod strategy;

pub use breakpoint::{
    Breakpoint, BreakpointLadder, LayoutDescription, default_item_selector, derive_layout,
    emit_css, emit_layout_descriptions,
};
pub use config::{EngineConfig, PlacementLimits};
pub use engine::GridEngine;
pub use error::{LayoutError, Result};
pub use interaction::{
    InteractionAction, InteractionContext, InteractionEffect, InteractionKind, InteractionMachine,
    InteractionMode, InteractionNoopReason, InteractionPhase, InteractionState,
    InteractionTransition, Nudge,
};
pub use model::{LayoutModel, ModelChange, SubscriptionId};
pub use push::{PushOutcome, compact_arrangement, compute_push_layout, try_compute_push_layout};
pub use reflow::{ReflowOutcome, compute_reflow_layout, try_compute_reflow_layout};
pub use snapshot::{LAYOUT_SNAPSHOT_SCHEMA_VERSION, LayoutSnapshot};
pub use strategy::{PlacementStrategy, PushStrategy, ReflowStrategy};
