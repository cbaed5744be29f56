#![forbid(unsafe_code)]

//! Composition root: one [`LayoutModel`], one [`InteractionMachine`], and the
//! [`PlacementStrategy`] chosen at construction.
//!
//! The engine is what an input-handling collaborator drives. Placement runs
//! only while the machine reports an active interaction, each update is
//! computed from the committed arrangement at the column count the
//! interaction started in, and nothing reaches the model until
//! [`GridEngine::commit`].
//!
//! # Invariants
//!
//! 1. The preview is `Some` only while an interaction is active.
//! 2. Cancelling or tearing down never mutates the model.
//! 3. A commit saves the previewed positions at the interaction's starting
//!    column count and, for resizes, records the new declared size. A resize
//!    committed below `max_columns` also re-places the canonical arrangement
//!    around that size, and any other override it no longer fits is cleared.
//!
//! # Example
//!
//! ```
//! use gridweave_core::{Arrangement, Cell, GridItem, ItemId, Span};
//! use gridweave_layout::{EngineConfig, GridEngine, InteractionMode};
//!
//! let initial = Arrangement::new(vec![
//!     GridItem::new("a", Cell::new(1, 1), Span::UNIT),
//!     GridItem::new("b", Cell::new(1, 2), Span::UNIT),
//! ]);
//! let config = EngineConfig::default().with_max_columns(3);
//! let mut engine = GridEngine::with_push(config, &initial)?;
//!
//! engine.select(&"b".into())?;
//! engine.begin_drag(InteractionMode::Pointer);
//! engine.update_drag(Cell::new(1, 1))?;
//! engine.commit()?;
//!
//! assert_eq!(engine.model().canonical()[&ItemId::from("b")], Cell::new(1, 1));
//! # Ok::<(), gridweave_layout::LayoutError>(())
//! ```

use gridweave_core::{Arrangement, Cell, ItemId, PositionTable, Span};

use crate::breakpoint::{BreakpointLadder, LayoutDescription, emit_css, emit_layout_descriptions};
use crate::config::EngineConfig;
use crate::error::{LayoutError, Result};
use crate::interaction::{
    InteractionAction, InteractionContext, InteractionKind, InteractionMachine, InteractionMode,
    InteractionPhase, InteractionTransition, Nudge, nudge_span, nudge_target,
};
use crate::model::LayoutModel;
use crate::strategy::{PlacementStrategy, PushStrategy, ReflowStrategy};

pub struct GridEngine {
    config: EngineConfig,
    model: LayoutModel,
    machine: InteractionMachine,
    strategy: Box<dyn PlacementStrategy>,
    preview: Option<Arrangement>,
}

impl std::fmt::Debug for GridEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridEngine")
            .field("config", &self.config)
            .field("model", &self.model)
            .field("machine", &self.machine)
            .field("strategy", &self.strategy.name())
            .field("preview", &self.preview)
            .finish()
    }
}

impl GridEngine {
    /// Build an engine from the grid's initial arrangement at
    /// `config.max_columns`.
    pub fn new(
        config: EngineConfig,
        initial: &Arrangement,
        strategy: Box<dyn PlacementStrategy>,
    ) -> Result<Self> {
        config.validate()?;
        let model = LayoutModel::from_arrangement(config.max_columns, initial)?
            .with_max_scan_rows(config.max_scan_rows);
        Ok(Self::from_model(config, model, strategy))
    }

    /// Wrap an existing model, e.g. one restored from a snapshot.
    ///
    /// The model's own column counts win over `config.max_columns`.
    #[must_use]
    pub fn from_model(
        config: EngineConfig,
        model: LayoutModel,
        strategy: Box<dyn PlacementStrategy>,
    ) -> Self {
        tracing::debug!(
            target: "gridweave.engine",
            strategy = strategy.name(),
            max_columns = model.max_columns(),
            items = model.sizes().len(),
            "engine created"
        );
        Self {
            config,
            model,
            machine: InteractionMachine::new(),
            strategy,
            preview: None,
        }
    }

    /// Engine with a [`PushStrategy`] configured from `config`.
    pub fn with_push(config: EngineConfig, initial: &Arrangement) -> Result<Self> {
        Self::new(config, initial, Box::new(PushStrategy::from_config(&config)))
    }

    /// Engine with a [`ReflowStrategy`] configured from `config`.
    pub fn with_reflow(config: EngineConfig, initial: &Arrangement) -> Result<Self> {
        Self::new(config, initial, Box::new(ReflowStrategy::from_config(&config)))
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub const fn model(&self) -> &LayoutModel {
        &self.model
    }

    /// Mutable model access for subscriptions and direct edits.
    ///
    /// Editing the model mid-interaction does not refresh the preview.
    pub fn model_mut(&mut self) -> &mut LayoutModel {
        &mut self.model
    }

    #[must_use]
    pub const fn machine(&self) -> &InteractionMachine {
        &self.machine
    }

    #[must_use]
    pub fn phase(&self) -> InteractionPhase {
        self.machine.phase()
    }

    #[must_use]
    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Arrangement computed by the latest update of the active interaction.
    #[must_use]
    pub fn preview(&self) -> Option<&Arrangement> {
        self.preview.as_ref()
    }

    /// What should be rendered now: the preview while interacting, otherwise
    /// the model's arrangement at the current column count.
    #[must_use]
    pub fn rendered_arrangement(&self) -> Arrangement {
        self.preview
            .clone()
            .unwrap_or_else(|| self.model.current_arrangement())
    }

    #[must_use]
    pub fn ladder(&self) -> BreakpointLadder {
        BreakpointLadder::new(self.model.max_columns(), self.config.cell_size, self.config.gap)
    }

    #[must_use]
    pub fn layout_descriptions(&self) -> Vec<LayoutDescription> {
        emit_layout_descriptions(&self.model, self.config.cell_size, self.config.gap)
    }

    /// Stylesheet for every column count, using `selector` to address items.
    #[must_use]
    pub fn css(&self, selector: impl Fn(&ItemId) -> String) -> String {
        emit_css(&self.layout_descriptions(), selector)
    }

    pub fn select(&mut self, item: &ItemId) -> Result<InteractionTransition> {
        if self.model.size_of(item).is_none() {
            return Err(LayoutError::unknown(item));
        }
        Ok(self.machine.transition(InteractionAction::Select { item: item.clone() }))
    }

    pub fn deselect(&mut self) -> InteractionTransition {
        self.machine.transition(InteractionAction::Deselect)
    }

    pub fn begin_drag(&mut self, mode: InteractionMode) -> InteractionTransition {
        self.begin(mode, InteractionKind::Drag)
    }

    pub fn begin_resize(&mut self, mode: InteractionMode) -> InteractionTransition {
        self.begin(mode, InteractionKind::Resize)
    }

    fn begin(&mut self, mode: InteractionMode, kind: InteractionKind) -> InteractionTransition {
        let transition = self.machine.transition(InteractionAction::StartInteraction {
            mode,
            kind,
            columns: self.model.current_columns(),
        });
        if !transition.is_noop() {
            self.preview = None;
        }
        transition
    }

    fn active(&self, kind: InteractionKind) -> Option<InteractionContext> {
        if self.machine.phase() != InteractionPhase::Interacting {
            return None;
        }
        self.machine.context().filter(|c| c.kind == kind).cloned()
    }

    /// Recompute the preview for the dragged item at `target`.
    ///
    /// Returns `Ok(None)` when no drag is active. The target is clamped so
    /// the item stays inside the grid.
    pub fn update_drag(&mut self, target: Cell) -> Result<Option<&Arrangement>> {
        let Some(context) = self.active(InteractionKind::Drag) else {
            tracing::debug!(target: "gridweave.engine", "drag update ignored; no active drag");
            return Ok(None);
        };
        let base = self.model.arrangement_for(context.columns)?;
        let span = base
            .find(&context.item)
            .map(|item| item.span)
            .ok_or_else(|| LayoutError::unknown(&context.item))?;
        let target = clamp_target(target, span, context.columns);

        let next = self
            .strategy
            .compute_drag_layout(&base, &context.item, target, context.columns)?;
        self.machine.transition(InteractionAction::UpdateInteraction {
            target: Some(target),
            span: None,
        });
        let preview: &Arrangement = self.preview.insert(next);
        Ok(Some(preview))
    }

    /// Recompute the preview for the resized item at `span`.
    ///
    /// Returns `Ok(None)` when no resize is active. The width is clamped to
    /// the columns to the right of the item.
    pub fn update_resize(&mut self, span: Span) -> Result<Option<&Arrangement>> {
        let Some(context) = self.active(InteractionKind::Resize) else {
            tracing::debug!(target: "gridweave.engine", "resize update ignored; no active resize");
            return Ok(None);
        };
        let base = self.model.arrangement_for(context.columns)?;
        let cell = base
            .find(&context.item)
            .map(|item| item.cell)
            .ok_or_else(|| LayoutError::unknown(&context.item))?;
        let room = context.columns.saturating_sub(cell.column).saturating_add(1);
        let span = span.clamped_width(room);

        let next = self
            .strategy
            .compute_resize_layout(&base, &context.item, span, context.columns)?;
        self.machine.transition(InteractionAction::UpdateInteraction {
            target: None,
            span: Some(span),
        });
        let preview: &Arrangement = self.preview.insert(next);
        Ok(Some(preview))
    }

    /// One discrete step of the active interaction: a one-cell move while
    /// dragging, a one-cell grow or shrink while resizing.
    pub fn nudge(&mut self, direction: Nudge) -> Result<Option<&Arrangement>> {
        let Some(context) = self.machine.context().cloned() else {
            return Ok(None);
        };
        let base = self.model.arrangement_for(context.columns)?;
        let item = base
            .find(&context.item)
            .ok_or_else(|| LayoutError::unknown(&context.item))?;
        match context.kind {
            InteractionKind::Drag => {
                let from = context.target.unwrap_or(item.cell);
                self.update_drag(nudge_target(from, item.span, direction, context.columns))
            }
            InteractionKind::Resize => {
                let from = context.span.unwrap_or(item.span);
                self.update_resize(nudge_span(item.cell, from, direction, context.columns))
            }
        }
    }

    /// Finish the active interaction and persist its preview.
    ///
    /// Returns the committed arrangement, or `Ok(None)` when nothing was
    /// active or no update had been made. Every table is computed and
    /// checked before the first write, so a failing commit leaves the model
    /// untouched. The machine returns to `Selected` either way.
    pub fn commit(&mut self) -> Result<Option<Arrangement>> {
        let context = self.machine.context().cloned();
        if self.machine.transition(InteractionAction::CommitInteraction).is_noop() {
            return Ok(None);
        }
        let preview = self.preview.take();
        let saved = match (context, preview) {
            (Some(context), Some(arrangement)) => self.persist(&context, arrangement),
            _ => Ok(None),
        };
        self.machine.transition(InteractionAction::FinishCommit);
        if let Err(err) = &saved {
            tracing::warn!(target: "gridweave.engine", error = %err, "commit failed");
        }
        saved
    }

    fn persist(
        &mut self,
        context: &InteractionContext,
        arrangement: Arrangement,
    ) -> Result<Option<Arrangement>> {
        let max_columns = self.model.max_columns();
        let positions = arrangement.positions();
        self.model.check_table(context.columns, &positions)?;

        let resized = match (context.kind, context.span) {
            (InteractionKind::Resize, Some(span)) => Some(span),
            _ => None,
        };
        // A resize below max_columns changes the declared size everywhere, so
        // the canonical arrangement is re-placed around the new span.
        let canonical = match resized {
            Some(span) if context.columns != max_columns => {
                Some(self.canonical_with_span(&context.item, span)?)
            }
            _ => None,
        };

        if let Some(span) = resized {
            self.model.update_item_size(&context.item, span)?;
        }
        if let Some(canonical) = canonical {
            self.model.save_layout(max_columns, canonical)?;
        }
        self.model.save_layout(context.columns, positions)?;
        if resized.is_some() {
            let cleared = self.model.clear_stale_overrides(context.columns);
            if !cleared.is_empty() {
                tracing::debug!(
                    target: "gridweave.engine",
                    item = %context.item,
                    cleared = ?cleared,
                    "overrides invalidated by resize"
                );
            }
        }
        tracing::debug!(
            target: "gridweave.engine",
            item = %context.item,
            kind = ?context.kind,
            columns = context.columns,
            "interaction committed"
        );
        Ok(Some(arrangement))
    }

    /// Canonical positions once `id` takes `span`, placed by the strategy at
    /// `max_columns`.
    fn canonical_with_span(&self, id: &ItemId, span: Span) -> Result<PositionTable> {
        let columns = self.model.max_columns();
        let mut base = self.model.arrangement_for(columns)?;
        let item = base.find_mut(id).ok_or_else(|| LayoutError::unknown(id))?;
        item.cell = clamp_target(item.cell, span, columns);
        let positions = self
            .strategy
            .compute_resize_layout(&base, id, span, columns)?
            .positions();
        self.model.check_table(columns, &positions)?;
        Ok(positions)
    }

    /// Abandon the active interaction. The model is untouched.
    pub fn cancel(&mut self) -> InteractionTransition {
        let transition = self.machine.transition(InteractionAction::CancelInteraction);
        if !transition.is_noop() {
            self.preview = None;
        }
        transition
    }

    /// Drop any selection and interaction, e.g. when the grid is unmounted.
    pub fn teardown(&mut self) -> Option<InteractionTransition> {
        self.preview = None;
        self.machine.reset()
    }

    /// React to a container resize.
    ///
    /// Returns the `(old, new)` column counts when the count changes. An
    /// active interaction is cancelled first, since its context refers to the
    /// old count.
    pub fn set_container_width(&mut self, width: u32) -> Result<Option<(u16, u16)>> {
        let old = self.model.current_columns();
        let new = self.ladder().columns_for_width(width);
        if old == new {
            return Ok(None);
        }
        if self.machine.is_active() {
            tracing::debug!(
                target: "gridweave.engine",
                old,
                new,
                "column change cancels active interaction"
            );
            if self.machine.phase() == InteractionPhase::Interacting {
                self.cancel();
            }
        }
        self.model.set_current_column_count(new)?;
        Ok(Some((old, new)))
    }
}

/// Keep an item of `span` inside `columns` with its top row at least 1.
#[must_use]
pub fn clamp_target(target: Cell, span: Span, columns: u16) -> Cell {
    let span = span.clamped_width(columns);
    let last_column = columns.max(1) - span.width() + 1;
    Cell::new(target.column.clamp(1, last_column), target.row.max(1))
}
