#![forbid(unsafe_code)]

//! Interaction lifecycle state machine for selecting, dragging, and resizing
//! grid items.
//!
//! ```text
//! Idle -> Selected -> Interacting -> Committing -> Selected -> Idle
//!                          \------> Selected (cancel)
//! ```
//!
//! Transitions fired from a phase that does not accept them are no-ops: the
//! state is left untouched and the returned [`InteractionTransition`] carries
//! an [`InteractionEffect::Noop`] with the reason. Callers may fire
//! transitions speculatively.
//!
//! The machine holds at most one [`InteractionContext`], so two interactions
//! can never be in flight at once.

use gridweave_core::{Cell, ItemId, Span};
use serde::{Deserialize, Serialize};

/// How the interaction is being driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionMode {
    /// Direct manipulation (pointer or touch).
    Pointer,
    /// Discrete steps (keyboard).
    Keyboard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    Drag,
    Resize,
}

/// In-flight drag or resize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionContext {
    pub item: ItemId,
    pub mode: InteractionMode,
    pub kind: InteractionKind,
    /// Column count in effect when the interaction started.
    pub columns: u16,
    /// Latest requested cell.
    pub target: Option<Cell>,
    /// Latest requested span.
    pub span: Option<Span>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionPhase {
    Idle,
    Selected,
    Interacting,
    Committing,
}

/// Full machine state: phase, selection, and context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionState {
    pub phase: InteractionPhase,
    pub selected: Option<ItemId>,
    pub context: Option<InteractionContext>,
}

impl Default for InteractionState {
    fn default() -> Self {
        Self {
            phase: InteractionPhase::Idle,
            selected: None,
            context: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum InteractionAction {
    Select {
        item: ItemId,
    },
    Deselect,
    StartInteraction {
        mode: InteractionMode,
        kind: InteractionKind,
        columns: u16,
    },
    UpdateInteraction {
        target: Option<Cell>,
        span: Option<Span>,
    },
    CommitInteraction,
    FinishCommit,
    CancelInteraction,
}

/// Why an action was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionNoopReason {
    NothingSelected,
    InteractionInProgress,
    NotInteracting,
    NotCommitting,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum InteractionEffect {
    Selected {
        item: ItemId,
        previous: Option<ItemId>,
    },
    Deselected {
        item: ItemId,
    },
    Started {
        item: ItemId,
        mode: InteractionMode,
        kind: InteractionKind,
    },
    Updated {
        item: ItemId,
        target: Option<Cell>,
        span: Option<Span>,
    },
    CommitRequested {
        item: ItemId,
    },
    Finished {
        item: ItemId,
    },
    Canceled {
        item: Option<ItemId>,
    },
    Noop {
        reason: InteractionNoopReason,
    },
}

/// One machine step with before/after phases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionTransition {
    pub transition_id: u64,
    pub from: InteractionPhase,
    pub to: InteractionPhase,
    pub effect: InteractionEffect,
}

impl InteractionTransition {
    #[must_use]
    pub fn is_noop(&self) -> bool {
        matches!(self.effect, InteractionEffect::Noop { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InteractionMachine {
    state: InteractionState,
    transition_counter: u64,
}

impl InteractionMachine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn current_state(&self) -> &InteractionState {
        &self.state
    }

    #[must_use]
    pub fn phase(&self) -> InteractionPhase {
        self.state.phase
    }

    #[must_use]
    pub fn selected(&self) -> Option<&ItemId> {
        self.state.selected.as_ref()
    }

    #[must_use]
    pub fn context(&self) -> Option<&InteractionContext> {
        self.state.context.as_ref()
    }

    /// Whether a drag or resize is in flight (interacting or committing).
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(
            self.state.phase,
            InteractionPhase::Interacting | InteractionPhase::Committing
        )
    }

    /// Apply one action.
    pub fn transition(&mut self, action: InteractionAction) -> InteractionTransition {
        let from = self.state.phase;
        let effect = self.apply(action);
        self.transition_counter = self.transition_counter.saturating_add(1);
        let transition = InteractionTransition {
            transition_id: self.transition_counter,
            from,
            to: self.state.phase,
            effect,
        };
        if let InteractionEffect::Noop { reason } = transition.effect {
            tracing::debug!(
                target: "gridweave.interaction",
                phase = ?from,
                ?reason,
                "transition ignored"
            );
        } else {
            tracing::debug!(
                target: "gridweave.interaction",
                from = ?transition.from,
                to = ?transition.to,
                transition_id = transition.transition_id,
                "transition applied"
            );
        }
        transition
    }

    fn apply(&mut self, action: InteractionAction) -> InteractionEffect {
        use InteractionPhase as P;

        let noop = |reason| InteractionEffect::Noop { reason };
        let state = &mut self.state;

        match (state.phase, action) {
            (P::Idle | P::Selected, InteractionAction::Select { item }) => {
                let previous = state.selected.replace(item.clone());
                state.phase = P::Selected;
                InteractionEffect::Selected { item, previous }
            }
            (_, InteractionAction::Select { .. }) => noop(InteractionNoopReason::InteractionInProgress),

            (P::Selected, InteractionAction::Deselect) => {
                let Some(item) = state.selected.take() else {
                    return noop(InteractionNoopReason::NothingSelected);
                };
                state.phase = P::Idle;
                InteractionEffect::Deselected { item }
            }
            (P::Idle, InteractionAction::Deselect) => noop(InteractionNoopReason::NothingSelected),
            (_, InteractionAction::Deselect) => noop(InteractionNoopReason::InteractionInProgress),

            (P::Selected, InteractionAction::StartInteraction { mode, kind, columns }) => {
                let Some(item) = state.selected.clone() else {
                    return noop(InteractionNoopReason::NothingSelected);
                };
                state.context = Some(InteractionContext {
                    item: item.clone(),
                    mode,
                    kind,
                    columns,
                    target: None,
                    span: None,
                });
                state.phase = P::Interacting;
                InteractionEffect::Started { item, mode, kind }
            }
            (P::Idle, InteractionAction::StartInteraction { .. }) => {
                noop(InteractionNoopReason::NothingSelected)
            }
            (_, InteractionAction::StartInteraction { .. }) => {
                noop(InteractionNoopReason::InteractionInProgress)
            }

            (P::Interacting, InteractionAction::UpdateInteraction { target, span }) => {
                match state.context.as_mut() {
                    Some(context) => {
                        if target.is_some() {
                            context.target = target;
                        }
                        if span.is_some() {
                            context.span = span;
                        }
                        InteractionEffect::Updated {
                            item: context.item.clone(),
                            target: context.target,
                            span: context.span,
                        }
                    }
                    None => noop(InteractionNoopReason::NotInteracting),
                }
            }
            (P::Interacting, InteractionAction::CommitInteraction) => {
                let Some(item) = state.context.as_ref().map(|c| c.item.clone()) else {
                    return noop(InteractionNoopReason::NotInteracting);
                };
                state.phase = P::Committing;
                InteractionEffect::CommitRequested { item }
            }
            (P::Interacting, InteractionAction::CancelInteraction) => {
                state.phase = P::Selected;
                let item = state.context.take().map(|c| c.item);
                InteractionEffect::Canceled { item }
            }
            (
                _,
                InteractionAction::UpdateInteraction { .. }
                | InteractionAction::CommitInteraction
                | InteractionAction::CancelInteraction,
            ) => noop(InteractionNoopReason::NotInteracting),

            (P::Committing, InteractionAction::FinishCommit) => {
                let Some(context) = state.context.take() else {
                    return noop(InteractionNoopReason::NotCommitting);
                };
                state.phase = P::Selected;
                InteractionEffect::Finished { item: context.item }
            }
            (_, InteractionAction::FinishCommit) => noop(InteractionNoopReason::NotCommitting),
        }
    }

    /// Force the machine back to `Idle` (teardown).
    ///
    /// Returns a `Canceled` transition if an interaction or selection was
    /// dropped, `None` if already idle.
    pub fn reset(&mut self) -> Option<InteractionTransition> {
        let from = self.state.phase;
        if from == InteractionPhase::Idle {
            return None;
        }
        let item = self
            .state
            .context
            .take()
            .map(|c| c.item)
            .or_else(|| self.state.selected.clone());
        self.state = InteractionState::default();
        self.transition_counter = self.transition_counter.saturating_add(1);
        Some(InteractionTransition {
            transition_id: self.transition_counter,
            from,
            to: InteractionPhase::Idle,
            effect: InteractionEffect::Canceled { item },
        })
    }
}

/// One-cell step for keyboard-driven moves and resizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Nudge {
    Left,
    Right,
    Up,
    Down,
}

/// Cell one step away from `cell` in `direction`, kept inside `columns`
/// for an item of width `span.width()`.
#[must_use]
pub fn nudge_target(cell: Cell, span: Span, direction: Nudge, columns: u16) -> Cell {
    let span = span.clamped_width(columns);
    let last_column = columns.max(1) - span.width() + 1;
    let mut next = cell;
    match direction {
        Nudge::Left => next.column = next.column.saturating_sub(1),
        Nudge::Right => next.column = next.column.saturating_add(1),
        Nudge::Up => next.row = next.row.saturating_sub(1),
        Nudge::Down => next.row = next.row.saturating_add(1),
    }
    next.column = next.column.clamp(1, last_column);
    next.row = next.row.max(1);
    next
}

/// Span grown or shrunk by one cell: right/down grow, left/up shrink.
///
/// Width never exceeds the columns remaining from `cell`; neither axis drops
/// below 1.
#[must_use]
pub fn nudge_span(cell: Cell, span: Span, direction: Nudge, columns: u16) -> Span {
    let max_width = columns.saturating_sub(cell.column).saturating_add(1).max(1);
    let (width, height) = match direction {
        Nudge::Left => (span.width().saturating_sub(1), span.height()),
        Nudge::Right => (span.width().saturating_add(1), span.height()),
        Nudge::Up => (span.width(), span.height().saturating_sub(1)),
        Nudge::Down => (span.width(), span.height().saturating_add(1)),
    };
    Span::new(width.clamp(1, max_width), height.max(1)).unwrap_or(span)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn select(item: &str) -> InteractionAction {
        InteractionAction::Select { item: item.into() }
    }

    fn start(kind: InteractionKind) -> InteractionAction {
        InteractionAction::StartInteraction {
            mode: InteractionMode::Pointer,
            kind,
            columns: 4,
        }
    }

    #[test]
    fn full_commit_cycle() {
        let mut machine = InteractionMachine::new();
        assert_eq!(machine.phase(), InteractionPhase::Idle);

        machine.transition(select("a"));
        machine.transition(start(InteractionKind::Drag));
        assert!(machine.is_active());
        machine.transition(InteractionAction::UpdateInteraction {
            target: Some(Cell::new(2, 3)),
            span: None,
        });
        assert_eq!(machine.context().unwrap().target, Some(Cell::new(2, 3)));

        let commit = machine.transition(InteractionAction::CommitInteraction);
        assert_eq!(commit.to, InteractionPhase::Committing);
        let finish = machine.transition(InteractionAction::FinishCommit);
        assert_eq!(
            finish.effect,
            InteractionEffect::Finished { item: "a".into() }
        );
        assert_eq!(machine.phase(), InteractionPhase::Selected);
        assert!(machine.context().is_none());

        machine.transition(InteractionAction::Deselect);
        assert_eq!(machine.phase(), InteractionPhase::Idle);
        assert!(machine.selected().is_none());
    }

    #[test]
    fn cancel_returns_to_selected_without_context() {
        let mut machine = InteractionMachine::new();
        machine.transition(select("a"));
        machine.transition(start(InteractionKind::Resize));
        let cancel = machine.transition(InteractionAction::CancelInteraction);
        assert_eq!(cancel.effect, InteractionEffect::Canceled { item: Some("a".into()) });
        assert_eq!(machine.phase(), InteractionPhase::Selected);
        assert!(machine.context().is_none());
        assert_eq!(machine.selected(), Some(&ItemId::from("a")));
    }

    #[test]
    fn commit_from_idle_is_noop() {
        let mut machine = InteractionMachine::new();
        let before = machine.current_state().clone();
        let transition = machine.transition(InteractionAction::CommitInteraction);
        assert!(transition.is_noop());
        assert_eq!(
            transition.effect,
            InteractionEffect::Noop {
                reason: InteractionNoopReason::NotInteracting
            }
        );
        assert_eq!(machine.current_state(), &before);
    }

    #[test]
    fn select_during_interaction_is_noop() {
        let mut machine = InteractionMachine::new();
        machine.transition(select("a"));
        machine.transition(start(InteractionKind::Drag));
        let t = machine.transition(select("b"));
        assert!(t.is_noop());
        assert_eq!(machine.selected(), Some(&ItemId::from("a")));
        assert!(machine.transition(start(InteractionKind::Drag)).is_noop());
    }

    #[test]
    fn reselect_replaces_selection() {
        let mut machine = InteractionMachine::new();
        machine.transition(select("a"));
        let t = machine.transition(select("b"));
        assert_eq!(
            t.effect,
            InteractionEffect::Selected {
                item: "b".into(),
                previous: Some("a".into())
            }
        );
    }

    #[test]
    fn guards_reject_out_of_phase_actions() {
        let mut machine = InteractionMachine::new();
        assert!(machine.transition(InteractionAction::Deselect).is_noop());
        assert!(machine.transition(start(InteractionKind::Drag)).is_noop());
        assert!(machine.transition(InteractionAction::FinishCommit).is_noop());
        assert!(machine.transition(InteractionAction::CancelInteraction).is_noop());
        machine.transition(select("a"));
        assert!(machine.transition(InteractionAction::FinishCommit).is_noop());
        machine.transition(start(InteractionKind::Drag));
        machine.transition(InteractionAction::CommitInteraction);
        assert!(machine.transition(InteractionAction::CancelInteraction).is_noop());
        assert!(machine.transition(InteractionAction::Deselect).is_noop());
        assert_eq!(machine.phase(), InteractionPhase::Committing);
    }

    #[test]
    fn transition_ids_increase() {
        let mut machine = InteractionMachine::new();
        let a = machine.transition(select("a")).transition_id;
        let b = machine.transition(InteractionAction::FinishCommit).transition_id;
        assert!(b > a);
    }

    #[test]
    fn reset_drops_everything() {
        let mut machine = InteractionMachine::new();
        assert!(machine.reset().is_none());
        machine.transition(select("a"));
        machine.transition(start(InteractionKind::Drag));
        let t = machine.reset().unwrap();
        assert_eq!(t.from, InteractionPhase::Interacting);
        assert_eq!(machine.current_state(), &InteractionState::default());
    }

    #[test]
    fn actions_serialize_with_tags() {
        let json = serde_json::to_string(&InteractionAction::CommitInteraction).unwrap();
        assert_eq!(json, r#"{"action":"commit_interaction"}"#);
    }

    #[test]
    fn nudge_target_stays_inside_grid() {
        let span = Span::new(2, 1).unwrap();
        assert_eq!(nudge_target(Cell::new(3, 1), span, Nudge::Right, 4), Cell::new(3, 1));
        assert_eq!(nudge_target(Cell::new(2, 1), span, Nudge::Right, 4), Cell::new(3, 1));
        assert_eq!(nudge_target(Cell::new(1, 1), span, Nudge::Left, 4), Cell::new(1, 1));
        assert_eq!(nudge_target(Cell::new(1, 1), span, Nudge::Up, 4), Cell::new(1, 1));
        assert_eq!(nudge_target(Cell::new(1, 1), span, Nudge::Down, 4), Cell::new(1, 2));
    }

    #[test]
    fn nudge_span_respects_bounds() {
        let cell = Cell::new(3, 1);
        let span = Span::new(2, 1).unwrap();
        assert_eq!(nudge_span(cell, span, Nudge::Right, 4), span);
        assert_eq!(nudge_span(cell, span, Nudge::Left, 4), Span::UNIT);
        assert_eq!(nudge_span(cell, Span::UNIT, Nudge::Up, 4), Span::UNIT);
        assert_eq!(
            nudge_span(cell, span, Nudge::Down, 4),
            Span::new(2, 2).unwrap()
        );
    }
}
