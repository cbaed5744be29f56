#![no_main]

use arbitrary::Arbitrary;
use gridweave_core::{Cell, Span};
use gridweave_layout::{
    InteractionAction, InteractionKind, InteractionMachine, InteractionMode, InteractionPhase,
};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Op {
    Select(u8),
    Deselect,
    Start { keyboard: bool, resize: bool },
    Update { column: u8, row: u8, width: u8 },
    Commit,
    Finish,
    Cancel,
    Reset,
}

fuzz_target!(|ops: Vec<Op>| {
    let mut machine = InteractionMachine::new();
    for op in ops {
        let action = match op {
            Op::Select(id) => InteractionAction::Select {
                item: format!("item-{}", id % 8).into(),
            },
            Op::Deselect => InteractionAction::Deselect,
            Op::Start { keyboard, resize } => InteractionAction::StartInteraction {
                mode: if keyboard {
                    InteractionMode::Keyboard
                } else {
                    InteractionMode::Pointer
                },
                kind: if resize {
                    InteractionKind::Resize
                } else {
                    InteractionKind::Drag
                },
                columns: 4,
            },
            Op::Update { column, row, width } => InteractionAction::UpdateInteraction {
                target: Some(Cell::new(u16::from(column), u16::from(row))),
                span: Span::new(u16::from(width), 1),
            },
            Op::Commit => InteractionAction::CommitInteraction,
            Op::Finish => InteractionAction::FinishCommit,
            Op::Cancel => InteractionAction::CancelInteraction,
            Op::Reset => {
                machine.reset();
                continue;
            }
        };

        let before = machine.current_state().clone();
        let transition = machine.transition(action);
        if transition.is_noop() {
            assert_eq!(machine.current_state(), &before, "noop changed state");
        }

        let state = machine.current_state();
        match state.phase {
            InteractionPhase::Idle => {
                assert!(state.selected.is_none() && state.context.is_none());
            }
            InteractionPhase::Selected => {
                assert!(state.selected.is_some() && state.context.is_none());
            }
            InteractionPhase::Interacting | InteractionPhase::Committing => {
                let context = state.context.as_ref().expect("active phase has context");
                assert_eq!(Some(&context.item), state.selected.as_ref());
            }
        }
    }
});
