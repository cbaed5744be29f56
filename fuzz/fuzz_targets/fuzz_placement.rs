#![no_main]

use arbitrary::Arbitrary;
use gridweave_core::{Arrangement, Cell, GridItem, Span};
use gridweave_layout::{LayoutModel, compute_push_layout, compute_reflow_layout};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    columns: u8,
    sizes: Vec<(u8, u8)>,
    moves: Vec<(u8, u8, u8, bool)>,
}

fuzz_target!(|input: Input| {
    let columns = u16::from(input.columns % 12) + 1;
    if input.sizes.is_empty() || input.sizes.len() > 24 {
        return;
    }

    // Stack items one per band so the seed arrangement never overlaps.
    let mut row = 1;
    let items: Vec<GridItem> = input
        .sizes
        .iter()
        .enumerate()
        .map(|(i, &(w, h))| {
            let width = u16::from(w) % columns + 1;
            let height = u16::from(h % 4) + 1;
            let item = GridItem::new(
                format!("item-{i}"),
                Cell::new(1, row),
                Span::new(width, height).expect("non-zero span"),
            );
            row += height;
            item
        })
        .collect();
    let mut arrangement = Arrangement::new(items);

    for &(pick, column, target_row, reflow) in input.moves.iter().take(32) {
        let moved = &arrangement.items()[usize::from(pick) % arrangement.len()];
        let id = moved.id.clone();
        let width = moved.span.width();
        let target = Cell::new(
            u16::from(column) % (columns - width + 1) + 1,
            u16::from(target_row % 16) + 1,
        );
        arrangement = if reflow {
            compute_reflow_layout(&arrangement, &id, target, columns)
        } else {
            let next = compute_push_layout(&arrangement, &id, target, true);
            assert_eq!(next.find(&id).map(|i| i.cell), Some(target), "moved item off target");
            next
        };
        assert!(!arrangement.has_overlaps(), "overlap after move");
    }

    let model = LayoutModel::from_arrangement(columns, &arrangement).expect("model");
    for n in 1..columns {
        let derived = model.arrangement_for(n).expect("derived");
        assert!(!derived.has_overlaps(), "overlap after derivation");
    }
});
