//! Benchmarks for push, reflow, and breakpoint derivation.
//!
//! Run with: cargo bench -p gridweave-layout

use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use gridweave_core::{Arrangement, Cell, GridItem, Span};
use gridweave_layout::{
    LayoutModel, compact_arrangement, compute_push_layout, compute_reflow_layout,
    emit_layout_descriptions,
};
use std::hint::black_box;

/// `n` items packed into `columns`, mixing 1x1, 2x1 and 1x2 spans.
fn make_grid(n: usize, columns: u16) -> Arrangement {
    let mut items = Vec::with_capacity(n);
    let mut column = 1;
    let mut row = 1;
    for i in 0..n {
        let (width, height) = match i % 3 {
            0 => (1, 1),
            1 => (2, 1),
            _ => (1, 2),
        };
        if column + width - 1 > columns {
            column = 1;
            row += 2;
        }
        items.push(GridItem::new(
            format!("item-{i}"),
            Cell::new(column, row),
            Span::new(width, height).unwrap(),
        ));
        column += width;
    }
    Arrangement::new(items)
}

fn bench_push(c: &mut Criterion) {
    let mut group = c.benchmark_group("placement/push");

    for n in [10, 50, 200] {
        let grid = make_grid(n, 12);
        let last = grid.items()[n - 1].id.clone();
        group.bench_with_input(BenchmarkId::new("to_origin", n), &grid, |b, grid| {
            b.iter(|| black_box(compute_push_layout(grid, &last, Cell::ORIGIN, true)))
        });
        group.bench_with_input(BenchmarkId::new("no_compact", n), &grid, |b, grid| {
            b.iter(|| black_box(compute_push_layout(grid, &last, Cell::ORIGIN, false)))
        });
    }

    group.finish();
}

fn bench_compaction(c: &mut Criterion) {
    let mut group = c.benchmark_group("placement/compaction");

    for n in [10, 50, 200] {
        let spread: Arrangement = make_grid(n, 12)
            .into_iter()
            .map(|mut item| {
                item.cell.row *= 2;
                item
            })
            .collect();
        group.bench_with_input(BenchmarkId::new("spread", n), &spread, |b, spread| {
            b.iter_batched(
                || spread.clone(),
                |mut arrangement| black_box(compact_arrangement(&mut arrangement, None, 100)),
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_reflow(c: &mut Criterion) {
    let mut group = c.benchmark_group("placement/reflow");

    for n in [10, 50, 200] {
        let grid = make_grid(n, 12);
        let last = grid.items()[n - 1].id.clone();
        group.bench_with_input(BenchmarkId::new("last_to_front", n), &grid, |b, grid| {
            b.iter(|| black_box(compute_reflow_layout(grid, &last, Cell::ORIGIN, 12)))
        });
    }

    group.finish();
}

fn bench_derivation(c: &mut Criterion) {
    let mut group = c.benchmark_group("placement/derive");

    for n in [10, 50, 200] {
        let model = LayoutModel::from_arrangement(12, &make_grid(n, 12)).unwrap();
        group.bench_with_input(BenchmarkId::new("four_columns", n), &model, |b, model| {
            b.iter(|| black_box(model.arrangement_for(4)))
        });
        group.bench_with_input(BenchmarkId::new("all_descriptions", n), &model, |b, model| {
            b.iter(|| black_box(emit_layout_descriptions(model, 80, 16)))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_push,
    bench_compaction,
    bench_reflow,
    bench_derivation,
);

criterion_main!(benches);
