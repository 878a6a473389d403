//! Measure an Eikonal DistanceField solve for a grid of uniform costs (open
//! space)
//!
//! Grid is 200x200 cells
//!

use bevy_flow_nav_plugin::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

/// Create the layout and CostField before benchmarking
fn prepare_fields(columns: u32, rows: u32, block_resolution: u32) -> (GridLayout, CostField) {
	let layout = GridLayout::new(columns, rows, 1.0, block_resolution);
	let cost_field = CostField::new(&layout);
	(layout, cost_field)
}

/// Solve the whole grid from a goal in the bottom left corner
fn eikonal(layout: GridLayout, cost_field: CostField) {
	let mut distance = DistanceField::new(&layout);
	distance.calculate_eikonal(
		&[GridCell::new(0, layout.get_rows() - 1)],
		&cost_field,
		&layout,
	);
}

pub fn criterion_benchmark(c: &mut Criterion) {
	let mut group = c.benchmark_group("algorithm_use");
	group.significance_level(0.05).sample_size(100);
	let (layout, cost_field) = prepare_fields(200, 200, 10);
	group.bench_function("calc_eikonal", |b| {
		b.iter(|| eikonal(black_box(layout), black_box(cost_field.clone())))
	});
	group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
