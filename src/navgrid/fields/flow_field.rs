//! The FlowField contains one steering vector per cell pointing the way an
//! agent standing in that cell should move to approach the nearest goal
//!
//! Derivation is a pure per-cell map over a populated [DistanceField]:
//! each cell picks the 8-connected neighbour with the strictly smallest
//! distance and emits the normalised grid-space offset towards it. Goal
//! cells, obstacles and unreached cells emit a zero vector. For a goal near
//! the centre the raw directions look like:
//!
//! ```text
//!  _____________________________
//! |     |     |     |     |     |
//! |  SE |  SE |  S  |  SW |  SW |
//! |_____|_____|_____|_____|_____|
//! |     |     |     |     |     |
//! |  SE |  SE |  S  |  SW |  SW |
//! |_____|_____|_____|_____|_____|
//! |     |     |     |     |     |
//! |  E  |  E  |  0  |  W  |  W  |
//! |_____|_____|_____|_____|_____|
//! |     |     |     |     |     |
//! |  NE |  NE |  N  |  NW |  NW |
//! |_____|_____|_____|_____|_____|
//! |     |     |     |     |     |
//! |  NE |  NE |  N  |  NW |  NW |
//! |_____|_____|_____|_____|_____|
//! ```
//!
//! The raw field is locked to 8 directions which reads as zig-zag steering,
//! so a smoothing pass replays the distance solver's visit order and blends
//! each vector with the one a cell ahead of it, which sits closer to a goal
//! and has already been smoothed by the time it is read
//!

use crate::prelude::*;
use bevy::prelude::*;

/// Weight of the downstream vector when blending during smoothing, the
/// remainder is the cell's own raw direction
const SMOOTHING_BLEND: f32 = 0.9;

/// Per-cell steering directions of the grid, unit vectors in grid space
/// where positive `y` points towards the row limit, zero for goals,
/// obstacles and unreached cells
#[derive(Component, Clone)]
pub struct FlowField(Vec<Vec2>);

impl Field<Vec2> for FlowField {
	/// Get a reference to the field array
	fn get(&self) -> &[Vec2] {
		&self.0
	}
	/// Retrieve a field cell value
	fn get_cell_value(&self, index: u32) -> Vec2 {
		if index as usize >= self.0.len() {
			panic!(
				"Cannot get a FlowField value, index out of bounds. Asked for index {}, field length is {}",
				index,
				self.0.len()
			)
		}
		self.0[index as usize]
	}
	/// Set a field cell to a value
	fn set_cell_value(&mut self, value: Vec2, index: u32) {
		if index as usize >= self.0.len() {
			panic!(
				"Cannot set a FlowField value, index out of bounds. Asked for index {}, field length is {}",
				index,
				self.0.len()
			)
		}
		self.0[index as usize] = value;
	}
}

impl FlowField {
	/// Create a new instance of [FlowField] sized to the layout where every
	/// cell starts with a zero vector
	pub fn new(layout: &GridLayout) -> Self {
		FlowField(vec![Vec2::ZERO; layout.get_cell_count() as usize])
	}
	/// Derive the steering direction of every cell from a populated
	/// [DistanceField]
	pub fn calculate(&mut self, distance: &DistanceField, layout: &GridLayout) {
		for index in 0..layout.get_cell_count() {
			let direction = Self::best_direction(distance, layout, index);
			self.set_cell_value(direction, index);
		}
	}
	/// Derive the steering directions across `threads` worker threads, each
	/// taking a contiguous arc of the index range. Cells only read the
	/// shared distance field and write their own slot so arcs never overlap
	pub fn calculate_arc(&mut self, distance: &DistanceField, layout: &GridLayout, threads: usize) {
		if self.0.is_empty() {
			return;
		}
		let chunk_len = self.0.len().div_ceil(threads.max(1));
		std::thread::scope(|scope| {
			for (chunk_id, chunk) in self.0.chunks_mut(chunk_len).enumerate() {
				let start = chunk_id * chunk_len;
				scope.spawn(move || {
					for (i, slot) in chunk.iter_mut().enumerate() {
						*slot = Self::best_direction(distance, layout, (start + i) as u32);
					}
				});
			}
		});
	}
	/// The direction of steepest distance descent of one cell: the first of
	/// the 8 offsets in table order whose neighbour holds the strictly
	/// smallest reached distance, zero when nothing improves on the cell's
	/// own distance
	fn best_direction(distance: &DistanceField, layout: &GridLayout, index: u32) -> Vec2 {
		if !distance.is_reached(index) {
			return Vec2::ZERO;
		}
		let mut best_distance = distance.get_cell_value(index);
		let mut best_ordinal = Ordinal::Zero;
		for (ordinal, offset) in ORDINAL_OFFSETS.iter() {
			let neighbour = layout.offset_index(index, *offset);
			if neighbour == INVALID_INDEX {
				continue;
			}
			let neighbour_distance = distance.get_cell_value(neighbour);
			if neighbour_distance < best_distance {
				best_distance = neighbour_distance;
				best_ordinal = *ordinal;
			}
		}
		best_ordinal.as_unit_vector()
	}
	/// Smooth the raw 8-way directions into gradual turns. Replays the
	/// solver's `visit_order` so a cell always blends with an already
	/// smoothed downstream vector: step one cell along the rounded own
	/// direction and blend towards whatever that cell steers, renormalised.
	/// Zero vectors and steps off the grid are left untouched
	pub fn smooth(&mut self, visit_order: &[u32], layout: &GridLayout) {
		for index in visit_order.iter() {
			let own = self.get_cell_value(*index);
			if own == Vec2::ZERO {
				continue;
			}
			let offset = (own.x.round() as i32, own.y.round() as i32);
			let target = layout.offset_index(*index, offset);
			if target == INVALID_INDEX {
				continue;
			}
			let downstream = self.get_cell_value(target);
			let blended =
				(own * (1.0 - SMOOTHING_BLEND) + downstream * SMOOTHING_BLEND).normalize_or_zero();
			if blended != Vec2::ZERO {
				self.set_cell_value(blended, *index);
			}
		}
	}
}
