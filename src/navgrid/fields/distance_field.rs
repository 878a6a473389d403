//! The DistanceField contains one scalar per cell measuring propagation
//! cost-to-nearest-goal, produced by one of two solvers over a [CostField]
//! and a set of goal cells
//!
//! The flood solver performs a uniform-step multi-source wavefront: goals
//! are seeded at `0` and each relaxation adds `1`, producing integer ring
//! distances over the 4 cardinal neighbours. Suitable when cost only matters
//! as passable/impassable. For a goal near the centre the rings expand as:
//!
//! ```text
//!  _____________________________
//! |     |     |     |     |     |
//! |  4  |  3  |  2  |  3  |  4  |
//! |_____|_____|_____|_____|_____|
//! |     |     |     |     |     |
//! |  3  |  2  |  1  |  2  |  3  |
//! |_____|_____|_____|_____|_____|
//! |     |     |     |     |     |
//! |  2  |  1  |  0  |  1  |  2  |
//! |_____|_____|_____|_____|_____|
//! |     |     |     |     |     |
//! |  3  |  2  |  1  |  2  |  3  |
//! |_____|_____|_____|_____|_____|
//! |     |     |     |     |     |
//! |  4  |  3  |  2  |  3  |  4  |
//! |_____|_____|_____|_____|_____|
//! ```
//!
//! The Eikonal solver instead models continuous arrival time under a
//! cost-derived local speed, satisfying the discretised Eikonal equation
//! `|grad T| * speed = 1` with an upwind finite-difference scheme driven by
//! the Fast Iterative Method: cells carry an `Open`/`Narrow`/`Frozen` tag
//! and a narrow band of candidates is iterated until each cell's arrival
//! time converges, producing smoother cost-weighted times than the ring
//! approximation (a diagonal neighbour solves to ~1.707 rather than 2)
//!
//! Cells never reached by either solver keep [DISTANCE_UNVISITED] and
//! obstacle cells are pinned at [DISTANCE_OBSTACLE], neither is ever relaxed
//!

use crate::prelude::*;

/// Sentinel for cells no wavefront has reached
pub const DISTANCE_UNVISITED: f32 = f32::INFINITY;
/// Sentinel pinning impassable cells, distinct from [DISTANCE_UNVISITED] and
/// excluded from every relaxation
pub const DISTANCE_OBSTACLE: f32 = f32::MAX;
/// An Eikonal update within this threshold of the previous value counts as
/// converged, ties inside it must converge to avoid infinite re-queueing
const EIKONAL_CONVERGENCE: f32 = 0.01;
/// Capacity multiplier of the Eikonal frontier, the narrow band re-enqueues
/// unconverged cells so the queue is sized with margin over the cell count
const EIKONAL_FRONTIER_MARGIN: usize = 4;

/// Tri-state tag of a cell during the Eikonal narrow-band solve
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum CellState {
	/// Never touched
	Open,
	/// Candidate in the narrow band, arrival time may still improve
	Narrow,
	/// Arrival time accepted, will not be revisited
	Frozen,
}

/// Per-cell scalar distance/arrival-time to the nearest goal, plus the order
/// cells were accepted in - the smoothing pass replays that order so its
/// blending propagates outward from the goals
pub struct DistanceField {
	/// Scalar distance per cell, ring steps or arrival time depending on the
	/// solver that populated it
	distances: Vec<f32>,
	/// Cell indices in the order the solver first accepted them, goals first
	visit_order: Vec<u32>,
}

impl Field<f32> for DistanceField {
	/// Get a reference to the field array
	fn get(&self) -> &[f32] {
		&self.distances
	}
	/// Retrieve a field cell value
	fn get_cell_value(&self, index: u32) -> f32 {
		if index as usize >= self.distances.len() {
			panic!(
				"Cannot get a DistanceField value, index out of bounds. Asked for index {}, field length is {}",
				index,
				self.distances.len()
			)
		}
		self.distances[index as usize]
	}
	/// Set a field cell to a value
	fn set_cell_value(&mut self, value: f32, index: u32) {
		if index as usize >= self.distances.len() {
			panic!(
				"Cannot set a DistanceField value, index out of bounds. Asked for index {}, field length is {}",
				index,
				self.distances.len()
			)
		}
		self.distances[index as usize] = value;
	}
}

impl DistanceField {
	/// Create a new instance of [DistanceField] sized to the layout where
	/// every cell starts as [DISTANCE_UNVISITED]
	pub fn new(layout: &GridLayout) -> Self {
		DistanceField {
			distances: vec![DISTANCE_UNVISITED; layout.get_cell_count() as usize],
			visit_order: Vec::with_capacity(layout.get_cell_count() as usize),
		}
	}
	/// Reset all cells to [DISTANCE_UNVISITED] and clear the recorded visit
	/// order so the field can be recalculated
	pub fn reset(&mut self) {
		self.distances.fill(DISTANCE_UNVISITED);
		self.visit_order.clear();
	}
	/// Cell indices in the order the solver accepted them, goals first
	pub fn get_visit_order(&self) -> &[u32] {
		&self.visit_order
	}
	/// Whether the cell at `index` was reached by a wavefront, obstacle and
	/// unvisited cells are not
	pub fn is_reached(&self, index: u32) -> bool {
		self.get_cell_value(index) < DISTANCE_OBSTACLE
	}
	/// Pin every impassable cell of the `cost_field` at [DISTANCE_OBSTACLE]
	/// before a solve so no relaxation can touch it
	fn mask_obstacles(&mut self, cost_field: &CostField) {
		for (i, cost) in cost_field.get().iter().enumerate() {
			if *cost == COST_OBSTACLE {
				self.distances[i] = DISTANCE_OBSTACLE;
			}
		}
	}
	/// Populate the field with integer ring distances by multi-source
	/// uniform-step flood fill over the 4 cardinal neighbours. Goals outside
	/// the grid or on obstacles are ignored, an empty or unreachable goal
	/// set leaves the field all-unvisited which is a valid result
	pub fn calculate_flood(&mut self, goals: &[GridCell], cost_field: &CostField, layout: &GridLayout) {
		self.mask_obstacles(cost_field);
		// worst case for the uniform solver is every cell enqueued once
		let mut frontier = FrontierQueue::with_capacity(layout.get_cell_count() as usize);
		for goal in goals.iter() {
			let index = layout.to_index(*goal);
			if index == INVALID_INDEX {
				continue;
			}
			// skip duplicate goals and goals placed on obstacles
			if self.get_cell_value(index) <= 0.5 || cost_field.is_obstacle(index) {
				continue;
			}
			self.set_cell_value(0.0, index);
			self.visit_order.push(index);
			frontier.enqueue(index);
		}
		while let Some(index) = frontier.dequeue() {
			let next_distance = self.get_cell_value(index) + 1.0;
			for (_, offset) in ORDINAL_OFFSETS[..CARDINAL_OFFSET_COUNT].iter() {
				let neighbour = layout.offset_index(index, *offset);
				if neighbour == INVALID_INDEX {
					continue;
				}
				let current = self.get_cell_value(neighbour);
				// don't overwrite a cell with a worse distance, obstacles
				// are never relaxed
				if current != DISTANCE_OBSTACLE && next_distance < current {
					if current == DISTANCE_UNVISITED {
						self.visit_order.push(neighbour);
					}
					self.set_cell_value(next_distance, neighbour);
					frontier.enqueue(neighbour);
				}
			}
		}
	}
	/// Populate the field with continuous arrival times by the Fast
	/// Iterative Method narrow-band solve. Cost acts as a speed penalty,
	/// `speed = (256 - cost) / 255`, so the default cost of `1` travels at
	/// unit speed and arrival times approximate Euclidean cell distance
	pub fn calculate_eikonal(
		&mut self,
		goals: &[GridCell],
		cost_field: &CostField,
		layout: &GridLayout,
	) {
		self.mask_obstacles(cost_field);
		let total = layout.get_cell_count() as usize;
		let mut states = vec![CellState::Open; total];
		let mut frontier = FrontierQueue::with_capacity(total * EIKONAL_FRONTIER_MARGIN);
		// freeze the goals at arrival time zero
		for goal in goals.iter() {
			let index = layout.to_index(*goal);
			if index == INVALID_INDEX || cost_field.is_obstacle(index) {
				continue;
			}
			if states[index as usize] == CellState::Frozen {
				continue;
			}
			self.set_cell_value(0.0, index);
			states[index as usize] = CellState::Frozen;
			self.visit_order.push(index);
		}
		// promote the cardinal neighbours of the goals into the narrow band
		// with an initial candidate solve
		for goal in goals.iter() {
			let index = layout.to_index(*goal);
			if index == INVALID_INDEX || states.get(index as usize) != Some(&CellState::Frozen) {
				continue;
			}
			for (_, offset) in ORDINAL_OFFSETS[..CARDINAL_OFFSET_COUNT].iter() {
				let neighbour = layout.offset_index(index, *offset);
				if neighbour == INVALID_INDEX || cost_field.is_obstacle(neighbour) {
					continue;
				}
				if states[neighbour as usize] == CellState::Open {
					let candidate = self.solve_local_eikonal(neighbour, cost_field, layout);
					if candidate.is_finite() && candidate < self.get_cell_value(neighbour) {
						self.set_cell_value(candidate, neighbour);
					}
					states[neighbour as usize] = CellState::Narrow;
					frontier.enqueue(neighbour);
				}
			}
		}
		while let Some(index) = frontier.dequeue() {
			if states[index as usize] == CellState::Frozen || cost_field.is_obstacle(index) {
				continue;
			}
			let previous = self.get_cell_value(index);
			let improved = self.solve_local_eikonal(index, cost_field, layout);
			if improved.is_infinite() {
				// no finite upwind neighbour yet, try again later
				frontier.enqueue(index);
				continue;
			}
			if (improved - previous).abs() < EIKONAL_CONVERGENCE {
				// converged, accept and freeze
				self.set_cell_value(improved, index);
				states[index as usize] = CellState::Frozen;
				self.visit_order.push(index);
				// attempt to improve the unfrozen neighbours, promoting any
				// untouched ones into the narrow band when their candidate
				// strictly improves on their current time
				for (_, offset) in ORDINAL_OFFSETS[..CARDINAL_OFFSET_COUNT].iter() {
					let neighbour = layout.offset_index(index, *offset);
					if neighbour == INVALID_INDEX
						|| states[neighbour as usize] == CellState::Frozen
						|| cost_field.is_obstacle(neighbour)
					{
						continue;
					}
					let candidate = self.solve_local_eikonal(neighbour, cost_field, layout);
					if candidate.is_finite()
						&& self.get_cell_value(neighbour) - candidate > EIKONAL_CONVERGENCE
					{
						self.set_cell_value(candidate, neighbour);
						if states[neighbour as usize] == CellState::Open {
							states[neighbour as usize] = CellState::Narrow;
							frontier.enqueue(neighbour);
						}
					}
				}
			} else {
				// not converged yet, keep the better tentative time and run
				// another pass
				self.set_cell_value(improved, index);
				frontier.enqueue(index);
			}
		}
	}
	/// Solve the upwind finite-difference stencil for one cell from the
	/// smallest finite neighbour arrival time along each axis. With one
	/// valid axis the time is `min + 1/speed`; with two it is the larger
	/// root of `2T^2 - 2(t0+t1)T + t0^2 + t1^2 - 1/speed^2 = 0`, falling
	/// back to one axis when the discriminant is negative. Returns infinity
	/// when no axis carries a finite neighbour
	fn solve_local_eikonal(&self, index: u32, cost_field: &CostField, layout: &GridLayout) -> f32 {
		let speed = (256 - cost_field.get_cell_value(index) as i32) as f32 / 255.0;
		let inv_speed = 1.0 / speed;
		// per-axis minima of finite neighbour times, obstacle and unvisited
		// sentinels exceed DISTANCE_OBSTACLE's threshold and drop out
		let mut axis_times: [f32; 2] = [DISTANCE_UNVISITED; 2];
		for (axis, offsets) in [[(1, 0), (-1, 0)], [(0, 1), (0, -1)]].iter().enumerate() {
			for offset in offsets.iter() {
				let neighbour = layout.offset_index(index, *offset);
				if neighbour == INVALID_INDEX {
					continue;
				}
				let time = self.get_cell_value(neighbour);
				if time < DISTANCE_OBSTACLE && time < axis_times[axis] {
					axis_times[axis] = time;
				}
			}
		}
		if axis_times[1] < axis_times[0] {
			axis_times.swap(0, 1);
		}
		if axis_times[0].is_infinite() {
			return DISTANCE_UNVISITED;
		}
		if axis_times[1].is_infinite() {
			return axis_times[0] + inv_speed;
		}
		// two valid axes, take the larger root of the upwind quadratic
		let sum = axis_times[0] + axis_times[1];
		let sum_sq = axis_times[0] * axis_times[0] + axis_times[1] * axis_times[1];
		let a = 2.0;
		let b = -2.0 * sum;
		let c = sum_sq - inv_speed * inv_speed;
		let discriminant = b * b - 4.0 * a * c;
		if discriminant < 0.0 {
			// no solution across both axes, fall back to the smaller one
			axis_times[0] + inv_speed
		} else {
			(-b + discriminant.sqrt()) / (2.0 * a)
		}
	}
}
