//! The [GridLayout] describes the geometry of the navigation grid and owns
//! the bijective mapping between `(column, row)` coordinates and flat cell
//! indices
//!
//! Indices are block-tiled rather than row-major: the grid is partitioned
//! into square blocks of `block_resolution x block_resolution` cells and the
//! cells of one block occupy a contiguous index range. The distance solvers
//! repeatedly visit near neighbours, so keeping a neighbourhood within one or
//! two cache lines matters. For a `4x4` grid with `block_resolution` 2 the
//! indices are laid out as:
//!
//! ```text
//!  _____________________
//! |     |     |     |     |
//! |  0  |  1  |  4  |  5  |
//! |_____|_____|_____|_____|
//! |     |     |     |     |
//! |  2  |  3  |  6  |  7  |
//! |_____|_____|_____|_____|
//! |     |     |     |     |
//! |  8  |  9  | 12  | 13  |
//! |_____|_____|_____|_____|
//! |     |     |     |     |
//! | 10  | 11  | 14  | 15  |
//! |_____|_____|_____|_____|
//! ```
//!
//! Coordinates outside the grid map to the sentinel [INVALID_INDEX] rather
//! than faulting so that neighbour lookups treat off-grid cells as
//! unreachable
//!

use crate::prelude::*;
use bevy::prelude::*;

/// Sentinel returned by index calculations for out-of-grid coordinates
pub const INVALID_INDEX: u32 = u32::MAX;

/// The geometry of the navigation grid: world dimensions, cell dimensions
/// and the block tiling used for cell indexing
#[derive(Component, Clone, Copy, Reflect)]
pub struct GridLayout {
	/// Dimensions of the world in world units, `x` length by `y` depth,
	/// centred on the origin
	world_size: Vec2,
	/// Length of one square cell in world units
	cell_size: f32,
	/// Number of cells along the `(column, row)` axes
	cell_count: (u32, u32),
	/// Number of cells along one axis of a locality block
	block_resolution: u32,
	/// Number of blocks along the `(column, row)` axes
	block_count: (u32, u32),
}

impl GridLayout {
	/// Create a new instance of [GridLayout] from cell counts. Panics if
	/// either axis is not an exact multiple of `block_resolution` - the
	/// tiling invariant `cell_count = block_count * block_resolution` must
	/// hold on both axes
	pub fn new(columns: u32, rows: u32, cell_size: f32, block_resolution: u32) -> Self {
		if block_resolution == 0 {
			panic!("Block resolution cannot be zero");
		}
		if cell_size <= 0.0 {
			panic!("Cell size must be greater than zero");
		}
		let column_rem = columns % block_resolution;
		let row_rem = rows % block_resolution;
		if column_rem > 0 || row_rem > 0 {
			panic!(
				"Grid dimensions `({}, {})` cannot support blocks, dimensions must be exact factors of {}",
				columns, rows, block_resolution
			);
		}
		GridLayout {
			world_size: Vec2::new(columns as f32 * cell_size, rows as f32 * cell_size),
			cell_size,
			cell_count: (columns, rows),
			block_resolution,
			block_count: (columns / block_resolution, rows / block_resolution),
		}
	}
	/// Get the world dimensions
	pub fn get_world_size(&self) -> Vec2 {
		self.world_size
	}
	/// Get the length of one cell in world units
	pub fn get_cell_size(&self) -> f32 {
		self.cell_size
	}
	/// Number of cell columns
	pub fn get_columns(&self) -> u32 {
		self.cell_count.0
	}
	/// Number of cell rows
	pub fn get_rows(&self) -> u32 {
		self.cell_count.1
	}
	/// Total number of cells in the grid
	pub fn get_cell_count(&self) -> u32 {
		self.cell_count.0 * self.cell_count.1
	}
	/// Number of cells along one axis of a locality block
	pub fn get_block_resolution(&self) -> u32 {
		self.block_resolution
	}
	/// Number of blocks along the `(column, row)` axes
	pub fn get_block_count(&self) -> (u32, u32) {
		self.block_count
	}
	/// Convert a cell coordinate into its block-tiled flat index. Returns
	/// [INVALID_INDEX] for coordinates outside the grid
	pub fn to_index(&self, cell: GridCell) -> u32 {
		let (column, row) = cell.get_column_row();
		if column >= self.cell_count.0 || row >= self.cell_count.1 {
			return INVALID_INDEX;
		}
		let res = self.block_resolution;
		let block = (row / res) * self.block_count.0 + column / res;
		let local = (row % res) * res + column % res;
		block * res * res + local
	}
	/// Convert a block-tiled flat index back into a cell coordinate. Returns
	/// [None] for indices outside the grid
	pub fn to_coord(&self, index: u32) -> Option<GridCell> {
		if index >= self.get_cell_count() {
			return None;
		}
		let res = self.block_resolution;
		let cells_per_block = res * res;
		let block = index / cells_per_block;
		let local = index % cells_per_block;
		let column = (block % self.block_count.0) * res + local % res;
		let row = (block / self.block_count.0) * res + local / res;
		Some(GridCell::new(column, row))
	}
	/// Convert a cell coordinate into a row-major flat index. Returns
	/// [INVALID_INDEX] for coordinates outside the grid. Kept alongside the
	/// block-tiled variant for layout-independent consumers, both variants
	/// agree on validity and on the shared [ORDINAL_OFFSETS] table
	pub fn to_index_flat(&self, cell: GridCell) -> u32 {
		let (column, row) = cell.get_column_row();
		if column >= self.cell_count.0 || row >= self.cell_count.1 {
			return INVALID_INDEX;
		}
		row * self.cell_count.0 + column
	}
	/// Convert a row-major flat index back into a cell coordinate. Returns
	/// [None] for indices outside the grid
	pub fn to_coord_flat(&self, index: u32) -> Option<GridCell> {
		if index >= self.get_cell_count() {
			return None;
		}
		Some(GridCell::new(
			index % self.cell_count.0,
			index / self.cell_count.0,
		))
	}
	/// From a cell index find the index of the neighbour at the given
	/// `(column, row)` offset. Returns [INVALID_INDEX] when either the index
	/// or the offset target falls outside the grid, so off-grid neighbours
	/// are skipped by the caller as unreachable
	pub fn offset_index(&self, index: u32, offset: (i32, i32)) -> u32 {
		let Some(cell) = self.to_coord(index) else {
			return INVALID_INDEX;
		};
		let column = cell.get_column() as i32 + offset.0;
		let row = cell.get_row() as i32 + offset.1;
		if column < 0 || row < 0 {
			return INVALID_INDEX;
		}
		self.to_index(GridCell::new(column as u32, row as u32))
	}
	/// From a position in 2D `x, y` space with the world centred at the
	/// origin calculate the cell that point resides in. Returns [None] when
	/// the position sits outside of the world
	pub fn world_to_cell(&self, position: Vec2) -> Option<GridCell> {
		let half = self.world_size / 2.0;
		if position.x < -half.x || position.x > half.x || position.y < -half.y || position.y > half.y
		{
			error!("Position is out of bounds of GridLayout, x {}, y {}, cannot calculate GridCell. Is the actor outside of the map or trying to request a goal outside of it?", position.x, position.y);
			return None;
		}
		// reposition into a coordinate system with origin in the top left,
		// rows approach the negative y of real space
		let x_origin = position.x + half.x;
		let y_origin = half.y - position.y;
		let mut column = (x_origin / self.cell_size).floor() as u32;
		let mut row = (y_origin / self.cell_size).floor() as u32;
		// safety for x-y being at the exact limits of the world size
		if column >= self.cell_count.0 {
			column = self.cell_count.0 - 1;
		}
		if row >= self.cell_count.1 {
			row = self.cell_count.1 - 1;
		}
		Some(GridCell::new(column, row))
	}
	/// From a cell retrieve the 2D position of its centre in real space. If
	/// the cell sits outside of the grid then [None] is returned
	pub fn cell_to_world(&self, cell: GridCell) -> Option<Vec2> {
		if cell.get_column() >= self.cell_count.0 || cell.get_row() >= self.cell_count.1 {
			return None;
		}
		let half = self.world_size / 2.0;
		// NB: add half of the cell size to each coord to obtain the centre
		// position of the cell, rows grow towards negative y
		let x = -half.x + cell.get_column() as f32 * self.cell_size + self.cell_size / 2.0;
		let y = half.y - (cell.get_row() as f32 * self.cell_size + self.cell_size / 2.0);
		Some(Vec2::new(x, y))
	}
}

// #[rustfmt::skip]
#[cfg(test)]
mod tests {
	use super::*;
	#[test]
	fn round_trip_all_valid_coords() {
		let layout = GridLayout::new(12, 8, 1.0, 4);
		for column in 0..12 {
			for row in 0..8 {
				let cell = GridCell::new(column, row);
				let index = layout.to_index(cell);
				assert_ne!(INVALID_INDEX, index);
				assert_eq!(Some(cell), layout.to_coord(index));
			}
		}
	}
	#[test]
	fn out_of_range_coord_is_invalid() {
		let layout = GridLayout::new(8, 8, 1.0, 4);
		assert_eq!(INVALID_INDEX, layout.to_index(GridCell::new(8, 0)));
		assert_eq!(INVALID_INDEX, layout.to_index(GridCell::new(0, 8)));
		assert_eq!(None, layout.to_coord(64));
	}
	#[test]
	fn block_cells_are_contiguous() {
		let layout = GridLayout::new(8, 8, 1.0, 4);
		// every cell of the top-left block indexes below the block size
		for column in 0..4 {
			for row in 0..4 {
				let index = layout.to_index(GridCell::new(column, row));
				assert!(index < 16);
			}
		}
		// and the next block along occupies the following range
		for column in 4..8 {
			for row in 0..4 {
				let index = layout.to_index(GridCell::new(column, row));
				assert!((16..32).contains(&index));
			}
		}
	}
	#[test]
	fn flat_and_tiled_agree_on_validity() {
		let layout = GridLayout::new(8, 4, 1.0, 4);
		for column in 0..9 {
			for row in 0..5 {
				let cell = GridCell::new(column, row);
				let tiled = layout.to_index(cell);
				let flat = layout.to_index_flat(cell);
				assert_eq!(tiled == INVALID_INDEX, flat == INVALID_INDEX);
				if flat != INVALID_INDEX {
					assert_eq!(Some(cell), layout.to_coord_flat(flat));
				}
			}
		}
	}
	#[test]
	fn offset_walks_off_grid() {
		let layout = GridLayout::new(4, 4, 1.0, 2);
		let origin = layout.to_index(GridCell::new(0, 0));
		assert_eq!(INVALID_INDEX, layout.offset_index(origin, (-1, 0)));
		assert_eq!(INVALID_INDEX, layout.offset_index(origin, (0, -1)));
		let east = layout.offset_index(origin, (1, 0));
		assert_eq!(Some(GridCell::new(1, 0)), layout.to_coord(east));
	}
	#[test]
	fn offset_crosses_block_boundary() {
		let layout = GridLayout::new(4, 4, 1.0, 2);
		let index = layout.to_index(GridCell::new(1, 1));
		let east = layout.offset_index(index, (1, 0));
		assert_eq!(Some(GridCell::new(2, 1)), layout.to_coord(east));
	}
	#[test]
	#[should_panic]
	fn invalid_block_resolution() {
		GridLayout::new(10, 10, 1.0, 4);
	}
	#[test]
	fn world_to_cell_centre() {
		let layout = GridLayout::new(4, 4, 10.0, 2);
		// world is 40x40 centred on origin, top left cell spans x -20..-10, y 10..20
		let cell = layout.world_to_cell(Vec2::new(-15.0, 15.0)).unwrap();
		assert_eq!(GridCell::new(0, 0), cell);
		let centre = layout.cell_to_world(cell).unwrap();
		assert_eq!(Vec2::new(-15.0, 15.0), centre);
	}
	#[test]
	fn world_to_cell_out_of_bounds() {
		let layout = GridLayout::new(4, 4, 10.0, 2);
		assert_eq!(None, layout.world_to_cell(Vec2::new(25.0, 0.0)));
	}
}
