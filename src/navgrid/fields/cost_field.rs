//! The CostField contains one 8-bit value per cell corresponding to the cost
//! of traversing that cell. A value of 1 is the default, a value of 255 is a
//! special case that indicates the cell is strictly forbidden from being used
//! in any calculation (effectively saying there is a wall or cliff/impassable
//! terrain there). Any other value indicates a harder cost of movement which
//! could be from a slope or marshland or others - the Eikonal solver treats
//! it as a speed penalty while the flood solver only uses it to mask
//! obstacles. An example cost field may look:
//!
//! ```text
//!  _____________________________________
//! |     |     |     |     |     |     |
//! |  1  |  1  |  1  | 255 |  1  |  1  |
//! |_____|_____|_____|_____|_____|_____|
//! |     |     |     |     |     |     |
//! |  1  | 120 |  1  | 255 |  1  |  1  |
//! |_____|_____|_____|_____|_____|_____|
//! |     |     |     |     |     |     |
//! |  1  |  1  |  1  | 255 | 255 |  1  |
//! |_____|_____|_____|_____|_____|_____|
//! |     |     |     |     |     |     |
//! |  1  |  1  |  1  |  1  |  1  |  1  |
//! |_____|_____|_____|_____|_____|_____|
//! ```
//!
//! The field is owned by the terrain/world collaborator and is read-only to
//! the solvers, mutations happen between queries via the cost layer events
//!

use crate::prelude::*;
use bevy::prelude::*;

/// Cost value marking a cell as impassable
pub const COST_OBSTACLE: u8 = 255;

/// Per-cell traversal costs of the grid, indexed by the block-tiled layout
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Component, Clone)]
pub struct CostField(Vec<u8>);

impl Field<u8> for CostField {
	/// Get a reference to the field array
	fn get(&self) -> &[u8] {
		&self.0
	}
	/// Retrieve a field cell value
	fn get_cell_value(&self, index: u32) -> u8 {
		if index as usize >= self.0.len() {
			panic!(
				"Cannot get a CostField value, index out of bounds. Asked for index {}, field length is {}",
				index,
				self.0.len()
			)
		}
		self.0[index as usize]
	}
	/// Set a field cell to a value
	fn set_cell_value(&mut self, value: u8, index: u32) {
		if index as usize >= self.0.len() {
			panic!(
				"Cannot set a CostField value, index out of bounds. Asked for index {}, field length is {}",
				index,
				self.0.len()
			)
		}
		self.0[index as usize] = value;
	}
}

impl CostField {
	/// Create a new instance of [CostField] sized to the layout where every
	/// cell starts with the default cost of `1`
	pub fn new(layout: &GridLayout) -> Self {
		CostField(vec![1; layout.get_cell_count() as usize])
	}
	/// Whether the cell at `index` is impassable
	pub fn is_obstacle(&self, index: u32) -> bool {
		self.get_cell_value(index) == COST_OBSTACLE
	}
	/// From a `ron` file generate the [CostField]. Panics if the stored
	/// field does not match the cell count of the layout
	#[cfg(feature = "ron")]
	pub fn from_ron(path: String, layout: &GridLayout) -> Self {
		let file = std::fs::File::open(path).expect("Failed opening CostField file");
		let field: CostField = match ron::de::from_reader(file) {
			Ok(field) => field,
			Err(e) => panic!("Failed deserializing CostField: {}", e),
		};
		if field.0.len() != layout.get_cell_count() as usize {
			panic!(
				"CostField file holds {} cells, layout expects {}",
				field.0.len(),
				layout.get_cell_count()
			);
		}
		field
	}
}
