//!
//!

use crate::prelude::*;
use bevy::prelude::*;

/// All the components a map entity needs for the navigation systems to
/// operate over it: the grid geometry, the traversal costs and the cache of
/// in-flight and delivered queries
#[derive(Bundle)]
pub struct NavGridBundle {
	/// Geometry and cell indexing of the grid
	layout: GridLayout,
	/// Per-cell traversal costs
	cost_field: CostField,
	/// In-flight query pipelines and delivered results
	query_cache: FlowQueryCache,
}

impl NavGridBundle {
	/// Create a new instance of [NavGridBundle] with a uniform default
	/// [CostField]. Panics if the grid dimensions are not exact multiples of
	/// `block_resolution`
	pub fn new(columns: u32, rows: u32, cell_size: f32, block_resolution: u32) -> Self {
		let layout = GridLayout::new(columns, rows, cell_size, block_resolution);
		let cost_field = CostField::new(&layout);
		let query_cache = FlowQueryCache::default();
		NavGridBundle {
			layout,
			cost_field,
			query_cache,
		}
	}
	/// Create a new instance of [NavGridBundle] where the [CostField] is
	/// derived from disk
	#[cfg(feature = "ron")]
	pub fn new_from_disk(
		columns: u32,
		rows: u32,
		cell_size: f32,
		block_resolution: u32,
		path: &str,
	) -> Self {
		let layout = GridLayout::new(columns, rows, cell_size, block_resolution);
		let cost_field = CostField::from_ron(path.to_string(), &layout);
		let query_cache = FlowQueryCache::default();
		NavGridBundle {
			layout,
			cost_field,
			query_cache,
		}
	}
}
