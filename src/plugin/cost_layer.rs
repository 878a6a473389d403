//! Logic for handling changes to a [CostField] which in turn invalidates any
//! delivered results whose fields were derived from the old costs
//!

use crate::prelude::*;
use bevy::prelude::*;

/// Used to update a cell of the [CostField]
#[derive(Event)]
pub struct EventUpdateCostCell {
	/// Cell to update
	cell: GridCell,
	/// The value the cell should be assigned
	cell_value: u8,
}

impl EventUpdateCostCell {
	/// Create a new instance of [EventUpdateCostCell]
	#[cfg(not(tarpaulin_include))]
	pub fn new(cell: GridCell, cell_value: u8) -> Self {
		EventUpdateCostCell { cell, cell_value }
	}
	/// Get the cell being updated
	#[cfg(not(tarpaulin_include))]
	pub fn get_cell(&self) -> GridCell {
		self.cell
	}
	/// Get the new cost of the cell
	#[cfg(not(tarpaulin_include))]
	pub fn get_cost_value(&self) -> u8 {
		self.cell_value
	}
}

/// Any delivered result was derived from the old costs and needs to have its
/// cached entry removed, a consumer polling a purged handle must request a
/// fresh query
#[derive(Event)]
pub struct EventCleanCaches;

/// Read [EventUpdateCostCell] and update the values within [CostField],
/// firing [EventCleanCaches] when anything changed
#[cfg(not(tarpaulin_include))]
pub fn process_cost_updates(
	mut events: EventReader<EventUpdateCostCell>,
	mut query: Query<(&mut CostField, &GridLayout)>,
	mut event_cache_clean: EventWriter<EventCleanCaches>,
) {
	let mut dirty = false;
	for event in events.read() {
		let cell = event.get_cell();
		let cost = event.get_cost_value();
		for (mut cost_field, layout) in query.iter_mut() {
			let index = layout.to_index(cell);
			if index == INVALID_INDEX {
				error!(
					"Cost update targets cell {:?} outside of the grid, ignoring",
					cell
				);
				continue;
			}
			cost_field.set_cell_value(cost, index);
			dirty = true;
		}
	}
	if dirty {
		event_cache_clean.write(EventCleanCaches);
	}
}

/// Lookup any cached results derived from costs that have been adjusted and
/// remove them from the cache. Queued queries still awaiting their distance
/// solve will read the new costs when their stage runs
#[cfg(not(tarpaulin_include))]
pub fn clean_cache(
	mut events: EventReader<EventCleanCaches>,
	mut q_cache: Query<&mut FlowQueryCache>,
) {
	if events.read().next().is_some() {
		events.clear();
		for mut cache in q_cache.iter_mut() {
			cache.purge_delivered();
		}
	}
}
