//! Defines the Bevy [Plugin] for goal-driven flow navigation
//!

use crate::prelude::*;
use bevy::prelude::*;

pub mod cost_layer;
pub mod query_layer;

/// Groups the systems so that cache cleardown always runs before any of the
/// calculation stages of a tick
#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub enum OrderingSet {
	/// Cleardown of expired delivered results
	Tidy,
	/// Cost updates and the chained query pipeline stages
	Calculate,
}

/// Registers the events, types and chained systems of the navigation
/// pipeline. Spawn a [NavGridBundle] entity for each map the systems should
/// operate over
pub struct NavFlowPlugin;

impl Plugin for NavFlowPlugin {
	#[cfg(not(tarpaulin_include))]
	fn build(&self, app: &mut App) {
		app.register_type::<Ordinal>()
			.register_type::<GridLayout>()
			.register_type::<GridCell>()
			.register_type::<QueryHandle>()
			.register_type::<SolverKind>()
			.init_resource::<QueryHandleAllocator>()
			.add_event::<cost_layer::EventUpdateCostCell>()
			.add_event::<cost_layer::EventCleanCaches>()
			.add_event::<query_layer::EventFlowQueryRequest>()
			.configure_sets(Update, (OrderingSet::Tidy, OrderingSet::Calculate).chain())
			.add_systems(
				Update,
				(
					query_layer::cleanup_delivered_results.in_set(OrderingSet::Tidy),
					(
						cost_layer::process_cost_updates,
						cost_layer::clean_cache,
						query_layer::event_insert_query_queue,
						query_layer::compute_distance_fields,
						query_layer::build_flow_fields,
						query_layer::smooth_flow_fields,
						query_layer::deliver_results,
					)
						.chain()
						.in_set(OrderingSet::Calculate),
				),
			);
	}
}
