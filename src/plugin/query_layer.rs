//! Logic relating to navigation query processing, from the request event
//! through the staged solves to delivery and cleardown
//!

use crate::prelude::*;
use bevy::prelude::*;

/// A request to queue up generation of a [DistanceField] and smoothed
/// [FlowField] towards a set of goal cells. The handle correlates the
/// eventual result with this request and should come from the
/// [QueryHandleAllocator] resource so it is never reused
#[derive(Event)]
pub struct EventFlowQueryRequest {
	/// Handle the delivered result will be keyed under
	handle: QueryHandle,
	/// Distance-zero source cells of the query
	goals: Vec<GridCell>,
	/// Which distance solver to run
	solver: SolverKind,
	/// The logical requester, a newer request from the same requester
	/// supersedes this one
	requester: Option<Entity>,
}

impl EventFlowQueryRequest {
	/// Create a new instance of [EventFlowQueryRequest]
	#[cfg(not(tarpaulin_include))]
	pub fn new(
		handle: QueryHandle,
		goals: Vec<GridCell>,
		solver: SolverKind,
		requester: Option<Entity>,
	) -> Self {
		EventFlowQueryRequest {
			handle,
			goals,
			solver,
			requester,
		}
	}
	/// Get the handle of the request
	#[cfg(not(tarpaulin_include))]
	pub fn get_handle(&self) -> QueryHandle {
		self.handle
	}
	/// Get the goal cells of the request
	#[cfg(not(tarpaulin_include))]
	pub fn get_goals(&self) -> &[GridCell] {
		&self.goals
	}
}

/// Process [EventFlowQueryRequest] and place fresh queries into the
/// [FlowQueryCache] queue. Requests whose handle is already known are
/// duplicates and skipped, requests with no usable goal are dropped
#[cfg(not(tarpaulin_include))]
pub fn event_insert_query_queue(
	mut events: EventReader<EventFlowQueryRequest>,
	mut cache_q: Query<(&mut FlowQueryCache, &CostField, &GridLayout)>,
) {
	for event in events.read() {
		for (mut cache, cost_field, layout) in cache_q.iter_mut() {
			if cache.contains_handle(event.handle) {
				debug!("Duplicate query handle {:?}, ignoring", event.handle);
				continue;
			}
			// ignore requests where every goal is off-grid or impassable,
			// the solvers would produce an empty field anyway
			let usable = event.goals.iter().any(|goal| {
				let index = layout.to_index(*goal);
				index != INVALID_INDEX && !cost_field.is_obstacle(index)
			});
			if !usable {
				debug!("Query {:?} has no usable goal, dropping", event.handle);
				continue;
			}
			cache.add_to_queue(
				event.handle,
				FlowQueryPipeline::new(event.goals.clone(), event.solver, event.requester),
			);
		}
	}
}

/// Inspect the [FlowQueryCache] queue and if the [DistanceField] of the first
/// entry hasn't been solved then calculate it
#[cfg(not(tarpaulin_include))]
pub fn compute_distance_fields(
	mut cache_q: Query<(&mut FlowQueryCache, &CostField, &GridLayout)>,
) {
	for (mut cache, cost_field, layout) in cache_q.iter_mut() {
		if let Some(mut entry) = cache.get_queue_mut().first_entry() {
			entry.get_mut().compute_distance(cost_field, layout);
		}
	}
}

/// When the front of the queue has a solved [DistanceField] derive the raw
/// [FlowField] from it
#[cfg(not(tarpaulin_include))]
pub fn build_flow_fields(mut cache_q: Query<(&mut FlowQueryCache, &GridLayout)>) {
	for (mut cache, layout) in cache_q.iter_mut() {
		if let Some(mut entry) = cache.get_queue_mut().first_entry() {
			entry.get_mut().build_flow(layout);
		}
	}
}

/// When the front of the queue has a raw [FlowField] smooth it along the
/// solver's recorded visit order
#[cfg(not(tarpaulin_include))]
pub fn smooth_flow_fields(mut cache_q: Query<(&mut FlowQueryCache, &GridLayout)>) {
	for (mut cache, layout) in cache_q.iter_mut() {
		if let Some(mut entry) = cache.get_queue_mut().first_entry() {
			entry.get_mut().smooth_flow(layout);
		}
	}
}

/// Move fully processed queries out of the queue and publish them as
/// delivered [FlowQueryResult]s that consumers can poll by handle
#[cfg(not(tarpaulin_include))]
pub fn deliver_results(mut cache_q: Query<&mut FlowQueryCache>, time: Res<Time>) {
	for mut cache in cache_q.iter_mut() {
		let Some(entry) = cache.get_queue_mut().first_entry() else {
			continue;
		};
		if !entry.get().is_complete() {
			continue;
		}
		let (handle, pipeline) = entry.remove_entry();
		if let Some(result) = pipeline.into_result(handle, time.elapsed()) {
			cache.insert_result(result);
		}
	}
}

/// Purge any delivered results older than 15 minutes
#[cfg(not(tarpaulin_include))]
pub fn cleanup_delivered_results(mut cache_q: Query<&mut FlowQueryCache>, time: Res<Time>) {
	for mut cache in cache_q.iter_mut() {
		let mut results_to_purge = Vec::new();
		for (handle, result) in cache.get().iter() {
			let elapsed = time.elapsed();
			let diff = elapsed.saturating_sub(result.get_time_generated());
			if diff.as_secs() > 900 {
				results_to_purge.push(*handle);
			}
		}
		for purge in results_to_purge.iter() {
			cache.remove_result(*purge);
		}
	}
}
