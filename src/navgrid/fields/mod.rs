//! The kinds of fields used by the navigation queries and the per-query
//! pipeline that carries them from submission to delivery
//!

pub mod cost_field;
pub mod distance_field;
pub mod flow_field;

use std::collections::BTreeMap;
use std::time::Duration;

use crate::prelude::*;
use bevy::prelude::*;

/// Defines required access to field arrays
pub trait Field<T: Copy> {
	/// Get a reference to the field array
	fn get(&self) -> &[T];
	/// Retrieve a field cell value by its flat cell index
	fn get_cell_value(&self, index: u32) -> T;
	/// Set a field cell to a value by its flat cell index
	fn set_cell_value(&mut self, value: T, index: u32);
}

/// ID of a cell within the grid
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash, Reflect)]
pub struct GridCell((u32, u32));

impl GridCell {
	/// Create a new instance of [GridCell]
	pub fn new(column: u32, row: u32) -> Self {
		GridCell((column, row))
	}
	/// Get the cell `(column, row)` tuple
	pub fn get_column_row(&self) -> (u32, u32) {
		self.0
	}
	/// Get the cell column
	pub fn get_column(&self) -> u32 {
		self.0 .0
	}
	/// Get the cell row
	pub fn get_row(&self) -> u32 {
		self.0 .1
	}
}

/// Opaque identifier correlating a navigation query with its eventual
/// result. Handles are process-lifetime unique and never reused so that a
/// consumer can match an asynchronous result to the request that produced
/// it, even with multiple queries in flight
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash, Reflect)]
pub struct QueryHandle(u64);

impl QueryHandle {
	/// Create a handle from a raw id, mainly useful in tests - prefer
	/// [QueryHandleAllocator::allocate]
	pub fn new(id: u64) -> Self {
		QueryHandle(id)
	}
	/// Get the raw id of the handle
	pub fn get(&self) -> u64 {
		self.0
	}
}

/// Issues monotonically increasing [QueryHandle]s to the query-issuing
/// collaborator
#[derive(Resource, Default)]
pub struct QueryHandleAllocator {
	/// The id the next allocated handle will carry
	next: u64,
}

impl QueryHandleAllocator {
	/// Allocate a fresh [QueryHandle], no handle is ever produced twice
	pub fn allocate(&mut self) -> QueryHandle {
		let handle = QueryHandle(self.next);
		self.next += 1;
		handle
	}
}

/// Which distance solver a query should run
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Reflect)]
pub enum SolverKind {
	/// Uniform-step multi-source flood fill producing integer ring
	/// distances, costs only mask obstacles
	#[default]
	Flood,
	/// Eikonal narrow-band solve producing cost-weighted continuous arrival
	/// times
	Eikonal,
}

/// The stages a navigation query passes through. Each stage's output buffer
/// is the next stage's input and no stage may start before its predecessor's
/// buffer is fully populated
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum QueryStage {
	/// Goals accepted, no buffers populated yet
	Submitted,
	/// The [DistanceField] is fully populated
	DistanceComputed,
	/// The raw [FlowField] has been derived from the distance field
	FlowFieldBuilt,
	/// The [FlowField] has been smoothed and the query is ready for delivery
	FlowFieldSmoothed,
}

/// A single in-flight navigation query owning the buffers of each pipeline
/// stage
pub struct FlowQueryPipeline {
	/// Distance-zero source cells of the query, out-of-grid entries are
	/// ignored by the solvers
	goals: Vec<GridCell>,
	/// The distance solver the query runs
	solver: SolverKind,
	/// The logical requester, used to supersede this query when the same
	/// requester submits a newer one
	requester: Option<Entity>,
	/// Current stage of the query
	stage: QueryStage,
	/// Populated once the distance solve completes
	distance: Option<DistanceField>,
	/// Populated once flow derivation completes
	flow: Option<FlowField>,
}

impl FlowQueryPipeline {
	/// Create a new instance of [FlowQueryPipeline] in the
	/// [QueryStage::Submitted] stage
	pub fn new(goals: Vec<GridCell>, solver: SolverKind, requester: Option<Entity>) -> Self {
		FlowQueryPipeline {
			goals,
			solver,
			requester,
			stage: QueryStage::Submitted,
			distance: None,
			flow: None,
		}
	}
	/// Get the goal cells of the query
	pub fn get_goals(&self) -> &[GridCell] {
		&self.goals
	}
	/// Get the solver the query runs
	pub fn get_solver(&self) -> SolverKind {
		self.solver
	}
	/// Get the logical requester of the query
	pub fn get_requester(&self) -> Option<Entity> {
		self.requester
	}
	/// Get the current stage of the query
	pub fn get_stage(&self) -> QueryStage {
		self.stage
	}
	/// Run the distance solve, advancing [QueryStage::Submitted] to
	/// [QueryStage::DistanceComputed]. A no-op in any other stage
	pub fn compute_distance(&mut self, cost_field: &CostField, layout: &GridLayout) {
		if self.stage != QueryStage::Submitted {
			return;
		}
		let mut distance = DistanceField::new(layout);
		match self.solver {
			SolverKind::Flood => distance.calculate_flood(&self.goals, cost_field, layout),
			SolverKind::Eikonal => distance.calculate_eikonal(&self.goals, cost_field, layout),
		}
		self.distance = Some(distance);
		self.stage = QueryStage::DistanceComputed;
	}
	/// Derive the raw [FlowField], advancing [QueryStage::DistanceComputed]
	/// to [QueryStage::FlowFieldBuilt]. A no-op in any other stage
	pub fn build_flow(&mut self, layout: &GridLayout) {
		if self.stage != QueryStage::DistanceComputed {
			return;
		}
		// the stage guard means the distance buffer is always populated here
		if let Some(distance) = &self.distance {
			let mut flow = FlowField::new(layout);
			flow.calculate(distance, layout);
			self.flow = Some(flow);
			self.stage = QueryStage::FlowFieldBuilt;
		}
	}
	/// Smooth the [FlowField] along the recorded frontier-visit order,
	/// advancing [QueryStage::FlowFieldBuilt] to
	/// [QueryStage::FlowFieldSmoothed]. A no-op in any other stage
	pub fn smooth_flow(&mut self, layout: &GridLayout) {
		if self.stage != QueryStage::FlowFieldBuilt {
			return;
		}
		if let (Some(distance), Some(flow)) = (&self.distance, &mut self.flow) {
			flow.smooth(distance.get_visit_order(), layout);
			self.stage = QueryStage::FlowFieldSmoothed;
		}
	}
	/// Whether every stage has run and the query can be delivered
	pub fn is_complete(&self) -> bool {
		self.stage == QueryStage::FlowFieldSmoothed
	}
	/// Consume the pipeline into a handle-stamped [FlowQueryResult], or
	/// [None] if the stages have not all run
	pub fn into_result(self, handle: QueryHandle, elapsed: Duration) -> Option<FlowQueryResult> {
		if self.stage != QueryStage::FlowFieldSmoothed {
			return None;
		}
		match (self.distance, self.flow) {
			(Some(distance), Some(flow)) => Some(FlowQueryResult {
				handle,
				requester: self.requester,
				distance,
				flow,
				time_generated: elapsed,
			}),
			_ => None,
		}
	}
}

/// The delivered output of one navigation query, stamped with the handle of
/// the request that produced it
pub struct FlowQueryResult {
	/// Handle of the originating request
	handle: QueryHandle,
	/// The logical requester the result belongs to
	requester: Option<Entity>,
	/// The completed distance field, retained for heatmap-style consumers
	distance: DistanceField,
	/// The smoothed steering directions for agent consumers
	flow: FlowField,
	//? If a game is running for 136 years bad things will start happening here
	/// Marks the result based on time elapsed since app start, used to
	/// enable automatic cleardown of long lived results that are probably
	/// not needed anymore
	time_generated: Duration,
}

impl FlowQueryResult {
	/// Get the handle of the originating request
	pub fn get_handle(&self) -> QueryHandle {
		self.handle
	}
	/// Get the logical requester the result belongs to
	pub fn get_requester(&self) -> Option<Entity> {
		self.requester
	}
	/// Get the completed distance field
	pub fn get_distance_field(&self) -> &DistanceField {
		&self.distance
	}
	/// Get the smoothed flow field
	pub fn get_flow_field(&self) -> &FlowField {
		&self.flow
	}
	/// Get when the result was generated
	pub fn get_time_generated(&self) -> Duration {
		self.time_generated
	}
}

/// Per-map store of in-flight query pipelines and delivered results.
///
/// Queries queue in handle order and the front of the queue is advanced one
/// stage per system in the calculate set. Delivered results are keyed by
/// handle so that multiple consumers can read from the same dataset; a
/// consumer must bind to the most recent handle relevant to it and a newer
/// query from the same requester supersedes the older one
#[derive(Component, Default)]
pub struct FlowQueryCache {
	/// In-flight pipelines awaiting stage processing
	queue: BTreeMap<QueryHandle, FlowQueryPipeline>,
	/// Completed results that consumers can poll by handle
	delivered: BTreeMap<QueryHandle, FlowQueryResult>,
	/// Most recent handle submitted by each logical requester
	requesters: BTreeMap<Entity, QueryHandle>,
}

impl FlowQueryCache {
	/// Get a mutable reference to the queue of in-flight pipelines
	pub fn get_queue_mut(&mut self) -> &mut BTreeMap<QueryHandle, FlowQueryPipeline> {
		&mut self.queue
	}
	/// Get the map of delivered results
	pub fn get(&self) -> &BTreeMap<QueryHandle, FlowQueryResult> {
		&self.delivered
	}
	/// Get a mutable reference to the map of delivered results
	pub fn get_mut(&mut self) -> &mut BTreeMap<QueryHandle, FlowQueryResult> {
		&mut self.delivered
	}
	/// Whether a handle is already known to the cache, either in flight or
	/// delivered
	pub fn contains_handle(&self, handle: QueryHandle) -> bool {
		self.queue.contains_key(&handle) || self.delivered.contains_key(&handle)
	}
	/// The most recent handle submitted by a requester, if any
	pub fn latest_for_requester(&self, requester: Entity) -> Option<QueryHandle> {
		self.requesters.get(&requester).copied()
	}
	/// Insert a pipeline into the queue. When the pipeline carries a
	/// requester any older query of that requester is superseded: its
	/// in-flight pipeline is aborted and its delivered result discarded
	pub fn add_to_queue(&mut self, handle: QueryHandle, pipeline: FlowQueryPipeline) {
		if let Some(requester) = pipeline.get_requester() {
			if let Some(stale) = self.requesters.insert(requester, handle) {
				self.queue.remove(&stale);
				self.delivered.remove(&stale);
			}
		}
		self.queue.insert(handle, pipeline);
	}
	/// Get a delivered [FlowQueryResult] by handle. Returns [None] if the
	/// result hasn't been delivered or has been superseded
	pub fn get_result(&self, handle: QueryHandle) -> Option<&FlowQueryResult> {
		self.delivered.get(&handle)
	}
	/// Insert a delivered result keyed by its handle
	pub fn insert_result(&mut self, result: FlowQueryResult) {
		self.delivered.insert(result.get_handle(), result);
	}
	/// Remove a delivered result (when it has expired or its inputs were
	/// invalidated by a cost change)
	pub fn remove_result(&mut self, handle: QueryHandle) {
		self.delivered.remove(&handle);
	}
	/// Discard every delivered result, used when the [CostField] changes and
	/// all fields derived from it are stale
	pub fn purge_delivered(&mut self) {
		self.delivered.clear();
	}
}

// #[rustfmt::skip]
#[cfg(test)]
mod tests {
	use super::*;
	#[test]
	fn handles_are_monotonic() {
		let mut allocator = QueryHandleAllocator::default();
		let a = allocator.allocate();
		let b = allocator.allocate();
		let c = allocator.allocate();
		assert!(a < b && b < c);
	}
	#[test]
	fn pipeline_advances_through_stages() {
		let layout = GridLayout::new(4, 4, 1.0, 2);
		let cost_field = CostField::new(&layout);
		let mut pipeline =
			FlowQueryPipeline::new(vec![GridCell::new(1, 1)], SolverKind::Flood, None);
		assert_eq!(QueryStage::Submitted, pipeline.get_stage());
		pipeline.compute_distance(&cost_field, &layout);
		assert_eq!(QueryStage::DistanceComputed, pipeline.get_stage());
		pipeline.build_flow(&layout);
		assert_eq!(QueryStage::FlowFieldBuilt, pipeline.get_stage());
		pipeline.smooth_flow(&layout);
		assert!(pipeline.is_complete());
		let result = pipeline
			.into_result(QueryHandle::new(7), Duration::default())
			.unwrap();
		assert_eq!(QueryHandle::new(7), result.get_handle());
	}
	#[test]
	fn stages_cannot_run_out_of_order() {
		let layout = GridLayout::new(4, 4, 1.0, 2);
		let mut pipeline =
			FlowQueryPipeline::new(vec![GridCell::new(0, 0)], SolverKind::Flood, None);
		// flow derivation before the distance solve must not advance the stage
		pipeline.build_flow(&layout);
		assert_eq!(QueryStage::Submitted, pipeline.get_stage());
		pipeline.smooth_flow(&layout);
		assert_eq!(QueryStage::Submitted, pipeline.get_stage());
	}
	#[test]
	fn newer_query_supersedes_older_for_same_requester() {
		let requester = Entity::from_raw(42);
		let mut cache = FlowQueryCache::default();
		let old = QueryHandle::new(0);
		let new = QueryHandle::new(1);
		cache.add_to_queue(
			old,
			FlowQueryPipeline::new(vec![GridCell::new(0, 0)], SolverKind::Flood, Some(requester)),
		);
		cache.add_to_queue(
			new,
			FlowQueryPipeline::new(vec![GridCell::new(1, 1)], SolverKind::Flood, Some(requester)),
		);
		assert!(!cache.contains_handle(old));
		assert!(cache.contains_handle(new));
		assert_eq!(Some(new), cache.latest_for_requester(requester));
	}
}
