//! Drive a query from goal cells to a delivered smoothed FlowField, both by
//! hand over the raw structures and through the plugin systems
//!

use bevy::prelude::*;
use bevy_flow_nav_plugin::prelude::*;

/// Spin up a headless app with the plugin and one 5x5 map entity
fn setup_app() -> App {
	let mut app = App::new();
	app.add_plugins(MinimalPlugins);
	app.add_plugins(NavFlowPlugin);
	app.world_mut().spawn(NavGridBundle::new(5, 5, 1.0, 5));
	app
}

#[test]
fn manual_pipeline_five_by_five() {
	let layout = GridLayout::new(5, 5, 1.0, 5);
	let cost_field = CostField::new(&layout);
	let goal = GridCell::new(2, 2);
	let corner = layout.to_index(GridCell::new(0, 0));
	// the flood solver walks the corner in 4 cardinal steps
	let mut flood = DistanceField::new(&layout);
	flood.calculate_flood(&[goal], &cost_field, &layout);
	assert_eq!(4.0, flood.get_cell_value(corner));
	// the Eikonal solver approximates the Euclidean 2*sqrt(2), the
	// first-order stencil overshoots a little but beats the ring distance
	let mut eikonal = DistanceField::new(&layout);
	eikonal.calculate_eikonal(&[goal], &cost_field, &layout);
	let arrival = eikonal.get_cell_value(corner);
	assert!(arrival > 2.8 && arrival < 3.5);
	assert!(arrival < flood.get_cell_value(corner));
	// raw flow strictly descends the distance field
	let mut flow = FlowField::new(&layout);
	flow.calculate(&flood, &layout);
	for index in 0..layout.get_cell_count() {
		let direction = flow.get_cell_value(index);
		if direction == Vec2::ZERO {
			continue;
		}
		let offset = (direction.x.round() as i32, direction.y.round() as i32);
		let target = layout.offset_index(index, offset);
		assert!(flood.get_cell_value(target) < flood.get_cell_value(index));
	}
	// smoothing keeps every steering vector unit length
	flow.smooth(flood.get_visit_order(), &layout);
	for index in 0..layout.get_cell_count() {
		let direction = flow.get_cell_value(index);
		if direction != Vec2::ZERO {
			assert!((direction.length() - 1.0).abs() < 0.0001);
		}
	}
}

#[test]
fn request_event_is_delivered_with_matching_handle() {
	let mut app = setup_app();
	let handle = app
		.world_mut()
		.resource_mut::<QueryHandleAllocator>()
		.allocate();
	app.world_mut().send_event(EventFlowQueryRequest::new(
		handle,
		vec![GridCell::new(2, 2)],
		SolverKind::Flood,
		None,
	));
	app.update();
	let mut query = app.world_mut().query::<&FlowQueryCache>();
	let cache = query.single(app.world()).unwrap();
	let result = cache.get_result(handle).expect("query was not delivered");
	assert_eq!(handle, result.get_handle());
	// the delivered distance field matches a hand-rolled solve
	let layout = GridLayout::new(5, 5, 1.0, 5);
	let corner = layout.to_index(GridCell::new(0, 0));
	assert_eq!(4.0, result.get_distance_field().get_cell_value(corner));
	// and carries a usable steering direction at the corner
	assert_ne!(Vec2::ZERO, result.get_flow_field().get_cell_value(corner));
}

#[test]
fn eikonal_request_through_the_plugin() {
	let mut app = setup_app();
	let handle = app
		.world_mut()
		.resource_mut::<QueryHandleAllocator>()
		.allocate();
	app.world_mut().send_event(EventFlowQueryRequest::new(
		handle,
		vec![GridCell::new(2, 2)],
		SolverKind::Eikonal,
		None,
	));
	app.update();
	let mut query = app.world_mut().query::<&FlowQueryCache>();
	let cache = query.single(app.world()).unwrap();
	let result = cache.get_result(handle).expect("query was not delivered");
	let layout = GridLayout::new(5, 5, 1.0, 5);
	let corner = layout.to_index(GridCell::new(0, 0));
	let arrival = result.get_distance_field().get_cell_value(corner);
	assert!(arrival > 2.8 && arrival < 3.5);
}

#[test]
fn newer_request_supersedes_older_for_same_requester() {
	let mut app = setup_app();
	let requester = app.world_mut().spawn_empty().id();
	let older = app
		.world_mut()
		.resource_mut::<QueryHandleAllocator>()
		.allocate();
	let newer = app
		.world_mut()
		.resource_mut::<QueryHandleAllocator>()
		.allocate();
	app.world_mut().send_event(EventFlowQueryRequest::new(
		older,
		vec![GridCell::new(0, 0)],
		SolverKind::Flood,
		Some(requester),
	));
	app.world_mut().send_event(EventFlowQueryRequest::new(
		newer,
		vec![GridCell::new(4, 4)],
		SolverKind::Flood,
		Some(requester),
	));
	app.update();
	// give the surviving query time to drain through every stage
	app.update();
	let mut query = app.world_mut().query::<&FlowQueryCache>();
	let cache = query.single(app.world()).unwrap();
	assert!(cache.get_result(older).is_none());
	assert!(cache.get_result(newer).is_some());
	assert_eq!(Some(newer), cache.latest_for_requester(requester));
}

#[test]
fn cost_update_purges_delivered_results() {
	let mut app = setup_app();
	let handle = app
		.world_mut()
		.resource_mut::<QueryHandleAllocator>()
		.allocate();
	app.world_mut().send_event(EventFlowQueryRequest::new(
		handle,
		vec![GridCell::new(2, 2)],
		SolverKind::Flood,
		None,
	));
	app.update();
	{
		let mut query = app.world_mut().query::<&FlowQueryCache>();
		let cache = query.single(app.world()).unwrap();
		assert!(cache.get_result(handle).is_some());
	}
	// mutating a cost cell invalidates everything derived from the old costs
	app.world_mut()
		.send_event(EventUpdateCostCell::new(GridCell::new(1, 1), COST_OBSTACLE));
	app.update();
	let mut query = app.world_mut().query::<(&FlowQueryCache, &CostField, &GridLayout)>();
	let (cache, cost_field, layout) = query.single(app.world()).unwrap();
	assert!(cache.get_result(handle).is_none());
	let index = layout.to_index(GridCell::new(1, 1));
	assert!(cost_field.is_obstacle(index));
}
