//! `use bevy_flow_nav_plugin::prelude::*;` to import common structures and methods
//!

#[doc(hidden)]
pub use crate::navgrid::{
	fields::{cost_field::*, distance_field::*, flow_field::*, *},
	frontier::*,
	grid_layout::*,
	utilities::*,
	*,
};

#[doc(hidden)]
pub use crate::{
	bundle::*,
	plugin::{cost_layer::*, query_layer::*, *},
};
