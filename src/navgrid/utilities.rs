//! Direction constants and conversions shared by the solvers and fields
//!
//! Grid coordinates follow a `(column, row)` convention where row `0` is the
//! northern edge, so northerly movement decreases the row. Each algorithm
//! deliberately uses its own slice of the offset table: the flood solver and
//! the Eikonal narrow-band seeding relax over the 4 cardinal neighbours while
//! flow derivation inspects all 8 - the connectivity choice is part of each
//! algorithm's correctness and they must not be unified
//!

use bevy::prelude::*;

/// Compass direction between a cell and one of its 8 neighbours
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Debug, PartialEq, Eq, Clone, Copy, Reflect)]
pub enum Ordinal {
	/// Towards row zero
	North,
	/// Towards the column limit
	East,
	/// Towards the row limit
	South,
	/// Towards column zero
	West,
	/// Diagonal combining [Ordinal::North] and [Ordinal::East]
	NorthEast,
	/// Diagonal combining [Ordinal::South] and [Ordinal::East]
	SouthEast,
	/// Diagonal combining [Ordinal::South] and [Ordinal::West]
	SouthWest,
	/// Diagonal combining [Ordinal::North] and [Ordinal::West]
	NorthWest,
	/// Special case used for cells that have no direction of movement, such
	/// as a goal or an impassable cell
	Zero,
}

/// The fixed `(column, row)` offset table shared by every component. The
/// cardinal entries lead so that a slice of the first [CARDINAL_OFFSET_COUNT]
/// elements yields the 4-connected set, and tie-breaking in flow derivation
/// follows this exact order
pub const ORDINAL_OFFSETS: [(Ordinal, (i32, i32)); 8] = [
	(Ordinal::North, (0, -1)),
	(Ordinal::South, (0, 1)),
	(Ordinal::East, (1, 0)),
	(Ordinal::West, (-1, 0)),
	(Ordinal::NorthEast, (1, -1)),
	(Ordinal::SouthEast, (1, 1)),
	(Ordinal::NorthWest, (-1, -1)),
	(Ordinal::SouthWest, (-1, 1)),
];

/// Number of leading entries of [ORDINAL_OFFSETS] forming the cardinal set
pub const CARDINAL_OFFSET_COUNT: usize = 4;

impl Ordinal {
	/// Get the `(column, row)` offset of the direction
	pub fn offset(&self) -> (i32, i32) {
		match self {
			Ordinal::North => (0, -1),
			Ordinal::East => (1, 0),
			Ordinal::South => (0, 1),
			Ordinal::West => (-1, 0),
			Ordinal::NorthEast => (1, -1),
			Ordinal::SouthEast => (1, 1),
			Ordinal::SouthWest => (-1, 1),
			Ordinal::NorthWest => (-1, -1),
			Ordinal::Zero => (0, 0),
		}
	}
	/// Returns the opposite [Ordinal] of the current
	pub fn inverse(&self) -> Ordinal {
		match self {
			Ordinal::North => Ordinal::South,
			Ordinal::East => Ordinal::West,
			Ordinal::South => Ordinal::North,
			Ordinal::West => Ordinal::East,
			Ordinal::NorthEast => Ordinal::SouthWest,
			Ordinal::SouthEast => Ordinal::NorthWest,
			Ordinal::SouthWest => Ordinal::NorthEast,
			Ordinal::NorthWest => Ordinal::SouthEast,
			Ordinal::Zero => Ordinal::Zero,
		}
	}
	/// For two adjacent cells find the [Ordinal] pointing from `source` to
	/// `target`. This will panic if the two cells are not orthogonally or
	/// diagonally adjacent
	pub fn cell_to_cell_direction(target: (u32, u32), source: (u32, u32)) -> Self {
		let i32_target = (target.0 as i32, target.1 as i32);
		let i32_source = (source.0 as i32, source.1 as i32);

		let direction = (i32_target.0 - i32_source.0, i32_target.1 - i32_source.1);
		match direction {
			(0, -1) => Ordinal::North,
			(1, -1) => Ordinal::NorthEast,
			(1, 0) => Ordinal::East,
			(1, 1) => Ordinal::SouthEast,
			(0, 1) => Ordinal::South,
			(-1, 1) => Ordinal::SouthWest,
			(-1, 0) => Ordinal::West,
			(-1, -1) => Ordinal::NorthWest,
			_ => panic!(
				"Cell {:?} is not orthogonally or diagonally adjacent to {:?}",
				target, source
			),
		}
	}
	/// Obtain a grid-space unit vector of the direction, diagonals are
	/// normalised
	pub fn as_unit_vector(&self) -> Vec2 {
		let (column, row) = self.offset();
		Vec2::new(column as f32, row as f32).normalize_or_zero()
	}
}

// #[rustfmt::skip]
#[cfg(test)]
mod tests {
	use super::*;
	#[test]
	fn cardinal_slice_is_4_connected() {
		let cardinals: Vec<Ordinal> = ORDINAL_OFFSETS[..CARDINAL_OFFSET_COUNT]
			.iter()
			.map(|(ord, _)| *ord)
			.collect();
		let actual = vec![Ordinal::North, Ordinal::South, Ordinal::East, Ordinal::West];
		assert_eq!(actual, cardinals);
	}
	#[test]
	fn offset_table_matches_offsets() {
		for (ord, offset) in ORDINAL_OFFSETS.iter() {
			assert_eq!(ord.offset(), *offset);
		}
	}
	#[test]
	fn cell_to_cell_north() {
		let target = (6, 2);
		let source = (6, 3);
		let result = Ordinal::cell_to_cell_direction(target, source);
		let actual = Ordinal::North;
		assert_eq!(actual, result);
	}
	#[test]
	fn cell_to_cell_south_west() {
		let target = (6, 9);
		let source = (7, 8);
		let result = Ordinal::cell_to_cell_direction(target, source);
		let actual = Ordinal::SouthWest;
		assert_eq!(actual, result);
	}
	#[test]
	fn inverse_of_diagonal() {
		assert_eq!(Ordinal::NorthEast.inverse(), Ordinal::SouthWest);
	}
	#[test]
	fn diagonal_unit_vector_is_normalised() {
		let v = Ordinal::SouthEast.as_unit_vector();
		assert!((v.length() - 1.0).abs() < 0.0001);
	}
	#[test]
	fn zero_unit_vector() {
		assert_eq!(Ordinal::Zero.as_unit_vector(), Vec2::ZERO);
	}
}
