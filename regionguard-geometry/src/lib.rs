//! Region geometry for regionguard.
//!
//! Three shape variants are supported:
//! - [`Cuboid`]: an axis-aligned box with inclusive corners
//! - [`Polygon`]: an arbitrary 2-D outline extruded between two heights
//! - [`Shape::Global`]: the unbounded whole-world shape
//!
//! All coordinates are integer block coordinates and all containment tests
//! are boundary-inclusive.

mod bounds;
mod cuboid;
mod error;
mod polygon;
mod segment;
mod shape;

pub use bounds::Aabb;
pub use cuboid::Cuboid;
pub use error::{GeometryError, GeometryResult};
pub use polygon::Polygon;
pub use shape::{Shape, ShapeKind};
