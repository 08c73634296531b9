//! Extruded polygon regions.

use regionguard_types::{BlockVector2, BlockVector3};
use serde::{Deserialize, Serialize};

use crate::bounds::Aabb;
use crate::error::{GeometryError, GeometryResult};
use crate::segment;

/// A 2-D outline extruded from `min_y` to `max_y` inclusive.
///
/// Vertices and edges belong to the polygon; the outline is assumed simple
/// (non self-intersecting) for [`Polygon::volume`], but containment works on
/// any ring.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "PolygonRecord", into = "PolygonRecord")]
pub struct Polygon {
    points: Vec<BlockVector2>,
    min_y: i32,
    max_y: i32,
    bounds: Aabb,
}

#[derive(Serialize, Deserialize)]
struct PolygonRecord {
    points: Vec<BlockVector2>,
    min_y: i32,
    max_y: i32,
}

impl TryFrom<PolygonRecord> for Polygon {
    type Error = GeometryError;

    fn try_from(r: PolygonRecord) -> Result<Self, Self::Error> {
        Self::new(r.points, r.min_y, r.max_y)
    }
}

impl From<Polygon> for PolygonRecord {
    fn from(p: Polygon) -> Self {
        Self {
            points: p.points,
            min_y: p.min_y,
            max_y: p.max_y,
        }
    }
}

impl Polygon {
    /// Builds a polygon; the heights may be given in either order.
    pub fn new(points: Vec<BlockVector2>, y1: i32, y2: i32) -> GeometryResult<Self> {
        if points.len() < 3 {
            return Err(GeometryError::TooFewPoints(points.len()));
        }

        let (min_y, max_y) = (y1.min(y2), y1.max(y2));
        let first = points[0];
        let (lo, hi) = points
            .iter()
            .fold((first, first), |(lo, hi), p| (lo.min(*p), hi.max(*p)));

        Ok(Self {
            bounds: Aabb {
                min: lo.to_3d(min_y),
                max: hi.to_3d(max_y),
            },
            points,
            min_y,
            max_y,
        })
    }

    #[must_use]
    pub fn points(&self) -> &[BlockVector2] {
        &self.points
    }

    #[must_use]
    pub const fn min_y(&self) -> i32 {
        self.min_y
    }

    #[must_use]
    pub const fn max_y(&self) -> i32 {
        self.max_y
    }

    #[must_use]
    pub const fn bounds(&self) -> Aabb {
        self.bounds
    }

    #[must_use]
    pub fn contains(&self, p: BlockVector3) -> bool {
        self.bounds.contains(p) && segment::ring_contains(&self.points, p.to_2d())
    }

    pub(crate) fn contains_column(&self, p: BlockVector2) -> bool {
        p.x >= self.bounds.min.x
            && p.x <= self.bounds.max.x
            && p.z >= self.bounds.min.z
            && p.z <= self.bounds.max.z
            && segment::ring_contains(&self.points, p)
    }

    /// Footprint blocks times height, saturating at `u64::MAX`.
    #[must_use]
    pub fn volume(&self) -> u64 {
        let height = u64::try_from(i64::from(self.max_y) - i64::from(self.min_y) + 1).unwrap_or(0);
        segment::lattice_area(&self.points).saturating_mul(height)
    }
}
