//! The shape of a protected region.

use regionguard_types::{BlockVector2, BlockVector3};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::bounds::Aabb;
use crate::cuboid::Cuboid;
use crate::polygon::Polygon;
use crate::segment;

/// Discriminant of a [`Shape`], for display and persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Cuboid,
    Polygon,
    Global,
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cuboid => "cuboid",
            Self::Polygon => "polygon",
            Self::Global => "global",
        })
    }
}

/// Region geometry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Shape {
    Cuboid(Cuboid),
    Polygon(Polygon),
    /// Contains every block of the world.
    Global,
}

impl Shape {
    /// Shorthand for a cuboid between two corners.
    #[must_use]
    pub fn cuboid(a: BlockVector3, b: BlockVector3) -> Self {
        Self::Cuboid(Cuboid::new(a, b))
    }

    #[must_use]
    pub const fn kind(&self) -> ShapeKind {
        match self {
            Self::Cuboid(_) => ShapeKind::Cuboid,
            Self::Polygon(_) => ShapeKind::Polygon,
            Self::Global => ShapeKind::Global,
        }
    }

    /// False only for the global shape.
    #[must_use]
    pub const fn is_physical(&self) -> bool {
        !matches!(self, Self::Global)
    }

    #[must_use]
    pub fn bounds(&self) -> Aabb {
        match self {
            Self::Cuboid(c) => c.bounds(),
            Self::Polygon(p) => p.bounds(),
            Self::Global => Aabb::everything(),
        }
    }

    #[must_use]
    pub fn contains(&self, p: BlockVector3) -> bool {
        match self {
            Self::Cuboid(c) => c.contains(p),
            Self::Polygon(poly) => poly.contains(p),
            Self::Global => true,
        }
    }

    fn contains_column(&self, p: BlockVector2) -> bool {
        match self {
            Self::Cuboid(c) => c.contains_column(p),
            Self::Polygon(poly) => poly.contains_column(p),
            Self::Global => true,
        }
    }

    /// The 2-D outline used for edge tests. Empty for the global shape.
    #[must_use]
    pub fn outline(&self) -> Vec<BlockVector2> {
        match self {
            Self::Cuboid(c) => c.outline(),
            Self::Polygon(p) => p.points().to_vec(),
            Self::Global => Vec::new(),
        }
    }

    /// Returns true if the two shapes share at least one block.
    ///
    /// Symmetric for every pair of variants. Non-box pairs first need
    /// overlapping bounding boxes; they then intersect if any edges touch or
    /// if one outline has a vertex inside the other, which catches a shape
    /// lying wholly inside the other.
    #[must_use]
    pub fn intersects(&self, other: &Shape) -> bool {
        match (self, other) {
            (Self::Global, _) | (_, Self::Global) => true,
            (Self::Cuboid(a), Self::Cuboid(b)) => a.bounds().intersects(&b.bounds()),
            _ => {
                if !self.bounds().intersects(&other.bounds()) {
                    return false;
                }
                let mine = self.outline();
                let theirs = other.outline();
                segment::edges_intersect(&mine, &theirs)
                    || mine.iter().any(|p| other.contains_column(*p))
                    || theirs.iter().any(|p| self.contains_column(*p))
            }
        }
    }

    /// Number of blocks covered; `u64::MAX` for the global shape.
    #[must_use]
    pub fn volume(&self) -> u64 {
        match self {
            Self::Cuboid(c) => c.volume(),
            Self::Polygon(p) => p.volume(),
            Self::Global => u64::MAX,
        }
    }
}

impl From<Cuboid> for Shape {
    fn from(c: Cuboid) -> Self {
        Self::Cuboid(c)
    }
}

impl From<Polygon> for Shape {
    fn from(p: Polygon) -> Self {
        Self::Polygon(p)
    }
}
