//! Axis-aligned bounding boxes.

use regionguard_types::BlockVector3;
use serde::{Deserialize, Serialize};

/// An inclusive axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Aabb {
    pub min: BlockVector3,
    pub max: BlockVector3,
}

impl Aabb {
    /// Builds a box from two arbitrary corners.
    #[must_use]
    pub fn new(a: BlockVector3, b: BlockVector3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// The box covering every representable block.
    #[must_use]
    pub const fn everything() -> Self {
        Self {
            min: BlockVector3::new(i32::MIN, i32::MIN, i32::MIN),
            max: BlockVector3::new(i32::MAX, i32::MAX, i32::MAX),
        }
    }

    #[must_use]
    pub fn contains(&self, p: BlockVector3) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    /// Returns true if the two boxes share at least one block.
    #[must_use]
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }
}
