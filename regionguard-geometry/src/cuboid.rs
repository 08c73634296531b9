//! Axis-aligned box regions.

use regionguard_types::{BlockVector2, BlockVector3};
use serde::{Deserialize, Serialize};

use crate::bounds::Aabb;

/// A box spanning `min..=max` on every axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "CuboidCorners")]
pub struct Cuboid {
    min: BlockVector3,
    max: BlockVector3,
}

#[derive(Deserialize)]
struct CuboidCorners {
    min: BlockVector3,
    max: BlockVector3,
}

impl From<CuboidCorners> for Cuboid {
    fn from(c: CuboidCorners) -> Self {
        Self::new(c.min, c.max)
    }
}

impl Cuboid {
    /// Builds a cuboid from any two opposite corners.
    #[must_use]
    pub fn new(a: BlockVector3, b: BlockVector3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    #[must_use]
    pub const fn min(&self) -> BlockVector3 {
        self.min
    }

    #[must_use]
    pub const fn max(&self) -> BlockVector3 {
        self.max
    }

    #[must_use]
    pub fn bounds(&self) -> Aabb {
        Aabb {
            min: self.min,
            max: self.max,
        }
    }

    /// Inclusive on both corners.
    #[must_use]
    pub fn contains(&self, p: BlockVector3) -> bool {
        self.bounds().contains(p)
    }

    pub(crate) fn contains_column(&self, p: BlockVector2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.z >= self.min.z && p.z <= self.max.z
    }

    /// The four footprint corners, in winding order.
    #[must_use]
    pub fn outline(&self) -> Vec<BlockVector2> {
        vec![
            BlockVector2::new(self.min.x, self.min.z),
            BlockVector2::new(self.max.x, self.min.z),
            BlockVector2::new(self.max.x, self.max.z),
            BlockVector2::new(self.min.x, self.max.z),
        ]
    }

    /// Number of blocks inside, saturating at `u64::MAX`.
    #[must_use]
    pub fn volume(&self) -> u64 {
        let extent = |lo: i32, hi: i32| (i64::from(hi) - i64::from(lo) + 1) as u128;
        let blocks = extent(self.min.x, self.max.x)
            * extent(self.min.y, self.max.y)
            * extent(self.min.z, self.max.z);
        u64::try_from(blocks).unwrap_or(u64::MAX)
    }
}
