//! Axis-aligned collider footprint.
//!
//! A [`Footprint`] is an upright box centred on an entity's position in X/Z
//! and standing on it in Y. Positions mark the feet, so the box spans
//! `[y, y + height]`.

use glam::{IVec3, Vec3};
use serde::{Deserialize, Serialize};

/// Vertical distance below the feet at which ground is sampled.
pub const GROUND_PROBE: f32 = 0.05;

/// Inset applied to box faces so touching a wall is not counted as overlap.
const SKIN: f32 = 1.0e-3;

/// Horizontal half-extent and height of an upright collider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    /// Half of the box width along X and Z.
    pub half_width: f32,
    /// Box height along Y.
    pub height: f32,
}

impl Footprint {
    /// A humanoid-sized collider.
    pub const HUMANOID: Self = Self {
        half_width: 0.3,
        height: 1.8,
    };

    /// Create a footprint.
    #[must_use]
    pub const fn new(half_width: f32, height: f32) -> Self {
        Self { half_width, height }
    }

    /// Block coordinates sampled to decide whether an entity at `position`
    /// stands on something: directly below the centre, then below each of
    /// the four horizontal corners.
    #[must_use]
    pub fn ground_samples(&self, position: Vec3) -> [IVec3; 5] {
        let y = (position.y - GROUND_PROBE).floor() as i32;
        let hw = self.half_width - SKIN;
        let cell = |x: f32, z: f32| IVec3::new(x.floor() as i32, y, z.floor() as i32);
        [
            cell(position.x, position.z),
            cell(position.x - hw, position.z - hw),
            cell(position.x + hw, position.z - hw),
            cell(position.x - hw, position.z + hw),
            cell(position.x + hw, position.z + hw),
        ]
    }

    /// Inclusive range of block cells overlapped by the box at `position`.
    #[must_use]
    pub fn cell_bounds(&self, position: Vec3) -> (IVec3, IVec3) {
        let hw = self.half_width - SKIN;
        let min = Vec3::new(position.x - hw, position.y + SKIN, position.z - hw);
        let max = Vec3::new(
            position.x + hw,
            position.y + self.height - SKIN,
            position.z + hw,
        );
        (min.floor().as_ivec3(), max.floor().as_ivec3())
    }
}

impl Default for Footprint {
    fn default() -> Self {
        Self::HUMANOID
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ground_samples_cover_centre_and_corners() {
        let fp = Footprint::new(0.3, 1.8);
        let samples = fp.ground_samples(Vec3::new(0.5, 1.0, 0.5));
        // Every sample lies in the layer below the feet.
        assert!(samples.iter().all(|c| c.y == 0));
        assert_eq!(samples[0], IVec3::new(0, 0, 0));
    }

    #[test]
    fn test_ground_samples_straddle_a_ledge() {
        let fp = Footprint::new(0.3, 1.8);
        // Centre over x = 1 but the -x corners hang over x = 0.
        let samples = fp.ground_samples(Vec3::new(1.1, 1.0, 0.5));
        assert_eq!(samples[0].x, 1);
        assert!(samples.iter().any(|c| c.x == 0));
    }

    #[test]
    fn test_cell_bounds_span_height() {
        let fp = Footprint::new(0.3, 1.8);
        let (min, max) = fp.cell_bounds(Vec3::new(0.5, 1.0, 0.5));
        assert_eq!(min, IVec3::new(0, 1, 0));
        assert_eq!(max, IVec3::new(0, 2, 0));
    }
}
