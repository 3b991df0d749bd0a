//! Block terrain consumed by movement and ground checks.

use std::collections::HashMap;

use glam::{IVec3, Vec3};
use survival_math::Footprint;
use survival_net::WorldType;

/// Identifier of a block type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct BlockId(pub u16);

impl BlockId {
    pub const AIR: Self = Self(0);
    pub const STONE: Self = Self(1);
    pub const DIRT: Self = Self(2);
    pub const WATER: Self = Self(3);
}

/// Read access to the block grid.
///
/// Implementations are shared with the simulation task and must be cheap to
/// query; [`block_at`](Terrain::block_at) is called several times per
/// entity per tick.
pub trait Terrain: Send + Sync {
    /// The block occupying cell `(x, y, z)` of `world`.
    fn block_at(&self, x: i32, y: i32, z: i32, world: WorldType) -> BlockId;

    /// Whether `block` stops movement.
    fn is_solid(&self, block: BlockId) -> bool {
        !matches!(block, BlockId::AIR | BlockId::WATER)
    }

    /// Whether the cell at `cell` is solid.
    fn solid_at(&self, cell: IVec3, world: WorldType) -> bool {
        self.is_solid(self.block_at(cell.x, cell.y, cell.z, world))
    }
}

/// Whether a body with `footprint` at `position` stands on solid ground.
///
/// Samples below the centre and below each of the four corners, so an
/// entity overhanging a ledge by less than its half-width stays grounded.
#[must_use]
pub fn is_grounded(
    terrain: &dyn Terrain,
    world: WorldType,
    position: Vec3,
    footprint: &Footprint,
) -> bool {
    footprint
        .ground_samples(position)
        .iter()
        .any(|&cell| terrain.solid_at(cell, world))
}

/// Whether a body with `footprint` at `position` overlaps any solid cell.
#[must_use]
pub fn collides(
    terrain: &dyn Terrain,
    world: WorldType,
    position: Vec3,
    footprint: &Footprint,
) -> bool {
    let (min, max) = footprint.cell_bounds(position);
    for y in min.y..=max.y {
        for x in min.x..=max.x {
            for z in min.z..=max.z {
                if terrain.solid_at(IVec3::new(x, y, z), world) {
                    return true;
                }
            }
        }
    }
    false
}

/// Terrain that is solid at or below a fixed ground level, with explicit
/// per-cell overrides on top.
#[derive(Debug, Clone)]
pub struct FlatTerrain {
    ground_level: i32,
    overrides: HashMap<(WorldType, IVec3), BlockId>,
}

impl FlatTerrain {
    /// Solid ground fills every cell with `y <= ground_level`.
    #[must_use]
    pub fn new(ground_level: i32) -> Self {
        Self {
            ground_level,
            overrides: HashMap::new(),
        }
    }

    /// Place `block` at `cell`, replacing whatever the flat fill had there.
    pub fn set_block(&mut self, world: WorldType, cell: IVec3, block: BlockId) {
        self.overrides.insert((world, cell), block);
    }

    /// Builder form of [`set_block`](Self::set_block).
    #[must_use]
    pub fn with_block(mut self, world: WorldType, cell: IVec3, block: BlockId) -> Self {
        self.set_block(world, cell, block);
        self
    }

    #[must_use]
    pub fn ground_level(&self) -> i32 {
        self.ground_level
    }
}

impl Terrain for FlatTerrain {
    fn block_at(&self, x: i32, y: i32, z: i32, world: WorldType) -> BlockId {
        if let Some(block) = self.overrides.get(&(world, IVec3::new(x, y, z))) {
            return *block;
        }
        if y <= self.ground_level {
            BlockId::STONE
        } else {
            BlockId::AIR
        }
    }
}
