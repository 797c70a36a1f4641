// Dense 2D grid of blocks for the cave.
//
// Blocks are stored as a flat `Vec<Block>` indexed by `x + z * size_x`,
// giving O(1) access. Iterating the vector front to back visits rows of
// increasing z, each row in increasing x, which is the order terrain updates
// run in. Out-of-bounds lookups return `None`; every neighbor scan (flood
// spread, cave validation, dig reveals, agent look-ahead) treats `None` as
// "not passable, not diggable, not floodable".
//
// The grid knows nothing about agents beyond the ids stored in each block's
// occupant set. See `map.rs` for the owner that combines the grid with the
// agent arena.
//
// **Critical constraint: determinism.** Iteration order is fixed by the flat
// layout and must not change.

use crate::block::Block;
use crate::types::{Coordinates, TerrainType};

/// Flat 2D grid of blocks.
#[derive(Clone, Debug, Default)]
pub struct Grid {
    /// Flat storage: index = x + z * size_x.
    blocks: Vec<Block>,
    size_x: i32,
    size_z: i32,
}

impl Grid {
    /// Create a grid filled with `Rock`.
    pub fn new(size_x: i32, size_z: i32, flood_duration: f32) -> Self {
        let size_x = size_x.max(0);
        let size_z = size_z.max(0);
        let mut blocks = Vec::with_capacity((size_x as usize) * (size_z as usize));
        for z in 0..size_z {
            for x in 0..size_x {
                blocks.push(Block::new(
                    Coordinates::cell(x, z),
                    TerrainType::Rock,
                    flood_duration,
                ));
            }
        }
        Self {
            blocks,
            size_x,
            size_z,
        }
    }

    pub fn size_x(&self) -> i32 {
        self.size_x
    }

    pub fn size_z(&self) -> i32 {
        self.size_z
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Check whether a coordinate is within bounds. `y` is ignored.
    pub fn in_bounds(&self, coord: Coordinates) -> bool {
        coord.x >= 0 && coord.z >= 0 && coord.x < self.size_x && coord.z < self.size_z
    }

    /// Whether the coordinate lies on the outermost ring.
    pub fn is_border(&self, coord: Coordinates) -> bool {
        self.in_bounds(coord)
            && (coord.x == 0
                || coord.z == 0
                || coord.x == self.size_x - 1
                || coord.z == self.size_z - 1)
    }

    fn index(&self, coord: Coordinates) -> Option<usize> {
        if self.in_bounds(coord) {
            Some(coord.x as usize + coord.z as usize * self.size_x as usize)
        } else {
            None
        }
    }

    pub fn get(&self, coord: Coordinates) -> Option<&Block> {
        self.index(coord).map(|i| &self.blocks[i])
    }

    pub fn get_mut(&mut self, coord: Coordinates) -> Option<&mut Block> {
        self.index(coord).map(move |i| &mut self.blocks[i])
    }

    /// Terrain at a coordinate, or `None` outside the grid.
    pub fn terrain(&self, coord: Coordinates) -> Option<TerrainType> {
        self.get(coord).map(Block::terrain)
    }

    /// All blocks in update order (z-major, x-minor).
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }

    /// All cell coordinates in update order. Does not borrow the grid, so
    /// callers can mutate blocks while walking it.
    pub fn cells(&self) -> impl Iterator<Item = Coordinates> + use<> {
        let size_x = self.size_x;
        let cell = move |i: i32| Coordinates::cell(i % size_x, i / size_x);
        (0..size_x * self.size_z).map(cell)
    }
}
