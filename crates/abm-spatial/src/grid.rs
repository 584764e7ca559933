//! Rectangular tile grid with directional walls.
//!
//! # Data layout
//!
//! Tiles are stored row-major in a single `Vec`:
//!
//! ```text
//! tiles[row * width + col]
//! ```
//!
//! Tile `(col, row)` covers `[col, col + 1) × [row, row + 1)` in world space.
//! North is towards smaller `row`, east towards larger `col`.
//!
//! Walls are configured during scenario setup and treated as read-only once
//! the simulation runs.

use abm_core::Point;

use crate::{SpatialError, SpatialResult};

// ── Direction ─────────────────────────────────────────────────────────────────

/// One of the four tile edges.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::East  => Direction::West,
            Direction::South => Direction::North,
            Direction::West  => Direction::East,
        }
    }

    /// `(dcol, drow)` of the neighbouring tile in this direction.
    pub fn offset(self) -> (i64, i64) {
        match self {
            Direction::North => (0, -1),
            Direction::East  => (1, 0),
            Direction::South => (0, 1),
            Direction::West  => (-1, 0),
        }
    }

    /// Bit used for this edge in a wall mask (N=1, E=2, S=4, W=8).
    #[inline]
    pub fn mask(self) -> u8 {
        match self {
            Direction::North => 0b0001,
            Direction::East  => 0b0010,
            Direction::South => 0b0100,
            Direction::West  => 0b1000,
        }
    }
}

// ── Tile ──────────────────────────────────────────────────────────────────────

/// Integer grid coordinates of a tile.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TileCoord {
    pub col: u32,
    pub row: u32,
}

impl TileCoord {
    #[inline]
    pub fn new(col: u32, row: u32) -> Self {
        Self { col, row }
    }
}

impl std::fmt::Display for TileCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.col, self.row)
    }
}

/// A single grid cell and its four wall flags.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Tile {
    coord: TileCoord,
    walls: u8,
}

impl Tile {
    #[inline]
    pub fn coord(&self) -> TileCoord {
        self.coord
    }

    /// `true` if movement out of this tile through `direction` is blocked.
    #[inline]
    pub fn has_wall(&self, direction: Direction) -> bool {
        self.walls & direction.mask() != 0
    }

    /// Raw wall mask (N=1, E=2, S=4, W=8).
    #[inline]
    pub fn wall_mask(&self) -> u8 {
        self.walls
    }
}

// ── TileGrid ──────────────────────────────────────────────────────────────────

/// Fixed-size grid of [`Tile`]s.
///
/// `has_tile_at(x, y)` is true iff `0 ≤ x < width` and `0 ≤ y < height`.
#[derive(Clone, Debug)]
pub struct TileGrid {
    width:  u32,
    height: u32,
    tiles:  Vec<Tile>,
}

impl TileGrid {
    /// Build a wall-free grid.  Both dimensions must be non-zero.
    pub fn new(width: u32, height: u32) -> SpatialResult<Self> {
        if width == 0 || height == 0 {
            return Err(SpatialError::InvalidDimensions { width, height });
        }
        let tiles = (0..height)
            .flat_map(|row| (0..width).map(move |col| Tile { coord: TileCoord::new(col, row), walls: 0 }))
            .collect();
        Ok(Self { width, height, tiles })
    }

    /// Build a grid from row-major 4-bit wall masks (N=1, E=2, S=4, W=8).
    ///
    /// Masks are taken verbatim; no wall is mirrored onto the neighbour.
    pub fn from_wall_masks(width: u32, height: u32, masks: &[u8]) -> SpatialResult<Self> {
        let mut grid = Self::new(width, height)?;
        if masks.len() != grid.tiles.len() {
            return Err(SpatialError::WallMaskCount {
                expected: grid.tiles.len(),
                got:      masks.len(),
            });
        }
        for (tile, &mask) in grid.tiles.iter_mut().zip(masks) {
            tile.walls = mask & 0b1111;
        }
        Ok(grid)
    }

    // ── Dimensions ────────────────────────────────────────────────────────

    /// `(width, height)`, fixed at construction.
    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn has_tile_at(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < self.width as i64 && y < self.height as i64
    }

    // ── Tile lookup ───────────────────────────────────────────────────────

    pub fn tile_at(&self, x: i64, y: i64) -> SpatialResult<&Tile> {
        if !self.has_tile_at(x, y) {
            return Err(self.out_of_bounds(x as f64, y as f64));
        }
        Ok(&self.tiles[self.index(x as u32, y as u32)])
    }

    /// Same as [`tile_at`](Self::tile_at) for an unsigned coordinate.
    pub fn tile(&self, coord: TileCoord) -> SpatialResult<&Tile> {
        self.tile_at(coord.col as i64, coord.row as i64)
    }

    /// The neighbour of `coord` across its `direction` edge.
    ///
    /// Fails with `OutOfBounds` at the grid edge.
    pub fn adjacent_tile(&self, coord: TileCoord, direction: Direction) -> SpatialResult<&Tile> {
        let (dc, dr) = direction.offset();
        self.tile_at(coord.col as i64 + dc, coord.row as i64 + dr)
    }

    /// Tile whose square contains `point`, or `None` outside the grid.
    pub fn tile_containing(&self, point: Point) -> Option<TileCoord> {
        if !point.is_finite() {
            return None;
        }
        let (col, row) = (point.x.floor(), point.y.floor());
        if col < 0.0 || row < 0.0 || col >= self.width as f64 || row >= self.height as f64 {
            return None;
        }
        Some(TileCoord::new(col as u32, row as u32))
    }

    #[inline]
    pub fn contains(&self, point: Point) -> bool {
        self.tile_containing(point).is_some()
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> + '_ {
        self.tiles.iter()
    }

    // ── Walls ─────────────────────────────────────────────────────────────

    /// `true` if `coord` has a wall on its `direction` edge.
    pub fn has_wall(&self, coord: TileCoord, direction: Direction) -> SpatialResult<bool> {
        Ok(self.tile(coord)?.has_wall(direction))
    }

    /// Set or clear the wall on exactly one edge of one tile.
    ///
    /// The neighbour's matching edge is left untouched.
    pub fn set_wall(&mut self, coord: TileCoord, direction: Direction, present: bool) -> SpatialResult<()> {
        self.tile(coord)?;
        let idx = self.index(coord.col, coord.row);
        let tile = &mut self.tiles[idx];
        if present {
            tile.walls |= direction.mask();
        } else {
            tile.walls &= !direction.mask();
        }
        Ok(())
    }

    /// Set or clear a wall on both sides of the shared edge.
    ///
    /// At the grid border only `coord`'s own edge exists and only that one is
    /// changed.
    pub fn set_barrier(&mut self, coord: TileCoord, direction: Direction, present: bool) -> SpatialResult<()> {
        self.set_wall(coord, direction, present)?;
        let neighbour = match self.adjacent_tile(coord, direction) {
            Ok(tile) => tile.coord(),
            Err(_) => return Ok(()),
        };
        self.set_wall(neighbour, direction.opposite(), present)
    }

    // ── Internals ─────────────────────────────────────────────────────────

    #[inline]
    fn index(&self, col: u32, row: u32) -> usize {
        row as usize * self.width as usize + col as usize
    }

    pub(crate) fn out_of_bounds(&self, x: f64, y: f64) -> SpatialError {
        SpatialError::OutOfBounds { x, y, width: self.width, height: self.height }
    }
}
