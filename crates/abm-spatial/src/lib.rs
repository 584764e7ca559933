//! `abm-spatial`: tile grid, point-space index, and wall-aware movement.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                  |
//! |----------------|-----------------------------------------------------------|
//! | [`grid`]       | `TileGrid`, `Tile`, `TileCoord`, `Direction`              |
//! | [`space`]      | `PointSpace` (hash map + R-tree), `DistantObject`         |
//! | [`transition`] | `max_transition`: wall/boundary clipping of a segment    |
//! | [`error`]      | `SpatialError`, `SpatialResult<T>`                        |
//!
//! # Walls are per tile
//!
//! Every tile owns four wall flags.  A wall on the east edge of `(0, 0)` does
//! not put a wall on the west edge of `(1, 0)`: movement from `(0, 0)` east is
//! blocked, movement from `(1, 0)` west is not.  Use
//! [`TileGrid::set_barrier`] when both sides should block.
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on public value types.     |

pub mod error;
pub mod grid;
pub mod space;
pub mod transition;

#[cfg(test)]
mod tests;

pub use error::{SpatialError, SpatialResult};
pub use grid::{Direction, Tile, TileCoord, TileGrid};
pub use space::{DistantObject, PointSpace};
pub use transition::max_transition;
