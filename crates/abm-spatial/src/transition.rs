//! Wall- and boundary-aware clipping of straight-line movement.
//!
//! # Algorithm
//!
//! The segment `origin → destination` is walked tile by tile (a 2-D DDA, as
//! in Amanatides & Woo).  For each axis we keep the parameter `t ∈ [0, 1]` at
//! which the segment next crosses a vertical or horizontal tile boundary:
//!
//! ```text
//! t_max_x = (next_col_boundary - origin.x) / dx
//! t_max_y = (next_row_boundary - origin.y) / dy
//! ```
//!
//! Each parameter is recomputed from the boundary after a step instead of
//! accumulated, so rounding does not drift along long segments.  The smaller
//! of the two is the next crossing.  If the tile being left has a wall on
//! that edge, or there is no tile beyond it, the walk stops and the crossing
//! point is pulled one ULP back inside the tile being left.  A segment
//! blocked before it leaves the origin (`t = 0`) yields the origin.  When both
//! crossings coincide (the segment passes exactly through a corner) the
//! column boundary is taken first.
//!
//! The result never lies on a tile boundary that belongs to another tile, so
//! its tile membership is always well defined.

use abm_core::Point;

use crate::{Direction, SpatialError, SpatialResult, TileCoord, TileGrid};

/// The farthest point reachable along `origin → destination` without passing
/// through a wall or leaving the grid.
///
/// Returns `destination` unchanged when nothing blocks the way (including
/// when both points are in the same tile).  `origin` must be inside the grid.
pub fn max_transition(grid: &TileGrid, origin: Point, destination: Point) -> SpatialResult<Point> {
    if !origin.is_finite() || !destination.is_finite() {
        return Err(SpatialError::NonFinite);
    }
    let start = grid
        .tile_containing(origin)
        .ok_or_else(|| grid.out_of_bounds(origin.x, origin.y))?;
    let end = grid.tile_containing(destination);
    if end == Some(start) {
        return Ok(destination);
    }

    let dx = destination.x - origin.x;
    let dy = destination.y - origin.y;

    let step_x: i64 = if dx > 0.0 { 1 } else if dx < 0.0 { -1 } else { 0 };
    let step_y: i64 = if dy > 0.0 { 1 } else if dy < 0.0 { -1 } else { 0 };

    let mut col = start.col as i64;
    let mut row = start.row as i64;

    let mut t_max_x = first_crossing(origin.x, col, dx);
    let mut t_max_y = first_crossing(origin.y, row, dy);

    loop {
        // col/row only ever step onto tiles that exist, so the casts are exact.
        let here = TileCoord::new(col as u32, row as u32);
        if end == Some(here) {
            return Ok(destination);
        }

        let cross_col = t_max_x <= t_max_y;
        let t = if cross_col { t_max_x } else { t_max_y };
        if t > 1.0 {
            // Rounding put the last crossing beyond the destination.
            return Ok(clamp_into(here, destination));
        }

        let direction = match (cross_col, step_x > 0, step_y > 0) {
            (true, true, _)   => Direction::East,
            (true, false, _)  => Direction::West,
            (false, _, true)  => Direction::South,
            (false, _, false) => Direction::North,
        };

        let blocked = grid.tile(here)?.has_wall(direction)
            || grid.adjacent_tile(here, direction).is_err();
        if blocked {
            if t <= 0.0 {
                return Ok(origin);
            }
            let crossing = Point::new(origin.x + t * dx, origin.y + t * dy);
            return Ok(pull_inside(here, direction, crossing));
        }

        if cross_col {
            col += step_x;
            t_max_x = first_crossing(origin.x, col, dx);
        } else {
            row += step_y;
            t_max_y = first_crossing(origin.y, row, dy);
        }
    }
}

/// Parameter of the first boundary crossing along one axis.
fn first_crossing(start: f64, cell: i64, delta: f64) -> f64 {
    if delta > 0.0 {
        ((cell + 1) as f64 - start) / delta
    } else if delta < 0.0 {
        (cell as f64 - start) / delta
    } else {
        f64::INFINITY
    }
}

/// Replace the blocked coordinate of `crossing` by the value one ULP inside
/// `tile`, then clamp the other coordinate into the tile as well.
fn pull_inside(tile: TileCoord, direction: Direction, crossing: Point) -> Point {
    let (lo_x, hi_x) = (tile.col as f64, (tile.col + 1) as f64);
    let (lo_y, hi_y) = (tile.row as f64, (tile.row + 1) as f64);
    let p = match direction {
        Direction::East  => Point::new(just_below(hi_x), crossing.y),
        Direction::West  => Point::new(just_above(lo_x), crossing.y),
        Direction::South => Point::new(crossing.x, just_below(hi_y)),
        Direction::North => Point::new(crossing.x, just_above(lo_y)),
    };
    clamp_into(tile, p)
}

fn clamp_into(tile: TileCoord, p: Point) -> Point {
    let (lo_x, hi_x) = (tile.col as f64, (tile.col + 1) as f64);
    let (lo_y, hi_y) = (tile.row as f64, (tile.row + 1) as f64);
    Point::new(p.x.clamp(lo_x, just_below(hi_x)), p.y.clamp(lo_y, just_below(hi_y)))
}

/// Gap between `value` and the next representable `f64` above `|value|`.
#[inline]
pub(crate) fn ulp(value: f64) -> f64 {
    let v = value.abs();
    f64::from_bits(v.to_bits() + 1) - v
}

#[inline]
pub(crate) fn just_below(boundary: f64) -> f64 {
    boundary - ulp(boundary)
}

#[inline]
pub(crate) fn just_above(boundary: f64) -> f64 {
    boundary + ulp(boundary)
}
