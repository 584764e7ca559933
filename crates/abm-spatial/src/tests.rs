//! Unit tests for abm-spatial.
//!
//! All tests use small hand-built grids so wall layouts can be reasoned about
//! directly.

#[cfg(test)]
mod helpers {
    use abm_core::{AgentId, Point};
    use crate::{PointSpace, TileGrid};

    pub fn grid(width: u32, height: u32) -> TileGrid {
        TileGrid::new(width, height).unwrap()
    }

    /// A 10×10 open space with four agents:
    ///
    ///   0:(1.5,1.5)  1:(2.5,1.5)  2:(1.5,4.5)  3:(8.5,8.5)
    pub fn populated_space() -> PointSpace {
        let mut space = PointSpace::new(grid(10, 10));
        space.insert(AgentId(0), Point::new(1.5, 1.5)).unwrap();
        space.insert(AgentId(1), Point::new(2.5, 1.5)).unwrap();
        space.insert(AgentId(2), Point::new(1.5, 4.5)).unwrap();
        space.insert(AgentId(3), Point::new(8.5, 8.5)).unwrap();
        space
    }
}

// ── Tile grid ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod grid {
    use abm_core::Point;
    use crate::{Direction, SpatialError, TileCoord, TileGrid};

    use super::helpers::grid;

    #[test]
    fn size_and_membership() {
        let g = grid(3, 2);
        assert_eq!(g.size(), (3, 2));
        assert!(g.has_tile_at(0, 0));
        assert!(g.has_tile_at(2, 1));
        assert!(!g.has_tile_at(3, 0));
        assert!(!g.has_tile_at(0, 2));
        assert!(!g.has_tile_at(-1, 0));
        assert_eq!(g.tiles().count(), 6);
    }

    #[test]
    fn zero_dimensions_rejected() {
        assert!(matches!(
            TileGrid::new(0, 3),
            Err(SpatialError::InvalidDimensions { width: 0, height: 3 })
        ));
    }

    #[test]
    fn tile_at_out_of_bounds() {
        let g = grid(3, 3);
        assert_eq!(g.tile_at(1, 2).unwrap().coord(), TileCoord::new(1, 2));
        assert!(matches!(g.tile_at(3, 0), Err(SpatialError::OutOfBounds { .. })));
        assert!(matches!(g.tile_at(0, -1), Err(SpatialError::OutOfBounds { .. })));
    }

    #[test]
    fn adjacent_tiles_and_edges() {
        let g = grid(3, 3);
        let centre = TileCoord::new(1, 1);
        assert_eq!(g.adjacent_tile(centre, Direction::North).unwrap().coord(), TileCoord::new(1, 0));
        assert_eq!(g.adjacent_tile(centre, Direction::East).unwrap().coord(), TileCoord::new(2, 1));
        assert_eq!(g.adjacent_tile(centre, Direction::South).unwrap().coord(), TileCoord::new(1, 2));
        assert_eq!(g.adjacent_tile(centre, Direction::West).unwrap().coord(), TileCoord::new(0, 1));

        let corner = TileCoord::new(0, 0);
        assert!(g.adjacent_tile(corner, Direction::North).is_err());
        assert!(g.adjacent_tile(corner, Direction::West).is_err());
    }

    #[test]
    fn walls_are_one_sided() {
        let mut g = grid(3, 3);
        let a = TileCoord::new(0, 0);
        let b = TileCoord::new(1, 0);
        g.set_wall(a, Direction::East, true).unwrap();
        assert!(g.has_wall(a, Direction::East).unwrap());
        assert!(!g.has_wall(b, Direction::West).unwrap(), "neighbour must not be mirrored");

        g.set_wall(a, Direction::East, false).unwrap();
        assert!(!g.has_wall(a, Direction::East).unwrap());
    }

    #[test]
    fn barrier_sets_both_sides() {
        let mut g = grid(3, 3);
        let a = TileCoord::new(1, 1);
        g.set_barrier(a, Direction::South, true).unwrap();
        assert!(g.has_wall(a, Direction::South).unwrap());
        assert!(g.has_wall(TileCoord::new(1, 2), Direction::North).unwrap());

        // At the border only the own edge exists.
        g.set_barrier(TileCoord::new(0, 0), Direction::North, true).unwrap();
        assert!(g.has_wall(TileCoord::new(0, 0), Direction::North).unwrap());
    }

    #[test]
    fn wall_masks_load_verbatim() {
        // Tile (0,0): east wall only.  Tile (1,0): north + west.
        let g = TileGrid::from_wall_masks(2, 1, &[0b0010, 0b1001]).unwrap();
        assert!(g.has_wall(TileCoord::new(0, 0), Direction::East).unwrap());
        assert!(!g.has_wall(TileCoord::new(0, 0), Direction::West).unwrap());
        assert!(g.has_wall(TileCoord::new(1, 0), Direction::North).unwrap());
        assert!(g.has_wall(TileCoord::new(1, 0), Direction::West).unwrap());
        assert_eq!(g.tile_at(1, 0).unwrap().wall_mask(), 0b1001);
    }

    #[test]
    fn wall_mask_count_checked() {
        assert!(matches!(
            TileGrid::from_wall_masks(2, 2, &[0, 0, 0]),
            Err(SpatialError::WallMaskCount { expected: 4, got: 3 })
        ));
    }

    #[test]
    fn tile_containing_floors() {
        let g = grid(3, 3);
        assert_eq!(g.tile_containing(Point::new(0.0, 0.0)), Some(TileCoord::new(0, 0)));
        assert_eq!(g.tile_containing(Point::new(1.0, 2.999)), Some(TileCoord::new(1, 2)));
        assert_eq!(g.tile_containing(Point::new(3.0, 0.5)), None);
        assert_eq!(g.tile_containing(Point::new(-0.1, 0.5)), None);
        assert_eq!(g.tile_containing(Point::new(f64::NAN, 0.5)), None);
    }

    #[test]
    fn direction_helpers() {
        for d in Direction::ALL {
            assert_eq!(d.opposite().opposite(), d);
            let (dc, dr) = d.offset();
            let (oc, or) = d.opposite().offset();
            assert_eq!((dc + oc, dr + or), (0, 0));
        }
    }
}

// ── maxTransition ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod transition {
    use abm_core::Point;
    use crate::{Direction, SpatialError, TileCoord, max_transition};

    use super::helpers::grid;

    #[test]
    fn north_wall_clips_at_zero() {
        let mut g = grid(3, 3);
        g.set_wall(TileCoord::new(0, 0), Direction::North, true).unwrap();
        let p = max_transition(&g, Point::new(0.5, 0.5), Point::new(0.5, -0.5)).unwrap();
        assert!(p.y >= 0.0, "must not go negative: {p:?}");
        assert!(p.y.abs() < 1e-12);
        assert_eq!(p.x, 0.5);
        assert_eq!(g.tile_containing(p), Some(TileCoord::new(0, 0)));
    }

    #[test]
    fn east_wall_stops_one_ulp_short() {
        let mut g = grid(3, 3);
        g.set_wall(TileCoord::new(0, 0), Direction::East, true).unwrap();
        let p = max_transition(&g, Point::new(0.0, 0.0), Point::new(2.0, 0.0)).unwrap();
        assert_eq!(p, Point::new(1.0 - f64::EPSILON, 0.0));
        assert!((p.x - 0.999_999_999_999_999_778).abs() < 1e-17);
        assert_eq!(g.tile_containing(p), Some(TileCoord::new(0, 0)));
    }

    #[test]
    fn no_wall_passthrough_is_exact() {
        let g = grid(5, 5);
        let dest = Point::new(4.25, 3.75);
        assert_eq!(max_transition(&g, Point::new(0.1, 0.2), dest).unwrap(), dest);
    }

    #[test]
    fn same_tile_returns_destination() {
        let mut g = grid(3, 3);
        for d in Direction::ALL {
            g.set_wall(TileCoord::new(1, 1), d, true).unwrap();
        }
        let dest = Point::new(1.9, 1.1);
        assert_eq!(max_transition(&g, Point::new(1.1, 1.9), dest).unwrap(), dest);
    }

    #[test]
    fn grid_boundary_clips() {
        let g = grid(3, 3);
        let p = max_transition(&g, Point::new(2.5, 1.5), Point::new(4.5, 1.5)).unwrap();
        assert_eq!(p, Point::new(3.0 - 2.0 * f64::EPSILON, 1.5));
        assert_eq!(g.tile_containing(p), Some(TileCoord::new(2, 1)));

        let p = max_transition(&g, Point::new(0.5, 0.5), Point::new(-3.0, 0.5)).unwrap();
        assert!(p.x >= 0.0 && p.x < 1e-300);
        assert_eq!(g.tile_containing(p), Some(TileCoord::new(0, 0)));
    }

    #[test]
    fn wall_on_far_side_is_ignored() {
        // Wall on (1,0)'s west edge does not block travel from (0,0) east.
        let mut g = grid(3, 3);
        g.set_wall(TileCoord::new(1, 0), Direction::West, true).unwrap();
        let dest = Point::new(2.5, 0.5);
        assert_eq!(max_transition(&g, Point::new(0.5, 0.5), dest).unwrap(), dest);

        // ... but does block travel from (1,0) west.
        let p = max_transition(&g, Point::new(1.5, 0.5), Point::new(0.5, 0.5)).unwrap();
        assert_eq!(g.tile_containing(p), Some(TileCoord::new(1, 0)));
        assert!(p.x > 1.0 && p.x < 1.0 + 1e-12);
    }

    #[test]
    fn wall_several_tiles_away() {
        let mut g = grid(5, 1);
        g.set_wall(TileCoord::new(3, 0), Direction::East, true).unwrap();
        let p = max_transition(&g, Point::new(0.5, 0.5), Point::new(4.5, 0.5)).unwrap();
        assert_eq!(g.tile_containing(p), Some(TileCoord::new(3, 0)));
        assert!((p.x - 4.0).abs() < 1e-12 && p.x < 4.0);
    }

    #[test]
    fn diagonal_clip_keeps_line() {
        // Wall south of (0,0); moving down-right from (0.25,0.5) to (1.25,1.5)
        // crosses y = 1 at x = 0.75, which is still in column 0.
        let mut g = grid(3, 3);
        g.set_wall(TileCoord::new(0, 0), Direction::South, true).unwrap();
        let p = max_transition(&g, Point::new(0.25, 0.5), Point::new(1.25, 1.5)).unwrap();
        assert_eq!(g.tile_containing(p), Some(TileCoord::new(0, 0)));
        assert!((p.x - 0.75).abs() < 1e-12);
        assert!(p.y < 1.0 && p.y > 1.0 - 1e-12);
    }

    #[test]
    fn corner_crossing_checks_column_first() {
        // Segment passes exactly through the (1,1) corner.  With no east wall
        // on (0,0) it enters (1,0) first and is stopped by (1,0)'s south wall.
        let mut g = grid(3, 3);
        g.set_wall(TileCoord::new(1, 0), Direction::South, true).unwrap();
        let p = max_transition(&g, Point::new(0.5, 0.5), Point::new(1.5, 1.5)).unwrap();
        assert_eq!(g.tile_containing(p), Some(TileCoord::new(1, 0)));
    }

    #[test]
    fn origin_outside_grid_is_error() {
        let g = grid(3, 3);
        assert!(matches!(
            max_transition(&g, Point::new(-1.0, 0.5), Point::new(0.5, 0.5)),
            Err(SpatialError::OutOfBounds { .. })
        ));
        assert!(matches!(
            max_transition(&g, Point::new(0.5, 0.5), Point::new(f64::NAN, 0.5)),
            Err(SpatialError::NonFinite)
        ));
    }
}

// ── Point space ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod space {
    use abm_core::{AgentId, Motion, Point};
    use crate::{Direction, PointSpace, SpatialError, TileCoord};

    use super::helpers::{grid, populated_space};

    #[test]
    fn insert_and_lookup() {
        let space = populated_space();
        assert_eq!(space.len(), 4);
        assert!(space.contains(AgentId(2)));
        assert_eq!(space.position_of(AgentId(1)).unwrap(), Point::new(2.5, 1.5));
    }

    #[test]
    fn duplicate_insertion_rejected() {
        let mut space = populated_space();
        assert_eq!(
            space.insert(AgentId(0), Point::new(5.0, 5.0)),
            Err(SpatialError::DuplicateInsertion(AgentId(0)))
        );
        assert_eq!(space.position_of(AgentId(0)).unwrap(), Point::new(1.5, 1.5));
    }

    #[test]
    fn insert_outside_grid_rejected() {
        let mut space = PointSpace::new(grid(2, 2));
        assert!(matches!(
            space.insert(AgentId(0), Point::new(2.0, 0.5)),
            Err(SpatialError::OutOfBounds { .. })
        ));
        assert!(space.is_empty());
    }

    #[test]
    fn remove_reports_presence() {
        let mut space = populated_space();
        assert!(space.remove(AgentId(1)));
        assert!(!space.remove(AgentId(1)));
        assert_eq!(space.position_of(AgentId(1)), Err(SpatialError::NotFound(AgentId(1))));
        assert!(space.range_query(Point::new(2.5, 1.5), 0.1).is_empty());
    }

    #[test]
    fn relocate_overwrites_point() {
        let mut space = populated_space();
        space.relocate(AgentId(3), Point::new(0.5, 0.5)).unwrap();
        assert_eq!(space.position_of(AgentId(3)).unwrap(), Point::new(0.5, 0.5));
        assert!(space.range_query(Point::new(8.5, 8.5), 1.0).is_empty());
        assert_eq!(
            space.relocate(AgentId(9), Point::new(0.5, 0.5)),
            Err(SpatialError::NotFound(AgentId(9)))
        );
    }

    #[test]
    fn range_query_is_inclusive_and_sorted() {
        let space = populated_space();
        let hits = space.range_query(Point::new(1.5, 1.5), 3.0);
        let ids: Vec<_> = hits.iter().map(|h| h.id).collect();
        assert_eq!(ids, vec![AgentId(0), AgentId(1), AgentId(2)]);
        assert_eq!(hits[2].distance, 3.0, "distance == radius is included");
    }

    #[test]
    fn range_query_on_empty_space() {
        let space = PointSpace::new(grid(4, 4));
        assert!(space.range_query(Point::new(1.0, 1.0), 100.0).is_empty());
        assert!(populated_space().range_query(Point::new(1.0, 1.0), -1.0).is_empty());
    }

    #[test]
    fn nearest_neighbors_order() {
        let space = populated_space();
        let near = space.nearest_neighbors(Point::new(2.4, 1.5), 2);
        assert_eq!(near.len(), 2);
        assert_eq!(near[0].id, AgentId(1));
        assert_eq!(near[1].id, AgentId(0));
        assert!(near[0].distance <= near[1].distance);

        assert_eq!(space.nearest_neighbors(Point::new(0.0, 0.0), 10).len(), 4);
        assert!(space.nearest_neighbors(Point::new(0.0, 0.0), 0).is_empty());
    }

    #[test]
    fn nearest_neighbors_with_huge_k_returns_everything() {
        let mut space = PointSpace::new(grid(3, 3));
        space.insert(AgentId(0), Point::new(1.5, 1.5)).unwrap();
        let near = space.nearest_neighbors(Point::new(1.0, 1.0), usize::MAX);
        assert_eq!(near.len(), 1);
        assert_eq!(near[0].id, AgentId(0));

        assert_eq!(populated_space().nearest_neighbors(Point::new(0.0, 0.0), 1_000_000_000).len(), 4);
    }

    #[test]
    fn nearest_neighbor_ties_follow_insertion_order() {
        let mut space = PointSpace::new(grid(10, 10));
        // Four agents on a ring around (5,5), inserted in a fixed order.
        let ring = [(5.0, 4.0), (6.0, 5.0), (5.0, 6.0), (4.0, 5.0)];
        for (i, &(x, y)) in ring.iter().enumerate() {
            space.insert(AgentId(10 + i as u32), Point::new(x, y)).unwrap();
        }
        for _ in 0..3 {
            let near = space.nearest_neighbors(Point::new(5.0, 5.0), 2);
            let ids: Vec<_> = near.iter().map(|h| h.id).collect();
            assert_eq!(ids, vec![AgentId(10), AgentId(11)]);
        }
    }

    #[test]
    fn visible_neighbors_exclude_self_and_ignore_walls() {
        let mut space = populated_space();
        space
            .grid_mut()
            .set_barrier(TileCoord::new(1, 1), Direction::East, true)
            .unwrap();
        let seen = space.visible_neighbors(AgentId(0), 1.0).unwrap();
        let ids: Vec<_> = seen.iter().map(|h| h.id).collect();
        assert_eq!(ids, vec![AgentId(1)]);
        assert!(space.visible_neighbors(AgentId(42), 1.0).is_err());
    }

    #[test]
    fn move_object_clips_and_updates_index() {
        let mut space = PointSpace::new(grid(3, 3));
        space.grid_mut().set_wall(TileCoord::new(0, 0), Direction::East, true).unwrap();
        space.insert(AgentId(0), Point::new(0.0, 0.0)).unwrap();

        let reached = space.move_object(AgentId(0), Motion::new(2.0, 0.0)).unwrap();
        assert_eq!(reached, Point::new(1.0 - f64::EPSILON, 0.0));
        assert_eq!(space.position_of(AgentId(0)).unwrap(), reached);
        assert_eq!(space.nearest_neighbors(reached, 1)[0].id, AgentId(0));
    }

    #[test]
    fn fully_blocked_move_returns_origin() {
        // Already on the west grid edge, moving further west.
        let mut space = PointSpace::new(grid(3, 3));
        let origin = Point::new(0.0, 0.5);
        space.insert(AgentId(0), origin).unwrap();
        let reached = space.move_object(AgentId(0), Motion::new(-1.0, 0.0)).unwrap();
        assert_eq!(reached, origin);
        assert_eq!(space.position_of(AgentId(0)).unwrap(), origin);

        // Pressed against a north wall from the inside.
        let mut walled = PointSpace::new(grid(3, 3));
        walled.grid_mut().set_wall(TileCoord::new(1, 1), Direction::North, true).unwrap();
        let origin = Point::new(1.5, 1.0 + f64::EPSILON);
        walled.insert(AgentId(1), origin).unwrap();
        let reached = walled.move_object(AgentId(1), Motion::new(0.0, -0.5)).unwrap();
        assert_eq!(reached, origin);
    }

    #[test]
    fn move_unknown_agent_fails() {
        let mut space = populated_space();
        assert_eq!(
            space.move_object(AgentId(77), Motion::new(1.0, 0.0)),
            Err(SpatialError::NotFound(AgentId(77)))
        );
    }

    #[test]
    fn iter_follows_insertion_order() {
        let mut space = populated_space();
        space.relocate(AgentId(0), Point::new(9.5, 9.5)).unwrap();
        let ids: Vec<_> = space.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![AgentId(0), AgentId(1), AgentId(2), AgentId(3)]);
    }
}

// ── Randomised properties ─────────────────────────────────────────────────────

#[cfg(test)]
mod properties {
    use abm_core::{AgentId, Point};
    use proptest::prelude::*;

    use crate::{Direction, PointSpace, TileCoord, TileGrid, max_transition};

    const SIZE: u32 = 8;

    prop_compose! {
        fn arb_point()(x in 0.0f64..SIZE as f64, y in 0.0f64..SIZE as f64) -> Point {
            Point::new(x, y)
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn range_query_matches_brute_force(
            points in prop::collection::vec(arb_point(), 0..60),
            center in arb_point(),
            radius in 0.0f64..6.0,
        ) {
            let mut space = PointSpace::new(TileGrid::new(SIZE, SIZE).unwrap());
            for (i, p) in points.iter().enumerate() {
                space.insert(AgentId(i as u32), *p).unwrap();
            }

            let mut got: Vec<AgentId> = space.range_query(center, radius).iter().map(|h| h.id).collect();
            let mut expected: Vec<AgentId> = points
                .iter()
                .enumerate()
                .filter(|(_, p)| center.distance(**p) <= radius)
                .map(|(i, _)| AgentId(i as u32))
                .collect();
            got.sort();
            expected.sort();
            prop_assert_eq!(got, expected);
        }

        #[test]
        fn nearest_neighbors_are_the_k_smallest(
            points in prop::collection::vec(arb_point(), 1..40),
            query in arb_point(),
            k in 1usize..10,
        ) {
            let mut space = PointSpace::new(TileGrid::new(SIZE, SIZE).unwrap());
            for (i, p) in points.iter().enumerate() {
                space.insert(AgentId(i as u32), *p).unwrap();
            }
            let near = space.nearest_neighbors(query, k);
            prop_assert_eq!(near.len(), k.min(points.len()));

            let mut all: Vec<f64> = points.iter().map(|p| query.distance(*p)).collect();
            all.sort_by(f64::total_cmp);
            for (hit, want) in near.iter().zip(all.iter()) {
                prop_assert!((hit.distance - want).abs() < 1e-12);
            }
        }

        #[test]
        fn clipped_point_stays_inside_grid(
            origin in arb_point(),
            dx in -12.0f64..12.0,
            dy in -12.0f64..12.0,
            masks in prop::collection::vec(0u8..16, (SIZE * SIZE) as usize),
        ) {
            let grid = TileGrid::from_wall_masks(SIZE, SIZE, &masks).unwrap();
            let dest = Point::new(origin.x + dx, origin.y + dy);
            let reached = max_transition(&grid, origin, dest).unwrap();
            prop_assert!(grid.contains(reached), "{:?} left the grid", reached);
            if grid.contains(dest) && grid.tile_containing(dest) == grid.tile_containing(reached) {
                prop_assert_eq!(reached, dest);
            }
        }

        #[test]
        fn open_grid_passthrough(origin in arb_point(), dest in arb_point()) {
            let grid = TileGrid::new(SIZE, SIZE).unwrap();
            prop_assert_eq!(max_transition(&grid, origin, dest).unwrap(), dest);
        }

        #[test]
        fn enclosed_tile_never_escapes(
            x in 3.0f64..4.0,
            y in 3.0f64..4.0,
            dx in -6.0f64..6.0,
            dy in -6.0f64..6.0,
        ) {
            let mut grid = TileGrid::new(SIZE, SIZE).unwrap();
            for d in Direction::ALL {
                grid.set_wall(TileCoord::new(3, 3), d, true).unwrap();
            }
            let reached = max_transition(&grid, Point::new(x, y), Point::new(x + dx, y + dy)).unwrap();
            prop_assert_eq!(grid.tile_containing(reached), Some(TileCoord::new(3, 3)));
        }
    }
}
