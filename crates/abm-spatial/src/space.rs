//! Point space: agents at continuous positions on top of a [`TileGrid`].
//!
//! # Data layout
//!
//! Two structures are kept in lock-step:
//!
//! - an `FxHashMap<AgentId, SpaceEntry>` for O(1) `position_of`, and
//! - an R-tree (via `rstar`) over the same entries for range and
//!   nearest-neighbour queries.
//!
//! Every entry carries the sequence number of its first insertion.  Queries
//! sort equal distances by that number, so results are deterministic for a
//! fixed insertion order no matter how the R-tree happens to be balanced.
//!
//! # Mutation
//!
//! Only the owner of a `&mut PointSpace` can insert, remove or move.  In
//! `abm-sim` that is the scheduler thread during the update phase; agent
//! tasks see a shared reference.

use rstar::{AABB, PointDistance, RTree, RTreeObject};
use rustc_hash::FxHashMap;

use abm_core::{AgentId, Motion, Point};

use crate::{SpatialError, SpatialResult, TileGrid, max_transition};

// ── R-tree entry ──────────────────────────────────────────────────────────────

/// Entry stored in the R-tree: a 2-D `[x, y]` point with its agent.
#[derive(Clone, Debug, PartialEq)]
struct SpaceEntry {
    point: [f64; 2],
    id:    AgentId,
    seq:   u64,
}

impl SpaceEntry {
    #[inline]
    fn position(&self) -> Point {
        Point::new(self.point[0], self.point[1])
    }
}

impl RTreeObject for SpaceEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for SpaceEntry {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

// ── Query result ──────────────────────────────────────────────────────────────

/// An indexed agent together with its position and its distance to the
/// query point.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DistantObject {
    pub id:       AgentId,
    pub point:    Point,
    pub distance: f64,
}

// ── PointSpace ────────────────────────────────────────────────────────────────

/// Maps each live agent to exactly one point inside the grid.
#[derive(Clone)]
pub struct PointSpace {
    grid:     TileGrid,
    entries:  FxHashMap<AgentId, SpaceEntry>,
    tree:     RTree<SpaceEntry>,
    next_seq: u64,
}

impl PointSpace {
    pub fn new(grid: TileGrid) -> Self {
        Self {
            grid,
            entries:  FxHashMap::default(),
            tree:     RTree::new(),
            next_seq: 0,
        }
    }

    // ── Grid access ───────────────────────────────────────────────────────

    #[inline]
    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    /// Mutable grid access for scenario setup (wall configuration).
    #[inline]
    pub fn grid_mut(&mut self) -> &mut TileGrid {
        &mut self.grid
    }

    // ── Membership ────────────────────────────────────────────────────────

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: AgentId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Add `id` at `point`.
    ///
    /// Fails with `DuplicateInsertion` if `id` is already present and with
    /// `OutOfBounds` if `point` is not inside the grid.
    pub fn insert(&mut self, id: AgentId, point: Point) -> SpatialResult<()> {
        if self.entries.contains_key(&id) {
            return Err(SpatialError::DuplicateInsertion(id));
        }
        self.check_inside(point)?;
        let entry = SpaceEntry { point: point.to_array(), id, seq: self.next_seq };
        self.next_seq += 1;
        self.tree.insert(entry.clone());
        self.entries.insert(id, entry);
        Ok(())
    }

    /// Remove `id`.  Returns whether it was present.
    pub fn remove(&mut self, id: AgentId) -> bool {
        match self.entries.remove(&id) {
            Some(entry) => {
                let removed = self.tree.remove(&entry);
                debug_assert!(removed.is_some(), "R-tree out of sync for {id}");
                true
            }
            None => false,
        }
    }

    /// Overwrite the point of a present agent.  The agent keeps its original
    /// insertion rank for tie-breaking.
    pub fn relocate(&mut self, id: AgentId, point: Point) -> SpatialResult<()> {
        self.check_inside(point)?;
        let entry = self.entries.get_mut(&id).ok_or(SpatialError::NotFound(id))?;
        let removed = self.tree.remove(entry);
        debug_assert!(removed.is_some(), "R-tree out of sync for {id}");
        entry.point = point.to_array();
        self.tree.insert(entry.clone());
        Ok(())
    }

    pub fn position_of(&self, id: AgentId) -> SpatialResult<Point> {
        self.entries
            .get(&id)
            .map(SpaceEntry::position)
            .ok_or(SpatialError::NotFound(id))
    }

    /// All `(id, point)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (AgentId, Point)> + '_ {
        let mut entries: Vec<&SpaceEntry> = self.entries.values().collect();
        entries.sort_unstable_by_key(|e| e.seq);
        entries.into_iter().map(|e| (e.id, e.position()))
    }

    // ── Queries ───────────────────────────────────────────────────────────

    /// Every agent whose Euclidean distance to `center` is ≤ `radius`,
    /// sorted by ascending distance.
    ///
    /// A negative or NaN radius yields an empty result.
    pub fn range_query(&self, center: Point, radius: f64) -> Vec<DistantObject> {
        if radius.is_nan() || radius < 0.0 || !center.is_finite() {
            return Vec::new();
        }
        // The iterator yields in ascending squared distance; the slack keeps
        // boundary hits whose `hypot` rounds below `radius`.
        let reach_2 = (radius * (1.0 + 1e-9)).powi(2);
        let mut hits: Vec<(&SpaceEntry, f64)> = self
            .tree
            .nearest_neighbor_iter_with_distance_2(&center.to_array())
            .take_while(|&(_, d2)| d2 <= reach_2)
            .map(|(e, _)| (e, center.distance(e.position())))
            .filter(|&(_, d)| d <= radius)
            .collect();
        sort_hits(&mut hits);
        hits.into_iter().map(to_distant).collect()
    }

    /// The `k` agents closest to `point`, nearest first.  Fewer are returned
    /// if the space holds fewer than `k`.
    pub fn nearest_neighbors(&self, point: Point, k: usize) -> Vec<DistantObject> {
        if k == 0 || !point.is_finite() {
            return Vec::new();
        }
        // Take everything tied with the k-th candidate so the final cut is
        // made by insertion rank rather than by tree layout.
        let mut hits: Vec<(&SpaceEntry, f64)> = Vec::with_capacity(k.min(self.len()));
        let mut cutoff = None;
        for (entry, d2) in self.tree.nearest_neighbor_iter_with_distance_2(&point.to_array()) {
            if cutoff.is_some_and(|c| d2 > c) {
                break;
            }
            hits.push((entry, d2));
            if hits.len() == k {
                cutoff = Some(d2);
            }
        }
        sort_hits(&mut hits);
        hits.truncate(k);
        hits.into_iter()
            .map(|(e, _)| to_distant((e, point.distance(e.position()))))
            .collect()
    }

    /// Agents within `radius` of `id`'s own position, excluding `id`.
    ///
    /// Pure Euclidean proximity: walls do not occlude.
    pub fn visible_neighbors(&self, id: AgentId, radius: f64) -> SpatialResult<Vec<DistantObject>> {
        let center = self.position_of(id)?;
        let mut hits = self.range_query(center, radius);
        hits.retain(|hit| hit.id != id);
        Ok(hits)
    }

    // ── Movement ──────────────────────────────────────────────────────────

    /// See [`max_transition`].
    #[inline]
    pub fn max_transition(&self, origin: Point, destination: Point) -> SpatialResult<Point> {
        max_transition(&self.grid, origin, destination)
    }

    /// Move `id` by `motion`, stopping in front of the first wall or grid
    /// edge.  Returns the point actually reached; a fully blocked move
    /// returns the unchanged origin.
    pub fn move_object(&mut self, id: AgentId, motion: Motion) -> SpatialResult<Point> {
        let origin = self.position_of(id)?;
        let reached = self.max_transition(origin, origin + motion)?;
        if reached != origin {
            self.relocate(id, reached)?;
        }
        Ok(reached)
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn check_inside(&self, point: Point) -> SpatialResult<()> {
        if !point.is_finite() {
            return Err(SpatialError::NonFinite);
        }
        if !self.grid.contains(point) {
            return Err(self.grid.out_of_bounds(point.x, point.y));
        }
        Ok(())
    }
}

fn sort_hits(hits: &mut [(&SpaceEntry, f64)]) {
    hits.sort_unstable_by(|a, b| a.1.total_cmp(&b.1).then(a.0.seq.cmp(&b.0.seq)));
}

fn to_distant((entry, distance): (&SpaceEntry, f64)) -> DistantObject {
    DistantObject { id: entry.id, point: entry.position(), distance }
}
