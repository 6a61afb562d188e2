//! Peer lookup for bubble-vs-bubble collisions
//!
//! Every tick the simulator snapshots each bubble as a world-space circle and
//! builds one of these indices from the snapshot. Queries are read-only, so all
//! bubbles in a tick see the same committed positions.

use std::collections::HashMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::BubbleId;
use crate::error::SimError;
use crate::settings::SpatialBackend;

/// Bit set of layers a query is interested in
pub type LayerMask = u32;

/// Matches every layer
pub const ALL_LAYERS: LayerMask = u32::MAX;

/// A bubble as seen by other bubbles (world space)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeerCircle {
    pub id: BubbleId,
    pub center: Vec2,
    pub radius: f32,
    pub layer: u32,
}

impl PeerCircle {
    fn overlaps(&self, center: Vec2, radius: f32) -> bool {
        self.center.distance(center) <= self.radius + radius
    }

    fn matches(&self, layer_mask: LayerMask, exclude: BubbleId) -> bool {
        self.id != exclude && self.layer & layer_mask != 0
    }
}

/// Find the nearest peer overlapping a world-space circle
pub trait SpatialQuery {
    /// Nearest (by centre distance, then lowest id) peer on `layer_mask`
    /// whose circle overlaps the query circle. Never returns `exclude`.
    fn find_overlapping(
        &self,
        center: Vec2,
        radius: f32,
        layer_mask: LayerMask,
        exclude: BubbleId,
    ) -> Option<PeerCircle>;
}

/// Keep whichever candidate is closer to `center` (ties go to the lower id)
fn nearer(best: Option<PeerCircle>, candidate: PeerCircle, center: Vec2) -> Option<PeerCircle> {
    match best {
        None => Some(candidate),
        Some(b) => {
            let db = b.center.distance_squared(center);
            let dc = candidate.center.distance_squared(center);
            if dc < db || (dc == db && candidate.id < b.id) {
                Some(candidate)
            } else {
                Some(b)
            }
        }
    }
}

/// Linear scan over every circle; fine at sample scale
#[derive(Debug, Clone, Default)]
pub struct BruteForceQuery {
    circles: Vec<PeerCircle>,
}

impl BruteForceQuery {
    pub fn new(circles: impl IntoIterator<Item = PeerCircle>) -> Self {
        Self {
            circles: circles.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.circles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.circles.is_empty()
    }
}

impl SpatialQuery for BruteForceQuery {
    fn find_overlapping(
        &self,
        center: Vec2,
        radius: f32,
        layer_mask: LayerMask,
        exclude: BubbleId,
    ) -> Option<PeerCircle> {
        self.circles
            .iter()
            .filter(|c| c.matches(layer_mask, exclude) && c.overlaps(center, radius))
            .fold(None, |best, c| nearer(best, *c, center))
    }
}

/// Most cells one circle may occupy before it is kept out of the grid
const MAX_CELLS_PER_CIRCLE: i64 = 64;

/// Hashed uniform grid; each circle is registered in every cell its bounding box touches.
///
/// Circles spanning more than `MAX_CELLS_PER_CIRCLE` cells go in `oversized`
/// and are checked by every query instead.
#[derive(Debug, Clone)]
pub struct UniformGrid {
    cell_size: f32,
    cells: HashMap<(i32, i32), Vec<usize>>,
    oversized: Vec<usize>,
    circles: Vec<PeerCircle>,
}

impl UniformGrid {
    pub fn new(cell_size: f32) -> Result<Self, SimError> {
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(SimError::InvalidCellSize(cell_size));
        }
        Ok(Self {
            cell_size,
            cells: HashMap::new(),
            oversized: Vec::new(),
            circles: Vec::new(),
        })
    }

    pub fn build(
        cell_size: f32,
        circles: impl IntoIterator<Item = PeerCircle>,
    ) -> Result<Self, SimError> {
        let mut grid = Self::new(cell_size)?;
        for c in circles {
            grid.insert(c);
        }
        Ok(grid)
    }

    pub fn insert(&mut self, circle: PeerCircle) {
        let index = self.circles.len();
        self.circles.push(circle);
        let (min, max) = self.cell_span(circle.center, circle.radius);
        if span_len(min, max) > MAX_CELLS_PER_CIRCLE {
            self.oversized.push(index);
            return;
        }
        for x in min.0..=max.0 {
            for y in min.1..=max.1 {
                self.cells.entry((x, y)).or_default().push(index);
            }
        }
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.oversized.clear();
        self.circles.clear();
    }

    pub fn len(&self) -> usize {
        self.circles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.circles.is_empty()
    }

    fn cell_of(&self, p: Vec2) -> (i32, i32) {
        (
            (p.x / self.cell_size).floor() as i32,
            (p.y / self.cell_size).floor() as i32,
        )
    }

    fn cell_span(&self, center: Vec2, radius: f32) -> ((i32, i32), (i32, i32)) {
        let r = Vec2::splat(radius);
        (self.cell_of(center - r), self.cell_of(center + r))
    }
}

impl SpatialQuery for UniformGrid {
    fn find_overlapping(
        &self,
        center: Vec2,
        radius: f32,
        layer_mask: LayerMask,
        exclude: BubbleId,
    ) -> Option<PeerCircle> {
        let (min, max) = self.cell_span(center, radius);
        let span = span_len(min, max);

        let check = |best: Option<PeerCircle>, c: &PeerCircle| {
            if c.matches(layer_mask, exclude) && c.overlaps(center, radius) {
                nearer(best, *c, center)
            } else {
                best
            }
        };

        // A query wider than the whole population is cheaper as a scan
        if span > self.circles.len() as i64 {
            return self.circles.iter().fold(None, check);
        }

        let mut best = self
            .oversized
            .iter()
            .fold(None, |best, &i| check(best, &self.circles[i]));
        for x in min.0..=max.0 {
            for y in min.1..=max.1 {
                if let Some(indices) = self.cells.get(&(x, y)) {
                    for &i in indices {
                        best = check(best, &self.circles[i]);
                    }
                }
            }
        }
        best
    }
}

/// Number of cells in an inclusive cell range
fn span_len(min: (i32, i32), max: (i32, i32)) -> i64 {
    (max.0 as i64 - min.0 as i64 + 1) * (max.1 as i64 - min.1 as i64 + 1)
}

/// The index selected by configuration
#[derive(Debug, Clone)]
pub enum PeerIndex {
    BruteForce(BruteForceQuery),
    Grid(UniformGrid),
}

impl PeerIndex {
    pub fn build(
        backend: SpatialBackend,
        circles: impl IntoIterator<Item = PeerCircle>,
    ) -> Result<Self, SimError> {
        Ok(match backend {
            SpatialBackend::BruteForce => PeerIndex::BruteForce(BruteForceQuery::new(circles)),
            SpatialBackend::Grid { cell_size } => {
                PeerIndex::Grid(UniformGrid::build(cell_size, circles)?)
            }
        })
    }

    /// Replace the indexed circles, keeping the backend (and its allocations)
    pub fn rebuild(&mut self, circles: impl IntoIterator<Item = PeerCircle>) {
        match self {
            PeerIndex::BruteForce(q) => {
                q.circles.clear();
                q.circles.extend(circles);
            }
            PeerIndex::Grid(g) => {
                g.clear();
                for c in circles {
                    g.insert(c);
                }
            }
        }
    }
}

impl SpatialQuery for PeerIndex {
    fn find_overlapping(
        &self,
        center: Vec2,
        radius: f32,
        layer_mask: LayerMask,
        exclude: BubbleId,
    ) -> Option<PeerCircle> {
        match self {
            PeerIndex::BruteForce(q) => q.find_overlapping(center, radius, layer_mask, exclude),
            PeerIndex::Grid(q) => q.find_overlapping(center, radius, layer_mask, exclude),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn circle(id: u32, x: f32, y: f32, r: f32) -> PeerCircle {
        PeerCircle {
            id: BubbleId(id),
            center: Vec2::new(x, y),
            radius: r,
            layer: 1,
        }
    }

    #[test]
    fn test_brute_force_excludes_self() {
        let q = BruteForceQuery::new([circle(1, 0.0, 0.0, 10.0)]);
        assert!(q.find_overlapping(Vec2::ZERO, 10.0, ALL_LAYERS, BubbleId(1)).is_none());
        assert!(q.find_overlapping(Vec2::ZERO, 10.0, ALL_LAYERS, BubbleId(2)).is_some());
    }

    #[test]
    fn test_brute_force_returns_nearest() {
        let q = BruteForceQuery::new([
            circle(1, 15.0, 0.0, 10.0),
            circle(2, 5.0, 5.0, 10.0),
            circle(3, 100.0, 0.0, 10.0),
        ]);
        let hit = q.find_overlapping(Vec2::ZERO, 10.0, ALL_LAYERS, BubbleId(99)).unwrap();
        assert_eq!(hit.id, BubbleId(2));
    }

    #[test]
    fn test_layer_mask_filters() {
        let mut c = circle(1, 5.0, 0.0, 10.0);
        c.layer = 0b100;
        let q = BruteForceQuery::new([c]);
        assert!(q.find_overlapping(Vec2::ZERO, 10.0, 0b011, BubbleId(9)).is_none());
        assert!(q.find_overlapping(Vec2::ZERO, 10.0, 0b100, BubbleId(9)).is_some());
    }

    #[test]
    fn test_grid_rejects_bad_cell_size() {
        assert!(matches!(
            UniformGrid::new(0.0),
            Err(SimError::InvalidCellSize(_))
        ));
    }

    #[test]
    fn test_grid_finds_across_cell_boundary() {
        let grid = UniformGrid::build(16.0, [circle(1, 17.0, 0.0, 4.0)]).unwrap();
        let hit = grid.find_overlapping(Vec2::new(10.0, 0.0), 4.0, ALL_LAYERS, BubbleId(0));
        assert_eq!(hit.map(|h| h.id), Some(BubbleId(1)));
        assert_eq!(grid.len(), 1);
    }

    #[test]
    fn test_grid_keeps_large_circles_out_of_cells() {
        let mut grid = UniformGrid::build(
            0.01,
            [circle(1, 0.0, 0.0, 10.0), circle(2, 15.0, 0.0, 10.0)],
        )
        .unwrap();
        assert!(grid.cells.is_empty());
        assert_eq!(grid.oversized.len(), 2);

        // A point-sized query takes the cell path and must still see both
        let hit = grid.find_overlapping(Vec2::new(8.0, 0.0), 0.001, ALL_LAYERS, BubbleId(9));
        assert_eq!(hit.map(|h| h.id), Some(BubbleId(2)));
        let hit = grid.find_overlapping(Vec2::new(8.0, 0.0), 0.001, ALL_LAYERS, BubbleId(2));
        assert_eq!(hit.map(|h| h.id), Some(BubbleId(1)));

        grid.clear();
        assert!(grid.oversized.is_empty());
        assert!(grid.is_empty());
    }

    #[test]
    fn test_peer_index_dispatch() {
        let circles = [circle(1, 0.0, 0.0, 5.0), circle(2, 8.0, 0.0, 5.0)];
        let index = PeerIndex::build(SpatialBackend::Grid { cell_size: 10.0 }, circles).unwrap();
        let hit = index.find_overlapping(Vec2::ZERO, 5.0, ALL_LAYERS, BubbleId(1));
        assert_eq!(hit.map(|h| h.id), Some(BubbleId(2)));
    }

    #[test]
    fn test_rebuild_replaces_contents() {
        let mut index =
            PeerIndex::build(SpatialBackend::Grid { cell_size: 10.0 }, [circle(1, 0.0, 0.0, 5.0)])
                .unwrap();
        index.rebuild([circle(2, 100.0, 100.0, 5.0)]);
        assert!(index.find_overlapping(Vec2::ZERO, 5.0, ALL_LAYERS, BubbleId(0)).is_none());
        let hit = index.find_overlapping(Vec2::new(100.0, 95.0), 5.0, ALL_LAYERS, BubbleId(0));
        assert_eq!(hit.map(|h| h.id), Some(BubbleId(2)));
    }

    proptest! {
        #[test]
        fn prop_grid_matches_brute_force(
            points in prop::collection::vec((-200.0f32..200.0, -200.0f32..200.0, 2.0f32..20.0), 0..40),
            qx in -200.0f32..200.0,
            qy in -200.0f32..200.0,
            qr in 2.0f32..20.0,
            cell in 5.0f32..60.0,
        ) {
            let circles: Vec<_> = points
                .iter()
                .enumerate()
                .map(|(i, &(x, y, r))| circle(i as u32, x, y, r))
                .collect();
            let brute = BruteForceQuery::new(circles.clone());
            let grid = UniformGrid::build(cell, circles).unwrap();
            let q = Vec2::new(qx, qy);
            let a = brute.find_overlapping(q, qr, ALL_LAYERS, BubbleId(u32::MAX));
            let b = grid.find_overlapping(q, qr, ALL_LAYERS, BubbleId(u32::MAX));
            prop_assert_eq!(a.map(|h| h.id), b.map(|h| h.id));
        }
    }
}
