//! The mutable set of revealed regions.
//!
//! `CoverageIndex` is mechanism only: it stores regions in insertion order
//! and applies whichever [`OverlapPolicy`] the caller supplies per proposal.
//! Policy selection lives with the tracker configuration.

use tracing::{debug, trace};

use crate::buffer::BufferSpec;
use crate::geo::GeoPoint;
use crate::geometry;

use super::model::{CoverageError, CoverageRegion, CoverageUpdate, OverlapPolicy, RegionId};

/// Insertion-ordered set of currently revealed regions.
///
/// Region ids are allocated monotonically and never reused, so a renderer
/// holding a retired id can never confuse it with a later region.
#[derive(Debug, Default)]
pub struct CoverageIndex {
    regions: Vec<CoverageRegion>,
    next_id: u64,
}

impl CoverageIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored regions.
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Whether the index holds no regions.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Stored regions in insertion order.
    pub fn regions(&self) -> &[CoverageRegion] {
        &self.regions
    }

    /// Look up a region by id.
    pub fn get(&self, id: RegionId) -> Option<&CoverageRegion> {
        self.regions.iter().find(|r| r.id == id)
    }

    /// Whether `point` lies inside any stored region.
    pub fn contains(&self, point: GeoPoint) -> bool {
        self.regions.iter().any(|r| r.contains(point))
    }

    /// Remove every region, returning the retired ids in insertion order.
    pub fn clear(&mut self) -> Vec<RegionId> {
        self.regions.drain(..).map(|r| r.id).collect()
    }

    /// Apply a proposed buffer region under the given policy.
    ///
    /// `ring` is the candidate buffer ring and `source_points` the fixes that
    /// produced it (a single fix in live tracking). `spec` is used by
    /// [`OverlapPolicy::MergeHull`] to regenerate buffer rings for all
    /// accumulated source points before hulling them.
    ///
    /// # Errors
    ///
    /// [`CoverageError::DegenerateRing`] if a candidate or merged ring has
    /// fewer than 3 distinct vertices, [`CoverageError::Buffer`] if buffer
    /// regeneration fails during a merge. Both leave the index unchanged.
    pub fn propose(
        &mut self,
        ring: Vec<GeoPoint>,
        source_points: Vec<GeoPoint>,
        policy: OverlapPolicy,
        spec: &BufferSpec,
    ) -> Result<CoverageUpdate, CoverageError> {
        match policy {
            OverlapPolicy::AlwaysAdd => self.insert(ring, source_points),
            OverlapPolicy::SkipOnOverlap => {
                if self.overlaps_existing(&ring) {
                    trace!(regions = self.len(), "proposal skipped: overlaps coverage");
                    return Ok(CoverageUpdate::default());
                }
                self.insert(ring, source_points)
            }
            OverlapPolicy::MergeHull => self.merge_hull(source_points, spec),
        }
    }

    /// Vertex-containment overlap test against all stored regions.
    ///
    /// Checks only whether candidate vertices land inside existing rings, not
    /// true polygon intersection; edge-through-edge overlaps without interior
    /// vertices are not detected. Known limitation, preserved deliberately.
    fn overlaps_existing(&self, ring: &[GeoPoint]) -> bool {
        ring.iter()
            .any(|vertex| self.regions.iter().any(|region| region.contains(*vertex)))
    }

    fn insert(
        &mut self,
        ring: Vec<GeoPoint>,
        source_points: Vec<GeoPoint>,
    ) -> Result<CoverageUpdate, CoverageError> {
        let region = CoverageRegion::new(self.allocate_id(), ring, source_points)?;
        debug!(id = %region.id, vertices = region.ring.len(), "region added");
        self.regions.push(region.clone());
        Ok(CoverageUpdate {
            added: vec![region],
            removed: vec![],
        })
    }

    /// Replace all coverage with one hull over every contributing buffer.
    fn merge_hull(
        &mut self,
        source_points: Vec<GeoPoint>,
        spec: &BufferSpec,
    ) -> Result<CoverageUpdate, CoverageError> {
        let mut sources: Vec<GeoPoint> = self
            .regions
            .iter()
            .flat_map(|r| r.source_points.iter().copied())
            .chain(source_points)
            .collect();
        sources.sort_by(|a, b| {
            a.longitude
                .total_cmp(&b.longitude)
                .then(a.latitude.total_cmp(&b.latitude))
        });
        sources.dedup_by(|a, b| a.longitude == b.longitude && a.latitude == b.latitude);

        let mut vertices: Vec<GeoPoint> = Vec::new();
        for point in &sources {
            vertices.extend(spec.generate(*point)?);
        }
        let hull = geometry::convex_hull(&vertices);

        // Validate the merged ring before touching stored state.
        let merged = CoverageRegion::new(self.allocate_id(), hull, sources)?;
        let removed: Vec<RegionId> = self.regions.drain(..).map(|r| r.id).collect();
        debug!(
            id = %merged.id,
            replaced = removed.len(),
            vertices = merged.ring.len(),
            sources = merged.source_points.len(),
            "coverage merged into hull"
        );
        self.regions.push(merged.clone());

        Ok(CoverageUpdate {
            added: vec![merged],
            removed,
        })
    }

    fn allocate_id(&mut self) -> RegionId {
        let id = RegionId::new(self.next_id);
        self.next_id += 1;
        id
    }
}
