//! Core data types for the coverage engine.
//!
//! Types here describe what has been revealed: regions, their identifiers,
//! the overlap policy, and the diff produced when a proposal is applied.

use thiserror::Error;

use crate::buffer::BufferError;
use crate::geo::GeoPoint;
use crate::geometry;

/// Errors from coverage maintenance.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CoverageError {
    /// A ring with fewer than 3 distinct vertices reached the index.
    #[error("degenerate ring with {0} distinct vertices (need at least 3)")]
    DegenerateRing(usize),

    /// Buffer regeneration failed during a hull merge.
    #[error(transparent)]
    Buffer(#[from] BufferError),
}

/// Opaque handle identifying a stored coverage region.
///
/// Handles are allocated by [`super::CoverageIndex`] and never reused; a
/// retired id stays retired after its region is merged away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionId(u64);

impl RegionId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw numeric value, for renderer handle bookkeeping.
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RegionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "region#{}", self.0)
    }
}

/// A revealed map region: a closed polygon ring plus the fixes that built it.
///
/// The ring is implicitly closed (last vertex connects back to the first) and
/// always has at least 3 distinct vertices. `source_points` carries every fix
/// that contributed; when regions are merged the sources roll into the
/// replacement region.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageRegion {
    /// Identity handle, unique within one index.
    pub id: RegionId,
    /// Closed polygon ring.
    pub ring: Vec<GeoPoint>,
    /// Fixes that contributed to this region.
    pub source_points: Vec<GeoPoint>,
}

impl CoverageRegion {
    /// Build a region, rejecting degenerate rings.
    pub(crate) fn new(
        id: RegionId,
        ring: Vec<GeoPoint>,
        source_points: Vec<GeoPoint>,
    ) -> Result<Self, CoverageError> {
        let distinct = distinct_vertex_count(&ring);
        if distinct < 3 {
            return Err(CoverageError::DegenerateRing(distinct));
        }
        Ok(Self {
            id,
            ring,
            source_points,
        })
    }

    /// Whether `point` lies inside this region's ring.
    pub fn contains(&self, point: GeoPoint) -> bool {
        geometry::contains(point, &self.ring)
    }
}

fn distinct_vertex_count(ring: &[GeoPoint]) -> usize {
    let mut sorted = ring.to_vec();
    sorted.sort_by(|a, b| {
        a.longitude
            .total_cmp(&b.longitude)
            .then(a.latitude.total_cmp(&b.latitude))
    });
    sorted.dedup_by(|a, b| a.longitude == b.longitude && a.latitude == b.latitude);
    sorted.len()
}

/// Rule applied when a new buffer region is proposed against existing
/// coverage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlapPolicy {
    /// Insert every proposal unconditionally.
    AlwaysAdd,

    /// Drop the proposal if any of its ring vertices lies inside an existing
    /// region. This is a vertex-containment heuristic, not true polygon
    /// intersection: two regions can overlap in area without any vertex of
    /// one being interior to the other. Preserved as specified behavior.
    #[default]
    SkipOnOverlap,

    /// Collapse all coverage into a single region whose ring is the convex
    /// hull of every contributing buffer vertex.
    MergeHull,
}

impl std::fmt::Display for OverlapPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverlapPolicy::AlwaysAdd => write!(f, "always-add"),
            OverlapPolicy::SkipOnOverlap => write!(f, "skip-on-overlap"),
            OverlapPolicy::MergeHull => write!(f, "merge-hull"),
        }
    }
}

/// Diff produced by applying a proposal: regions to draw and ids to erase.
///
/// `removed` must be applied before `added` by the renderer so a merged
/// region never coexists with the regions it replaced.
#[derive(Debug, Clone, Default)]
pub struct CoverageUpdate {
    /// Newly stored regions, in insertion order.
    pub added: Vec<CoverageRegion>,
    /// Ids of regions retired by this proposal.
    pub removed: Vec<RegionId>,
}

impl CoverageUpdate {
    /// True when the proposal changed nothing (e.g. skipped on overlap).
    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}
