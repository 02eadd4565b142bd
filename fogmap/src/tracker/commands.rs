//! Command and event types exchanged with external collaborators.
//!
//! Raw fixes flow in from the location provider; render commands flow out to
//! whatever draws the map. Both are plain data so collaborators can live in
//! other tasks or processes.

use crate::coverage::RegionId;
use crate::geo::GeoPoint;

/// A raw geographic fix as delivered by the location provider.
///
/// Unvalidated on purpose: validation is the first pipeline step, and
/// providers are allowed to deliver garbage without breaking the channel
/// contract.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationFix {
    /// Reported latitude in degrees.
    pub latitude: f64,
    /// Reported longitude in degrees.
    pub longitude: f64,
}

impl LocationFix {
    /// Create a raw fix.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl From<GeoPoint> for LocationFix {
    fn from(point: GeoPoint) -> Self {
        Self {
            latitude: point.latitude,
            longitude: point.longitude,
        }
    }
}

/// One delivery from the location provider: a batch of fixes.
///
/// Providers may batch several fixes per callback; the tracker consumes only
/// the last (most recent) fix of each delivery.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LocationUpdate {
    /// Fixes in delivery order, oldest first.
    pub fixes: Vec<LocationFix>,
}

impl LocationUpdate {
    /// A delivery containing a single fix.
    pub fn single(fix: LocationFix) -> Self {
        Self { fixes: vec![fix] }
    }

    /// A delivery containing several fixes, oldest first.
    pub fn batch(fixes: Vec<LocationFix>) -> Self {
        Self { fixes }
    }

    /// The most recent fix of this delivery, if any.
    pub fn latest(&self) -> Option<LocationFix> {
        self.fixes.last().copied()
    }
}

/// Side-effect command emitted toward the renderer collaborator.
///
/// Commands must be applied in emission order: a merge emits removals for the
/// replaced regions before the add for their replacement, and applying them
/// out of order would reference retired handles.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    /// Draw a new region polygon.
    AddRegion {
        /// Handle the renderer should associate with the polygon.
        id: RegionId,
        /// Closed polygon ring.
        ring: Vec<GeoPoint>,
        /// Fill color (ARGB).
        fill_color: u32,
        /// Stroke color (ARGB).
        stroke_color: u32,
    },

    /// Erase a previously added region.
    RemoveRegion {
        /// Handle of the region to erase.
        id: RegionId,
    },

    /// Debug aid: drop a marker at an accepted fix.
    AddMarker {
        /// The accepted fix position.
        point: GeoPoint,
    },
}
