//! Coverage set maintenance and overlap policies.
//!
//! This module owns the mutable set of revealed regions. New buffer polygons
//! are proposed against it and the configured [`OverlapPolicy`] decides
//! whether they are added, skipped, or merged into a single convex hull.
//! Every mutation is reported as a [`CoverageUpdate`] diff so a renderer can
//! mirror the set incrementally.

mod index;
mod model;

pub use index::CoverageIndex;
pub use model::{CoverageError, CoverageRegion, CoverageUpdate, OverlapPolicy, RegionId};
