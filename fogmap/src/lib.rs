//! Fogmap - fog-of-war coverage engine for location tracking.
//!
//! Turns a stream of raw geographic fixes into a maintained set of revealed
//! map regions. Each accepted fix is buffered into a polygon around its
//! position; an overlap policy decides whether that polygon is added to the
//! coverage set, skipped as redundant, or merged with existing coverage into
//! a single convex hull. External collaborators (renderer, persistence store,
//! location provider) are driven through channels and traits; the engine
//! itself owns only the visited log and the coverage index.
//!
//! # Pipeline
//!
//! ```text
//! raw fix -> RevealTracker -> BufferSpec (candidate ring)
//!         -> CoverageIndex (overlap policy) -> render + persist commands
//! ```

pub mod buffer;
pub mod config;
pub mod coverage;
pub mod geo;
pub mod geometry;
pub mod logging;
pub mod store;
pub mod tracker;

pub use buffer::{BufferError, BufferShape, BufferSpec};
pub use config::TrackerConfig;
pub use coverage::{CoverageError, CoverageIndex, CoverageRegion, CoverageUpdate, OverlapPolicy, RegionId};
pub use geo::{GeoError, GeoPoint};
pub use store::{JsonFileStore, MemoryStore, StoreError, VisitedStore};
pub use tracker::{CoverageQuery, LocationFix, LocationUpdate, RenderCommand, RevealTracker};
