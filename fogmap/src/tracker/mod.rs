//! Reveal tracker: the pipeline orchestrator.
//!
//! Accepts raw fixes from the location provider, validates them, maintains
//! the visited log and coverage index, and emits render and persist
//! side-effects to external collaborators.
//!
//! # Concurrency
//!
//! One spawned task owns fix processing: fixes arrive on an unbounded channel
//! and each fix's full pipeline runs to completion before the next is taken,
//! so the coverage index and visited log are never mutated concurrently.
//! Persistence appends are dispatched fire-and-forget and their failures are
//! logged, never blocking the pipeline.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use fogmap::{MemoryStore, RevealTracker, TrackerConfig};
//!
//! let store = Arc::new(MemoryStore::new());
//! let (tracker, mut render_rx) = RevealTracker::new(TrackerConfig::default(), store);
//! let tracker = Arc::new(tracker);
//!
//! let (fix_tx, fix_rx) = tokio::sync::mpsc::unbounded_channel();
//! let handle = Arc::clone(&tracker).start(fix_rx);
//! ```

mod commands;

pub use commands::{LocationFix, LocationUpdate, RenderCommand};

use std::sync::{Arc, RwLock};

use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::config::TrackerConfig;
use crate::coverage::{CoverageIndex, CoverageRegion, CoverageUpdate};
use crate::geo::GeoPoint;
use crate::store::{StoreError, VisitedStore};

/// Pull API over the tracker's owned state.
///
/// The tracker maintains the factual record of what has been visited and
/// revealed; consumers derive meaning from these queries.
pub trait CoverageQuery: Send + Sync {
    /// Number of accepted fixes this session.
    fn visited_count(&self) -> usize;

    /// Snapshot of the visited log, in acceptance order.
    fn visited_points(&self) -> Vec<GeoPoint>;

    /// Number of currently stored regions.
    fn region_count(&self) -> usize;

    /// Snapshot of the stored regions, in insertion order.
    fn regions(&self) -> Vec<CoverageRegion>;

    /// Geometric membership query: has this point been revealed?
    fn is_revealed(&self, point: GeoPoint) -> bool;

    /// Whether the tracker is currently accepting fixes.
    fn is_tracking(&self) -> bool;
}

/// State owned by the fix-processing pipeline.
struct EngineState {
    index: CoverageIndex,
    visited: Vec<GeoPoint>,
    tracking: bool,
}

impl EngineState {
    fn new() -> Self {
        Self {
            index: CoverageIndex::new(),
            visited: Vec::new(),
            tracking: false,
        }
    }
}

/// Orchestrates the fix -> buffer -> coverage -> render pipeline.
pub struct RevealTracker {
    state: Arc<RwLock<EngineState>>,
    config: TrackerConfig,
    store: Arc<dyn VisitedStore>,
    render_tx: mpsc::UnboundedSender<RenderCommand>,
}

impl RevealTracker {
    /// Create a tracker and the render command channel it emits into.
    ///
    /// The returned receiver is the renderer collaborator's end; commands
    /// must be applied in the order received.
    pub fn new(
        config: TrackerConfig,
        store: Arc<dyn VisitedStore>,
    ) -> (Self, mpsc::UnboundedReceiver<RenderCommand>) {
        let (render_tx, render_rx) = mpsc::unbounded_channel();
        let tracker = Self {
            state: Arc::new(RwLock::new(EngineState::new())),
            config,
            store,
            render_tx,
        };
        (tracker, render_rx)
    }

    /// The active configuration.
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Start accepting fixes and spawn the processing loop.
    ///
    /// The loop takes one delivery at a time and runs its full pipeline
    /// before the next, which is what serializes all state mutation. It runs
    /// until the provider side of the channel closes.
    pub fn start(
        self: Arc<Self>,
        mut rx: mpsc::UnboundedReceiver<LocationUpdate>,
    ) -> tokio::task::JoinHandle<()> {
        self.set_tracking(true);
        debug!(
            policy = %self.config.policy,
            shape = %self.config.buffer.shape,
            radius_m = self.config.buffer.radius_meters,
            "reveal tracker started"
        );

        tokio::spawn(async move {
            while let Some(update) = rx.recv().await {
                if !self.is_tracking() {
                    trace!("fix delivery ignored: tracker stopped");
                    continue;
                }
                self.process_update(update);
            }
            self.set_tracking(false);
            debug!("reveal tracker stopped (provider channel closed)");
        })
    }

    /// Stop accepting fixes.
    ///
    /// Deliveries already queued on the channel are drained but ignored; the
    /// in-flight fix (if any) completes its pipeline.
    pub fn stop(&self) {
        self.set_tracking(false);
        debug!("reveal tracker stopped");
    }

    /// Process one provider delivery: the last fix of the batch.
    pub fn process_update(&self, update: LocationUpdate) {
        let Some(fix) = update.latest() else {
            trace!("empty fix delivery");
            return;
        };
        self.process_fix(fix);
    }

    /// Run the full pipeline for a single raw fix.
    ///
    /// Invalid fixes are dropped and reported; no error here is fatal to the
    /// tracker.
    pub fn process_fix(&self, fix: LocationFix) {
        // Step 1: validate.
        let point = match GeoPoint::new(fix.latitude, fix.longitude) {
            Ok(point) => point,
            Err(err) => {
                warn!(
                    latitude = fix.latitude,
                    longitude = fix.longitude,
                    %err,
                    "dropping invalid fix"
                );
                return;
            }
        };
        trace!(%point, "fix accepted");

        // Step 2: append to the visited log and persist fire-and-forget.
        self.record_visited(point);
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            if let Err(err) = store.append(point).await {
                warn!(%point, %err, "failed to persist visited point");
            }
        });

        if self.config.debug_markers {
            let _ = self.render_tx.send(RenderCommand::AddMarker { point });
        }

        // Steps 3-5: buffer, propose, emit.
        self.apply_point(point);
    }

    /// Rebuild coverage from a persisted point sequence.
    ///
    /// Clears current state (emitting removals for anything drawn), then
    /// replays each point through the coverage pipeline in order. No persist
    /// commands are issued: the store is the source, not the target.
    ///
    /// Returns the number of points restored.
    pub async fn restore(&self) -> Result<usize, StoreError> {
        let points = self.store.load_all().await?;
        self.reset();
        for point in &points {
            self.record_visited(*point);
            self.apply_point(*point);
        }
        debug!(points = points.len(), "coverage restored from store");
        Ok(points.len())
    }

    /// Replay points through pipeline steps 3-5 only.
    ///
    /// The visited log is untouched; coverage is re-derived exactly as a live
    /// run with the same configuration would have derived it.
    pub fn replay(&self, points: &[GeoPoint]) {
        for point in points {
            self.apply_point(*point);
        }
    }

    /// Clear the visited log and coverage, emitting removals for every
    /// previously drawn region.
    pub fn reset(&self) {
        let removed = if let Ok(mut state) = self.state.write() {
            state.visited.clear();
            state.index.clear()
        } else {
            Vec::new()
        };

        debug!(regions = removed.len(), "tracker reset");
        for id in removed {
            let _ = self.render_tx.send(RenderCommand::RemoveRegion { id });
        }
    }

    /// Pipeline steps 3-5: generate buffer, propose to coverage, emit diff.
    fn apply_point(&self, point: GeoPoint) {
        // Step 3: candidate buffer ring.
        let ring = match self.config.buffer.generate(point) {
            Ok(ring) => ring,
            Err(err) => {
                warn!(%point, %err, "buffer generation failed, fix skipped");
                return;
            }
        };

        // Step 4: propose under the configured policy.
        let update = {
            let Ok(mut state) = self.state.write() else {
                return;
            };
            match state
                .index
                .propose(ring, vec![point], self.config.policy, &self.config.buffer)
            {
                Ok(update) => update,
                Err(err) => {
                    warn!(%point, %err, "coverage proposal failed, fix skipped");
                    return;
                }
            }
        };

        // Step 5: removals first, then adds; emission order is the
        // renderer's required application order.
        self.emit(&update);
    }

    fn emit(&self, update: &CoverageUpdate) {
        if update.is_noop() {
            trace!("coverage unchanged");
            return;
        }

        for id in &update.removed {
            let _ = self.render_tx.send(RenderCommand::RemoveRegion { id: *id });
        }
        for region in &update.added {
            let _ = self.render_tx.send(RenderCommand::AddRegion {
                id: region.id,
                ring: region.ring.clone(),
                fill_color: self.config.fill_color,
                stroke_color: self.config.stroke_color,
            });
        }
        debug!(
            added = update.added.len(),
            removed = update.removed.len(),
            "coverage updated"
        );
    }

    fn record_visited(&self, point: GeoPoint) {
        if let Ok(mut state) = self.state.write() {
            state.visited.push(point);
        }
    }

    fn set_tracking(&self, tracking: bool) {
        if let Ok(mut state) = self.state.write() {
            state.tracking = tracking;
        }
    }
}

impl CoverageQuery for RevealTracker {
    fn visited_count(&self) -> usize {
        self.state.read().map(|s| s.visited.len()).unwrap_or(0)
    }

    fn visited_points(&self) -> Vec<GeoPoint> {
        self.state
            .read()
            .map(|s| s.visited.clone())
            .unwrap_or_default()
    }

    fn region_count(&self) -> usize {
        self.state.read().map(|s| s.index.len()).unwrap_or(0)
    }

    fn regions(&self) -> Vec<CoverageRegion> {
        self.state
            .read()
            .map(|s| s.index.regions().to_vec())
            .unwrap_or_default()
    }

    fn is_revealed(&self, point: GeoPoint) -> bool {
        self.state
            .read()
            .map(|s| s.index.contains(point))
            .unwrap_or(false)
    }

    fn is_tracking(&self) -> bool {
        self.state.read().map(|s| s.tracking).unwrap_or(false)
    }
}

// Allow Arc<RevealTracker> to be used as CoverageQuery.
impl CoverageQuery for Arc<RevealTracker> {
    fn visited_count(&self) -> usize {
        (**self).visited_count()
    }

    fn visited_points(&self) -> Vec<GeoPoint> {
        (**self).visited_points()
    }

    fn region_count(&self) -> usize {
        (**self).region_count()
    }

    fn regions(&self) -> Vec<CoverageRegion> {
        (**self).regions()
    }

    fn is_revealed(&self, point: GeoPoint) -> bool {
        (**self).is_revealed(point)
    }

    fn is_tracking(&self) -> bool {
        (**self).is_tracking()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::OverlapPolicy;
    use crate::store::MemoryStore;

    fn make_tracker(
        config: TrackerConfig,
    ) -> (
        Arc<RevealTracker>,
        mpsc::UnboundedReceiver<RenderCommand>,
        Arc<MemoryStore>,
    ) {
        let store = Arc::new(MemoryStore::new());
        let (tracker, render_rx) = RevealTracker::new(config, store.clone());
        (Arc::new(tracker), render_rx, store)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<RenderCommand>) -> Vec<RenderCommand> {
        let mut commands = Vec::new();
        while let Ok(cmd) = rx.try_recv() {
            commands.push(cmd);
        }
        commands
    }

    #[tokio::test]
    async fn test_valid_fix_reveals_region() {
        let (tracker, mut render_rx, _) = make_tracker(TrackerConfig::default());

        tracker.process_fix(LocationFix::new(53.5, 9.7));

        assert_eq!(tracker.visited_count(), 1);
        assert_eq!(tracker.region_count(), 1);
        assert!(tracker.is_revealed(GeoPoint::new(53.5, 9.7).unwrap()));

        let commands = drain(&mut render_rx);
        assert_eq!(commands.len(), 1);
        assert!(matches!(commands[0], RenderCommand::AddRegion { .. }));
    }

    #[tokio::test]
    async fn test_invalid_fix_dropped_without_state_change() {
        let (tracker, mut render_rx, _) = make_tracker(TrackerConfig::default());

        tracker.process_fix(LocationFix::new(95.0, 0.0));

        assert_eq!(tracker.visited_count(), 0);
        assert_eq!(tracker.region_count(), 0);
        assert!(drain(&mut render_rx).is_empty());

        // The pipeline keeps processing subsequent fixes.
        tracker.process_fix(LocationFix::new(0.0, 0.0));
        assert_eq!(tracker.visited_count(), 1);
    }

    #[tokio::test]
    async fn test_batch_delivery_consumes_last_fix() {
        let (tracker, _render_rx, _) = make_tracker(TrackerConfig::default());

        tracker.process_update(LocationUpdate::batch(vec![
            LocationFix::new(10.0, 10.0),
            LocationFix::new(20.0, 20.0),
        ]));

        assert_eq!(tracker.visited_points(), vec![GeoPoint::new(20.0, 20.0).unwrap()]);
    }

    #[tokio::test]
    async fn test_skip_policy_keeps_single_region_for_nearby_fixes() {
        let config = TrackerConfig::default()
            .with_radius_meters(30.0)
            .with_policy(OverlapPolicy::SkipOnOverlap);
        let (tracker, mut render_rx, _) = make_tracker(config);

        tracker.process_fix(LocationFix::new(0.0, 0.0));
        tracker.process_fix(LocationFix::new(0.0, 0.0001)); // ~11m east

        assert_eq!(tracker.visited_count(), 2);
        assert_eq!(tracker.region_count(), 1);
        assert_eq!(drain(&mut render_rx).len(), 1);
    }

    #[tokio::test]
    async fn test_merge_policy_emits_removals_before_add() {
        let config = TrackerConfig::default()
            .with_radius_meters(30.0)
            .with_policy(OverlapPolicy::MergeHull);
        let (tracker, mut render_rx, _) = make_tracker(config);

        tracker.process_fix(LocationFix::new(10.0, 10.0));
        let first = drain(&mut render_rx);
        assert_eq!(first.len(), 1);
        let first_id = match &first[0] {
            RenderCommand::AddRegion { id, .. } => *id,
            other => panic!("expected add, got {:?}", other),
        };

        tracker.process_fix(LocationFix::new(10.0, 10.01));
        let second = drain(&mut render_rx);
        assert_eq!(second.len(), 2);
        assert_eq!(second[0], RenderCommand::RemoveRegion { id: first_id });
        assert!(matches!(second[1], RenderCommand::AddRegion { .. }));
    }

    #[tokio::test]
    async fn test_fixes_are_persisted() {
        let (tracker, _render_rx, store) = make_tracker(TrackerConfig::default());

        tracker.process_fix(LocationFix::new(1.0, 2.0));
        tracker.process_fix(LocationFix::new(3.0, 4.0));

        // Appends are spawned; yield until they land.
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(
            store.points(),
            vec![
                GeoPoint::new(1.0, 2.0).unwrap(),
                GeoPoint::new(3.0, 4.0).unwrap()
            ]
        );
    }

    #[tokio::test]
    async fn test_replay_matches_live_run() {
        let config = TrackerConfig::default()
            .with_radius_meters(30.0)
            .with_policy(OverlapPolicy::SkipOnOverlap);

        let points = vec![
            GeoPoint::new(0.0, 0.0).unwrap(),
            GeoPoint::new(0.0, 0.0001).unwrap(),
            GeoPoint::new(0.01, 0.01).unwrap(),
        ];

        let (live, _rx_live, _) = make_tracker(config);
        for p in &points {
            live.process_fix(LocationFix::from(*p));
        }

        let (replayed, _rx_replay, _) = make_tracker(config);
        replayed.replay(&points);

        let live_rings: Vec<Vec<GeoPoint>> =
            live.regions().into_iter().map(|r| r.ring).collect();
        let replay_rings: Vec<Vec<GeoPoint>> =
            replayed.regions().into_iter().map(|r| r.ring).collect();
        assert_eq!(live_rings, replay_rings);
    }

    #[tokio::test]
    async fn test_restore_rebuilds_from_store() {
        let store = Arc::new(MemoryStore::new());
        store
            .append(GeoPoint::new(0.0, 0.0).unwrap())
            .await
            .unwrap();
        store
            .append(GeoPoint::new(0.01, 0.01).unwrap())
            .await
            .unwrap();

        let config = TrackerConfig::default().with_radius_meters(30.0);
        let (tracker, mut render_rx) = RevealTracker::new(config, store.clone());

        let restored = tracker.restore().await.unwrap();
        assert_eq!(restored, 2);
        assert_eq!(tracker.visited_count(), 2);
        assert_eq!(tracker.region_count(), 2);

        // Restore only renders, it does not re-persist.
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(store.points().len(), 2);
        assert_eq!(drain(&mut render_rx).len(), 2);
    }

    #[tokio::test]
    async fn test_reset_emits_removals() {
        let (tracker, mut render_rx, _) = make_tracker(TrackerConfig::default());

        tracker.process_fix(LocationFix::new(0.0, 0.0));
        tracker.process_fix(LocationFix::new(1.0, 1.0));
        drain(&mut render_rx);

        tracker.reset();
        assert_eq!(tracker.visited_count(), 0);
        assert_eq!(tracker.region_count(), 0);

        let commands = drain(&mut render_rx);
        assert_eq!(commands.len(), 2);
        assert!(commands
            .iter()
            .all(|c| matches!(c, RenderCommand::RemoveRegion { .. })));
    }

    #[tokio::test]
    async fn test_debug_markers_emitted_when_enabled() {
        let config = TrackerConfig::default().with_debug_markers(true);
        let (tracker, mut render_rx, _) = make_tracker(config);

        tracker.process_fix(LocationFix::new(5.0, 5.0));

        let commands = drain(&mut render_rx);
        assert_eq!(commands.len(), 2);
        assert!(matches!(commands[0], RenderCommand::AddMarker { .. }));
        assert!(matches!(commands[1], RenderCommand::AddRegion { .. }));
    }

    #[tokio::test]
    async fn test_start_processes_and_stop_halts_acceptance() {
        let (tracker, _render_rx, _) = make_tracker(TrackerConfig::default());
        let (tx, rx) = mpsc::unbounded_channel();

        let handle = Arc::clone(&tracker).start(rx);
        assert!(tracker.is_tracking());

        tx.send(LocationUpdate::single(LocationFix::new(10.0, 10.0)))
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(tracker.visited_count(), 1);

        tracker.stop();
        tx.send(LocationUpdate::single(LocationFix::new(20.0, 20.0)))
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(tracker.visited_count(), 1, "fix after stop must be ignored");

        drop(tx);
        handle.await.unwrap();
        assert!(!tracker.is_tracking());
    }
}
