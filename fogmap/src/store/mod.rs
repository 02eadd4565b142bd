//! Persistence collaborator for the visited-point log.
//!
//! The engine treats storage as an external collaborator behind the
//! [`VisitedStore`] trait: appends are fire-and-forget and a failed append
//! never rolls back engine state. `load_all` is used once at startup to
//! replay history through the coverage pipeline.
//!
//! # Design Principles
//!
//! - **Append-only**: points are never mutated or reordered after append
//! - **Minimal interface**: only the two operations the engine drives
//! - **Dyn-compatible**: uses `Pin<Box<dyn Future>>` for trait object support

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Mutex;

use thiserror::Error;

use crate::geo::GeoPoint;

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying I/O failure.
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored record could not be decoded.
    #[error("malformed stored record: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Boxed future type for dyn-compatible async trait methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = StoreResult<T>> + Send + 'a>>;

/// Append-only storage for visited points.
///
/// Implementations must preserve append order: `load_all` returns points in
/// exactly the order they were appended, which is what makes replay
/// deterministic.
pub trait VisitedStore: Send + Sync {
    /// Append one visited point.
    fn append(&self, point: GeoPoint) -> StoreFuture<'_, ()>;

    /// Load every stored point in append order.
    fn load_all(&self) -> StoreFuture<'_, Vec<GeoPoint>>;
}

/// In-memory store, primarily a test and demo double.
#[derive(Debug, Default)]
pub struct MemoryStore {
    points: Mutex<Vec<GeoPoint>>,
}

impl MemoryStore {
    /// Create an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the stored points, in append order.
    pub fn points(&self) -> Vec<GeoPoint> {
        self.points.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

impl VisitedStore for MemoryStore {
    fn append(&self, point: GeoPoint) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            if let Ok(mut points) = self.points.lock() {
                points.push(point);
            }
            Ok(())
        })
    }

    fn load_all(&self) -> StoreFuture<'_, Vec<GeoPoint>> {
        Box::pin(async move { Ok(self.points()) })
    }
}

/// File-backed store writing one JSON object per line.
///
/// Each record is a plain `{"latitude": .., "longitude": ..}` object, the
/// same shape the surrounding application persists remotely. A missing file
/// reads back as an empty history.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Create a store backed by `path`. The file is created on first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl VisitedStore for JsonFileStore {
    fn append(&self, point: GeoPoint) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let mut line = serde_json::to_string(&point)?;
            line.push('\n');

            use tokio::io::AsyncWriteExt;
            let mut file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .await?;
            file.write_all(line.as_bytes()).await?;
            file.flush().await?;
            Ok(())
        })
    }

    fn load_all(&self) -> StoreFuture<'_, Vec<GeoPoint>> {
        Box::pin(async move {
            let contents = match tokio::fs::read_to_string(&self.path).await {
                Ok(contents) => contents,
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                    return Ok(Vec::new());
                }
                Err(err) => return Err(err.into()),
            };

            let mut points = Vec::new();
            for line in contents.lines() {
                if line.trim().is_empty() {
                    continue;
                }
                points.push(serde_json::from_str(line)?);
            }
            Ok(points)
        })
    }
}
