//! Contract with the external raster storage/query engine.
//!
//! The engine itself is an external collaborator; this crate defines the
//! trait seam the renderers talk to, plus an in-memory implementation used by
//! tests and previews.

pub mod memory;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tiles_common::{BoundingBox, RasterWindow, TileError};

pub use memory::InMemoryStore;

/// Per-dataset summary returned by `get_metadata`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetMetadata {
    /// Observed (min, max) value extent.
    pub range: (f64, f64),
    /// Dataset footprint in WGS84 lon/lat.
    pub bounds: BoundingBox,
    /// Sentinel nodata value, if the dataset declares one.
    pub nodata: Option<f64>,
}

/// Errors raised by a raster store implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("dataset not found: {0}")]
    DatasetNotFound(String),

    #[error("driver error: {0}")]
    Driver(String),
}

impl From<StoreError> for TileError {
    fn from(err: StoreError) -> Self {
        TileError::FetchFailure(err.to_string())
    }
}

/// A raster store that can hand out scoped connections.
///
/// Connections are acquired per fetch and released on drop, on every exit
/// path; no connection is held across fetcher calls.
pub trait RasterStore: Send + Sync {
    fn connect(&self) -> Result<Box<dyn RasterConnection + '_>, StoreError>;
}

/// A scoped connection to a raster store.
pub trait RasterConnection {
    /// Summary metadata for the dataset identified by `keys`.
    fn get_metadata(&mut self, keys: &[String]) -> Result<DatasetMetadata, StoreError>;

    /// Retrieve a raster window.
    ///
    /// `bounds` is in Web Mercator meters; `None` returns the whole dataset
    /// resampled to `tile_size` (preview mode). With `preserve_values` the
    /// raw sampled values must be returned; otherwise the store may return
    /// display-oriented resampled values. Area outside the dataset footprint
    /// comes back as NaN.
    fn get_raster_tile(
        &mut self,
        keys: &[String],
        bounds: Option<BoundingBox>,
        tile_size: (usize, usize),
        preserve_values: bool,
    ) -> Result<RasterWindow, StoreError>;
}
