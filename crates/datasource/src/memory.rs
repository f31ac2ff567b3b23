//! In-memory raster store for tests and previews.

use std::collections::HashMap;

use tiles_common::tile::mercator_to_lonlat;
use tiles_common::{BoundingBox, RasterWindow};
use tracing::debug;

use crate::{DatasetMetadata, RasterConnection, RasterStore, StoreError};

struct Dataset {
    grid: RasterWindow,
    bounds: BoundingBox,
    range: (f64, f64),
    nodata: Option<f64>,
}

/// A raster store backed by in-memory grids.
///
/// Each dataset is a row-major grid (row 0 = north) spanning a WGS84
/// bounding box. Windows are sampled nearest-neighbor, so the
/// `preserve_values` flag has no effect here: the display path and the raw
/// path return identical samples.
#[derive(Default)]
pub struct InMemoryStore {
    datasets: HashMap<String, Dataset>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a dataset under a `/`-joined key path. The value range is
    /// computed from the grid's valid samples.
    pub fn insert(
        &mut self,
        keys: &[&str],
        grid: RasterWindow,
        bounds: BoundingBox,
        nodata: Option<f64>,
    ) {
        let range = grid
            .valid_range()
            .map(|(lo, hi)| (lo as f64, hi as f64))
            .unwrap_or((0.0, 0.0));
        self.datasets.insert(
            keys.join("/"),
            Dataset {
                grid,
                bounds,
                range,
                nodata,
            },
        );
    }

    fn dataset(&self, keys: &[String]) -> Result<&Dataset, StoreError> {
        let key = keys.join("/");
        self.datasets
            .get(&key)
            .ok_or(StoreError::DatasetNotFound(key))
    }
}

impl RasterStore for InMemoryStore {
    fn connect(&self) -> Result<Box<dyn RasterConnection + '_>, StoreError> {
        debug!("opening in-memory datasource connection");
        Ok(Box::new(MemoryConnection { store: self }))
    }
}

struct MemoryConnection<'a> {
    store: &'a InMemoryStore,
}

impl RasterConnection for MemoryConnection<'_> {
    fn get_metadata(&mut self, keys: &[String]) -> Result<DatasetMetadata, StoreError> {
        let dataset = self.store.dataset(keys)?;
        Ok(DatasetMetadata {
            range: dataset.range,
            bounds: dataset.bounds,
            nodata: dataset.nodata,
        })
    }

    fn get_raster_tile(
        &mut self,
        keys: &[String],
        bounds: Option<BoundingBox>,
        tile_size: (usize, usize),
        _preserve_values: bool,
    ) -> Result<RasterWindow, StoreError> {
        let dataset = self.store.dataset(keys)?;
        let (width, height) = tile_size;
        let mut data = Vec::with_capacity(width * height);

        for row in 0..height {
            for col in 0..width {
                let fx = (col as f64 + 0.5) / width as f64;
                let fy = (row as f64 + 0.5) / height as f64;

                let (lon, lat) = match bounds {
                    Some(b) => {
                        // window bounds are projected meters
                        let x = b.min_x + fx * b.width();
                        let y = b.max_y - fy * b.height();
                        mercator_to_lonlat(x, y)
                    }
                    // preview: sample the full footprint in lon/lat space
                    None => (
                        dataset.bounds.min_x + fx * dataset.bounds.width(),
                        dataset.bounds.max_y - fy * dataset.bounds.height(),
                    ),
                };

                data.push(sample_nearest(&dataset.grid, &dataset.bounds, lon, lat));
            }
        }

        debug!(
            width,
            height,
            whole_dataset = bounds.is_none(),
            "sampled raster window"
        );
        Ok(RasterWindow::new(width, height, data))
    }
}

impl Drop for MemoryConnection<'_> {
    fn drop(&mut self) {
        debug!("releasing in-memory datasource connection");
    }
}

/// Nearest-neighbor sample at (lon, lat); NaN outside the footprint.
fn sample_nearest(grid: &RasterWindow, bounds: &BoundingBox, lon: f64, lat: f64) -> f32 {
    if !bounds.contains_point(lon, lat) {
        return f32::NAN;
    }

    let col = ((lon - bounds.min_x) / bounds.width() * grid.width() as f64).floor() as isize;
    let row = ((bounds.max_y - lat) / bounds.height() * grid.height() as f64).floor() as isize;

    let col = col.clamp(0, grid.width() as isize - 1) as usize;
    let row = row.clamp(0, grid.height() as isize - 1) as usize;

    grid.get(col, row)
}
