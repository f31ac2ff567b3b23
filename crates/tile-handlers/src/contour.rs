//! Contour extraction entry point.

use datasource::RasterStore;
use renderer::contour::{extract_contours, iso_levels, render_contours};
use renderer::image::zero_transparent;
use renderer::png;
use serde::Deserialize;
use tiles_common::{TileCoord, TileError, TileResult};
use tracing::debug;

use crate::config::settings;
use crate::xyz;

/// Options for [`contour`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContourOptions {
    /// Line color as an RGB triple in the 0-1 range.
    pub color: [f32; 3],
    /// Iso-value spacing in CRS units.
    pub interval: f64,
    pub tile_size: Option<(usize, usize)>,
}

impl Default for ContourOptions {
    fn default() -> Self {
        Self {
            color: [0.0, 0.0, 0.0],
            interval: 5.0,
            tile_size: None,
        }
    }
}

/// Render a tile (or whole-dataset preview) as contour lines on a
/// transparent background.
///
/// An interval that produces no iso-values (non-positive, or wider than the
/// data range) yields a fully transparent tile, not an error.
pub fn contour(
    store: &dyn RasterStore,
    keys: &[String],
    tile_xyz: Option<TileCoord>,
    options: &ContourOptions,
) -> TileResult<Vec<u8>> {
    let tile_size = options.tile_size.unwrap_or(settings().default_tile_size);

    let metadata = xyz::get_metadata(store, keys)?;
    let window = xyz::get_tile_data(store, keys, tile_xyz, tile_size, true, 0)?;

    let levels = iso_levels(
        metadata.range.0 as f32,
        metadata.range.1 as f32,
        options.interval as f32,
    );
    let contours = extract_contours(&window, &levels);

    debug!(
        ?tile_xyz,
        interval = options.interval,
        num_levels = levels.len(),
        num_contours = contours.len(),
        "rendering contours"
    );

    let mut pixels = render_contours(&contours, tile_size.0, tile_size.1, options.color)
        .map_err(TileError::ComputeFailure)?;
    zero_transparent(&mut pixels);

    png::create_png_auto(&pixels, tile_size.0, tile_size.1).map_err(TileError::ComputeFailure)
}
