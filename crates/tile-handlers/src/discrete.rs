//! Discrete classification entry point.

use datasource::RasterStore;
use renderer::colormap::{self, VIRIDIS};
use renderer::discrete::classify;
use renderer::image::finalize_rgb;
use renderer::png;
use serde::Deserialize;
use tiles_common::{TileCoord, TileError, TileResult};
use tracing::debug;

use crate::config::settings;
use crate::xyz;

/// Options for [`discrete`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiscreteOptions {
    /// Colormap name; unknown names fall back to viridis.
    pub colormap: String,
    /// Number of quantization buckets.
    pub n_classes: usize,
    /// Lower rendering bound; dataset minimum when unset.
    pub vmin: Option<f64>,
    /// Upper rendering bound; dataset maximum when unset.
    pub vmax: Option<f64>,
    pub tile_size: Option<(usize, usize)>,
}

impl Default for DiscreteOptions {
    fn default() -> Self {
        Self {
            colormap: "viridis".to_string(),
            n_classes: 16,
            vmin: None,
            vmax: None,
            tile_size: None,
        }
    }
}

/// Render a tile (or whole-dataset preview) as a discretely classified PNG.
pub fn discrete(
    store: &dyn RasterStore,
    keys: &[String],
    tile_xyz: Option<TileCoord>,
    options: &DiscreteOptions,
) -> TileResult<Vec<u8>> {
    if options.n_classes == 0 {
        return Err(TileError::invalid_parameter("n_classes", "must be positive"));
    }

    let cmap = colormap::lookup_or(&options.colormap, &VIRIDIS);
    let tile_size = options.tile_size.unwrap_or(settings().default_tile_size);

    let metadata = xyz::get_metadata(store, keys)?;
    let vmin = options.vmin.unwrap_or(metadata.range.0);
    let vmax = options.vmax.unwrap_or(metadata.range.1);
    if !vmin.is_finite() || !vmax.is_finite() || vmax <= vmin {
        return Err(TileError::invalid_parameter(
            "vmax",
            format!("range ({}, {}) is empty or degenerate", vmin, vmax),
        ));
    }

    debug!(?tile_xyz, colormap = cmap.name, n_classes = options.n_classes, "rendering discrete");

    let (rgb, invalid) =
        xyz::windowed_compute(store, keys, tile_xyz, tile_size, false, 0, |window| {
            Ok(classify(
                window,
                cmap,
                options.n_classes,
                vmin as f32,
                vmax as f32,
            ))
        })?;

    let pixels = finalize_rgb(&rgb, &invalid);
    png::create_png_auto(&pixels, tile_size.0, tile_size.1).map_err(TileError::ComputeFailure)
}
