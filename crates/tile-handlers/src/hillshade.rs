//! Hillshade entry point.

use datasource::RasterStore;
use renderer::colormap::{self, GREYS_R};
use renderer::hillshade::{padded_range, shade, BlendMode, ShadeParams};
use renderer::image::{finalize_rgb, to_uint8};
use renderer::png;
use serde::Deserialize;
use tiles_common::{TileCoord, TileError, TileResult};
use tracing::debug;

use crate::config::settings;
use crate::xyz;

/// Fraction of the dataset span added on each side of the normalization
/// range, so shading does not saturate at the true extremes.
const RANGE_PAD: f64 = 0.25;

/// Options for [`hillshade`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HillshadeOptions {
    /// Colormap name; unknown names fall back to the default grey map.
    pub colormap: String,
    /// Light azimuth, degrees clockwise from north.
    pub azimuth_degree: f64,
    /// Light altitude, degrees up from horizontal.
    pub altitude_degree: f64,
    pub vertical_exaggeration: f64,
    /// One of "hsv", "overlay", "soft".
    pub blend_mode: String,
    pub tile_size: Option<(usize, usize)>,
}

impl Default for HillshadeOptions {
    fn default() -> Self {
        Self {
            colormap: "greys_r".to_string(),
            azimuth_degree: 315.0,
            altitude_degree: 45.0,
            vertical_exaggeration: 1.0,
            blend_mode: "soft".to_string(),
            tile_size: None,
        }
    }
}

/// Render a tile (or whole-dataset preview) as a hillshade PNG.
pub fn hillshade(
    store: &dyn RasterStore,
    keys: &[String],
    tile_xyz: Option<TileCoord>,
    options: &HillshadeOptions,
) -> TileResult<Vec<u8>> {
    let blend_mode: BlendMode = options.blend_mode.parse()?;
    if options.vertical_exaggeration <= 0.0 {
        return Err(TileError::invalid_parameter(
            "vertical_exaggeration",
            "must be positive",
        ));
    }

    let cmap = colormap::lookup_or(&options.colormap, &GREYS_R);
    let tile_size = options.tile_size.unwrap_or(settings().default_tile_size);
    let resolution = xyz::resolution_for(tile_xyz.as_ref())?;

    let metadata = xyz::get_metadata(store, keys)?;
    let (vmin, vmax) = padded_range(metadata.range, RANGE_PAD);

    debug!(?tile_xyz, colormap = cmap.name, "rendering hillshade");

    let params = ShadeParams {
        azimuth_degree: options.azimuth_degree,
        altitude_degree: options.altitude_degree,
        vertical_exaggeration: options.vertical_exaggeration,
        dx: resolution,
        dy: resolution,
        vmin: vmin as f32,
        vmax: vmax as f32,
        blend_mode,
    };

    let (rgb, invalid) =
        xyz::windowed_compute(store, keys, tile_xyz, tile_size, true, 0, |window| {
            let shaded = shade(window, cmap, &params);
            Ok(shaded
                .iter()
                .map(|c| {
                    [
                        to_uint8(c[0], 0.0, 1.0),
                        to_uint8(c[1], 0.0, 1.0),
                        to_uint8(c[2], 0.0, 1.0),
                    ]
                })
                .collect())
        })?;

    let pixels = finalize_rgb(&rgb, &invalid);
    png::create_png_auto(&pixels, tile_size.0, tile_size.1).map_err(TileError::ComputeFailure)
}
