//! Relief/openness mapping entry point.

use datasource::RasterStore;
use renderer::hillshade::BlendMode;
use renderer::image::finalize_rgb;
use renderer::png;
use renderer::rrim::{
    color_scheme, positive_openness, relief_rgb, slope_degrees, OpennessParams,
};
use serde::Deserialize;
use tiles_common::{TileCoord, TileError, TileResult};
use tracing::debug;

use crate::config::settings;
use crate::xyz;

/// Options for [`rrim`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RrimOptions {
    /// Source nodata sentinel.
    pub nodatavalue: f64,
    /// Number of openness search directions.
    pub svf_n_dir: usize,
    /// Openness search radius in pixels; also the fetch buffer.
    pub svf_r_max: usize,
    /// Noise removal level.
    pub svf_noise: usize,
    /// Saturation axis size of the color lookup table.
    pub saturation: usize,
    /// Brightness axis size of the color lookup table. Legacy clients send
    /// this as "brithness".
    #[serde(alias = "brithness")]
    pub brightness: usize,
    /// Validated against the known set but not applied yet.
    pub blend_mode: String,
    pub tile_size: Option<(usize, usize)>,
}

impl Default for RrimOptions {
    fn default() -> Self {
        Self {
            nodatavalue: -9999.0,
            svf_n_dir: 8,
            svf_r_max: 10,
            svf_noise: 0,
            saturation: 90,
            brightness: 150,
            blend_mode: "overlay".to_string(),
            tile_size: None,
        }
    }
}

/// Render a tile (or whole-dataset preview) as a relief/openness map PNG.
pub fn rrim(
    store: &dyn RasterStore,
    keys: &[String],
    tile_xyz: Option<TileCoord>,
    options: &RrimOptions,
) -> TileResult<Vec<u8>> {
    // TODO: apply blend_mode once hillshade blending is wired into the
    // relief pipeline; until then it is only validated.
    let _blend_mode: BlendMode = options.blend_mode.parse()?;

    if options.saturation == 0 || options.brightness == 0 {
        return Err(TileError::invalid_parameter(
            "saturation",
            "lookup table axes must be positive",
        ));
    }
    if options.svf_n_dir == 0 {
        return Err(TileError::invalid_parameter("svf_n_dir", "must be positive"));
    }

    let tile_size = options.tile_size.unwrap_or(settings().default_tile_size);
    let resolution = xyz::resolution_for(tile_xyz.as_ref())?;
    let buffer = options.svf_r_max as u32;

    debug!(
        ?tile_xyz,
        buffer,
        resolution,
        n_dir = options.svf_n_dir,
        "rendering relief map"
    );

    let openness_params = OpennessParams {
        n_dir: options.svf_n_dir,
        r_max: options.svf_r_max,
        noise: options.svf_noise,
        nodata: Some(options.nodatavalue),
    };

    let (bgr, invalid) =
        xyz::windowed_compute(store, keys, tile_xyz, tile_size, false, buffer, |window| {
            // nodata deliberately not substituted for the slope pass
            let slope = slope_degrees(window, resolution, resolution, 1.0);

            let positive = positive_openness(window, resolution, &openness_params);
            let negative = positive_openness(&window.negated(), resolution, &openness_params);
            let openness: Vec<f32> = positive
                .iter()
                .zip(&negative)
                .map(|(p, n)| (p - n) / 2.0)
                .collect();

            let lut = color_scheme(options.saturation, options.brightness);
            Ok(relief_rgb(
                &slope,
                &openness,
                &lut,
                options.saturation,
                options.brightness,
            ))
        })?;

    // the lookup table is BGR-ordered; swap to RGB after crop and mask
    let rgb: Vec<[u8; 3]> = bgr.iter().map(|c| [c[2], c[1], c[0]]).collect();

    let pixels = finalize_rgb(&rgb, &invalid);
    png::create_png_auto(&pixels, tile_size.0, tile_size.1).map_err(TileError::ComputeFailure)
}
