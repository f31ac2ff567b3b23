//! Directional hillshade rendering.
//!
//! Illumination follows the classic light-source model: surface gradient →
//! unit normal → dot product with the light direction, contrast-stretched to
//! [0, 1], then blended with the colormap-mapped elevation.

use std::str::FromStr;

use tiles_common::{RasterWindow, TileError};
use tracing::debug;

use crate::colormap::{self, Colormap};

/// Compositing rule combining shading intensity with the base color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    Hsv,
    Overlay,
    SoftLight,
}

impl FromStr for BlendMode {
    type Err = TileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hsv" => Ok(BlendMode::Hsv),
            "overlay" => Ok(BlendMode::Overlay),
            "soft" => Ok(BlendMode::SoftLight),
            other => Err(TileError::invalid_parameter(
                "blend_mode",
                format!("unknown blend mode '{}' (expected hsv, overlay or soft)", other),
            )),
        }
    }
}

/// Parameters for [`shade`].
#[derive(Debug, Clone)]
pub struct ShadeParams {
    /// Light azimuth, degrees clockwise from north (0-360).
    pub azimuth_degree: f64,
    /// Light altitude, degrees up from horizontal (0-90).
    pub altitude_degree: f64,
    /// Multiplier applied to elevations before computing the gradient.
    pub vertical_exaggeration: f64,
    /// Ground sampling distance along x, in elevation units per pixel.
    pub dx: f64,
    /// Ground sampling distance along y.
    pub dy: f64,
    /// Normalization range for the colormap-mapped value.
    pub vmin: f32,
    pub vmax: f32,
    pub blend_mode: BlendMode,
}

/// Expand a value range by `pad` of the span on each side.
///
/// Shading normalized against the padded range avoids saturating at the true
/// extremes of the dataset.
pub fn padded_range(range: (f64, f64), pad: f64) -> (f64, f64) {
    let span = range.1 - range.0;
    (range.0 - span * pad, range.1 + span * pad)
}

/// Surface gradient of the elevation grid, scaled by the vertical
/// exaggeration. Central differences in the interior, one-sided at edges;
/// NaN elevations propagate into the affected gradients.
fn gradient(dem: &RasterWindow, dx: f64, dy: f64, ve: f64) -> (Vec<f32>, Vec<f32>) {
    let w = dem.width();
    let h = dem.height();
    let ve = ve as f32;
    let dx = dx as f32;
    let dy = dy as f32;

    let z = |col: usize, row: usize| dem.get(col, row) * ve;

    let mut gx = vec![0.0f32; w * h];
    let mut gy = vec![0.0f32; w * h];

    for row in 0..h {
        for col in 0..w {
            let i = row * w + col;

            gx[i] = if w < 2 {
                0.0
            } else if col == 0 {
                (z(1, row) - z(0, row)) / dx
            } else if col == w - 1 {
                (z(col, row) - z(col - 1, row)) / dx
            } else {
                (z(col + 1, row) - z(col - 1, row)) / (2.0 * dx)
            };

            gy[i] = if h < 2 {
                0.0
            } else if row == 0 {
                (z(col, 1) - z(col, 0)) / dy
            } else if row == h - 1 {
                (z(col, row) - z(col, row - 1)) / dy
            } else {
                (z(col, row + 1) - z(col, row - 1)) / (2.0 * dy)
            };
        }
    }

    (gx, gy)
}

/// Per-pixel illumination in [0, 1].
///
/// The raw normal-dot-light value is clipped to [0, 1] and then
/// contrast-stretched over the window's finite intensity range.
pub fn hillshade_intensity(dem: &RasterWindow, params: &ShadeParams) -> Vec<f32> {
    let (gx, gy) = gradient(dem, params.dx, params.dy, params.vertical_exaggeration);

    let az = (90.0 - params.azimuth_degree).to_radians();
    let alt = params.altitude_degree.to_radians();
    let light = [
        (az.cos() * alt.cos()) as f32,
        (az.sin() * alt.cos()) as f32,
        alt.sin() as f32,
    ];

    let mut imin = f32::INFINITY;
    let mut imax = f32::NEG_INFINITY;
    let mut intensity: Vec<f32> = gx
        .iter()
        .zip(&gy)
        .map(|(&gx, &gy)| {
            let norm = (gx * gx + gy * gy + 1.0).sqrt();
            let value = (-gx * light[0] - gy * light[1] + light[2]) / norm;
            if value.is_finite() {
                imin = imin.min(value);
                imax = imax.max(value);
            }
            value
        })
        .collect();

    for v in &mut intensity {
        *v = v.clamp(0.0, 1.0);
    }
    if imax - imin > 1e-6 {
        for v in &mut intensity {
            *v = (*v - imin) / (imax - imin);
        }
    }

    intensity
}

/// Shade an elevation window: colormap-mapped value blended with the
/// directional illumination. Returns RGB in [0, 1] per pixel.
pub fn shade(dem: &RasterWindow, cmap: &Colormap, params: &ShadeParams) -> Vec<[f32; 3]> {
    debug!(
        width = dem.width(),
        height = dem.height(),
        colormap = cmap.name,
        azimuth = params.azimuth_degree,
        altitude = params.altitude_degree,
        "shading window"
    );

    let intensity = hillshade_intensity(dem, params);

    dem.data()
        .iter()
        .zip(intensity)
        .map(|(&v, i)| {
            let t = normalize(v, params.vmin, params.vmax);
            let base = cmap.sample(t);
            blend(base, i, params.blend_mode)
        })
        .collect()
}

fn normalize(v: f32, vmin: f32, vmax: f32) -> f32 {
    if !v.is_finite() {
        return 0.0;
    }
    let span = vmax - vmin;
    if span <= f32::EPSILON {
        return 0.5;
    }
    ((v - vmin) / span).clamp(0.0, 1.0)
}

fn blend(base: [f32; 3], intensity: f32, mode: BlendMode) -> [f32; 3] {
    match mode {
        BlendMode::Hsv => blend_hsv(base, intensity),
        BlendMode::Overlay => blend_overlay(base, intensity),
        BlendMode::SoftLight => blend_soft_light(base, intensity),
    }
}

fn blend_hsv(rgb: [f32; 3], intensity: f32) -> [f32; 3] {
    // intensity rescaled to [-1, 1]: positive lightens, negative darkens
    let intensity = intensity * 2.0 - 1.0;
    let (h, mut s, mut v) = colormap::rgb_to_hsv(rgb[0], rgb[1], rgb[2]);

    if intensity > 0.0 {
        if s > 1e-10 {
            s = (1.0 - intensity) * s + intensity;
        }
        v = (1.0 - intensity) * v + intensity;
    } else {
        if s > 1e-10 {
            s *= 1.0 + intensity;
        }
        v *= 1.0 + intensity;
    }

    let (r, g, b) = colormap::hsv_to_rgb(h, s, v);
    [r, g, b]
}

fn blend_overlay(rgb: [f32; 3], intensity: f32) -> [f32; 3] {
    rgb.map(|c| {
        if c <= 0.5 {
            2.0 * intensity * c
        } else {
            1.0 - 2.0 * (1.0 - intensity) * (1.0 - c)
        }
    })
}

/// Pegtop soft-light formula.
fn blend_soft_light(rgb: [f32; 3], intensity: f32) -> [f32; 3] {
    rgb.map(|c| 2.0 * intensity * c + (1.0 - 2.0 * intensity) * c * c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colormap::GREYS_R;

    fn params(blend_mode: BlendMode) -> ShadeParams {
        ShadeParams {
            azimuth_degree: 315.0,
            altitude_degree: 45.0,
            vertical_exaggeration: 1.0,
            dx: 1.0,
            dy: 1.0,
            vmin: 0.0,
            vmax: 100.0,
            blend_mode,
        }
    }

    fn ramp_east(w: usize, h: usize, slope: f32) -> RasterWindow {
        let data = (0..w * h).map(|i| (i % w) as f32 * slope).collect();
        RasterWindow::new(w, h, data)
    }

    #[test]
    fn test_blend_mode_parse() {
        assert_eq!("hsv".parse::<BlendMode>().unwrap(), BlendMode::Hsv);
        assert_eq!("overlay".parse::<BlendMode>().unwrap(), BlendMode::Overlay);
        assert_eq!("soft".parse::<BlendMode>().unwrap(), BlendMode::SoftLight);

        let err = "screen".parse::<BlendMode>().unwrap_err();
        assert!(matches!(err, TileError::InvalidParameter { .. }));
    }

    #[test]
    fn test_padded_range() {
        assert_eq!(padded_range((0.0, 100.0), 0.25), (-25.0, 125.0));
        assert_eq!(padded_range((50.0, 50.0), 0.25), (50.0, 50.0));
    }

    #[test]
    fn test_flat_surface_uniform_intensity() {
        let dem = RasterWindow::filled(8, 8, 42.0);
        let intensity = hillshade_intensity(&dem, &params(BlendMode::SoftLight));

        let first = intensity[0];
        assert!(intensity.iter().all(|&v| (v - first).abs() < 1e-6));
        // flat ground lit at 45 degrees: sin(45)
        assert!((first - std::f64::consts::FRAC_1_SQRT_2 as f32).abs() < 1e-4);
    }

    #[test]
    fn test_slope_facing_light_is_brighter() {
        let mut p = params(BlendMode::SoftLight);
        p.azimuth_degree = 270.0; // light from the west

        let west_facing = hillshade_intensity(&ramp_east(8, 8, 1.0), &p);
        let east_facing = hillshade_intensity(&ramp_east(8, 8, -1.0), &p);

        let mean = |v: &[f32]| v.iter().sum::<f32>() / v.len() as f32;
        assert!(mean(&west_facing) > mean(&east_facing) + 0.5);
    }

    #[test]
    fn test_shade_output_in_unit_range() {
        for mode in [BlendMode::Hsv, BlendMode::Overlay, BlendMode::SoftLight] {
            let dem = ramp_east(8, 8, 2.0);
            let rgb = shade(&dem, &GREYS_R, &params(mode));
            for px in rgb {
                for channel in px {
                    assert!((-1e-5..=1.0 + 1e-5).contains(&channel));
                }
            }
        }
    }

    #[test]
    fn test_shade_handles_nodata() {
        let mut data = vec![10.0f32; 16];
        data[5] = f32::NAN;
        let dem = RasterWindow::new(4, 4, data);
        // must not panic; masking happens in the finalizer
        let rgb = shade(&dem, &GREYS_R, &params(BlendMode::SoftLight));
        assert_eq!(rgb.len(), 16);
    }
}
