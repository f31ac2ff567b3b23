//! Relief/openness mapping.
//!
//! Computes a two-channel terrain descriptor — slope and differential
//! sky-view openness — over a buffered window and encodes it through a
//! synthetic 2-D color lookup table. The caller crops the buffered result
//! back to the tile footprint and masks it with the unbuffered window.

use rayon::prelude::*;
use tiles_common::RasterWindow;
use tracing::debug;

use crate::colormap::hsv_to_rgb;

/// Parameters for the openness scans.
#[derive(Debug, Clone)]
pub struct OpennessParams {
    /// Number of azimuth search directions.
    pub n_dir: usize,
    /// Maximum search radius in pixels.
    pub r_max: usize,
    /// Noise removal level: the innermost `noise` cells of each direction's
    /// scan are skipped. 0 disables removal.
    pub noise: usize,
    /// Sentinel marking missing elevation; NaN cells are always skipped.
    pub nodata: Option<f64>,
}

/// Per-pixel slope in degrees.
///
/// Central differences in the interior, one-sided at edges, with `dx`/`dy`
/// ground sampling distances. Nodata is NOT substituted here: sentinel
/// values feed the gradient unmasked, and masking is deferred entirely to
/// the final crop-and-mask step.
pub fn slope_degrees(dem: &RasterWindow, dx: f64, dy: f64, ve: f64) -> Vec<f32> {
    let w = dem.width();
    let h = dem.height();
    let ve = ve as f32;
    let dx = dx as f32;
    let dy = dy as f32;

    let z = |col: usize, row: usize| dem.get(col, row) * ve;

    let mut slope = vec![0.0f32; w * h];
    for row in 0..h {
        for col in 0..w {
            let gx = if w < 2 {
                0.0
            } else if col == 0 {
                (z(1, row) - z(0, row)) / dx
            } else if col == w - 1 {
                (z(col, row) - z(col - 1, row)) / dx
            } else {
                (z(col + 1, row) - z(col - 1, row)) / (2.0 * dx)
            };
            let gy = if h < 2 {
                0.0
            } else if row == 0 {
                (z(col, 1) - z(col, 0)) / dy
            } else if row == h - 1 {
                (z(col, row) - z(col, row - 1)) / dy
            } else {
                (z(col, row + 1) - z(col, row - 1)) / (2.0 * dy)
            };

            slope[row * w + col] = (gx * gx + gy * gy).sqrt().atan().to_degrees();
        }
    }

    slope
}

/// Positive openness in degrees.
///
/// For each pixel the horizon angle is scanned along `n_dir` azimuth
/// directions out to `r_max` pixels; openness is the mean of
/// (90° − horizon angle) over the directions. Cells equal to the nodata
/// sentinel (or NaN) are skipped during the scan; a nodata center yields
/// NaN. Negative openness is obtained by running this over the negated
/// elevations.
pub fn positive_openness(
    dem: &RasterWindow,
    resolution: f64,
    params: &OpennessParams,
) -> Vec<f32> {
    let w = dem.width();
    let h = dem.height();
    let n_dir = params.n_dir.max(1);
    let resolution = resolution as f32;

    let is_invalid = |v: f32| -> bool {
        v.is_nan()
            || params
                .nodata
                .map(|sentinel| v == sentinel as f32)
                .unwrap_or(false)
    };

    // Per-direction integer step offsets, reused for every pixel.
    let offsets: Vec<Vec<(isize, isize, f32)>> = (0..n_dir)
        .map(|dir| {
            let azimuth = 2.0 * std::f64::consts::PI * dir as f64 / n_dir as f64;
            let (sin, cos) = azimuth.sin_cos();
            (params.noise + 1..=params.r_max)
                .filter_map(|r| {
                    let dc = (r as f64 * cos).round() as isize;
                    let dr = (r as f64 * sin).round() as isize;
                    if dc == 0 && dr == 0 {
                        return None;
                    }
                    let dist = ((dc * dc + dr * dr) as f32).sqrt();
                    Some((dc, dr, dist))
                })
                .collect()
        })
        .collect();

    let mut openness = vec![0.0f32; w * h];
    openness
        .par_chunks_mut(w)
        .enumerate()
        .for_each(|(row, out_row)| {
            for (col, out) in out_row.iter_mut().enumerate() {
                let center = dem.get(col, row);
                if is_invalid(center) {
                    *out = f32::NAN;
                    continue;
                }

                let mut sum = 0.0f32;
                for steps in &offsets {
                    let mut max_tan = f32::NEG_INFINITY;
                    for &(dc, dr, dist) in steps {
                        let sc = col as isize + dc;
                        let sr = row as isize + dr;
                        if sc < 0 || sr < 0 || sc >= w as isize || sr >= h as isize {
                            continue;
                        }
                        let z = dem.get(sc as usize, sr as usize);
                        if is_invalid(z) {
                            continue;
                        }
                        max_tan = max_tan.max((z - center) / (dist * resolution));
                    }

                    let horizon = if max_tan.is_finite() {
                        max_tan.atan().to_degrees()
                    } else {
                        0.0
                    };
                    sum += 90.0 - horizon;
                }

                *out = sum / n_dir as f32;
            }
        });

    openness
}

/// Build the synthetic color lookup table, shape `(saturation, brightness)`.
///
/// An HSV image with hue 0, saturation linear 0→255 along axis 0 and value
/// linear 0→255 along axis 1, converted to RGB once. Entries are stored in
/// BGR channel order, matching the converter the palette was derived from;
/// the caller swaps channels after crop and mask. Pure function, freshly
/// allocated per call.
pub fn color_scheme(saturation: usize, brightness: usize) -> Vec<[u8; 3]> {
    assert!(
        saturation > 0 && brightness > 0,
        "lookup table axes must be non-empty"
    );

    let axis = |i: usize, len: usize| -> f32 {
        if len <= 1 {
            0.0
        } else {
            255.0 * i as f32 / (len - 1) as f32
        }
    };

    let mut lut = Vec::with_capacity(saturation * brightness);
    for s in 0..saturation {
        let sat = axis(s, saturation) / 255.0;
        for v in 0..brightness {
            let val = axis(v, brightness) / 255.0;
            let (r, g, b) = hsv_to_rgb(0.0, sat, val);
            lut.push([
                (b * 255.0) as u8,
                (g * 255.0) as u8,
                (r * 255.0) as u8,
            ]);
        }
    }
    lut
}

/// Index of the lookup table's slope axis for a slope magnitude in degrees.
///
/// Truncated to an integer and clamped to `[0, saturation - 1]`; non-finite
/// slopes map to 0.
pub fn slope_index(slope: f32, saturation: usize) -> usize {
    if !slope.is_finite() {
        return 0;
    }
    (slope.abs() as usize).min(saturation - 1)
}

/// Index of the lookup table's brightness axis for a differential openness.
///
/// Quantized as `(openness + brightness) / 2`, truncated and clamped on both
/// ends; non-finite openness maps to 0.
pub fn openness_index(openness: f32, brightness: usize) -> usize {
    if !openness.is_finite() {
        return 0;
    }
    let q = (openness + brightness as f32) / 2.0;
    (q.max(0.0) as usize).min(brightness - 1)
}

/// Map per-pixel slope and differential openness through the lookup table.
///
/// Output carries the table's BGR channel order over the buffered extent.
pub fn relief_rgb(
    slope: &[f32],
    openness: &[f32],
    lut: &[[u8; 3]],
    saturation: usize,
    brightness: usize,
) -> Vec<[u8; 3]> {
    debug_assert_eq!(slope.len(), openness.len());
    debug_assert_eq!(lut.len(), saturation * brightness);
    debug!(
        pixels = slope.len(),
        saturation, brightness, "encoding relief image"
    );

    slope
        .iter()
        .zip(openness)
        .map(|(&s, &o)| lut[slope_index(s, saturation) * brightness + openness_index(o, brightness)])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> OpennessParams {
        OpennessParams {
            n_dir: 8,
            r_max: 4,
            noise: 0,
            nodata: Some(-9999.0),
        }
    }

    #[test]
    fn test_slope_flat_is_zero() {
        let dem = RasterWindow::filled(6, 6, 100.0);
        let slope = slope_degrees(&dem, 1.0, 1.0, 1.0);
        assert!(slope.iter().all(|&s| s.abs() < 1e-6));
    }

    #[test]
    fn test_slope_unit_ramp_is_45_degrees() {
        let data: Vec<f32> = (0..36).map(|i| (i % 6) as f32).collect();
        let dem = RasterWindow::new(6, 6, data);
        let slope = slope_degrees(&dem, 1.0, 1.0, 1.0);
        assert!(slope.iter().all(|&s| (s - 45.0).abs() < 1e-4));
    }

    #[test]
    fn test_openness_flat_is_90() {
        let dem = RasterWindow::filled(12, 12, 50.0);
        let opns = positive_openness(&dem, 1.0, &params());
        // interior pixels see a flat horizon in every direction
        let center = opns[6 * 12 + 6];
        assert!((center - 90.0).abs() < 1e-4);
    }

    #[test]
    fn test_openness_pit_exceeds_flat() {
        // center pixel sits in a pit; terrain rises in every direction
        let mut data = vec![0.0f32; 9 * 9];
        data[4 * 9 + 4] = -10.0;
        let dem = RasterWindow::new(9, 9, data);

        let opns = positive_openness(&dem, 1.0, &params());
        assert!(opns[4 * 9 + 4] < 90.0);

        let neg = positive_openness(&dem.negated(), 1.0, &params());
        assert!(neg[4 * 9 + 4] > opns[4 * 9 + 4]);
    }

    #[test]
    fn test_openness_nodata_center_is_nan() {
        let mut data = vec![0.0f32; 25];
        data[12] = -9999.0;
        let dem = RasterWindow::new(5, 5, data);
        let opns = positive_openness(&dem, 1.0, &params());
        assert!(opns[12].is_nan());
        // neighbors skip the sentinel instead of treating it as a cliff
        assert!((opns[11] - 90.0).abs() < 1.0);
    }

    #[test]
    fn test_noise_skips_inner_cells() {
        // a one-cell spike is invisible when the innermost ring is skipped
        let mut data = vec![0.0f32; 25];
        data[12] = 0.0;
        data[13] = 100.0;
        let dem = RasterWindow::new(5, 5, data);

        let sharp = positive_openness(&dem, 1.0, &OpennessParams { noise: 0, r_max: 1, ..params() });
        let smoothed = positive_openness(&dem, 1.0, &OpennessParams { noise: 1, r_max: 1, ..params() });
        assert!(sharp[12] < smoothed[12]);
        assert!((smoothed[12] - 90.0).abs() < 1e-4);
    }

    #[test]
    fn test_color_scheme_shape_and_gradient() {
        let lut = color_scheme(90, 150);
        assert_eq!(lut.len(), 90 * 150);

        // zero saturation, max value: white
        assert_eq!(lut[149], [255, 255, 255]);
        // zero value: black everywhere
        assert_eq!(lut[0], [0, 0, 0]);
        // max saturation at hue 0 is pure red; BGR order puts it last
        assert_eq!(lut[89 * 150 + 149], [0, 0, 255]);
    }

    #[test]
    fn test_indices_stay_in_bounds() {
        for &slope in &[-1e9f32, -90.5, 0.0, 42.3, 89.0, 1e9, f32::NAN] {
            let idx = slope_index(slope, 90);
            assert!(idx < 90);
        }
        for &opns in &[-1e9f32, -200.0, 0.0, 90.0, 200.0, 1e9, f32::NAN] {
            let idx = openness_index(opns, 150);
            assert!(idx < 150);
        }
    }

    #[test]
    fn test_relief_rgb_extremes_do_not_panic() {
        let lut = color_scheme(90, 150);
        let slope = vec![f32::NAN, 1e9, -1e9, 45.0];
        let openness = vec![1e9, f32::NAN, -1e9, 0.0];
        let rgb = relief_rgb(&slope, &openness, &lut, 90, 150);
        assert_eq!(rgb.len(), 4);
    }
}
