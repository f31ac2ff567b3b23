//! Discrete (classified) rendering.
//!
//! Values are clamped into `[vmin, vmax]`, rescaled to [0, 1] and mapped
//! through a colormap quantized into a fixed number of buckets, producing
//! deliberately banded output.
//!
//! Known gap: pure-white output pixels are visually indistinguishable from
//! transparency in some client renderers but are not masked here.

use tiles_common::RasterWindow;
use tracing::debug;

use crate::colormap::Colormap;
use crate::image::to_uint8;

/// Classify a window into `n_classes` color buckets.
///
/// Nodata samples pass through as bucket-0 colors and are expected to be
/// masked by the finalizer. Callers must guarantee `vmax > vmin`.
pub fn classify(
    window: &RasterWindow,
    cmap: &Colormap,
    n_classes: usize,
    vmin: f32,
    vmax: f32,
) -> Vec<[u8; 3]> {
    debug_assert!(vmax > vmin, "classification range must be non-degenerate");
    debug!(
        width = window.width(),
        height = window.height(),
        colormap = cmap.name,
        n_classes,
        vmin,
        vmax,
        "classifying window"
    );

    window
        .data()
        .iter()
        .map(|&v| {
            // NaN fails both comparisons and stays NaN through the rescale
            let v = if v <= vmin {
                vmin
            } else if v >= vmax {
                vmax
            } else {
                v
            };
            let t = (v - vmin) / (vmax - vmin);
            let color = cmap.sample_quantized(t, n_classes);
            [
                to_uint8(color[0], 0.0, 1.0),
                to_uint8(color[1], 0.0, 1.0),
                to_uint8(color[2], 0.0, 1.0),
            ]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colormap::VIRIDIS;

    #[test]
    fn test_uniform_window_single_bucket() {
        let window = RasterWindow::filled(4, 4, 42.0);
        let rgb = classify(&window, &VIRIDIS, 8, 0.0, 100.0);
        let first = rgb[0];
        assert!(rgb.iter().all(|&c| c == first));
    }

    #[test]
    fn test_clamping_matches_exact_bounds() {
        let below = RasterWindow::filled(2, 2, -50.0);
        let at_min = RasterWindow::filled(2, 2, 0.0);
        assert_eq!(
            classify(&below, &VIRIDIS, 8, 0.0, 100.0),
            classify(&at_min, &VIRIDIS, 8, 0.0, 100.0)
        );

        let above = RasterWindow::filled(2, 2, 1e9);
        let at_max = RasterWindow::filled(2, 2, 100.0);
        assert_eq!(
            classify(&above, &VIRIDIS, 8, 0.0, 100.0),
            classify(&at_max, &VIRIDIS, 8, 0.0, 100.0)
        );
    }

    #[test]
    fn test_value_25_of_4_classes_is_bucket_1() {
        let window = RasterWindow::filled(1, 1, 25.0);
        let rgb = classify(&window, &VIRIDIS, 4, 0.0, 100.0);

        let expected = VIRIDIS.sample_quantized(0.25, 4);
        assert_eq!(
            rgb[0],
            [
                to_uint8(expected[0], 0.0, 1.0),
                to_uint8(expected[1], 0.0, 1.0),
                to_uint8(expected[2], 0.0, 1.0),
            ]
        );
        // and bucket 1 is distinct from bucket 0
        assert_ne!(
            VIRIDIS.sample_quantized(0.25, 4),
            VIRIDIS.sample_quantized(0.0, 4)
        );
    }
}
