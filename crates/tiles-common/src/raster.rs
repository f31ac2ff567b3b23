//! Raster windows: 2-D sample grids with NaN nodata.

/// A window of raster samples in row-major order.
///
/// Invalid cells (nodata) are represented as NaN. Windows are produced fresh
/// per request by the datasource and are not shared between algorithm steps.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterWindow {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl RasterWindow {
    /// Wrap an existing sample buffer. `data.len()` must equal
    /// `width * height`.
    pub fn new(width: usize, height: usize, data: Vec<f32>) -> Self {
        assert_eq!(
            data.len(),
            width * height,
            "raster window data length must match dimensions"
        );
        Self {
            width,
            height,
            data,
        }
    }

    /// A window filled with a constant value.
    pub fn filled(width: usize, height: usize, value: f32) -> Self {
        Self::new(width, height, vec![value; width * height])
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Sample at (col, row). Out-of-range indices panic.
    pub fn get(&self, col: usize, row: usize) -> f32 {
        self.data[row * self.width + col]
    }

    /// Per-pixel invalid (nodata) mask.
    pub fn invalid_mask(&self) -> Vec<bool> {
        self.data.iter().map(|v| v.is_nan()).collect()
    }

    /// Minimum and maximum over valid samples, or `None` if every sample is
    /// nodata.
    pub fn valid_range(&self) -> Option<(f32, f32)> {
        let mut range: Option<(f32, f32)> = None;
        for &v in &self.data {
            if v.is_nan() {
                continue;
            }
            range = Some(match range {
                Some((lo, hi)) => (lo.min(v), hi.max(v)),
                None => (v, v),
            });
        }
        range
    }

    /// A copy with every valid sample negated; nodata stays nodata.
    pub fn negated(&self) -> RasterWindow {
        RasterWindow {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(|v| -v).collect(),
        }
    }

    /// Extract the centered `crop_w x crop_h` sub-window.
    ///
    /// The crop origin is `(dim - crop) / 2` on each axis in integer pixel
    /// units, so a window of `(T + 2b)` always crops back to exactly `T`.
    pub fn crop_center(&self, crop_w: usize, crop_h: usize) -> RasterWindow {
        assert!(
            crop_w <= self.width && crop_h <= self.height,
            "crop must not exceed window dimensions"
        );
        let start_x = (self.width - crop_w) / 2;
        let start_y = (self.height - crop_h) / 2;

        let mut data = Vec::with_capacity(crop_w * crop_h);
        for row in start_y..start_y + crop_h {
            let offset = row * self.width + start_x;
            data.extend_from_slice(&self.data[offset..offset + crop_w]);
        }

        RasterWindow::new(crop_w, crop_h, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_mask() {
        let window = RasterWindow::new(2, 2, vec![1.0, f32::NAN, 3.0, f32::NAN]);
        assert_eq!(window.invalid_mask(), vec![false, true, false, true]);
    }

    #[test]
    fn test_valid_range_skips_nodata() {
        let window = RasterWindow::new(2, 2, vec![5.0, f32::NAN, -2.0, 11.0]);
        assert_eq!(window.valid_range(), Some((-2.0, 11.0)));

        let all_nodata = RasterWindow::filled(2, 2, f32::NAN);
        assert_eq!(all_nodata.valid_range(), None);
    }

    #[test]
    fn test_negated_keeps_nodata() {
        let window = RasterWindow::new(2, 1, vec![3.0, f32::NAN]);
        let negated = window.negated();
        assert_eq!(negated.get(0, 0), -3.0);
        assert!(negated.get(1, 0).is_nan());
    }

    #[test]
    fn test_crop_center_exact() {
        // 6x6 window, values = row * 10 + col
        let data: Vec<f32> = (0..36).map(|i| (i / 6 * 10 + i % 6) as f32).collect();
        let window = RasterWindow::new(6, 6, data);

        let cropped = window.crop_center(2, 2);
        assert_eq!(cropped.width(), 2);
        assert_eq!(cropped.height(), 2);
        assert_eq!(cropped.data(), &[22.0, 23.0, 32.0, 33.0]);
    }

    #[test]
    fn test_crop_center_buffered_sizes() {
        for buffer in [0usize, 1, 3, 10] {
            for tile in [1usize, 8, 256] {
                let side = tile + 2 * buffer;
                let window = RasterWindow::filled(side, side, 1.0);
                let cropped = window.crop_center(tile, tile);
                assert_eq!((cropped.width(), cropped.height()), (tile, tile));
            }
        }
    }
}
