//! Named colormaps with linear and quantized sampling.
//!
//! Colormaps are resolved against a static registry; unknown names fall back
//! to a caller-supplied default instead of failing the request.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use tracing::warn;

/// A colormap defined by interpolated color stops.
#[derive(Debug)]
pub struct Colormap {
    pub name: &'static str,
    stops: &'static [(f32, [u8; 3])],
}

/// Default grey colormap used when a hillshade colormap name is unknown.
pub static GREYS_R: Colormap = Colormap {
    name: "greys_r",
    stops: &[(0.0, [0, 0, 0]), (1.0, [255, 255, 255])],
};

pub static GREYS: Colormap = Colormap {
    name: "greys",
    stops: &[(0.0, [255, 255, 255]), (1.0, [0, 0, 0])],
};

/// Default perceptual colormap used when a classification colormap name is
/// unknown.
pub static VIRIDIS: Colormap = Colormap {
    name: "viridis",
    stops: &[
        (0.0, [68, 1, 84]),
        (0.125, [72, 40, 120]),
        (0.25, [62, 74, 137]),
        (0.375, [49, 104, 142]),
        (0.5, [38, 130, 142]),
        (0.625, [31, 158, 137]),
        (0.75, [53, 183, 121]),
        (0.875, [109, 205, 89]),
        (1.0, [253, 231, 37]),
    ],
};

pub static MAGMA: Colormap = Colormap {
    name: "magma",
    stops: &[
        (0.0, [0, 0, 4]),
        (0.125, [28, 16, 68]),
        (0.25, [79, 18, 123]),
        (0.375, [129, 37, 129]),
        (0.5, [181, 54, 122]),
        (0.625, [229, 80, 100]),
        (0.75, [251, 135, 97]),
        (0.875, [254, 194, 135]),
        (1.0, [252, 253, 191]),
    ],
};

pub static TERRAIN: Colormap = Colormap {
    name: "terrain",
    stops: &[
        (0.0, [51, 51, 153]),
        (0.15, [0, 153, 255]),
        (0.25, [0, 204, 102]),
        (0.5, [255, 255, 153]),
        (0.75, [128, 92, 84]),
        (1.0, [255, 255, 255]),
    ],
};

static REGISTRY: Lazy<HashMap<&'static str, &'static Colormap>> = Lazy::new(|| {
    let mut registry: HashMap<&'static str, &'static Colormap> = HashMap::new();
    for cmap in [&GREYS, &GREYS_R, &VIRIDIS, &MAGMA, &TERRAIN] {
        registry.insert(cmap.name, cmap);
    }
    registry
});

/// Look up a colormap by case-insensitive name.
pub fn lookup(name: &str) -> Option<&'static Colormap> {
    REGISTRY.get(name.to_ascii_lowercase().as_str()).copied()
}

/// Look up a colormap, falling back to `fallback` on an unknown name.
///
/// The fallback is logged, not surfaced: an unknown colormap never fails a
/// render request.
pub fn lookup_or(name: &str, fallback: &'static Colormap) -> &'static Colormap {
    match lookup(name) {
        Some(cmap) => cmap,
        None => {
            warn!(colormap = name, fallback = fallback.name, "unknown colormap");
            fallback
        }
    }
}

impl Colormap {
    /// Sample the colormap at `t` in [0, 1], returning RGB in [0, 1].
    ///
    /// Out-of-range values are clamped; non-finite values sample position 0.
    pub fn sample(&self, t: f32) -> [f32; 3] {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };

        let mut upper = self.stops.len() - 1;
        for (i, stop) in self.stops.iter().enumerate() {
            if stop.0 >= t {
                upper = i;
                break;
            }
        }
        if upper == 0 {
            return rgb_to_unit(self.stops[0].1);
        }

        let (lo_pos, lo_color) = self.stops[upper - 1];
        let (hi_pos, hi_color) = self.stops[upper];
        let span = hi_pos - lo_pos;
        let frac = if span <= f32::EPSILON {
            0.0
        } else {
            (t - lo_pos) / span
        };

        let lo = rgb_to_unit(lo_color);
        let hi = rgb_to_unit(hi_color);
        [
            lo[0] + (hi[0] - lo[0]) * frac,
            lo[1] + (hi[1] - lo[1]) * frac,
            lo[2] + (hi[2] - lo[2]) * frac,
        ]
    }

    /// Sample the colormap quantized into exactly `n_classes` buckets.
    ///
    /// Bucket colors are taken at `i / (n - 1)` of the continuous map, and a
    /// value picks its bucket via [`class_index`], so output is banded rather
    /// than continuous.
    pub fn sample_quantized(&self, t: f32, n_classes: usize) -> [f32; 3] {
        let index = class_index(t, n_classes);
        let position = if n_classes <= 1 {
            0.0
        } else {
            index as f32 / (n_classes as f32 - 1.0)
        };
        self.sample(position)
    }
}

/// Bucket index for a normalized value in [0, 1] quantized into `n_classes`.
///
/// Boundary values map upward: with 4 classes, 0.25 -> 1, 0.5 -> 2,
/// 0.75 -> 3; 1.0 clamps to the last bucket. Non-finite values map to
/// bucket 0.
pub fn class_index(t: f32, n_classes: usize) -> usize {
    assert!(n_classes > 0, "class count must be positive");
    if !t.is_finite() {
        return 0;
    }
    let t = t.clamp(0.0, 1.0);
    ((t * n_classes as f32) as usize).min(n_classes - 1)
}

fn rgb_to_unit(rgb: [u8; 3]) -> [f32; 3] {
    [
        rgb[0] as f32 / 255.0,
        rgb[1] as f32 / 255.0,
        rgb[2] as f32 / 255.0,
    ]
}

/// Convert RGB in [0, 1] to HSV (hue in degrees 0-360, s/v in [0, 1]).
pub fn rgb_to_hsv(r: f32, g: f32, b: f32) -> (f32, f32, f32) {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let h = if delta.abs() < 1e-12 {
        0.0
    } else if (max - r).abs() < 1e-12 {
        60.0 * (((g - b) / delta).rem_euclid(6.0))
    } else if (max - g).abs() < 1e-12 {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };

    let s = if max.abs() < 1e-12 { 0.0 } else { delta / max };

    (h, s, max)
}

/// Convert HSV (hue in degrees, s/v in [0, 1]) to RGB in [0, 1].
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (f32, f32, f32) {
    let h = h.rem_euclid(360.0);
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    (r + m, g + m, b + m)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_case_insensitive() {
        assert_eq!(lookup("Viridis").unwrap().name, "viridis");
        assert_eq!(lookup("GREYS_R").unwrap().name, "greys_r");
        assert!(lookup("plasma").is_none());
    }

    #[test]
    fn test_lookup_or_falls_back() {
        let cmap = lookup_or("not-a-colormap", &GREYS_R);
        assert_eq!(cmap.name, "greys_r");
    }

    #[test]
    fn test_sample_endpoints() {
        let lo = VIRIDIS.sample(0.0);
        assert!((lo[0] - 68.0 / 255.0).abs() < 1e-6);

        let hi = VIRIDIS.sample(1.0);
        assert!((hi[0] - 253.0 / 255.0).abs() < 1e-6);

        // clamped
        assert_eq!(VIRIDIS.sample(-3.0), VIRIDIS.sample(0.0));
        assert_eq!(VIRIDIS.sample(7.0), VIRIDIS.sample(1.0));
    }

    #[test]
    fn test_sample_midpoint_interpolates() {
        let mid = GREYS_R.sample(0.5);
        for channel in mid {
            assert!((channel - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn test_class_index_boundaries() {
        assert_eq!(class_index(0.0, 4), 0);
        assert_eq!(class_index(0.2, 4), 0);
        assert_eq!(class_index(0.25, 4), 1);
        assert_eq!(class_index(0.5, 4), 2);
        assert_eq!(class_index(0.75, 4), 3);
        assert_eq!(class_index(1.0, 4), 3);
    }

    #[test]
    fn test_class_index_non_finite() {
        assert_eq!(class_index(f32::NAN, 4), 0);
        assert_eq!(class_index(f32::INFINITY, 4), 3);
    }

    #[test]
    fn test_quantized_is_banded() {
        // all values within one bucket share a color
        let a = VIRIDIS.sample_quantized(0.26, 4);
        let b = VIRIDIS.sample_quantized(0.49, 4);
        assert_eq!(a, b);

        let c = VIRIDIS.sample_quantized(0.51, 4);
        assert_ne!(a, c);
    }

    #[test]
    fn test_hsv_roundtrip() {
        for &(r, g, b) in &[(1.0f32, 0.0f32, 0.0f32), (0.2, 0.7, 0.4), (0.0, 0.0, 0.0)] {
            let (h, s, v) = rgb_to_hsv(r, g, b);
            let (r2, g2, b2) = hsv_to_rgb(h, s, v);
            assert!((r - r2).abs() < 1e-5);
            assert!((g - g2).abs() < 1e-5);
            assert!((b - b2).abs() < 1e-5);
        }
    }
}
