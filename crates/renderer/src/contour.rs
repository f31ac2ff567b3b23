//! Contour (isoline) extraction and rasterization.
//!
//! Iso-value polylines are extracted with marching squares over the raster
//! grid, connected into continuous lines, and stroked onto a transparent
//! canvas in tile pixel coordinates.

use tiles_common::RasterWindow;
use tracing::debug;

use crate::image::to_uint8;

/// A point in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A line segment between two points.
#[derive(Debug, Clone)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

/// A connected contour polyline at one iso-value.
#[derive(Debug, Clone)]
pub struct Contour {
    pub level: f32,
    pub points: Vec<Point>,
    pub closed: bool,
}

/// Iso-values stepping by `interval` from `min` (inclusive) up to `max`
/// (exclusive).
///
/// A non-positive interval, a non-finite input or an inverted range yields no
/// levels; an interval wider than the range yields only `min` itself.
pub fn iso_levels(min: f32, max: f32, interval: f32) -> Vec<f32> {
    if !min.is_finite() || !max.is_finite() || !interval.is_finite() {
        return vec![];
    }
    if interval <= 0.0 || max <= min {
        return vec![];
    }

    let count = ((max - min) / interval).ceil() as usize;
    (0..count)
        .map(|i| min + i as f32 * interval)
        .filter(|&level| level < max)
        .collect()
}

/// Extract contour segments for one iso-value with marching squares.
///
/// Cells touching a nodata (NaN) corner are excluded from contouring.
pub fn march_squares(window: &RasterWindow, level: f32) -> Vec<Segment> {
    let w = window.width();
    let h = window.height();
    if w < 2 || h < 2 {
        return vec![];
    }

    let mut segments = Vec::new();

    for row in 0..h - 1 {
        for col in 0..w - 1 {
            let nw = window.get(col, row);
            let ne = window.get(col + 1, row);
            let sw = window.get(col, row + 1);
            let se = window.get(col + 1, row + 1);

            if nw.is_nan() || ne.is_nan() || sw.is_nan() || se.is_nan() {
                continue;
            }

            let mut case = 0u8;
            if nw >= level {
                case |= 1;
            }
            if ne >= level {
                case |= 2;
            }
            if se >= level {
                case |= 4;
            }
            if sw >= level {
                case |= 8;
            }

            let x = col as f32;
            let y = row as f32;
            let top = edge_point(x, y, x + 1.0, y, nw, ne, level);
            let right = edge_point(x + 1.0, y, x + 1.0, y + 1.0, ne, se, level);
            let bottom = edge_point(x, y + 1.0, x + 1.0, y + 1.0, sw, se, level);
            let left = edge_point(x, y, x, y + 1.0, nw, sw, level);

            match case {
                0 | 15 => {}
                1 | 14 => segments.push(Segment { start: left, end: top }),
                2 | 13 => segments.push(Segment { start: top, end: right }),
                3 | 12 => segments.push(Segment { start: left, end: right }),
                4 | 11 => segments.push(Segment { start: right, end: bottom }),
                6 | 9 => segments.push(Segment { start: top, end: bottom }),
                7 | 8 => segments.push(Segment { start: left, end: bottom }),
                // saddles: two separate segments
                5 => {
                    segments.push(Segment { start: left, end: top });
                    segments.push(Segment { start: right, end: bottom });
                }
                10 => {
                    segments.push(Segment { start: top, end: right });
                    segments.push(Segment { start: left, end: bottom });
                }
                _ => unreachable!(),
            }
        }
    }

    segments
}

/// Where the iso-value crosses the edge between two corner samples.
fn edge_point(x1: f32, y1: f32, x2: f32, y2: f32, v1: f32, v2: f32, level: f32) -> Point {
    if (v2 - v1).abs() < 1e-6 {
        return Point::new((x1 + x2) / 2.0, (y1 + y2) / 2.0);
    }
    let t = ((level - v1) / (v2 - v1)).clamp(0.0, 1.0);
    Point::new(x1 + t * (x2 - x1), y1 + t * (y2 - y1))
}

/// Connect unordered segments into continuous polylines.
pub fn connect_segments(segments: Vec<Segment>) -> Vec<Contour> {
    const EPSILON: f32 = 0.001;

    let mut contours = Vec::new();
    let mut used = vec![false; segments.len()];

    let close = |a: &Point, b: &Point| {
        (a.x - b.x).powi(2) + (a.y - b.y).powi(2) < EPSILON * EPSILON
    };

    for start in 0..segments.len() {
        if used[start] {
            continue;
        }
        used[start] = true;
        let mut points = vec![segments[start].start, segments[start].end];

        let mut extended = true;
        while extended {
            extended = false;
            let tail = *points.last().unwrap();

            for (i, seg) in segments.iter().enumerate() {
                if used[i] {
                    continue;
                }
                if close(&seg.start, &tail) {
                    points.push(seg.end);
                } else if close(&seg.end, &tail) {
                    points.push(seg.start);
                } else {
                    continue;
                }
                used[i] = true;
                extended = true;
                break;
            }
        }

        let closed = close(&points[0], points.last().unwrap());
        contours.push(Contour {
            level: 0.0,
            points,
            closed,
        });
    }

    contours
}

/// Extract connected contours for every iso-value.
pub fn extract_contours(window: &RasterWindow, levels: &[f32]) -> Vec<Contour> {
    let mut all = Vec::new();
    for &level in levels {
        let segments = march_squares(window, level);
        let mut contours = connect_segments(segments);
        for contour in &mut contours {
            contour.level = level;
        }
        all.extend(contours);
    }

    debug!(
        num_levels = levels.len(),
        num_contours = all.len(),
        total_points = all.iter().map(|c| c.points.len()).sum::<usize>(),
        "extracted contours"
    );
    all
}

/// Stroke contour polylines onto a transparent canvas.
///
/// Lines are 1 px wide in the given color (RGB, 0-1 range). Returns
/// straight-alpha RGBA pixels; pixels never touched by a stroke have alpha 0.
pub fn render_contours(
    contours: &[Contour],
    width: usize,
    height: usize,
    color: [f32; 3],
) -> Result<Vec<u8>, String> {
    use tiny_skia::{
        Color, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform,
    };

    let mut pixmap = Pixmap::new(width as u32, height as u32)
        .ok_or_else(|| "failed to allocate contour canvas".to_string())?;
    pixmap.fill(Color::TRANSPARENT);

    let mut paint = Paint::default();
    paint.set_color_rgba8(
        to_uint8(color[0], 0.0, 1.0),
        to_uint8(color[1], 0.0, 1.0),
        to_uint8(color[2], 0.0, 1.0),
        255,
    );
    paint.anti_alias = true;

    let stroke = Stroke {
        width: 1.0,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    };

    for contour in contours {
        if contour.points.len() < 2 {
            continue;
        }

        let mut pb = PathBuilder::new();
        pb.move_to(contour.points[0].x, contour.points[0].y);
        for point in &contour.points[1..] {
            pb.line_to(point.x, point.y);
        }
        if contour.closed {
            pb.close();
        }

        if let Some(path) = pb.finish() {
            pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }
    }

    let mut pixels = Vec::with_capacity(width * height * 4);
    for px in pixmap.pixels() {
        let c = px.demultiply();
        pixels.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    Ok(pixels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso_levels_exclusive_upper_bound() {
        assert_eq!(iso_levels(0.0, 20.0, 5.0), vec![0.0, 5.0, 10.0, 15.0]);
    }

    #[test]
    fn test_iso_levels_degenerate() {
        assert!(iso_levels(0.0, 20.0, 0.0).is_empty());
        assert!(iso_levels(0.0, 20.0, -1.0).is_empty());
        assert!(iso_levels(20.0, 0.0, 5.0).is_empty());
        assert!(iso_levels(0.0, 20.0, f32::NAN).is_empty());
    }

    #[test]
    fn test_iso_levels_wide_interval() {
        // one level at min, which cannot produce a line on its own data
        assert_eq!(iso_levels(0.0, 20.0, 25.0), vec![0.0]);
    }

    #[test]
    fn test_march_squares_flat_field() {
        let window = RasterWindow::filled(3, 3, 5.0);
        assert!(march_squares(&window, 5.0).is_empty());
    }

    #[test]
    fn test_march_squares_peak() {
        let window = RasterWindow::new(
            3,
            3,
            vec![0.0, 0.0, 0.0, 0.0, 10.0, 0.0, 0.0, 0.0, 0.0],
        );
        let segments = march_squares(&window, 5.0);
        assert!(!segments.is_empty());

        let contours = connect_segments(segments);
        // the ring around the peak closes on itself
        assert_eq!(contours.len(), 1);
        assert!(contours[0].closed);
    }

    #[test]
    fn test_march_squares_skips_nodata_cells() {
        let window = RasterWindow::new(
            3,
            3,
            vec![0.0, 0.0, 0.0, 0.0, f32::NAN, 0.0, 0.0, 0.0, 0.0],
        );
        // every cell touches the NaN center corner
        assert!(march_squares(&window, 5.0).is_empty());
    }

    #[test]
    fn test_ramp_min_level_yields_no_lines() {
        // all samples >= min, so the min iso-value never crosses an edge
        let data: Vec<f32> = (0..16).map(|i| i as f32).collect();
        let window = RasterWindow::new(4, 4, data);
        assert!(march_squares(&window, 0.0).is_empty());
    }

    #[test]
    fn test_render_empty_is_fully_transparent() {
        let pixels = render_contours(&[], 16, 16, [0.0, 0.0, 0.0]).unwrap();
        assert!(pixels.chunks_exact(4).all(|px| px == [0, 0, 0, 0]));
    }

    #[test]
    fn test_render_strokes_pixels() {
        let contour = Contour {
            level: 0.0,
            points: vec![Point::new(2.0, 8.0), Point::new(14.0, 8.0)],
            closed: false,
        };
        let pixels = render_contours(&[contour], 16, 16, [1.0, 0.0, 0.0]).unwrap();

        let touched = pixels.chunks_exact(4).filter(|px| px[3] > 0).count();
        assert!(touched > 0);
        // stroked pixels carry the requested color
        assert!(pixels
            .chunks_exact(4)
            .filter(|px| px[3] == 255)
            .all(|px| px[0] == 255 && px[1] == 0 && px[2] == 0));
    }
}
