//! Visualization algorithms for single-band terrain rasters.
//!
//! Four independent renderers, all consuming a [`tiles_common::RasterWindow`]
//! and producing RGB(A) output for the shared finalizer:
//! - directional hillshade
//! - discrete classification
//! - contour extraction (marching squares)
//! - relief/openness mapping

pub mod colormap;
pub mod contour;
pub mod discrete;
pub mod hillshade;
pub mod image;
pub mod png;
pub mod rrim;
