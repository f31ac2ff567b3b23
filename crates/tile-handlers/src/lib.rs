//! Per-algorithm render entry points.
//!
//! Each handler accepts dataset keys, an optional tile coordinate (None =
//! whole-dataset preview) and algorithm options, and returns PNG bytes. The
//! HTTP routing/validation layer in front of these functions is an external
//! collaborator.

pub mod config;
pub mod contour;
pub mod discrete;
pub mod hillshade;
pub mod rrim;
pub mod xyz;

pub use config::RenderSettings;
pub use contour::{contour, ContourOptions};
pub use discrete::{discrete, DiscreteOptions};
pub use hillshade::{hillshade, HillshadeOptions};
pub use rrim::{rrim, RrimOptions};
