//! Tile-to-window resolution and the shared buffered fetch discipline.

use datasource::{DatasetMetadata, RasterStore};
use renderer::image;
use tiles_common::tile::{buffered_bounds, ground_resolution, mercator_tile_bounds, tile_exists};
use tiles_common::{RasterWindow, TileCoord, TileError, TileResult, MAX_ZOOM};
use tracing::debug;

/// Fetch dataset metadata under a scoped connection.
pub fn get_metadata(store: &dyn RasterStore, keys: &[String]) -> TileResult<DatasetMetadata> {
    let mut conn = store.connect()?;
    Ok(conn.get_metadata(keys)?)
}

/// Ground sampling distance for an optional tile coordinate.
///
/// Preview renders (no tile) use 1.0.
pub fn resolution_for(tile_xyz: Option<&TileCoord>) -> TileResult<f64> {
    match tile_xyz {
        Some(tile) => ground_resolution(tile.z).ok_or_else(|| {
            TileError::invalid_parameter(
                "tile_z",
                format!("zoom {} exceeds maximum {}", tile.z, MAX_ZOOM),
            )
        }),
        None => Ok(1.0),
    }
}

/// Retrieve the raster window for a tile (or the whole dataset).
///
/// For a tile request the dataset bounds are checked first; a tile outside
/// them is a [`TileError::TileOutOfBounds`]. With `buffer > 0` the window is
/// fetched over the buffered bounds at `(w + 2b, h + 2b)` pixels. The
/// buffered bounds themselves are never bounds-checked; area beyond the
/// dataset footprint arrives as nodata.
///
/// The store connection is scoped to this call and released on every exit
/// path.
pub fn get_tile_data(
    store: &dyn RasterStore,
    keys: &[String],
    tile_xyz: Option<TileCoord>,
    tile_size: (usize, usize),
    preserve_values: bool,
    buffer: u32,
) -> TileResult<RasterWindow> {
    let mut conn = store.connect()?;

    let Some(tile) = tile_xyz else {
        // no tile: read the whole dataset at the requested size
        return Ok(conn.get_raster_tile(keys, None, tile_size, preserve_values)?);
    };

    if tile.z > MAX_ZOOM {
        return Err(TileError::invalid_parameter(
            "tile_z",
            format!("zoom {} exceeds maximum {}", tile.z, MAX_ZOOM),
        ));
    }

    let metadata = conn.get_metadata(keys)?;
    if !tile_exists(&metadata.bounds, &tile) {
        return Err(TileError::TileOutOfBounds {
            x: tile.x,
            y: tile.y,
            z: tile.z,
        });
    }

    let target = mercator_tile_bounds(&tile);
    debug!(
        z = tile.z,
        x = tile.x,
        y = tile.y,
        buffer,
        preserve_values,
        "fetching tile window"
    );

    let window = if buffer > 0 {
        let bounds = buffered_bounds(&target, tile.z, buffer);
        let size = (
            tile_size.0 + 2 * buffer as usize,
            tile_size.1 + 2 * buffer as usize,
        );
        conn.get_raster_tile(keys, Some(bounds), size, preserve_values)?
    } else {
        conn.get_raster_tile(keys, Some(target), tile_size, preserve_values)?
    };

    Ok(window)
}

/// Run a windowed computation with the shared buffered/unbuffered
/// crop-and-mask discipline.
///
/// The compute function sees the (possibly buffered) window and returns one
/// RGB triple per window pixel. The result is center-cropped back to the
/// tile footprint, and the invalid mask always comes from the unbuffered
/// window, fetched separately when a buffer was used.
pub fn windowed_compute<F>(
    store: &dyn RasterStore,
    keys: &[String],
    tile_xyz: Option<TileCoord>,
    tile_size: (usize, usize),
    preserve_values: bool,
    buffer: u32,
    compute: F,
) -> TileResult<(Vec<[u8; 3]>, Vec<bool>)>
where
    F: FnOnce(&RasterWindow) -> TileResult<Vec<[u8; 3]>>,
{
    let window = get_tile_data(store, keys, tile_xyz, tile_size, preserve_values, buffer)?;
    let rgb = compute(&window)?;
    if rgb.len() != window.len() {
        return Err(TileError::ComputeFailure(format!(
            "windowed compute returned {} pixels for a {} pixel window",
            rgb.len(),
            window.len()
        )));
    }

    if buffer == 0 {
        let mask = window.invalid_mask();
        return Ok((rgb, mask));
    }

    let cropped = image::crop_center(&rgb, window.width(), window.height(), tile_size.0, tile_size.1);
    let plain = get_tile_data(store, keys, tile_xyz, tile_size, preserve_values, 0)?;
    Ok((cropped, plain.invalid_mask()))
}
