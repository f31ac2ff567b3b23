//! Error types for tile rendering.

use thiserror::Error;

/// Result type alias using TileError.
pub type TileResult<T> = Result<T, TileError>;

/// Primary error type for tile render operations.
///
/// Every failure is single-attempt; nothing in the core retries.
#[derive(Debug, Error)]
pub enum TileError {
    /// The requested tile index lies outside the dataset footprint.
    #[error("tile {z}/{x}/{y} is outside dataset bounds")]
    TileOutOfBounds { x: u32, y: u32, z: u32 },

    #[error("invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    /// The external raster provider failed; propagated as-is, never retried.
    #[error("failed to fetch raster data: {0}")]
    FetchFailure(String),

    #[error("rendering failed: {0}")]
    ComputeFailure(String),
}

impl TileError {
    pub fn invalid_parameter(param: impl Into<String>, message: impl Into<String>) -> Self {
        TileError::InvalidParameter {
            param: param.into(),
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            TileError::TileOutOfBounds { .. } => 404,
            TileError::InvalidParameter { .. } => 400,
            TileError::FetchFailure(_) => 502,
            TileError::ComputeFailure(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let oob = TileError::TileOutOfBounds { x: 1, y: 2, z: 3 };
        assert_eq!(oob.http_status_code(), 404);
        assert_eq!(
            TileError::invalid_parameter("blend_mode", "unknown").http_status_code(),
            400
        );
        assert_eq!(TileError::FetchFailure("boom".into()).http_status_code(), 502);
        assert_eq!(
            TileError::ComputeFailure("boom".into()).http_status_code(),
            500
        );
    }

    #[test]
    fn test_out_of_bounds_message_names_tile() {
        let err = TileError::TileOutOfBounds { x: 4, y: 2, z: 3 };
        assert_eq!(err.to_string(), "tile 3/4/2 is outside dataset bounds");
    }
}
