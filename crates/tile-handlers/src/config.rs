//! Render settings.

use once_cell::sync::Lazy;

/// Process-wide render settings, read once from the environment.
#[derive(Debug, Clone)]
pub struct RenderSettings {
    /// Pixel dimensions used when a request does not specify a tile size.
    pub default_tile_size: (usize, usize),
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            default_tile_size: (256, 256),
        }
    }
}

impl RenderSettings {
    /// Build settings from environment variables (`TILE_DEFAULT_SIZE`),
    /// falling back to the defaults.
    pub fn from_env() -> Self {
        let default_tile_size = std::env::var("TILE_DEFAULT_SIZE")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .filter(|&size| size > 0)
            .map(|size| (size, size))
            .unwrap_or((256, 256));

        Self { default_tile_size }
    }
}

static SETTINGS: Lazy<RenderSettings> = Lazy::new(RenderSettings::from_env);

/// The process-wide settings instance.
pub fn settings() -> &'static RenderSettings {
    &SETTINGS
}
