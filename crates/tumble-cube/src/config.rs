use std::path::PathBuf;

use crate::render_loop::LoopConfig;

/// Environment variable overriding [`CubeConfig::texture_path`].
pub const TEXTURE_ENV: &str = "TUMBLE_TEXTURE";

/// Viewer configuration.
#[derive(Debug, Clone)]
pub struct CubeConfig {
    pub title: String,
    /// Initial window size in logical pixels.
    pub window_size: (f64, f64),
    /// 3×2 atlas image: front, back, top / bottom, left, right.
    pub texture_path: PathBuf,
    pub scene: LoopConfig,
    pub clear_color: wgpu::Color,
}

impl Default for CubeConfig {
    fn default() -> Self {
        Self {
            title: "tumble".to_string(),
            window_size: (800.0, 600.0),
            texture_path: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/assets/cube-atlas.png")),
            scene: LoopConfig::default(),
            clear_color: wgpu::Color::TRANSPARENT,
        }
    }
}

impl CubeConfig {
    /// Defaults plus `TUMBLE_TEXTURE` when set and non-empty.
    pub fn from_env() -> Self {
        Self::default().with_texture_override(std::env::var_os(TEXTURE_ENV).map(PathBuf::from))
    }

    fn with_texture_override(mut self, path: Option<PathBuf>) -> Self {
        if let Some(path) = path.filter(|p| !p.as_os_str().is_empty()) {
            log::info!("texture path overridden by {TEXTURE_ENV}: {}", path.display());
            self.texture_path = path;
        }
        self
    }
}
