//! Engine-wide settings assembled from the command line

use std::path::PathBuf;

pub const DEFAULT_DATA_FILE: &str = "snapengine_data.json";
pub const DEFAULT_WINDOW_TITLE: &str = "SnapEngine";
pub const DEFAULT_WINDOW_WIDTH: u32 = 1280;
pub const DEFAULT_WINDOW_HEIGHT: u32 = 720;

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// JSON object list to load
    pub data_file: PathBuf,
    /// Window opened when the data file declares none
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    /// Default for renderers that don't set `vsync` themselves
    pub vsync: bool,
    pub clear_color: [f32; 4],
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            window_title: DEFAULT_WINDOW_TITLE.to_string(),
            window_width: DEFAULT_WINDOW_WIDTH,
            window_height: DEFAULT_WINDOW_HEIGHT,
            vsync: true,
            clear_color: [0.2, 0.3, 0.3, 1.0],
        }
    }
}

impl EngineConfig {
    pub fn with_data_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_file = path.into();
        self
    }

    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }
}
