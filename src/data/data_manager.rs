use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

use super::{
    manager::Manager,
    model_manager::ModelManager,
    renderer_manager::RendererManager,
    window_manager::{WindowDescriptor, WindowManager},
};
use crate::{config::EngineConfig, gfx::rendering::RenderSettings};

#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to read data file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected a JSON array of objects, found {0}")]
    NotAnArray(&'static str),
}

/// Reads the JSON object list and hands each record to the manager for its class
pub struct DataManager {
    path: PathBuf,
    window_manager: WindowManager,
    renderer_manager: RendererManager,
    model_manager: ModelManager,
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl DataManager {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            window_manager: WindowManager::new(),
            renderer_manager: RendererManager::default(),
            model_manager: ModelManager::new(),
        }
    }

    /// Data manager whose default window and renderer settings come from `config`
    pub fn from_config(config: &EngineConfig) -> Self {
        let defaults = RenderSettings {
            vsync: config.vsync,
            clear_color: config.clear_color,
            ..Default::default()
        };
        Self {
            path: config.data_file.clone(),
            window_manager: WindowManager::with_default_window(WindowDescriptor {
                title: config.window_title.clone(),
                width: config.window_width,
                height: config.window_height,
            }),
            renderer_manager: RendererManager::new(defaults),
            model_manager: ModelManager::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the data file; returns how many records were routed
    pub fn load_data(&mut self) -> Result<usize, DataError> {
        log::info!("Loading data from {}", self.path.display());
        let text = std::fs::read_to_string(&self.path).map_err(|source| DataError::Io {
            path: self.path.clone(),
            source,
        })?;

        let base_dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf);
        self.renderer_manager.set_base_dir(base_dir.clone());
        self.model_manager.set_base_dir(base_dir);

        self.load_from_str(&text)
    }

    pub fn load_from_str(&mut self, text: &str) -> Result<usize, DataError> {
        let document: Value = serde_json::from_str(text)?;
        let Value::Array(records) = document else {
            return Err(DataError::NotAnArray(json_kind(&document)));
        };

        log::info!("Found {} object(s) in JSON array", records.len());
        let mut routed = 0;
        for record in records {
            if self.route(record) {
                routed += 1;
            }
        }
        Ok(routed)
    }

    fn route(&mut self, record: Value) -> bool {
        let class = match record.get("class") {
            Some(Value::String(class)) => class.clone(),
            Some(other) => {
                log::warn!(
                    "JSON object has non-string 'class' ({}); skipping",
                    json_kind(other)
                );
                return false;
            }
            None => {
                log::warn!("JSON object missing 'class' field; skipping");
                return false;
            }
        };

        log::debug!("Routing object of class '{}'", class);
        match class.as_str() {
            "window" | "Window" => self.window_manager.add_json_object(record),
            "renderer" | "Renderer" => self.renderer_manager.add_json_object(record),
            "model" | "Model" => self.model_manager.add_json_object(record),
            _ => {
                log::warn!("Unknown class '{}', no manager handles it; skipping", class);
                return false;
            }
        }
        true
    }

    /// Runs `create_objects` on every manager
    pub fn create_managed_objects(&mut self) {
        log::info!("Creating managed objects");
        self.window_manager.create_objects();
        self.renderer_manager.create_objects();
        self.model_manager.create_objects();
    }

    pub fn window_manager(&self) -> &WindowManager {
        &self.window_manager
    }

    pub fn renderer_manager(&self) -> &RendererManager {
        &self.renderer_manager
    }

    pub fn model_manager(&self) -> &ModelManager {
        &self.model_manager
    }

    pub fn into_managers(self) -> (WindowManager, RendererManager, ModelManager) {
        (self.window_manager, self.renderer_manager, self.model_manager)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        data::RendererDescriptor,
        gfx::rendering::{RendererBackend, ShaderSource},
    };

    const SAMPLE: &str = r#"[
        { "class": "window", "title": "Test Window 1", "width": 400, "height": 300 },
        { "class": "Window", "title": "Test Window 2", "width": 800, "height": 600 },
        { "class": "renderer", "backend": "headless" },
        { "class": "model", "path": "missing.obj" },
        { "class": "unknown", "something": "ignored" },
        { "title": "no class" },
        { "class": 7 }
    ]"#;

    #[test]
    fn routes_records_by_class() {
        let mut manager = DataManager::new("unused.json");
        let routed = manager.load_from_str(SAMPLE).unwrap();
        assert_eq!(routed, 4);
        assert_eq!(manager.window_manager().json_objects().len(), 2);
        assert_eq!(manager.renderer_manager().json_objects().len(), 1);
        assert_eq!(manager.model_manager().json_objects().len(), 1);
    }

    #[test]
    fn creates_managed_objects() {
        let mut manager = DataManager::new("unused.json");
        manager.load_from_str(SAMPLE).unwrap();
        manager.create_managed_objects();

        assert_eq!(manager.window_manager().windows().len(), 2);
        assert_eq!(manager.renderer_manager().renderers().len(), 1);
        assert!(manager.model_manager().objects().is_empty());
    }

    #[test]
    fn rejects_non_array() {
        let mut manager = DataManager::new("unused.json");
        assert!(matches!(
            manager.load_from_str(r#"{"class": "window"}"#),
            Err(DataError::NotAnArray("an object"))
        ));
        assert!(matches!(
            manager.load_from_str("[1, 2"),
            Err(DataError::Json(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let mut manager = DataManager::new("definitely/not/here.json");
        assert!(matches!(manager.load_data(), Err(DataError::Io { .. })));
    }

    #[test]
    fn loads_from_file() {
        let dir = std::env::temp_dir().join(format!("snap-engine-data-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("test_data.json");
        std::fs::write(&path, SAMPLE).unwrap();

        let mut manager = DataManager::new(&path);
        assert_eq!(manager.load_data().unwrap(), 4);
    }

    fn scene_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "snap-engine-scene-{}-{}",
            name,
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn paths_resolve_next_to_data_file() {
        let dir = scene_dir("paths");
        std::fs::write(dir.join("tri.obj"), "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();
        std::fs::write(dir.join("custom.wgsl"), "// custom").unwrap();
        let path = dir.join("scene.json");
        std::fs::write(
            &path,
            r#"[
                { "class": "renderer", "backend": "headless", "shader": "custom.wgsl" },
                { "class": "model", "path": "tri.obj" }
            ]"#,
        )
        .unwrap();

        let mut manager = DataManager::new(&path);
        assert_eq!(manager.load_data().unwrap(), 2);
        manager.create_managed_objects();
        assert_eq!(manager.model_manager().objects().len(), 1);

        let renderers = manager.renderer_manager();
        let descriptor: RendererDescriptor =
            serde_json::from_value(renderers.json_objects()[0].clone()).unwrap();
        let settings = renderers.settings_for(&descriptor);
        assert_eq!(settings.shader, ShaderSource::File(dir.join("custom.wgsl")));
        assert_eq!(settings.shader.load().unwrap(), "// custom");
    }

    #[test]
    fn creating_twice_rebuilds_the_same_objects() {
        let dir = scene_dir("twice");
        std::fs::write(dir.join("tri.obj"), "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();
        let path = dir.join("scene.json");
        std::fs::write(
            &path,
            r#"[
                { "class": "window", "title": "Main", "width": 640, "height": 480 },
                { "class": "renderer", "backend": "headless", "window": "Main" },
                { "class": "model", "path": "tri.obj" }
            ]"#,
        )
        .unwrap();

        let mut manager = DataManager::new(&path);
        manager.load_data().unwrap();

        let snapshot = |manager: &DataManager| {
            let titles: Vec<String> = manager
                .window_manager()
                .windows()
                .iter()
                .map(|w| w.title().to_string())
                .collect();
            let backends: Vec<_> = manager
                .renderer_manager()
                .renderers()
                .iter()
                .map(|r| r.renderer.backend())
                .collect();
            (titles, backends, manager.model_manager().objects().len())
        };

        manager.create_managed_objects();
        let first = snapshot(&manager);
        manager.create_managed_objects();
        let second = snapshot(&manager);

        assert_eq!(first, (vec!["Main".to_string()], vec![RendererBackend::Headless], 1));
        assert_eq!(first, second);
        assert_eq!(manager.model_manager().loaded_model_count(), 1);
    }

    #[test]
    fn config_sets_default_window() {
        let config = EngineConfig {
            window_title: "Configured".to_string(),
            ..Default::default()
        };
        let mut manager = DataManager::from_config(&config);
        manager.load_from_str("[]").unwrap();
        manager.create_managed_objects();
        assert_eq!(manager.window_manager().windows()[0].title(), "Configured");
    }
}
