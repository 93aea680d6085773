use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

use super::manager::{parse_record, resolve_path, Manager};
use crate::gfx::rendering::{
    HeadlessRenderer, RenderEngine, RenderSettings, Renderer, RendererBackend, ShaderSource,
};

/// `{"class": "renderer", "backend": "vulkan", "window": "Main", ...}`
///
/// Every field is optional; missing ones fall back to the manager defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RendererDescriptor {
    pub backend: Option<String>,
    /// Title of the window to render into; the first window when absent
    pub window: Option<String>,
    pub shader: Option<PathBuf>,
    pub texture: Option<PathBuf>,
    pub clear_color: Option<[f32; 4]>,
    pub vsync: Option<bool>,
}

impl RendererDescriptor {
    pub fn backend(&self) -> RendererBackend {
        match self.backend.as_deref().map(str::parse::<RendererBackend>) {
            None => RendererBackend::Auto,
            Some(Ok(backend)) => backend,
            Some(Err(e)) => {
                log::warn!("{}, falling back to auto", e);
                RendererBackend::Auto
            }
        }
    }

    /// Relative `shader` and `texture` paths are joined onto `base_dir`
    pub fn settings(&self, defaults: &RenderSettings, base_dir: Option<&Path>) -> RenderSettings {
        RenderSettings {
            shader: self
                .shader
                .as_ref()
                .map(|path| ShaderSource::from_path(resolve_path(base_dir, path)))
                .unwrap_or_else(|| defaults.shader.clone()),
            texture: self
                .texture
                .as_ref()
                .map(|path| resolve_path(base_dir, path))
                .or_else(|| defaults.texture.clone()),
            clear_color: self.clear_color.unwrap_or(defaults.clear_color),
            vsync: self.vsync.unwrap_or(defaults.vsync),
            light: defaults.light,
        }
    }
}

/// A created (not yet initialized) renderer and the window it targets
pub struct ManagedRenderer {
    pub renderer: Box<dyn Renderer>,
    pub target_window: Option<String>,
}

pub fn create_renderer(backend: RendererBackend, settings: RenderSettings) -> Box<dyn Renderer> {
    match backend {
        RendererBackend::Headless => Box::new(HeadlessRenderer::new()),
        _ => Box::new(RenderEngine::new(backend, settings)),
    }
}

pub struct RendererManager {
    json_objects: Vec<Value>,
    renderers: Vec<ManagedRenderer>,
    defaults: RenderSettings,
    base_dir: Option<PathBuf>,
}

impl Default for RendererManager {
    fn default() -> Self {
        Self::new(RenderSettings::default())
    }
}

impl RendererManager {
    pub fn new(defaults: RenderSettings) -> Self {
        Self {
            json_objects: Vec::new(),
            renderers: Vec::new(),
            defaults,
            base_dir: None,
        }
    }

    /// Relative shader and texture paths are resolved against `dir`
    pub fn set_base_dir(&mut self, dir: Option<PathBuf>) {
        self.base_dir = dir;
    }

    pub fn renderers(&self) -> &[ManagedRenderer] {
        &self.renderers
    }

    /// Hands the created renderers to the caller
    pub fn take_renderers(&mut self) -> Vec<ManagedRenderer> {
        std::mem::take(&mut self.renderers)
    }

    /// Settings a renderer built from `descriptor` would receive
    pub fn settings_for(&self, descriptor: &RendererDescriptor) -> RenderSettings {
        descriptor.settings(&self.defaults, self.base_dir.as_deref())
    }

    fn push(&mut self, descriptor: &RendererDescriptor) {
        let backend = descriptor.backend();
        let settings = self.settings_for(descriptor);
        log::debug!(
            "Renderer backend={} window={:?} vsync={}",
            backend.name(),
            descriptor.window,
            settings.vsync
        );
        self.renderers.push(ManagedRenderer {
            renderer: create_renderer(backend, settings),
            target_window: descriptor.window.clone(),
        });
    }
}

impl Manager for RendererManager {
    fn add_json_object(&mut self, object: Value) {
        self.json_objects.push(object);
    }

    fn json_objects(&self) -> &[Value] {
        &self.json_objects
    }

    fn create_objects(&mut self) {
        self.renderers.clear();

        let descriptors: Vec<RendererDescriptor> = self
            .json_objects
            .iter()
            .filter_map(|object| parse_record("renderer", object.clone()))
            .collect();
        for descriptor in &descriptors {
            self.push(descriptor);
        }

        if self.renderers.is_empty() {
            log::info!("No renderers declared, creating default (auto)");
            self.push(&RendererDescriptor::default());
        }

        log::info!("RendererManager created {} renderer(s)", self.renderers.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::rendering::RendererState;
    use serde_json::json;

    #[test]
    fn creates_default_renderer() {
        let mut manager = RendererManager::default();
        manager.create_objects();
        assert_eq!(manager.renderers().len(), 1);
        let managed = &manager.renderers()[0];
        assert_eq!(managed.renderer.backend(), RendererBackend::Auto);
        assert_eq!(managed.renderer.state(), RendererState::Uninitialized);
        assert!(managed.target_window.is_none());
    }

    #[test]
    fn creates_renderer_per_descriptor() {
        let mut manager = RendererManager::default();
        manager.add_json_object(json!({"class": "renderer", "backend": "headless", "window": "Main"}));
        manager.add_json_object(json!({"class": "renderer", "backend": "d3d11"}));
        manager.add_json_object(json!({"class": "renderer", "backend": "bogus"}));
        manager.create_objects();

        let backends: Vec<_> = manager
            .renderers()
            .iter()
            .map(|r| r.renderer.backend())
            .collect();
        assert_eq!(
            backends,
            vec![
                RendererBackend::Headless,
                RendererBackend::Dx12,
                RendererBackend::Auto
            ]
        );
        assert_eq!(manager.renderers()[0].target_window.as_deref(), Some("Main"));
    }

    #[test]
    fn descriptor_overrides_defaults() {
        let descriptor: RendererDescriptor = serde_json::from_value(json!({
            "class": "renderer",
            "shader": "shaders/custom.wgsl",
            "clear_color": [0.0, 0.0, 0.0, 1.0],
            "vsync": false
        }))
        .unwrap();

        let settings = descriptor.settings(&RenderSettings::default(), None);
        assert_eq!(settings.clear_color, [0.0, 0.0, 0.0, 1.0]);
        assert!(!settings.vsync);
        assert_eq!(
            settings.shader,
            ShaderSource::File(PathBuf::from("shaders/custom.wgsl"))
        );
        assert!(settings.texture.is_none());
    }

    #[test]
    fn relative_paths_join_base_dir() {
        let descriptor: RendererDescriptor = serde_json::from_value(json!({
            "class": "renderer",
            "shader": "custom.wgsl",
            "texture": "textures/wood.png"
        }))
        .unwrap();

        let base = Path::new("scenes");
        let settings = descriptor.settings(&RenderSettings::default(), Some(base));
        assert_eq!(
            settings.shader,
            ShaderSource::File(PathBuf::from("scenes/custom.wgsl"))
        );
        assert_eq!(settings.texture, Some(PathBuf::from("scenes/textures/wood.png")));

        // Defaults are not rebased
        let settings = RendererDescriptor::default().settings(&RenderSettings::default(), Some(base));
        assert_eq!(settings.shader, ShaderSource::Builtin);
        assert!(settings.texture.is_none());
    }

    #[test]
    fn rebuilding_keeps_declared_renderers() {
        let mut manager = RendererManager::default();
        manager.add_json_object(json!({"class": "renderer", "backend": "headless", "window": "Main"}));
        manager.create_objects();
        manager.create_objects();

        assert_eq!(manager.renderers().len(), 1);
        assert_eq!(manager.renderers()[0].renderer.backend(), RendererBackend::Headless);
        assert_eq!(manager.renderers()[0].target_window.as_deref(), Some("Main"));
    }

    #[test]
    fn malformed_descriptor_is_skipped() {
        let mut manager = RendererManager::default();
        manager.add_json_object(json!({"class": "renderer", "vsync": "yes"}));
        manager.create_objects();
        // Only the default remains
        assert_eq!(manager.renderers().len(), 1);
        assert_eq!(manager.renderers()[0].renderer.backend(), RendererBackend::Auto);
    }
}
