use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use cgmath::Vector3;
use serde::Deserialize;
use serde_json::Value;

use super::manager::{parse_record, resolve_path, Manager};
use crate::gfx::scene::{Model, Scene, SceneObject};

fn unit_scale() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

/// `{"class": "model", "path": "assets/cube.obj", "position": [0, 0, 0], ...}`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModelDescriptor {
    pub path: PathBuf,
    #[serde(default)]
    pub position: [f32; 3],
    #[serde(default = "unit_scale")]
    pub scale: [f32; 3],
    /// Degrees around x, y, z
    #[serde(default)]
    pub rotation: [f32; 3],
}

/// Loads model files and places them as scene objects
///
/// Each distinct path is loaded once and shared between objects.
#[derive(Default)]
pub struct ModelManager {
    json_objects: Vec<Value>,
    base_dir: Option<PathBuf>,
    models: HashMap<PathBuf, Arc<Model>>,
    objects: Vec<SceneObject>,
}

impl ModelManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Relative model paths are resolved against `dir`
    pub fn set_base_dir(&mut self, dir: Option<PathBuf>) {
        self.base_dir = dir;
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn loaded_model_count(&self) -> usize {
        self.models.len()
    }

    /// Moves every created object into `scene`
    pub fn populate_scene(&mut self, scene: &mut Scene) -> usize {
        let count = self.objects.len();
        for object in self.objects.drain(..) {
            scene.add_object(object);
        }
        count
    }

    fn model_for(&mut self, path: &Path) -> Option<Arc<Model>> {
        let resolved = resolve_path(self.base_dir.as_deref(), path);
        if let Some(model) = self.models.get(&resolved) {
            return Some(model.clone());
        }

        match Model::load_from_file(&resolved) {
            Ok(model) => {
                let model = Arc::new(model);
                self.models.insert(resolved, model.clone());
                Some(model)
            }
            Err(e) => {
                log::error!("{}", e);
                None
            }
        }
    }
}

impl Manager for ModelManager {
    fn add_json_object(&mut self, object: Value) {
        self.json_objects.push(object);
    }

    fn json_objects(&self) -> &[Value] {
        &self.json_objects
    }

    fn create_objects(&mut self) {
        self.objects.clear();

        let descriptors: Vec<ModelDescriptor> = self
            .json_objects
            .iter()
            .filter_map(|object| parse_record("model", object.clone()))
            .collect();
        for descriptor in descriptors {
            let Some(model) = self.model_for(&descriptor.path) else {
                continue;
            };
            self.objects.push(SceneObject {
                model,
                position: Vector3::from(descriptor.position),
                scale: Vector3::from(descriptor.scale),
                rotation: Vector3::from(descriptor.rotation),
            });
        }

        log::info!(
            "ModelManager created {} object(s) from {} model(s)",
            self.objects.len(),
            self.models.len()
        );
    }
}
