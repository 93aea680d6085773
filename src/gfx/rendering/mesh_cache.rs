//! Upload-once cache of per-model GPU meshes

use std::collections::HashMap;

use crate::gfx::scene::model::{MeshData, Model, ModelId};

/// Keeps one uploaded entry per sub-mesh of every model drawn so far
///
/// `T` is whatever the backend builds from a [`MeshData`]; the cache only
/// decides *when* to build it.
pub struct MeshCache<T> {
    entries: HashMap<ModelId, Vec<T>>,
    uploads: usize,
}

impl<T> Default for MeshCache<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            uploads: 0,
        }
    }
}

impl<T> MeshCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached meshes for `model`, building them on first use
    pub fn get_or_upload<F>(&mut self, model: &Model, mut upload: F) -> &[T]
    where
        F: FnMut(usize, &MeshData) -> T,
    {
        let uploads = &mut self.uploads;
        self.entries.entry(model.id()).or_insert_with(|| {
            *uploads += model.mesh_count();
            model
                .meshes()
                .iter()
                .enumerate()
                .map(|(i, mesh)| upload(i, mesh))
                .collect()
        })
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of models with cached meshes
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total sub-meshes built since creation
    pub fn upload_count(&self) -> usize {
        self.uploads
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle_model() -> Model {
        let vertices = vec![
            0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, //
            1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0,
        ];
        let mesh = MeshData::new(vertices, vec![0, 1, 2]).unwrap();
        Model::from_meshes(vec![mesh.clone(), mesh])
    }

    #[test]
    fn uploads_once_per_model() {
        let model = triangle_model();
        let mut cache = MeshCache::new();

        for _ in 0..3 {
            let meshes = cache.get_or_upload(&model, |_, mesh| mesh.index_count());
            assert_eq!(meshes, &[3, 3]);
        }
        assert_eq!(cache.upload_count(), 2);
        assert_eq!(cache.len(), 1);

        let other = triangle_model();
        assert_eq!(cache.get_or_upload(&other, |i, _| i), &[0, 1]);
        assert_eq!(cache.upload_count(), 4);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn clear_forces_reupload() {
        let model = triangle_model();
        let mut cache = MeshCache::new();
        cache.get_or_upload(&model, |_, _| ());
        cache.clear();
        assert!(cache.is_empty());
        cache.get_or_upload(&model, |_, _| ());
        assert_eq!(cache.upload_count(), 4);
    }
}
