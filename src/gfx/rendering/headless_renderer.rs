//! Renderer without a GPU
//!
//! Enforces the same lifecycle as [`RenderEngine`](super::RenderEngine) and
//! counts what it would have done. Used by the `headless` backend and tests.

use cgmath::{Matrix4, SquareMatrix};

use super::{
    mesh_cache::MeshCache,
    renderer::{FrameLifecycle, RenderError, Renderer, RendererBackend, RendererState},
};
use crate::{gfx::scene::model::Model, window::Window};

/// What an uploaded mesh would occupy on the GPU
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadlessMesh {
    pub vertex_count: usize,
    pub index_count: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub frames: u64,
    pub models_drawn: u64,
    pub meshes_drawn: u64,
    pub indices_drawn: u64,
}

pub struct HeadlessRenderer {
    lifecycle: FrameLifecycle,
    meshes: MeshCache<HeadlessMesh>,
    view_projection: Matrix4<f32>,
    size: (u32, u32),
    stats: FrameStats,
    last_frame: FrameStats,
    current: FrameStats,
}

impl Default for HeadlessRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self {
            lifecycle: FrameLifecycle::default(),
            meshes: MeshCache::new(),
            view_projection: Matrix4::identity(),
            size: (0, 0),
            stats: FrameStats::default(),
            last_frame: FrameStats::default(),
            current: FrameStats::default(),
        }
    }

    /// Totals since initialization
    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Counts of the most recently completed frame
    pub fn last_frame(&self) -> FrameStats {
        self.last_frame
    }

    /// Sub-meshes "uploaded" so far; each model's meshes are uploaded once
    pub fn upload_count(&self) -> usize {
        self.meshes.upload_count()
    }

    pub fn view_projection(&self) -> Matrix4<f32> {
        self.view_projection
    }
}

impl Renderer for HeadlessRenderer {
    fn backend(&self) -> RendererBackend {
        RendererBackend::Headless
    }

    fn state(&self) -> RendererState {
        self.lifecycle.state()
    }

    fn initialize(&mut self, window: &Window) -> Result<(), RenderError> {
        self.lifecycle.initialized()?;
        self.size = (window.width(), window.height());
        log::info!(
            "Headless renderer initialized for '{}' at {}x{}",
            window.title(),
            window.width(),
            window.height()
        );
        Ok(())
    }

    fn begin_frame(&mut self) -> Result<(), RenderError> {
        self.lifecycle.begin()?;
        self.current = FrameStats {
            frames: 1,
            ..Default::default()
        };
        Ok(())
    }

    fn set_view_projection(&mut self, view_projection: Matrix4<f32>) {
        self.view_projection = view_projection;
    }

    fn draw_model(&mut self, model: &Model, _world: Matrix4<f32>) -> Result<(), RenderError> {
        self.lifecycle.require(RendererState::Drawing, "draw a model")?;

        if !model.is_loaded() || model.mesh_count() == 0 {
            log::warn!("Model {:?} has no meshes to draw", model.id());
            return Ok(());
        }

        let meshes = self.meshes.get_or_upload(model, |_, mesh| HeadlessMesh {
            vertex_count: mesh.vertex_count(),
            index_count: mesh.index_count(),
        });

        self.current.models_drawn += 1;
        for mesh in meshes {
            self.current.meshes_drawn += 1;
            self.current.indices_drawn += mesh.index_count as u64;
        }
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), RenderError> {
        self.lifecycle.end()?;
        self.last_frame = self.current;
        self.stats.frames += self.current.frames;
        self.stats.models_drawn += self.current.models_drawn;
        self.stats.meshes_drawn += self.current.meshes_drawn;
        self.stats.indices_drawn += self.current.indices_drawn;
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.size = (width, height);
        }
    }

    fn surface_size(&self) -> (u32, u32) {
        self.size
    }

    fn destroy(&mut self) {
        self.meshes.clear();
        self.lifecycle.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::scene::model::MeshData;

    fn quad_model() -> Model {
        let mut vertices = Vec::new();
        for (x, y) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)] {
            vertices.extend_from_slice(&[x, y, 0.0, 0.0, 0.0, 1.0, x, y]);
        }
        let mesh = MeshData::new(vertices, vec![0, 1, 2, 0, 2, 3]).unwrap();
        Model::from_meshes(vec![mesh])
    }

    fn initialized() -> HeadlessRenderer {
        let mut renderer = HeadlessRenderer::new();
        renderer
            .initialize(&Window::new("Headless", 320, 240))
            .unwrap();
        renderer
    }

    #[test]
    fn counts_draws_per_frame() {
        let mut renderer = initialized();
        let model = quad_model();

        renderer.begin_frame().unwrap();
        renderer.draw_model(&model, Matrix4::identity()).unwrap();
        renderer.draw_model(&model, Matrix4::identity()).unwrap();
        renderer.end_frame().unwrap();

        assert_eq!(renderer.last_frame().models_drawn, 2);
        assert_eq!(renderer.last_frame().indices_drawn, 12);
        assert_eq!(renderer.stats().frames, 1);
        assert_eq!(renderer.surface_size(), (320, 240));
    }

    #[test]
    fn uploads_once_across_frames() {
        let mut renderer = initialized();
        let model = quad_model();

        for _ in 0..5 {
            renderer.begin_frame().unwrap();
            renderer.draw_model(&model, Matrix4::identity()).unwrap();
            renderer.end_frame().unwrap();
        }
        assert_eq!(renderer.upload_count(), 1);
        assert_eq!(renderer.stats().frames, 5);
        assert_eq!(renderer.stats().meshes_drawn, 5);
    }

    #[test]
    fn empty_model_draws_nothing() {
        let mut renderer = initialized();
        renderer.begin_frame().unwrap();
        renderer.draw_model(&Model::new(), Matrix4::identity()).unwrap();
        renderer.end_frame().unwrap();
        assert_eq!(renderer.last_frame().models_drawn, 0);
        assert_eq!(renderer.upload_count(), 0);
    }

    #[test]
    fn rejects_out_of_order_calls() {
        let mut renderer = HeadlessRenderer::new();
        assert!(renderer.begin_frame().is_err());

        let mut renderer = initialized();
        assert!(renderer
            .draw_model(&quad_model(), Matrix4::identity())
            .is_err());
        assert!(renderer.end_frame().is_err());
        assert!(renderer
            .initialize(&Window::new("Again", 1, 1))
            .is_err());

        renderer.begin_frame().unwrap();
        assert!(renderer.begin_frame().is_err());
        assert_eq!(renderer.state(), RendererState::Drawing);
    }
}
