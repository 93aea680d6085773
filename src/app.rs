use std::time::Instant;

use anyhow::{anyhow, Context};
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::WindowId,
};

use crate::{
    config::EngineConfig,
    data::{DataManager, ManagedRenderer, WindowManager},
    gfx::{
        rendering::{RenderError, Renderer},
        scene::Scene,
    },
};

/// A renderer attached to one managed window
struct BoundRenderer {
    window: usize,
    renderer: Box<dyn Renderer>,
}

pub struct EngineApp {
    windows: WindowManager,
    pending: Vec<ManagedRenderer>,
    renderers: Vec<BoundRenderer>,
    scene: Scene,
    last_update: Instant,
    started: bool,
    error: Option<anyhow::Error>,
}

impl EngineApp {
    pub fn new(windows: WindowManager, renderers: Vec<ManagedRenderer>, scene: Scene) -> Self {
        Self {
            windows,
            pending: renderers,
            renderers: Vec::new(),
            scene,
            last_update: Instant::now(),
            started: false,
            error: None,
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// The fatal error that stopped the loop, if any
    pub fn into_result(self) -> anyhow::Result<()> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{:#}", error);
        self.error.get_or_insert(error);
        event_loop.exit();
    }

    fn bind_renderers(&mut self) -> anyhow::Result<()> {
        for mut managed in std::mem::take(&mut self.pending) {
            let index = self
                .windows
                .target_window(managed.target_window.as_deref())
                .ok_or_else(|| anyhow!("no window to attach the renderer to"))?;
            let window = &self.windows.windows()[index];

            managed.renderer.initialize(window).with_context(|| {
                format!(
                    "failed to initialize {} renderer for window '{}'",
                    managed.renderer.backend().name(),
                    window.title()
                )
            })?;
            log::info!(
                "Bound {} renderer to window '{}'",
                managed.renderer.backend().name(),
                window.title()
            );

            self.renderers.push(BoundRenderer {
                window: index,
                renderer: managed.renderer,
            });
        }
        Ok(())
    }

    fn render_window(&mut self, window: usize) -> Result<(), RenderError> {
        for bound in self.renderers.iter_mut().filter(|b| b.window == window) {
            match render_frame(&self.scene, bound.renderer.as_mut()) {
                Ok(()) => {}
                Err(RenderError::FrameSkipped(reason)) => log::debug!("Frame skipped: {}", reason),
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, event: &KeyEvent) {
        let PhysicalKey::Code(key) = event.physical_key else {
            return;
        };
        if key == KeyCode::Escape && event.state == ElementState::Pressed {
            log::info!("Escape pressed, exiting");
            event_loop.exit();
            return;
        }
        self.scene.on_key_input(key, event.state);
    }
}

/// One full `begin_frame -> draw_model* -> end_frame` pass
pub fn render_frame(scene: &Scene, renderer: &mut dyn Renderer) -> Result<(), RenderError> {
    renderer.begin_frame()?;
    let drawn = scene.render(renderer);
    let ended = renderer.end_frame();
    drawn.and(ended)
}

impl ApplicationHandler for EngineApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.started {
            return;
        }
        self.started = true;

        if let Err(e) = self.windows.open_windows(event_loop) {
            self.fail(event_loop, anyhow::Error::new(e).context("failed to open windows"));
            return;
        }
        if let Err(e) = self.bind_renderers() {
            self.fail(event_loop, e);
            return;
        }

        self.last_update = Instant::now();
        log::info!(
            "Running with {} window(s), {} renderer(s), {} object(s)",
            self.windows.windows().len(),
            self.renderers.len(),
            self.scene.objects().len()
        );
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(index) = self.windows.window_index(window_id) else {
            return;
        };

        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                self.windows.windows_mut()[index].close();
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { event, .. } => self.handle_key(event_loop, &event),
            WindowEvent::MouseInput { state, button, .. } => {
                self.scene.on_mouse_button(button, state);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.scene.on_mouse_move(position.x, position.y);
            }
            WindowEvent::MouseWheel { delta, .. } => self.scene.on_mouse_scroll(&delta),
            WindowEvent::Resized(size) => {
                self.windows.windows_mut()[index].resize(size.width, size.height);
                for bound in self.renderers.iter_mut().filter(|b| b.window == index) {
                    bound.renderer.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.render_window(index) {
                    self.fail(event_loop, anyhow::Error::new(e).context("rendering failed"));
                }
            }
            _ => (),
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        let delta_time = now.duration_since(self.last_update).as_secs_f32();
        self.last_update = now;

        self.scene.update(delta_time);
        for window in self.windows.windows() {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        for bound in &mut self.renderers {
            bound.renderer.destroy();
        }
        log::info!("Shutting down");
    }
}

/// Loads `config.data_file`, builds every managed object and runs the event loop
pub fn run(config: EngineConfig) -> anyhow::Result<()> {
    let mut data = DataManager::from_config(&config);
    let routed = data
        .load_data()
        .with_context(|| format!("failed to load data file {}", config.data_file.display()))?;
    log::info!("Routed {} record(s)", routed);
    data.create_managed_objects();

    let (windows, mut renderers, mut models) = data.into_managers();
    let mut scene = Scene::new();
    let placed = models.populate_scene(&mut scene);
    log::info!("Scene holds {} object(s)", placed);

    let event_loop = EventLoop::new().context("failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = EngineApp::new(windows, renderers.take_renderers(), scene);
    event_loop
        .run_app(&mut app)
        .context("event loop terminated with an error")?;
    app.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        gfx::{
            rendering::{HeadlessRenderer, RendererState},
            scene::{MeshData, Model},
        },
        window::Window,
    };
    use cgmath::Vector3;
    use std::sync::Arc;

    fn scene_with_quad() -> Scene {
        let vertices = vec![
            -1.0, -1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, //
            1.0, -1.0, 0.0, 0.0, 0.0, 1.0, 1.0, 0.0, //
            1.0, 1.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, //
            -1.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0,
        ];
        let mesh = MeshData::new(vertices, vec![0, 1, 2, 0, 2, 3]).unwrap();
        let model = Arc::new(Model::from_meshes(vec![mesh]));

        let mut scene = Scene::new();
        let one = Vector3::new(1.0, 1.0, 1.0);
        let zero = Vector3::new(0.0, 0.0, 0.0);
        scene.add_model(model.clone(), zero, one, zero);
        scene.add_model(model, Vector3::new(2.0, 0.0, 0.0), one, zero);
        scene
    }

    #[test]
    fn render_frame_runs_full_lifecycle() {
        let scene = scene_with_quad();
        let mut renderer = HeadlessRenderer::new();
        renderer.initialize(&Window::new("Test", 800, 600)).unwrap();

        render_frame(&scene, &mut renderer).unwrap();
        render_frame(&scene, &mut renderer).unwrap();

        assert_eq!(renderer.state(), RendererState::Initialized);
        let stats = renderer.stats();
        assert_eq!(stats.frames, 2);
        assert_eq!(stats.models_drawn, 4);
        assert_eq!(renderer.upload_count(), 1);
    }

    #[test]
    fn render_frame_requires_initialize() {
        let scene = scene_with_quad();
        let mut renderer = HeadlessRenderer::new();
        assert!(matches!(
            render_frame(&scene, &mut renderer),
            Err(RenderError::InvalidState { .. })
        ));
    }

    #[test]
    fn binds_renderer_to_titled_window() {
        use crate::data::Manager;
        use serde_json::json;

        let mut windows = WindowManager::new();
        windows.add_json_object(json!({"class": "window", "title": "Left", "width": 400, "height": 300}));
        windows.add_json_object(json!({"class": "window", "title": "Right", "width": 800, "height": 600}));
        windows.create_objects();

        let renderers = vec![
            ManagedRenderer {
                renderer: Box::new(HeadlessRenderer::new()),
                target_window: Some("Right".to_string()),
            },
            ManagedRenderer {
                renderer: Box::new(HeadlessRenderer::new()),
                target_window: None,
            },
        ];
        let mut app = EngineApp::new(windows, renderers, scene_with_quad());
        app.bind_renderers().unwrap();

        let targets: Vec<_> = app.renderers.iter().map(|b| b.window).collect();
        assert_eq!(targets, vec![1, 0]);
        assert!(app
            .renderers
            .iter()
            .all(|b| b.renderer.state() == RendererState::Initialized));
        app.render_window(1).unwrap();
    }

    #[test]
    fn app_without_errors_reports_ok() {
        let app = EngineApp::new(WindowManager::new(), Vec::new(), Scene::new());
        assert!(app.scene().objects().is_empty());
        assert!(app.into_result().is_ok());
    }
}
