//! Runtime self-checks behind `--test`
//!
//! Every check is GPU-free so the suite runs on machines without a display.

use std::sync::Arc;

use cgmath::{InnerSpace, Vector3};

use crate::{
    app::render_frame,
    data::{DataManager, Manager},
    gfx::{
        camera::{CameraMovement, FlyCamera},
        rendering::{
            HeadlessRenderer, RenderEngine, RenderError, RenderSettings, Renderer,
            RendererBackend, RendererState,
        },
        scene::{MeshData, Model, Scene},
    },
    window::Window,
};

type CheckResult = Result<(), String>;

macro_rules! ensure {
    ($cond:expr, $($msg:tt)+) => {
        if !$cond {
            return Err(format!($($msg)+));
        }
    };
}

#[derive(Debug, Default)]
pub struct SmokeReport {
    results: Vec<(&'static str, CheckResult)>,
}

impl SmokeReport {
    fn record(&mut self, name: &'static str, result: CheckResult) {
        match &result {
            Ok(()) => log::info!("[PASS] {}", name),
            Err(reason) => log::error!("[FAIL] {}: {}", name, reason),
        }
        self.results.push((name, result));
    }

    pub fn passed(&self) -> usize {
        self.results.iter().filter(|(_, r)| r.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.passed()
    }

    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.results
            .iter()
            .filter_map(|(name, r)| r.as_ref().err().map(|e| (*name, e.as_str())))
    }
}

fn window_fields() -> CheckResult {
    let mut window = Window::new("Test Window", 800, 600);
    ensure!(window.title() == "Test Window", "title is '{}'", window.title());
    ensure!(
        (window.width(), window.height()) == (800, 600),
        "size is {}x{}",
        window.width(),
        window.height()
    );
    ensure!(!window.is_open(), "window open before creation");
    window.resize(0, 0);
    ensure!(window.width() == 800, "zero resize was applied");
    Ok(())
}

fn camera_stays_orthonormal() -> CheckResult {
    const EPS: f32 = 1e-4;
    let mut camera = FlyCamera::default();

    let moves = [
        CameraMovement::Forward,
        CameraMovement::Left,
        CameraMovement::Backward,
        CameraMovement::Right,
    ];
    for (i, movement) in moves.into_iter().enumerate() {
        camera.process_keyboard(movement, 0.016);
        camera.process_mouse_movement(13.0 * i as f32, -7.0 * i as f32, true);

        let (front, right, up) = (camera.front(), camera.right(), camera.up());
        ensure!(front.dot(right).abs() < EPS, "front.right = {}", front.dot(right));
        ensure!(front.dot(up).abs() < EPS, "front.up = {}", front.dot(up));
        ensure!(right.dot(up).abs() < EPS, "right.up = {}", right.dot(up));
        for v in [front, right, up] {
            ensure!((v.magnitude() - 1.0).abs() < EPS, "non-unit basis vector {:?}", v);
        }
    }

    camera.process_mouse_movement(0.0, 10_000.0, true);
    ensure!(camera.pitch() <= 89.0, "pitch {} exceeds clamp", camera.pitch());
    Ok(())
}

fn json_routing() -> CheckResult {
    let mut data = DataManager::new("smoke.json");
    let routed = data
        .load_from_str(
            r#"[
                {"class": "window", "title": "Test Window 1", "width": 400, "height": 300},
                {"class": "Window", "title": "Test Window 2", "width": 800, "height": 600},
                {"class": "renderer", "backend": "headless"},
                {"class": "teapot"}
            ]"#,
        )
        .map_err(|e| e.to_string())?;
    ensure!(routed == 3, "routed {} records, expected 3", routed);
    ensure!(
        data.window_manager().json_objects().len() == 2,
        "window manager holds {} records",
        data.window_manager().json_objects().len()
    );

    data.create_managed_objects();
    ensure!(
        data.window_manager().windows().len() == 2,
        "created {} windows",
        data.window_manager().windows().len()
    );
    ensure!(
        data.renderer_manager().renderers().len() == 1,
        "created {} renderers",
        data.renderer_manager().renderers().len()
    );
    Ok(())
}

fn renderer_rejects_missing_window() -> CheckResult {
    let mut engine = RenderEngine::new(RendererBackend::Auto, RenderSettings::default());
    match engine.initialize(&Window::new("Null", 640, 480)) {
        Err(RenderError::MissingWindowHandle(_)) => {}
        Err(e) => return Err(format!("unexpected error: {}", e)),
        Ok(()) => return Err("initialize succeeded without a native window".to_string()),
    }
    ensure!(
        engine.state() == RendererState::Uninitialized,
        "state is {} after failed initialize",
        engine.state()
    );
    Ok(())
}

fn headless_frames() -> CheckResult {
    let vertices = vec![
        0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, //
        1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0,
    ];
    let mesh = MeshData::new(vertices, vec![0, 1, 2]).map_err(|e| e.to_string())?;
    let model = Arc::new(Model::from_meshes(vec![mesh]));

    let mut scene = Scene::new();
    let unit = Vector3::new(1.0, 1.0, 1.0);
    scene.add_model(model.clone(), Vector3::new(0.0, 0.0, 0.0), unit, Vector3::new(0.0, 0.0, 0.0));
    scene.add_model(model, Vector3::new(1.0, 0.0, 0.0), unit, Vector3::new(0.0, 45.0, 0.0));

    let mut renderer = HeadlessRenderer::new();
    ensure!(
        renderer.begin_frame().is_err(),
        "begin_frame succeeded before initialize"
    );
    renderer
        .initialize(&Window::new("Headless", 320, 240))
        .map_err(|e| e.to_string())?;

    for _ in 0..3 {
        render_frame(&scene, &mut renderer).map_err(|e| e.to_string())?;
    }
    let stats = renderer.stats();
    ensure!(stats.frames == 3, "rendered {} frames", stats.frames);
    ensure!(stats.models_drawn == 6, "drew {} models", stats.models_drawn);
    ensure!(
        renderer.upload_count() == 1,
        "uploaded meshes {} times",
        renderer.upload_count()
    );
    Ok(())
}

fn missing_model_fails() -> CheckResult {
    match Model::load_from_file("does/not/exist.obj") {
        Ok(_) => Err("loading a missing file succeeded".to_string()),
        Err(_) => Ok(()),
    }
}

/// Runs every check and reports the outcome of each
pub fn run_all() -> SmokeReport {
    let checks: [(&'static str, fn() -> CheckResult); 6] = [
        ("window fields", window_fields),
        ("camera orthonormal after movement", camera_stays_orthonormal),
        ("json routing", json_routing),
        ("renderer rejects missing window", renderer_rejects_missing_window),
        ("headless frame lifecycle", headless_frames),
        ("missing model file", missing_model_fails),
    ];

    let mut report = SmokeReport::default();
    for (name, check) in checks {
        report.record(name, check());
    }
    log::info!(
        "Smoke tests: {} passed, {} failed",
        report.passed(),
        report.failed()
    );
    report
}
