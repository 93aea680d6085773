use serde::Deserialize;
use serde_json::Value;
use winit::{event_loop::ActiveEventLoop, window::WindowId};

use super::manager::{parse_record, Manager};
use crate::{
    config::{DEFAULT_WINDOW_HEIGHT, DEFAULT_WINDOW_TITLE, DEFAULT_WINDOW_WIDTH},
    window::{Window, WindowError},
};

/// `{"class": "window", "title": ..., "width": ..., "height": ...}`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WindowDescriptor {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

pub struct WindowManager {
    json_objects: Vec<Value>,
    windows: Vec<Window>,
    default_window: WindowDescriptor,
}

impl Default for WindowManager {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowManager {
    pub fn new() -> Self {
        Self::with_default_window(WindowDescriptor {
            title: DEFAULT_WINDOW_TITLE.to_string(),
            width: DEFAULT_WINDOW_WIDTH,
            height: DEFAULT_WINDOW_HEIGHT,
        })
    }

    /// Manager whose fallback window (used when no record builds) is `default_window`
    pub fn with_default_window(default_window: WindowDescriptor) -> Self {
        Self {
            json_objects: Vec::new(),
            windows: Vec::new(),
            default_window,
        }
    }

    /// Creates the native window for every managed window
    ///
    /// Windows that fail are logged and left closed; it is an error only if
    /// no window could be opened at all.
    pub fn open_windows(&mut self, event_loop: &ActiveEventLoop) -> Result<usize, WindowError> {
        let mut opened = 0;
        let mut first_error = None;

        for window in &mut self.windows {
            match window.create(event_loop) {
                Ok(()) => opened += 1,
                Err(e) => {
                    log::error!("{}", e);
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) if opened == 0 => Err(e),
            _ => Ok(opened),
        }
    }

    /// False once any managed window has been closed
    pub fn all_open(&self) -> bool {
        !self.windows.is_empty() && self.windows.iter().all(Window::is_open)
    }

    pub fn windows(&self) -> &[Window] {
        &self.windows
    }

    pub fn windows_mut(&mut self) -> &mut [Window] {
        &mut self.windows
    }

    pub fn window_index(&self, id: WindowId) -> Option<usize> {
        self.windows.iter().position(|w| w.id() == Some(id))
    }

    pub fn find_by_title(&self, title: &str) -> Option<usize> {
        self.windows.iter().position(|w| w.title() == title)
    }

    /// Window a renderer should attach to
    ///
    /// `title` picks the window, the first one when absent or unknown. A window
    /// that failed to open is swapped for the first open one.
    pub fn target_window(&self, title: Option<&str>) -> Option<usize> {
        self.target_window_by(title, Window::is_open)
    }

    fn target_window_by(
        &self,
        title: Option<&str>,
        usable: impl Fn(&Window) -> bool,
    ) -> Option<usize> {
        let wanted = match title {
            Some(title) => self.find_by_title(title).unwrap_or_else(|| {
                log::warn!("No window titled '{}', using the first window", title);
                0
            }),
            None => 0,
        };
        let window = self.windows.get(wanted)?;
        if usable(window) {
            return Some(wanted);
        }

        match self.windows.iter().position(|w| usable(w)) {
            Some(open) => {
                log::warn!(
                    "Window '{}' is not open, using '{}'",
                    window.title(),
                    self.windows[open].title()
                );
                Some(open)
            }
            None => Some(wanted),
        }
    }

    fn build_window(descriptor: WindowDescriptor) -> Option<Window> {
        if descriptor.width == 0 || descriptor.height == 0 {
            log::warn!(
                "Skipping window '{}': size {}x{} must be positive",
                descriptor.title,
                descriptor.width,
                descriptor.height
            );
            return None;
        }
        log::debug!(
            "Window '{}' ({}x{})",
            descriptor.title,
            descriptor.width,
            descriptor.height
        );
        Some(Window::new(
            descriptor.title,
            descriptor.width,
            descriptor.height,
        ))
    }
}

impl Manager for WindowManager {
    fn add_json_object(&mut self, object: Value) {
        self.json_objects.push(object);
    }

    fn json_objects(&self) -> &[Value] {
        &self.json_objects
    }

    fn create_objects(&mut self) {
        self.windows.clear();

        for object in &self.json_objects {
            if let Some(window) = parse_record::<WindowDescriptor>("window", object.clone())
                .and_then(Self::build_window)
            {
                self.windows.push(window);
            }
        }

        if self.windows.is_empty() {
            log::warn!(
                "No windows declared, using default '{}' ({}x{})",
                self.default_window.title,
                self.default_window.width,
                self.default_window.height
            );
            let default = self.default_window.clone();
            self.windows
                .push(Window::new(default.title, default.width, default.height));
        }

        log::info!("WindowManager created {} window(s)", self.windows.len());
    }
}
