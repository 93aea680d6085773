//! Native window wrapper
//!
//! A [`Window`] starts as a plain descriptor and only gets a live winit
//! handle once [`Window::create`] is called from inside the event loop.

use std::sync::Arc;

use thiserror::Error;
use winit::{dpi::PhysicalSize, event_loop::ActiveEventLoop, window::WindowId};

#[derive(Debug, Error)]
pub enum WindowError {
    #[error("failed to create window '{title}': {source}")]
    Create {
        title: String,
        #[source]
        source: winit::error::OsError,
    },
}

#[derive(Debug)]
pub struct Window {
    title: String,
    width: u32,
    height: u32,
    handle: Option<Arc<winit::window::Window>>,
    closed: bool,
}

impl Window {
    pub fn new(title: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            title: title.into(),
            width,
            height,
            handle: None,
            closed: false,
        }
    }

    /// Creates the native window. Calling it again on a live window is a no-op.
    pub fn create(&mut self, event_loop: &ActiveEventLoop) -> Result<(), WindowError> {
        if self.handle.is_some() {
            return Ok(());
        }

        let attributes = winit::window::Window::default_attributes()
            .with_title(self.title.clone())
            .with_inner_size(PhysicalSize::new(self.width, self.height));

        let handle = event_loop
            .create_window(attributes)
            .map_err(|source| WindowError::Create {
                title: self.title.clone(),
                source,
            })?;

        log::info!(
            "Created window '{}' ({}x{})",
            self.title,
            self.width,
            self.height
        );
        self.handle = Some(Arc::new(handle));
        self.closed = false;
        Ok(())
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn handle(&self) -> Option<&Arc<winit::window::Window>> {
        self.handle.as_ref()
    }

    pub fn id(&self) -> Option<WindowId> {
        self.handle.as_ref().map(|h| h.id())
    }

    /// True while the native window exists and has not been closed
    pub fn is_open(&self) -> bool {
        self.handle.is_some() && !self.closed
    }

    pub fn request_redraw(&self) {
        if let Some(handle) = &self.handle {
            handle.request_redraw();
        }
    }

    /// Marks the window closed and releases the native handle
    pub fn close(&mut self) {
        if !self.closed {
            log::info!("Window '{}' closed", self.title);
        }
        self.closed = true;
        self.handle = None;
    }

    /// Records the new client size; zero-sized (minimized) updates are ignored
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.width = width;
            self.height = height;
        }
    }

    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_window_has_no_handle() {
        let window = Window::new("Test", 800, 600);
        assert_eq!(window.title(), "Test");
        assert!(window.handle().is_none());
        assert!(window.id().is_none());
        assert!(!window.is_open());
    }

    #[test]
    fn resize_ignores_zero() {
        let mut window = Window::new("Test", 800, 600);
        window.resize(0, 300);
        assert_eq!((window.width(), window.height()), (800, 600));
        window.resize(1024, 512);
        assert_eq!((window.width(), window.height()), (1024, 512));
        assert_eq!(window.aspect_ratio(), 2.0);
    }

    #[test]
    fn close_without_handle() {
        let mut window = Window::new("Test", 800, 600);
        window.close();
        assert!(!window.is_open());
    }
}
