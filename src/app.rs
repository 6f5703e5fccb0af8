use std::time::Instant;

use anyhow::{Context, Result};
use celestial_body::{
    config::Config,
    controls::ControlPanel,
    entity::Scene,
    renderer::Renderer,
    window::{HasSize, Size},
};
use log::{info, warn};
use winit::{
    dpi::{PhysicalPosition, PhysicalSize},
    event::{MouseScrollDelta, VirtualKeyCode},
    window::Window,
};

const ROTATE_SPEED: f32 = 0.005;
const ZOOM_SPEED: f32 = 2.0;

pub struct App {
    window: Window,
    scene: Scene,
    renderer: Renderer,
    panel: ControlPanel,
    title: String,
    shown_blob_count: Option<usize>,
    dragging: bool,
    last_update: Instant,
}

impl App {
    pub async fn new(window: Window, config: &Config) -> Result<Self> {
        let scene = Scene::from_config(config, window.size().aspect_ratio())
            .context("Failed to build scene")?;
        info!("Scene created with {} blobs", scene.len());

        let renderer = Renderer::new(&window, &scene).await?;

        Ok(Self {
            window,
            scene,
            renderer,
            panel: ControlPanel::default(),
            title: config.window.title.clone(),
            shown_blob_count: None,
            dragging: false,
            last_update: Instant::now(),
        })
    }

    pub fn on_resize(&mut self, size: PhysicalSize<u32>) {
        let size = Size::from(size);
        if !size.is_empty() {
            self.scene.set_aspect_ratio(size.aspect_ratio());
        }
        self.renderer.resize(size);
    }

    pub fn on_mouse_down(&mut self) {
        self.dragging = true;
    }

    pub fn on_mouse_up(&mut self) {
        self.dragging = false;
    }

    pub fn on_mouse_move(&mut self, (x, y): (f64, f64)) {
        if !self.dragging {
            return;
        }
        self.scene
            .orbit
            .rotate(x as f32 * -ROTATE_SPEED, y as f32 * ROTATE_SPEED);
    }

    pub fn on_mouse_scroll(&mut self, delta: MouseScrollDelta) {
        let y = match delta {
            MouseScrollDelta::PixelDelta(PhysicalPosition { y, .. }) => y as f32,
            MouseScrollDelta::LineDelta(_, y) => y * 60.0,
        };
        self.scene.orbit.zoom(y * -ZOOM_SPEED);
    }

    pub fn on_key_up(&mut self, keycode: VirtualKeyCode) {
        match keycode {
            VirtualKeyCode::H => {
                if self.panel.toggle() {
                    info!("{}", self.panel.status(&self.scene));
                }
            }
            VirtualKeyCode::N => match self.scene.spawn_blob(None) {
                Ok(id) => info!("Spawned blob {} ({} live)", id, self.scene.len()),
                Err(e) => warn!("Failed to spawn blob: {}", e),
            },
            VirtualKeyCode::R => self.scene.remove_all_blobs(),
            _ if self.panel.is_visible() => self.on_panel_key(keycode),
            _ => (),
        }
    }

    fn on_panel_key(&mut self, keycode: VirtualKeyCode) {
        match keycode {
            VirtualKeyCode::Tab => self.panel.cycle_target(&self.scene),
            VirtualKeyCode::Down => self.panel.select_next_field(),
            VirtualKeyCode::Up => self.panel.select_previous_field(),
            VirtualKeyCode::Right => {
                self.panel.nudge(&mut self.scene, 1);
                return;
            }
            VirtualKeyCode::Left => {
                self.panel.nudge(&mut self.scene, -1);
                return;
            }
            _ => return,
        }
        info!("{}", self.panel.status(&self.scene));
    }

    pub fn render(&mut self) -> Result<()> {
        let now = Instant::now();
        let dt = now - self.last_update;
        self.last_update = now;

        self.scene.update(dt);
        self.update_title();
        self.renderer.render(&self.scene)
    }

    fn update_title(&mut self) {
        let count = self.scene.len();
        if self.shown_blob_count != Some(count) {
            self.window
                .set_title(&format!("{} ({} blobs)", self.title, count));
            self.shown_blob_count = Some(count);
        }
    }

    pub fn shutdown(self) {
        info!("Shutting down with {} live blobs", self.scene.len());
        self.renderer.shutdown();
    }
}
