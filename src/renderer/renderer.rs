use anyhow::{Context, Result};
use log::{debug, info, warn};

use crate::{
    entity::Scene,
    renderer::{
        blob::BlobRenderer,
        postprocessing::{BlurDirection, BlurRenderer, BrightPassRenderer, ComposeRenderer},
        render_target::RenderTargets,
    },
    window::{Size, Window},
};

/// Process-wide GPU context. Created once at start-up and torn down with
/// [`Renderer::shutdown`].
pub struct Renderer {
    surface: wgpu::Surface,
    surface_format: wgpu::TextureFormat,
    device: wgpu::Device,
    queue: wgpu::Queue,
    size: Size,
    render_targets: RenderTargets,
    blob_renderer: BlobRenderer,
    post_processing: PostProcessingRenderers,
}

impl Renderer {
    pub async fn new(window: &impl Window, scene: &Scene) -> Result<Self> {
        let instance = wgpu::Instance::new(wgpu::Backends::PRIMARY);
        let surface = unsafe { instance.create_surface(window) };

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("No adapter found")?;
        info!("Using adapter {:?}", adapter.get_info());

        let surface_format = surface
            .get_preferred_format(&adapter)
            .context("No preferred format found")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor::default(), None)
            .await
            .context("No device found")?;

        // A zero-sized surface cannot be configured; render targets still need a size.
        let size = window.size();
        let target_size = Size {
            width: size.width.max(1),
            height: size.height.max(1),
        };
        Self::configure_surface(&surface, &device, surface_format, target_size);

        let render_targets = RenderTargets::new(&device, target_size);
        let blob_renderer = BlobRenderer::new(&device, render_targets.color.format);
        let post_processing =
            PostProcessingRenderers::new(&device, &render_targets, surface_format);

        info!(
            "Renderer ready: {}x{} {:?}, {} blobs in scene",
            size.width,
            size.height,
            surface_format,
            scene.len()
        );

        Ok(Self {
            surface,
            surface_format,
            device,
            queue,
            size,
            render_targets,
            blob_renderer,
            post_processing,
        })
    }

    fn configure_surface(
        surface: &wgpu::Surface,
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        size: Size,
    ) {
        surface.configure(
            device,
            &wgpu::SurfaceConfiguration {
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                format,
                width: size.width,
                height: size.height,
                present_mode: wgpu::PresentMode::Fifo,
            },
        )
    }

    pub fn resize(&mut self, size: Size) {
        self.size = size;
        if size.is_empty() {
            debug!("Skipping resize to empty surface");
            return;
        }

        Self::configure_surface(&self.surface, &self.device, self.surface_format, size);
        self.render_targets = RenderTargets::new(&self.device, size);
        self.post_processing =
            PostProcessingRenderers::new(&self.device, &self.render_targets, self.surface_format);
    }

    pub fn render(&mut self, scene: &Scene) -> Result<()> {
        self.blob_renderer.update(&self.device, &self.queue, scene);

        if self.size.is_empty() {
            return Ok(());
        }

        self.post_processing.update(&self.queue, scene);

        let surface_texture = match self.surface.get_current_texture() {
            Ok(surface_texture) => surface_texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                warn!("Surface lost or outdated, reconfiguring");
                self.resize(self.size);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                warn!("Timed out acquiring the next surface texture");
                return Ok(());
            }
            Err(e) => return Err(e).context("Failed to get next surface texture"),
        };
        let surface_texture_view = surface_texture.texture.create_view(&Default::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Command Encoder"),
            });

        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Blob Render Pass"),
                color_attachments: &[wgpu::RenderPassColorAttachment {
                    view: &self.render_targets.color.texture_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(scene.post_processing.clear_color.to_wgpu()),
                        store: true,
                    },
                }],
                depth_stencil_attachment: None,
            });
            self.blob_renderer.draw(&mut rpass);
        }

        let targets = &self.render_targets;
        let post_processing = &self.post_processing;
        post_processing
            .bright_pass
            .render(&mut encoder, &targets.bright_pass.texture_view);
        post_processing.blur[0].render(&mut encoder, &targets.blur[0].texture_view);
        post_processing.blur[1].render(&mut encoder, &targets.blur[1].texture_view);
        post_processing
            .compose
            .render(&mut encoder, &surface_texture_view);

        self.queue.submit(Some(encoder.finish()));
        surface_texture.present();

        Ok(())
    }

    /// Waits for submitted work to finish before the device is dropped.
    pub fn shutdown(self) {
        info!(
            "Shutting down renderer ({} blobs resident)",
            self.blob_renderer.resident_count()
        );
        self.device.poll(wgpu::Maintain::Wait);
    }
}

struct PostProcessingRenderers {
    bright_pass: BrightPassRenderer,
    blur: [BlurRenderer; 2],
    compose: ComposeRenderer,
}

impl PostProcessingRenderers {
    /// Bind groups reference the render target views, so these are rebuilt
    /// together with the targets.
    fn new(
        device: &wgpu::Device,
        targets: &RenderTargets,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        let bright_pass = BrightPassRenderer::new(
            device,
            &targets.color.texture_view,
            targets.bright_pass.format,
        );

        let blur = [
            BlurRenderer::new(
                device,
                &targets.bright_pass.texture_view,
                targets.bright_pass.size,
                BlurDirection::Horizontal,
                targets.blur[0].format,
            ),
            BlurRenderer::new(
                device,
                &targets.blur[0].texture_view,
                targets.blur[0].size,
                BlurDirection::Vertical,
                targets.blur[1].format,
            ),
        ];

        let compose = ComposeRenderer::new(
            device,
            &targets.color.texture_view,
            &targets.blur[1].texture_view,
            surface_format,
        );

        Self {
            bright_pass,
            blur,
            compose,
        }
    }

    fn update(&self, queue: &wgpu::Queue, scene: &Scene) {
        self.bright_pass.update(queue, scene);
        self.compose.update(queue, scene);
    }
}
