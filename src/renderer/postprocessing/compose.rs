use std::mem::size_of;

use bytemuck::{bytes_of, Pod, Zeroable};

use crate::{entity::Scene, noise::finite_or};

#[derive(Debug, Copy, Clone, PartialEq, Default, Pod, Zeroable)]
#[repr(C)]
struct Uniforms {
    bloom_intensity: f32,
    vignette_offset: f32,
    vignette_darkness: f32,
    _pad0: f32,
}

impl Uniforms {
    fn new(scene: &Scene) -> Self {
        let post_processing = &scene.post_processing;
        Self {
            bloom_intensity: finite_or(post_processing.bloom.intensity, 0.0),
            vignette_offset: finite_or(post_processing.vignette.offset, 0.0),
            vignette_darkness: finite_or(post_processing.vignette.darkness, 0.0),
            ..Default::default()
        }
    }
}

/// Adds the blurred bloom onto the scene color and applies the vignette.
pub struct ComposeRenderer {
    uniform_buffer: wgpu::Buffer,
    render_pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
}

impl ComposeRenderer {
    pub fn new(
        device: &wgpu::Device,
        color_texture_view: &wgpu::TextureView,
        bloom_texture_view: &wgpu::TextureView,
        render_target_format: wgpu::TextureFormat,
    ) -> Self {
        let sampler = super::bilinear_sampler(device, "Compose Bilinear Sampler");

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Compose Uniform Buffer"),
            size: size_of::<Uniforms>() as _,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: None,
            entries: &[
                super::uniform_entry(0, size_of::<Uniforms>()),
                super::sampler_entry(1),
                super::texture_entry(2),
                super::texture_entry(3),
            ],
        });

        let fragment_shader_module =
            device.create_shader_module(&wgpu::include_wgsl!("fs_compose.wgsl"));
        let render_pipeline = super::fullscreen_pipeline(
            device,
            "Post Process Compose Render Pipeline",
            &bind_group_layout,
            &fragment_shader_module,
            render_target_format,
        );

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: None,
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(color_texture_view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(bloom_texture_view),
                },
            ],
        });

        Self {
            uniform_buffer,
            render_pipeline,
            bind_group,
        }
    }

    pub fn update(&self, queue: &wgpu::Queue, scene: &Scene) {
        queue.write_buffer(&self.uniform_buffer, 0, bytes_of(&Uniforms::new(scene)));
    }

    pub fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        color_attachment_view: &wgpu::TextureView,
    ) {
        let mut rpass =
            super::begin_fullscreen_pass(encoder, "Compose Render Pass", color_attachment_view);
        self.draw(&mut rpass);
    }

    fn draw<'rpass>(&'rpass self, rpass: &mut impl wgpu::util::RenderEncoder<'rpass>) {
        rpass.set_pipeline(&self.render_pipeline);
        rpass.set_bind_group(0, &self.bind_group, &[]);
        rpass.draw(0..3, 0..1);
    }
}
