use std::mem::size_of;

use bytemuck::{bytes_of, Pod, Zeroable};

use crate::{entity::Scene, noise::finite_or};

#[derive(Debug, Copy, Clone, PartialEq, Default, Pod, Zeroable)]
#[repr(C)]
struct Uniforms {
    threshold: f32,
    smoothing: f32,
    _pad0: [f32; 2],
}

impl Uniforms {
    fn new(scene: &Scene) -> Self {
        let bloom = &scene.post_processing.bloom;
        Self {
            threshold: finite_or(bloom.threshold, 0.0),
            smoothing: finite_or(bloom.smoothing, 0.0).max(1e-4),
            ..Default::default()
        }
    }
}

/// Keeps only the parts of the frame brighter than the bloom threshold.
pub struct BrightPassRenderer {
    uniform_buffer: wgpu::Buffer,
    render_pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
}

impl BrightPassRenderer {
    pub fn new(
        device: &wgpu::Device,
        src_texture_view: &wgpu::TextureView,
        render_target_format: wgpu::TextureFormat,
    ) -> Self {
        let sampler = super::bilinear_sampler(device, "Bright Pass Bilinear Sampler");

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Bright Pass Uniform Buffer"),
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
            ],
        });

        let fragment_shader_module =
            device.create_shader_module(&wgpu::include_wgsl!("fs_bright_pass.wgsl"));
        let render_pipeline = super::fullscreen_pipeline(
            device,
            "Bright Pass Render Pipeline",
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
                    resource: wgpu::BindingResource::TextureView(src_texture_view),
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
            super::begin_fullscreen_pass(encoder, "Bright Pass Render Pass", color_attachment_view);
        self.draw(&mut rpass);
    }

    fn draw<'rpass>(&'rpass self, rpass: &mut impl wgpu::util::RenderEncoder<'rpass>) {
        rpass.set_pipeline(&self.render_pipeline);
        rpass.set_bind_group(0, &self.bind_group, &[]);
        rpass.draw(0..3, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniforms_follow_bloom_settings() {
        let mut scene = Scene::new(1);
        scene.post_processing.bloom.threshold = 0.4;
        scene.post_processing.bloom.smoothing = f32::NAN;
        let uniforms = Uniforms::new(&scene);
        assert_eq!(uniforms.threshold, 0.4);
        assert!(uniforms.smoothing > 0.0);
        assert_eq!(size_of::<Uniforms>() % 16, 0);
    }
}
