use std::mem::size_of;

use bytemuck::{bytes_of, Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::window::Size;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BlurDirection {
    Horizontal,
    Vertical,
}

#[derive(Debug, Copy, Clone, PartialEq, Default, Pod, Zeroable)]
#[repr(C)]
struct Uniforms {
    direction: [f32; 2],
    _pad0: [f32; 2],
}

impl Uniforms {
    fn new(direction: BlurDirection, src_size: Size) -> Self {
        let texel = [
            1.0 / src_size.width.max(1) as f32,
            1.0 / src_size.height.max(1) as f32,
        ];
        let direction = match direction {
            BlurDirection::Horizontal => [texel[0], 0.0],
            BlurDirection::Vertical => [0.0, texel[1]],
        };
        Self {
            direction,
            ..Default::default()
        }
    }
}

/// One axis of a separable 9-tap gaussian blur.
pub struct BlurRenderer {
    label: &'static str,
    render_pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
}

impl BlurRenderer {
    pub fn new(
        device: &wgpu::Device,
        src_texture_view: &wgpu::TextureView,
        src_size: Size,
        direction: BlurDirection,
        render_target_format: wgpu::TextureFormat,
    ) -> Self {
        let label = match direction {
            BlurDirection::Horizontal => "Horizontal Blur Render Pass",
            BlurDirection::Vertical => "Vertical Blur Render Pass",
        };

        let sampler = super::bilinear_sampler(device, "Blur Bilinear Sampler");

        // The step only depends on the source size, which is fixed until the next resize.
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Blur Uniform Buffer"),
            contents: bytes_of(&Uniforms::new(direction, src_size)),
            usage: wgpu::BufferUsages::UNIFORM,
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
            device.create_shader_module(&wgpu::include_wgsl!("fs_blur.wgsl"));
        let render_pipeline = super::fullscreen_pipeline(
            device,
            "Blur Render Pipeline",
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
            label,
            render_pipeline,
            bind_group,
        }
    }

    pub fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        color_attachment_view: &wgpu::TextureView,
    ) {
        let mut rpass = super::begin_fullscreen_pass(encoder, self.label, color_attachment_view);
        self.draw(&mut rpass);
    }

    fn draw<'rpass>(&'rpass self, rpass: &mut impl wgpu::util::RenderEncoder<'rpass>) {
        rpass.set_pipeline(&self.render_pipeline);
        rpass.set_bind_group(0, &self.bind_group, &[]);
        rpass.draw(0..3, 0..1);
    }
}
