use std::{collections::HashMap, mem::size_of};

use bytemuck::{bytes_of, cast_slice, Pod, Zeroable};
use glam::{const_vec3, Mat4, Vec3};
use log::{debug, trace};
use wgpu::util::DeviceExt;

use crate::{
    blob::{BlobDrawable, BlobId, BlobUniforms},
    entity::Scene,
};

const QUAD_VERTICES: [Vec3; 4] = [
    const_vec3!([-0.5, -0.5, 0.]),
    const_vec3!([-0.5, 0.5, 0.]),
    const_vec3!([0.5, -0.5, 0.]),
    const_vec3!([0.5, 0.5, 0.]),
];
const QUAD_INDICES: [u16; 6] = [0, 2, 1, 1, 2, 3];

#[derive(Debug, Copy, Clone, Default, Pod, Zeroable)]
#[repr(C)]
struct CameraUniforms {
    view: Mat4,
    projection: Mat4,
}

impl CameraUniforms {
    fn new(scene: &Scene) -> Self {
        Self {
            view: scene.orbit.view_matrix(),
            projection: scene.camera.projection_matrix(),
        }
    }
}

/// GPU resources owned by one live blob.
struct BlobResources {
    uniform_buffer: wgpu::Buffer,
    offset_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    instance_count: u32,
    visible: bool,
}

impl BlobResources {
    fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, drawable: &BlobDrawable) -> Self {
        debug!(
            "Allocating GPU resources for blob {} ({} offsets)",
            drawable.id,
            drawable.offsets.len()
        );

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Blob Uniform Buffer"),
            size: size_of::<BlobUniforms>() as _,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // Offsets never change after generation, so they are uploaded once.
        let offset_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Blob Offset Buffer"),
            contents: cast_slice(drawable.offsets),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Blob Bind Group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        Self {
            uniform_buffer,
            offset_buffer,
            bind_group,
            instance_count: drawable.instance_count,
            visible: drawable.visible,
        }
    }

    fn should_draw(&self) -> bool {
        self.visible && self.instance_count > 0
    }
}

pub struct BlobRenderer {
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    blob_bind_group_layout: wgpu::BindGroupLayout,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    render_pipeline: wgpu::RenderPipeline,
    resources: HashMap<BlobId, BlobResources>,
    draw_order: Vec<BlobId>,
}

impl BlobRenderer {
    pub fn new(device: &wgpu::Device, color_target_format: wgpu::TextureFormat) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Blob Quad Vertex Buffer"),
            contents: bytes_of(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Blob Quad Index Buffer"),
            contents: bytes_of(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });

        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: None,
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(size_of::<CameraUniforms>() as _),
                    },
                    count: None,
                }],
            });

        let blob_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: None,
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(size_of::<BlobUniforms>() as _),
                    },
                    count: None,
                }],
            });

        let shader_module = device.create_shader_module(&wgpu::include_wgsl!("blob.wgsl"));

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: None,
            bind_group_layouts: &[&camera_bind_group_layout, &blob_bind_group_layout],
            push_constant_ranges: &[],
        });

        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Blob Render Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader_module,
                entry_point: "vs_main",
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: size_of::<Vec3>() as _,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &[wgpu::VertexAttribute {
                            format: wgpu::VertexFormat::Float32x3,
                            offset: 0,
                            shader_location: 0,
                        }],
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: size_of::<Vec3>() as _,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &[wgpu::VertexAttribute {
                            format: wgpu::VertexFormat::Float32x3,
                            offset: 0,
                            shader_location: 1,
                        }],
                    },
                ],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader_module,
                entry_point: "fs_main",
                targets: &[wgpu::ColorTargetState {
                    format: color_target_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                }],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            // Translucent sprites, blended in spawn order without depth testing.
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Blob Camera Uniform Buffer"),
            size: size_of::<CameraUniforms>() as _,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: None,
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        Self {
            camera_buffer,
            camera_bind_group,
            blob_bind_group_layout,
            vertex_buffer,
            index_buffer,
            render_pipeline,
            resources: HashMap::new(),
            draw_order: Vec::new(),
        }
    }

    /// Uploads this frame's uniforms, allocates resources for new blobs and
    /// releases those of blobs that left the scene.
    pub fn update(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, scene: &Scene) {
        queue.write_buffer(&self.camera_buffer, 0, bytes_of(&CameraUniforms::new(scene)));

        self.draw_order.clear();
        let layout = &self.blob_bind_group_layout;
        for drawable in scene.drawables() {
            if drawable.offsets.is_empty() {
                continue;
            }
            let resources = self
                .resources
                .entry(drawable.id)
                .or_insert_with(|| BlobResources::new(device, layout, &drawable));
            trace!("Blob {} uniforms: {:?}", drawable.id, drawable.uniforms);
            queue.write_buffer(&resources.uniform_buffer, 0, bytes_of(&drawable.uniforms));
            resources.instance_count = drawable.instance_count;
            resources.visible = drawable.visible;
            self.draw_order.push(drawable.id);
        }

        let live = &self.draw_order;
        self.resources.retain(|id, _| {
            let keep = live.contains(id);
            if !keep {
                debug!("Releasing GPU resources for blob {}", id);
            }
            keep
        });
    }

    pub fn resident_count(&self) -> usize {
        self.resources.len()
    }

    pub fn draw<'rpass>(&'rpass self, rpass: &mut impl wgpu::util::RenderEncoder<'rpass>) {
        rpass.set_pipeline(&self.render_pipeline);
        rpass.set_bind_group(0, &self.camera_bind_group, &[]);
        rpass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        rpass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);

        for id in &self.draw_order {
            let resources = match self.resources.get(id) {
                Some(resources) if resources.should_draw() => resources,
                _ => continue,
            };
            rpass.set_bind_group(1, &resources.bind_group, &[]);
            rpass.set_vertex_buffer(1, resources.offset_buffer.slice(..));
            rpass.draw_indexed(0..(QUAD_INDICES.len() as _), 0, 0..resources.instance_count);
        }
    }
}
