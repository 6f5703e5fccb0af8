use crate::window::Size;

pub const HDR_TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// Offscreen color texture that one pass renders into and a later pass samples.
pub struct RenderTarget {
    pub format: wgpu::TextureFormat,
    pub size: Size,
    pub texture: wgpu::Texture,
    pub texture_view: wgpu::TextureView,
}

impl RenderTarget {
    pub fn new(
        device: &wgpu::Device,
        label: &str,
        format: wgpu::TextureFormat,
        size: Size,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: size.into(),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        });
        let texture_view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            format,
            size,
            texture,
            texture_view,
        }
    }
}

/// Every intermediate texture of a frame. Rebuilt whenever the surface is resized.
pub struct RenderTargets {
    pub color: RenderTarget,
    pub bright_pass: RenderTarget,
    pub blur: [RenderTarget; 2],
}

impl RenderTargets {
    const BLOOM_DIVISOR: u32 = 4;

    pub fn new(device: &wgpu::Device, size: Size) -> Self {
        let bloom_size = size.scaled_down(Self::BLOOM_DIVISOR);

        Self {
            color: RenderTarget::new(device, "Color Target Texture", HDR_TEXTURE_FORMAT, size),
            bright_pass: RenderTarget::new(
                device,
                "Bright Pass Texture",
                HDR_TEXTURE_FORMAT,
                bloom_size,
            ),
            blur: [
                RenderTarget::new(device, "Blur Texture 0", HDR_TEXTURE_FORMAT, bloom_size),
                RenderTarget::new(device, "Blur Texture 1", HDR_TEXTURE_FORMAT, bloom_size),
            ],
        }
    }
}
