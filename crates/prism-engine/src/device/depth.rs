use winit::dpi::PhysicalSize;

/// Format of the depth attachment shared by every pipeline.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Depth attachment matching the surface size.
pub struct DepthBuffer {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl DepthBuffer {
    pub fn new(device: &wgpu::Device, size: PhysicalSize<u32>) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("prism depth texture"),
            size: depth_extent(size),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self { texture, view }
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        PhysicalSize::new(self.texture.width(), self.texture.height())
    }
}

/// wgpu rejects zero-sized textures; a minimized window keeps a 1x1 depth buffer.
fn depth_extent(size: PhysicalSize<u32>) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: size.width.max(1),
        height: size.height.max(1),
        depth_or_array_layers: 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_size_is_promoted_to_one_pixel() {
        let e = depth_extent(PhysicalSize::new(0, 0));
        assert_eq!((e.width, e.height, e.depth_or_array_layers), (1, 1, 1));
    }

    #[test]
    fn regular_size_is_kept() {
        let e = depth_extent(PhysicalSize::new(800, 600));
        assert_eq!((e.width, e.height), (800, 600));
    }
}
