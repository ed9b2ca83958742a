/// A single acquired frame.
///
/// Short-lived: holding the surface texture blocks acquisition of the next one.
/// The depth view lives on `Gpu` and is borrowed separately.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}
