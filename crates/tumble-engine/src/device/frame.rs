/// One acquired swapchain image plus the encoder recording into it.
///
/// Acquire, record and hand back to `Gpu::submit` within a single redraw;
/// the next image cannot be acquired while this one is held.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}
