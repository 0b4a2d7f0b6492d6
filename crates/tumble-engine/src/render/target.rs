use winit::dpi::PhysicalSize;

/// The frame being drawn: its encoder, the swapchain view and its size.
///
/// The view has already been cleared when a renderer receives it, so passes
/// should load rather than clear the color attachment.
pub struct RenderTarget<'a> {
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub view: &'a wgpu::TextureView,
    /// Physical pixels; never 0x0.
    pub size: PhysicalSize<u32>,
}
