/// Knobs for device and surface creation.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Pick an sRGB swapchain format when the surface offers one. Textures
    /// are sampled as sRGB, so this keeps colors as authored.
    pub prefer_srgb: bool,
    /// FIFO paces redraws to the display, which is what drives frame timing.
    pub present_mode: wgpu::PresentMode,
    /// Ignored when the surface does not support it.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,
    pub required_features: wgpu::Features,
    pub required_limits: wgpu::Limits,
    pub desired_maximum_frame_latency: u32,
}

impl GpuInit {
    /// WebGL2-level limits, enough for a textured mesh on any backend.
    pub fn portable() -> Self {
        Self {
            prefer_srgb: true,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: None,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::downlevel_webgl2_defaults(),
            desired_maximum_frame_latency: 2,
        }
    }
}

impl Default for GpuInit {
    fn default() -> Self {
        Self::portable()
    }
}
