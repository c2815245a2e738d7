/// Device and surface settings used when a window's [`super::Gpu`] is created.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Pick an sRGB swapchain format if the surface offers one. Textures are
    /// sampled as linear colour and encoded on write.
    pub prefer_srgb: bool,

    pub present_mode: wgpu::PresentMode,

    /// Requested compositing mode; replaced by the first supported mode when
    /// the surface does not offer it.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    pub required_features: wgpu::Features,
    pub required_limits: wgpu::Limits,

    /// Hint only; backends may ignore it.
    pub desired_maximum_frame_latency: u32,

    /// Depth buffer kept next to the swapchain. With `None`, draws that
    /// enable depth testing fail with `MissingDepthTarget`.
    pub depth_format: Option<wgpu::TextureFormat>,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            prefer_srgb: true,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: None,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            desired_maximum_frame_latency: 2,
            depth_format: Some(wgpu::TextureFormat::Depth32Float),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_keeps_a_depth_buffer() {
        let init = GpuInit::default();
        assert_eq!(init.depth_format, Some(wgpu::TextureFormat::Depth32Float));
        assert!(init.depth_format.is_some_and(|f| f.is_depth_stencil_format()));
        assert!(init.prefer_srgb);
    }
}
