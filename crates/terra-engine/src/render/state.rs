//! Fixed-function pipeline settings.
//!
//! Most of a [`RenderState`] is baked into a wgpu render pipeline; the
//! hashable [`PipelineStateKey`] selects a cached pipeline. Depth range and
//! blend colour are dynamic pass state and are applied per draw.

/// Which faces are discarded when culling is enabled.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum CullFace {
    Front,
    Back,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum WindingOrder {
    Clockwise,
    Counterclockwise,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct FacetCulling {
    pub enabled: bool,
    pub face: CullFace,
    pub front_face_winding_order: WindingOrder,
}

impl Default for FacetCulling {
    fn default() -> Self {
        Self {
            enabled: true,
            face: CullFace::Back,
            front_face_winding_order: WindingOrder::Counterclockwise,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum DepthTestFunction {
    Never,
    Less,
    Equal,
    LessThanOrEqual,
    Greater,
    NotEqual,
    GreaterThanOrEqual,
    Always,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct DepthTest {
    pub enabled: bool,
    pub function: DepthTestFunction,
}

impl Default for DepthTest {
    fn default() -> Self {
        Self {
            enabled: true,
            function: DepthTestFunction::Less,
        }
    }
}

/// Mapping of NDC depth onto the depth buffer, both ends in [0, 1].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DepthRange {
    pub near: f64,
    pub far: f64,
}

impl Default for DepthRange {
    fn default() -> Self {
        Self { near: 0.0, far: 1.0 }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum SourceBlendingFactor {
    Zero,
    One,
    SourceAlpha,
    OneMinusSourceAlpha,
    DestinationAlpha,
    OneMinusDestinationAlpha,
    DestinationColor,
    OneMinusDestinationColor,
    SourceAlphaSaturate,
    ConstantColor,
    OneMinusConstantColor,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum DestinationBlendingFactor {
    Zero,
    One,
    SourceColor,
    OneMinusSourceColor,
    SourceAlpha,
    OneMinusSourceAlpha,
    DestinationAlpha,
    OneMinusDestinationAlpha,
    DestinationColor,
    OneMinusDestinationColor,
    ConstantColor,
    OneMinusConstantColor,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BlendEquation {
    Add,
    Minimum,
    Maximum,
    Subtract,
    ReverseSubtract,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Blending {
    pub enabled: bool,
    pub source_rgb_factor: SourceBlendingFactor,
    pub source_alpha_factor: SourceBlendingFactor,
    pub destination_rgb_factor: DestinationBlendingFactor,
    pub destination_alpha_factor: DestinationBlendingFactor,
    pub rgb_equation: BlendEquation,
    pub alpha_equation: BlendEquation,
    /// Constant used by the `ConstantColor` factors (RGBA).
    pub color: [f64; 4],
}

impl Default for Blending {
    fn default() -> Self {
        Self {
            enabled: false,
            source_rgb_factor: SourceBlendingFactor::One,
            source_alpha_factor: SourceBlendingFactor::One,
            destination_rgb_factor: DestinationBlendingFactor::Zero,
            destination_alpha_factor: DestinationBlendingFactor::Zero,
            rgb_equation: BlendEquation::Add,
            alpha_equation: BlendEquation::Add,
            color: [0.0; 4],
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ColorMask {
    pub red: bool,
    pub green: bool,
    pub blue: bool,
    pub alpha: bool,
}

impl Default for ColorMask {
    fn default() -> Self {
        Self {
            red: true,
            green: true,
            blue: true,
            alpha: true,
        }
    }
}

/// The full set of fixed-function settings used by one draw call.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderState {
    pub facet_culling: FacetCulling,
    pub depth_test: DepthTest,
    pub depth_range: DepthRange,
    pub blending: Blending,
    pub color_mask: ColorMask,
    pub depth_mask: bool,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            facet_culling: FacetCulling::default(),
            depth_test: DepthTest::default(),
            depth_range: DepthRange::default(),
            blending: Blending::default(),
            color_mask: ColorMask::default(),
            depth_mask: true,
        }
    }
}

/// The part of a [`RenderState`] that is baked into a pipeline.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct PipelineStateKey {
    pub facet_culling: FacetCulling,
    pub depth_test: DepthTest,
    pub blending: Option<BlendKey>,
    pub color_mask: ColorMask,
    pub depth_mask: bool,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct BlendKey {
    pub source_rgb_factor: SourceBlendingFactor,
    pub source_alpha_factor: SourceBlendingFactor,
    pub destination_rgb_factor: DestinationBlendingFactor,
    pub destination_alpha_factor: DestinationBlendingFactor,
    pub rgb_equation: BlendEquation,
    pub alpha_equation: BlendEquation,
}

impl RenderState {
    pub fn pipeline_key(&self) -> PipelineStateKey {
        let b = &self.blending;
        PipelineStateKey {
            facet_culling: self.facet_culling,
            depth_test: self.depth_test,
            blending: b.enabled.then_some(BlendKey {
                source_rgb_factor: b.source_rgb_factor,
                source_alpha_factor: b.source_alpha_factor,
                destination_rgb_factor: b.destination_rgb_factor,
                destination_alpha_factor: b.destination_alpha_factor,
                rgb_equation: b.rgb_equation,
                alpha_equation: b.alpha_equation,
            }),
            color_mask: self.color_mask,
            depth_mask: self.depth_mask,
        }
    }

    /// Blend constant for `set_blend_constant`.
    pub fn blend_constant(&self) -> wgpu::Color {
        let [r, g, b, a] = self.blending.color;
        wgpu::Color { r, g, b, a }
    }

    /// Depth range clamped to [0, 1]. `near > far` is kept as given and
    /// mirrors window depth.
    pub fn clamped_depth_range(&self) -> (f32, f32) {
        let near = self.depth_range.near.clamp(0.0, 1.0) as f32;
        let far = self.depth_range.far.clamp(0.0, 1.0) as f32;
        (near, far)
    }

    #[inline]
    pub fn depth_range_inverted(&self) -> bool {
        let (near, far) = self.clamped_depth_range();
        near > far
    }

    /// Ordered `(min, max)` for the pass viewport. wgpu rejects an inverted
    /// range, so the mirroring is folded into clip space instead (see
    /// `Context::clip_space_remap`).
    pub fn pass_depth_range(&self) -> (f32, f32) {
        let (near, far) = self.clamped_depth_range();
        (near.min(far), near.max(far))
    }
}

impl PipelineStateKey {
    pub(crate) fn cull_mode(&self) -> Option<wgpu::Face> {
        self.facet_culling.enabled.then_some(match self.facet_culling.face {
            CullFace::Front => wgpu::Face::Front,
            CullFace::Back => wgpu::Face::Back,
        })
    }

    pub(crate) fn front_face(&self) -> wgpu::FrontFace {
        match self.facet_culling.front_face_winding_order {
            WindingOrder::Clockwise => wgpu::FrontFace::Cw,
            WindingOrder::Counterclockwise => wgpu::FrontFace::Ccw,
        }
    }

    pub(crate) fn blend_state(&self) -> Option<wgpu::BlendState> {
        self.blending.map(|b| wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: source_factor(b.source_rgb_factor),
                dst_factor: destination_factor(b.destination_rgb_factor),
                operation: blend_operation(b.rgb_equation),
            },
            alpha: wgpu::BlendComponent {
                src_factor: source_factor(b.source_alpha_factor),
                dst_factor: destination_factor(b.destination_alpha_factor),
                operation: blend_operation(b.alpha_equation),
            },
        })
    }

    pub(crate) fn color_writes(&self) -> wgpu::ColorWrites {
        let mut writes = wgpu::ColorWrites::empty();
        let m = self.color_mask;
        if m.red {
            writes |= wgpu::ColorWrites::RED;
        }
        if m.green {
            writes |= wgpu::ColorWrites::GREEN;
        }
        if m.blue {
            writes |= wgpu::ColorWrites::BLUE;
        }
        if m.alpha {
            writes |= wgpu::ColorWrites::ALPHA;
        }
        writes
    }

    /// Depth-stencil state for a target with `format`, or `None` if the
    /// draw does not touch depth.
    pub(crate) fn depth_stencil(&self, format: Option<wgpu::TextureFormat>) -> Option<wgpu::DepthStencilState> {
        let format = format?;
        let depth_compare = if self.depth_test.enabled {
            compare_function(self.depth_test.function)
        } else {
            wgpu::CompareFunction::Always
        };

        Some(wgpu::DepthStencilState {
            format,
            // GL ignores the depth mask while the depth test is disabled.
            depth_write_enabled: self.depth_test.enabled && self.depth_mask,
            depth_compare,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        })
    }
}

fn compare_function(f: DepthTestFunction) -> wgpu::CompareFunction {
    match f {
        DepthTestFunction::Never => wgpu::CompareFunction::Never,
        DepthTestFunction::Less => wgpu::CompareFunction::Less,
        DepthTestFunction::Equal => wgpu::CompareFunction::Equal,
        DepthTestFunction::LessThanOrEqual => wgpu::CompareFunction::LessEqual,
        DepthTestFunction::Greater => wgpu::CompareFunction::Greater,
        DepthTestFunction::NotEqual => wgpu::CompareFunction::NotEqual,
        DepthTestFunction::GreaterThanOrEqual => wgpu::CompareFunction::GreaterEqual,
        DepthTestFunction::Always => wgpu::CompareFunction::Always,
    }
}

fn source_factor(f: SourceBlendingFactor) -> wgpu::BlendFactor {
    match f {
        SourceBlendingFactor::Zero => wgpu::BlendFactor::Zero,
        SourceBlendingFactor::One => wgpu::BlendFactor::One,
        SourceBlendingFactor::SourceAlpha => wgpu::BlendFactor::SrcAlpha,
        SourceBlendingFactor::OneMinusSourceAlpha => wgpu::BlendFactor::OneMinusSrcAlpha,
        SourceBlendingFactor::DestinationAlpha => wgpu::BlendFactor::DstAlpha,
        SourceBlendingFactor::OneMinusDestinationAlpha => wgpu::BlendFactor::OneMinusDstAlpha,
        SourceBlendingFactor::DestinationColor => wgpu::BlendFactor::Dst,
        SourceBlendingFactor::OneMinusDestinationColor => wgpu::BlendFactor::OneMinusDst,
        SourceBlendingFactor::SourceAlphaSaturate => wgpu::BlendFactor::SrcAlphaSaturated,
        SourceBlendingFactor::ConstantColor => wgpu::BlendFactor::Constant,
        SourceBlendingFactor::OneMinusConstantColor => wgpu::BlendFactor::OneMinusConstant,
    }
}

fn destination_factor(f: DestinationBlendingFactor) -> wgpu::BlendFactor {
    match f {
        DestinationBlendingFactor::Zero => wgpu::BlendFactor::Zero,
        DestinationBlendingFactor::One => wgpu::BlendFactor::One,
        DestinationBlendingFactor::SourceColor => wgpu::BlendFactor::Src,
        DestinationBlendingFactor::OneMinusSourceColor => wgpu::BlendFactor::OneMinusSrc,
        DestinationBlendingFactor::SourceAlpha => wgpu::BlendFactor::SrcAlpha,
        DestinationBlendingFactor::OneMinusSourceAlpha => wgpu::BlendFactor::OneMinusSrcAlpha,
        DestinationBlendingFactor::DestinationAlpha => wgpu::BlendFactor::DstAlpha,
        DestinationBlendingFactor::OneMinusDestinationAlpha => wgpu::BlendFactor::OneMinusDstAlpha,
        DestinationBlendingFactor::DestinationColor => wgpu::BlendFactor::Dst,
        DestinationBlendingFactor::OneMinusDestinationColor => wgpu::BlendFactor::OneMinusDst,
        DestinationBlendingFactor::ConstantColor => wgpu::BlendFactor::Constant,
        DestinationBlendingFactor::OneMinusConstantColor => wgpu::BlendFactor::OneMinusConstant,
    }
}

fn blend_operation(e: BlendEquation) -> wgpu::BlendOperation {
    match e {
        BlendEquation::Add => wgpu::BlendOperation::Add,
        BlendEquation::Minimum => wgpu::BlendOperation::Min,
        BlendEquation::Maximum => wgpu::BlendOperation::Max,
        BlendEquation::Subtract => wgpu::BlendOperation::Subtract,
        BlendEquation::ReverseSubtract => wgpu::BlendOperation::ReverseSubtract,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cull_back_faces_and_test_depth() {
        let key = RenderState::default().pipeline_key();
        assert_eq!(key.cull_mode(), Some(wgpu::Face::Back));
        assert_eq!(key.front_face(), wgpu::FrontFace::Ccw);
        assert!(key.blend_state().is_none());
        assert_eq!(key.color_writes(), wgpu::ColorWrites::ALL);
    }

    #[test]
    fn disabled_culling_has_no_cull_mode() {
        let mut rs = RenderState::default();
        rs.facet_culling.enabled = false;
        assert_eq!(rs.pipeline_key().cull_mode(), None);
    }

    #[test]
    fn depth_range_and_blend_color_do_not_change_the_key() {
        let a = RenderState::default();
        let mut b = RenderState::default();
        b.depth_range = DepthRange { near: 0.25, far: 0.75 };
        b.blending.color = [1.0, 0.0, 0.0, 1.0];
        assert_eq!(a.pipeline_key(), b.pipeline_key());
    }

    #[test]
    fn blend_settings_change_the_key() {
        let a = RenderState::default();
        let mut b = RenderState::default();
        b.blending.enabled = true;
        assert_ne!(a.pipeline_key(), b.pipeline_key());
    }

    #[test]
    fn disabled_depth_test_never_writes_depth() {
        let mut rs = RenderState::default();
        rs.depth_test.enabled = false;
        let ds = rs
            .pipeline_key()
            .depth_stencil(Some(wgpu::TextureFormat::Depth32Float))
            .unwrap();
        assert!(!ds.depth_write_enabled);
        assert_eq!(ds.depth_compare, wgpu::CompareFunction::Always);
    }

    #[test]
    fn depth_range_is_clamped_but_keeps_its_direction() {
        let mut rs = RenderState::default();
        rs.depth_range = DepthRange { near: 1.5, far: -0.5 };
        assert_eq!(rs.clamped_depth_range(), (1.0, 0.0));
        assert!(rs.depth_range_inverted());
        assert_eq!(rs.pass_depth_range(), (0.0, 1.0));
    }

    #[test]
    fn default_depth_range_is_not_inverted() {
        let rs = RenderState::default();
        assert_eq!(rs.clamped_depth_range(), (0.0, 1.0));
        assert!(!rs.depth_range_inverted());
        assert_eq!(rs.pass_depth_range(), (0.0, 1.0));
    }
}
