//! Blend state and the four named presets.
//!
//! | mode            | enabled | src color | src alpha | dst color             | dst alpha             |
//! |-----------------|---------|-----------|-----------|-----------------------|-----------------------|
//! | `None`          | no      | ONE       | ONE       | ZERO                  | ZERO                  |
//! | `Alpha`         | yes     | SRC_COLOR | SRC_ALPHA | ONE_MINUS_SRC_ALPHA   | ONE_MINUS_SRC_ALPHA   |
//! | `Additive`      | yes     | SRC_COLOR | SRC_ALPHA | ONE                   | ONE                   |
//! | `Premultiplied` | yes     | ONE       | ONE       | ONE_MINUS_SRC_ALPHA   | ONE_MINUS_SRC_ALPHA   |
//!
//! Every preset uses `ADD` for both equations and a zero constant color.

/// A blend factor, named after the GL enum it mirrors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstColor,
    OneMinusDstColor,
    DstAlpha,
    OneMinusDstAlpha,
    Constant,
    OneMinusConstant,
}

impl BlendFactor {
    pub fn to_wgpu(self) -> wgpu::BlendFactor {
        match self {
            BlendFactor::Zero => wgpu::BlendFactor::Zero,
            BlendFactor::One => wgpu::BlendFactor::One,
            BlendFactor::SrcColor => wgpu::BlendFactor::Src,
            BlendFactor::OneMinusSrcColor => wgpu::BlendFactor::OneMinusSrc,
            BlendFactor::SrcAlpha => wgpu::BlendFactor::SrcAlpha,
            BlendFactor::OneMinusSrcAlpha => wgpu::BlendFactor::OneMinusSrcAlpha,
            BlendFactor::DstColor => wgpu::BlendFactor::Dst,
            BlendFactor::OneMinusDstColor => wgpu::BlendFactor::OneMinusDst,
            BlendFactor::DstAlpha => wgpu::BlendFactor::DstAlpha,
            BlendFactor::OneMinusDstAlpha => wgpu::BlendFactor::OneMinusDstAlpha,
            BlendFactor::Constant => wgpu::BlendFactor::Constant,
            BlendFactor::OneMinusConstant => wgpu::BlendFactor::OneMinusConstant,
        }
    }
}

/// Blend equation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendOp {
    Add,
    Subtract,
    ReverseSubtract,
    Min,
    Max,
}

impl BlendOp {
    pub fn to_wgpu(self) -> wgpu::BlendOperation {
        match self {
            BlendOp::Add => wgpu::BlendOperation::Add,
            BlendOp::Subtract => wgpu::BlendOperation::Subtract,
            BlendOp::ReverseSubtract => wgpu::BlendOperation::ReverseSubtract,
            BlendOp::Min => wgpu::BlendOperation::Min,
            BlendOp::Max => wgpu::BlendOperation::Max,
        }
    }
}

/// Everything the output merger needs to combine a fragment with the target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendState {
    pub enabled: bool,
    pub src_color: BlendFactor,
    pub src_alpha: BlendFactor,
    pub dst_color: BlendFactor,
    pub dst_alpha: BlendFactor,
    pub color_op: BlendOp,
    pub alpha_op: BlendOp,
    /// RGBA constant used by [`BlendFactor::Constant`].
    pub constant: [f32; 4],
}

impl BlendState {
    /// The part of the state that has to be baked into a pipeline. The
    /// constant color is set per pass instead.
    pub fn pipeline_key(&self) -> Option<wgpu::BlendState> {
        self.enabled.then(|| wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: self.src_color.to_wgpu(),
                dst_factor: self.dst_color.to_wgpu(),
                operation: self.color_op.to_wgpu(),
            },
            alpha: wgpu::BlendComponent {
                src_factor: self.src_alpha.to_wgpu(),
                dst_factor: self.dst_alpha.to_wgpu(),
                operation: self.alpha_op.to_wgpu(),
            },
        })
    }

    /// Constant color in the form `RenderPass::set_blend_constant` takes.
    pub fn constant_color(&self) -> wgpu::Color {
        let [r, g, b, a] = self.constant.map(f64::from);
        wgpu::Color { r, g, b, a }
    }
}

impl Default for BlendState {
    fn default() -> Self {
        BlendMode::Alpha.state()
    }
}

/// Named blend presets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    /// Blending off; the fragment overwrites the target.
    None,
    /// Standard straight-alpha blending.
    #[default]
    Alpha,
    /// Source added on top of the target, weighted by source alpha.
    Additive,
    /// Source color is already multiplied by its alpha.
    Premultiplied,
}

impl BlendMode {
    pub fn state(self) -> BlendState {
        use BlendFactor::*;
        let (enabled, src_color, src_alpha, dst_color, dst_alpha) = match self {
            BlendMode::None => (false, One, One, Zero, Zero),
            BlendMode::Alpha => (true, SrcColor, SrcAlpha, OneMinusSrcAlpha, OneMinusSrcAlpha),
            BlendMode::Additive => (true, SrcColor, SrcAlpha, One, One),
            BlendMode::Premultiplied => (true, One, One, OneMinusSrcAlpha, OneMinusSrcAlpha),
        };
        BlendState {
            enabled,
            src_color,
            src_alpha,
            dst_color,
            dst_alpha,
            color_op: BlendOp::Add,
            alpha_op: BlendOp::Add,
            constant: [0.0; 4],
        }
    }
}

impl From<BlendMode> for BlendState {
    fn from(mode: BlendMode) -> Self {
        mode.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_match_table() {
        let none = BlendMode::None.state();
        assert!(!none.enabled);
        assert_eq!((none.src_color, none.dst_color), (BlendFactor::One, BlendFactor::Zero));
        assert!(none.pipeline_key().is_none());

        let alpha = BlendMode::Alpha.state();
        assert!(alpha.enabled);
        assert_eq!(alpha.src_color, BlendFactor::SrcColor);
        assert_eq!(alpha.src_alpha, BlendFactor::SrcAlpha);
        assert_eq!(alpha.dst_color, BlendFactor::OneMinusSrcAlpha);
        assert_eq!(alpha.dst_alpha, BlendFactor::OneMinusSrcAlpha);

        let additive = BlendMode::Additive.state();
        assert_eq!((additive.dst_color, additive.dst_alpha), (BlendFactor::One, BlendFactor::One));

        let premul = BlendMode::Premultiplied.state();
        assert_eq!((premul.src_color, premul.src_alpha), (BlendFactor::One, BlendFactor::One));
        assert_eq!(premul.dst_color, BlendFactor::OneMinusSrcAlpha);
    }

    #[test]
    fn presets_add_with_zero_constant() {
        for mode in [BlendMode::None, BlendMode::Alpha, BlendMode::Additive, BlendMode::Premultiplied] {
            let s = mode.state();
            assert_eq!((s.color_op, s.alpha_op), (BlendOp::Add, BlendOp::Add));
            assert_eq!(s.constant, [0.0; 4]);
        }
    }

    #[test]
    fn wgpu_key_uses_mapped_factors() {
        let key = BlendMode::Additive.state().pipeline_key().unwrap();
        assert_eq!(key.color.src_factor, wgpu::BlendFactor::Src);
        assert_eq!(key.color.dst_factor, wgpu::BlendFactor::One);
        assert_eq!(key.alpha.src_factor, wgpu::BlendFactor::SrcAlpha);
    }
}
