use std::f32::consts::{FRAC_1_PI, FRAC_PI_2, PI, TAU};

use crate::render::uniform::Uniforms;
use crate::render::RendererError;

use super::LinkAutomaticUniform;

/// A float uniform holding a constant.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkConstant {
    name: String,
    value: f32,
}

impl LinkConstant {
    pub fn new(name: impl Into<String>, value: f32) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

impl LinkAutomaticUniform for LinkConstant {
    fn name(&self) -> &str {
        &self.name
    }

    fn set(&self, uniforms: &mut Uniforms) -> Result<(), RendererError> {
        uniforms.set_by_name(&self.name, self.value)
    }
}

pub(super) fn constants() -> [LinkConstant; 5] {
    [
        LinkConstant::new("og_pi", PI),
        LinkConstant::new("og_oneOverPi", FRAC_1_PI),
        LinkConstant::new("og_halfPi", FRAC_PI_2),
        LinkConstant::new("og_twoPi", TAU),
        LinkConstant::new("og_oneOverTwoPi", 0.5 * FRAC_1_PI),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::uniform::{UniformLocation, UniformMember, UniformType};

    #[test]
    fn constant_rejects_non_float_declaration() {
        let mut u = Uniforms::from_members(&[UniformMember {
            name: "og_halfPi".into(),
            ty: UniformType::Int,
            location: UniformLocation(0),
        }]);
        let err = LinkConstant::new("og_halfPi", FRAC_PI_2).set(&mut u).unwrap_err();
        assert!(matches!(err, RendererError::UniformTypeMismatch { .. }));
    }

    #[test]
    fn one_over_two_pi() {
        let c = &constants()[4];
        assert_eq!(c.name(), "og_oneOverTwoPi");
        assert!((c.value * TAU - 1.0).abs() < 1e-6);
    }
}
