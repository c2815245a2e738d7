use glam::{Mat4, Vec4};

use crate::render::{Context, RenderState};
use crate::scene::SceneState;

use super::{ComputedUniformFactory, DrawAutomaticUniformFactory};

pub(super) fn factories() -> Vec<Box<dyn DrawAutomaticUniformFactory>> {
    vec![
        Box::new(ComputedUniformFactory::<Mat4>::new(
            "og_viewportTransformationMatrix",
            viewport_transformation_matrix,
        )),
        Box::new(ComputedUniformFactory::<Mat4>::new(
            "og_viewportOrthographicMatrix",
            viewport_orthographic_matrix,
        )),
        Box::new(ComputedUniformFactory::<Vec4>::new("og_viewport", viewport)),
    ]
}

/// Maps NDC to the window pixels actually rasterized, with the depth range
/// given to the pass.
fn viewport_transformation_matrix(context: &Context, state: &RenderState, _: &SceneState) -> Mat4 {
    let (min_depth, max_depth) = state.pass_depth_range();
    SceneState::compute_viewport_transformation_matrix(
        context.applied_viewport(),
        min_depth as f64,
        max_depth as f64,
    )
    .as_mat4()
}

fn viewport_orthographic_matrix(context: &Context, state: &RenderState, _: &SceneState) -> Mat4 {
    let ortho = SceneState::compute_viewport_orthographic_matrix(context.viewport());
    (context.clip_space_remap(state) * ortho).as_mat4()
}

fn viewport(context: &Context, _: &RenderState, _: &SceneState) -> Vec4 {
    let v = context.viewport();
    Vec4::new(v.x as f32, v.y as f32, v.width as f32, v.height as f32)
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::coords::Viewport;
    use crate::render::DepthRange;

    #[test]
    fn transformation_uses_render_state_depth_range() {
        let context = Context::new(Viewport::from_size(100, 50));
        let mut state = RenderState::default();
        state.depth_range = DepthRange { near: 0.5, far: 1.0 };

        let m = viewport_transformation_matrix(&context, &state, &SceneState::new());

        let p = m.transform_point3(Vec3::new(-1.0, 1.0, 0.0));
        assert_eq!(p, Vec3::new(0.0, 0.0, 0.5));
    }

    #[test]
    fn orthographic_maps_viewport_corner_to_ndc() {
        let context = Context::new(Viewport::from_size(200, 100));
        let m = viewport_orthographic_matrix(&context, &RenderState::default(), &SceneState::new());

        let p = m.transform_point3(Vec3::new(200.0, 0.0, 0.0));
        assert!((p - Vec3::new(1.0, 1.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn inverted_depth_range_mirrors_window_depth() {
        let context = Context::new(Viewport::from_size(64, 64));
        let mut state = RenderState::default();
        state.depth_range = DepthRange { near: 1.0, far: 0.0 };

        let ortho = viewport_orthographic_matrix(&context, &state, &SceneState::new());
        let window = viewport_transformation_matrix(&context, &state, &SceneState::new());

        // z = 0 in pixel space is the near plane, which the range puts at 1.
        let p = window.transform_point3(ortho.transform_point3(Vec3::new(32.0, 32.0, 0.0)));
        assert!((p - Vec3::new(32.0, 32.0, 1.0)).length() < 1e-5, "{p}");
    }
}
