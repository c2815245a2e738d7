use glam::{Mat4, Vec3};

use crate::render::Context;

use super::{ComputedUniformFactory, DrawAutomaticUniformFactory};

pub(super) fn factories() -> Vec<Box<dyn DrawAutomaticUniformFactory>> {
    vec![
        Box::new(ComputedUniformFactory::<Mat4>::new("og_perspectiveMatrix", |c, r, s| {
            (c.clip_space_remap(r) * s.perspective_matrix(aspect(c))).as_mat4()
        })),
        Box::new(ComputedUniformFactory::<Mat4>::new("og_modelViewMatrix", |_, _, s| {
            s.model_view_matrix().as_mat4()
        })),
        Box::new(ComputedUniformFactory::<Mat4>::new(
            "og_modelViewPerspectiveMatrix",
            |c, r, s| (c.clip_space_remap(r) * s.model_view_perspective_matrix(aspect(c))).as_mat4(),
        )),
        Box::new(ComputedUniformFactory::<Mat4>::new(
            "og_modelViewOrthographicMatrix",
            |c, r, s| (c.clip_space_remap(r) * s.model_view_orthographic_matrix(aspect(c))).as_mat4(),
        )),
        Box::new(ComputedUniformFactory::<Vec3>::new("og_cameraEye", |_, _, s| {
            s.camera.eye.as_vec3()
        })),
        Box::new(ComputedUniformFactory::<Vec3>::new("og_sunPosition", |_, _, s| {
            s.sun_position.as_vec3()
        })),
        Box::new(ComputedUniformFactory::<Vec3>::new("og_cameraLightPosition", |_, _, s| {
            s.camera_light_position().as_vec3()
        })),
        Box::new(ComputedUniformFactory::<f32>::new(
            "og_perspectiveNearPlaneDistance",
            |_, _, s| s.camera.perspective_near_plane_distance as f32,
        )),
        Box::new(ComputedUniformFactory::<f32>::new(
            "og_perspectiveFarPlaneDistance",
            |_, _, s| s.camera.perspective_far_plane_distance as f32,
        )),
    ]
}

/// Aspect of the whole viewport; cropping is handled by the clip remap.
#[inline]
fn aspect(context: &Context) -> f64 {
    context.viewport().aspect_ratio()
}
