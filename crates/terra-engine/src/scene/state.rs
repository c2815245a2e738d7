use glam::{DMat4, DVec3, DVec4};

use crate::coords::Viewport;

use super::Camera;

/// Scene-wide inputs to automatic uniforms.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneState {
    pub camera: Camera,
    /// Sun position in world space.
    pub sun_position: DVec3,
    /// Model transform of the object being drawn.
    pub model_matrix: DMat4,
}

impl Default for SceneState {
    fn default() -> Self {
        Self {
            camera: Camera::default(),
            sun_position: DVec3::new(200_000.0, 0.0, 0.0),
            model_matrix: DMat4::IDENTITY,
        }
    }
}

impl SceneState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Light placed at the eye, the headlight used for camera-lit shading.
    #[inline]
    pub fn camera_light_position(&self) -> DVec3 {
        self.camera.eye
    }

    /// Maps NDC to window coordinates inside `viewport`.
    ///
    /// NDC x in [-1, 1] maps to [left, right], y in [-1, 1] maps to
    /// [bottom, top] (screen Y grows downward), and z in [0, 1] maps to
    /// [near, far].
    pub fn compute_viewport_transformation_matrix(viewport: Viewport, near: f64, far: f64) -> DMat4 {
        let half_width = viewport.width as f64 * 0.5;
        let half_height = viewport.height as f64 * 0.5;

        DMat4::from_cols(
            DVec4::new(half_width, 0.0, 0.0, 0.0),
            DVec4::new(0.0, -half_height, 0.0, 0.0),
            DVec4::new(0.0, 0.0, far - near, 0.0),
            DVec4::new(
                viewport.left() as f64 + half_width,
                viewport.top() as f64 + half_height,
                near,
                1.0,
            ),
        )
    }

    /// Orthographic projection of the viewport rectangle in pixels.
    ///
    /// Geometry given in framebuffer pixels (top-left origin) lands on the
    /// matching pixels of the viewport.
    pub fn compute_viewport_orthographic_matrix(viewport: Viewport) -> DMat4 {
        DMat4::orthographic_rh(
            viewport.left() as f64,
            viewport.right() as f64,
            viewport.bottom() as f64,
            viewport.top() as f64,
            0.0,
            1.0,
        )
    }

    /// Clip-space correction for rasterizing `viewport` through the smaller
    /// pass viewport `applied`, optionally mirroring depth (`z' = w - z`).
    ///
    /// Placed in front of a projection, every point keeps the framebuffer
    /// pixel and window depth it has under `viewport`; whatever falls
    /// outside `applied` is clipped. Identity when the two are equal and
    /// depth is not mirrored.
    pub fn compute_clip_remap(viewport: Viewport, applied: Viewport, mirror_depth: bool) -> DMat4 {
        let (vw, vh) = (viewport.width as f64, viewport.height as f64);
        let (aw, ah) = (applied.width.max(1) as f64, applied.height.max(1) as f64);

        let offset_x = (2.0 * (viewport.x - applied.x) as f64 + vw) / aw - 1.0;
        let offset_y = 1.0 - (2.0 * (viewport.y - applied.y) as f64 + vh) / ah;
        let (scale_z, offset_z) = if mirror_depth { (-1.0, 1.0) } else { (1.0, 0.0) };

        DMat4::from_cols(
            DVec4::new(vw / aw, 0.0, 0.0, 0.0),
            DVec4::new(0.0, vh / ah, 0.0, 0.0),
            DVec4::new(0.0, 0.0, scale_z, 0.0),
            DVec4::new(offset_x, offset_y, offset_z, 1.0),
        )
    }

    pub fn view_matrix(&self) -> DMat4 {
        self.camera.view_matrix()
    }

    pub fn perspective_matrix(&self, aspect_ratio: f64) -> DMat4 {
        self.camera.perspective_matrix(aspect_ratio)
    }

    pub fn orthographic_matrix(&self, aspect_ratio: f64) -> DMat4 {
        self.camera.orthographic_matrix(aspect_ratio)
    }

    pub fn model_view_matrix(&self) -> DMat4 {
        self.view_matrix() * self.model_matrix
    }

    pub fn model_view_perspective_matrix(&self, aspect_ratio: f64) -> DMat4 {
        self.perspective_matrix(aspect_ratio) * self.model_view_matrix()
    }

    pub fn model_view_orthographic_matrix(&self, aspect_ratio: f64) -> DMat4 {
        self.orthographic_matrix(aspect_ratio) * self.model_view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn close(a: DVec3, b: DVec3) -> bool {
        (a - b).length() < EPS
    }

    // ── viewport transformation ───────────────────────────────────────────

    #[test]
    fn viewport_transformation_maps_ndc_corners() {
        let vp = Viewport::new(10, 20, 200, 100);
        let m = SceneState::compute_viewport_transformation_matrix(vp, 0.0, 1.0);

        assert!(close(m.transform_point3(DVec3::new(-1.0, 1.0, 0.0)), DVec3::new(10.0, 20.0, 0.0)));
        assert!(close(m.transform_point3(DVec3::new(1.0, -1.0, 1.0)), DVec3::new(210.0, 120.0, 1.0)));
        assert!(close(m.transform_point3(DVec3::ZERO), DVec3::new(110.0, 70.0, 0.0)));
    }

    #[test]
    fn viewport_transformation_honours_depth_range() {
        let vp = Viewport::from_size(100, 100);
        let m = SceneState::compute_viewport_transformation_matrix(vp, 0.25, 0.75);

        assert!((m.transform_point3(DVec3::new(0.0, 0.0, 0.0)).z - 0.25).abs() < EPS);
        assert!((m.transform_point3(DVec3::new(0.0, 0.0, 1.0)).z - 0.75).abs() < EPS);
    }

    // ── viewport orthographic ─────────────────────────────────────────────

    #[test]
    fn viewport_orthographic_maps_pixels_to_ndc() {
        let vp = Viewport::new(0, 0, 800, 600);
        let m = SceneState::compute_viewport_orthographic_matrix(vp);

        let bottom_left = m.transform_point3(DVec3::new(0.0, 600.0, 0.0));
        let top_right = m.transform_point3(DVec3::new(800.0, 0.0, 0.0));
        assert!(close(bottom_left, DVec3::new(-1.0, -1.0, 0.0)));
        assert!(close(top_right, DVec3::new(1.0, 1.0, 0.0)));
    }

    #[test]
    fn orthographic_then_transformation_is_identity_on_pixels() {
        let vp = Viewport::new(5, 7, 320, 240);
        let ortho = SceneState::compute_viewport_orthographic_matrix(vp);
        let window = SceneState::compute_viewport_transformation_matrix(vp, 0.0, 1.0);

        let p = DVec3::new(100.0, 50.0, 0.0);
        assert!(close((window * ortho).transform_point3(p), p));
    }

    // ── clip remap ────────────────────────────────────────────────────────

    #[test]
    fn clip_remap_is_identity_for_the_same_viewport() {
        let vp = Viewport::new(3, 4, 640, 480);
        assert!(SceneState::compute_clip_remap(vp, vp, false).abs_diff_eq(DMat4::IDENTITY, EPS));
    }

    #[test]
    fn cropped_viewport_keeps_pixels_in_place() {
        // Target is 100x100; the viewport hangs off the right edge.
        let full = Viewport::new(0, 0, 200, 100);
        let applied = full.clamped_to(100, 100).unwrap();

        let ortho = SceneState::compute_viewport_orthographic_matrix(full);
        let remap = SceneState::compute_clip_remap(full, applied, false);
        let window = SceneState::compute_viewport_transformation_matrix(applied, 0.0, 1.0);

        let p = DVec3::new(80.0, 50.0, 0.0);
        assert!(close((window * remap * ortho).transform_point3(p), p));
    }

    #[test]
    fn cropped_on_every_side_keeps_pixels_in_place() {
        let full = Viewport::new(-40, -30, 300, 200);
        let applied = full.clamped_to(150, 120).unwrap();
        assert_eq!(applied, Viewport::new(0, 0, 150, 120));

        let ortho = SceneState::compute_viewport_orthographic_matrix(full);
        let remap = SceneState::compute_clip_remap(full, applied, false);
        let window = SceneState::compute_viewport_transformation_matrix(applied, 0.0, 1.0);

        for p in [DVec3::new(10.0, 20.0, 0.0), DVec3::new(149.0, 119.0, 0.0)] {
            assert!(close((window * remap * ortho).transform_point3(p), p));
        }
    }

    #[test]
    fn mirrored_depth_matches_an_inverted_range() {
        let vp = Viewport::from_size(64, 64);
        let inverted = SceneState::compute_viewport_transformation_matrix(vp, 0.9, 0.1);
        let ordered = SceneState::compute_viewport_transformation_matrix(vp, 0.1, 0.9);
        let remap = SceneState::compute_clip_remap(vp, vp, true);

        for z in [0.0, 0.3, 1.0] {
            let ndc = DVec3::new(0.5, -0.25, z);
            assert!(close(
                (ordered * remap).transform_point3(ndc),
                inverted.transform_point3(ndc)
            ));
        }
    }

    // ── camera matrices ───────────────────────────────────────────────────

    #[test]
    fn model_view_includes_model_matrix() {
        let mut scene = SceneState::new();
        scene.model_matrix = DMat4::from_translation(DVec3::new(0.0, 0.0, 0.5));

        let p = scene.model_view_matrix().transform_point3(DVec3::ZERO);
        let expected = scene.view_matrix().transform_point3(DVec3::new(0.0, 0.0, 0.5));
        assert!(close(p, expected));
    }

    #[test]
    fn target_projects_to_screen_centre() {
        let scene = SceneState::new();
        let p = scene
            .model_view_perspective_matrix(1.5)
            .project_point3(scene.camera.target);
        assert!(p.x.abs() < EPS && p.y.abs() < EPS);
        assert!(p.z > 0.0 && p.z < 1.0);
    }

    #[test]
    fn camera_light_is_at_the_eye() {
        let scene = SceneState::new();
        assert_eq!(scene.camera_light_position(), scene.camera.eye);
    }
}
