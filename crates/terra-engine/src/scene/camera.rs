use glam::{DMat4, DVec3};

/// Look-at camera with perspective and orthographic projections.
///
/// World units are arbitrary; the defaults frame a unit globe centred at the
/// origin, seen from -Y with +Z up.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub eye: DVec3,
    pub target: DVec3,
    pub up: DVec3,

    /// Vertical field of view in radians.
    pub field_of_view_y: f64,
    pub perspective_near_plane_distance: f64,
    pub perspective_far_plane_distance: f64,

    pub orthographic_near_plane_distance: f64,
    pub orthographic_far_plane_distance: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: DVec3::NEG_Y,
            target: DVec3::ZERO,
            up: DVec3::Z,
            field_of_view_y: std::f64::consts::PI / 6.0,
            perspective_near_plane_distance: 0.01,
            perspective_far_plane_distance: 64.0,
            orthographic_near_plane_distance: 0.0,
            orthographic_far_plane_distance: 64.0,
        }
    }
}

impl Camera {
    /// Unit vector from eye towards target.
    pub fn forward(&self) -> DVec3 {
        (self.target - self.eye).normalize_or_zero()
    }

    pub fn right(&self) -> DVec3 {
        self.forward().cross(self.up).normalize_or_zero()
    }

    pub fn distance_to_target(&self) -> f64 {
        self.eye.distance(self.target)
    }

    /// Moves the eye along the view direction so a sphere of `radius` around
    /// the target fills the vertical field of view.
    pub fn zoom_to_target(&mut self, radius: f64) {
        let forward = self.forward();
        if forward == DVec3::ZERO {
            return;
        }
        let distance = radius / (0.5 * self.field_of_view_y).sin();
        self.eye = self.target - forward * distance;
    }

    pub fn view_matrix(&self) -> DMat4 {
        DMat4::look_at_rh(self.eye, self.target, self.up)
    }

    pub fn perspective_matrix(&self, aspect_ratio: f64) -> DMat4 {
        DMat4::perspective_rh(
            self.field_of_view_y,
            aspect_ratio,
            self.perspective_near_plane_distance,
            self.perspective_far_plane_distance,
        )
    }

    /// Orthographic projection whose vertical extent matches what the
    /// perspective projection shows at the target distance.
    pub fn orthographic_matrix(&self, aspect_ratio: f64) -> DMat4 {
        let half_height = self.distance_to_target() * (0.5 * self.field_of_view_y).tan();
        let half_width = half_height * aspect_ratio;
        DMat4::orthographic_rh(
            -half_width,
            half_width,
            -half_height,
            half_height,
            self.orthographic_near_plane_distance,
            self.orthographic_far_plane_distance,
        )
    }
}
