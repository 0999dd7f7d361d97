use glam::{Mat4, Vec3, Vec4};

#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_radians: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }
    pub fn proj(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_radians, aspect, self.near, self.far)
    }
    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        self.proj(aspect) * self.view()
    }
    pub fn position(&self) -> Vec3 {
        self.eye
    }

    /// World-space corners of the view frustum between two view depths,
    /// near quad first.
    pub fn slice_corners(&self, aspect: f32, near: f32, far: f32) -> [Vec3; 8] {
        let inv_view = self.view().inverse();
        let tan_half = (self.fov_y_radians * 0.5).tan();
        let mut corners = [Vec3::ZERO; 8];
        for (slot, depth) in [near, far].into_iter().enumerate() {
            let half_h = depth * tan_half;
            let half_w = half_h * aspect;
            let quad = [
                Vec3::new(-half_w, -half_h, -depth),
                Vec3::new(half_w, -half_h, -depth),
                Vec3::new(half_w, half_h, -depth),
                Vec3::new(-half_w, half_h, -depth),
            ];
            for (i, corner) in quad.into_iter().enumerate() {
                corners[slot * 4 + i] = inv_view.transform_point3(corner);
            }
        }
        corners
    }

    /// Normalized frustum planes (`xyz` normal pointing inwards, `w` offset).
    pub fn frustum_planes(&self, aspect: f32) -> [Vec4; 6] {
        let m = self.view_proj(aspect);
        let (r0, r1, r2, r3) = (m.row(0), m.row(1), m.row(2), m.row(3));
        // depth is [0, 1], so the near plane is the z row alone
        [r3 + r0, r3 - r0, r3 + r1, r3 - r1, r2, r3 - r2].map(|plane| {
            let length = plane.truncate().length();
            if length > 0.0 {
                plane / length
            } else {
                plane
            }
        })
    }

    pub fn sees_sphere(&self, aspect: f32, center: Vec3, radius: f32) -> bool {
        self.frustum_planes(aspect)
            .iter()
            .all(|plane| plane.truncate().dot(center) + plane.w >= -radius)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, 3.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y_radians: 60f32.to_radians(),
            near: 0.1,
            far: 100.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn view_proj_is_reasonable() {
        let cam = Camera::default();
        let vp = cam.view_proj(16.0 / 9.0);
        let inv = vp.inverse();
        let id = vp * inv;
        let eps = 1e-4;
        assert!(id.abs_diff_eq(Mat4::IDENTITY, eps));
    }

    #[test]
    fn slice_corners_lie_on_requested_depths() {
        let cam = Camera::default();
        let corners = cam.slice_corners(1.0, 1.0, 10.0);
        let forward = (cam.target - cam.eye).normalize();
        for corner in &corners[..4] {
            assert!(((*corner - cam.eye).dot(forward) - 1.0).abs() < 1e-4);
        }
        for corner in &corners[4..] {
            assert!(((*corner - cam.eye).dot(forward) - 10.0).abs() < 1e-3);
        }
    }

    #[test]
    fn frustum_rejects_sphere_behind_camera() {
        let cam = Camera::default();
        assert!(cam.sees_sphere(1.0, Vec3::ZERO, 0.5));
        assert!(!cam.sees_sphere(1.0, Vec3::new(0.0, 0.0, 20.0), 1.0));
        assert!(cam.sees_sphere(1.0, Vec3::new(0.0, 0.0, 5.0), 3.0));
    }
}
