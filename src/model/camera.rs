use glam::{Mat4, Vec3, Vec4};

#[derive(Debug, Clone)]
pub struct Camera {
    pub eye: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub up: Vec3,
    pub fov_y: f32,
    pub aspect: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            eye: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            up: Vec3::Y,
            fov_y: 60f32.to_radians(),
            aspect: width as f32 / height.max(1) as f32,
            z_near: 1.0,
            z_far: 5000.0,
        }
    }

    pub fn forward(&self) -> Vec3 {
        let cy = self.yaw;
        let cp = self.pitch.clamp(-1.5533, 1.5533); // Slightly less than π/2 to avoid gimbal lock
        Vec3::new(cy.cos() * cp.cos(), cp.sin(), cy.sin() * cp.cos()).normalize()
    }

    /// Screen-right direction; mirrors when the up vector is flipped
    pub fn right(&self) -> Vec3 {
        self.forward().cross(self.up).normalize()
    }

    pub fn target(&self) -> Vec3 { self.eye + self.forward() }

    pub fn set_aspect(&mut self, width: u32, height: u32) { self.aspect = width as f32 / height.max(1) as f32; }

    pub fn view_proj(&self) -> Mat4 {
        let view = Mat4::look_at_rh(self.eye, self.target(), self.up);
        let proj = Mat4::perspective_rh(self.fov_y, self.aspect, self.z_near, self.z_far);
        proj * view
    }

    pub fn set_look_at(&mut self, target: Vec3) {
        let dir = (target - self.eye).normalize();
        self.yaw = dir.z.atan2(dir.x);
        self.pitch = dir.y.asin().clamp(-1.4, 1.4);
    }

    /// Maps camera-local space (x right, y up, z forward) to world space
    pub fn world_matrix(&self) -> Mat4 {
        let forward = self.forward();
        let right = self.right();
        let up = right.cross(forward);
        Mat4::from_cols(
            right.extend(0.0),
            up.extend(0.0),
            forward.extend(0.0),
            Vec4::new(self.eye.x, self.eye.y, self.eye.z, 1.0),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn look_at_points_forward_at_target() {
        let mut cam = Camera::new(800, 600);
        cam.eye = Vec3::new(0.0, 10.0, 0.0);
        cam.set_look_at(Vec3::new(0.0, 10.0, 50.0));
        assert!((cam.forward() - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn flipping_up_mirrors_right() {
        let mut cam = Camera::new(800, 600);
        let right = cam.right();
        cam.up = -cam.up;
        assert!((cam.right() + right).length() < 1e-5);
    }

    #[test]
    fn world_matrix_places_local_offsets() {
        let mut cam = Camera::new(800, 600);
        cam.eye = Vec3::new(1.0, 2.0, 3.0);
        let m = cam.world_matrix();
        let ahead = m.transform_point3(Vec3::new(0.0, 0.0, 10.0));
        assert!((ahead - (cam.eye + cam.forward() * 10.0)).length() < 1e-4);
        let above = m.transform_point3(Vec3::new(0.0, 5.0, 0.0));
        assert!((above - (cam.eye + Vec3::Y * 5.0)).length() < 1e-4);
    }
}
