use glam::Vec3;
use crate::model::Camera;

/// First-person look and walk animator for the player camera
pub struct CameraController {
    pub move_speed: f32,
    pub mouse_sensitivity: f32,
    /// Inverted look for upside-down play
    pub invert_mouse: bool,
}

impl CameraController {
    pub fn new(move_speed: f32, mouse_sensitivity: f32) -> Self {
        Self {
            move_speed,
            mouse_sensitivity,
            invert_mouse: false,
        }
    }

    /// Apply mouse look delta to camera
    pub fn apply_look(&self, camera: &mut Camera, dx: f32, dy: f32) {
        let sign = if self.invert_mouse { -1.0 } else { 1.0 };
        camera.yaw += dx * self.mouse_sensitivity * sign;
        let pi_half = std::f32::consts::PI / 2.0;
        camera.pitch = (camera.pitch - dy * self.mouse_sensitivity * sign).clamp(-pi_half, pi_half);
    }

    /// Horizontal displacement for this frame from (forward, strafe) intent
    pub fn movement(&self, camera: &Camera, forward: f32, strafe: f32, dt: f32) -> Vec3 {
        let flat = |v: Vec3| Vec3::new(v.x, 0.0, v.z).normalize_or_zero();
        let cam_move = flat(camera.forward()) * forward + flat(camera.right()) * strafe;

        if cam_move.length_squared() > 0.0 {
            cam_move.normalize() * self.move_speed * dt
        } else {
            Vec3::ZERO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverted_look_turns_the_other_way() {
        let mut cam = Camera::new(800, 600);
        let mut ctl = CameraController::new(300.0, 0.01);
        ctl.apply_look(&mut cam, 10.0, 5.0);
        assert!((cam.yaw - 0.1).abs() < 1e-6);
        assert!((cam.pitch + 0.05).abs() < 1e-6);

        ctl.invert_mouse = true;
        ctl.apply_look(&mut cam, 10.0, 5.0);
        assert!(cam.yaw.abs() < 1e-6);
        assert!(cam.pitch.abs() < 1e-6);
    }

    #[test]
    fn movement_stays_horizontal_at_walk_speed() {
        let mut cam = Camera::new(800, 600);
        cam.pitch = 0.8;
        let ctl = CameraController::new(300.0, 0.002);
        let m = ctl.movement(&cam, 1.0, 1.0, 0.5);
        assert_eq!(m.y, 0.0);
        assert!((m.length() - 150.0).abs() < 1e-3);
        assert_eq!(ctl.movement(&cam, 0.0, 0.0, 0.5), Vec3::ZERO);
    }
}
