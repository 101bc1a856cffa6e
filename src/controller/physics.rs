use glam::Vec3;
use crate::model::Scene;
use crate::utils::Aabb;

/// Collision response for the player camera: slides against solid nodes and
/// pulls along the Y axis with a signed gravity
pub struct GravityCollider {
    /// Half extents of the collision volume around the camera eye
    pub radius: Vec3,
    /// Signed acceleration along Y (units/s²)
    pub gravity: f32,
    pub max_fall_speed: f32,
    velocity: f32,
    falling: bool,
}

impl GravityCollider {
    pub fn new(radius: Vec3, gravity: f32, max_fall_speed: f32) -> Self {
        Self {
            radius,
            gravity,
            max_fall_speed,
            velocity: 0.0,
            falling: false,
        }
    }

    pub fn set_gravity(&mut self, gravity: f32) {
        self.gravity = gravity;
    }

    /// Airborne and moving with gravity
    pub fn is_falling(&self) -> bool {
        self.falling
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    /// Launch away from the surface the player stands on
    pub fn jump(&mut self, speed: f32) {
        if !self.falling {
            self.velocity = -self.gravity.signum() * speed;
            self.falling = true;
        }
    }

    fn body_at(&self, pos: Vec3) -> Aabb {
        Aabb::from_center(pos, self.radius)
    }

    /// Move `pos` by the horizontal `motion` and gravity for one step
    pub fn update(&mut self, pos: &mut Vec3, motion: Vec3, world: &Scene, dt: f32) {
        // Apply gravity
        self.velocity += self.gravity * dt;
        self.velocity = self.velocity.clamp(-self.max_fall_speed, self.max_fall_speed);

        // Vertical collision
        let new_y = pos.y + self.velocity * dt;
        let probe = self.body_at(Vec3::new(pos.x, new_y, pos.z));
        match world.first_overlap(&probe) {
            Some(node) => {
                let moving_with_gravity = self.velocity * self.gravity > 0.0;
                if self.velocity < 0.0 {
                    pos.y = node.bounds.max.y + self.radius.y;
                } else {
                    pos.y = node.bounds.min.y - self.radius.y;
                }
                self.velocity = 0.0;
                // Hitting the surface we fall toward lands us; bumping the other way keeps us airborne
                self.falling = !moving_with_gravity;
            }
            None => {
                pos.y = new_y;
                self.falling = true;
            }
        }

        // Horizontal collision (simple axis-aligned)
        let x_next = Vec3::new(pos.x + motion.x, pos.y, pos.z);
        if world.first_overlap(&self.body_at(x_next)).is_none() {
            pos.x = x_next.x;
        }

        let z_next = Vec3::new(pos.x, pos.y, pos.z + motion.z);
        if world.first_overlap(&self.body_at(z_next)).is_none() {
            pos.z = z_next.z;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRAVITY: f32 = -981.0;

    fn floor_and_ceiling() -> Scene {
        let mut scene = Scene::new();
        scene.add_static("floor", Aabb::new(Vec3::new(-500.0, -100.0, -500.0), Vec3::new(500.0, -60.0, 500.0)), [1.0; 4]);
        scene.add_static("ceiling", Aabb::new(Vec3::new(-500.0, 600.0, -500.0), Vec3::new(500.0, 700.0, 500.0)), [1.0; 4]);
        scene.add_static("pillar", Aabb::new(Vec3::new(100.0, -60.0, -50.0), Vec3::new(200.0, 600.0, 50.0)), [1.0; 4]);
        scene
    }

    fn settle(collider: &mut GravityCollider, pos: &mut Vec3, scene: &Scene, seconds: f32) {
        let steps = (seconds / 0.01) as usize;
        for _ in 0..steps {
            collider.update(pos, Vec3::ZERO, scene, 0.01);
        }
    }

    #[test]
    fn rests_on_floor() {
        let scene = floor_and_ceiling();
        let mut c = GravityCollider::new(Vec3::new(30.0, 60.0, 30.0), GRAVITY, 2500.0);
        let mut pos = Vec3::new(0.0, 200.0, 0.0);
        settle(&mut c, &mut pos, &scene, 2.0);
        assert!((pos.y - 0.0).abs() < 1e-3);
        assert!(!c.is_falling());
    }

    #[test]
    fn reversed_gravity_lands_on_ceiling() {
        let scene = floor_and_ceiling();
        let mut c = GravityCollider::new(Vec3::new(30.0, 60.0, 30.0), GRAVITY, 2500.0);
        let mut pos = Vec3::ZERO;
        settle(&mut c, &mut pos, &scene, 0.5);
        c.set_gravity(-GRAVITY);
        c.update(&mut pos, Vec3::ZERO, &scene, 0.01);
        assert!(c.is_falling());
        settle(&mut c, &mut pos, &scene, 2.0);
        assert!((pos.y - 540.0).abs() < 1e-3);
        assert!(!c.is_falling());
    }

    #[test]
    fn walls_block_horizontal_motion() {
        let scene = floor_and_ceiling();
        let mut c = GravityCollider::new(Vec3::new(30.0, 60.0, 30.0), GRAVITY, 2500.0);
        let mut pos = Vec3::ZERO;
        for _ in 0..100 {
            c.update(&mut pos, Vec3::new(5.0, 0.0, 0.0), &scene, 0.01);
        }
        assert!(pos.x <= 70.0);
        assert!(pos.x > 60.0);
    }

    #[test]
    fn jump_leaves_the_ground() {
        let scene = floor_and_ceiling();
        let mut c = GravityCollider::new(Vec3::new(30.0, 60.0, 30.0), GRAVITY, 2500.0);
        let mut pos = Vec3::ZERO;
        settle(&mut c, &mut pos, &scene, 0.1);
        c.jump(400.0);
        c.update(&mut pos, Vec3::ZERO, &scene, 0.01);
        assert!(pos.y > 0.0);
        assert!(c.is_falling());
    }
}
