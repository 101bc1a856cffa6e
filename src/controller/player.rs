use glam::{Mat4, Vec3};
use tracing::{debug, error, info};

use crate::config::{PlayerTuning, RoundRules};
use crate::controller::camera_controller::CameraController;
use crate::controller::input::{InputProcessor, InputState};
use crate::controller::physics::GravityCollider;
use crate::model::{BreakableId, Camera, LightingPreset, NodeTags, RoundOutcome, Scene, SharedContext};
use crate::utils::Transform;

const SPECTATOR_PIVOT: Vec3 = Vec3::new(0.0, 1000.0, 2000.0);
const SPECTATOR_ARM: Vec3 = Vec3::new(0.0, 0.0, 1000.0);
const SPECTATOR_LOOK_DROP: Vec3 = Vec3::new(0.0, -500.0, 0.0);

/// Which camera the scene is viewed through. The player is in control only
/// while `Player` is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveCamera {
    Spectator,
    Player,
}

/// Orbiting camera shown while nobody is playing
pub struct SpectatorRig {
    pub pivot: Transform,
    pub camera: Camera,
    /// Accumulated orbit angle in degrees
    spin: f32,
}

impl SpectatorRig {
    fn new(far_plane: f32) -> Self {
        let mut rig = Self {
            pivot: Transform::at(SPECTATOR_PIVOT),
            camera: Camera::new(16, 9),
            spin: 0.0,
        };
        rig.camera.z_far = far_plane;
        rig.place_camera();
        rig
    }

    fn update(&mut self, spin_speed: f32, dt: f32) {
        self.pivot.rotation.y -= self.spin;
        self.spin += spin_speed * dt;
        self.pivot.rotation.y += self.spin;
        self.place_camera();
    }

    fn place_camera(&mut self) {
        self.camera.eye = self.pivot.matrix().transform_point3(SPECTATOR_ARM);
        self.camera.set_look_at(self.pivot.position + SPECTATOR_LOOK_DROP);
    }

    pub fn spin(&self) -> f32 {
        self.spin
    }
}

/// Gun held in front of the camera; flips with gravity
pub struct GunRig {
    pub node: Transform,
    /// Roll applied on top of the base pose, in [0, max_rotation] degrees
    pub rotation_offset: f32,
    /// Vertical slide applied on top of the base pose, in [-max, max] units
    pub translation_offset: f32,
}

/// Beam shown while shooting, child of the gun
pub struct RayBeam {
    pub node: Transform,
    pub length: f32,
}

/// Point light on the gun
pub struct GunLight {
    pub node: Transform,
    pub radius: f32,
}

/// First-person player: camera, gravity collider, gun, ray and light
pub struct PlayerController {
    tuning: PlayerTuning,
    rules: RoundRules,
    bindings: InputProcessor,

    camera: Camera,
    look: CameraController,
    collider: GravityCollider,
    spectator: SpectatorRig,
    active: ActiveCamera,

    gun: GunRig,
    ray: RayBeam,
    light: GunLight,

    gravity: f32,
    mouse_inverted: bool,
    gravity_timer: f32,
    falling_timer: f32,
}

impl PlayerController {
    pub fn new(tuning: &PlayerTuning, rules: &RoundRules, bindings: InputProcessor) -> Self {
        let mut camera = Camera::new(16, 9);
        camera.eye = tuning.spawn_position;
        camera.z_far = tuning.far_plane;

        let gun = GunRig {
            node: Transform::at(Vec3::new(5.0, 0.0, 15.0)).with_rotation(Vec3::new(0.0, 180.0, 0.0)),
            rotation_offset: 0.0,
            translation_offset: 0.0,
        };
        let ray = RayBeam {
            node: Transform::at(Vec3::new(0.0, 0.0, -7.0))
                .with_rotation(Vec3::new(0.0, 180.0, 0.0))
                .with_scale(Vec3::new(0.5, 0.5, 1.0))
                .hidden(),
            length: 0.0,
        };
        let light = GunLight {
            node: Transform::at(Vec3::new(0.0, 10.0, 10.0)).hidden(),
            radius: tuning.light_radius,
        };

        Self {
            tuning: tuning.clone(),
            rules: rules.clone(),
            bindings,
            camera,
            look: CameraController::new(tuning.move_speed, tuning.look_sensitivity),
            collider: GravityCollider::new(
                tuning.collider_radius,
                tuning.gravity * tuning.gravity_scale,
                tuning.max_fall_speed,
            ),
            spectator: SpectatorRig::new(tuning.far_plane),
            active: ActiveCamera::Spectator,
            gun,
            ray,
            light,
            gravity: tuning.gravity,
            mouse_inverted: false,
            gravity_timer: 0.0,
            falling_timer: 0.0,
        }
    }

    /// Hand control to the player camera
    pub fn activate(&mut self) {
        if self.active != ActiveCamera::Player {
            info!("player camera active");
            self.active = ActiveCamera::Player;
        }
    }

    pub fn is_playing(&self) -> bool {
        self.active == ActiveCamera::Player
    }

    pub fn active_camera(&self) -> ActiveCamera {
        self.active
    }

    /// Camera the scene should be rendered from
    pub fn view_camera(&self) -> &Camera {
        match self.active {
            ActiveCamera::Player => &self.camera,
            ActiveCamera::Spectator => &self.spectator.camera,
        }
    }

    pub fn camera(&self) -> &Camera { &self.camera }
    pub fn spectator(&self) -> &SpectatorRig { &self.spectator }
    pub fn gun(&self) -> &GunRig { &self.gun }
    pub fn ray(&self) -> &RayBeam { &self.ray }
    pub fn light(&self) -> &GunLight { &self.light }
    pub fn gravity(&self) -> f32 { self.gravity }
    pub fn mouse_inverted(&self) -> bool { self.mouse_inverted }
    pub fn is_falling(&self) -> bool { self.collider.is_falling() }

    pub fn gun_world_matrix(&self) -> Mat4 {
        self.camera.world_matrix() * self.gun.node.matrix()
    }

    pub fn ray_world_matrix(&self) -> Mat4 {
        self.gun_world_matrix() * self.ray.node.matrix()
    }

    pub fn light_world_position(&self) -> Vec3 {
        self.gun_world_matrix().transform_point3(self.light.node.position)
    }

    pub fn is_shooting(&self, input: &InputState) -> bool {
        self.bindings.is_shooting(input)
    }

    pub fn is_lighting(&self, input: &InputState) -> bool {
        self.bindings.is_lighting(input)
    }

    /// Advance one frame
    pub fn update(&mut self, ctx: &mut SharedContext, input: &mut InputState, scene: &mut Scene) {
        let dt = ctx.delta_time();

        if !self.is_playing() {
            self.spectator.update(self.tuning.spectator_spin_speed, dt);
            return;
        }

        self.move_camera(input, scene, dt);

        self.gravity_timer += dt;
        if self.collider.is_falling() {
            self.falling_timer += dt;
        } else {
            self.falling_timer = 0.0;
        }

        self.update_gun(dt);
        self.update_ray(input, scene, dt);
        self.update_light(input);

        self.check_win(ctx);
        self.check_death(ctx);
    }

    fn move_camera(&mut self, input: &mut InputState, scene: &Scene, dt: f32) {
        let (dx, dy) = input.consume_look();
        self.look.apply_look(&mut self.camera, dx, dy);

        let (forward, strafe) = self.bindings.move_intent(input);
        let motion = self.look.movement(&self.camera, forward, strafe, dt);
        if self.bindings.is_jumping(input) {
            self.collider.jump(self.tuning.jump_speed);
        }
        self.collider.update(&mut self.camera.eye, motion, scene, dt);
    }

    /// Flip gravity if the last flip is old enough. Returns whether it flipped.
    pub fn reverse(&mut self) -> bool {
        if self.gravity_timer < self.tuning.reverse_cooldown {
            return false;
        }

        self.mouse_inverted = !self.mouse_inverted;
        self.gravity_timer = 0.0;
        self.gravity = -self.gravity;
        self.collider.set_gravity(self.gravity * self.tuning.gravity_scale);

        self.camera.up = -self.camera.up;
        self.look.invert_mouse = self.mouse_inverted;

        info!(gravity = self.gravity, "gravity reversed");
        true
    }

    /// Reversal is only accepted right after leaving a surface
    pub fn can_reverse(&self) -> bool {
        self.falling_timer <= self.tuning.max_reverse_fall_time
    }

    fn update_gun(&mut self, dt: f32) {
        self.rotate_gun(dt);
        self.translate_gun(dt);
    }

    fn rotate_gun(&mut self, dt: f32) {
        self.gun.node.rotation.z -= self.gun.rotation_offset;

        let step = self.tuning.gun_rotation_speed * dt;
        self.gun.rotation_offset = if self.gravity > 0.0 {
            (self.gun.rotation_offset + step).min(self.tuning.gun_max_rotation)
        } else {
            (self.gun.rotation_offset - step).max(0.0)
        };

        self.gun.node.rotation.z += self.gun.rotation_offset;
    }

    fn translate_gun(&mut self, dt: f32) {
        self.gun.node.position.y -= self.gun.translation_offset;

        let step = self.tuning.gun_translation_speed * dt;
        let max = self.tuning.gun_max_translation;
        self.gun.translation_offset = if self.gravity > 0.0 {
            (self.gun.translation_offset + step).min(max)
        } else {
            (self.gun.translation_offset - step).max(-max)
        };

        self.gun.node.position.y += self.gun.translation_offset;
    }

    fn update_ray(&mut self, input: &InputState, scene: &mut Scene, dt: f32) {
        let shooting = self.is_shooting(input);
        self.ray.node.visible = shooting;

        self.update_ray_length(shooting, dt);
        if self.ray.node.visible {
            if let Some(id) = self.update_ray_collider(scene) {
                debug!(?id, "ray broke object");
            }
        }
    }

    fn update_ray_length(&mut self, shooting: bool, dt: f32) {
        if shooting {
            self.ray.length = (self.ray.length + self.tuning.ray_growth_speed * dt)
                .clamp(0.0, self.tuning.ray_max_length);
        } else {
            self.ray.length = 0.0;
        }

        self.ray.node.scale.z = self.ray.length;
    }

    /// Destroy the breakable under the crosshair, if any
    fn update_ray_collider(&self, scene: &mut Scene) -> Option<BreakableId> {
        let origin = self.camera.eye;
        let direction = (self.camera.target() - origin).normalize();
        let hit = scene.raycast(origin, direction, self.tuning.ray_max_length)?;

        let node = scene.node(hit.node)?;
        if !node.tags.contains(NodeTags::ACTIVABLE) || node.wireframe {
            return None;
        }

        let breakable = scene.breakable_for_node(hit.node)?;
        scene.destroy_breakable(breakable).then_some(breakable)
    }

    fn update_light(&mut self, input: &InputState) {
        self.light.node.visible = self.is_lighting(input);
    }

    fn check_win(&self, ctx: &mut SharedContext) {
        if ctx.game_info.player_failed {
            return;
        }

        let near_goal = self.camera.eye.distance(self.rules.goal) <= self.rules.goal_radius;
        if near_goal && !self.collider.is_falling() {
            let score = ctx.game_info.current_score.max(0.0).round() as u32;
            info!(score, "goal reached");
            if let Err(e) = ctx.score_log.append(score) {
                error!("failed to record score: {e}");
            }
            Self::kill(ctx, RoundOutcome::Won);
        }
    }

    fn check_death(&self, ctx: &mut SharedContext) {
        let y = self.camera.eye.y;
        if y < self.rules.kill_min_y || y > self.rules.kill_max_y || ctx.game_info.current_score == 0.0 {
            Self::kill(ctx, RoundOutcome::Died);
        }
    }

    /// End the round. Only the first call per round has any effect.
    pub fn kill(ctx: &mut SharedContext, outcome: RoundOutcome) -> bool {
        if ctx.game_info.player_failed {
            return false;
        }

        debug!(?outcome, "round over");
        ctx.game_info.player_failed = true;
        ctx.game_info.outcome = outcome;
        ctx.lighting = LightingPreset::Spectate;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::input::{InputEvent, MouseButton};
    use crate::model::ScoreLog;
    use crate::utils::Aabb;
    use std::fs;

    struct Rig {
        _dir: tempfile::TempDir,
        ctx: SharedContext,
        scene: Scene,
        player: PlayerController,
        input: InputState,
    }

    impl Rig {
        fn with_scene(scene: Scene, rules: RoundRules) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let log = ScoreLog::new(dir.path().join("data.txt"));
            let ctx = SharedContext::new(log, rules.starting_score);
            let mut player = PlayerController::new(&PlayerTuning::default(), &rules, InputProcessor::default());
            player.activate();
            Self { _dir: dir, ctx, scene, player, input: InputState::new() }
        }

        fn level() -> Self {
            let rules = RoundRules::default();
            let mut scene = Scene::new();
            scene.setup(rules.goal);
            Self::with_scene(scene, rules)
        }

        fn tick(&mut self, dt: f32) {
            self.ctx.timing.delta_time = dt;
            self.player.update(&mut self.ctx, &mut self.input, &mut self.scene);
        }

        fn ticks(&mut self, dt: f32, n: usize) {
            for _ in 0..n {
                self.tick(dt);
            }
        }

        fn press(&mut self, button: MouseButton, down: bool) {
            self.input.process_event(&InputEvent::MouseClick { button, is_down: down });
        }

        fn logged_scores(&self) -> Vec<String> {
            fs::read_to_string(self.ctx.score_log.path())
                .unwrap_or_default()
                .split_whitespace()
                .map(str::to_string)
                .collect()
        }
    }

    fn floor_under(center: Vec3) -> Aabb {
        Aabb::new(center - Vec3::new(300.0, 160.0, 300.0), center + Vec3::new(300.0, -60.0, 300.0))
    }

    #[test]
    fn spectates_until_activated() {
        let mut player = PlayerController::new(&PlayerTuning::default(), &RoundRules::default(), InputProcessor::default());
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = SharedContext::new(ScoreLog::new(dir.path().join("s.txt")), 100.0);
        let mut scene = Scene::new();
        let mut input = InputState::new();
        assert!(!player.is_playing());
        let eye_before = player.view_camera().eye;

        ctx.timing.delta_time = 0.5;
        player.update(&mut ctx, &mut input, &mut scene);
        assert!((player.spectator().spin() - 10.0).abs() < 1e-4);
        assert!((player.spectator().pivot.rotation.y - 10.0).abs() < 1e-4);
        assert_ne!(player.view_camera().eye, eye_before);
        assert!(!ctx.game_info.player_failed);

        player.activate();
        assert!(player.is_playing());
        assert_eq!(player.active_camera(), ActiveCamera::Player);
        assert_eq!(player.view_camera().eye, player.camera().eye);
    }

    #[test]
    fn reversal_is_debounced() {
        let mut rig = Rig::level();
        rig.ticks(0.125, 3);
        let up = rig.player.camera().up;
        assert!(!rig.player.reverse());
        assert_eq!(rig.player.gravity(), -9.81);
        assert!(!rig.player.mouse_inverted());
        assert_eq!(rig.player.camera().up, up);

        rig.tick(0.125);
        assert!(rig.player.reverse());
        assert_eq!(rig.player.gravity(), 9.81);
        assert!(rig.player.mouse_inverted());
        assert_eq!(rig.player.camera().up, -up);
        assert!(rig.player.look.invert_mouse);

        // Timer restarted
        assert!(!rig.player.reverse());
        assert_eq!(rig.player.gravity(), 9.81);

        rig.ticks(0.125, 4);
        assert!(rig.player.reverse());
        assert_eq!(rig.player.gravity(), -9.81);
        assert!(!rig.player.mouse_inverted());
        assert_eq!(rig.player.camera().up, up);
    }

    #[test]
    fn can_reverse_only_shortly_after_leaving_ground() {
        let mut rig = Rig::level();
        rig.ticks(0.125, 4);
        assert!(rig.player.can_reverse());
        assert!(!rig.player.is_falling());

        assert!(rig.player.reverse());
        rig.ticks(0.05, 2);
        assert!(rig.player.is_falling());
        assert!(rig.player.can_reverse());

        rig.ticks(0.05, 4);
        assert!(!rig.player.can_reverse());
    }

    #[test]
    fn gun_pose_tracks_gravity_within_bounds() {
        let mut rig = Rig::level();
        let base_y = rig.player.gun().node.position.y;

        rig.ticks(0.1, 10);
        assert_eq!(rig.player.gun().rotation_offset, 0.0);
        assert_eq!(rig.player.gun().translation_offset, -7.0);
        assert!((rig.player.gun().node.position.y - (base_y - 7.0)).abs() < 1e-4);

        assert!(rig.player.reverse());
        let mut last = (rig.player.gun().rotation_offset, rig.player.gun().translation_offset);
        for _ in 0..10 {
            rig.tick(0.1);
            let gun = rig.player.gun();
            assert!((0.0..=180.0).contains(&gun.rotation_offset));
            assert!((-7.0..=7.0).contains(&gun.translation_offset));
            assert!(gun.rotation_offset >= last.0);
            assert!(gun.translation_offset >= last.1);
            last = (gun.rotation_offset, gun.translation_offset);
        }
        let gun = rig.player.gun();
        assert_eq!(gun.rotation_offset, 180.0);
        assert_eq!(gun.translation_offset, 7.0);
        assert!((gun.node.rotation.z - 180.0).abs() < 1e-3);
        assert!((gun.node.position.y - (base_y + 7.0)).abs() < 1e-3);
    }

    #[test]
    fn ray_length_saturates_and_resets() {
        let mut rig = Rig::level();
        rig.press(MouseButton::Left, true);

        rig.ticks(0.25, 4);
        assert!(rig.player.ray().node.visible);
        assert_eq!(rig.player.ray().length, 500.0);

        rig.ticks(0.25, 4);
        assert_eq!(rig.player.ray().length, 1000.0);
        rig.ticks(0.25, 4);
        assert_eq!(rig.player.ray().length, 1000.0);
        assert_eq!(rig.player.ray().node.scale.z, 1000.0);

        rig.press(MouseButton::Left, false);
        rig.tick(0.25);
        assert!(!rig.player.ray().node.visible);
        assert_eq!(rig.player.ray().length, 0.0);
        assert_eq!(rig.player.ray().node.scale.z, 0.0);
    }

    #[test]
    fn light_mirrors_input() {
        let mut rig = Rig::level();
        rig.tick(0.1);
        assert!(!rig.player.light().node.visible);
        rig.press(MouseButton::Right, true);
        rig.tick(0.1);
        assert!(rig.player.light().node.visible);
        rig.press(MouseButton::Right, false);
        rig.tick(0.1);
        assert!(!rig.player.light().node.visible);
    }

    fn shooting_gallery() -> (Scene, BreakableId, BreakableId) {
        let mut scene = Scene::new();
        scene.add_static("floor", floor_under(Vec3::ZERO), [1.0; 4]);
        let near = scene.add_breakable("near", Aabb::new(Vec3::new(200.0, -50.0, -50.0), Vec3::new(220.0, 50.0, 50.0)));
        let far = scene.add_breakable("far", Aabb::new(Vec3::new(300.0, -50.0, -50.0), Vec3::new(320.0, 50.0, 50.0)));
        (scene, near, far)
    }

    #[test]
    fn ray_destroys_one_breakable_per_tick() {
        let (scene, near, far) = shooting_gallery();
        let mut rig = Rig::with_scene(scene, RoundRules::default());

        // Looking along +X from the origin
        rig.tick(0.1);
        assert!(!rig.scene.breakable(near).unwrap().is_destroyed());

        rig.press(MouseButton::Left, true);
        rig.tick(0.1);
        assert!(rig.scene.breakable(near).unwrap().is_destroyed());
        assert!(!rig.scene.breakable(far).unwrap().is_destroyed());
    }

    #[test]
    fn ray_ignores_untagged_nodes() {
        let mut scene = Scene::new();
        scene.add_static("floor", floor_under(Vec3::ZERO), [1.0; 4]);
        scene.add_static("wall", Aabb::new(Vec3::new(100.0, -50.0, -50.0), Vec3::new(120.0, 50.0, 50.0)), [1.0; 4]);
        let behind = scene.add_breakable("behind", Aabb::new(Vec3::new(200.0, -50.0, -50.0), Vec3::new(220.0, 50.0, 50.0)));
        let mut rig = Rig::with_scene(scene, RoundRules::default());

        rig.press(MouseButton::Left, true);
        rig.ticks(0.1, 5);
        assert!(!rig.scene.breakable(behind).unwrap().is_destroyed());
    }

    #[test]
    fn reaching_goal_appends_score_once() {
        let rules = RoundRules::default();
        let mut scene = Scene::new();
        scene.add_static("pad", floor_under(rules.goal), [1.0; 4]);
        let mut rig = Rig::with_scene(scene, rules.clone());
        rig.player.camera.eye = rules.goal;
        rig.ctx.game_info.current_score = 1234.4;

        rig.tick(0.01);
        assert!(rig.ctx.game_info.player_failed);
        assert_eq!(rig.ctx.game_info.outcome, RoundOutcome::Won);
        assert_eq!(rig.ctx.lighting, LightingPreset::Spectate);

        rig.ticks(0.01, 3);
        assert_eq!(rig.logged_scores(), vec!["1234".to_string()]);
    }

    #[test]
    fn win_and_death_on_same_tick_kill_once() {
        let rules = RoundRules { kill_max_y: -1000.0, ..RoundRules::default() };
        let mut scene = Scene::new();
        scene.add_static("pad", floor_under(rules.goal), [1.0; 4]);
        let mut rig = Rig::with_scene(scene, rules.clone());
        rig.player.camera.eye = rules.goal;

        rig.tick(0.01);
        assert_eq!(rig.ctx.game_info.outcome, RoundOutcome::Won);
        assert_eq!(rig.logged_scores().len(), 1);
    }

    #[test]
    fn falling_through_goal_does_not_win() {
        let rules = RoundRules::default();
        let mut rig = Rig::with_scene(Scene::new(), rules.clone());
        rig.player.camera.eye = rules.goal;

        rig.tick(0.01);
        assert!(rig.player.is_falling());
        assert!(!rig.ctx.game_info.player_failed);
        assert!(rig.logged_scores().is_empty());
    }

    #[test]
    fn leaving_height_bounds_kills() {
        let mut rig = Rig::with_scene(Scene::new(), RoundRules::default());
        rig.player.camera.eye.y = -1600.0;
        rig.tick(0.01);
        assert_eq!(rig.ctx.game_info.outcome, RoundOutcome::Died);

        let mut rig = Rig::with_scene(Scene::new(), RoundRules::default());
        rig.player.camera.eye.y = 1600.0;
        rig.tick(0.01);
        assert_eq!(rig.ctx.game_info.outcome, RoundOutcome::Died);
        assert_eq!(rig.ctx.lighting, LightingPreset::Spectate);
    }

    #[test]
    fn zero_score_kills() {
        let mut rig = Rig::level();
        rig.ctx.game_info.current_score = 0.0;
        rig.tick(0.01);
        assert!(rig.ctx.game_info.player_failed);
        assert_eq!(rig.ctx.game_info.outcome, RoundOutcome::Died);
    }

    #[test]
    fn kill_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = SharedContext::new(ScoreLog::new(dir.path().join("s.txt")), 100.0);
        assert!(PlayerController::kill(&mut ctx, RoundOutcome::Died));
        assert_eq!(ctx.lighting, LightingPreset::Spectate);

        ctx.lighting = LightingPreset::Play;
        assert!(!PlayerController::kill(&mut ctx, RoundOutcome::Won));
        assert_eq!(ctx.lighting, LightingPreset::Play);
        assert_eq!(ctx.game_info.outcome, RoundOutcome::Died);
    }
}
