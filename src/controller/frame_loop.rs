use tracing::{debug, info, warn};

use crate::config::GameConfig;
use crate::controller::input::{InputProcessor, InputState};
use crate::controller::player::PlayerController;
use crate::model::{RoundOutcome, Scene, ScoreLog, SharedContext};

/// Everything a frame host needs to present one frame
pub struct FrameView<'a> {
    pub ctx: &'a SharedContext,
    pub scene: &'a Scene,
    pub player: &'a PlayerController,
    pub fps: f32,
    /// How the previous round ended
    pub last_outcome: Option<RoundOutcome>,
}

/// Window/renderer side of the loop
pub trait FrameHost {
    fn set_title(&mut self, title: &str);
    fn draw(&mut self, frame: &FrameView<'_>);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Playing,
    RoundReset,
}

/// Frames per second averaged over roughly one second
#[derive(Debug, Default)]
struct FpsCounter {
    fps: f32,
    frame_count: u32,
    timer: f32,
}

impl FpsCounter {
    fn update(&mut self, dt: f32) {
        self.frame_count += 1;
        self.timer += dt;
        if self.timer >= 1.0 {
            self.fps = self.frame_count as f32 / self.timer;
            self.frame_count = 0;
            self.timer = 0.0;
        }
    }
}

/// Main game loop state and round cycle
pub struct GameLoop {
    config: GameConfig,
    bindings: InputProcessor,
    ctx: SharedContext,
    scene: Scene,
    player: PlayerController,
    state: LoopState,
    fps: FpsCounter,
    round: u32,
    last_outcome: Option<RoundOutcome>,
}

impl GameLoop {
    pub fn new(config: GameConfig, bindings: InputProcessor) -> Self {
        let score_log = ScoreLog::new(&config.score_log_path);
        let ctx = SharedContext::new(score_log, config.round.starting_score);
        let player = PlayerController::new(&config.player, &config.round, bindings.clone());

        let mut game = Self {
            config,
            bindings,
            ctx,
            scene: Scene::new(),
            player,
            state: LoopState::Playing,
            fps: FpsCounter::default(),
            round: 1,
            last_outcome: None,
        };
        game.update_scores();
        game.scene.setup(game.config.round.goal);
        game
    }

    pub fn context(&self) -> &SharedContext { &self.ctx }
    pub fn scene(&self) -> &Scene { &self.scene }
    pub fn player(&self) -> &PlayerController { &self.player }
    pub fn state(&self) -> LoopState { self.state }
    pub fn fps(&self) -> f32 { self.fps.fps }
    pub fn round(&self) -> u32 { self.round }
    pub fn last_outcome(&self) -> Option<RoundOutcome> { self.last_outcome }

    /// Run one frame at timestamp `now_ms`. Returns the outcome of a round
    /// that ended (and was reset) during this frame.
    pub fn tick(
        &mut self,
        now_ms: f64,
        input: &mut InputState,
        host: &mut impl FrameHost,
    ) -> Option<RoundOutcome> {
        self.update(now_ms, input, host);
        self.draw(host);
        input.end_frame();

        if !self.ctx.game_info.player_failed {
            return None;
        }

        let outcome = self.ctx.game_info.outcome;
        self.state = LoopState::RoundReset;
        self.reset_round();
        self.state = LoopState::Playing;
        self.last_outcome = Some(outcome);
        Some(outcome)
    }

    fn update_delta_time(&mut self, now_ms: f64) {
        let timing = &mut self.ctx.timing;
        timing.current_time = now_ms;
        let max = self.config.round.max_delta_time as f64;
        timing.delta_time = ((timing.current_time - timing.last_time) / 1000.0).clamp(0.0, max) as f32;
        timing.last_time = now_ms;
    }

    /// Update timing, input, scene, score and player for one frame
    fn update(&mut self, now_ms: f64, input: &mut InputState, host: &mut impl FrameHost) {
        self.update_delta_time(now_ms);
        let dt = self.ctx.delta_time();

        self.fps.update(dt);
        host.set_title(&format!("gravflip - {:.0} fps", self.fps.fps));

        if !self.player.is_playing() && self.bindings.wants_to_start(input) {
            info!(round = self.round, "round started");
            self.player.activate();
        }
        if self.player.is_playing() && self.bindings.wants_to_reverse(input) {
            if self.player.can_reverse() {
                self.player.reverse();
            } else {
                debug!("reversal refused while falling");
            }
        }

        self.scene.update(dt);
        self.drain_score(input);
        self.player.update(&mut self.ctx, input, &mut self.scene);
    }

    fn draw(&self, host: &mut impl FrameHost) {
        host.draw(&FrameView {
            ctx: &self.ctx,
            scene: &self.scene,
            player: &self.player,
            fps: self.fps.fps,
            last_outcome: self.last_outcome,
        });
    }

    /// Score bleeds away while playing, faster while the gun is in use
    fn drain_score(&mut self, input: &InputState) {
        if !self.player.is_playing() || self.ctx.game_info.player_failed {
            return;
        }

        let rules = &self.config.round;
        let mut drain = rules.score_drain;
        if self.player.is_shooting(input) {
            drain += rules.shooting_drain;
        }
        if self.player.is_lighting(input) {
            drain += rules.lighting_drain;
        }

        let info = &mut self.ctx.game_info;
        info.current_score = (info.current_score - drain * self.ctx.timing.delta_time).max(0.0);
    }

    fn reset_round(&mut self) {
        info!(round = self.round, outcome = ?self.ctx.game_info.outcome, "round over, resetting");

        self.scene.close();
        self.ctx.reset();
        self.update_scores();
        self.scene.setup(self.config.round.goal);
        self.player = PlayerController::new(&self.config.player, &self.config.round, self.bindings.clone());
        self.round += 1;
    }

    /// Reload last and best score from the log
    fn update_scores(&mut self) {
        match self.ctx.score_log.load() {
            Ok(Some(summary)) => {
                debug!(last = summary.last, highest = summary.highest, "scores loaded");
                self.ctx.apply_scores(summary);
            }
            Ok(None) => {}
            Err(e) => warn!("could not read scores: {e}"),
        }
    }
}
