use crate::model::score::{ScoreLog, ScoreSummary};

/// Frame timestamps in milliseconds and the derived step in seconds
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameTiming {
    pub delta_time: f32,
    pub current_time: f64,
    pub last_time: f64,
}

/// How the current round ended, if it has
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoundOutcome {
    #[default]
    Playing,
    Won,
    Died,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GameInfo {
    pub current_score: f32,
    /// Round-over flag, set for both a win and a death
    pub player_failed: bool,
    pub outcome: RoundOutcome,
    pub last_score: u32,
    pub highest_score: u32,
}

/// Ambient lighting preset of the skybox
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LightingPreset {
    #[default]
    Play,
    Spectate,
}

/// Per-session state handed to every component each frame
pub struct SharedContext {
    pub timing: FrameTiming,
    pub game_info: GameInfo,
    pub lighting: LightingPreset,
    pub score_log: ScoreLog,
    starting_score: f32,
}

impl SharedContext {
    pub fn new(score_log: ScoreLog, starting_score: f32) -> Self {
        Self {
            timing: FrameTiming::default(),
            game_info: GameInfo { current_score: starting_score, ..Default::default() },
            lighting: LightingPreset::default(),
            score_log,
            starting_score,
        }
    }

    pub fn delta_time(&self) -> f32 {
        self.timing.delta_time
    }

    /// Clear round-scoped state; score history and timing survive
    pub fn reset(&mut self) {
        self.game_info.current_score = self.starting_score;
        self.game_info.player_failed = false;
        self.game_info.outcome = RoundOutcome::Playing;
        self.lighting = LightingPreset::Play;
    }

    pub fn apply_scores(&mut self, summary: ScoreSummary) {
        self.game_info.last_score = summary.last;
        self.game_info.highest_score = summary.highest;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_clears_round_but_keeps_history() {
        let mut ctx = SharedContext::new(ScoreLog::new("unused.txt"), 1000.0);
        ctx.game_info.current_score = 0.0;
        ctx.game_info.player_failed = true;
        ctx.game_info.outcome = RoundOutcome::Died;
        ctx.lighting = LightingPreset::Spectate;
        ctx.apply_scores(ScoreSummary { last: 12, highest: 99 });
        ctx.timing.last_time = 500.0;

        ctx.reset();

        assert_eq!(ctx.game_info.current_score, 1000.0);
        assert!(!ctx.game_info.player_failed);
        assert_eq!(ctx.game_info.outcome, RoundOutcome::Playing);
        assert_eq!(ctx.lighting, LightingPreset::Play);
        assert_eq!(ctx.game_info.last_score, 12);
        assert_eq!(ctx.game_info.highest_score, 99);
        assert_eq!(ctx.timing.last_time, 500.0);
        assert_eq!(ctx.score_log.path().to_str(), Some("unused.txt"));
    }
}
