// MODEL: Game state and data
pub mod camera;
pub mod context;
pub mod scene;
pub mod score;

pub use camera::Camera;
pub use context::{FrameTiming, GameInfo, LightingPreset, RoundOutcome, SharedContext};
pub use scene::{Breakable, BreakableId, NodeId, NodeTags, RayHit, Scene, SceneNode};
pub use score::{ScoreLog, ScoreSummary};
