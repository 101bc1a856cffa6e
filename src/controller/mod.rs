// CONTROLLER: Input, player logic, and update loop
pub mod input;
pub mod physics;
pub mod camera_controller;
pub mod player;
pub mod frame_loop;

pub use input::{InputEvent, InputState, InputProcessor, KeyBindings, MouseButton};
pub use physics::GravityCollider;
pub use camera_controller::CameraController;
pub use player::{ActiveCamera, PlayerController};
pub use frame_loop::{FrameHost, FrameView, GameLoop, LoopState};
