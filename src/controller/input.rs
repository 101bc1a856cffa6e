/// Platform-agnostic input handling system
use std::collections::HashSet;

/// Platform-independent input events
#[derive(Debug, Clone)]
pub enum InputEvent {
    // Keyboard events
    KeyDown(String),
    KeyUp(String),

    // Mouse events
    MouseMove { dx: f32, dy: f32 },
    MouseClick { button: MouseButton, is_down: bool },

    // Window events
    FocusLost,
    PointerLockChanged { locked: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Input state sampled once per frame
#[derive(Debug, Default)]
pub struct InputState {
    pub pressed_keys: HashSet<String>,
    /// Keys that went down since the last `end_frame`
    pub just_pressed: HashSet<String>,
    pub look_delta: (f32, f32),
    pub pointer_locked: bool,
    pub left_click: bool,
    pub right_click: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process an input event and update state
    pub fn process_event(&mut self, event: &InputEvent) {
        match event {
            InputEvent::KeyDown(key) => {
                if self.pressed_keys.insert(key.clone()) {
                    self.just_pressed.insert(key.clone());
                }
            }
            InputEvent::KeyUp(key) => {
                self.pressed_keys.remove(key.as_str());
            }
            InputEvent::MouseMove { dx, dy } => {
                if self.pointer_locked {
                    self.look_delta.0 += dx;
                    self.look_delta.1 += dy;
                }
            }
            InputEvent::MouseClick { button, is_down } => {
                match button {
                    MouseButton::Left => self.left_click = *is_down,
                    MouseButton::Right => self.right_click = *is_down,
                    MouseButton::Middle => {}
                }
            }
            InputEvent::FocusLost => {
                self.clear_keys();
            }
            InputEvent::PointerLockChanged { locked } => {
                self.pointer_locked = *locked;
            }
        }
    }

    pub fn is_key_pressed(&self, key: &str) -> bool {
        self.pressed_keys.contains(key)
    }

    pub fn was_key_pressed(&self, key: &str) -> bool {
        self.just_pressed.contains(key)
    }

    pub fn clear_keys(&mut self) {
        self.pressed_keys.clear();
        self.just_pressed.clear();
        self.left_click = false;
        self.right_click = false;
    }

    pub fn consume_look(&mut self) -> (f32, f32) {
        let result = self.look_delta;
        self.look_delta = (0.0, 0.0);
        result
    }

    /// Drop edge-triggered state; unhandled presses do not carry over
    pub fn end_frame(&mut self) {
        self.just_pressed.clear();
        self.look_delta = (0.0, 0.0);
    }
}

/// Key mapping configuration
#[derive(Clone)]
pub struct KeyBindings {
    pub forward: String,
    pub backward: String,
    pub left: String,
    pub right: String,
    pub jump: String,
    pub reverse: String,
    pub start: String,
    pub escape: String,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            forward: "w".to_string(),
            backward: "s".to_string(),
            left: "a".to_string(),
            right: "d".to_string(),
            jump: " ".to_string(),
            reverse: "e".to_string(),
            start: "Enter".to_string(),
            escape: "Escape".to_string(),
        }
    }
}

/// High-level input processor
#[derive(Clone, Default)]
pub struct InputProcessor {
    bindings: KeyBindings,
}

impl InputProcessor {
    pub fn new(bindings: KeyBindings) -> Self {
        Self { bindings }
    }

    pub fn is_moving_forward(&self, input: &InputState) -> bool {
        input.is_key_pressed(&self.bindings.forward) || input.is_key_pressed("ArrowUp")
    }

    pub fn is_moving_backward(&self, input: &InputState) -> bool {
        input.is_key_pressed(&self.bindings.backward) || input.is_key_pressed("ArrowDown")
    }

    pub fn is_moving_left(&self, input: &InputState) -> bool {
        input.is_key_pressed(&self.bindings.left) || input.is_key_pressed("ArrowLeft")
    }

    pub fn is_moving_right(&self, input: &InputState) -> bool {
        input.is_key_pressed(&self.bindings.right) || input.is_key_pressed("ArrowRight")
    }

    pub fn is_jumping(&self, input: &InputState) -> bool {
        input.is_key_pressed(&self.bindings.jump)
    }

    /// Ray held (left mouse)
    pub fn is_shooting(&self, input: &InputState) -> bool {
        input.left_click
    }

    /// Gun light held (right mouse)
    pub fn is_lighting(&self, input: &InputState) -> bool {
        input.right_click
    }

    pub fn wants_to_reverse(&self, input: &InputState) -> bool {
        input.was_key_pressed(&self.bindings.reverse)
    }

    pub fn wants_to_start(&self, input: &InputState) -> bool {
        input.was_key_pressed(&self.bindings.start)
    }

    pub fn is_escape(&self, key: &str) -> bool {
        key == self.bindings.escape
    }

    /// (forward, strafe-right) intent in [-1, 1]
    pub fn move_intent(&self, input: &InputState) -> (f32, f32) {
        let axis = |pos: bool, neg: bool| (pos as i8 - neg as i8) as f32;
        (
            axis(self.is_moving_forward(input), self.is_moving_backward(input)),
            axis(self.is_moving_right(input), self.is_moving_left(input)),
        )
    }
}

pub mod native {
    use super::*;
    use winit::event::{ElementState, MouseButton as WinitButton};
    use winit::keyboard::KeyCode;

    /// Key name used by `KeyBindings`, or None for keys the game ignores
    pub fn key_name(code: KeyCode) -> Option<&'static str> {
        let name = match code {
            KeyCode::KeyW => "w",
            KeyCode::KeyA => "a",
            KeyCode::KeyS => "s",
            KeyCode::KeyD => "d",
            KeyCode::KeyE => "e",
            KeyCode::Space => " ",
            KeyCode::Enter | KeyCode::NumpadEnter => "Enter",
            KeyCode::Escape => "Escape",
            KeyCode::ArrowUp => "ArrowUp",
            KeyCode::ArrowDown => "ArrowDown",
            KeyCode::ArrowLeft => "ArrowLeft",
            KeyCode::ArrowRight => "ArrowRight",
            _ => return None,
        };
        Some(name)
    }

    pub fn keyboard_to_input(code: KeyCode, state: ElementState) -> Option<InputEvent> {
        let key = key_name(code)?.to_string();
        Some(match state {
            ElementState::Pressed => InputEvent::KeyDown(key),
            ElementState::Released => InputEvent::KeyUp(key),
        })
    }

    pub fn mouse_click_to_input(button: WinitButton, state: ElementState) -> Option<InputEvent> {
        let button = match button {
            WinitButton::Left => MouseButton::Left,
            WinitButton::Right => MouseButton::Right,
            WinitButton::Middle => MouseButton::Middle,
            _ => return None,
        };
        Some(InputEvent::MouseClick { button, is_down: state.is_pressed() })
    }

    pub fn mouse_move_to_input(dx: f64, dy: f64) -> InputEvent {
        InputEvent::MouseMove { dx: dx as f32, dy: dy as f32 }
    }
}
