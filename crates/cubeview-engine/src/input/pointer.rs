use std::collections::HashSet;

use super::types::{
    InputEvent, Modifiers, MouseButton, MouseButtonState, PointerButtonEvent, PointerMoveEvent,
};

/// Current pointer state for a single window.
///
/// Holds "is down" information and current pointer position.
/// Per-frame motion is recorded into a `PointerFrame`.
#[derive(Debug, Default)]
pub struct PointerState {
    /// Modifier state as last reported by the platform.
    pub modifiers: Modifiers,

    /// Whether the window is focused.
    pub focused: bool,

    /// Pointer position in logical pixels.
    pub pointer_pos: Option<(f32, f32)>,

    /// Set of currently held mouse buttons.
    pub buttons_down: HashSet<MouseButton>,
}

/// Per-frame pointer deltas.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PointerFrame {
    /// Pointer motion this frame, in logical pixels.
    pub motion: (f32, f32),

    /// Accumulated wheel motion this frame, in lines (+Y = away from the user).
    pub wheel_lines: f32,

    /// Buttons pressed this frame.
    pub buttons_pressed: HashSet<MouseButton>,
}

impl PointerFrame {
    pub fn clear(&mut self) {
        self.motion = (0.0, 0.0);
        self.wheel_lines = 0.0;
        self.buttons_pressed.clear();
    }
}

impl PointerState {
    /// Applies a platform-agnostic input event to the current state and writes deltas to `frame`.
    pub fn apply_event(&mut self, frame: &mut PointerFrame, ev: &InputEvent) {
        match ev {
            InputEvent::ModifiersChanged(m) => {
                self.modifiers = *m;
            }

            InputEvent::Focused(f) => {
                self.focused = *f;
                if !*f {
                    self.buttons_down.clear();
                }
            }

            InputEvent::PointerMoved(PointerMoveEvent { x, y }) => {
                if let Some((px, py)) = self.pointer_pos {
                    frame.motion.0 += x - px;
                    frame.motion.1 += y - py;
                }
                self.pointer_pos = Some((*x, *y));
            }

            InputEvent::PointerLeft => {
                self.pointer_pos = None;
            }

            InputEvent::PointerButton(PointerButtonEvent {
                button,
                state,
                x,
                y,
                modifiers,
            }) => {
                self.pointer_pos = Some((*x, *y));
                self.modifiers = *modifiers;

                match state {
                    MouseButtonState::Pressed => {
                        if self.buttons_down.insert(*button) {
                            frame.buttons_pressed.insert(*button);
                        }
                    }
                    MouseButtonState::Released => {
                        self.buttons_down.remove(button);
                    }
                }
            }

            InputEvent::MouseWheel { delta, modifiers } => {
                self.modifiers = *modifiers;
                frame.wheel_lines += delta.lines_y();
            }

            InputEvent::Key { .. } => {}
        }
    }

    pub fn button_down(&self, btn: MouseButton) -> bool {
        self.buttons_down.contains(&btn)
    }
}
