use winit::dpi::PhysicalPosition;
use winit::event::{ElementState, MouseButton as WinitMouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode as WinitKeyCode, ModifiersState, PhysicalKey};
use winit::window::Window;

use crate::input::{
    InputEvent, KeyCode, KeyState, ModifierKey, Modifiers, MouseButton, MouseButtonState,
    MouseWheelDelta, PointerButtonEvent, PointerMoveEvent, PointerState,
};

/// Translates a winit `WindowEvent` into an engine `InputEvent`.
///
/// Returns `None` for events not represented by the input subsystem.
pub(crate) fn translate_window_event(
    window: &Window,
    state: &PointerState,
    event: &WindowEvent,
) -> Option<InputEvent> {
    match event {
        WindowEvent::ModifiersChanged(m) => {
            // winit 0.30: ModifiersChanged carries a wrapper with `.state()`.
            let ms: ModifiersState = m.state();
            Some(InputEvent::ModifiersChanged(map_modifiers(ms)))
        }

        WindowEvent::Focused(f) => Some(InputEvent::Focused(*f)),

        WindowEvent::CursorLeft { .. } => Some(InputEvent::PointerLeft),

        WindowEvent::CursorMoved { position, .. } => {
            let (x, y) = to_logical_f32(window, *position);
            Some(InputEvent::PointerMoved(PointerMoveEvent { x, y }))
        }

        WindowEvent::MouseInput { state: st, button, .. } => {
            let st = match st {
                ElementState::Pressed => MouseButtonState::Pressed,
                ElementState::Released => MouseButtonState::Released,
            };

            // winit 0.30 does not expose cursor query; use tracked pointer position.
            let (x, y) = state.pointer_pos.unwrap_or((0.0, 0.0));

            Some(InputEvent::PointerButton(PointerButtonEvent {
                button: map_mouse_button(*button),
                state: st,
                x,
                y,
                modifiers: state.modifiers,
            }))
        }

        WindowEvent::MouseWheel { delta, .. } => {
            let delta = match delta {
                MouseScrollDelta::LineDelta(x, y) => MouseWheelDelta::Line { x: *x, y: *y },
                MouseScrollDelta::PixelDelta(p) => {
                    let (x, y) = to_logical_f32(window, *p);
                    MouseWheelDelta::Pixel { x, y }
                }
            };
            Some(InputEvent::MouseWheel {
                delta,
                modifiers: state.modifiers,
            })
        }

        WindowEvent::KeyboardInput { event, .. } => {
            let st = match event.state {
                ElementState::Pressed => KeyState::Pressed,
                ElementState::Released => KeyState::Released,
            };

            let code = map_key(event.physical_key)?;

            Some(InputEvent::Key {
                code,
                state: st,
                modifiers: key_event_modifiers(state.modifiers, code, st),
                repeat: event.repeat,
            })
        }

        _ => None,
    }
}

/// Modifier snapshot for a key event.
///
/// Platforms disagree on whether `ModifiersChanged` arrives before or after the
/// modifier key's own `KeyboardInput`; the key itself is authoritative.
fn key_event_modifiers(tracked: Modifiers, code: KeyCode, state: KeyState) -> Modifiers {
    let mut mods = tracked;
    if let Some(m) = ModifierKey::from_key_code(code) {
        mods.set(m, state == KeyState::Pressed);
    }
    mods
}

fn to_logical_f32(window: &Window, pos: PhysicalPosition<f64>) -> (f32, f32) {
    let scale = window.scale_factor();
    let logical = pos.to_logical::<f64>(scale);
    (logical.x as f32, logical.y as f32)
}

fn map_modifiers(m: ModifiersState) -> Modifiers {
    Modifiers {
        shift: m.shift_key(),
        ctrl: m.control_key(),
        alt: m.alt_key(),
        meta: m.super_key(),
    }
}

fn map_mouse_button(b: WinitMouseButton) -> MouseButton {
    match b {
        WinitMouseButton::Left => MouseButton::Left,
        WinitMouseButton::Right => MouseButton::Right,
        WinitMouseButton::Middle => MouseButton::Middle,
        WinitMouseButton::Back => MouseButton::Back,
        WinitMouseButton::Forward => MouseButton::Forward,
        WinitMouseButton::Other(v) => MouseButton::Other(v),
    }
}

/// Maps a winit physical key to its historical key code.
///
/// Keys without a historical code are dropped.
fn map_key(pk: PhysicalKey) -> Option<KeyCode> {
    let PhysicalKey::Code(code) = pk else {
        return None;
    };

    let key = match code {
        WinitKeyCode::Backspace => KeyCode::BACKSPACE,
        WinitKeyCode::Tab => KeyCode::TAB,
        WinitKeyCode::Enter | WinitKeyCode::NumpadEnter => KeyCode::ENTER,
        WinitKeyCode::Escape => KeyCode::ESCAPE,
        WinitKeyCode::Space => KeyCode::SPACE,

        WinitKeyCode::PageUp => KeyCode::PAGE_UP,
        WinitKeyCode::PageDown => KeyCode::PAGE_DOWN,
        WinitKeyCode::End => KeyCode::END,
        WinitKeyCode::Home => KeyCode::HOME,
        WinitKeyCode::Insert => KeyCode::INSERT,
        WinitKeyCode::Delete => KeyCode::DELETE,

        WinitKeyCode::ArrowLeft => KeyCode::LEFT,
        WinitKeyCode::ArrowUp => KeyCode::UP,
        WinitKeyCode::ArrowRight => KeyCode::RIGHT,
        WinitKeyCode::ArrowDown => KeyCode::DOWN,

        WinitKeyCode::ShiftLeft | WinitKeyCode::ShiftRight => KeyCode::SHIFT,
        WinitKeyCode::ControlLeft | WinitKeyCode::ControlRight => KeyCode::CTRL,
        WinitKeyCode::AltLeft | WinitKeyCode::AltRight => KeyCode::ALT,
        WinitKeyCode::SuperLeft | WinitKeyCode::SuperRight => KeyCode::META,

        WinitKeyCode::KeyA => KeyCode::letter(b'A'),
        WinitKeyCode::KeyB => KeyCode::letter(b'B'),
        WinitKeyCode::KeyC => KeyCode::letter(b'C'),
        WinitKeyCode::KeyD => KeyCode::letter(b'D'),
        WinitKeyCode::KeyE => KeyCode::letter(b'E'),
        WinitKeyCode::KeyF => KeyCode::letter(b'F'),
        WinitKeyCode::KeyG => KeyCode::letter(b'G'),
        WinitKeyCode::KeyH => KeyCode::letter(b'H'),
        WinitKeyCode::KeyI => KeyCode::letter(b'I'),
        WinitKeyCode::KeyJ => KeyCode::letter(b'J'),
        WinitKeyCode::KeyK => KeyCode::letter(b'K'),
        WinitKeyCode::KeyL => KeyCode::letter(b'L'),
        WinitKeyCode::KeyM => KeyCode::letter(b'M'),
        WinitKeyCode::KeyN => KeyCode::letter(b'N'),
        WinitKeyCode::KeyO => KeyCode::letter(b'O'),
        WinitKeyCode::KeyP => KeyCode::letter(b'P'),
        WinitKeyCode::KeyQ => KeyCode::letter(b'Q'),
        WinitKeyCode::KeyR => KeyCode::letter(b'R'),
        WinitKeyCode::KeyS => KeyCode::letter(b'S'),
        WinitKeyCode::KeyT => KeyCode::letter(b'T'),
        WinitKeyCode::KeyU => KeyCode::letter(b'U'),
        WinitKeyCode::KeyV => KeyCode::letter(b'V'),
        WinitKeyCode::KeyW => KeyCode::letter(b'W'),
        WinitKeyCode::KeyX => KeyCode::letter(b'X'),
        WinitKeyCode::KeyY => KeyCode::letter(b'Y'),
        WinitKeyCode::KeyZ => KeyCode::letter(b'Z'),

        WinitKeyCode::Digit0 => KeyCode::digit(0),
        WinitKeyCode::Digit1 => KeyCode::digit(1),
        WinitKeyCode::Digit2 => KeyCode::digit(2),
        WinitKeyCode::Digit3 => KeyCode::digit(3),
        WinitKeyCode::Digit4 => KeyCode::digit(4),
        WinitKeyCode::Digit5 => KeyCode::digit(5),
        WinitKeyCode::Digit6 => KeyCode::digit(6),
        WinitKeyCode::Digit7 => KeyCode::digit(7),
        WinitKeyCode::Digit8 => KeyCode::digit(8),
        WinitKeyCode::Digit9 => KeyCode::digit(9),

        WinitKeyCode::F1 => KeyCode::function(1),
        WinitKeyCode::F2 => KeyCode::function(2),
        WinitKeyCode::F3 => KeyCode::function(3),
        WinitKeyCode::F4 => KeyCode::function(4),
        WinitKeyCode::F5 => KeyCode::function(5),
        WinitKeyCode::F6 => KeyCode::function(6),
        WinitKeyCode::F7 => KeyCode::function(7),
        WinitKeyCode::F8 => KeyCode::function(8),
        WinitKeyCode::F9 => KeyCode::function(9),
        WinitKeyCode::F10 => KeyCode::function(10),
        WinitKeyCode::F11 => KeyCode::function(11),
        WinitKeyCode::F12 => KeyCode::function(12),

        _ => return None,
    };

    Some(key)
}
