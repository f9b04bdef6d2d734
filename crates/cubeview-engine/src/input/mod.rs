//! Input subsystem.
//!
//! Public API is platform-agnostic and does not expose winit types.
//! Runtime code is responsible for translating platform events into `InputEvent`s
//! and dispatching them through the window's `InputHub`.

mod chord;
mod hub;
mod keyboard;
mod keycode;
mod pointer;
mod tracker;
mod types;

pub(crate) mod platform;

pub use chord::{Chord, ChordPart};
pub use hub::{InputHub, Subscription};
pub use keyboard::KeyboardState;
pub use keycode::KeyCode;
pub use pointer::{PointerFrame, PointerState};
pub use tracker::KeyboardTracker;
pub use types::{
    InputEvent,
    KeyState,
    ModifierKey,
    Modifiers,
    MouseButton,
    MouseButtonState,
    MouseWheelDelta,
    PointerButtonEvent,
    PointerMoveEvent,
};
