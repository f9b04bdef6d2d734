use std::collections::HashSet;

use super::chord::Chord;
use super::keycode::KeyCode;
use super::types::{InputEvent, KeyState, ModifierKey, Modifiers};

/// Live pressed/released state of physical keys and the four modifiers.
///
/// Mutated only by `on_press` / `on_release` (and `apply_event`, which routes
/// to them). Queries never mutate.
#[derive(Debug, Default, Clone)]
pub struct KeyboardState {
    /// Set of currently held keys.
    keys_down: HashSet<KeyCode>,

    /// Modifier snapshot from the most recent key event.
    modifiers: Modifiers,
}

impl KeyboardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a key press and overwrites the modifier snapshot.
    pub fn on_press(&mut self, code: KeyCode, modifiers: Modifiers) {
        self.keys_down.insert(code);
        self.modifiers = modifiers;
    }

    /// Records a key release and overwrites the modifier snapshot.
    pub fn on_release(&mut self, code: KeyCode, modifiers: Modifiers) {
        self.keys_down.remove(&code);
        self.modifiers = modifiers;
    }

    /// Routes key events to the press/release handlers; other events are ignored.
    pub fn apply_event(&mut self, ev: &InputEvent) {
        if let InputEvent::Key {
            code,
            state,
            modifiers,
            ..
        } = ev
        {
            match state {
                KeyState::Pressed => self.on_press(*code, *modifiers),
                KeyState::Released => self.on_release(*code, *modifiers),
            }
        }
    }

    /// Releases every held key through `on_release`.
    ///
    /// Used when the window loses focus and release events will never arrive.
    pub fn release_all(&mut self) {
        let held: Vec<KeyCode> = self.keys_down.iter().copied().collect();
        for code in held {
            self.on_release(code, Modifiers::default());
        }
        self.modifiers = Modifiers::default();
    }

    pub fn key_down(&self, code: KeyCode) -> bool {
        self.keys_down.contains(&code)
    }

    pub fn modifier_down(&self, m: ModifierKey) -> bool {
        self.modifiers.get(m)
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn held_count(&self) -> usize {
        self.keys_down.len()
    }

    /// Returns true when every component of `descriptor` is currently held.
    ///
    /// Unknown or empty tokens are never held.
    pub fn is_held(&self, descriptor: &str) -> bool {
        self.chord_held(&Chord::parse(descriptor))
    }

    pub fn chord_held(&self, chord: &Chord) -> bool {
        chord.held_by(|m| self.modifier_down(m), |code| self.key_down(code))
    }
}
