//! Key bindings.
//!
//! Motion chords are level-triggered and read every tick by the render loop.
//! Action chords fire once per press through a `ChordLatch`.

use cubeview_engine::input::{Chord, KeyboardTracker};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// Which transform component a motion chord drives.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MotionTarget {
    Rotate(Axis),
    Move(Axis),
}

/// A held chord adds `sign * delta` to its target each tick.
#[derive(Debug, Clone)]
pub struct MotionBinding {
    pub chord: Chord,
    pub target: MotionTarget,
    pub sign: f32,
}

impl MotionBinding {
    pub fn new(chord: &str, target: MotionTarget, sign: f32) -> Self {
        Self {
            chord: Chord::parse(chord),
            target,
            sign,
        }
    }
}

/// The six rotation chords and four movement chords of the controlled object.
///
/// `up` moves away from the camera (towards -Z).
pub fn default_motion_bindings() -> Vec<MotionBinding> {
    use MotionTarget::{Move, Rotate};
    vec![
        MotionBinding::new("Q", Rotate(Axis::Y), 1.0),
        MotionBinding::new("A", Rotate(Axis::Y), -1.0),
        MotionBinding::new("W", Rotate(Axis::X), 1.0),
        MotionBinding::new("S", Rotate(Axis::X), -1.0),
        MotionBinding::new("E", Rotate(Axis::Z), 1.0),
        MotionBinding::new("D", Rotate(Axis::Z), -1.0),
        MotionBinding::new("left", Move(Axis::X), -1.0),
        MotionBinding::new("right", Move(Axis::X), 1.0),
        MotionBinding::new("up", Move(Axis::Z), -1.0),
        MotionBinding::new("down", Move(Axis::Z), 1.0),
    ]
}

/// User-triggered viewer actions.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Action {
    LoadBackground,
    ExportFrame,
    ToggleExportFormat,
}

/// Rising-edge detector for a chord.
#[derive(Debug, Clone)]
pub struct ChordLatch {
    chord: Chord,
    was_held: bool,
}

impl ChordLatch {
    pub fn new(chord: &str) -> Self {
        Self {
            chord: Chord::parse(chord),
            was_held: false,
        }
    }

    /// Feeds the current held state; true only on the transition to held.
    pub fn update(&mut self, held: bool) -> bool {
        let fired = held && !self.was_held;
        self.was_held = held;
        fired
    }

    pub fn poll(&mut self, keyboard: &KeyboardTracker) -> bool {
        let held = keyboard.chord_held(&self.chord);
        self.update(held)
    }

    pub fn chord(&self) -> &Chord {
        &self.chord
    }
}

/// Action chords, polled once per frame.
#[derive(Debug, Clone)]
pub struct ActionBindings {
    latches: Vec<(Action, ChordLatch)>,
}

/// Primary keys of the default action chords stay out of the motion table;
/// a held motion chord would otherwise move the object while the action fires.
impl Default for ActionBindings {
    fn default() -> Self {
        Self::new()
            .bind(Action::LoadBackground, "ctrl+o")
            .bind(Action::ExportFrame, "ctrl+p")
            .bind(Action::ToggleExportFormat, "ctrl+t")
    }
}

impl ActionBindings {
    pub fn new() -> Self {
        Self {
            latches: Vec::new(),
        }
    }

    pub fn bind(mut self, action: Action, chord: &str) -> Self {
        self.latches.push((action, ChordLatch::new(chord)));
        self
    }

    pub fn chords(&self) -> impl Iterator<Item = (Action, &Chord)> {
        self.latches.iter().map(|(action, latch)| (*action, latch.chord()))
    }

    /// Actions whose chord went down since the previous poll, in binding order.
    pub fn poll(&mut self, keyboard: &KeyboardTracker) -> Vec<Action> {
        self.latches
            .iter_mut()
            .filter_map(|(action, latch)| latch.poll(keyboard).then_some(*action))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cubeview_engine::input::{ChordPart, InputEvent, InputHub, KeyCode, Modifiers};

    fn ctrl() -> Modifiers {
        Modifiers {
            ctrl: true,
            ..Modifiers::default()
        }
    }

    #[test]
    fn latch_fires_once_per_press() {
        let mut latch = ChordLatch::new("ctrl+p");
        assert!(!latch.update(false));
        assert!(latch.update(true));
        assert!(!latch.update(true));
        assert!(!latch.update(false));
        assert!(latch.update(true));
    }

    #[test]
    fn actions_follow_keyboard() {
        let hub = InputHub::new();
        let keyboard = KeyboardTracker::attach(&hub);
        let mut actions = ActionBindings::default();

        hub.dispatch(&InputEvent::key_down(KeyCode::CTRL, ctrl()));
        assert!(actions.poll(&keyboard).is_empty());

        hub.dispatch(&InputEvent::key_down(KeyCode::letter(b'P'), ctrl()));
        assert_eq!(actions.poll(&keyboard), vec![Action::ExportFrame]);
        // Still held: no repeat.
        assert!(actions.poll(&keyboard).is_empty());

        hub.dispatch(&InputEvent::key_up(KeyCode::letter(b'P'), ctrl()));
        hub.dispatch(&InputEvent::key_down(KeyCode::letter(b'T'), ctrl()));
        assert_eq!(actions.poll(&keyboard), vec![Action::ToggleExportFormat]);
    }

    #[test]
    fn plain_letter_does_not_trigger_action() {
        let hub = InputHub::new();
        let keyboard = KeyboardTracker::attach(&hub);
        let mut actions = ActionBindings::default();

        hub.dispatch(&InputEvent::key_down(KeyCode::letter(b'O'), Modifiers::default()));
        assert!(actions.poll(&keyboard).is_empty());
    }

    #[test]
    fn motion_table_covers_every_axis_both_ways() {
        let bindings = default_motion_bindings();
        assert_eq!(bindings.len(), 10);
        for target in [
            MotionTarget::Rotate(Axis::X),
            MotionTarget::Rotate(Axis::Y),
            MotionTarget::Rotate(Axis::Z),
            MotionTarget::Move(Axis::X),
            MotionTarget::Move(Axis::Z),
        ] {
            let sum: f32 = bindings.iter().filter(|b| b.target == target).map(|b| b.sign).sum();
            assert_eq!(sum, 0.0, "{target:?} not balanced");
        }
        assert!(bindings.iter().all(|b| !b.chord.is_unsatisfiable()));
    }

    #[test]
    fn action_keys_stay_out_of_motion_table() {
        let motion_keys: Vec<ChordPart> = default_motion_bindings()
            .iter()
            .flat_map(|b| b.chord.parts().to_vec())
            .filter(|p| matches!(p, ChordPart::Key(_)))
            .collect();

        let actions = ActionBindings::default();
        assert_eq!(actions.chords().count(), 3);
        for (action, chord) in actions.chords() {
            for part in chord.parts() {
                assert!(!motion_keys.contains(part), "{action:?} shares {part:?} with a motion chord");
            }
        }
    }
}
