use std::cell::{Ref, RefCell};
use std::rc::Rc;

use super::chord::Chord;
use super::hub::{InputHub, Subscription};
use super::keyboard::KeyboardState;
use super::types::InputEvent;

/// Keyboard state bound to an `InputHub` for the lifetime of a view.
///
/// Registers on construction; dropping the tracker deregisters. Press/release
/// handlers run on hub dispatch, queries are answered from the latest state.
pub struct KeyboardTracker {
    state: Rc<RefCell<KeyboardState>>,
    subscription: Subscription,
}

impl KeyboardTracker {
    pub fn attach(hub: &InputHub) -> Self {
        let state = Rc::new(RefCell::new(KeyboardState::new()));

        let sink = Rc::clone(&state);
        let subscription = hub.subscribe(move |ev: &InputEvent| {
            match ev {
                InputEvent::Key { .. } => sink.borrow_mut().apply_event(ev),
                InputEvent::Focused(false) => sink.borrow_mut().release_all(),
                _ => {}
            }
        });

        Self {
            state,
            subscription,
        }
    }

    /// True when every component of `descriptor` is currently held.
    pub fn is_held(&self, descriptor: &str) -> bool {
        self.state.borrow().is_held(descriptor)
    }

    pub fn chord_held(&self, chord: &Chord) -> bool {
        self.state.borrow().chord_held(chord)
    }

    pub fn state(&self) -> Ref<'_, KeyboardState> {
        self.state.borrow()
    }

    pub fn is_attached(&self) -> bool {
        self.subscription.is_attached()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{KeyCode, Modifiers};

    #[test]
    fn tracks_events_from_hub() {
        let hub = InputHub::new();
        let tracker = KeyboardTracker::attach(&hub);
        let ctrl = Modifiers {
            ctrl: true,
            ..Default::default()
        };

        hub.dispatch(&InputEvent::key_down(KeyCode::CTRL, ctrl));
        hub.dispatch(&InputEvent::key_down(KeyCode::UP, ctrl));
        assert!(tracker.is_held("ctrl+up"));

        hub.dispatch(&InputEvent::key_up(KeyCode::CTRL, Modifiers::default()));
        assert!(!tracker.is_held("ctrl+up"));
        assert!(tracker.is_held("up"));
    }

    #[test]
    fn focus_loss_releases_everything() {
        let hub = InputHub::new();
        let tracker = KeyboardTracker::attach(&hub);
        hub.dispatch(&InputEvent::key_down(KeyCode::letter(b'W'), Modifiers::default()));
        assert!(tracker.is_held("w"));

        hub.dispatch(&InputEvent::Focused(false));
        assert!(!tracker.is_held("w"));
    }

    #[test]
    fn drop_deregisters_listener() {
        let hub = InputHub::new();
        let tracker = KeyboardTracker::attach(&hub);
        assert_eq!(hub.listener_count(), 1);
        assert!(tracker.is_attached());
        drop(tracker);
        assert_eq!(hub.listener_count(), 0);
    }

    #[test]
    fn independent_trackers_per_view() {
        let hub_a = InputHub::new();
        let hub_b = InputHub::new();
        let a = KeyboardTracker::attach(&hub_a);
        let b = KeyboardTracker::attach(&hub_b);

        hub_a.dispatch(&InputEvent::key_down(KeyCode::SPACE, Modifiers::default()));
        assert!(a.is_held("space"));
        assert!(!b.is_held("space"));
    }
}
