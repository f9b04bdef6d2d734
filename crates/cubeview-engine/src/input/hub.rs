use std::cell::RefCell;
use std::rc::{Rc, Weak};

use super::types::InputEvent;

type Listener = Rc<dyn Fn(&InputEvent)>;

#[derive(Default)]
struct HubInner {
    next_id: u64,
    listeners: Vec<(u64, Listener)>,
}

/// Per-window broadcast source of input events.
///
/// The runtime dispatches every translated event here. Listeners register with
/// `subscribe` and stay registered until the returned `Subscription` is dropped.
///
/// Single-threaded by construction (`Rc`): event delivery and frame callbacks
/// run on the same event-loop thread.
#[derive(Clone, Default)]
pub struct InputHub {
    inner: Rc<RefCell<HubInner>>,
}

impl InputHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: impl Fn(&InputEvent) + 'static) -> Subscription {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.listeners.push((id, Rc::new(listener)));
        log::debug!("input listener {id} attached");

        Subscription {
            hub: Rc::downgrade(&self.inner),
            id,
        }
    }

    /// Delivers `ev` to every listener registered at the start of the call.
    pub fn dispatch(&self, ev: &InputEvent) {
        // Snapshot so listeners may subscribe/unsubscribe while being notified.
        let snapshot: Vec<Listener> = self
            .inner
            .borrow()
            .listeners
            .iter()
            .map(|(_, l)| Rc::clone(l))
            .collect();

        for listener in snapshot {
            listener(ev);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }
}

/// Registration handle. Dropping it detaches the listener.
#[must_use = "dropping a Subscription detaches the listener immediately"]
pub struct Subscription {
    hub: Weak<RefCell<HubInner>>,
    id: u64,
}

impl Subscription {
    pub fn is_attached(&self) -> bool {
        self.hub
            .upgrade()
            .is_some_and(|inner| inner.borrow().listeners.iter().any(|(id, _)| *id == self.id))
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(inner) = self.hub.upgrade() else { return };
        inner.borrow_mut().listeners.retain(|(id, _)| *id != self.id);
        log::debug!("input listener {} detached", self.id);
    }
}
