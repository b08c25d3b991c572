//! Typed publish/subscribe channel for cross-component auth signals.
//!
//! SYSTEM CONTEXT
//! ==============
//! The route guard learns about authentication out of band (storage fast
//! paths, recent logins, refreshed identities) and has to tell the central
//! `AuthStore` without depending on it. It publishes an [`AuthSuccess`] on the
//! process-wide channel; the store subscribes and reconciles.
//!
//! DESIGN
//! ======
//! Delivery is synchronous and in publish order. Listeners are snapshotted
//! before dispatch so a listener may subscribe, unsubscribe or publish again
//! without tripping a `RefCell` borrow. Dropping a [`Subscription`] detaches
//! its listener.

#[cfg(test)]
#[path = "events_test.rs"]
mod events_test;

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::net::types::CachedUser;

/// The `authSuccess` reconciliation signal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthSuccess {
    pub user: CachedUser,
}

type Listener<E> = Rc<dyn Fn(&E)>;

struct ChannelInner<E> {
    next_id: Cell<u64>,
    listeners: RefCell<Vec<(u64, Listener<E>)>>,
}

/// Cloneable handle to a shared channel carrying events of type `E`.
pub struct EventChannel<E> {
    inner: Rc<ChannelInner<E>>,
}

impl<E> Clone for EventChannel<E> {
    fn clone(&self) -> Self {
        Self { inner: Rc::clone(&self.inner) }
    }
}

impl<E: 'static> Default for EventChannel<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: 'static> EventChannel<E> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(ChannelInner { next_id: Cell::new(0), listeners: RefCell::new(Vec::new()) }),
        }
    }

    /// Register `listener`; it stays attached while the returned handle lives.
    pub fn subscribe(&self, listener: impl Fn(&E) + 'static) -> Subscription {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        self.inner.listeners.borrow_mut().push((id, Rc::new(listener)));

        let weak: Weak<ChannelInner<E>> = Rc::downgrade(&self.inner);
        Subscription {
            detach: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.listeners.borrow_mut().retain(|(lid, _)| *lid != id);
                }
            })),
        }
    }

    /// Deliver `event` to every current listener. Returns the delivery count.
    pub fn publish(&self, event: &E) -> usize {
        let snapshot: Vec<Listener<E>> =
            self.inner.listeners.borrow().iter().map(|(_, l)| Rc::clone(l)).collect();
        for listener in &snapshot {
            listener(event);
        }
        snapshot.len()
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }
}

/// Handle detaching its listener on drop.
#[must_use = "dropping a Subscription detaches the listener"]
pub struct Subscription {
    detach: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Keep the listener attached for the life of the channel.
    pub fn forget(mut self) {
        self.detach = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

thread_local! {
    static AUTH_EVENTS: EventChannel<AuthSuccess> = EventChannel::new();
}

/// The process-wide `authSuccess` channel.
#[must_use]
pub fn auth_events() -> EventChannel<AuthSuccess> {
    AUTH_EVENTS.with(EventChannel::clone)
}
