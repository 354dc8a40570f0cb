//! Listener registry keyed by [`EventKind`].

use std::sync::Arc;

use crate::types::{ConnectionEvent, EventKind};

/// Callback registered for one event kind.
///
/// Identity is the identity of the `Arc`: keep a clone of the handle you
/// registered to remove it later.
pub type Listener = Arc<dyn Fn(&ConnectionEvent) + Send + Sync>;

/// Wraps a closure into a [`Listener`].
pub fn listener<F>(f: F) -> Listener
where
    F: Fn(&ConnectionEvent) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Ordered listeners per event kind. Entries are a sequence, not a set:
/// registering the same handle twice delivers twice.
#[derive(Default)]
pub(crate) struct ListenerRegistry {
    open: Vec<Listener>,
    close: Vec<Listener>,
    message: Vec<Listener>,
    error: Vec<Listener>,
}

impl ListenerRegistry {
    fn slot(&self, kind: EventKind) -> &Vec<Listener> {
        match kind {
            EventKind::Open => &self.open,
            EventKind::Close => &self.close,
            EventKind::Message => &self.message,
            EventKind::Error => &self.error,
        }
    }

    fn slot_mut(&mut self, kind: EventKind) -> &mut Vec<Listener> {
        match kind {
            EventKind::Open => &mut self.open,
            EventKind::Close => &mut self.close,
            EventKind::Message => &mut self.message,
            EventKind::Error => &mut self.error,
        }
    }

    pub(crate) fn add(&mut self, kind: EventKind, listener: Listener) {
        self.slot_mut(kind).push(listener);
    }

    /// Removes the first entry registered with this handle. Returns `false`
    /// if it was not registered.
    pub(crate) fn remove(&mut self, kind: EventKind, listener: &Listener) -> bool {
        let slot = self.slot_mut(kind);
        match slot
            .iter()
            .position(|l| std::ptr::addr_eq(Arc::as_ptr(l), Arc::as_ptr(listener)))
        {
            Some(pos) => {
                slot.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Clones the handles for `kind`, in registration order, so they can be
    /// invoked without holding the registry lock.
    pub(crate) fn snapshot(&self, kind: EventKind) -> Vec<Listener> {
        self.slot(kind).clone()
    }

    pub(crate) fn len(&self, kind: EventKind) -> usize {
        self.slot(kind).len()
    }
}
