//! Single-threaded event emitter with disposable subscriptions.
//!
//! Every lifecycle notification in this crate (command started/finished,
//! capability attach/detach, pointer interactions, outbound run requests)
//! flows through an [`EventEmitter`]. Listeners are registered with
//! [`EventEmitter::subscribe`], which returns a [`Subscription`]; dropping
//! the subscription removes the listener. Emission is reentrancy-safe:
//! listeners may subscribe or unsubscribe on the same emitter while an
//! emit pass is running.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

type Listener<T> = Box<dyn FnMut(&T)>;

struct EmitterInner<T> {
    next_id: u64,
    listeners: Vec<(u64, Listener<T>)>,
    /// Listeners added while an emit pass is running.
    pending: Vec<(u64, Listener<T>)>,
    /// Ids unsubscribed while an emit pass is running.
    dead: Vec<u64>,
    /// Values emitted re-entrantly, delivered after the current pass.
    queued: Vec<T>,
    emitting: bool,
}

/// A cheaply clonable handle to a listener list.
///
/// Cloning the emitter clones the handle, not the listeners; all clones
/// share the same subscriber set.
pub struct EventEmitter<T> {
    inner: Rc<RefCell<EmitterInner<T>>>,
}

impl<T> Clone for EventEmitter<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: 'static> Default for EventEmitter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> EventEmitter<T> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(EmitterInner {
                next_id: 0,
                listeners: Vec::new(),
                pending: Vec::new(),
                dead: Vec::new(),
                queued: Vec::new(),
                emitting: false,
            })),
        }
    }

    /// Register a listener. The listener stays active until the returned
    /// [`Subscription`] is dropped or explicitly disposed.
    pub fn subscribe(&self, listener: impl FnMut(&T) + 'static) -> Subscription {
        let id = {
            let mut inner = self.inner.borrow_mut();
            inner.next_id += 1;
            let id = inner.next_id;
            if inner.emitting {
                inner.pending.push((id, Box::new(listener)));
            } else {
                inner.listeners.push((id, Box::new(listener)));
            }
            id
        };
        let weak = Rc::downgrade(&self.inner);
        Subscription::new(move || unsubscribe(&weak, id))
    }

    /// Invoke every active listener with `value`.
    ///
    /// A listener emitting on its own emitter does not re-enter the
    /// running pass; the value is queued and delivered once the pass
    /// completes.
    pub fn emit(&self, value: &T)
    where
        T: Clone,
    {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.emitting {
                inner.queued.push(value.clone());
                return;
            }
        }
        self.deliver(value);
        loop {
            let next = {
                let mut inner = self.inner.borrow_mut();
                if inner.queued.is_empty() {
                    None
                } else {
                    Some(inner.queued.remove(0))
                }
            };
            match next {
                Some(next) => self.deliver(&next),
                None => break,
            }
        }
    }

    fn deliver(&self, value: &T) {
        let mut listeners = {
            let mut inner = self.inner.borrow_mut();
            inner.emitting = true;
            std::mem::take(&mut inner.listeners)
        };

        for (id, listener) in listeners.iter_mut() {
            let removed = self.inner.borrow().dead.contains(id);
            if !removed {
                listener(value);
            }
        }

        let mut inner = self.inner.borrow_mut();
        let dead = std::mem::take(&mut inner.dead);
        listeners.retain(|(id, _)| !dead.contains(id));
        let mut pending = std::mem::take(&mut inner.pending);
        listeners.append(&mut pending);
        inner.listeners = listeners;
        inner.emitting = false;
    }

    /// Number of active listeners (including ones added mid-emit).
    pub fn listener_count(&self) -> usize {
        let inner = self.inner.borrow();
        (inner.listeners.len() + inner.pending.len()).saturating_sub(inner.dead.len())
    }
}

fn unsubscribe<T>(inner: &Weak<RefCell<EmitterInner<T>>>, id: u64) {
    if let Some(inner) = inner.upgrade() {
        let mut inner = inner.borrow_mut();
        if inner.emitting {
            inner.dead.push(id);
        } else {
            inner.listeners.retain(|(lid, _)| *lid != id);
            inner.pending.retain(|(lid, _)| *lid != id);
        }
    }
}

/// Handle for a registered listener; dropping it unsubscribes.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Explicitly remove the listener now instead of at drop time.
    pub fn dispose(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
