//! Command event binder.
//!
//! Translates the command-detection capability's event stream into
//! registry operations. Binding is an explicit state machine with a
//! single entry point: [`bind`] always disposes the previous
//! subscription list before subscribing, so re-binding can never leave
//! two live subscriptions on one upstream event.

use std::cell::RefCell;
use std::rc::Rc;

use crate::addon::AddonState;
use crate::command::InvalidationReason;
use crate::events::Subscription;

/// Holds the binder's subscription list; owned by the addon state.
#[derive(Default)]
pub struct CommandEventBinder {
    subscriptions: Vec<Subscription>,
    bound: bool,
}

impl CommandEventBinder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_bound(&self) -> bool {
        self.bound
    }

    /// Dispose every subscription and leave the unbound state. Safe to
    /// call when already unbound.
    pub fn unbind(&mut self) {
        if self.bound {
            tracing::debug!(
                subscriptions = self.subscriptions.len(),
                "unbinding command event binder"
            );
        }
        self.subscriptions.clear();
        self.bound = false;
    }
}

/// Bind to the command-detection capability, if present.
///
/// The sequence: place a placeholder for any currently-executing
/// command, subscribe to the lifecycle events, and replay every
/// already-known finished command so decorations exist for commands
/// that finished before this addon attached.
///
/// Must not be called while `state` is borrowed.
pub(crate) fn bind(state: &Rc<RefCell<AddonState>>) {
    let weak = Rc::downgrade(state);
    let mut st = state.borrow_mut();

    // Always dispose the previous bindings first; a second bind without
    // an unbind must not duplicate subscriptions.
    st.binder.unbind();

    let Some(capability) = st.command_detection() else {
        return;
    };

    if let Some(command) = capability.executing_command() {
        if command.marker.is_some() {
            st.create_placeholder(&command);
        }
    }

    let mut subscriptions = Vec::with_capacity(4);

    let on_started = {
        let weak = weak.clone();
        capability.on_command_started().subscribe(move |command| {
            if let Some(state) = weak.upgrade() {
                state.borrow_mut().create_placeholder(command);
            }
        })
    };
    subscriptions.push(on_started);

    // Replay history: covers commands that finished before this addon
    // attached, e.g. after a reload.
    for command in capability.commands() {
        st.create_final_or_panic(&command);
    }

    let on_finished = {
        let weak = weak.clone();
        capability.on_command_finished().subscribe(move |command| {
            if let Some(state) = weak.upgrade() {
                state.borrow_mut().create_final_or_panic(command);
            }
        })
    };
    subscriptions.push(on_finished);

    let on_invalidated = {
        let weak = weak.clone();
        capability.on_command_invalidated().subscribe(move |commands| {
            let Some(state) = weak.upgrade() else {
                return;
            };
            let host = {
                let mut st = state.borrow_mut();
                for command in commands {
                    if let Some(id) = command.marker_id() {
                        st.registry.remove_by_marker(id);
                    }
                }
                st.prune_pointer_state()
            };
            // A removed decoration may have been showing a hover.
            if let Some(host) = host {
                host.hide_hover();
            }
        })
    };
    subscriptions.push(on_invalidated);

    let on_current_invalidated = {
        let weak = weak.clone();
        capability
            .on_current_command_invalidated()
            .subscribe(move |reason| {
                let Some(state) = weak.upgrade() else {
                    return;
                };
                let host = {
                    let mut st = state.borrow_mut();
                    match reason {
                        // The just-started command is being retracted.
                        InvalidationReason::NoProblemsReported => st.registry.remove_newest(),
                        // Finished decorations keep their markers; only
                        // the in-flight placeholder is stale.
                        InvalidationReason::HostRedraw => st.registry.clear_placeholder(),
                    }
                    st.prune_pointer_state()
                };
                if let Some(host) = host {
                    host.hide_hover();
                }
            })
    };
    subscriptions.push(on_current_invalidated);

    st.binder.subscriptions = subscriptions;
    st.binder.bound = true;
    tracing::debug!("command event binder bound");
}
