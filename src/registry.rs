//! Decoration registry.
//!
//! Exclusive owner of every live decoration entry and of the singleton
//! in-flight placeholder. Entries are keyed by marker identity; at most
//! one entry exists per identity, and at most one placeholder exists at
//! any time. Creation registers the decoration with the surface and
//! defers all element wiring to the surface's render callback.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::addon::AddonState;
use crate::command::{CommandRecord, DecorationKind, MarkerId};
use crate::config::DecorationConfig;
use crate::error::DecorationError;
use crate::events::Subscription;
use crate::style;
use crate::surface::{Decoration, DecorationOptions, DecorationSurface};
use crate::visibility::VisibilityFlags;

/// Everything decoration creation needs besides the registry itself:
/// the surface to register with, the current visibility flags, a config
/// snapshot for styling, and a weak handle for the deferred render
/// callback.
pub(crate) struct RegisterContext {
    pub surface: Rc<dyn DecorationSurface>,
    pub flags: VisibilityFlags,
    pub config: DecorationConfig,
    pub state: Weak<RefCell<AddonState>>,
}

/// One live decoration owned by the registry.
pub struct DecorationEntry {
    pub decoration: Rc<dyn Decoration>,
    /// Disposable pointer-event subscriptions installed on the element.
    pub interaction_handlers: Vec<Subscription>,
    /// Snapshot of the command's status at creation time.
    pub kind: DecorationKind,
    /// The decorated command, kept for hover and menu dispatch.
    pub command: Rc<CommandRecord>,
    seq: u64,
}

impl DecorationEntry {
    fn dispose(self) {
        self.decoration.dispose();
        // interaction_handlers unsubscribe on drop
    }
}

#[derive(Default)]
pub struct DecorationRegistry {
    entries: HashMap<MarkerId, DecorationEntry>,
    placeholder: Option<(MarkerId, DecorationEntry)>,
    next_seq: u64,
}

impl DecorationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of finished/generic entries, excluding the placeholder.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.placeholder.is_none()
    }

    pub fn has_placeholder(&self) -> bool {
        self.placeholder.is_some()
    }

    pub fn placeholder_marker(&self) -> Option<MarkerId> {
        self.placeholder.as_ref().map(|(id, _)| *id)
    }

    pub fn marker_ids(&self) -> Vec<MarkerId> {
        self.entries.keys().copied().collect()
    }

    pub fn entry(&self, id: MarkerId) -> Option<&DecorationEntry> {
        self.entries.get(&id).or_else(|| {
            self.placeholder
                .as_ref()
                .filter(|(pid, _)| *pid == id)
                .map(|(_, entry)| entry)
        })
    }

    pub(crate) fn entry_mut(&mut self, id: MarkerId) -> Option<&mut DecorationEntry> {
        if self.entries.contains_key(&id) {
            return self.entries.get_mut(&id);
        }
        self.placeholder
            .as_mut()
            .filter(|(pid, _)| *pid == id)
            .map(|(_, entry)| entry)
    }

    /// Entries plus the placeholder, for sweep passes.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (&MarkerId, &DecorationEntry)> {
        self.entries
            .iter()
            .chain(self.placeholder.as_ref().map(|(id, entry)| (id, entry)))
    }

    /// Create the placeholder decoration for a just-started command.
    ///
    /// Returns `None` on the expected absences: decorations disabled, a
    /// generic mark (which cannot have a pre-execution placeholder), or
    /// a command whose marker has not been assigned yet. Any prior
    /// placeholder is disposed first, so at most one ever exists.
    pub(crate) fn create_placeholder(
        &mut self,
        ctx: &RegisterContext,
        command: &Rc<CommandRecord>,
    ) -> Option<MarkerId> {
        if ctx.flags.disabled || command.generic_mark.is_some() {
            return None;
        }
        self.clear_placeholder();
        let marker = command.marker.clone()?;
        let id = marker.id();
        let entry = self.register(ctx, DecorationKind::Placeholder, command)?;
        self.placeholder = Some((id, entry));
        tracing::debug!(marker = id, "created placeholder decoration");
        Some(id)
    }

    /// Create the final decoration for a finished command or a generic
    /// mark.
    ///
    /// A missing marker is a contract violation in the upstream
    /// capability and is propagated. Creation is idempotent per marker
    /// identity; the command's own placeholder, if any, is superseded.
    pub(crate) fn create_final(
        &mut self,
        ctx: &RegisterContext,
        command: &Rc<CommandRecord>,
    ) -> Result<Option<MarkerId>, DecorationError> {
        if ctx.flags.disabled {
            return Ok(None);
        }
        let marker = command
            .marker
            .clone()
            .ok_or_else(|| DecorationError::MissingMarker {
                command: command.command.clone(),
            })?;
        let id = marker.id();
        if self.entries.contains_key(&id) {
            return Ok(Some(id));
        }
        if self.placeholder.as_ref().is_some_and(|(pid, _)| *pid == id) {
            self.clear_placeholder();
        }
        let kind = DecorationKind::of(command, false);
        let Some(entry) = self.register(ctx, kind, command) else {
            return Ok(None);
        };
        self.entries.insert(id, entry);
        tracing::debug!(marker = id, "created command decoration");
        Ok(Some(id))
    }

    fn register(
        &mut self,
        ctx: &RegisterContext,
        kind: DecorationKind,
        command: &Rc<CommandRecord>,
    ) -> Option<DecorationEntry> {
        let marker = command.marker.clone()?;
        let marker_id = marker.id();
        let ruler_color = ctx
            .flags
            .overview_ruler
            .then(|| style::resolve(&kind, &ctx.config.icons()).ruler_color);
        let decoration = ctx.surface.register_decoration(DecorationOptions {
            marker,
            overview_ruler_color: ruler_color,
        })?;

        // All classing, layout and interaction wiring happens once the
        // surface reports the element rendered.
        let state = ctx.state.clone();
        let render_command = Rc::clone(command);
        let render_kind = kind.clone();
        decoration.on_render(Box::new(move |element| {
            if let Some(state) = state.upgrade() {
                state
                    .borrow_mut()
                    .initialize_element(marker_id, &render_command, &render_kind, element);
            }
        }));

        let seq = self.next_seq;
        self.next_seq += 1;
        Some(DecorationEntry {
            decoration,
            interaction_handlers: Vec::new(),
            kind,
            command: Rc::clone(command),
            seq,
        })
    }

    /// Dispose and remove the entry for a marker; no-op when absent.
    pub fn remove_by_marker(&mut self, id: MarkerId) {
        if let Some(entry) = self.entries.remove(&id) {
            entry.dispose();
            tracing::debug!(marker = id, "removed command decoration");
        }
        if self.placeholder.as_ref().is_some_and(|(pid, _)| *pid == id) {
            self.clear_placeholder();
        }
    }

    /// Dispose whichever live decoration was added last, placeholder
    /// included. Used when the capability retracts the current command.
    pub(crate) fn remove_newest(&mut self) {
        let newest = self
            .entries
            .iter()
            .max_by_key(|(_, entry)| entry.seq)
            .map(|(id, entry)| (*id, entry.seq));
        let placeholder_seq = self.placeholder.as_ref().map(|(_, entry)| entry.seq);
        match (newest, placeholder_seq) {
            (Some((_, seq)), Some(placeholder_seq)) if placeholder_seq > seq => {
                self.clear_placeholder();
            }
            (Some((id, _)), _) => self.remove_by_marker(id),
            (None, Some(_)) => self.clear_placeholder(),
            (None, None) => {}
        }
    }

    /// Dispose the placeholder, if any.
    pub(crate) fn clear_placeholder(&mut self) {
        if let Some((id, entry)) = self.placeholder.take() {
            entry.dispose();
            tracing::debug!(marker = id, "cleared placeholder decoration");
        }
    }

    /// Dispose everything: teardown, or the policy switched to never.
    pub fn clear_all(&mut self) {
        let count = self.entries.len();
        for (_, entry) in self.entries.drain() {
            entry.dispose();
        }
        self.clear_placeholder();
        if count > 0 {
            tracing::debug!(count, "cleared all decorations");
        }
    }

    /// Drop entries whose decoration the host already disposed (their
    /// marker scrolled out of the buffer).
    pub(crate) fn prune_disposed(&mut self) {
        self.entries.retain(|_, entry| !entry.decoration.is_disposed());
        if self
            .placeholder
            .as_ref()
            .is_some_and(|(_, entry)| entry.decoration.is_disposed())
        {
            self.placeholder = None;
        }
    }

    /// The live decoration element rendered on `line`, if any.
    pub(crate) fn element_at_line(
        &self,
        line: usize,
    ) -> Option<(MarkerId, Rc<crate::surface::Element>)> {
        self.iter().find_map(|(id, entry)| {
            if entry.decoration.is_disposed() {
                return None;
            }
            let element = entry.decoration.element()?;
            (element.line() == line).then(|| (*id, element))
        })
    }
}
