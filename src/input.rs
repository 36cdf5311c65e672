//! Mouse routing onto decoration elements.
//!
//! The host forwards raw crossterm mouse events; this adapter hit-tests
//! the event row against live marker lines and turns cursor movement
//! into per-element pointer enter/leave pairs, and left clicks into
//! click interactions. The addon emits the resulting interactions after
//! releasing its state borrow, so handlers are free to mutate the
//! registry.

use std::rc::Rc;

use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};

use crate::command::MarkerId;
use crate::registry::DecorationRegistry;
use crate::surface::{Element, PointerInteraction};

/// Tracks which decoration the cursor is currently over.
#[derive(Default)]
pub struct MouseRouter {
    hovered: Option<(MarkerId, Rc<Element>)>,
}

impl MouseRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hovered(&self) -> Option<MarkerId> {
        self.hovered.as_ref().map(|(id, _)| *id)
    }

    /// Translate one mouse event into pointer interactions to emit.
    pub(crate) fn route(
        &mut self,
        registry: &DecorationRegistry,
        event: &MouseEvent,
    ) -> Vec<(Rc<Element>, PointerInteraction)> {
        let line = event.row as usize;
        match event.kind {
            MouseEventKind::Moved => {
                let hit = registry.element_at_line(line);
                let hit_id = hit.as_ref().map(|(id, _)| *id);
                if hit_id == self.hovered() {
                    return Vec::new();
                }
                let mut interactions = Vec::new();
                if let Some((_, element)) = self.hovered.take() {
                    interactions.push((element, PointerInteraction::Leave));
                }
                if let Some((id, element)) = hit {
                    interactions.push((Rc::clone(&element), PointerInteraction::Enter));
                    self.hovered = Some((id, element));
                }
                interactions
            }
            MouseEventKind::Down(MouseButton::Left) => registry
                .element_at_line(line)
                .map(|(_, element)| vec![(element, PointerInteraction::Click)])
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    /// Forget the hovered element, e.g. after the registry was cleared.
    pub fn reset(&mut self) {
        self.hovered = None;
    }
}
