//! Rendering-surface boundary.
//!
//! The surface (the terminal rendering engine) owns buffer positions and
//! the decoration primitives. This crate talks to it through
//! [`DecorationSurface`] and receives back [`Decoration`] handles whose
//! elements materialize asynchronously: registration returns a handle,
//! and the surface invokes the render callback once the element exists
//! (and again after a buffer-clearing redraw). All classing, layout and
//! interaction wiring happens inside that callback.

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::rc::Rc;

use ratatui::style::Color;

use crate::command::{Marker, MarkerId};
use crate::events::EventEmitter;

/// Geometry stamped onto a decoration element, in the surface's pixel
/// units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementGeometry {
    pub width: f64,
    pub height: f64,
    pub font_size: f64,
    pub margin_left: f64,
}

/// Pointer interaction delivered to a decoration element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerInteraction {
    Enter,
    Leave,
    Click,
}

/// Host-rendered element backing a decoration.
///
/// The surface creates one per rendered decoration and feeds pointer
/// interactions into its emitter; this crate stamps classes and geometry
/// onto it and subscribes interaction handlers.
pub struct Element {
    line: Cell<usize>,
    classes: RefCell<BTreeSet<String>>,
    geometry: Cell<Option<ElementGeometry>>,
    pointer_events: EventEmitter<PointerInteraction>,
}

impl Element {
    pub fn new(line: usize) -> Rc<Self> {
        Rc::new(Self {
            line: Cell::new(line),
            classes: RefCell::new(BTreeSet::new()),
            geometry: Cell::new(None),
            pointer_events: EventEmitter::new(),
        })
    }

    /// Buffer line the element is currently rendered on.
    pub fn line(&self) -> usize {
        self.line.get()
    }

    pub fn set_line(&self, line: usize) {
        self.line.set(line);
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.borrow().contains(class)
    }

    pub fn add_class(&self, class: impl Into<String>) {
        self.classes.borrow_mut().insert(class.into());
    }

    /// Replace the whole class set, e.g. when the style mapping is
    /// recomputed after a theme or icon change.
    pub fn replace_classes(&self, classes: BTreeSet<String>) {
        *self.classes.borrow_mut() = classes;
    }

    pub fn classes(&self) -> BTreeSet<String> {
        self.classes.borrow().clone()
    }

    pub fn geometry(&self) -> Option<ElementGeometry> {
        self.geometry.get()
    }

    pub fn set_geometry(&self, geometry: ElementGeometry) {
        self.geometry.set(Some(geometry));
    }

    pub fn pointer_events(&self) -> &EventEmitter<PointerInteraction> {
        &self.pointer_events
    }
}

impl std::fmt::Debug for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Element")
            .field("line", &self.line.get())
            .field("classes", &self.classes.borrow())
            .field("geometry", &self.geometry.get())
            .finish()
    }
}

/// Options passed to the surface when registering a decoration.
pub struct DecorationOptions {
    pub marker: Rc<Marker>,
    /// Color for the overview-ruler layer; `None` leaves the decoration
    /// out of the ruler entirely.
    pub overview_ruler_color: Option<Color>,
}

/// Callback invoked by the surface once the element exists.
pub type RenderCallback = Box<dyn FnMut(&Rc<Element>)>;

/// A decoration handle owned by the registry, disposable.
pub trait Decoration {
    fn marker_id(&self) -> MarkerId;

    /// The rendered element, once the surface has produced one.
    fn element(&self) -> Option<Rc<Element>>;

    /// Install the render callback. The surface may invoke it more than
    /// once, e.g. with a fresh element after a buffer-clearing redraw.
    fn on_render(&self, callback: RenderCallback);

    /// Update the overview-ruler layer color in place.
    fn set_ruler_color(&self, color: Option<Color>);

    fn dispose(&self);
    fn is_disposed(&self) -> bool;
}

/// The rendering surface's decoration primitive.
pub trait DecorationSurface {
    /// Register a decoration anchored to `options.marker`.
    ///
    /// Returns `None` when the surface cannot host the decoration, e.g.
    /// the marker was already disposed.
    fn register_decoration(&self, options: DecorationOptions) -> Option<Rc<dyn Decoration>>;
}
