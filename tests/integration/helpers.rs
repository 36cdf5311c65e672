//! Mock collaborators shared across the integration tests.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use ratatui::style::Color;

use termdeco::{
    Capabilities, ClipboardError, CommandDetection, CommandRecord, Decoration,
    DecorationConfig, DecorationOptions, DecorationSurface, Element, EventEmitter,
    InteractionHost, InvalidationReason, Marker, MarkerId, MenuAction, RenderCallback,
};

// ============================================================================
// Surface mock
// ============================================================================

/// A decoration as the rendering surface would host it. Rendering is
/// explicit: the surface invokes the render callback only when the test
/// calls [`MockDecoration::render`], mirroring the asynchronous
/// element creation of a real surface.
pub struct MockDecoration {
    marker: Rc<Marker>,
    ruler_color: Cell<Option<Color>>,
    element: RefCell<Option<Rc<Element>>>,
    callback: RefCell<Option<RenderCallback>>,
    disposed: Cell<bool>,
}

impl MockDecoration {
    fn new(options: DecorationOptions) -> Self {
        Self {
            marker: options.marker,
            ruler_color: Cell::new(options.overview_ruler_color),
            element: RefCell::new(None),
            callback: RefCell::new(None),
            disposed: Cell::new(false),
        }
    }

    pub fn ruler_color(&self) -> Option<Color> {
        self.ruler_color.get()
    }

    /// Produce a fresh element at the marker's line and run the render
    /// callback, as the surface does on first render and after a
    /// buffer-clearing redraw.
    pub fn render(&self) -> Rc<Element> {
        let element = Element::new(self.marker.line());
        *self.element.borrow_mut() = Some(Rc::clone(&element));
        let mut callback = self.callback.borrow_mut();
        if let Some(callback) = callback.as_mut() {
            callback(&element);
        }
        element
    }

    /// Re-run the render callback against the existing element, as a
    /// surface repaint would.
    pub fn render_again(&self) {
        let element = self
            .element
            .borrow()
            .clone()
            .expect("render_again requires a prior render");
        let mut callback = self.callback.borrow_mut();
        if let Some(callback) = callback.as_mut() {
            callback(&element);
        }
    }
}

impl Decoration for MockDecoration {
    fn marker_id(&self) -> MarkerId {
        self.marker.id()
    }

    fn element(&self) -> Option<Rc<Element>> {
        self.element.borrow().clone()
    }

    fn on_render(&self, callback: RenderCallback) {
        *self.callback.borrow_mut() = Some(callback);
    }

    fn set_ruler_color(&self, color: Option<Color>) {
        self.ruler_color.set(color);
    }

    fn dispose(&self) {
        self.disposed.set(true);
    }

    fn is_disposed(&self) -> bool {
        self.disposed.get() || self.marker.is_disposed()
    }
}

#[derive(Default)]
pub struct MockSurface {
    decorations: RefCell<Vec<Rc<MockDecoration>>>,
}

impl MockSurface {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Render every registered decoration that has no element yet.
    pub fn render_all(&self) {
        let pending: Vec<Rc<MockDecoration>> = self
            .decorations
            .borrow()
            .iter()
            .filter(|d| !d.is_disposed() && d.element().is_none())
            .cloned()
            .collect();
        for decoration in pending {
            decoration.render();
        }
    }

    /// Every registration the surface has seen, disposed ones included.
    pub fn all(&self) -> Vec<Rc<MockDecoration>> {
        self.decorations.borrow().clone()
    }

    pub fn live(&self) -> Vec<Rc<MockDecoration>> {
        self.decorations
            .borrow()
            .iter()
            .filter(|d| !d.is_disposed())
            .cloned()
            .collect()
    }

    pub fn decoration_for(&self, id: MarkerId) -> Option<Rc<MockDecoration>> {
        self.live().into_iter().find(|d| d.marker_id() == id)
    }
}

impl DecorationSurface for MockSurface {
    fn register_decoration(&self, options: DecorationOptions) -> Option<Rc<dyn Decoration>> {
        if options.marker.is_disposed() {
            return None;
        }
        let decoration = Rc::new(MockDecoration::new(options));
        self.decorations.borrow_mut().push(Rc::clone(&decoration));
        Some(decoration)
    }
}

// ============================================================================
// Command-detection mock
// ============================================================================

#[derive(Default)]
pub struct MockCommandDetection {
    commands: RefCell<Vec<Rc<CommandRecord>>>,
    executing: RefCell<Option<Rc<CommandRecord>>>,
    started: EventEmitter<Rc<CommandRecord>>,
    finished: EventEmitter<Rc<CommandRecord>>,
    invalidated: EventEmitter<Vec<Rc<CommandRecord>>>,
    current_invalidated: EventEmitter<InvalidationReason>,
}

impl MockCommandDetection {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Seed a finished command without emitting an event (pre-attach
    /// history).
    pub fn push_history(&self, command: Rc<CommandRecord>) {
        self.commands.borrow_mut().push(command);
    }

    /// Seed the currently-executing command without emitting an event.
    pub fn set_executing(&self, command: Rc<CommandRecord>) {
        *self.executing.borrow_mut() = Some(command);
    }

    pub fn start_command(&self, command: Rc<CommandRecord>) {
        *self.executing.borrow_mut() = Some(Rc::clone(&command));
        self.started.emit(&command);
    }

    pub fn finish_command(&self, command: Rc<CommandRecord>) {
        *self.executing.borrow_mut() = None;
        self.commands.borrow_mut().push(Rc::clone(&command));
        self.finished.emit(&command);
    }

    pub fn invalidate(&self, commands: Vec<Rc<CommandRecord>>) {
        self.commands
            .borrow_mut()
            .retain(|known| !commands.iter().any(|c| Rc::ptr_eq(known, c)));
        self.invalidated.emit(&commands);
    }

    pub fn invalidate_current(&self, reason: InvalidationReason) {
        *self.executing.borrow_mut() = None;
        self.current_invalidated.emit(&reason);
    }

    pub fn started_listeners(&self) -> usize {
        self.started.listener_count()
    }

    pub fn finished_listeners(&self) -> usize {
        self.finished.listener_count()
    }

    pub fn invalidated_listeners(&self) -> usize {
        self.invalidated.listener_count()
    }

    pub fn current_invalidated_listeners(&self) -> usize {
        self.current_invalidated.listener_count()
    }
}

impl CommandDetection for MockCommandDetection {
    fn commands(&self) -> Vec<Rc<CommandRecord>> {
        self.commands.borrow().clone()
    }

    fn executing_command(&self) -> Option<Rc<CommandRecord>> {
        self.executing.borrow().clone()
    }

    fn on_command_started(&self) -> &EventEmitter<Rc<CommandRecord>> {
        &self.started
    }

    fn on_command_finished(&self) -> &EventEmitter<Rc<CommandRecord>> {
        &self.finished
    }

    fn on_command_invalidated(&self) -> &EventEmitter<Vec<Rc<CommandRecord>>> {
        &self.invalidated
    }

    fn on_current_command_invalidated(&self) -> &EventEmitter<InvalidationReason> {
        &self.current_invalidated
    }
}

// ============================================================================
// Clipboard and interaction-host mocks
// ============================================================================

#[derive(Default)]
pub struct RecordingClipboard {
    pub texts: RefCell<Vec<String>>,
    pub fail: Cell<bool>,
}

impl RecordingClipboard {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }
}

impl termdeco::Clipboard for RecordingClipboard {
    fn set_text(&self, text: &str) -> Result<(), ClipboardError> {
        if self.fail.get() {
            return Err(ClipboardError::Unavailable);
        }
        self.texts.borrow_mut().push(text.to_string());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    Hover(MarkerId, String),
    HideHover,
    Menu(MarkerId, Vec<MenuAction>),
    Link(String),
}

#[derive(Default)]
pub struct RecordingHost {
    pub events: RefCell<Vec<HostEvent>>,
}

impl RecordingHost {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn take_events(&self) -> Vec<HostEvent> {
        std::mem::take(&mut self.events.borrow_mut())
    }
}

impl InteractionHost for RecordingHost {
    fn show_hover(&self, marker_id: MarkerId, text: &str) {
        self.events
            .borrow_mut()
            .push(HostEvent::Hover(marker_id, text.to_string()));
    }

    fn hide_hover(&self) {
        self.events.borrow_mut().push(HostEvent::HideHover);
    }

    fn show_context_menu(&self, marker_id: MarkerId, actions: &[MenuAction]) {
        self.events
            .borrow_mut()
            .push(HostEvent::Menu(marker_id, actions.to_vec()));
    }

    fn open_link(&self, url: &str) {
        self.events.borrow_mut().push(HostEvent::Link(url.to_string()));
    }
}

// ============================================================================
// Record builders
// ============================================================================

pub fn running_command(id: MarkerId, line: usize, text: &str) -> Rc<CommandRecord> {
    Rc::new(CommandRecord::new(text, Some(Marker::new(id, line))))
}

pub fn finished_command(
    id: MarkerId,
    line: usize,
    text: &str,
    exit_code: i32,
) -> Rc<CommandRecord> {
    Rc::new(CommandRecord::new(text, Some(Marker::new(id, line))).with_exit_code(exit_code))
}

/// A config with a short hover delay so tests can tick past it quickly.
pub fn test_config() -> DecorationConfig {
    DecorationConfig {
        hover_delay_ms: 10,
        ..DecorationConfig::default()
    }
}

/// Addon + mocks, activated and ready.
pub struct Fixture {
    pub addon: termdeco::CommandDecorationAddon,
    pub surface: Rc<MockSurface>,
    pub capability: Rc<MockCommandDetection>,
    pub capabilities: Rc<Capabilities>,
    pub clipboard: Rc<RecordingClipboard>,
    pub host: Rc<RecordingHost>,
}

impl Fixture {
    pub fn activated() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: DecorationConfig) -> Self {
        let addon = termdeco::CommandDecorationAddon::new(config);
        let surface = MockSurface::new();
        let capability = MockCommandDetection::new();
        let capabilities = Capabilities::new();
        let clipboard = RecordingClipboard::new();
        let host = RecordingHost::new();

        addon.set_clipboard(Rc::clone(&clipboard) as Rc<dyn termdeco::Clipboard>);
        addon.set_interaction_host(Rc::clone(&host) as Rc<dyn InteractionHost>);
        capabilities.set_command_detection(
            Rc::clone(&capability) as Rc<dyn CommandDetection>
        );
        addon.activate(
            Rc::clone(&surface) as Rc<dyn DecorationSurface>,
            Rc::clone(&capabilities),
        );

        Self {
            addon,
            surface,
            capability,
            capabilities,
            clipboard,
            host,
        }
    }
}
