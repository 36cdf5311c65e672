//! The command decoration addon.
//!
//! Outer component tying the registry, event binder, visibility
//! controller and interaction builder together, and the only piece the
//! host talks to. Everything runs on the host's UI thread in response
//! to discrete events; the one latency-introducing operation is the
//! hover debounce, pumped through [`CommandDecorationAddon::tick`].

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Instant;

use crossterm::event::MouseEvent;

use crate::binder::{self, CommandEventBinder};
use crate::clipboard::Clipboard;
use crate::command::{
    Capabilities, CommandDetection, CommandRecord, DecorationKind, MarkerId,
};
use crate::config::DecorationConfig;
use crate::error::DecorationError;
use crate::events::{EventEmitter, Subscription};
use crate::input::MouseRouter;
use crate::interaction::{
    self, HoverController, InteractionHost, MenuAction, RunCommandRequest,
};
use crate::layout;
use crate::registry::{DecorationRegistry, RegisterContext};
use crate::style::{self, ThemeColors};
use crate::surface::{DecorationSurface, Element, PointerInteraction};
use crate::visibility::VisibilityModeController;

/// Mutable state shared (via `Rc<RefCell<..>>`) between the addon's
/// public surface and the deferred callbacks it installs.
pub(crate) struct AddonState {
    pub(crate) self_ref: Weak<RefCell<AddonState>>,
    pub(crate) surface: Option<Rc<dyn DecorationSurface>>,
    pub(crate) capabilities: Option<Rc<Capabilities>>,
    /// Capability attach/detach subscriptions; distinct from the
    /// binder's per-event subscriptions.
    pub(crate) lifecycle_subs: Vec<Subscription>,
    pub(crate) registry: DecorationRegistry,
    pub(crate) binder: CommandEventBinder,
    pub(crate) visibility: VisibilityModeController,
    pub(crate) hover: HoverController,
    pub(crate) mouse: MouseRouter,
    pub(crate) config: DecorationConfig,
    pub(crate) run_requests: EventEmitter<RunCommandRequest>,
    pub(crate) clipboard: Option<Rc<dyn Clipboard>>,
    pub(crate) interaction_host: Option<Rc<dyn InteractionHost>>,
}

impl AddonState {
    pub(crate) fn command_detection(&self) -> Option<Rc<dyn CommandDetection>> {
        self.capabilities
            .as_ref()
            .and_then(|capabilities| capabilities.command_detection())
    }

    fn register_context(&self) -> Option<RegisterContext> {
        let surface = self.surface.clone()?;
        Some(RegisterContext {
            surface,
            flags: self.visibility.flags(),
            config: self.config.clone(),
            state: self.self_ref.clone(),
        })
    }

    pub(crate) fn create_placeholder(&mut self, command: &Rc<CommandRecord>) -> Option<MarkerId> {
        let ctx = self.register_context()?;
        self.registry.create_placeholder(&ctx, command)
    }

    pub(crate) fn create_final(
        &mut self,
        command: &Rc<CommandRecord>,
    ) -> Result<Option<MarkerId>, DecorationError> {
        let Some(ctx) = self.register_context() else {
            return Ok(None);
        };
        self.registry.create_final(&ctx, command)
    }

    /// Event-stream variant of [`Self::create_final`]: a missing marker
    /// here is a programming error in the upstream capability, and
    /// there is no caller to hand the error to.
    pub(crate) fn create_final_or_panic(&mut self, command: &Rc<CommandRecord>) {
        if let Err(error) = self.create_final(command) {
            panic!("command-detection capability violated its contract: {error}");
        }
    }

    /// One-time wiring performed inside the surface's render callback.
    ///
    /// Idempotent per element: an element that already carries the core
    /// marker class and sits below the first buffer line was wired by an
    /// earlier pass. An element on line zero, or one without the class,
    /// is fresh (e.g. after a buffer-clearing redraw) and is stamped and
    /// wired again, replacing the entry's handler list.
    pub(crate) fn initialize_element(
        &mut self,
        marker_id: MarkerId,
        command: &Rc<CommandRecord>,
        kind: &DecorationKind,
        element: &Rc<Element>,
    ) {
        if element.has_class(style::CLASS_COMMAND_DECORATION) && element.line() != 0 {
            return;
        }
        if self.registry.entry(marker_id).is_none() {
            // Removed before the surface got around to rendering it.
            return;
        }

        let mut resolved = style::resolve(kind, &self.config.icons());
        if !self.visibility.flags().gutter {
            resolved.classes.insert(style::CLASS_HIDE.to_string());
        }
        element.replace_classes(resolved.classes);

        match layout::compute_geometry(
            self.config.font_size,
            self.config.default_font_size,
            self.config.line_height,
        ) {
            Some(geometry) => element.set_geometry(geometry),
            None => tracing::debug!(marker = marker_id, "invalid font metrics, layout pass skipped"),
        }

        let handlers = self.attach_interaction_handlers(marker_id, command, element);
        if let Some(entry) = self.registry.entry_mut(marker_id) {
            entry.interaction_handlers = handlers;
        }
    }

    fn attach_interaction_handlers(
        &self,
        marker_id: MarkerId,
        command: &Rc<CommandRecord>,
        element: &Rc<Element>,
    ) -> Vec<Subscription> {
        let hover_handler = {
            let state = self.self_ref.clone();
            let command = Rc::clone(command);
            element.pointer_events().subscribe(move |interaction| {
                let Some(state) = state.upgrade() else {
                    return;
                };
                match interaction {
                    PointerInteraction::Enter => {
                        state.borrow_mut().hover.pointer_enter(
                            marker_id,
                            Rc::clone(&command),
                            Instant::now(),
                        );
                    }
                    PointerInteraction::Leave => {
                        let (hide, host) = {
                            let mut st = state.borrow_mut();
                            (st.hover.pointer_leave(), st.interaction_host.clone())
                        };
                        if hide {
                            if let Some(host) = host {
                                host.hide_hover();
                            }
                        }
                    }
                    PointerInteraction::Click => {}
                }
            })
        };

        let menu_handler = {
            let state = self.self_ref.clone();
            let command = Rc::clone(command);
            element.pointer_events().subscribe(move |interaction| {
                if *interaction != PointerInteraction::Click {
                    return;
                }
                let Some(state) = state.upgrade() else {
                    return;
                };
                let actions = interaction::context_menu_actions(&command);
                let (hide, host) = {
                    let mut st = state.borrow_mut();
                    (st.hover.notify_context_menu_opened(), st.interaction_host.clone())
                };
                let Some(host) = host else {
                    return;
                };
                if hide {
                    host.hide_hover();
                }
                host.show_context_menu(marker_id, &actions);
            })
        };

        vec![hover_handler, menu_handler]
    }

    /// Re-resolve every live decoration's classes and ruler color.
    pub(crate) fn refresh_styles(&mut self) {
        self.registry.prune_disposed();
        let flags = self.visibility.flags();
        let ruler_visible = flags.overview_ruler;
        let icons = self.config.icons();
        for (_, entry) in self.registry.iter() {
            let mut resolved = style::resolve(&entry.kind, &icons);
            if !flags.gutter {
                resolved.classes.insert(style::CLASS_HIDE.to_string());
            }
            if let Some(element) = entry.decoration.element() {
                element.replace_classes(resolved.classes);
            }
            entry
                .decoration
                .set_ruler_color(ruler_visible.then_some(resolved.ruler_color));
        }
    }

    /// Re-stamp geometry on every live element from current metrics.
    pub(crate) fn refresh_layouts(&mut self) {
        self.registry.prune_disposed();
        let Some(geometry) = layout::compute_geometry(
            self.config.font_size,
            self.config.default_font_size,
            self.config.line_height,
        ) else {
            tracing::debug!("invalid font metrics, layout pass skipped");
            return;
        };
        for (_, entry) in self.registry.iter() {
            if let Some(element) = entry.decoration.element() {
                element.set_geometry(geometry);
            }
        }
    }

    /// Reconcile pointer state after entries were removed: forget a
    /// hovered element that no longer has an entry and cancel its
    /// pending or visible hover. Returns the host to notify when a
    /// visible hover must be hidden; the caller invokes it after
    /// releasing the state borrow.
    pub(crate) fn prune_pointer_state(&mut self) -> Option<Rc<dyn InteractionHost>> {
        let Self {
            mouse,
            hover,
            registry,
            ..
        } = self;
        if mouse.hovered().is_some_and(|id| registry.entry(id).is_none()) {
            mouse.reset();
        }
        let hide = hover.retain_markers(|id| registry.entry(id).is_some());
        if hide {
            self.interaction_host.clone()
        } else {
            None
        }
    }

    fn route_mouse(&mut self, event: &MouseEvent) -> Vec<(Rc<Element>, PointerInteraction)> {
        let Self {
            mouse, registry, ..
        } = self;
        mouse.route(registry, event)
    }

    fn clear(&mut self) {
        self.registry.clear_all();
        self.hover.cancel();
        self.mouse.reset();
    }
}

/// Visual annotations for command executions in a terminal surface.
///
/// Create one per terminal, wire the optional collaborators, then
/// [`activate`](Self::activate) it against the rendering surface and the
/// terminal's capability store.
pub struct CommandDecorationAddon {
    state: Rc<RefCell<AddonState>>,
}

impl CommandDecorationAddon {
    pub fn new(config: DecorationConfig) -> Self {
        let visibility = VisibilityModeController::new(config.visibility);
        let hover = HoverController::new(config.hover_delay());
        let state = Rc::new_cyclic(|self_ref: &Weak<RefCell<AddonState>>| {
            RefCell::new(AddonState {
                self_ref: self_ref.clone(),
                surface: None,
                capabilities: None,
                lifecycle_subs: Vec::new(),
                registry: DecorationRegistry::new(),
                binder: CommandEventBinder::new(),
                visibility,
                hover,
                mouse: MouseRouter::new(),
                config,
                run_requests: EventEmitter::new(),
                clipboard: None,
                interaction_host: None,
            })
        });
        Self { state }
    }

    pub fn set_clipboard(&self, clipboard: Rc<dyn Clipboard>) {
        self.state.borrow_mut().clipboard = Some(clipboard);
    }

    pub fn set_interaction_host(&self, host: Rc<dyn InteractionHost>) {
        self.state.borrow_mut().interaction_host = Some(host);
    }

    /// Bind to a concrete rendering surface and capability store.
    ///
    /// Binds to the command-detection capability immediately when
    /// present, lazily when it attaches later, and unbinds when it is
    /// removed.
    pub fn activate(&self, surface: Rc<dyn DecorationSurface>, capabilities: Rc<Capabilities>) {
        {
            let mut st = self.state.borrow_mut();
            st.surface = Some(surface);
            st.capabilities = Some(Rc::clone(&capabilities));

            let on_added = {
                let weak = Rc::downgrade(&self.state);
                capabilities.on_capability_added().subscribe(move |_| {
                    if let Some(state) = weak.upgrade() {
                        binder::bind(&state);
                    }
                })
            };
            let on_removed = {
                let weak = Rc::downgrade(&self.state);
                capabilities.on_capability_removed().subscribe(move |_| {
                    if let Some(state) = weak.upgrade() {
                        state.borrow_mut().binder.unbind();
                    }
                })
            };
            st.lifecycle_subs.push(on_added);
            st.lifecycle_subs.push(on_removed);
        }
        binder::bind(&self.state);
    }

    /// Register a decoration for a command, outside the event stream.
    ///
    /// Returns `Ok(None)` on the expected absences (no surface,
    /// decorations disabled, generic-mark placeholder request, marker
    /// not yet assigned for a placeholder) and an error when a final
    /// decoration is requested for a command without a marker.
    pub fn register_command_decoration(
        &self,
        command: &Rc<CommandRecord>,
        is_placeholder: bool,
    ) -> Result<Option<MarkerId>, DecorationError> {
        let mut st = self.state.borrow_mut();
        if is_placeholder {
            Ok(st.create_placeholder(command))
        } else {
            st.create_final(command)
        }
    }

    /// Outbound requests for the host to execute: command reruns and
    /// copy-output-as-HTML exports.
    pub fn on_did_request_run_command(&self) -> EventEmitter<RunCommandRequest> {
        self.state.borrow().run_requests.clone()
    }

    /// Apply a fresh configuration, refreshing only what changed.
    pub fn apply_config(&self, next: DecorationConfig) {
        let rebind = {
            let mut st = self.state.borrow_mut();
            let delta = st.config.diff(&next);
            if !delta.any() {
                return;
            }
            st.config = next;
            if delta.hover {
                let delay = st.config.hover_delay();
                st.hover.set_delay(delay);
            }
            let mut rebind = false;
            if delta.visibility {
                let policy = st.config.visibility;
                st.visibility.set_policy(policy);
                // Every policy transition rebuilds from scratch; leaving
                // "never" replays the capability's known history, and a
                // rebuild also reconciles the overview-ruler option.
                st.clear();
                rebind = !policy.flags().disabled;
            }
            if !rebind {
                if delta.icons {
                    st.refresh_styles();
                }
                if delta.layout {
                    st.refresh_layouts();
                }
            }
            rebind
        };
        if rebind {
            binder::bind(&self.state);
        }
    }

    /// Convenience for a visibility-only configuration change.
    pub fn set_visibility_policy(&self, policy: crate::visibility::VisibilityPolicy) {
        let mut next = self.state.borrow().config.clone();
        next.visibility = policy;
        self.apply_config(next);
    }

    /// The active color theme changed: recompute the process-wide
    /// colors and sweep all live entries plus the placeholder.
    pub fn refresh_theme_colors(&self, colors: ThemeColors) {
        style::refresh_theme_colors(colors);
        self.state.borrow_mut().refresh_styles();
    }

    /// Re-stamp geometry after an external layout-affecting change.
    pub fn refresh_layouts(&self) {
        self.state.borrow_mut().refresh_layouts();
    }

    /// Dispose every decoration and the placeholder.
    pub fn clear_decorations(&self) {
        self.state.borrow_mut().clear();
    }

    /// Pump the hover debounce; the host calls this from its event loop.
    pub fn tick(&self, now: Instant) {
        let (shown, host) = {
            let mut st = self.state.borrow_mut();
            (st.hover.tick(now), st.interaction_host.clone())
        };
        if let Some((marker_id, text)) = shown {
            if let Some(host) = host {
                host.show_hover(marker_id, &text);
            }
        }
    }

    /// Route a raw mouse event onto decoration elements.
    pub fn handle_mouse_event(&self, event: &MouseEvent) {
        let interactions = self.state.borrow_mut().route_mouse(event);
        // Emit after releasing the borrow; handlers re-enter the state.
        for (element, interaction) in interactions {
            element.pointer_events().emit(&interaction);
        }
    }

    /// Execute a context-menu action the user chose for a decoration.
    pub fn execute_menu_action(&self, marker_id: MarkerId, action: MenuAction) {
        let dispatch = {
            let st = self.state.borrow();
            st.registry.entry(marker_id).map(|entry| {
                (
                    Rc::clone(&entry.command),
                    st.run_requests.clone(),
                    st.clipboard.clone(),
                    st.interaction_host.clone(),
                )
            })
        };
        let Some((command, run_requests, clipboard, host)) = dispatch else {
            return;
        };
        interaction::dispatch_action(
            action,
            &command,
            &run_requests,
            clipboard.as_deref(),
            host.as_deref(),
        );
    }

    /// The host closed the context menu; hover may trigger again.
    pub fn context_menu_closed(&self) {
        self.state.borrow_mut().hover.notify_context_menu_closed();
    }

    /// Tear down: unbind all subscriptions and dispose every decoration.
    /// No partial state is observable afterwards.
    pub fn dispose(&self) {
        let mut st = self.state.borrow_mut();
        st.binder.unbind();
        st.lifecycle_subs.clear();
        st.clear();
        st.surface = None;
        st.capabilities = None;
    }

    /// Snapshot of the active configuration.
    pub fn config(&self) -> DecorationConfig {
        self.state.borrow().config.clone()
    }

    // === test/inspection accessors ===

    /// Number of live finished/generic entries (placeholder excluded).
    pub fn decoration_count(&self) -> usize {
        self.state.borrow().registry.len()
    }

    pub fn has_placeholder(&self) -> bool {
        self.state.borrow().registry.has_placeholder()
    }

    pub fn decoration_ids(&self) -> Vec<MarkerId> {
        self.state.borrow().registry.marker_ids()
    }

    pub fn is_bound(&self) -> bool {
        self.state.borrow().binder.is_bound()
    }
}

impl Drop for CommandDecorationAddon {
    fn drop(&mut self) {
        self.dispose();
    }
}
