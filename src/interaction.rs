//! Hover tooltips and context-menu actions for decorations.
//!
//! Hover is debounced: pointer-enter arms a cancellable deadline, the
//! addon's tick pump fires it once due, and pointer-leave cancels the
//! pending deadline and hides any visible tooltip immediately. An open
//! context menu suppresses hover entirely until the host reports the
//! menu closed.

use std::rc::Rc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use crate::clipboard::Clipboard;
use crate::command::{CommandRecord, MarkerId};
use crate::events::EventEmitter;

/// Documentation link offered at the bottom of every context menu.
pub const SHELL_INTEGRATION_DOCS_URL: &str =
    "https://github.com/termdeco/termdeco/blob/main/docs/shell-integration.md";

/// Outbound request for the host to execute; emitted for actions this
/// crate cannot perform itself (running a command, rendering HTML).
#[derive(Clone)]
pub struct RunCommandRequest {
    pub command: Rc<CommandRecord>,
    /// When set, the host should export the command's output as HTML to
    /// the clipboard instead of rerunning it.
    pub copy_as_html: bool,
}

/// UI widgets owned by the host: tooltip, context menu, link opening.
pub trait InteractionHost {
    fn show_hover(&self, marker_id: MarkerId, text: &str);
    fn hide_hover(&self);
    fn show_context_menu(&self, marker_id: MarkerId, actions: &[MenuAction]);
    fn open_link(&self, url: &str);
}

/// One entry in a decoration's context menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Rerun,
    CopyCommand,
    CopyOutput,
    CopyOutputAsHtml,
    LearnMore,
    Separator,
}

impl MenuAction {
    pub fn label(&self) -> &'static str {
        match self {
            MenuAction::Rerun => "Rerun Command",
            MenuAction::CopyCommand => "Copy Command",
            MenuAction::CopyOutput => "Copy Output",
            MenuAction::CopyOutputAsHtml => "Copy Output as HTML",
            MenuAction::LearnMore => "Learn About Shell Integration",
            MenuAction::Separator => "---",
        }
    }
}

/// Build the context-menu action list for a command decoration.
pub fn context_menu_actions(command: &CommandRecord) -> Vec<MenuAction> {
    let mut actions = Vec::new();
    if !command.command.is_empty() {
        actions.push(MenuAction::Rerun);
        actions.push(MenuAction::CopyCommand);
    }
    if command.has_output() {
        actions.push(MenuAction::Separator);
        actions.push(MenuAction::CopyOutput);
        actions.push(MenuAction::CopyOutputAsHtml);
    }
    actions.push(MenuAction::Separator);
    actions.push(MenuAction::LearnMore);
    actions
}

/// Execute a chosen menu action.
///
/// Rerun and HTML export are emitted as outbound [`RunCommandRequest`]s;
/// plain copies go through the clipboard collaborator; the docs link is
/// handed to the host. Clipboard failures are absorbed with a warning.
pub fn dispatch_action(
    action: MenuAction,
    command: &Rc<CommandRecord>,
    run_requests: &EventEmitter<RunCommandRequest>,
    clipboard: Option<&dyn Clipboard>,
    host: Option<&dyn InteractionHost>,
) {
    match action {
        MenuAction::Rerun => run_requests.emit(&RunCommandRequest {
            command: Rc::clone(command),
            copy_as_html: false,
        }),
        MenuAction::CopyOutputAsHtml => run_requests.emit(&RunCommandRequest {
            command: Rc::clone(command),
            copy_as_html: true,
        }),
        MenuAction::CopyCommand => copy_text(clipboard, &command.command),
        MenuAction::CopyOutput => {
            if let Some(output) = command.output() {
                copy_text(clipboard, output);
            }
        }
        MenuAction::LearnMore => {
            if let Some(host) = host {
                host.open_link(SHELL_INTEGRATION_DOCS_URL);
            }
        }
        MenuAction::Separator => {}
    }
}

fn copy_text(clipboard: Option<&dyn Clipboard>, text: &str) {
    match clipboard {
        Some(clipboard) => {
            if let Err(error) = clipboard.set_text(text) {
                tracing::warn!(%error, "clipboard copy failed");
            }
        }
        None => tracing::warn!("copy requested but no clipboard is wired"),
    }
}

/// Compose the hover text for a decoration, or `None` for no hover.
///
/// Generic marks show their custom message or nothing at all. Command
/// decorations report elapsed time since the command's timestamp and,
/// on failure, the exit code.
pub fn hover_message(command: &CommandRecord, now: DateTime<Utc>) -> Option<String> {
    if let Some(mark) = &command.generic_mark {
        return mark.hover_message.clone();
    }
    let elapsed = format_time_ago(now - command.timestamp);
    match command.exit_code {
        Some(code) if code != 0 => Some(format!(
            "Command executed {elapsed} ago and failed (exit code {code})"
        )),
        _ => Some(format!("Command executed {elapsed} ago")),
    }
}

fn format_time_ago(elapsed: chrono::Duration) -> String {
    let seconds = elapsed.num_seconds().max(0);
    let (amount, unit) = if seconds < 60 {
        (seconds, "second")
    } else if seconds < 60 * 60 {
        (seconds / 60, "minute")
    } else if seconds < 24 * 60 * 60 {
        (seconds / (60 * 60), "hour")
    } else {
        (seconds / (24 * 60 * 60), "day")
    };
    if amount == 1 {
        format!("1 {unit}")
    } else {
        format!("{amount} {unit}s")
    }
}

struct PendingHover {
    marker_id: MarkerId,
    command: Rc<CommandRecord>,
    due: Instant,
}

/// Debounced hover state machine.
///
/// At most one pending hover exists; entering another decoration
/// replaces it. Exclusive with the context menu.
pub struct HoverController {
    delay: Duration,
    pending: Option<PendingHover>,
    active: Option<MarkerId>,
    context_menu_open: bool,
}

impl HoverController {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
            active: None,
            context_menu_open: false,
        }
    }

    pub fn set_delay(&mut self, delay: Duration) {
        self.delay = delay;
    }

    /// Arm the debounce for a decoration; suppressed while a context
    /// menu is open.
    pub fn pointer_enter(&mut self, marker_id: MarkerId, command: Rc<CommandRecord>, now: Instant) {
        if self.context_menu_open {
            return;
        }
        self.pending = Some(PendingHover {
            marker_id,
            command,
            due: now + self.delay,
        });
    }

    /// Cancel any pending debounce. Returns true when a visible hover
    /// must be hidden.
    pub fn pointer_leave(&mut self) -> bool {
        self.pending = None;
        self.active.take().is_some()
    }

    /// Fire a due hover. Returns the marker and composed text to show,
    /// or `None` when nothing is due (or the decoration has no hover).
    pub fn tick(&mut self, now: Instant) -> Option<(MarkerId, String)> {
        if !self.pending.as_ref().is_some_and(|p| now >= p.due) {
            return None;
        }
        let pending = self.pending.take()?;
        if let Some(text) = hover_message(&pending.command, Utc::now()) {
            self.active = Some(pending.marker_id);
            return Some((pending.marker_id, text));
        }
        None
    }

    /// The context menu opened: cancel the debounce, suppress future
    /// hovers. Returns true when a visible hover must be hidden.
    pub fn notify_context_menu_opened(&mut self) -> bool {
        self.context_menu_open = true;
        self.pending = None;
        self.active.take().is_some()
    }

    pub fn notify_context_menu_closed(&mut self) {
        self.context_menu_open = false;
    }

    /// Drop pending/active hover state for markers `alive` rejects,
    /// e.g. after their decorations were removed. Returns true when a
    /// visible hover must be hidden.
    pub fn retain_markers(&mut self, alive: impl Fn(MarkerId) -> bool) -> bool {
        if self.pending.as_ref().is_some_and(|p| !alive(p.marker_id)) {
            self.pending = None;
        }
        if self.active.is_some_and(|id| !alive(id)) {
            self.active = None;
            return true;
        }
        false
    }

    /// Drop all transient state, e.g. when the registry is cleared.
    pub fn cancel(&mut self) {
        self.pending = None;
        self.active = None;
    }
}
