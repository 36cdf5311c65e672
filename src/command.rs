//! Command lifecycle data model and the command-detection boundary.
//!
//! The types here are produced by an external command-detection
//! capability (the collaborator that watches shell integration sequences
//! and segments the buffer into command regions). This crate only reads
//! them; it never parses shell output or detects command boundaries
//! itself.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use chrono::{DateTime, Utc};

use crate::events::EventEmitter;

/// Stable identity of a marker, assigned by the rendering surface.
pub type MarkerId = u64;

/// Exit code conventionally reported when a command terminated
/// abnormally (killed, crashed) rather than returning a status.
pub const ABNORMAL_EXIT_CODE: i32 = -1;

/// Opaque handle for a fixed row in the surface's scroll buffer.
///
/// Owned by the rendering surface; the surface moves the line as the
/// scrollback shifts and flips the disposal flag when the row leaves
/// the buffer.
#[derive(Debug)]
pub struct Marker {
    id: MarkerId,
    line: Cell<usize>,
    disposed: Cell<bool>,
}

impl Marker {
    pub fn new(id: MarkerId, line: usize) -> Rc<Self> {
        Rc::new(Self {
            id,
            line: Cell::new(line),
            disposed: Cell::new(false),
        })
    }

    pub fn id(&self) -> MarkerId {
        self.id
    }

    /// Current buffer line of the marked row.
    pub fn line(&self) -> usize {
        self.line.get()
    }

    /// Surface-side update when the scrollback shifts.
    pub fn set_line(&self, line: usize) {
        self.line.set(line);
    }

    /// Surface-side disposal signal.
    pub fn dispose(&self) {
        self.disposed.set(true);
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.get()
    }
}

/// Properties of a non-command annotation (a mark placed in the buffer
/// that is not tied to a shell invocation).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenericMarkProperties {
    /// Custom hover text; a generic mark without one shows no hover.
    pub hover_message: Option<String>,
}

/// One shell invocation as reported by the command-detection capability.
///
/// Read-only to this crate. `exit_code` is absent while the command is
/// still running; `marker` may be absent only transiently, before the
/// surface has assigned a position.
#[derive(Debug, Clone)]
pub struct CommandRecord {
    pub marker: Option<Rc<Marker>>,
    pub exit_code: Option<i32>,
    pub generic_mark: Option<GenericMarkProperties>,
    /// The command line as typed, empty for prompts without input.
    pub command: String,
    /// Wall-clock time the command started.
    pub timestamp: DateTime<Utc>,
    output: Option<String>,
}

impl CommandRecord {
    pub fn new(command: impl Into<String>, marker: Option<Rc<Marker>>) -> Self {
        Self {
            marker,
            exit_code: None,
            generic_mark: None,
            command: command.into(),
            timestamp: Utc::now(),
            output: None,
        }
    }

    pub fn with_exit_code(mut self, exit_code: i32) -> Self {
        self.exit_code = Some(exit_code);
        self
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }

    pub fn with_generic_mark(mut self, mark: GenericMarkProperties) -> Self {
        self.generic_mark = Some(mark);
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn has_output(&self) -> bool {
        self.output.as_ref().is_some_and(|o| !o.is_empty())
    }

    pub fn output(&self) -> Option<&str> {
        self.output.as_deref()
    }

    pub fn marker_id(&self) -> Option<MarkerId> {
        self.marker.as_ref().map(|m| m.id())
    }
}

/// What a decoration decorates. Shared handle type, three cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecorationKind {
    /// The currently-executing command, before it has an exit code.
    Placeholder,
    /// A finished command.
    Command { exit_code: Option<i32> },
    /// A non-command annotation.
    GenericMark { hover_message: Option<String> },
}

impl DecorationKind {
    pub fn of(command: &CommandRecord, placeholder: bool) -> Self {
        if let Some(mark) = &command.generic_mark {
            DecorationKind::GenericMark {
                hover_message: mark.hover_message.clone(),
            }
        } else if placeholder {
            DecorationKind::Placeholder
        } else {
            DecorationKind::Command {
                exit_code: command.exit_code,
            }
        }
    }
}

/// Why the capability retracted the current command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidationReason {
    /// The just-started command is being retracted, e.g. the user
    /// pressed enter on an empty prompt.
    NoProblemsReported,
    /// The host redrew the buffer; only the in-flight placeholder is
    /// stale, finished decorations keep their markers.
    HostRedraw,
}

/// The command-detection capability's event stream and queryable state.
pub trait CommandDetection {
    /// Already-finished commands, oldest first.
    fn commands(&self) -> Vec<Rc<CommandRecord>>;

    /// The currently-executing command, if any.
    fn executing_command(&self) -> Option<Rc<CommandRecord>>;

    fn on_command_started(&self) -> &EventEmitter<Rc<CommandRecord>>;
    fn on_command_finished(&self) -> &EventEmitter<Rc<CommandRecord>>;
    /// Batch invalidation of previously finished commands.
    fn on_command_invalidated(&self) -> &EventEmitter<Vec<Rc<CommandRecord>>>;
    fn on_current_command_invalidated(&self) -> &EventEmitter<InvalidationReason>;
}

/// Capability store for a terminal instance.
///
/// The command-detection capability may attach after this addon does
/// (e.g. shell integration activates mid-session) and may detach again;
/// the store announces both so binding can happen lazily.
#[derive(Default)]
pub struct Capabilities {
    detection: RefCell<Option<Rc<dyn CommandDetection>>>,
    on_added: EventEmitter<()>,
    on_removed: EventEmitter<()>,
}

impl Capabilities {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            detection: RefCell::new(None),
            on_added: EventEmitter::new(),
            on_removed: EventEmitter::new(),
        })
    }

    pub fn command_detection(&self) -> Option<Rc<dyn CommandDetection>> {
        self.detection.borrow().clone()
    }

    pub fn set_command_detection(&self, capability: Rc<dyn CommandDetection>) {
        *self.detection.borrow_mut() = Some(capability);
        self.on_added.emit(&());
    }

    pub fn remove_command_detection(&self) {
        if self.detection.borrow_mut().take().is_some() {
            self.on_removed.emit(&());
        }
    }

    pub fn on_capability_added(&self) -> &EventEmitter<()> {
        &self.on_added
    }

    pub fn on_capability_removed(&self) -> &EventEmitter<()> {
        &self.on_removed
    }
}
