//! Clipboard collaborator boundary.
//!
//! Copy actions from the context menu go through this trait; the host
//! wires in whatever clipboard access it has. Failures are recoverable:
//! the addon logs them and moves on.

/// Errors that can occur during clipboard operations.
#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    #[error("no clipboard available")]
    Unavailable,

    #[error("clipboard tool '{tool}' failed: {message}")]
    ToolFailed { tool: &'static str, message: String },
}

/// Writes text to the system clipboard.
pub trait Clipboard {
    fn set_text(&self, text: &str) -> Result<(), ClipboardError>;
}
