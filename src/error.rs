//! Decoration contract errors.

/// Errors surfaced by decoration registration.
///
/// Expected absences (no active surface, decorations disabled, a
/// generic-mark placeholder request) are not errors; those paths return
/// "no decoration". The variants here signal caller bugs and are
/// propagated, never swallowed.
#[derive(Debug, thiserror::Error)]
pub enum DecorationError {
    /// A started or finished command must always carry a position
    /// marker; receiving one without is a bug in the upstream
    /// command-detection capability.
    #[error("command '{command}' has no position marker")]
    MissingMarker { command: String },
}
