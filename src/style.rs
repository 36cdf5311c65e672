//! Style resolution for command decorations.
//!
//! Maps a decoration's kind to its class tokens and overview-ruler
//! color. The mapping is a pure function of `(exit code, generic mark)`;
//! it never depends on render order or timing. Theme-derived colors are
//! process-wide state with explicit recomputation: a theme change calls
//! [`refresh_theme_colors`] and the addon sweeps every live element.

use std::collections::BTreeSet;
use std::sync::{PoisonError, RwLock};

use ratatui::style::Color;

use crate::command::DecorationKind;

/// Core marker class; its absence on an element signals that the
/// element needs (re)initialization.
pub const CLASS_COMMAND_DECORATION: &str = "terminal-command-decoration";
/// Icon-font base class shared by every decoration.
pub const CLASS_CODICON: &str = "codicon";
/// Decoration for a command without an exit code yet.
pub const CLASS_DEFAULT: &str = "default";
pub const CLASS_DEFAULT_COLOR: &str = "default-color";
/// Decoration for a failed command.
pub const CLASS_ERROR: &str = "error";
/// Suppresses the pointer cursor on marks that offer no interaction.
pub const CLASS_NO_POINTER: &str = "no-pointer";
/// Hides the gutter element when the policy shows only the overview
/// ruler.
pub const CLASS_HIDE: &str = "hide";

/// Fixed icon for generic (non-command) marks.
pub const GENERIC_MARK_ICON: &str = "circle-small-filled";

/// Icon identifiers from configuration.
#[derive(Debug, Clone, Copy)]
pub struct Icons<'a> {
    pub default_icon: &'a str,
    pub success_icon: &'a str,
    pub error_icon: &'a str,
}

/// Theme-derived decoration colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemeColors {
    /// Running commands, commands without an exit code, generic marks.
    pub default_color: Color,
    pub success: Color,
    pub error: Color,
}

impl Default for ThemeColors {
    fn default() -> Self {
        Self {
            default_color: Color::Gray,
            success: Color::Green,
            error: Color::Red,
        }
    }
}

static THEME_COLORS: RwLock<ThemeColors> = RwLock::new(ThemeColors {
    default_color: Color::Gray,
    success: Color::Green,
    error: Color::Red,
});

/// Recompute the process-wide decoration colors from a new theme.
///
/// Callers are expected to follow up with a style sweep over all live
/// entries plus the placeholder.
pub fn refresh_theme_colors(colors: ThemeColors) {
    *THEME_COLORS
        .write()
        .unwrap_or_else(PoisonError::into_inner) = colors;
}

/// Current process-wide decoration colors.
pub fn theme_colors() -> ThemeColors {
    *THEME_COLORS.read().unwrap_or_else(PoisonError::into_inner)
}

/// Resolved presentation for one decoration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecorationStyle {
    pub classes: BTreeSet<String>,
    pub ruler_color: Color,
}

/// Resolve the class set and ruler color for a decoration kind.
pub fn resolve(kind: &DecorationKind, icons: &Icons<'_>) -> DecorationStyle {
    let colors = theme_colors();
    let mut classes = BTreeSet::from([
        CLASS_COMMAND_DECORATION.to_string(),
        CLASS_CODICON.to_string(),
    ]);

    let ruler_color = match kind {
        DecorationKind::GenericMark { hover_message } => {
            classes.insert(CLASS_DEFAULT.to_string());
            classes.insert(CLASS_DEFAULT_COLOR.to_string());
            classes.insert(icon_class(GENERIC_MARK_ICON));
            if hover_message.is_none() {
                classes.insert(CLASS_NO_POINTER.to_string());
            }
            colors.default_color
        }
        DecorationKind::Placeholder | DecorationKind::Command { exit_code: None } => {
            classes.insert(CLASS_DEFAULT.to_string());
            classes.insert(CLASS_DEFAULT_COLOR.to_string());
            classes.insert(icon_class(icons.default_icon));
            colors.default_color
        }
        DecorationKind::Command { exit_code: Some(0) } => {
            classes.insert(icon_class(icons.success_icon));
            colors.success
        }
        DecorationKind::Command { exit_code: Some(_) } => {
            classes.insert(CLASS_ERROR.to_string());
            classes.insert(icon_class(icons.error_icon));
            colors.error
        }
    };

    DecorationStyle {
        classes,
        ruler_color,
    }
}

fn icon_class(icon: &str) -> String {
    format!("codicon-{icon}")
}
