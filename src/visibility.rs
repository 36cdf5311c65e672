//! Visibility policy for command decorations.
//!
//! A four-valued configuration controls where decorations appear: the
//! gutter, the overview ruler, both, or nowhere. The flag derivation is
//! a pure table; transition side effects (clearing the registry on
//! `never`, the full rebind on re-enable) live in the addon.

use serde::{Deserialize, Serialize};

/// Where decorations are displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum VisibilityPolicy {
    Never,
    Gutter,
    OverviewRuler,
    #[default]
    Both,
}

/// Flags derived from a policy, applied atomically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityFlags {
    pub gutter: bool,
    pub overview_ruler: bool,
    /// When set, no decoration entries may exist.
    pub disabled: bool,
}

impl VisibilityPolicy {
    pub fn flags(self) -> VisibilityFlags {
        match self {
            VisibilityPolicy::Never => VisibilityFlags {
                gutter: false,
                overview_ruler: false,
                disabled: true,
            },
            VisibilityPolicy::Both => VisibilityFlags {
                gutter: true,
                overview_ruler: true,
                disabled: false,
            },
            VisibilityPolicy::Gutter => VisibilityFlags {
                gutter: true,
                overview_ruler: false,
                disabled: false,
            },
            VisibilityPolicy::OverviewRuler => VisibilityFlags {
                gutter: false,
                overview_ruler: true,
                disabled: false,
            },
        }
    }
}

/// Owns the current policy and reports transitions.
#[derive(Debug)]
pub struct VisibilityModeController {
    policy: VisibilityPolicy,
}

impl VisibilityModeController {
    pub fn new(policy: VisibilityPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> VisibilityPolicy {
        self.policy
    }

    pub fn flags(&self) -> VisibilityFlags {
        self.policy.flags()
    }

    /// Update the policy. Returns the previous policy when it actually
    /// changed, `None` on a no-op.
    pub fn set_policy(&mut self, policy: VisibilityPolicy) -> Option<VisibilityPolicy> {
        if self.policy == policy {
            return None;
        }
        let previous = std::mem::replace(&mut self.policy, policy);
        tracing::debug!(?previous, current = ?policy, "visibility policy changed");
        Some(previous)
    }
}
