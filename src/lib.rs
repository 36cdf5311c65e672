//! Command execution decorations for interactive terminal surfaces.
//!
//! A terminal with shell integration can mark where each command's
//! output begins; this crate keeps a registry of visual decorations for
//! those marks, colored by exit status, with a context menu and a
//! debounced hover tooltip. The heart of it is the decoration lifecycle:
//! a stream of command events (started, finished, invalidated) is kept
//! in sync with a keyed registry and a singleton in-flight placeholder,
//! under a dynamically reconfigurable four-mode visibility policy, with
//! no leaked event subscriptions across reconfiguration.
//!
//! The terminal rendering engine, command detection, clipboard and
//! tooltip/menu widgets are all external collaborators, reached through
//! the traits in [`surface`], [`command`], [`clipboard`] and
//! [`interaction`].
//!
//! # Usage
//!
//! ```no_run
//! use std::rc::Rc;
//! use termdeco::{Capabilities, CommandDecorationAddon, DecorationConfig};
//! # fn surface() -> Rc<dyn termdeco::DecorationSurface> { unimplemented!() }
//!
//! let addon = CommandDecorationAddon::new(DecorationConfig::load().unwrap_or_default());
//! let capabilities = Capabilities::new();
//! addon.activate(surface(), Rc::clone(&capabilities));
//!
//! let _requests = addon.on_did_request_run_command().subscribe(|request| {
//!     println!("host should rerun: {}", request.command.command);
//! });
//! ```

pub mod addon;
pub mod binder;
pub mod clipboard;
pub mod command;
pub mod config;
pub mod error;
pub mod events;
pub mod input;
pub mod interaction;
pub mod layout;
pub mod registry;
pub mod style;
pub mod surface;
pub mod visibility;

pub use addon::CommandDecorationAddon;
pub use clipboard::{Clipboard, ClipboardError};
pub use command::{
    Capabilities, CommandDetection, CommandRecord, DecorationKind, GenericMarkProperties,
    InvalidationReason, Marker, MarkerId, ABNORMAL_EXIT_CODE,
};
pub use config::{ConfigDelta, ConfigError, DecorationConfig};
pub use error::DecorationError;
pub use events::{EventEmitter, Subscription};
pub use interaction::{
    InteractionHost, MenuAction, RunCommandRequest, SHELL_INTEGRATION_DOCS_URL,
};
pub use registry::DecorationRegistry;
pub use style::{DecorationStyle, ThemeColors};
pub use surface::{
    Decoration, DecorationOptions, DecorationSurface, Element, ElementGeometry,
    PointerInteraction, RenderCallback,
};
pub use visibility::{VisibilityFlags, VisibilityModeController, VisibilityPolicy};
