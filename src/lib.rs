//! # Dropshell
//!
//! A session and split-pane layout engine for a drop-down terminal.
//!
//! Dropshell is the model behind a quake-style terminal window: sessions
//! (tabs) hold panes arranged in a binary split tree, identified by stable
//! integer ids that external programs can script against. Rendering, window
//! animation and theming are collaborators outside this crate; the engine
//! answers "what is the topology" and is told "apply this geometry".
//!
//! ## Features
//!
//! - **Split trees**: binary row/column containers with grow-by-redistribution
//! - **Stable identifiers**: session and pane ids are never reused
//! - **Tab order**: display ordering with pinned interactive renames
//! - **Remote command surface**: identifier-addressed, sentinel-tolerant
//! - **PTY terminals**: processes spawned via `portable-pty`, emulated by
//!   `vt100`, behind a factory seam you can replace
//!
//! ## Example
//!
//! ```no_run
//! use dropshell::{Orientation, RegistryConfig, SessionLayout, SessionRegistry};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut registry = SessionRegistry::new(RegistryConfig::default());
//!
//!     // One tab with two panes side by side.
//!     let session = registry.create_session(SessionLayout::Single);
//!     registry.raise_session(session);
//!     registry.split_session(session, Orientation::Row);
//!
//!     // Drive the event loop: apply terminal events, collect notifications.
//!     loop {
//!         for notification in registry.poll_events() {
//!             println!("{notification:?}");
//!         }
//!         tokio::time::sleep(std::time::Duration::from_millis(16)).await;
//!     }
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod command;
mod error;
mod event;
mod layout;
mod pane;
mod registry;
mod session;
mod tab_order;
mod terminal;

// Re-export public API
pub use command::{CommandSurface, SENTINEL};
pub use error::{Error, Result};
pub use event::{Notification, TermEvent};
pub use layout::{
    ChildKind, ContainerId, GrowthDirection, Orientation, SplitContainer, SplitTree,
    MIN_CHILD_SPAN,
};
pub use pane::{Pane, PaneId, PaneSize};
pub use registry::{AlwaysConfirm, CloseConfirmer, RegistryConfig, SessionRegistry};
pub use session::{Session, SessionId, SessionLayout};
pub use tab_order::TabOrder;
pub use terminal::{
    NullTerminalFactory, PtyTerminalFactory, TerminalConfig, TerminalFactory, TerminalHandle,
};
