//! Events flowing into and out of the core.
//!
//! Two directions exist. `TermEvent` carries notifications from the terminal
//! tasks (title changes, process exit) into the registry, over an mpsc
//! channel drained by [`SessionRegistry::poll_events`]. `Notification` is
//! what the core reports outward to the windowing collaborator after a
//! mutation has fully completed.
//!
//! [`SessionRegistry::poll_events`]: crate::SessionRegistry::poll_events

use crate::pane::PaneId;
use crate::session::SessionId;

/// Events emitted by terminal tasks.
#[derive(Clone, Debug)]
pub enum TermEvent {
    /// The terminal title changed (via OSC escape sequence).
    TitleChanged { pane_id: PaneId, title: String },

    /// The terminal's process exited; the pane should be closed.
    Exited { pane_id: PaneId },

    /// Output was received (activity, for monitor-activity consumers).
    Output { pane_id: PaneId, len: usize },
}

/// Notifications reported to the windowing collaborator.
///
/// Every notification is emitted after the structural mutation it describes
/// has completed; no notification is observed mid-mutation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notification {
    /// A session was added to the registry and the tab order.
    SessionAdded { session_id: SessionId, title: String },

    /// A session was removed from the registry and the tab order.
    SessionRemoved { session_id: SessionId },

    /// A session became the active one.
    SessionRaised { session_id: SessionId },

    /// The last session was closed; the tab order is empty.
    ///
    /// Policy (auto-create a default session, retract the window) belongs to
    /// the windowing collaborator.
    LastSessionClosed,

    /// A tab's displayed title changed.
    TabTitleChanged { session_id: SessionId, title: String },

    /// A pane was removed from its session.
    PaneRemoved { session_id: SessionId, pane_id: PaneId },

    /// A keystroke was swallowed by a keyboard-input-disabled pane.
    ///
    /// Emitted once per disable, on the first swallowed keystroke.
    KeyboardInputBlocked { pane_id: PaneId },

    /// The remote command surface injected text into a shell.
    ///
    /// Emitted once per process lifetime, the first time `run_command` is
    /// exercised remotely.
    RunCommandWarning,
}
