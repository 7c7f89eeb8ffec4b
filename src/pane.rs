//! Panes: the terminal-bearing leaves of the split tree.

use std::path::PathBuf;

use self::delivery::KeyDelivery;
use crate::terminal::TerminalHandle;

/// Unique identifier for a pane.
///
/// Pane ids are process-lifetime-unique: assigned monotonically and never
/// reused, even after the pane is destroyed.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub struct PaneId(pub u64);

impl std::fmt::Display for PaneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Terminal dimensions in rows and columns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PaneSize {
    /// Number of rows.
    pub rows: u16,
    /// Number of columns.
    pub cols: u16,
}

impl PaneSize {
    /// Create a new pane size.
    #[must_use]
    pub fn new(rows: u16, cols: u16) -> Self {
        Self { rows, cols }
    }
}

pub(crate) mod delivery {
    /// What became of a key event offered to a pane.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum KeyDelivery {
        /// Forwarded to the terminal.
        Forwarded,
        /// Swallowed because keyboard input is disabled.
        ///
        /// `first` is true for the first swallowed keystroke since the
        /// toggle was disabled; the caller raises the blocked notification
        /// exactly then.
        Swallowed { first: bool },
    }
}

/// A single terminal-bearing leaf in the layout tree.
///
/// A pane exclusively owns its terminal handle. A pane whose terminal could
/// not be instantiated is *degraded*: it still occupies tree space and is
/// closable, but forwards no terminal operations.
pub struct Pane {
    id: PaneId,
    title: String,
    keyboard_input_enabled: bool,
    monitor_activity: bool,
    monitor_silence: bool,
    terminal: Option<Box<dyn TerminalHandle>>,
    blocked_notified: bool,
}

impl Pane {
    /// Create a pane around an (optional) terminal handle.
    ///
    /// `terminal == None` produces a degraded pane.
    pub(crate) fn new(id: PaneId, terminal: Option<Box<dyn TerminalHandle>>) -> Self {
        Self {
            id,
            title: String::new(),
            keyboard_input_enabled: true,
            monitor_activity: false,
            monitor_silence: false,
            terminal,
            blocked_notified: false,
        }
    }

    /// Get the pane ID.
    #[must_use]
    pub fn id(&self) -> PaneId {
        self.id
    }

    /// Get the pane title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    pub(crate) fn set_title(&mut self, title: String) {
        self.title = title;
    }

    /// Whether the pane is degraded (terminal collaborator unavailable).
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.terminal.is_none()
    }

    /// Whether keyboard input reaches the terminal.
    #[must_use]
    pub fn keyboard_input_enabled(&self) -> bool {
        self.keyboard_input_enabled
    }

    /// Enable or disable keyboard input.
    ///
    /// Disabling arms the one-shot blocked notification; mouse and focus
    /// handling are unaffected.
    pub fn set_keyboard_input_enabled(&mut self, enabled: bool) {
        self.keyboard_input_enabled = enabled;
        self.blocked_notified = false;
    }

    /// Whether activity monitoring is on.
    #[must_use]
    pub fn monitor_activity(&self) -> bool {
        self.monitor_activity
    }

    /// Toggle activity monitoring.
    pub fn set_monitor_activity(&mut self, enabled: bool) {
        self.monitor_activity = enabled;
    }

    /// Whether silence monitoring is on.
    #[must_use]
    pub fn monitor_silence(&self) -> bool {
        self.monitor_silence
    }

    /// Toggle silence monitoring.
    pub fn set_monitor_silence(&mut self, enabled: bool) {
        self.monitor_silence = enabled;
    }

    /// The terminal's current working directory, if known.
    #[must_use]
    pub fn working_directory(&self) -> Option<PathBuf> {
        self.terminal.as_ref().and_then(|t| t.working_directory())
    }

    /// Send command text to the terminal, appending a newline.
    ///
    /// No-op on degraded panes.
    pub fn send_command(&mut self, text: &str) {
        let mut line = text.as_bytes().to_vec();
        line.push(b'\n');
        self.send_input(&line);
    }

    /// Send raw bytes to the terminal. No-op on degraded panes.
    pub fn send_input(&mut self, data: &[u8]) {
        if let Some(terminal) = &mut self.terminal {
            if let Err(e) = terminal.send_input(data) {
                tracing::debug!("input to pane {} dropped: {}", self.id, e);
            }
        }
    }

    /// Offer key-event bytes, honoring the keyboard-input toggle.
    pub(crate) fn feed_key(&mut self, data: &[u8]) -> KeyDelivery {
        if self.keyboard_input_enabled {
            self.send_input(data);
            KeyDelivery::Forwarded
        } else {
            let first = !self.blocked_notified;
            self.blocked_notified = true;
            KeyDelivery::Swallowed { first }
        }
    }

    /// Resize the terminal. No-op on degraded panes.
    pub fn resize(&mut self, size: PaneSize) {
        if let Some(terminal) = &mut self.terminal {
            if let Err(e) = terminal.resize(size) {
                tracing::debug!("resize of pane {} failed: {}", self.id, e);
            }
        }
    }

    /// Shut down the terminal behind this pane.
    pub(crate) fn shutdown(&mut self) {
        if let Some(terminal) = &mut self.terminal {
            terminal.shutdown();
        }
    }
}

impl std::fmt::Debug for Pane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pane")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("degraded", &self.is_degraded())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal::{NullTerminalFactory, TerminalFactory};
    use tokio::sync::mpsc;

    fn pane_with_terminal(factory: &mut NullTerminalFactory, id: u64) -> Pane {
        let (tx, _rx) = mpsc::channel(8);
        let terminal = factory.create(PaneId(id), None, &tx).ok();
        Pane::new(PaneId(id), terminal)
    }

    #[test]
    fn send_command_appends_newline() {
        let mut factory = NullTerminalFactory::new();
        let mut pane = pane_with_terminal(&mut factory, 1);

        pane.send_command("ls -l");

        let sent = factory.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1, b"ls -l\n");
    }

    #[test]
    fn degraded_pane_forwards_nothing() {
        let mut pane = Pane::new(PaneId(7), None);
        assert!(pane.is_degraded());
        pane.send_command("echo hi");
        pane.resize(PaneSize::new(24, 80));
    }

    #[test]
    fn disabled_keyboard_swallows_and_notifies_once() {
        let mut factory = NullTerminalFactory::new();
        let mut pane = pane_with_terminal(&mut factory, 1);

        pane.set_keyboard_input_enabled(false);
        assert_eq!(pane.feed_key(b"a"), KeyDelivery::Swallowed { first: true });
        assert_eq!(pane.feed_key(b"b"), KeyDelivery::Swallowed { first: false });
        assert!(factory.sent().is_empty());

        // Re-disabling re-arms the notification.
        pane.set_keyboard_input_enabled(true);
        assert_eq!(pane.feed_key(b"c"), KeyDelivery::Forwarded);
        pane.set_keyboard_input_enabled(false);
        assert_eq!(pane.feed_key(b"d"), KeyDelivery::Swallowed { first: true });
    }
}
