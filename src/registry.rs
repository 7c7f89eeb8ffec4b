//! The session registry: owner and router for all live sessions.

use std::collections::HashMap;
use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc;

use crate::event::{Notification, TermEvent};
use crate::layout::{GrowthDirection, Orientation};
use crate::pane::delivery::KeyDelivery;
use crate::pane::PaneId;
use crate::session::{CloseOutcome, Session, SessionId, SessionLayout};
use crate::tab_order::TabOrder;
use crate::terminal::{PtyTerminalFactory, TerminalFactory};

/// Allocates process-lifetime-unique session and pane identifiers.
///
/// Both counters are monotonic and never recycled; the registry owns the
/// single instance and threads it through session construction.
#[derive(Debug)]
pub(crate) struct IdAllocator {
    next_session: u64,
    next_pane: u64,
}

impl IdAllocator {
    pub(crate) fn new() -> Self {
        Self {
            next_session: 1,
            next_pane: 1,
        }
    }

    pub(crate) fn next_session_id(&mut self) -> SessionId {
        let id = SessionId(self.next_session);
        self.next_session += 1;
        id
    }

    pub(crate) fn next_pane_id(&mut self) -> PaneId {
        let id = PaneId(self.next_pane);
        self.next_pane += 1;
        id
    }
}

/// Everything a session needs to create panes.
pub(crate) struct SessionCtx<'a> {
    pub(crate) ids: &'a mut IdAllocator,
    pub(crate) factory: &'a mut dyn TerminalFactory,
    pub(crate) event_tx: &'a mpsc::Sender<TermEvent>,
}

/// Asks the user whether a close-locked session may really be closed.
///
/// The windowing collaborator renders the actual dialog; a declined
/// confirmation cancels the close with no state change.
pub trait CloseConfirmer: Send {
    /// Ask the question; true means "go ahead".
    fn confirm(&self, question: &str) -> bool;
}

/// A confirmer that always says yes. Default for headless embeddings.
pub struct AlwaysConfirm;

impl CloseConfirmer for AlwaysConfirm {
    fn confirm(&self, _question: &str) -> bool {
        true
    }
}

/// Configuration for the session registry.
#[derive(Clone, Debug)]
pub struct RegistryConfig {
    /// Default working directory for the very first session. `None` means
    /// the process working directory.
    pub working_directory: Option<PathBuf>,

    /// Whether the remote command surface may inject command text into
    /// shells. Disabling this closes the documented trust boundary.
    pub remote_run_command_enabled: bool,

    /// Default pixel step for grow operations issued without an explicit
    /// amount.
    pub grow_step: i32,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            working_directory: None,
            remote_run_command_enabled: true,
            grow_step: 10,
        }
    }
}

/// Owner of all sessions; routes identifier-addressed operations.
///
/// Single-threaded by design: every operation runs to completion before
/// control returns, and all notifications are observed only after the
/// mutations they describe. Sessions scheduled for destruction are parked in
/// a graveyard and freed on the next [`SessionRegistry::poll_events`] turn,
/// so a callback running as a result of a teardown never frees an object
/// still on the call stack.
pub struct SessionRegistry {
    config: RegistryConfig,
    sessions: HashMap<SessionId, Session>,
    active_session: Option<SessionId>,
    tab_order: TabOrder,
    ids: IdAllocator,
    factory: Box<dyn TerminalFactory>,
    confirmer: Box<dyn CloseConfirmer>,
    event_tx: mpsc::Sender<TermEvent>,
    event_rx: mpsc::Receiver<TermEvent>,
    graveyard: Vec<Session>,
    notifications: Vec<Notification>,
    run_command_warned: bool,
}

impl SessionRegistry {
    /// Create a registry spawning real PTY-backed terminals.
    #[must_use]
    pub fn new(config: RegistryConfig) -> Self {
        Self::with_factory(config, Box::new(PtyTerminalFactory::default()))
    }

    /// Create a registry with a custom terminal factory.
    #[must_use]
    pub fn with_factory(config: RegistryConfig, factory: Box<dyn TerminalFactory>) -> Self {
        let (event_tx, event_rx) = mpsc::channel(256);
        Self {
            config,
            sessions: HashMap::new(),
            active_session: None,
            tab_order: TabOrder::new(),
            ids: IdAllocator::new(),
            factory,
            confirmer: Box::new(AlwaysConfirm),
            event_tx,
            event_rx,
            graveyard: Vec::new(),
            notifications: Vec::new(),
            run_command_warned: false,
        }
    }

    /// Install the close-confirmation collaborator.
    #[must_use]
    pub fn confirmer(mut self, confirmer: Box<dyn CloseConfirmer>) -> Self {
        self.confirmer = confirmer;
        self
    }

    /// Create a new session with the given initial layout.
    ///
    /// The working directory defaults to the active session's active pane's
    /// current directory, falling back to the configured (or process)
    /// default. The new session is appended to the tab order but *not*
    /// raised; callers raise explicitly.
    pub fn create_session(&mut self, layout: SessionLayout) -> SessionId {
        let cwd = self
            .active_session
            .and_then(|id| self.sessions.get(&id))
            .and_then(|s| s.active_pane().and_then(|p| s.pane(p)))
            .and_then(crate::pane::Pane::working_directory)
            .or_else(|| self.config.working_directory.clone())
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("/"));

        let mut ctx = SessionCtx {
            ids: &mut self.ids,
            factory: self.factory.as_mut(),
            event_tx: &self.event_tx,
        };
        let id = ctx.ids.next_session_id();
        let session = Session::new(&mut ctx, id, layout, cwd);
        self.sessions.insert(id, session);

        let title = self.tab_order.add_session(id);
        self.notifications.push(Notification::SessionAdded {
            session_id: id,
            title,
        });
        id
    }

    /// Make a session the active one. No-op for unknown ids.
    pub fn raise_session(&mut self, id: SessionId) {
        if !self.sessions.contains_key(&id) {
            tracing::debug!("raise of unknown session {} ignored", id);
            return;
        }
        if self.active_session != Some(id) {
            self.active_session = Some(id);
            self.notifications
                .push(Notification::SessionRaised { session_id: id });
        }
    }

    /// Remove a session.
    ///
    /// A close-locked session requires confirmation; a declined confirmation
    /// cancels the removal with no state change. Returns true if the session
    /// was removed.
    pub fn remove_session(&mut self, id: SessionId) -> bool {
        let Some(session) = self.sessions.get(&id) else {
            tracing::debug!("remove of unknown session {} ignored", id);
            return false;
        };
        if !session.closable() {
            let question = format!(
                "Session \"{}\" is locked. Close it anyway?",
                self.tab_order.display_title(id).unwrap_or_default()
            );
            if !self.confirmer.confirm(&question) {
                return false;
            }
        }
        self.teardown_session(id);
        true
    }

    /// Close a pane anywhere in the registry.
    ///
    /// A session whose last pane closes is torn down without confirmation
    /// (its processes are gone; there is nothing left to keep).
    pub fn remove_pane(&mut self, pane_id: PaneId) {
        let Some(session_id) = self.session_id_for_pane(pane_id) else {
            tracing::debug!("remove of unknown pane {} ignored", pane_id);
            return;
        };
        let session = self.sessions.get_mut(&session_id).expect("session exists");
        if let CloseOutcome::Closed { now_empty } = session.close_pane(pane_id) {
            self.notifications.push(Notification::PaneRemoved {
                session_id,
                pane_id,
            });
            if now_empty {
                self.teardown_session(session_id);
            }
        }
    }

    /// Schedule a session for destruction: remove it from the registry and
    /// the tab order now, free the object on the next event-loop turn.
    fn teardown_session(&mut self, id: SessionId) {
        let Some(mut session) = self.sessions.remove(&id) else {
            return;
        };
        session.shutdown();

        let old_pos = self.tab_order.position(id).unwrap_or(0);
        let became_empty = self.tab_order.remove_session(id);

        self.graveyard.push(session);
        self.notifications
            .push(Notification::SessionRemoved { session_id: id });

        if self.active_session == Some(id) {
            let order = self.tab_order.order();
            self.active_session = if order.is_empty() {
                None
            } else {
                // The nearest remaining tab: previous index, clamped.
                Some(order[old_pos.saturating_sub(1).min(order.len() - 1)])
            };
            if let Some(new_active) = self.active_session {
                self.notifications.push(Notification::SessionRaised {
                    session_id: new_active,
                });
            }
        }

        if became_empty {
            self.notifications.push(Notification::LastSessionClosed);
        }
    }

    /// Split a session's active pane. Returns the new pane id.
    pub fn split_session(
        &mut self,
        session_id: SessionId,
        orientation: Orientation,
    ) -> Option<PaneId> {
        let active = self.sessions.get(&session_id)?.active_pane()?;
        self.split_pane_in(session_id, active, orientation)
    }

    /// Split a pane anywhere in the registry. Returns the new pane id.
    pub fn split_pane(&mut self, pane_id: PaneId, orientation: Orientation) -> Option<PaneId> {
        let session_id = self.session_id_for_pane(pane_id)?;
        self.split_pane_in(session_id, pane_id, orientation)
    }

    fn split_pane_in(
        &mut self,
        session_id: SessionId,
        pane_id: PaneId,
        orientation: Orientation,
    ) -> Option<PaneId> {
        let mut ctx = SessionCtx {
            ids: &mut self.ids,
            factory: self.factory.as_mut(),
            event_tx: &self.event_tx,
        };
        self.sessions
            .get_mut(&session_id)?
            .split_pane(&mut ctx, pane_id, orientation)
    }

    /// Grow a pane's subtree. Returns the applied delta, `None` if the pane
    /// is unknown or no ancestor level can redistribute in that direction.
    pub fn try_grow_pane(
        &mut self,
        pane_id: PaneId,
        direction: GrowthDirection,
        px: i32,
    ) -> Option<i32> {
        let session_id = self.session_id_for_pane(pane_id)?;
        self.sessions
            .get_mut(&session_id)?
            .try_grow_pane(pane_id, direction, px)
    }

    /// The default grow step from the configuration.
    #[must_use]
    pub fn grow_step(&self) -> i32 {
        self.config.grow_step
    }

    /// The active session, if any.
    #[must_use]
    pub fn active_session_id(&self) -> Option<SessionId> {
        self.active_session
    }

    /// The active session's active pane, if any.
    #[must_use]
    pub fn active_pane_id(&self) -> Option<PaneId> {
        self.active_session
            .and_then(|id| self.sessions.get(&id))
            .and_then(Session::active_pane)
    }

    /// Look up a session.
    #[must_use]
    pub fn session(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(&id)
    }

    pub(crate) fn session_mut(&mut self, id: SessionId) -> Option<&mut Session> {
        self.sessions.get_mut(&id)
    }

    /// All live session ids, in tab (display) order.
    #[must_use]
    pub fn session_ids(&self) -> Vec<SessionId> {
        self.tab_order.order().to_vec()
    }

    /// Number of live sessions.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// A session's pane ids in tree-traversal order.
    #[must_use]
    pub fn pane_ids_for_session(&self, id: SessionId) -> Option<Vec<PaneId>> {
        self.sessions.get(&id).map(Session::pane_ids)
    }

    /// The session owning a pane. Linear scan, first match wins.
    #[must_use]
    pub fn session_id_for_pane(&self, pane_id: PaneId) -> Option<SessionId> {
        self.sessions
            .iter()
            .find(|(_, s)| s.pane(pane_id).is_some())
            .map(|(id, _)| *id)
    }

    /// The tab order (display order and titles).
    #[must_use]
    pub fn tab_order(&self) -> &TabOrder {
        &self.tab_order
    }

    /// Move a session's tab one position left.
    pub fn move_session_left(&mut self, id: SessionId) -> bool {
        self.tab_order.move_left(id)
    }

    /// Move a session's tab one position right.
    pub fn move_session_right(&mut self, id: SessionId) -> bool {
        self.tab_order.move_right(id)
    }

    /// Rename a session's tab.
    ///
    /// `interactive` renames pin the label against automatic title sync.
    pub fn set_session_title(&mut self, id: SessionId, title: &str, interactive: bool) {
        if self.tab_order.set_title(id, title, interactive) {
            let display = self
                .tab_order
                .display_title(id)
                .unwrap_or_default()
                .to_string();
            self.notifications.push(Notification::TabTitleChanged {
                session_id: id,
                title: display,
            });
        }
    }

    /// Move focus to the next pane of the active session.
    pub fn focus_next_pane(&mut self) {
        if let Some(session) = self.active_session_mut() {
            session.focus_next();
        }
    }

    /// Move focus to the previous pane of the active session.
    pub fn focus_previous_pane(&mut self) {
        if let Some(session) = self.active_session_mut() {
            session.focus_previous();
        }
    }

    /// Make a pane the active pane of its session.
    pub fn activate_pane(&mut self, pane_id: PaneId) {
        if let Some(session_id) = self.session_id_for_pane(pane_id) {
            if let Some(session) = self.sessions.get_mut(&session_id) {
                session.set_active_pane(pane_id);
            }
        }
    }

    fn active_session_mut(&mut self) -> Option<&mut Session> {
        let id = self.active_session?;
        self.sessions.get_mut(&id)
    }

    /// Send command text (plus newline) to a pane, or to the active pane
    /// when `pane_id` is `None`. Stale ids are silently ignored.
    pub fn run_command(&mut self, text: &str, pane_id: Option<PaneId>) {
        let Some(target) = pane_id.or_else(|| self.active_pane_id()) else {
            return;
        };
        let Some(session_id) = self.session_id_for_pane(target) else {
            tracing::debug!("run_command for unknown pane {} ignored", target);
            return;
        };
        if let Some(pane) = self
            .sessions
            .get_mut(&session_id)
            .and_then(|s| s.pane_mut(target))
        {
            pane.send_command(text);
        }
    }

    /// `run_command` as exercised by the remote command surface.
    ///
    /// Subject to the configuration gate, and emits the one-time
    /// keystroke-injection warning.
    pub(crate) fn remote_run_command(&mut self, text: &str, pane_id: Option<PaneId>) {
        if !self.config.remote_run_command_enabled {
            tracing::warn!("remote run_command is disabled by configuration");
            return;
        }
        // Resolve first: a stale id returns without effect and without the
        // warning notification.
        let Some(target) = pane_id.or_else(|| self.active_pane_id()) else {
            return;
        };
        if self.session_id_for_pane(target).is_none() {
            tracing::debug!("remote run_command for unknown pane {} ignored", target);
            return;
        }
        if !self.run_command_warned {
            self.run_command_warned = true;
            self.notifications.push(Notification::RunCommandWarning);
        }
        self.run_command(text, Some(target));
    }

    /// Route a key event to the active pane, honoring its keyboard-input
    /// toggle.
    pub fn route_key(&mut self, key: KeyEvent) {
        let bytes = key_to_bytes(key);
        if bytes.is_empty() {
            return;
        }
        let Some(pane_id) = self.active_pane_id() else {
            return;
        };
        let delivery = self
            .active_session_mut()
            .and_then(|s| s.pane_mut(pane_id))
            .map(|p| p.feed_key(&bytes));
        if delivery == Some(KeyDelivery::Swallowed { first: true }) {
            self.notifications
                .push(Notification::KeyboardInputBlocked { pane_id });
        }
    }

    /// Drain terminal events, apply them, free the graveyard, and return the
    /// accumulated notifications.
    ///
    /// Call once per event-loop turn.
    pub fn poll_events(&mut self) -> Vec<Notification> {
        while let Ok(event) = self.event_rx.try_recv() {
            match event {
                TermEvent::TitleChanged { pane_id, title } => {
                    self.apply_title_change(pane_id, &title);
                }
                TermEvent::Exited { pane_id } => {
                    self.remove_pane(pane_id);
                }
                TermEvent::Output { .. } => {}
            }
        }

        self.graveyard.clear();
        std::mem::take(&mut self.notifications)
    }

    /// Title sync: pane title always updates; the session and tab mirror the
    /// *active* pane's title only.
    fn apply_title_change(&mut self, pane_id: PaneId, title: &str) {
        let Some(session_id) = self.session_id_for_pane(pane_id) else {
            return;
        };
        let mut mirrors = false;
        if let Some(session) = self.sessions.get_mut(&session_id) {
            if let Some(pane) = session.pane_mut(pane_id) {
                pane.set_title(title.to_string());
            }
            if session.active_pane() == Some(pane_id) {
                session.set_title(title.to_string());
                mirrors = true;
            }
        }
        if mirrors {
            self.set_session_title(session_id, title, false);
        }
    }

    /// Sender half of the terminal event channel, for embedders driving
    /// their own terminal collaborator.
    #[must_use]
    pub fn event_sender(&self) -> mpsc::Sender<TermEvent> {
        self.event_tx.clone()
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("sessions", &self.sessions.len())
            .field("active_session", &self.active_session)
            .finish_non_exhaustive()
    }
}

/// Convert a key event to bytes to send to the terminal.
fn key_to_bytes(key: KeyEvent) -> Vec<u8> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);

    match key.code {
        KeyCode::Char(c) => {
            if ctrl {
                // Control characters (Ctrl+A = 0x01, etc.)
                let code = c.to_ascii_lowercase() as u8;
                if code.is_ascii_lowercase() {
                    vec![code - b'a' + 1]
                } else {
                    vec![]
                }
            } else if alt {
                // Alt sends ESC prefix
                vec![0x1b, c as u8]
            } else {
                c.to_string().into_bytes()
            }
        }
        KeyCode::Enter => vec![b'\r'],
        KeyCode::Tab => vec![b'\t'],
        KeyCode::Backspace => vec![0x7f],
        KeyCode::Esc => vec![0x1b],
        KeyCode::Up => b"\x1b[A".to_vec(),
        KeyCode::Down => b"\x1b[B".to_vec(),
        KeyCode::Right => b"\x1b[C".to_vec(),
        KeyCode::Left => b"\x1b[D".to_vec(),
        KeyCode::Home => b"\x1b[H".to_vec(),
        KeyCode::End => b"\x1b[F".to_vec(),
        KeyCode::PageUp => b"\x1b[5~".to_vec(),
        KeyCode::PageDown => b"\x1b[6~".to_vec(),
        KeyCode::Delete => b"\x1b[3~".to_vec(),
        KeyCode::Insert => b"\x1b[2~".to_vec(),
        KeyCode::F(n) => match n {
            1 => b"\x1bOP".to_vec(),
            2 => b"\x1bOQ".to_vec(),
            3 => b"\x1bOR".to_vec(),
            4 => b"\x1bOS".to_vec(),
            5 => b"\x1b[15~".to_vec(),
            6 => b"\x1b[17~".to_vec(),
            7 => b"\x1b[18~".to_vec(),
            8 => b"\x1b[19~".to_vec(),
            9 => b"\x1b[20~".to_vec(),
            10 => b"\x1b[21~".to_vec(),
            11 => b"\x1b[23~".to_vec(),
            12 => b"\x1b[24~".to_vec(),
            _ => vec![],
        },
        _ => vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal::NullTerminalFactory;

    fn registry() -> SessionRegistry {
        SessionRegistry::with_factory(
            RegistryConfig::default(),
            Box::new(NullTerminalFactory::new()),
        )
    }

    struct AlwaysDecline;
    impl CloseConfirmer for AlwaysDecline {
        fn confirm(&self, _question: &str) -> bool {
            false
        }
    }

    #[test]
    fn ids_are_unique_and_monotonic_across_lifetimes() {
        let mut reg = registry();
        let s1 = reg.create_session(SessionLayout::Single);
        let s2 = reg.create_session(SessionLayout::TwoColumn);
        assert!(s2 > s1);

        let panes_before: Vec<PaneId> = reg
            .session_ids()
            .iter()
            .flat_map(|&s| reg.pane_ids_for_session(s).unwrap())
            .collect();

        reg.remove_session(s2);
        let s3 = reg.create_session(SessionLayout::Single);
        assert!(s3 > s2);

        let p3 = reg.pane_ids_for_session(s3).unwrap()[0];
        assert!(panes_before.iter().all(|&p| p3 > p));
    }

    #[test]
    fn tab_order_is_a_permutation_of_live_sessions() {
        let mut reg = registry();
        let s1 = reg.create_session(SessionLayout::Single);
        let s2 = reg.create_session(SessionLayout::Single);
        let s3 = reg.create_session(SessionLayout::Single);

        reg.move_session_right(s1);
        reg.remove_session(s2);

        let mut ordered = reg.session_ids();
        ordered.sort();
        assert_eq!(ordered, vec![s1, s3]);
        assert_eq!(reg.session_count(), reg.tab_order().len());
    }

    #[test]
    fn create_does_not_raise_but_raise_does() {
        let mut reg = registry();
        let s1 = reg.create_session(SessionLayout::Single);
        assert_eq!(reg.active_session_id(), None);

        reg.raise_session(s1);
        assert_eq!(reg.active_session_id(), Some(s1));
        assert_eq!(
            reg.pane_ids_for_session(s1).unwrap().first().copied(),
            reg.active_pane_id()
        );

        reg.raise_session(SessionId(404));
        assert_eq!(reg.active_session_id(), Some(s1));
    }

    #[test]
    fn last_session_closed_fires_exactly_once() {
        let mut reg = registry();
        let s1 = reg.create_session(SessionLayout::Single);
        let s2 = reg.create_session(SessionLayout::Single);
        reg.raise_session(s1);

        // Close all panes of s2, then remove the last session via its pane.
        for pane in reg.pane_ids_for_session(s2).unwrap() {
            reg.remove_pane(pane);
        }
        let last_pane = reg.pane_ids_for_session(s1).unwrap()[0];
        reg.remove_pane(last_pane);

        let notifications = reg.poll_events();
        let fired = notifications
            .iter()
            .filter(|n| **n == Notification::LastSessionClosed)
            .count();
        assert_eq!(fired, 1);
        assert!(reg.tab_order().is_empty());
        assert_eq!(reg.active_session_id(), None);
    }

    #[test]
    fn declined_confirmation_cancels_close_of_locked_session() {
        let mut reg = registry().confirmer(Box::new(AlwaysDecline));
        let s1 = reg.create_session(SessionLayout::Single);
        reg.session_mut(s1).unwrap().set_closable(false);

        assert!(!reg.remove_session(s1));
        assert_eq!(reg.session_count(), 1);

        // Pane exhaustion still tears the session down; the processes are
        // gone and there is nothing to keep.
        let pane = reg.pane_ids_for_session(s1).unwrap()[0];
        reg.remove_pane(pane);
        assert_eq!(reg.session_count(), 0);
    }

    #[test]
    fn removing_active_session_raises_the_neighbor() {
        let mut reg = registry();
        let s1 = reg.create_session(SessionLayout::Single);
        let s2 = reg.create_session(SessionLayout::Single);
        let s3 = reg.create_session(SessionLayout::Single);
        reg.raise_session(s2);

        reg.remove_session(s2);
        assert_eq!(reg.active_session_id(), Some(s1));

        reg.remove_session(s1);
        assert_eq!(reg.active_session_id(), Some(s3));
    }

    #[test]
    fn split_and_grow_route_to_the_owning_session() {
        let mut reg = registry();
        let s1 = reg.create_session(SessionLayout::Single);
        reg.raise_session(s1);

        let new_pane = reg.split_session(s1, Orientation::Row).unwrap();
        assert_eq!(reg.session_id_for_pane(new_pane), Some(s1));
        assert_eq!(reg.active_pane_id(), Some(new_pane));

        let first = reg.pane_ids_for_session(s1).unwrap()[0];
        assert_eq!(
            reg.try_grow_pane(first, GrowthDirection::Right, 10),
            Some(10)
        );
        // Last pane in the row cannot grow right at any level.
        assert_eq!(reg.try_grow_pane(new_pane, GrowthDirection::Right, 10), None);
    }

    #[test]
    fn stale_identifiers_are_tolerated_everywhere() {
        let mut reg = registry();
        let s1 = reg.create_session(SessionLayout::Single);
        reg.raise_session(s1);
        let pane = reg.pane_ids_for_session(s1).unwrap()[0];
        let second = reg.split_pane(pane, Orientation::Row).unwrap();
        reg.remove_pane(second);

        // All of these race legitimately against closes; none may panic.
        reg.remove_pane(second);
        assert_eq!(reg.split_pane(second, Orientation::Column), None);
        assert_eq!(reg.try_grow_pane(second, GrowthDirection::Up, 10), None);
        assert_eq!(reg.session_id_for_pane(second), None);
        reg.run_command("echo hi", Some(second));
    }

    #[test]
    fn title_sync_follows_the_active_pane_only() {
        let mut reg = registry();
        let s1 = reg.create_session(SessionLayout::TwoColumn);
        reg.raise_session(s1);
        let panes = reg.pane_ids_for_session(s1).unwrap();
        let active = reg.active_pane_id().unwrap();
        let inactive = *panes.iter().find(|&&p| p != active).unwrap();

        let tx = reg.event_sender();
        tx.try_send(TermEvent::TitleChanged {
            pane_id: inactive,
            title: "background".into(),
        })
        .unwrap();
        tx.try_send(TermEvent::TitleChanged {
            pane_id: active,
            title: "vim".into(),
        })
        .unwrap();

        reg.poll_events();
        assert_eq!(reg.session(s1).unwrap().title(), "vim");
        assert_eq!(reg.tab_order().display_title(s1), Some("vim"));
        assert_eq!(reg.session(s1).unwrap().pane(inactive).unwrap().title(), "background");
    }

    #[test]
    fn process_exit_closes_the_pane() {
        let mut reg = registry();
        let s1 = reg.create_session(SessionLayout::TwoColumn);
        let panes = reg.pane_ids_for_session(s1).unwrap();

        reg.event_sender()
            .try_send(TermEvent::Exited { pane_id: panes[0] })
            .unwrap();
        reg.poll_events();

        assert_eq!(reg.pane_ids_for_session(s1).unwrap(), vec![panes[1]]);
    }

    #[test]
    fn blocked_keystroke_notifies_once_per_disable() {
        let mut reg = registry();
        let s1 = reg.create_session(SessionLayout::Single);
        reg.raise_session(s1);
        let pane = reg.active_pane_id().unwrap();
        reg.session_mut(s1)
            .unwrap()
            .pane_mut(pane)
            .unwrap()
            .set_keyboard_input_enabled(false);
        reg.poll_events();

        let key = KeyEvent::new(KeyCode::Char('x'), KeyModifiers::NONE);
        reg.route_key(key);
        reg.route_key(key);

        let blocked = reg
            .poll_events()
            .into_iter()
            .filter(|n| matches!(n, Notification::KeyboardInputBlocked { .. }))
            .count();
        assert_eq!(blocked, 1);
    }

    #[test]
    fn new_session_inherits_the_active_panes_working_directory() {
        let mut reg = SessionRegistry::with_factory(
            RegistryConfig {
                working_directory: Some(PathBuf::from("/srv")),
                ..RegistryConfig::default()
            },
            Box::new(NullTerminalFactory::new()),
        );
        let s1 = reg.create_session(SessionLayout::Single);
        reg.raise_session(s1);
        assert_eq!(
            reg.session(s1).unwrap().working_directory(),
            PathBuf::from("/srv").as_path()
        );

        // The null terminal reports the cwd it was created with, so the next
        // session inherits it.
        let s2 = reg.create_session(SessionLayout::Single);
        assert_eq!(
            reg.session(s2).unwrap().working_directory(),
            PathBuf::from("/srv").as_path()
        );
    }
}
