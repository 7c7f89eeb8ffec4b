//! The scriptable remote command surface.
//!
//! External programs address the engine through plain integers and strings;
//! this is a persistent contract. Every operation tolerates stale or unknown
//! identifiers: the failure sentinel is `-1` (or `false`, or an empty
//! string), never a panic or an error. The transport carrying these calls is
//! the embedder's concern; only the semantics live here.

use crate::layout::{GrowthDirection, Orientation};
use crate::pane::PaneId;
use crate::registry::SessionRegistry;
use crate::session::{SessionId, SessionLayout};

/// Sentinel returned for unknown identifiers and impossible operations.
pub const SENTINEL: i64 = -1;

/// The identifier-addressed command interface over a registry.
///
/// Obtained from [`SessionRegistry::command_surface`]; borrows the registry
/// for the duration of a command batch.
pub struct CommandSurface<'a> {
    registry: &'a mut SessionRegistry,
}

impl<'a> CommandSurface<'a> {
    pub(crate) fn new(registry: &'a mut SessionRegistry) -> Self {
        Self { registry }
    }

    fn session_id(raw: i64) -> Option<SessionId> {
        u64::try_from(raw).ok().map(SessionId)
    }

    fn pane_id(raw: i64) -> Option<PaneId> {
        u64::try_from(raw).ok().map(PaneId)
    }

    fn add(&mut self, layout: SessionLayout) -> i64 {
        let id = self.registry.create_session(layout);
        // The reference behavior always raises newly added sessions.
        self.registry.raise_session(id);
        id.0 as i64
    }

    /// Add a single-pane session and raise it.
    pub fn add_session(&mut self) -> i64 {
        self.add(SessionLayout::Single)
    }

    /// Add a session pre-split into two rows and raise it.
    pub fn add_session_two_row(&mut self) -> i64 {
        self.add(SessionLayout::TwoRow)
    }

    /// Add a session pre-split into two columns and raise it.
    pub fn add_session_two_column(&mut self) -> i64 {
        self.add(SessionLayout::TwoColumn)
    }

    /// Add a session pre-split into a 2x2 grid and raise it.
    pub fn add_session_quad(&mut self) -> i64 {
        self.add(SessionLayout::Quad)
    }

    /// Raise a session. Unknown ids are ignored.
    pub fn raise_session(&mut self, session_id: i64) {
        if let Some(id) = Self::session_id(session_id) {
            self.registry.raise_session(id);
        }
    }

    /// Remove a session. Unknown ids are ignored.
    pub fn remove_session(&mut self, session_id: i64) {
        if let Some(id) = Self::session_id(session_id) {
            self.registry.remove_session(id);
        }
    }

    /// Remove a pane. Unknown ids are ignored.
    pub fn remove_terminal(&mut self, terminal_id: i64) {
        if let Some(id) = Self::pane_id(terminal_id) {
            self.registry.remove_pane(id);
        }
    }

    /// Split a session's active pane. Returns the new pane id or -1.
    pub fn split_session(&mut self, session_id: i64, orientation: Orientation) -> i64 {
        Self::session_id(session_id)
            .and_then(|id| self.registry.split_session(id, orientation))
            .map_or(SENTINEL, |p| p.0 as i64)
    }

    /// Split a pane. Returns the new pane id or -1.
    pub fn split_terminal(&mut self, terminal_id: i64, orientation: Orientation) -> i64 {
        Self::pane_id(terminal_id)
            .and_then(|id| self.registry.split_pane(id, orientation))
            .map_or(SENTINEL, |p| p.0 as i64)
    }

    /// Grow a pane toward a direction.
    ///
    /// `px == None` uses the configured default step. Returns the delta
    /// actually applied, or -1 when no growth is possible.
    pub fn try_grow_terminal(
        &mut self,
        terminal_id: i64,
        direction: GrowthDirection,
        px: Option<i32>,
    ) -> i64 {
        let px = px.unwrap_or_else(|| self.registry.grow_step());
        Self::pane_id(terminal_id)
            .and_then(|id| self.registry.try_grow_pane(id, direction, px))
            .map_or(SENTINEL, i64::from)
    }

    /// The active session id, or -1.
    #[must_use]
    pub fn active_session_id(&self) -> i64 {
        self.registry
            .active_session_id()
            .map_or(SENTINEL, |s| s.0 as i64)
    }

    /// The active pane id, or -1.
    #[must_use]
    pub fn active_terminal_id(&self) -> i64 {
        self.registry
            .active_pane_id()
            .map_or(SENTINEL, |p| p.0 as i64)
    }

    /// Comma-joined list of all session ids, in tab order.
    #[must_use]
    pub fn session_id_list(&self) -> String {
        join(self.registry.session_ids().iter().map(|s| s.0))
    }

    /// Comma-joined list of all pane ids; sessions in tab order, panes in
    /// traversal order.
    #[must_use]
    pub fn terminal_id_list(&self) -> String {
        join(
            self.registry
                .session_ids()
                .iter()
                .filter_map(|&s| self.registry.pane_ids_for_session(s))
                .flatten()
                .map(|p| p.0),
        )
    }

    /// Comma-joined pane ids of one session, or "-1" for unknown sessions.
    #[must_use]
    pub fn terminal_ids_for_session_id(&self, session_id: i64) -> String {
        Self::session_id(session_id)
            .and_then(|id| self.registry.pane_ids_for_session(id))
            .map_or_else(|| SENTINEL.to_string(), |ids| join(ids.iter().map(|p| p.0)))
    }

    /// The session owning a pane, or -1.
    #[must_use]
    pub fn session_id_for_terminal_id(&self, terminal_id: i64) -> i64 {
        Self::pane_id(terminal_id)
            .and_then(|id| self.registry.session_id_for_pane(id))
            .map_or(SENTINEL, |s| s.0 as i64)
    }

    /// Run command text in the active pane.
    ///
    /// This injects keystrokes into a live shell: the first use per process
    /// emits a warning notification, and the whole surface can be disabled
    /// in the registry configuration.
    pub fn run_command(&mut self, command: &str) {
        self.registry.remote_run_command(command, None);
    }

    /// Run command text in a specific pane. Stale ids are ignored.
    pub fn run_command_in_terminal(&mut self, terminal_id: i64, command: &str) {
        if let Some(id) = Self::pane_id(terminal_id) {
            self.registry.remote_run_command(command, Some(id));
        }
    }

    /// Whether a session is closable without confirmation. Unknown: false.
    #[must_use]
    pub fn is_session_closable(&self, session_id: i64) -> bool {
        Self::session_id(session_id)
            .and_then(|id| self.registry.session(id))
            .is_some_and(crate::session::Session::closable)
    }

    /// Lock or unlock a session against accidental close.
    pub fn set_session_closable(&mut self, session_id: i64, closable: bool) {
        if let Some(session) = Self::session_id(session_id)
            .and_then(|id| self.registry.session_mut(id))
        {
            session.set_closable(closable);
        }
    }

    /// Whether every pane of a session accepts keyboard input.
    #[must_use]
    pub fn is_session_keyboard_input_enabled(&self, session_id: i64) -> bool {
        Self::session_id(session_id)
            .and_then(|id| self.registry.session(id))
            .is_some_and(crate::session::Session::all_keyboard_input_enabled)
    }

    /// Enable or disable keyboard input for a whole session.
    pub fn set_session_keyboard_input_enabled(&mut self, session_id: i64, enabled: bool) {
        if let Some(session) = Self::session_id(session_id)
            .and_then(|id| self.registry.session_mut(id))
        {
            session.set_keyboard_input_enabled_all(enabled);
        }
    }

    /// Whether one pane accepts keyboard input.
    #[must_use]
    pub fn is_terminal_keyboard_input_enabled(&self, terminal_id: i64) -> bool {
        self.with_pane(terminal_id, crate::pane::Pane::keyboard_input_enabled)
    }

    /// Enable or disable keyboard input for one pane.
    pub fn set_terminal_keyboard_input_enabled(&mut self, terminal_id: i64, enabled: bool) {
        self.with_pane_mut(terminal_id, |p| p.set_keyboard_input_enabled(enabled));
    }

    /// Whether every pane of a session monitors activity.
    #[must_use]
    pub fn is_session_monitor_activity_enabled(&self, session_id: i64) -> bool {
        Self::session_id(session_id)
            .and_then(|id| self.registry.session(id))
            .is_some_and(crate::session::Session::all_monitor_activity)
    }

    /// Toggle activity monitoring for a whole session.
    pub fn set_session_monitor_activity_enabled(&mut self, session_id: i64, enabled: bool) {
        if let Some(session) = Self::session_id(session_id)
            .and_then(|id| self.registry.session_mut(id))
        {
            session.set_monitor_activity_all(enabled);
        }
    }

    /// Whether one pane monitors activity.
    #[must_use]
    pub fn is_terminal_monitor_activity_enabled(&self, terminal_id: i64) -> bool {
        self.with_pane(terminal_id, crate::pane::Pane::monitor_activity)
    }

    /// Toggle activity monitoring for one pane.
    pub fn set_terminal_monitor_activity_enabled(&mut self, terminal_id: i64, enabled: bool) {
        self.with_pane_mut(terminal_id, |p| p.set_monitor_activity(enabled));
    }

    /// Whether every pane of a session monitors silence.
    #[must_use]
    pub fn is_session_monitor_silence_enabled(&self, session_id: i64) -> bool {
        Self::session_id(session_id)
            .and_then(|id| self.registry.session(id))
            .is_some_and(crate::session::Session::all_monitor_silence)
    }

    /// Toggle silence monitoring for a whole session.
    pub fn set_session_monitor_silence_enabled(&mut self, session_id: i64, enabled: bool) {
        if let Some(session) = Self::session_id(session_id)
            .and_then(|id| self.registry.session_mut(id))
        {
            session.set_monitor_silence_all(enabled);
        }
    }

    /// Whether one pane monitors silence.
    #[must_use]
    pub fn is_terminal_monitor_silence_enabled(&self, terminal_id: i64) -> bool {
        self.with_pane(terminal_id, crate::pane::Pane::monitor_silence)
    }

    /// Toggle silence monitoring for one pane.
    pub fn set_terminal_monitor_silence_enabled(&mut self, terminal_id: i64, enabled: bool) {
        self.with_pane_mut(terminal_id, |p| p.set_monitor_silence(enabled));
    }

    fn with_pane(&self, terminal_id: i64, f: impl Fn(&crate::pane::Pane) -> bool) -> bool {
        Self::pane_id(terminal_id)
            .and_then(|id| {
                let session = self.registry.session_id_for_pane(id)?;
                self.registry.session(session)?.pane(id).map(&f)
            })
            .unwrap_or(false)
    }

    fn with_pane_mut(&mut self, terminal_id: i64, f: impl FnOnce(&mut crate::pane::Pane)) {
        if let Some(id) = Self::pane_id(terminal_id) {
            if let Some(session) = self.registry.session_id_for_pane(id) {
                if let Some(pane) = self
                    .registry
                    .session_mut(session)
                    .and_then(|s| s.pane_mut(id))
                {
                    f(pane);
                }
            }
        }
    }
}

impl SessionRegistry {
    /// Borrow the registry as its remote command surface.
    pub fn command_surface(&mut self) -> CommandSurface<'_> {
        CommandSurface::new(self)
    }
}

fn join(ids: impl Iterator<Item = u64>) -> String {
    ids.map(|id| id.to_string()).collect::<Vec<_>>().join(",")
}
