//! Sessions: one tab's worth of panes arranged in a split tree.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ratatui::layout::Rect;

use crate::layout::{GrowthDirection, Orientation, SplitTree, FULL_SPAN};
use crate::pane::{Pane, PaneId};
use crate::registry::SessionCtx;

/// Unique identifier for a session.
///
/// Session ids are process-lifetime-unique: assigned monotonically and never
/// reused, even after the session is destroyed.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Initial pane arrangement of a new session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionLayout {
    /// One pane.
    Single,
    /// Two panes stacked in two rows.
    TwoRow,
    /// Two panes side by side in two columns.
    TwoColumn,
    /// Four panes in a 2x2 grid.
    Quad,
}

/// Result of closing a pane.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CloseOutcome {
    /// The pane does not belong to this session; nothing happened.
    NotFound,
    /// The pane was closed. `now_empty` signals session teardown.
    Closed { now_empty: bool },
}

/// One session: a split tree of panes plus per-session state.
///
/// A session exclusively owns its panes and its tree; all mutation goes
/// through the owning [`SessionRegistry`](crate::SessionRegistry).
pub struct Session {
    id: SessionId,
    working_directory: PathBuf,
    title: String,
    active_pane: Option<PaneId>,
    closable: bool,
    tree: SplitTree,
    panes: HashMap<PaneId, Pane>,
}

impl Session {
    /// Build a session with its initial layout. At least one pane always
    /// exists afterwards; the first pane is active.
    pub(crate) fn new(
        ctx: &mut SessionCtx<'_>,
        id: SessionId,
        layout: SessionLayout,
        working_directory: PathBuf,
    ) -> Self {
        let mut session = Self {
            id,
            working_directory,
            title: String::new(),
            active_pane: None,
            closable: true,
            tree: SplitTree::new(Orientation::Row),
            panes: HashMap::new(),
        };

        let first = session.create_pane(ctx);
        session.tree.add_pane(session.tree.root(), 0, first, FULL_SPAN);
        session.active_pane = Some(first);

        match layout {
            SessionLayout::Single => {}
            SessionLayout::TwoRow => {
                session.split_pane(ctx, first, Orientation::Column);
            }
            SessionLayout::TwoColumn => {
                session.split_pane(ctx, first, Orientation::Row);
            }
            SessionLayout::Quad => {
                let second = session.split_pane(ctx, first, Orientation::Column);
                session.split_pane(ctx, first, Orientation::Row);
                if let Some(second) = second {
                    session.split_pane(ctx, second, Orientation::Row);
                }
            }
        }

        session.active_pane = Some(first);
        session
    }

    fn create_pane(&mut self, ctx: &mut SessionCtx<'_>) -> PaneId {
        let pane_id = ctx.ids.next_pane_id();
        let terminal = match ctx
            .factory
            .create(pane_id, Some(&self.working_directory), ctx.event_tx)
        {
            Ok(terminal) => Some(terminal),
            Err(e) => {
                tracing::warn!("terminal unavailable for pane {}: {}", pane_id, e);
                None
            }
        };

        let mut pane = Pane::new(pane_id, terminal);
        if pane.is_degraded() {
            pane.set_title("terminal unavailable".to_string());
        }
        self.panes.insert(pane_id, pane);
        pane_id
    }

    /// Get the session ID.
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// The session title (mirrors the active pane's title).
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    pub(crate) fn set_title(&mut self, title: String) {
        self.title = title;
    }

    /// Whether the session may be closed without confirmation.
    #[must_use]
    pub fn closable(&self) -> bool {
        self.closable
    }

    /// Lock or unlock the session against accidental close.
    pub fn set_closable(&mut self, closable: bool) {
        self.closable = closable;
    }

    /// The default working directory for new panes in this session.
    #[must_use]
    pub fn working_directory(&self) -> &Path {
        &self.working_directory
    }

    /// The currently active pane, `None` only during teardown.
    #[must_use]
    pub fn active_pane(&self) -> Option<PaneId> {
        self.active_pane
    }

    /// Make `pane_id` the active pane. No-op if it is not owned here.
    pub(crate) fn set_active_pane(&mut self, pane_id: PaneId) {
        if self.panes.contains_key(&pane_id) {
            self.active_pane = Some(pane_id);
        }
    }

    /// Look up a pane.
    #[must_use]
    pub fn pane(&self, pane_id: PaneId) -> Option<&Pane> {
        self.panes.get(&pane_id)
    }

    pub(crate) fn pane_mut(&mut self, pane_id: PaneId) -> Option<&mut Pane> {
        self.panes.get_mut(&pane_id)
    }

    /// Pane ids in stable tree-traversal order.
    #[must_use]
    pub fn pane_ids(&self) -> Vec<PaneId> {
        self.tree.pane_ids()
    }

    /// Number of panes.
    #[must_use]
    pub fn pane_count(&self) -> usize {
        self.panes.len()
    }

    /// Read-only access to the split tree.
    #[must_use]
    pub fn tree(&self) -> &SplitTree {
        &self.tree
    }

    /// Compute screen areas for every pane within `area`.
    #[must_use]
    pub fn pane_areas(&self, area: Rect) -> HashMap<PaneId, Rect> {
        self.tree.areas(area)
    }

    /// Split `pane_id` along `orientation`; the new pane becomes active.
    ///
    /// Returns the new pane's id, or `None` if `pane_id` is not owned here.
    pub(crate) fn split_pane(
        &mut self,
        ctx: &mut SessionCtx<'_>,
        pane_id: PaneId,
        orientation: Orientation,
    ) -> Option<PaneId> {
        if !self.panes.contains_key(&pane_id) {
            tracing::debug!("split of unknown pane {} ignored", pane_id);
            return None;
        }

        let new_pane = self.create_pane(ctx);
        if !self.tree.split(pane_id, orientation, new_pane) {
            // Pane map and tree disagree; should not happen, but stay safe.
            self.panes.remove(&new_pane);
            return None;
        }
        self.active_pane = Some(new_pane);
        Some(new_pane)
    }

    /// Grow the pane's subtree toward `direction` by up to `px` logical
    /// pixels. Returns the applied delta, `None` if growth is impossible.
    pub(crate) fn try_grow_pane(
        &mut self,
        pane_id: PaneId,
        direction: GrowthDirection,
        px: i32,
    ) -> Option<i32> {
        if !self.panes.contains_key(&pane_id) {
            return None;
        }
        self.tree.try_grow(pane_id, direction, px)
    }

    /// Close a pane, refocusing and cleaning up the tree.
    pub(crate) fn close_pane(&mut self, pane_id: PaneId) -> CloseOutcome {
        let Some(mut pane) = self.panes.remove(&pane_id) else {
            tracing::debug!("close of unknown pane {} ignored", pane_id);
            return CloseOutcome::NotFound;
        };

        // Re-activate the previous pane in traversal order before the tree
        // forgets the closing pane's position.
        if self.active_pane == Some(pane_id) {
            let order = self.tree.pane_ids();
            if order.len() > 1 {
                let pos = order.iter().position(|&p| p == pane_id).unwrap_or(0);
                let prev = order[(pos + order.len() - 1) % order.len()];
                self.active_pane = Some(prev);
            } else {
                self.active_pane = None;
            }
        }

        pane.shutdown();
        self.tree.remove_pane(pane_id);
        self.tree.recursive_cleanup();

        CloseOutcome::Closed {
            now_empty: self.panes.is_empty(),
        }
    }

    /// Move focus to the next pane in traversal order, wrapping around.
    pub(crate) fn focus_next(&mut self) {
        self.step_focus(1);
    }

    /// Move focus to the previous pane in traversal order, wrapping around.
    pub(crate) fn focus_previous(&mut self) {
        self.step_focus(-1);
    }

    fn step_focus(&mut self, step: isize) {
        let order = self.tree.pane_ids();
        if order.is_empty() {
            return;
        }
        let pos = self
            .active_pane
            .and_then(|active| order.iter().position(|&p| p == active))
            .unwrap_or(0);
        let len = order.len() as isize;
        let next = (pos as isize + step).rem_euclid(len) as usize;
        self.active_pane = Some(order[next]);
    }

    /// Shut down every pane's terminal. Used during session teardown.
    pub(crate) fn shutdown(&mut self) {
        for pane in self.panes.values_mut() {
            pane.shutdown();
        }
        self.active_pane = None;
    }

    // Session-wide toggle fan-out. The any/all pairs drive tri-state menu
    // presentation in the host.

    /// Enable or disable keyboard input on every pane.
    pub fn set_keyboard_input_enabled_all(&mut self, enabled: bool) {
        for pane in self.panes.values_mut() {
            pane.set_keyboard_input_enabled(enabled);
        }
    }

    /// Whether any pane has keyboard input enabled.
    #[must_use]
    pub fn any_keyboard_input_enabled(&self) -> bool {
        self.panes.values().any(Pane::keyboard_input_enabled)
    }

    /// Whether every pane has keyboard input enabled.
    #[must_use]
    pub fn all_keyboard_input_enabled(&self) -> bool {
        self.panes.values().all(Pane::keyboard_input_enabled)
    }

    /// Enable or disable activity monitoring on every pane.
    pub fn set_monitor_activity_all(&mut self, enabled: bool) {
        for pane in self.panes.values_mut() {
            pane.set_monitor_activity(enabled);
        }
    }

    /// Whether any pane monitors activity.
    #[must_use]
    pub fn any_monitor_activity(&self) -> bool {
        self.panes.values().any(Pane::monitor_activity)
    }

    /// Whether every pane monitors activity.
    #[must_use]
    pub fn all_monitor_activity(&self) -> bool {
        self.panes.values().all(Pane::monitor_activity)
    }

    /// Enable or disable silence monitoring on every pane.
    pub fn set_monitor_silence_all(&mut self, enabled: bool) {
        for pane in self.panes.values_mut() {
            pane.set_monitor_silence(enabled);
        }
    }

    /// Whether any pane monitors silence.
    #[must_use]
    pub fn any_monitor_silence(&self) -> bool {
        self.panes.values().any(Pane::monitor_silence)
    }

    /// Whether every pane monitors silence.
    #[must_use]
    pub fn all_monitor_silence(&self) -> bool {
        self.panes.values().all(Pane::monitor_silence)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("panes", &self.panes.len())
            .field("active_pane", &self.active_pane)
            .finish_non_exhaustive()
    }
}
