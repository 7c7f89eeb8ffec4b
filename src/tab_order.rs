//! The user-visible left-to-right ordering of sessions.
//!
//! Tab order is independent of session id values and of creation order once
//! tabs have been moved. It also owns display titles: automatic titles
//! synced from the active pane, and interactive renames which pin the label
//! until cleared.

use std::collections::HashMap;

use crate::session::SessionId;

const DEFAULT_TITLE: &str = "Shell";

#[derive(Debug, Default)]
struct TabEntry {
    auto_title: String,
    custom_title: Option<String>,
}

impl TabEntry {
    fn display(&self) -> &str {
        self.custom_title.as_deref().unwrap_or(&self.auto_title)
    }
}

/// Display order and titles for all live sessions.
///
/// Invariant: the ids held here are exactly the registry's live session ids,
/// reconciled on every add and remove.
#[derive(Debug, Default)]
pub struct TabOrder {
    order: Vec<SessionId>,
    entries: HashMap<SessionId, TabEntry>,
}

impl TabOrder {
    /// Create an empty tab order.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a session at the end of the order.
    ///
    /// Returns the assigned default title: the first unused "Shell" /
    /// "Shell No. N" among currently displayed titles.
    pub fn add_session(&mut self, id: SessionId) -> String {
        let title = self.next_default_title();
        self.order.push(id);
        self.entries.insert(
            id,
            TabEntry {
                auto_title: title.clone(),
                custom_title: None,
            },
        );
        title
    }

    fn next_default_title(&self) -> String {
        let displayed: Vec<&str> = self.entries.values().map(TabEntry::display).collect();
        if !displayed.contains(&DEFAULT_TITLE) {
            return DEFAULT_TITLE.to_string();
        }
        // Smallest N among *currently displayed* titles, not historical ones.
        let mut n = 2;
        loop {
            let candidate = format!("{DEFAULT_TITLE} No. {n}");
            if !displayed.iter().any(|t| **t == candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    /// Remove a session from the order.
    ///
    /// Returns true if this removal emptied the order (the caller raises the
    /// last-session-closed notification exactly then).
    pub fn remove_session(&mut self, id: SessionId) -> bool {
        let len_before = self.order.len();
        self.order.retain(|&s| s != id);
        self.entries.remove(&id);
        len_before > 0 && self.order.is_empty()
    }

    /// Swap a session with its left neighbor. No-op at the boundary.
    pub fn move_left(&mut self, id: SessionId) -> bool {
        match self.position(id) {
            Some(pos) if pos > 0 => {
                self.order.swap(pos, pos - 1);
                true
            }
            _ => false,
        }
    }

    /// Swap a session with its right neighbor. No-op at the boundary.
    pub fn move_right(&mut self, id: SessionId) -> bool {
        match self.position(id) {
            Some(pos) if pos + 1 < self.order.len() => {
                self.order.swap(pos, pos + 1);
                true
            }
            _ => false,
        }
    }

    /// Set a session's title.
    ///
    /// An interactive rename pins the label: automatic syncs are ignored for
    /// that session until an interactive empty title clears the pin and
    /// display falls back to the automatic title. Returns true if the
    /// displayed title changed.
    pub fn set_title(&mut self, id: SessionId, title: &str, interactive: bool) -> bool {
        let Some(entry) = self.entries.get_mut(&id) else {
            return false;
        };
        let before = entry.display().to_string();
        if interactive {
            entry.custom_title = if title.is_empty() {
                None
            } else {
                Some(title.to_string())
            };
        } else {
            entry.auto_title = title.to_string();
        }
        entry.display() != before
    }

    /// The displayed title for a session.
    #[must_use]
    pub fn display_title(&self, id: SessionId) -> Option<&str> {
        self.entries.get(&id).map(TabEntry::display)
    }

    /// The session ids in display order.
    #[must_use]
    pub fn order(&self) -> &[SessionId] {
        &self.order
    }

    /// Position of a session in the display order.
    #[must_use]
    pub fn position(&self, id: SessionId) -> Option<usize> {
        self.order.iter().position(|&s| s == id)
    }

    /// Whether a session is in the order.
    #[must_use]
    pub fn contains(&self, id: SessionId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Number of tabs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the order is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sid(n: u64) -> SessionId {
        SessionId(n)
    }

    #[test]
    fn default_titles_pick_the_smallest_unused_number() {
        let mut tabs = TabOrder::new();
        assert_eq!(tabs.add_session(sid(1)), "Shell");
        assert_eq!(tabs.add_session(sid(2)), "Shell No. 2");
        assert_eq!(tabs.add_session(sid(3)), "Shell No. 3");

        // Freed names are reused among *currently displayed* titles.
        tabs.remove_session(sid(2));
        assert_eq!(tabs.add_session(sid(4)), "Shell No. 2");

        tabs.remove_session(sid(1));
        assert_eq!(tabs.add_session(sid(5)), "Shell");
    }

    #[test]
    fn renamed_tabs_free_their_default_name() {
        let mut tabs = TabOrder::new();
        tabs.add_session(sid(1));
        tabs.set_title(sid(1), "build", true);
        assert_eq!(tabs.add_session(sid(2)), "Shell");
    }

    #[test]
    fn move_swaps_with_neighbor_and_stops_at_boundaries() {
        let mut tabs = TabOrder::new();
        tabs.add_session(sid(1));
        tabs.add_session(sid(2));
        tabs.add_session(sid(3));

        assert!(!tabs.move_left(sid(1)));
        assert!(!tabs.move_right(sid(3)));
        assert_eq!(tabs.order(), &[sid(1), sid(2), sid(3)]);

        assert!(tabs.move_right(sid(1)));
        assert_eq!(tabs.order(), &[sid(2), sid(1), sid(3)]);
        assert!(tabs.move_left(sid(3)));
        assert_eq!(tabs.order(), &[sid(2), sid(3), sid(1)]);

        assert!(!tabs.move_left(sid(99)));
    }

    #[test]
    fn interactive_rename_pins_over_automatic_sync() {
        let mut tabs = TabOrder::new();
        tabs.add_session(sid(1));

        assert!(tabs.set_title(sid(1), "vim", false));
        assert_eq!(tabs.display_title(sid(1)), Some("vim"));

        assert!(tabs.set_title(sid(1), "my tab", true));
        // Automatic syncs no longer change the display.
        assert!(!tabs.set_title(sid(1), "htop", false));
        assert_eq!(tabs.display_title(sid(1)), Some("my tab"));

        // An interactive empty title clears the pin; the latest automatic
        // title shows again.
        assert!(tabs.set_title(sid(1), "", true));
        assert_eq!(tabs.display_title(sid(1)), Some("htop"));
    }

    #[test]
    fn removal_reports_emptiness_once() {
        let mut tabs = TabOrder::new();
        tabs.add_session(sid(1));
        tabs.add_session(sid(2));

        assert!(!tabs.remove_session(sid(1)));
        assert!(tabs.remove_session(sid(2)));
        // Removing an already-absent id does not report empty again.
        assert!(!tabs.remove_session(sid(2)));
    }
}
