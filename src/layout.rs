//! The binary split tree arranging panes within a session.
//!
//! Containers hold up to two children along one axis; each child is either a
//! pane or another container. Children carry integer size spans in logical
//! pixels; the windowing collaborator turns spans into screen geometry via
//! [`SplitTree::areas`]. Parent links are plain ids into the arena, used only
//! for upward traversal during grow and cleanup, never for ownership.

use std::collections::HashMap;

use ratatui::layout::Rect;

use crate::pane::PaneId;

/// Minimum span a child may be clamped down to by grow redistribution,
/// in logical pixels.
pub const MIN_CHILD_SPAN: i32 = 50;

/// Span assigned to a session root's first child.
pub(crate) const FULL_SPAN: i32 = 1000;

/// Axis along which a container arranges its children.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
    /// Children are placed side by side, left to right.
    Row,
    /// Children are stacked, top to bottom.
    Column,
}

/// Direction of a grow request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GrowthDirection {
    /// Grow upward, taking space from the neighbor above.
    Up,
    /// Grow downward, taking space from the neighbor below.
    Down,
    /// Grow leftward, taking space from the neighbor to the left.
    Left,
    /// Grow rightward, taking space from the neighbor to the right.
    Right,
}

impl GrowthDirection {
    /// The container axis this direction operates on.
    #[must_use]
    pub fn axis(self) -> Orientation {
        match self {
            Self::Left | Self::Right => Orientation::Row,
            Self::Up | Self::Down => Orientation::Column,
        }
    }

    /// Whether the direction points toward later children.
    #[must_use]
    pub fn is_forward(self) -> bool {
        matches!(self, Self::Right | Self::Down)
    }
}

/// Identifier of a container within one session's tree.
///
/// Container ids are internal to a session and carry no external contract,
/// unlike pane and session ids.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub struct ContainerId(u32);

/// What a container child is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChildKind {
    /// A terminal-bearing leaf.
    Pane(PaneId),
    /// A nested container.
    Container(ContainerId),
}

#[derive(Clone, Copy, Debug)]
struct Child {
    kind: ChildKind,
    span: i32,
}

/// A binary container node.
#[derive(Debug)]
pub struct SplitContainer {
    orientation: Orientation,
    children: Vec<Child>,
    parent: Option<ContainerId>,
}

impl SplitContainer {
    fn new(orientation: Orientation, parent: Option<ContainerId>) -> Self {
        Self {
            orientation,
            children: Vec::with_capacity(2),
            parent,
        }
    }

    /// The container's axis.
    #[must_use]
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Number of children (0, 1, or 2 after any public operation).
    #[must_use]
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// The parent container, `None` for the session root.
    #[must_use]
    pub fn parent(&self) -> Option<ContainerId> {
        self.parent
    }

    /// The children in layout order.
    #[must_use]
    pub fn child_kinds(&self) -> Vec<ChildKind> {
        self.children.iter().map(|c| c.kind).collect()
    }

    /// The span of the child at `index`, in logical pixels.
    #[must_use]
    pub fn child_span(&self, index: usize) -> Option<i32> {
        self.children.get(index).map(|c| c.span)
    }

    fn index_of(&self, kind: ChildKind) -> Option<usize> {
        self.children.iter().position(|c| c.kind == kind)
    }
}

/// The split tree of one session: an arena of containers plus a root.
#[derive(Debug)]
pub struct SplitTree {
    containers: HashMap<ContainerId, SplitContainer>,
    root: ContainerId,
    next_container: u32,
}

impl SplitTree {
    /// Create a tree with an empty root container.
    #[must_use]
    pub fn new(orientation: Orientation) -> Self {
        let root = ContainerId(0);
        let mut containers = HashMap::new();
        containers.insert(root, SplitContainer::new(orientation, None));
        Self {
            containers,
            root,
            next_container: 1,
        }
    }

    /// The root container id.
    #[must_use]
    pub fn root(&self) -> ContainerId {
        self.root
    }

    /// Look up a container.
    #[must_use]
    pub fn container(&self, id: ContainerId) -> Option<&SplitContainer> {
        self.containers.get(&id)
    }

    /// The container directly holding `pane`.
    #[must_use]
    pub fn container_of(&self, pane: PaneId) -> Option<ContainerId> {
        self.containers
            .iter()
            .find(|(_, c)| c.index_of(ChildKind::Pane(pane)).is_some())
            .map(|(id, _)| *id)
    }

    /// Re-orient a container.
    ///
    /// Only legal while the container has at most one child; returns false
    /// (no effect) otherwise, since re-orienting a two-child layout would
    /// invalidate its spans.
    pub fn set_orientation(&mut self, id: ContainerId, orientation: Orientation) -> bool {
        match self.containers.get_mut(&id) {
            Some(c) if c.children.len() <= 1 => {
                c.orientation = orientation;
                true
            }
            _ => false,
        }
    }

    /// Add a pane child at `index` with the given span.
    pub(crate) fn add_pane(&mut self, id: ContainerId, index: usize, pane: PaneId, span: i32) {
        if let Some(c) = self.containers.get_mut(&id) {
            let index = index.min(c.children.len());
            c.children.insert(
                index,
                Child {
                    kind: ChildKind::Pane(pane),
                    span,
                },
            );
        }
    }

    /// Remove a pane from its container. Returns the container it was in.
    ///
    /// Does not clean up emptied containers; callers follow with
    /// [`SplitTree::recursive_cleanup`].
    pub(crate) fn remove_pane(&mut self, pane: PaneId) -> Option<ContainerId> {
        let id = self.container_of(pane)?;
        let c = self.containers.get_mut(&id)?;
        c.children.retain(|ch| ch.kind != ChildKind::Pane(pane));
        Some(id)
    }

    /// Split `pane` along `orientation`, placing `new_pane` next to it.
    ///
    /// If the pane is alone in its container, the container is re-oriented
    /// and the sibling added 50/50. Otherwise a new binary container is
    /// nested at the pane's position, preserving the sibling's span. Returns
    /// false (no effect) if the pane is not in the tree.
    pub(crate) fn split(
        &mut self,
        pane: PaneId,
        orientation: Orientation,
        new_pane: PaneId,
    ) -> bool {
        let Some(id) = self.container_of(pane) else {
            return false;
        };

        let child_count = self.containers[&id].children.len();
        if child_count == 1 {
            self.set_orientation(id, orientation);
            let c = self.containers.get_mut(&id).expect("container exists");
            let span = c.children[0].span;
            let half = span / 2;
            c.children[0].span = span - half;
            c.children.push(Child {
                kind: ChildKind::Pane(new_pane),
                span: half,
            });
        } else {
            // Nest a new container at the pane's position so containers stay
            // binary and the sibling keeps its span.
            let nested = ContainerId(self.next_container);
            self.next_container += 1;
            self.containers
                .insert(nested, SplitContainer::new(orientation, Some(id)));

            let c = self.containers.get_mut(&id).expect("container exists");
            let index = c
                .index_of(ChildKind::Pane(pane))
                .expect("pane is a child of its container");
            c.children[index].kind = ChildKind::Container(nested);

            let nested_c = self.containers.get_mut(&nested).expect("just inserted");
            nested_c.children.push(Child {
                kind: ChildKind::Pane(pane),
                span: FULL_SPAN - FULL_SPAN / 2,
            });
            nested_c.children.push(Child {
                kind: ChildKind::Pane(new_pane),
                span: FULL_SPAN / 2,
            });
        }
        true
    }

    /// Remove empty non-root containers, depth first and bottom up.
    ///
    /// Safe to invoke any number of times; a pass over an already-clean tree
    /// changes nothing.
    pub fn recursive_cleanup(&mut self) {
        let root = self.root;
        self.cleanup_container(root);
    }

    fn cleanup_container(&mut self, id: ContainerId) -> bool {
        let nested: Vec<ContainerId> = self
            .containers
            .get(&id)
            .map(|c| {
                c.children
                    .iter()
                    .filter_map(|ch| match ch.kind {
                        ChildKind::Container(cid) => Some(cid),
                        ChildKind::Pane(_) => None,
                    })
                    .collect()
            })
            .unwrap_or_default();

        for cid in nested {
            if self.cleanup_container(cid) {
                self.containers.remove(&cid);
                if let Some(c) = self.containers.get_mut(&id) {
                    c.children.retain(|ch| ch.kind != ChildKind::Container(cid));
                }
            }
        }

        self.containers
            .get(&id)
            .is_none_or(|c| c.children.is_empty())
    }

    /// All pane ids in stable traversal order (depth first, insertion order
    /// within each container).
    #[must_use]
    pub fn pane_ids(&self) -> Vec<PaneId> {
        let mut ids = Vec::new();
        self.collect_pane_ids(self.root, &mut ids);
        ids
    }

    fn collect_pane_ids(&self, id: ContainerId, ids: &mut Vec<PaneId>) {
        let Some(c) = self.containers.get(&id) else {
            return;
        };
        for child in &c.children {
            match child.kind {
                ChildKind::Pane(pane) => ids.push(pane),
                ChildKind::Container(cid) => self.collect_pane_ids(cid, ids),
            }
        }
    }

    /// Grow the subtree holding `pane` toward `direction` by up to `px`
    /// logical pixels, redistributing span from the neighbor on that side.
    ///
    /// Climbs from the pane's container toward the root; the first level
    /// whose orientation matches the direction's axis and where the carrying
    /// child has a neighbor in the requested direction takes the transfer,
    /// clamped so the neighbor keeps at least [`MIN_CHILD_SPAN`]. Returns the
    /// delta actually applied, or `None` if no ancestor level qualifies.
    pub(crate) fn try_grow(
        &mut self,
        pane: PaneId,
        direction: GrowthDirection,
        px: i32,
    ) -> Option<i32> {
        let mut kind = ChildKind::Pane(pane);
        let mut current = self.container_of(pane)?;

        loop {
            let c = self.containers.get(&current)?;
            if c.orientation == direction.axis() {
                if let Some(index) = c.index_of(kind) {
                    let neighbor = if direction.is_forward() {
                        index + 1
                    } else {
                        index.wrapping_sub(1)
                    };
                    if neighbor < c.children.len() {
                        let available = (c.children[neighbor].span - MIN_CHILD_SPAN).max(0);
                        let applied = px.clamp(0, available);
                        let c = self.containers.get_mut(&current).expect("container exists");
                        c.children[neighbor].span -= applied;
                        c.children[index].span += applied;
                        return Some(applied);
                    }
                }
            }
            kind = ChildKind::Container(current);
            current = self.containers.get(&current)?.parent?;
        }
    }

    /// Compute screen areas for every pane, subdividing `area` by spans.
    #[must_use]
    pub fn areas(&self, area: Rect) -> HashMap<PaneId, Rect> {
        let mut areas = HashMap::new();
        self.areas_recursive(self.root, area, &mut areas);
        areas
    }

    fn areas_recursive(&self, id: ContainerId, area: Rect, areas: &mut HashMap<PaneId, Rect>) {
        let Some(c) = self.containers.get(&id) else {
            return;
        };
        if c.children.is_empty() {
            return;
        }

        let spans: Vec<i32> = c.children.iter().map(|ch| ch.span).collect();
        let total = match c.orientation {
            Orientation::Row => area.width,
            Orientation::Column => area.height,
        };
        let slices = divide(total, &spans);

        let mut offset = 0u16;
        for (child, slice) in c.children.iter().zip(slices) {
            let child_area = match c.orientation {
                Orientation::Row => Rect {
                    x: area.x.saturating_add(offset),
                    y: area.y,
                    width: slice,
                    height: area.height,
                },
                Orientation::Column => Rect {
                    x: area.x,
                    y: area.y.saturating_add(offset),
                    width: area.width,
                    height: slice,
                },
            };
            offset = offset.saturating_add(slice);

            match child.kind {
                ChildKind::Pane(pane) => {
                    areas.insert(pane, child_area);
                }
                ChildKind::Container(cid) => self.areas_recursive(cid, child_area, areas),
            }
        }
    }
}

/// Divide `total` proportionally to `spans`, giving rounding remainder to
/// the last slice.
fn divide(total: u16, spans: &[i32]) -> Vec<u16> {
    let sum: i64 = spans.iter().map(|&s| i64::from(s.max(0))).sum();
    if sum == 0 {
        return vec![0; spans.len()];
    }

    let mut slices = Vec::with_capacity(spans.len());
    let mut used = 0u16;
    for (i, &span) in spans.iter().enumerate() {
        let slice = if i + 1 == spans.len() {
            total.saturating_sub(used)
        } else {
            let exact = i64::from(total) * i64::from(span.max(0)) / sum;
            u16::try_from(exact).unwrap_or(0)
        };
        used = used.saturating_add(slice);
        slices.push(slice);
    }
    slices
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pane(n: u64) -> PaneId {
        PaneId(n)
    }

    fn tree_with_one_pane() -> SplitTree {
        let mut tree = SplitTree::new(Orientation::Row);
        tree.add_pane(tree.root(), 0, pane(1), FULL_SPAN);
        tree
    }

    #[test]
    fn split_lone_pane_reorients_container() {
        let mut tree = tree_with_one_pane();

        assert!(tree.split(pane(1), Orientation::Column, pane(2)));

        let root = tree.container(tree.root()).unwrap();
        assert_eq!(root.orientation(), Orientation::Column);
        assert_eq!(root.child_count(), 2);
        assert_eq!(root.child_span(0), Some(FULL_SPAN - FULL_SPAN / 2));
        assert_eq!(root.child_span(1), Some(FULL_SPAN / 2));
        assert_eq!(tree.pane_ids(), vec![pane(1), pane(2)]);
    }

    #[test]
    fn split_in_full_container_nests() {
        let mut tree = tree_with_one_pane();
        tree.split(pane(1), Orientation::Row, pane(2));

        assert!(tree.split(pane(1), Orientation::Column, pane(3)));

        let root = tree.container(tree.root()).unwrap();
        assert_eq!(root.child_count(), 2);
        // The sibling's span at the root is untouched.
        assert_eq!(root.child_span(1), Some(FULL_SPAN / 2));

        let ChildKind::Container(nested) = root.child_kinds()[0] else {
            panic!("first child should be a nested container");
        };
        let nested = tree.container(nested).unwrap();
        assert_eq!(nested.orientation(), Orientation::Column);
        assert_eq!(nested.child_kinds(), vec![
            ChildKind::Pane(pane(1)),
            ChildKind::Pane(pane(3)),
        ]);
        assert_eq!(tree.pane_ids(), vec![pane(1), pane(3), pane(2)]);
    }

    #[test]
    fn set_orientation_refused_with_two_children() {
        let mut tree = tree_with_one_pane();
        assert!(tree.set_orientation(tree.root(), Orientation::Column));

        tree.split(pane(1), Orientation::Column, pane(2));
        assert!(!tree.set_orientation(tree.root(), Orientation::Row));
        assert_eq!(
            tree.container(tree.root()).unwrap().orientation(),
            Orientation::Column
        );
    }

    #[test]
    fn cleanup_removes_emptied_nested_containers() {
        let mut tree = tree_with_one_pane();
        tree.split(pane(1), Orientation::Row, pane(2));
        tree.split(pane(2), Orientation::Column, pane(3));

        tree.remove_pane(pane(2));
        tree.remove_pane(pane(3));
        tree.recursive_cleanup();

        let root = tree.container(tree.root()).unwrap();
        assert_eq!(root.child_count(), 1);
        assert_eq!(root.child_kinds(), vec![ChildKind::Pane(pane(1))]);

        // Cleanup is idempotent.
        tree.recursive_cleanup();
        assert_eq!(tree.container(tree.root()).unwrap().child_count(), 1);
    }

    #[test]
    fn cleanup_never_removes_the_root() {
        let mut tree = tree_with_one_pane();
        tree.remove_pane(pane(1));
        tree.recursive_cleanup();
        assert!(tree.container(tree.root()).is_some());
        assert_eq!(tree.container(tree.root()).unwrap().child_count(), 0);
    }

    #[test]
    fn grow_transfers_span_from_neighbor() {
        let mut tree = tree_with_one_pane();
        tree.split(pane(1), Orientation::Row, pane(2));

        assert_eq!(tree.try_grow(pane(1), GrowthDirection::Right, 100), Some(100));

        let root = tree.container(tree.root()).unwrap();
        assert_eq!(root.child_span(0), Some(600));
        assert_eq!(root.child_span(1), Some(400));

        // The sibling growing back across the same boundary restores 50/50.
        assert_eq!(tree.try_grow(pane(2), GrowthDirection::Left, 100), Some(100));
        let root = tree.container(tree.root()).unwrap();
        assert_eq!(root.child_span(0), Some(500));
        assert_eq!(root.child_span(1), Some(500));
    }

    #[test]
    fn grow_clamps_at_minimum_span() {
        let mut tree = tree_with_one_pane();
        tree.split(pane(1), Orientation::Row, pane(2));

        let applied = tree.try_grow(pane(1), GrowthDirection::Right, 10_000).unwrap();
        assert_eq!(applied, FULL_SPAN / 2 - MIN_CHILD_SPAN);
        let root = tree.container(tree.root()).unwrap();
        assert_eq!(root.child_span(1), Some(MIN_CHILD_SPAN));

        // Nothing left to take.
        assert_eq!(tree.try_grow(pane(1), GrowthDirection::Right, 10), Some(0));
    }

    #[test]
    fn grow_without_neighbor_fails_at_every_level() {
        let mut tree = tree_with_one_pane();
        tree.split(pane(1), Orientation::Row, pane(2));

        // Last pane in the row has no neighbor to its right anywhere.
        assert_eq!(tree.try_grow(pane(2), GrowthDirection::Right, 10), None);
        // And no vertical ancestor exists at all.
        assert_eq!(tree.try_grow(pane(1), GrowthDirection::Down, 10), None);
    }

    #[test]
    fn grow_climbs_to_matching_ancestor() {
        // Root Column of [Row(1, 2), 3]; growing pane 1 downward must act at
        // the root level, carrying its whole row subtree.
        let mut tree = tree_with_one_pane();
        tree.split(pane(1), Orientation::Column, pane(3));
        tree.split(pane(1), Orientation::Row, pane(2));

        assert_eq!(tree.try_grow(pane(1), GrowthDirection::Down, 50), Some(50));
        let root = tree.container(tree.root()).unwrap();
        assert_eq!(root.child_span(0), Some(550));
        assert_eq!(root.child_span(1), Some(450));
    }

    #[test]
    fn areas_follow_spans() {
        let mut tree = tree_with_one_pane();
        tree.split(pane(1), Orientation::Row, pane(2));
        tree.try_grow(pane(1), GrowthDirection::Right, 250);

        let areas = tree.areas(Rect::new(0, 0, 100, 40));
        assert_eq!(areas[&pane(1)], Rect::new(0, 0, 75, 40));
        assert_eq!(areas[&pane(2)], Rect::new(75, 0, 25, 40));
    }

    #[test]
    fn areas_of_single_pane_fill_the_area() {
        let tree = tree_with_one_pane();
        let area = Rect::new(2, 3, 80, 24);
        assert_eq!(tree.areas(area)[&pane(1)], area);
    }
}
