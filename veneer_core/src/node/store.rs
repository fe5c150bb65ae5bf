// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays node storage with allocation, topology, and deferred
//! property management.

use alloc::boxed::Box;
use alloc::vec::Vec;

use kurbo::Rect;

use crate::dirty::{DirtyProps, Property, StructuralOp};
use crate::scheduler::{NoopBridge, SchedulerBridge};
use crate::surface::HostSurface;

use super::id::{ElementId, INVALID, NodeId};
use super::traverse::Children;

/// Struct-of-arrays storage for all layout nodes.
///
/// Nodes are addressed by [`NodeId`] handles. Internally, each node occupies
/// a slot in parallel arrays. Destroyed nodes are recycled via a free list,
/// and generation counters prevent stale handle access.
///
/// Every mutation is deferred: setters record the new value and mark the
/// node dirty, and the host surface sees the final values at the next
/// [`flush`](Self::flush). The tree-wide dirty registry arms the
/// [`SchedulerBridge`] when it first becomes non-empty and disarms it when
/// it empties.
pub struct LayoutTree {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) children: Vec<Vec<u32>>,

    // -- Deferred properties (set by callers, committed by flush) --
    pub(crate) x: Vec<f64>,
    pub(crate) y: Vec<f64>,
    pub(crate) width: Vec<f64>,
    pub(crate) height: Vec<f64>,
    pub(crate) visible: Vec<bool>,

    // -- Host binding --
    pub(crate) element: Vec<ElementId>,

    // -- Per-node dirty state --
    pub(crate) dirty_props: Vec<DirtyProps>,
    pub(crate) pending_op: Vec<StructuralOp>,
    pub(crate) needs_layout_flag: Vec<bool>,
    pub(crate) tracked: Vec<bool>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,

    // -- Dirty registry (flush input, insertion order) --
    pub(crate) dirty: Vec<u32>,

    // -- Child-order reconciliation (see flush.rs) --
    pub(crate) awaiting_children_update: Vec<bool>,
    pub(crate) needs_children_update: Vec<u32>,

    // -- Scheduling --
    pub(crate) bridge: Box<dyn SchedulerBridge>,
}

impl core::fmt::Debug for LayoutTree {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LayoutTree")
            .field("node_count", &self.node_count())
            .field("dirty_count", &self.dirty.len())
            .finish_non_exhaustive()
    }
}

impl Default for LayoutTree {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutTree {
    // -- Construction --

    /// Creates an empty tree with a [`NoopBridge`].
    ///
    /// Use this for manually driven trees: poll
    /// [`has_pending_flush`](Self::has_pending_flush) and call
    /// [`flush`](Self::flush) from the embedder's update cycle.
    #[must_use]
    pub fn new() -> Self {
        Self::with_bridge(Box::new(NoopBridge))
    }

    /// Creates an empty tree that arms `bridge` on dirty-registry transitions.
    #[must_use]
    pub fn with_bridge(bridge: Box<dyn SchedulerBridge>) -> Self {
        Self {
            parent: Vec::new(),
            children: Vec::new(),
            x: Vec::new(),
            y: Vec::new(),
            width: Vec::new(),
            height: Vec::new(),
            visible: Vec::new(),
            element: Vec::new(),
            dirty_props: Vec::new(),
            pending_op: Vec::new(),
            needs_layout_flag: Vec::new(),
            tracked: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            dirty: Vec::new(),
            awaiting_children_update: Vec::new(),
            needs_children_update: Vec::new(),
            bridge,
        }
    }

    // -- Allocation API --

    /// Creates a new node backed by a fresh host element.
    ///
    /// The node starts at zero geometry, visible, with no parent and nothing
    /// pending. Its element stays detached until a flush commits an addition.
    pub fn create_node(&mut self, surface: &mut dyn HostSurface) -> NodeId {
        let element = surface.create_element();
        self.allocate(element)
    }

    /// Creates a new node whose host element is built from a markup fragment.
    pub fn create_node_from_markup(
        &mut self,
        surface: &mut dyn HostSurface,
        markup: &str,
    ) -> NodeId {
        let element = surface.create_element_from_markup(markup);
        self.allocate(element)
    }

    /// Creates a new node that wraps an externally created host element.
    pub fn create_node_for_element(&mut self, element: ElementId) -> NodeId {
        self.allocate(element)
    }

    /// Destroys a node, freeing its slot for reuse.
    ///
    /// The node is unlinked from its parent, dropped from the dirty registry,
    /// and its host element is detached immediately; destruction does not
    /// wait for a flush.
    ///
    /// # Panics
    ///
    /// Panics if the node has children (remove them first) or if the handle
    /// is stale.
    pub fn destroy_node(&mut self, id: NodeId, surface: &mut dyn HostSurface) {
        self.validate(id);
        let idx = id.idx;
        assert!(
            self.children[idx as usize].is_empty(),
            "cannot destroy node with children"
        );

        // Unlink from the parent's child list. The node is about to
        // disappear, so no removal op is recorded for it.
        let p = self.parent[idx as usize];
        if p != INVALID {
            if let Some(pos) = self.position_of(p, idx) {
                self.children[p as usize].remove(pos);
            }
            self.parent[idx as usize] = INVALID;
        }

        // Drop the node from the registry before the slot is recycled, so
        // the next flush never sees it.
        if self.tracked[idx as usize] {
            self.untrack(idx);
        }
        if self.awaiting_children_update[idx as usize] {
            self.awaiting_children_update[idx as usize] = false;
            if let Some(pos) = self.needs_children_update.iter().position(|&k| k == idx) {
                self.needs_children_update.remove(pos);
            }
        }

        surface.remove_from_parent(self.element[idx as usize]);

        // Bump generation so old handles immediately fail validation.
        self.generation[idx as usize] += 1;
        self.free_list.push(idx);
    }

    /// Returns whether the given handle refers to a live node.
    #[must_use]
    pub fn is_alive(&self, id: NodeId) -> bool {
        (id.idx < self.len)
            && self.generation[id.idx as usize] == id.generation
            && !self.free_list.contains(&id.idx)
    }

    /// Returns the number of live nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.len as usize - self.free_list.len()
    }

    /// Returns whether the tree has no live nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.node_count() == 0
    }

    // -- Topology API --

    /// Adds `child` as the last child of `parent`, returning `child`.
    ///
    /// If `child` already has a parent (including `parent` itself), it is
    /// removed from that parent first; adding is always a move, never a
    /// duplication. The move is recorded as a pending addition, committed at
    /// the next flush.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> NodeId {
        self.add_child_at(parent, child, usize::MAX)
    }

    /// Adds `child` at `index` in `parent`'s child list, returning `child`.
    ///
    /// `index` counts positions in the child list before `child` is detached
    /// from its current parent; out-of-range indices append.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale.
    pub fn add_child_at(&mut self, parent: NodeId, child: NodeId, index: usize) -> NodeId {
        self.validate(parent);
        self.validate(child);
        self.attach_child_at(parent.idx, child.idx, index);
        child
    }

    /// Inserts `child` immediately before `reference` in `parent`'s child
    /// list, returning `child`.
    ///
    /// When `reference` is not a child of `parent`, `child` is appended.
    ///
    /// # Panics
    ///
    /// Panics if any handle is stale.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: NodeId) -> NodeId {
        self.validate(parent);
        self.validate(child);
        self.validate(reference);
        let index = self
            .position_of(parent.idx, reference.idx)
            .unwrap_or(usize::MAX);
        self.attach_child_at(parent.idx, child.idx, index);
        child
    }

    /// Inserts `child` immediately after `reference` in `parent`'s child
    /// list, returning `child`.
    ///
    /// When `reference` is not a child of `parent`, `child` is inserted at
    /// the front.
    ///
    /// # Panics
    ///
    /// Panics if any handle is stale.
    pub fn insert_after(&mut self, parent: NodeId, child: NodeId, reference: NodeId) -> NodeId {
        self.validate(parent);
        self.validate(child);
        self.validate(reference);
        let index = match self.position_of(parent.idx, reference.idx) {
            Some(pos) => pos + 1,
            None => 0,
        };
        self.attach_child_at(parent.idx, child.idx, index);
        child
    }

    /// Removes `child` from `parent`, recording a pending removal.
    ///
    /// Returns `child` when it was actually removed, or `None` when it was
    /// not a child of `parent` (the call is then a no-op).
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Option<NodeId> {
        self.validate(parent);
        self.validate(child);
        let p = parent.idx;
        let c = child.idx;
        if self.parent[c as usize] != p {
            return None;
        }
        let pos = self.position_of(p, c)?;
        self.children[p as usize].remove(pos);
        self.parent[c as usize] = INVALID;
        self.pending_op[c as usize] = StructuralOp::Removal;
        self.update_dirty_state(c);
        Some(child)
    }

    /// Removes `child` from its current parent, if it has one.
    ///
    /// Returns `child` when it was removed, or `None` when it had no parent.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn remove_from_parent(&mut self, child: NodeId) -> Option<NodeId> {
        self.validate(child);
        let p = self.parent[child.idx as usize];
        if p == INVALID {
            return None;
        }
        let parent = NodeId {
            idx: p,
            generation: self.generation[p as usize],
        };
        self.remove_child(parent, child)
    }

    /// Replaces `parent`'s children with `new_children`, in order.
    ///
    /// Every current child is removed (each recording a pending removal),
    /// then each entry of `new_children` is appended with move semantics.
    ///
    /// # Panics
    ///
    /// Panics if any handle is stale.
    pub fn set_children(&mut self, parent: NodeId, new_children: &[NodeId]) {
        self.validate(parent);
        for &child in new_children {
            self.validate(child);
        }
        let p = parent.idx;
        while let Some(&first) = self.children[p as usize].first() {
            self.children[p as usize].remove(0);
            self.parent[first as usize] = INVALID;
            self.pending_op[first as usize] = StructuralOp::Removal;
            self.update_dirty_state(first);
        }
        for &child in new_children {
            self.attach_child_at(p, child.idx, usize::MAX);
        }
    }

    /// Returns the parent of a node, if any.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.validate(id);
        let p = self.parent[id.idx as usize];
        if p == INVALID {
            None
        } else {
            Some(NodeId {
                idx: p,
                generation: self.generation[p as usize],
            })
        }
    }

    /// Returns an iterator over the direct children of a node, in order.
    #[must_use]
    pub fn children(&self, id: NodeId) -> Children<'_> {
        self.validate(id);
        Children::new(&self.children[id.idx as usize], &self.generation)
    }

    /// Returns the number of direct children of a node.
    #[must_use]
    pub fn child_count(&self, id: NodeId) -> usize {
        self.validate(id);
        self.children[id.idx as usize].len()
    }

    // -- Property getters (read-only, no dirty marking) --

    /// Returns the horizontal offset of a node.
    #[must_use]
    pub fn x(&self, id: NodeId) -> f64 {
        self.validate(id);
        self.x[id.idx as usize]
    }

    /// Returns the vertical offset of a node.
    #[must_use]
    pub fn y(&self, id: NodeId) -> f64 {
        self.validate(id);
        self.y[id.idx as usize]
    }

    /// Returns the width of a node.
    #[must_use]
    pub fn width(&self, id: NodeId) -> f64 {
        self.validate(id);
        self.width[id.idx as usize]
    }

    /// Returns the height of a node.
    #[must_use]
    pub fn height(&self, id: NodeId) -> f64 {
        self.validate(id);
        self.height[id.idx as usize]
    }

    /// Returns whether a node is visible.
    #[must_use]
    pub fn visible(&self, id: NodeId) -> bool {
        self.validate(id);
        self.visible[id.idx as usize]
    }

    /// Returns the node's geometry as a rectangle.
    #[must_use]
    pub fn frame(&self, id: NodeId) -> Rect {
        self.validate(id);
        let idx = id.idx as usize;
        Rect::new(
            self.x[idx],
            self.y[idx],
            self.x[idx] + self.width[idx],
            self.y[idx] + self.height[idx],
        )
    }

    /// Returns the host element backing a node.
    #[must_use]
    pub fn element(&self, id: NodeId) -> ElementId {
        self.validate(id);
        self.element[id.idx as usize]
    }

    /// Returns the properties pending commit for a node (for diagnostics).
    #[must_use]
    pub fn dirty_properties(&self, id: NodeId) -> DirtyProps {
        self.validate(id);
        self.dirty_props[id.idx as usize]
    }

    /// Returns the structural op pending for a node (for diagnostics).
    #[must_use]
    pub fn pending_structural_op(&self, id: NodeId) -> StructuralOp {
        self.validate(id);
        self.pending_op[id.idx as usize]
    }

    // -- Mutation API (marks dirty) --

    /// Sets the horizontal offset of a node.
    ///
    /// Setting the current value is a no-op and marks nothing.
    pub fn set_x(&mut self, id: NodeId, x: f64) {
        self.validate(id);
        if self.x[id.idx as usize] == x {
            return;
        }
        self.x[id.idx as usize] = x;
        self.mark_property_dirty_at(id.idx, Property::X);
    }

    /// Sets the vertical offset of a node.
    ///
    /// Setting the current value is a no-op and marks nothing.
    pub fn set_y(&mut self, id: NodeId, y: f64) {
        self.validate(id);
        if self.y[id.idx as usize] == y {
            return;
        }
        self.y[id.idx as usize] = y;
        self.mark_property_dirty_at(id.idx, Property::Y);
    }

    /// Sets the width of a node.
    ///
    /// Setting the current value is a no-op and marks nothing.
    pub fn set_width(&mut self, id: NodeId, width: f64) {
        self.validate(id);
        if self.width[id.idx as usize] == width {
            return;
        }
        self.width[id.idx as usize] = width;
        self.mark_property_dirty_at(id.idx, Property::Width);
    }

    /// Sets the height of a node.
    ///
    /// Setting the current value is a no-op and marks nothing.
    pub fn set_height(&mut self, id: NodeId, height: f64) {
        self.validate(id);
        if self.height[id.idx as usize] == height {
            return;
        }
        self.height[id.idx as usize] = height;
        self.mark_property_dirty_at(id.idx, Property::Height);
    }

    /// Shows or hides a node.
    ///
    /// Setting the current value is a no-op and marks nothing.
    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        self.validate(id);
        if self.visible[id.idx as usize] == visible {
            return;
        }
        self.visible[id.idx as usize] = visible;
        self.mark_property_dirty_at(id.idx, Property::Visible);
    }

    /// Sets the node's geometry from a rectangle.
    ///
    /// Routes through the scalar setters, so only the components that
    /// actually changed are marked.
    pub fn set_frame(&mut self, id: NodeId, frame: Rect) {
        self.set_x(id, frame.x0);
        self.set_y(id, frame.y0);
        self.set_width(id, frame.width());
        self.set_height(id, frame.height());
    }

    /// Records that `property`'s current value must be committed at the next
    /// flush, even if no setter changed it.
    ///
    /// Marking an already pending property is a no-op.
    pub fn mark_property_dirty(&mut self, id: NodeId, property: Property) {
        self.validate(id);
        self.mark_property_dirty_at(id.idx, property);
    }

    // -- Dirty-tracking API --

    /// Returns whether a node has anything pending for the next flush.
    ///
    /// This is derived state: the node's explicit needs-layout flag, a
    /// pending structural op, or any pending property all make it `true`.
    #[must_use]
    pub fn needs_layout(&self, id: NodeId) -> bool {
        self.validate(id);
        self.derived_needs_layout(id.idx)
    }

    /// Sets the node's explicit needs-layout flag.
    ///
    /// When the derived [`needs_layout`](Self::needs_layout) already equals
    /// `needs_layout`, the call is a no-op and the stored flag is left
    /// untouched.
    pub fn set_needs_layout(&mut self, id: NodeId, needs_layout: bool) {
        self.validate(id);
        if self.derived_needs_layout(id.idx) == needs_layout {
            return;
        }
        self.needs_layout_flag[id.idx as usize] = needs_layout;
        self.update_dirty_state(id.idx);
    }

    /// Returns whether any node is waiting for a flush.
    #[must_use]
    pub fn has_pending_flush(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Returns the number of nodes in the dirty registry.
    #[must_use]
    pub fn dirty_count(&self) -> usize {
        self.dirty.len()
    }

    // -- Internal helpers --

    /// Panics if the handle is stale.
    pub(crate) fn validate(&self, id: NodeId) {
        assert!(
            id.idx < self.len && self.generation[id.idx as usize] == id.generation,
            "stale NodeId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    /// Allocates a slot (reusing a freed one if available) and returns the
    /// new handle. The node starts clean: nothing is marked dirty.
    fn allocate(&mut self, element: ElementId) -> NodeId {
        let idx = if let Some(idx) = self.free_list.pop() {
            // Reuse a freed slot.
            self.generation[idx as usize] += 1;
            self.parent[idx as usize] = INVALID;
            self.children[idx as usize].clear();
            self.x[idx as usize] = 0.0;
            self.y[idx as usize] = 0.0;
            self.width[idx as usize] = 0.0;
            self.height[idx as usize] = 0.0;
            self.visible[idx as usize] = true;
            self.element[idx as usize] = element;
            self.dirty_props[idx as usize] = DirtyProps::empty();
            self.pending_op[idx as usize] = StructuralOp::None;
            self.needs_layout_flag[idx as usize] = false;
            self.tracked[idx as usize] = false;
            self.awaiting_children_update[idx as usize] = false;
            idx
        } else {
            // Allocate a new slot.
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.children.push(Vec::new());
            self.x.push(0.0);
            self.y.push(0.0);
            self.width.push(0.0);
            self.height.push(0.0);
            self.visible.push(true);
            self.element.push(element);
            self.dirty_props.push(DirtyProps::empty());
            self.pending_op.push(StructuralOp::None);
            self.needs_layout_flag.push(false);
            self.tracked.push(false);
            self.awaiting_children_update.push(false);
            self.generation.push(0);
            idx
        };

        NodeId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Returns `c`'s position in `p`'s child list, if present.
    fn position_of(&self, p: u32, c: u32) -> Option<usize> {
        self.children[p as usize].iter().position(|&k| k == c)
    }

    /// Detaches `c` from its current parent (recording a pending removal),
    /// then links it into `p`'s child list at `index` (clamped to the list
    /// length) with a pending addition.
    fn attach_child_at(&mut self, p: u32, c: u32, index: usize) {
        self.detach_if_parented(c);
        let kids = &mut self.children[p as usize];
        let index = index.min(kids.len());
        kids.insert(index, c);
        self.parent[c as usize] = p;
        self.pending_op[c as usize] = StructuralOp::Addition;
        self.update_dirty_state(c);
    }

    /// Unlinks `c` from its parent with removal semantics, if it has one.
    fn detach_if_parented(&mut self, c: u32) {
        let p = self.parent[c as usize];
        if p == INVALID {
            return;
        }
        if let Some(pos) = self.position_of(p, c) {
            self.children[p as usize].remove(pos);
        }
        self.parent[c as usize] = INVALID;
        self.pending_op[c as usize] = StructuralOp::Removal;
        self.update_dirty_state(c);
    }

    /// Records that `property` is pending for slot `idx`.
    fn mark_property_dirty_at(&mut self, idx: u32, property: Property) {
        let flag = property.flag();
        if self.dirty_props[idx as usize].contains(flag) {
            return;
        }
        self.dirty_props[idx as usize] |= flag;
        self.update_dirty_state(idx);
    }

    /// Derived needs-layout for slot `idx`: the explicit flag, a pending
    /// structural op, or any pending property.
    pub(crate) fn derived_needs_layout(&self, idx: u32) -> bool {
        self.needs_layout_flag[idx as usize]
            || self.pending_op[idx as usize] != StructuralOp::None
            || !self.dirty_props[idx as usize].is_empty()
    }

    /// Reconciles slot `idx`'s registry membership with its derived state,
    /// arming or disarming the bridge on true registry transitions.
    fn update_dirty_state(&mut self, idx: u32) {
        if self.derived_needs_layout(idx) {
            if !self.tracked[idx as usize] {
                self.track(idx);
            }
        } else if self.tracked[idx as usize] {
            self.untrack(idx);
        }
    }

    /// Appends slot `idx` to the registry; arms the bridge on empty→non-empty.
    fn track(&mut self, idx: u32) {
        self.tracked[idx as usize] = true;
        let was_empty = self.dirty.is_empty();
        self.dirty.push(idx);
        if was_empty {
            self.bridge.schedule_flush();
        }
    }

    /// Removes slot `idx` from the registry; disarms the bridge on
    /// non-empty→empty.
    fn untrack(&mut self, idx: u32) {
        self.tracked[idx as usize] = false;
        if let Some(pos) = self.dirty.iter().position(|&k| k == idx) {
            self.dirty.remove(pos);
        }
        if self.dirty.is_empty() {
            self.bridge.unschedule_flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::rc::Rc;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::cell::Cell;

    use super::*;

    /// Surface that hands out sequential elements and records detaches.
    #[derive(Default)]
    struct TestSurface {
        next: u32,
        detached: Vec<ElementId>,
    }

    impl HostSurface for TestSurface {
        fn create_element(&mut self) -> ElementId {
            let element = ElementId(self.next);
            self.next += 1;
            element
        }

        fn create_element_from_markup(&mut self, _markup: &str) -> ElementId {
            self.create_element()
        }

        fn set_offset_left(&mut self, _element: ElementId, _value: f64) {}

        fn set_offset_top(&mut self, _element: ElementId, _value: f64) {}

        fn set_width(&mut self, _element: ElementId, _value: f64) {}

        fn set_height(&mut self, _element: ElementId, _value: f64) {}

        fn set_display(&mut self, _element: ElementId, _state: crate::dirty::DisplayState) {}

        fn insert_before(
            &mut self,
            _parent: ElementId,
            _child: ElementId,
            _reference: Option<ElementId>,
        ) {
        }

        fn remove_from_parent(&mut self, element: ElementId) {
            self.detached.push(element);
        }
    }

    struct CountingBridge {
        schedules: Rc<Cell<u32>>,
        unschedules: Rc<Cell<u32>>,
    }

    impl SchedulerBridge for CountingBridge {
        fn schedule_flush(&mut self) {
            self.schedules.set(self.schedules.get() + 1);
        }

        fn unschedule_flush(&mut self) {
            self.unschedules.set(self.unschedules.get() + 1);
        }
    }

    fn counting_tree() -> (LayoutTree, Rc<Cell<u32>>, Rc<Cell<u32>>) {
        let schedules = Rc::new(Cell::new(0));
        let unschedules = Rc::new(Cell::new(0));
        let tree = LayoutTree::with_bridge(Box::new(CountingBridge {
            schedules: Rc::clone(&schedules),
            unschedules: Rc::clone(&unschedules),
        }));
        (tree, schedules, unschedules)
    }

    fn node(tree: &mut LayoutTree) -> NodeId {
        tree.create_node_for_element(ElementId(0))
    }

    #[test]
    fn create_and_destroy() {
        let mut surface = TestSurface::default();
        let mut tree = LayoutTree::new();
        let id = tree.create_node(&mut surface);
        assert!(tree.is_alive(id));
        tree.destroy_node(id, &mut surface);
        assert!(!tree.is_alive(id));
        assert_eq!(tree.node_count(), 0);
    }

    #[test]
    fn generation_prevents_stale_access() {
        let mut surface = TestSurface::default();
        let mut tree = LayoutTree::new();
        let id1 = tree.create_node(&mut surface);
        tree.destroy_node(id1, &mut surface);
        let id2 = tree.create_node(&mut surface);
        // id2 reuses the same slot but has a different generation.
        assert!(!tree.is_alive(id1));
        assert!(tree.is_alive(id2));
        assert_eq!(id1.idx, id2.idx);
        assert_ne!(id1.generation, id2.generation);
    }

    #[test]
    fn new_node_is_clean_and_default() {
        let (mut tree, schedules, _) = counting_tree();
        let id = node(&mut tree);
        assert_eq!(tree.x(id), 0.0);
        assert_eq!(tree.y(id), 0.0);
        assert_eq!(tree.width(id), 0.0);
        assert_eq!(tree.height(id), 0.0);
        assert!(tree.visible(id));
        assert_eq!(tree.parent(id), None);
        assert!(!tree.needs_layout(id));
        assert!(!tree.has_pending_flush());
        assert_eq!(schedules.get(), 0, "creation must not schedule a flush");
    }

    #[test]
    fn create_node_allocates_element_from_surface() {
        let mut surface = TestSurface::default();
        let mut tree = LayoutTree::new();
        let a = tree.create_node(&mut surface);
        let b = tree.create_node_from_markup(&mut surface, "<div class=\"knob\"></div>");
        assert_eq!(tree.element(a), ElementId(0));
        assert_eq!(tree.element(b), ElementId(1));
    }

    #[test]
    fn set_x_marks_dirty_and_schedules() {
        let (mut tree, schedules, _) = counting_tree();
        let id = node(&mut tree);
        tree.set_x(id, 10.0);
        assert_eq!(tree.x(id), 10.0);
        assert!(tree.needs_layout(id));
        assert!(tree.dirty_properties(id).contains(DirtyProps::X));
        assert_eq!(tree.dirty_count(), 1);
        assert_eq!(schedules.get(), 1);
    }

    #[test]
    fn setter_no_ops_on_equal_value() {
        let (mut tree, schedules, _) = counting_tree();
        let id = node(&mut tree);
        tree.set_x(id, 0.0);
        tree.set_visible(id, true);
        assert!(!tree.needs_layout(id));
        assert_eq!(schedules.get(), 0);
    }

    #[test]
    fn second_mark_does_not_reschedule() {
        let (mut tree, schedules, _) = counting_tree();
        let id = node(&mut tree);
        tree.set_x(id, 10.0);
        tree.set_y(id, 20.0);
        tree.set_x(id, 30.0);
        assert_eq!(tree.dirty_count(), 1, "one registry entry per node");
        assert_eq!(schedules.get(), 1, "only the first mark arms the bridge");
    }

    #[test]
    fn mark_property_dirty_is_idempotent() {
        let (mut tree, schedules, _) = counting_tree();
        let id = node(&mut tree);
        tree.mark_property_dirty(id, Property::Width);
        tree.mark_property_dirty(id, Property::Width);
        assert_eq!(tree.dirty_properties(id), DirtyProps::WIDTH);
        assert_eq!(tree.dirty_count(), 1);
        assert_eq!(schedules.get(), 1);
    }

    #[test]
    fn set_needs_layout_round_trip() {
        let (mut tree, schedules, unschedules) = counting_tree();
        let id = node(&mut tree);
        tree.set_needs_layout(id, true);
        assert!(tree.needs_layout(id));
        assert_eq!(schedules.get(), 1);
        tree.set_needs_layout(id, false);
        assert!(!tree.needs_layout(id));
        assert!(!tree.has_pending_flush());
        assert_eq!(unschedules.get(), 1);
    }

    #[test]
    fn set_needs_layout_matching_derived_is_noop() {
        let (mut tree, schedules, _) = counting_tree();
        let id = node(&mut tree);
        tree.set_x(id, 5.0);
        // Derived state is already true, so the explicit flag is not stored.
        tree.set_needs_layout(id, true);
        assert_eq!(schedules.get(), 1);
        assert_eq!(tree.dirty_count(), 1);
    }

    #[test]
    fn set_needs_layout_false_keeps_node_with_dirty_props() {
        let (mut tree, _, unschedules) = counting_tree();
        let id = node(&mut tree);
        tree.set_x(id, 5.0);
        tree.set_needs_layout(id, false);
        // The pending property keeps derived state true; nothing changes.
        assert!(tree.needs_layout(id));
        assert!(tree.has_pending_flush());
        assert_eq!(unschedules.get(), 0);
    }

    #[test]
    fn add_child_and_query() {
        let mut tree = LayoutTree::new();
        let parent = node(&mut tree);
        let child1 = node(&mut tree);
        let child2 = node(&mut tree);

        tree.add_child(parent, child1);
        tree.add_child(parent, child2);

        assert_eq!(tree.parent(child1), Some(parent));
        assert_eq!(tree.parent(child2), Some(parent));
        assert_eq!(tree.child_count(parent), 2);

        let kids: Vec<_> = tree.children(parent).collect();
        assert_eq!(kids, vec![child1, child2]);
    }

    #[test]
    fn add_child_returns_child() {
        let mut tree = LayoutTree::new();
        let parent = node(&mut tree);
        let child = node(&mut tree);
        assert_eq!(tree.add_child(parent, child), child);
    }

    #[test]
    fn add_child_marks_pending_addition() {
        let (mut tree, schedules, _) = counting_tree();
        let parent = node(&mut tree);
        let child = node(&mut tree);
        tree.add_child(parent, child);
        assert_eq!(tree.pending_structural_op(child), StructuralOp::Addition);
        assert!(tree.needs_layout(child));
        assert!(!tree.needs_layout(parent), "only the child is marked");
        assert_eq!(schedules.get(), 1);
    }

    #[test]
    fn add_child_at_clamps_out_of_range_index() {
        let mut tree = LayoutTree::new();
        let parent = node(&mut tree);
        let a = node(&mut tree);
        let b = node(&mut tree);
        let c = node(&mut tree);

        tree.add_child(parent, a);
        tree.add_child_at(parent, b, 99);
        tree.add_child_at(parent, c, 0);

        let kids: Vec<_> = tree.children(parent).collect();
        assert_eq!(kids, vec![c, a, b]);
    }

    #[test]
    fn add_child_moves_from_previous_parent() {
        let mut tree = LayoutTree::new();
        let p1 = node(&mut tree);
        let p2 = node(&mut tree);
        let child = node(&mut tree);

        tree.add_child(p1, child);
        tree.add_child(p2, child);

        assert_eq!(tree.parent(child), Some(p2));
        assert!(tree.children(p1).next().is_none());
        // The move nets out as a pending addition under the new parent.
        assert_eq!(tree.pending_structural_op(child), StructuralOp::Addition);
    }

    #[test]
    fn add_child_to_same_parent_moves_to_index() {
        let mut tree = LayoutTree::new();
        let parent = node(&mut tree);
        let a = node(&mut tree);
        let b = node(&mut tree);
        let c = node(&mut tree);
        tree.add_child(parent, a);
        tree.add_child(parent, b);
        tree.add_child(parent, c);

        // `a` is detached first, so the index addresses [b, c].
        tree.add_child_at(parent, a, 1);

        let kids: Vec<_> = tree.children(parent).collect();
        assert_eq!(kids, vec![b, a, c]);
    }

    #[test]
    fn insert_before_places_child_before_reference() {
        let mut tree = LayoutTree::new();
        let parent = node(&mut tree);
        let a = node(&mut tree);
        let b = node(&mut tree);
        let c = node(&mut tree);

        tree.add_child(parent, a);
        tree.add_child(parent, c);
        tree.insert_before(parent, b, c);

        let kids: Vec<_> = tree.children(parent).collect();
        assert_eq!(kids, vec![a, b, c]);
    }

    #[test]
    fn insert_before_with_missing_reference_appends() {
        let mut tree = LayoutTree::new();
        let parent = node(&mut tree);
        let a = node(&mut tree);
        let b = node(&mut tree);
        let stranger = node(&mut tree);

        tree.add_child(parent, a);
        tree.insert_before(parent, b, stranger);

        let kids: Vec<_> = tree.children(parent).collect();
        assert_eq!(kids, vec![a, b]);
    }

    #[test]
    fn insert_before_uses_reference_position_before_detach() {
        let mut tree = LayoutTree::new();
        let parent = node(&mut tree);
        let a = node(&mut tree);
        let b = node(&mut tree);
        let c = node(&mut tree);
        tree.add_child(parent, a);
        tree.add_child(parent, b);
        tree.add_child(parent, c);

        // The reference position (2) is captured before `a` is detached, so
        // after the detach it addresses the slot past `c`.
        tree.insert_before(parent, a, c);

        let kids: Vec<_> = tree.children(parent).collect();
        assert_eq!(kids, vec![b, c, a]);
    }

    #[test]
    fn insert_after_places_child_after_reference() {
        let mut tree = LayoutTree::new();
        let parent = node(&mut tree);
        let a = node(&mut tree);
        let b = node(&mut tree);
        let c = node(&mut tree);

        tree.add_child(parent, a);
        tree.add_child(parent, c);
        tree.insert_after(parent, b, a);

        let kids: Vec<_> = tree.children(parent).collect();
        assert_eq!(kids, vec![a, b, c]);
    }

    #[test]
    fn insert_after_with_missing_reference_prepends() {
        let mut tree = LayoutTree::new();
        let parent = node(&mut tree);
        let a = node(&mut tree);
        let b = node(&mut tree);
        let stranger = node(&mut tree);

        tree.add_child(parent, a);
        tree.insert_after(parent, b, stranger);

        let kids: Vec<_> = tree.children(parent).collect();
        assert_eq!(kids, vec![b, a]);
    }

    #[test]
    fn remove_child_unlinks_and_marks_removal() {
        let mut tree = LayoutTree::new();
        let parent = node(&mut tree);
        let child = node(&mut tree);
        tree.add_child(parent, child);

        assert_eq!(tree.remove_child(parent, child), Some(child));
        assert_eq!(tree.parent(child), None);
        assert_eq!(tree.child_count(parent), 0);
        assert_eq!(tree.pending_structural_op(child), StructuralOp::Removal);
    }

    #[test]
    fn remove_child_of_other_parent_is_noop() {
        let (mut tree, schedules, _) = counting_tree();
        let p1 = node(&mut tree);
        let p2 = node(&mut tree);
        let child = node(&mut tree);
        tree.add_child(p1, child);
        let before = schedules.get();

        assert_eq!(tree.remove_child(p2, child), None);
        assert_eq!(tree.parent(child), Some(p1));
        assert_eq!(schedules.get(), before);
    }

    #[test]
    fn remove_from_parent_detached_is_noop() {
        let (mut tree, schedules, _) = counting_tree();
        let id = node(&mut tree);
        assert_eq!(tree.remove_from_parent(id), None);
        assert!(!tree.needs_layout(id));
        assert_eq!(schedules.get(), 0);
    }

    #[test]
    fn structural_op_last_write_wins() {
        let mut tree = LayoutTree::new();
        let parent = node(&mut tree);
        let child = node(&mut tree);

        tree.add_child(parent, child);
        assert_eq!(tree.pending_structural_op(child), StructuralOp::Addition);

        tree.remove_child(parent, child);
        assert_eq!(tree.pending_structural_op(child), StructuralOp::Removal);

        tree.add_child(parent, child);
        assert_eq!(tree.pending_structural_op(child), StructuralOp::Addition);
        assert_eq!(tree.dirty_count(), 1, "still a single registry entry");
    }

    #[test]
    fn set_children_replaces_existing() {
        let mut tree = LayoutTree::new();
        let parent = node(&mut tree);
        let old1 = node(&mut tree);
        let old2 = node(&mut tree);
        let new1 = node(&mut tree);
        let new2 = node(&mut tree);
        tree.add_child(parent, old1);
        tree.add_child(parent, old2);

        tree.set_children(parent, &[new1, new2]);

        let kids: Vec<_> = tree.children(parent).collect();
        assert_eq!(kids, vec![new1, new2]);
        assert_eq!(tree.parent(old1), None);
        assert_eq!(tree.pending_structural_op(old1), StructuralOp::Removal);
        assert_eq!(tree.pending_structural_op(new1), StructuralOp::Addition);
    }

    #[test]
    fn set_children_empty_clears() {
        let mut tree = LayoutTree::new();
        let parent = node(&mut tree);
        let a = node(&mut tree);
        let b = node(&mut tree);
        tree.add_child(parent, a);
        tree.add_child(parent, b);

        tree.set_children(parent, &[]);

        assert_eq!(tree.child_count(parent), 0);
        assert_eq!(tree.parent(a), None);
        assert_eq!(tree.parent(b), None);
    }

    #[test]
    fn children_iterator_is_double_ended() {
        let mut tree = LayoutTree::new();
        let parent = node(&mut tree);
        let a = node(&mut tree);
        let b = node(&mut tree);
        let c = node(&mut tree);
        tree.add_child(parent, a);
        tree.add_child(parent, b);
        tree.add_child(parent, c);

        assert_eq!(tree.children(parent).len(), 3);
        let reversed: Vec<_> = tree.children(parent).rev().collect();
        assert_eq!(reversed, vec![c, b, a]);
    }

    #[test]
    fn frame_round_trip_marks_geometry() {
        let mut tree = LayoutTree::new();
        let id = node(&mut tree);
        tree.set_frame(id, Rect::new(1.0, 2.0, 11.0, 22.0));

        assert_eq!(tree.x(id), 1.0);
        assert_eq!(tree.y(id), 2.0);
        assert_eq!(tree.width(id), 10.0);
        assert_eq!(tree.height(id), 20.0);
        assert_eq!(tree.frame(id), Rect::new(1.0, 2.0, 11.0, 22.0));
        assert_eq!(
            tree.dirty_properties(id),
            DirtyProps::X | DirtyProps::Y | DirtyProps::WIDTH | DirtyProps::HEIGHT,
            "visibility is untouched by frame writes"
        );
    }

    #[test]
    fn destroy_removes_node_from_registry() {
        let (mut tree, _, unschedules) = counting_tree();
        let mut surface = TestSurface::default();
        let id = node(&mut tree);
        tree.set_x(id, 4.0);
        assert!(tree.has_pending_flush());

        tree.destroy_node(id, &mut surface);

        assert!(!tree.has_pending_flush());
        assert_eq!(unschedules.get(), 1);
    }

    #[test]
    fn destroy_detaches_element_immediately() {
        let mut surface = TestSurface::default();
        let mut tree = LayoutTree::new();
        let parent = tree.create_node(&mut surface);
        let child = tree.create_node(&mut surface);
        tree.add_child(parent, child);
        let element = tree.element(child);

        tree.destroy_node(child, &mut surface);

        assert_eq!(surface.detached, vec![element]);
        assert_eq!(tree.child_count(parent), 0);
    }

    #[test]
    #[should_panic(expected = "cannot destroy node with children")]
    fn destroy_with_children_panics() {
        let mut surface = TestSurface::default();
        let mut tree = LayoutTree::new();
        let parent = tree.create_node(&mut surface);
        let child = tree.create_node(&mut surface);
        tree.add_child(parent, child);
        tree.destroy_node(parent, &mut surface);
    }

    #[test]
    #[should_panic(expected = "stale NodeId")]
    fn destroyed_handle_panics_on_set_x() {
        let mut surface = TestSurface::default();
        let mut tree = LayoutTree::new();
        let id = tree.create_node(&mut surface);
        tree.destroy_node(id, &mut surface);
        tree.set_x(id, 1.0);
    }

    #[test]
    #[should_panic(expected = "stale NodeId")]
    fn destroyed_handle_panics_on_add_child() {
        let mut surface = TestSurface::default();
        let mut tree = LayoutTree::new();
        let root = tree.create_node(&mut surface);
        let id = tree.create_node(&mut surface);
        tree.destroy_node(id, &mut surface);
        tree.add_child(root, id);
    }

    #[test]
    #[should_panic(expected = "stale NodeId")]
    fn destroyed_handle_panics_on_parent() {
        let mut surface = TestSurface::default();
        let mut tree = LayoutTree::new();
        let id = tree.create_node(&mut surface);
        tree.destroy_node(id, &mut surface);
        let _ = tree.parent(id);
    }
}
