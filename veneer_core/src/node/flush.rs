// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The batched flush pass that commits pending state to the host surface.
//!
//! A flush drains the dirty registry in insertion order and, per node,
//! detaches pending removals, writes pending property values, and queues
//! pending additions for a per-parent child-order reconciliation that runs
//! at the end of the pass. Deferring attachments to the reconciliation walk
//! lets siblings added in any order land in tree order, each inserted
//! before its already-resolved next sibling.

use core::mem;

use crate::dirty::{DirtyProps, DisplayState, Property, StructuralOp};
use crate::surface::HostSurface;

use super::id::{ElementId, INVALID};
use super::store::LayoutTree;

/// Counters reported by one [`LayoutTree::flush`] pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlushStats {
    /// Nodes drained from the dirty registry.
    pub nodes_flushed: u32,
    /// Property values written to the host surface.
    pub properties_committed: u32,
    /// Host elements detached for pending removals.
    pub elements_detached: u32,
    /// Nodes whose pending addition was queued for reconciliation.
    pub addition_candidates: u32,
    /// Parents whose child order was reconciled.
    pub parents_reconciled: u32,
    /// Host elements attached during reconciliation.
    pub elements_attached: u32,
}

impl LayoutTree {
    /// Commits all pending state to `surface` in one batch.
    ///
    /// The pass runs in a fixed order:
    ///
    /// 1. Each registered node clears its explicit needs-layout flag, detaches
    ///    its element if a removal is pending, commits its pending properties
    ///    (final values only), and queues its parent for reconciliation if an
    ///    addition is pending.
    /// 2. The dirty registry is cleared and the bridge is disarmed.
    /// 3. Each queued parent walks its children back to front, attaching every
    ///    child with a pending addition immediately before its next sibling's
    ///    element (or as the last child when none follows).
    ///
    /// Flushing a tree with an empty registry returns zeroed stats and makes
    /// no host-surface or bridge calls.
    pub fn flush(&mut self, surface: &mut dyn HostSurface) -> FlushStats {
        let mut stats = FlushStats::default();
        if self.dirty.is_empty() {
            return stats;
        }

        // Swap the registry out so per-node state can be mutated during the
        // walk; the cleared allocation is handed back for the next batch.
        let mut dirty = mem::take(&mut self.dirty);
        for &idx in &dirty {
            self.needs_layout_flag[idx as usize] = false;
            self.layout_node(idx, surface, &mut stats);
            self.tracked[idx as usize] = false;
            stats.nodes_flushed += 1;
        }
        dirty.clear();
        self.dirty = dirty;

        self.bridge.unschedule_flush();

        let mut parents = mem::take(&mut self.needs_children_update);
        for &p in &parents {
            self.awaiting_children_update[p as usize] = false;
            self.update_children(p, surface, &mut stats);
            stats.parents_reconciled += 1;
        }
        parents.clear();
        self.needs_children_update = parents;

        stats
    }

    /// Runs the per-node layout step: detach, commit properties, queue the
    /// parent for reconciliation.
    ///
    /// A pending removal is left in place afterwards; detaching again on a
    /// later flush is harmless, and re-adding the node overwrites the op.
    fn layout_node(&mut self, idx: u32, surface: &mut dyn HostSurface, stats: &mut FlushStats) {
        if self.pending_op[idx as usize] == StructuralOp::Removal {
            surface.remove_from_parent(self.element[idx as usize]);
            stats.elements_detached += 1;
        }

        let props = self.dirty_props[idx as usize];
        for property in Property::ALL {
            if props.contains(property.flag()) {
                self.commit_property(idx, property, surface);
                stats.properties_committed += 1;
            }
        }
        self.dirty_props[idx as usize] = DirtyProps::empty();

        if self.pending_op[idx as usize] == StructuralOp::Addition {
            stats.addition_candidates += 1;
            let p = self.parent[idx as usize];
            if p != INVALID && !self.awaiting_children_update[p as usize] {
                self.awaiting_children_update[p as usize] = true;
                self.needs_children_update.push(p);
            }
        }
    }

    /// Writes one property's current value to the host surface.
    fn commit_property(&self, idx: u32, property: Property, surface: &mut dyn HostSurface) {
        let element = self.element[idx as usize];
        match property {
            Property::X => surface.set_offset_left(element, self.x[idx as usize]),
            Property::Y => surface.set_offset_top(element, self.y[idx as usize]),
            Property::Width => surface.set_width(element, self.width[idx as usize]),
            Property::Height => surface.set_height(element, self.height[idx as usize]),
            Property::Visible => {
                let state = if self.visible[idx as usize] {
                    DisplayState::Shown
                } else {
                    DisplayState::Hidden
                };
                surface.set_display(element, state);
            }
        }
    }

    /// Re-attaches `p`'s children that have pending additions, back to front,
    /// so each insertion can reference the element that follows it.
    fn update_children(&mut self, p: u32, surface: &mut dyn HostSurface, stats: &mut FlushStats) {
        let parent_element = self.element[p as usize];
        let mut next_element: Option<ElementId> = None;
        for i in (0..self.children[p as usize].len()).rev() {
            let c = self.children[p as usize][i];
            let child_element = self.element[c as usize];
            if self.pending_op[c as usize] == StructuralOp::Addition {
                surface.insert_before(parent_element, child_element, next_element);
                self.pending_op[c as usize] = StructuralOp::None;
                stats.elements_attached += 1;
            }
            next_element = Some(child_element);
        }
    }
}
