// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host render surface contract.
//!
//! The layout tree renders nothing itself. It mirrors every node onto an
//! opaque host element — a DOM node, a platform view, or an in-memory test
//! double — and the [`HostSurface`] trait is the only channel through which
//! those elements are touched. The tree guarantees:
//!
//! - Element creation happens eagerly, when the node is created.
//! - Every other call happens either inside
//!   [`LayoutTree::flush`](crate::node::LayoutTree::flush) or when a node is
//!   [destroyed](crate::node::LayoutTree::destroy_node).
//! - Style writes carry the *final* value; intermediate values set between
//!   flushes are never committed.
//!
//! # Update loop pseudocode
//!
//! An embedder typically wires the surface and the
//! [`SchedulerBridge`](crate::scheduler::SchedulerBridge) together like this:
//!
//! ```rust,ignore
//! fn on_update_cycle() {
//!     // Runs once per host update cycle while the bridge is armed.
//!     let stats = tree.flush(&mut surface);
//!     log::trace!("flushed {} nodes", stats.nodes_flushed);
//! }
//! ```

use crate::dirty::DisplayState;
use crate::node::ElementId;

/// The host render surface a [`LayoutTree`](crate::node::LayoutTree) mirrors.
///
/// Implementations own the actual elements; the tree refers to them only
/// through [`ElementId`]s handed out by the two `create_*` methods (or
/// supplied by the caller for externally created elements).
///
/// All methods must tolerate redundant calls: detaching an unattached
/// element, re-inserting an already attached child, or restyling an element
/// that never changed are no-ops, not errors.
pub trait HostSurface {
    /// Creates a fresh element, detached from any parent.
    fn create_element(&mut self) -> ElementId;

    /// Creates an element from a markup fragment, detached from any parent.
    ///
    /// The fragment describes a single element (the host keeps whatever
    /// internal structure the markup produces).
    fn create_element_from_markup(&mut self, markup: &str) -> ElementId;

    /// Sets the element's left offset within its parent, in host units.
    fn set_offset_left(&mut self, element: ElementId, value: f64);

    /// Sets the element's top offset within its parent, in host units.
    fn set_offset_top(&mut self, element: ElementId, value: f64);

    /// Sets the element's width, in host units.
    fn set_width(&mut self, element: ElementId, value: f64);

    /// Sets the element's height, in host units.
    fn set_height(&mut self, element: ElementId, value: f64);

    /// Shows or hides the element.
    fn set_display(&mut self, element: ElementId, state: DisplayState);

    /// Attaches `child` under `parent`, immediately before `reference`, or as
    /// the last child when `reference` is `None`.
    ///
    /// An already-attached child is moved, not duplicated.
    fn insert_before(&mut self, parent: ElementId, child: ElementId, reference: Option<ElementId>);

    /// Detaches the element from its host parent, if it has one.
    fn remove_from_parent(&mut self, element: ElementId);
}
