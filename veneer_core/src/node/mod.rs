// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layout node tree data model.
//!
//! A *node* is one entry in a layout tree that mirrors a host render surface.
//! Each node has:
//!
//! - An identity ([`NodeId`]) — a generational handle that becomes stale when
//!   the node is destroyed, preventing use-after-free bugs at the API level.
//! - A host element ([`ElementId`]) created when the node is created and
//!   styled only during flush.
//! - Topology — a parent link and an ordered child list. A node has at most
//!   one parent; adding it elsewhere moves it.
//! - **Deferred properties** set by the caller: [`x`](LayoutTree::set_x),
//!   [`y`](LayoutTree::set_y), [`width`](LayoutTree::set_width),
//!   [`height`](LayoutTree::set_height), and
//!   [`visible`](LayoutTree::set_visible). Reads are serviced from the tree
//!   immediately; the host sees the values at the next
//!   [`flush`](LayoutTree::flush).
//!
//! Nodes are stored in struct-of-arrays layout with index-based handles.
//!
//! # Dirty tracking
//!
//! Every mutation records itself on the node (a dirty property bit or a
//! pending structural op, see [`dirty`](crate::dirty)) and reconciles the
//! node's membership in the tree-wide dirty registry. The registry drives
//! the [`SchedulerBridge`](crate::scheduler::SchedulerBridge): the bridge is
//! armed when the registry first becomes non-empty and disarmed when it
//! empties. One [`flush`](LayoutTree::flush) commits everything at once and
//! reports a [`FlushStats`].

mod flush;
mod id;
mod store;
mod traverse;

pub use flush::FlushStats;
pub use id::{ElementId, INVALID, NodeId};
pub use store::LayoutTree;
pub use traverse::Children;
