// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scheduler bridge contract.
//!
//! The tree never flushes on its own; it asks the host to call
//! [`LayoutTree::flush`](crate::node::LayoutTree::flush) at a point the host
//! chooses (an animation frame, an idle callback, a test harness step). The
//! [`SchedulerBridge`] trait is that request channel.
//!
//! # Call discipline
//!
//! The tree calls the bridge only on true transitions of its dirty registry:
//!
//! - [`schedule_flush`](SchedulerBridge::schedule_flush) when the registry
//!   goes from empty to non-empty.
//! - [`unschedule_flush`](SchedulerBridge::unschedule_flush) when it goes
//!   from non-empty to empty — whether a mutation cleaned the last node, the
//!   last dirty node was destroyed, or a flush drained the registry.
//!
//! Redundant mutations between those transitions produce no bridge traffic.
//! Implementations must still be idempotent: arming an armed bridge or
//! disarming a disarmed one is a no-op.

/// Arms and disarms the host's flush callback.
///
/// See the [module docs](self) for the call discipline the tree guarantees.
pub trait SchedulerBridge {
    /// Requests that the host run a flush on its next update cycle.
    fn schedule_flush(&mut self);

    /// Withdraws a pending flush request.
    fn unschedule_flush(&mut self);
}

/// A [`SchedulerBridge`] that ignores every request.
///
/// Suitable for manually driven trees: poll
/// [`LayoutTree::has_pending_flush`](crate::node::LayoutTree::has_pending_flush)
/// and call [`flush`](crate::node::LayoutTree::flush) yourself.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopBridge;

impl SchedulerBridge for NoopBridge {
    fn schedule_flush(&mut self) {}

    fn unschedule_flush(&mut self) {}
}

// ---------------------------------------------------------------------------
