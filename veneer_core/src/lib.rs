// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Batched, dirty-tracking layout tree that mirrors a host render surface.
//!
//! `veneer_core` keeps a tree of layout nodes — geometry, visibility, and
//! child order — and defers every host-surface write until a single batched
//! flush. It is `no_std` compatible (with `alloc`) and uses array-based
//! struct-of-arrays storage with generational index handles.
//!
//! # Architecture
//!
//! Callers mutate nodes freely between flushes; the tree coalesces those
//! mutations and asks the host to run one flush per update cycle:
//!
//! ```text
//!   caller mutation (set_x, add_child, remove_child, …)
//!       │
//!       ▼
//!   dirty registry ──► SchedulerBridge::schedule_flush()
//!                              │  (host decides when)
//!                              ▼
//!   LayoutTree::flush() ──► HostSurface writes ──► FlushStats
//! ```
//!
//! **[`node`]** — Struct-of-arrays layout tree with generational handles.
//! Geometry and visibility are recorded per node; structural changes are
//! tracked as a single pending op per node (latest wins).
//!
//! **[`dirty`]** — The deferred-commit vocabulary: which properties are
//! pending, which structural op is pending, and how visibility commits.
//!
//! **[`surface`]** — The [`HostSurface`](surface::HostSurface) trait that
//! embedders implement so the tree can create, style, attach, and detach
//! host elements.
//!
//! **[`scheduler`]** — The [`SchedulerBridge`](scheduler::SchedulerBridge)
//! trait through which the tree arms and disarms the host's flush callback.
//!
//! **[`trace`]** — [`TraceSink`](trace::TraceSink) trait and event types for
//! flush instrumentation, with zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates per-commit
//!   record events.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod dirty;
pub mod node;
pub mod scheduler;
pub mod surface;
pub mod trace;
