// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the flush loop.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that
//! embedders call around each flush. All method bodies default to no-ops, so
//! implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace`
//! feature is **off**, every `Tracer` method compiles to nothing (zero
//! overhead). When **on**, each method performs a single `Option` branch
//! before dispatching.
//!
//! # Crate features
//!
//! - `trace` — enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`) — gates [`CommitRecord`] events plus the
//!   corresponding `TraceSink` method.

use crate::node::FlushStats;

#[cfg(feature = "trace-rich")]
use crate::dirty::Property;
#[cfg(feature = "trace-rich")]
use crate::node::ElementId;

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted immediately before a flush pass runs.
#[derive(Clone, Copy, Debug)]
pub struct FlushBeginEvent {
    /// Monotonic flush counter, maintained by the embedder.
    pub flush_index: u64,
    /// Number of nodes in the dirty registry.
    pub dirty_nodes: u32,
}

/// Emitted after a flush pass completes.
#[derive(Clone, Copy, Debug)]
pub struct FlushEndEvent {
    /// Flush counter.
    pub flush_index: u64,
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

impl FlushEndEvent {
    /// Creates a `FlushEndEvent` from the counters a flush reported.
    #[must_use]
    pub fn new(flush_index: u64, stats: &FlushStats) -> Self {
        Self {
            flush_index,
            nodes_flushed: stats.nodes_flushed,
            properties_committed: stats.properties_committed,
            elements_detached: stats.elements_detached,
            addition_candidates: stats.addition_candidates,
            parents_reconciled: stats.parents_reconciled,
            elements_attached: stats.elements_attached,
        }
    }
}

/// What one host-surface commit did (requires `trace-rich` feature).
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommitKind {
    /// A property value write.
    Property(Property),
    /// An element detach.
    Detach,
    /// An element attach.
    Attach,
}

/// One host-surface commit performed during a flush (requires `trace-rich`
/// feature).
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug)]
pub struct CommitRecord {
    /// The element the commit targeted.
    pub element: ElementId,
    /// What was committed.
    pub kind: CommitKind,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the flush loop.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called immediately before a flush pass runs.
    fn on_flush_begin(&mut self, e: &FlushBeginEvent) {
        _ = e;
    }

    /// Called after a flush pass completes.
    fn on_flush_end(&mut self, e: &FlushEndEvent) {
        _ = e;
    }

    /// Called with per-flush commit records (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_flush_commits(&mut self, flush_index: u64, commits: &[CommitRecord]) {
        _ = (flush_index, commits);
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing.
/// When **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`FlushBeginEvent`].
    #[inline]
    pub fn flush_begin(&mut self, e: &FlushBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_flush_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`FlushEndEvent`].
    #[inline]
    pub fn flush_end(&mut self, e: &FlushEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_flush_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits commit records (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn flush_commits(&mut self, flush_index: u64, commits: &[CommitRecord]) {
        if let Some(s) = &mut self.sink {
            s.on_flush_commits(flush_index, commits);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
