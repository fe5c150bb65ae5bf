// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. The core events carry no
//! clock, so the recorder stamps each flush record with the microseconds
//! elapsed since the recorder was created. [`decode`] reads the records back
//! as an iterator of [`RecordedEvent`].
//!
//! Rich events ([`on_flush_commits`](TraceSink::on_flush_commits)) store only
//! the count.

use std::time::Instant;

use veneer_core::trace::{CommitRecord, FlushBeginEvent, FlushEndEvent, TraceSink};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_FLUSH_BEGIN: u8 = 1;
const TAG_FLUSH_END: u8 = 2;
const TAG_COMMITS_COUNT: u8 = 3;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug)]
pub struct RecorderSink {
    buf: Vec<u8>,
    epoch: Instant,
}

impl Default for RecorderSink {
    fn default() -> Self {
        Self::new()
    }
}

impl RecorderSink {
    /// Creates an empty recorder; timestamps count from this moment.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            epoch: Instant::now(),
        }
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn now_us(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_micros()).unwrap_or(u64::MAX)
    }

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }
}

impl TraceSink for RecorderSink {
    fn on_flush_begin(&mut self, e: &FlushBeginEvent) {
        let at_us = self.now_us();
        self.write_u8(TAG_FLUSH_BEGIN);
        self.write_u64(at_us);
        self.write_u64(e.flush_index);
        self.write_u32(e.dirty_nodes);
    }

    fn on_flush_end(&mut self, e: &FlushEndEvent) {
        let at_us = self.now_us();
        self.write_u8(TAG_FLUSH_END);
        self.write_u64(at_us);
        self.write_u64(e.flush_index);
        self.write_u32(e.nodes_flushed);
        self.write_u32(e.properties_committed);
        self.write_u32(e.elements_detached);
        self.write_u32(e.addition_candidates);
        self.write_u32(e.parents_reconciled);
        self.write_u32(e.elements_attached);
    }

    fn on_flush_commits(&mut self, flush_index: u64, commits: &[CommitRecord]) {
        self.write_u8(TAG_COMMITS_COUNT);
        self.write_u64(flush_index);
        #[expect(
            clippy::cast_possible_truncation,
            reason = "commit count capped at u32::MAX for recording"
        )]
        self.write_u32(commits.len().min(u32::MAX as usize) as u32);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// A flush pass started.
    FlushBegin {
        /// Microseconds since the recorder was created.
        at_us: u64,
        /// Flush counter.
        flush_index: u64,
        /// Registry size at the start of the pass.
        dirty_nodes: u32,
    },
    /// A flush pass completed.
    FlushEnd {
        /// Microseconds since the recorder was created.
        at_us: u64,
        /// Flush counter.
        flush_index: u64,
        /// Nodes drained from the registry.
        nodes_flushed: u32,
        /// Property writes issued to the surface.
        properties_committed: u32,
        /// Elements detached for pending removals.
        elements_detached: u32,
        /// Nodes whose pending addition was observed.
        addition_candidates: u32,
        /// Parents whose child order was reconciled.
        parents_reconciled: u32,
        /// Elements attached during reconciliation.
        elements_attached: u32,
    },
    /// Commit-record count for a flush.
    CommitsCount {
        /// Flush counter.
        flush_index: u64,
        /// Number of commit records.
        count: u32,
    },
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read_u8(&mut self) -> Option<u8> {
        if self.remaining() < 1 {
            return None;
        }
        let v = self.data[self.pos];
        self.pos += 1;
        Some(v)
    }

    fn read_u32(&mut self) -> Option<u32> {
        if self.remaining() < 4 {
            return None;
        }
        let v = u32::from_le_bytes(self.data[self.pos..self.pos + 4].try_into().ok()?);
        self.pos += 4;
        Some(v)
    }

    fn read_u64(&mut self) -> Option<u64> {
        if self.remaining() < 8 {
            return None;
        }
        let v = u64::from_le_bytes(self.data[self.pos..self.pos + 8].try_into().ok()?);
        self.pos += 8;
        Some(v)
    }

    fn decode_flush_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::FlushBegin {
            at_us: self.read_u64()?,
            flush_index: self.read_u64()?,
            dirty_nodes: self.read_u32()?,
        })
    }

    fn decode_flush_end(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::FlushEnd {
            at_us: self.read_u64()?,
            flush_index: self.read_u64()?,
            nodes_flushed: self.read_u32()?,
            properties_committed: self.read_u32()?,
            elements_detached: self.read_u32()?,
            addition_candidates: self.read_u32()?,
            parents_reconciled: self.read_u32()?,
            elements_attached: self.read_u32()?,
        })
    }

    fn decode_commits_count(&mut self) -> Option<RecordedEvent> {
        let flush_index = self.read_u64()?;
        let count = self.read_u32()?;
        Some(RecordedEvent::CommitsCount { flush_index, count })
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_FLUSH_BEGIN => self.decode_flush_begin(),
            TAG_FLUSH_END => self.decode_flush_end(),
            TAG_COMMITS_COUNT => self.decode_commits_count(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
