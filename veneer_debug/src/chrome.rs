// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][spec] JSON to the given writer.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
///
/// Each flush pass becomes one `Flush` duration slice (a begin/end pair at
/// the recorder's microsecond timestamps); commit counts become instants.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::FlushBegin {
                at_us,
                flush_index,
                dirty_nodes,
            } => {
                events.push(json!({
                    "ph": "B",
                    "name": "Flush",
                    "cat": "Flush",
                    "ts": at_us,
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "flush_index": flush_index,
                        "dirty_nodes": dirty_nodes,
                    }
                }));
            }
            RecordedEvent::FlushEnd {
                at_us,
                flush_index,
                nodes_flushed,
                properties_committed,
                elements_detached,
                addition_candidates,
                parents_reconciled,
                elements_attached,
            } => {
                events.push(json!({
                    "ph": "E",
                    "name": "Flush",
                    "cat": "Flush",
                    "ts": at_us,
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "flush_index": flush_index,
                        "nodes_flushed": nodes_flushed,
                        "properties_committed": properties_committed,
                        "elements_detached": elements_detached,
                        "addition_candidates": addition_candidates,
                        "parents_reconciled": parents_reconciled,
                        "elements_attached": elements_attached,
                    }
                }));
            }
            RecordedEvent::CommitsCount { flush_index, count } => {
                events.push(json!({
                    "ph": "i",
                    "name": "Commits",
                    "cat": "Rich",
                    "ts": 0,
                    "pid": 0,
                    "tid": 0,
                    "s": "p",
                    "args": {
                        "flush_index": flush_index,
                        "count": count,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}
