// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scripted update loop that exercises the tracing and diagnostics pipeline.
//!
//! Builds a small playback-controls tree, mutates it over several update
//! cycles, and flushes each batch to a
//! [`MemorySurface`](veneer_harness::MemorySurface), recording events to both
//! a [`PrettyPrintSink`](veneer_debug::pretty::PrettyPrintSink) and a
//! [`RecorderSink`](veneer_debug::recorder::RecorderSink), then exports a
//! Chrome trace JSON file.

use std::fs::File;
use std::io::BufWriter;

use veneer_core::dirty::Property;
use veneer_core::node::LayoutTree;
use veneer_core::trace::{
    CommitKind, CommitRecord, FlushBeginEvent, FlushEndEvent, TraceSink, Tracer,
};

use veneer_debug::pretty::PrettyPrintSink;
use veneer_debug::recorder::RecorderSink;
use veneer_harness::{BridgeProbe, MemorySurface, SurfaceOp};

const BAR_WIDTH: f64 = 320.0;
const BAR_HEIGHT: f64 = 44.0;
const BUTTON_SIZE: f64 = 32.0;
const BUTTON_MARGIN: f64 = 8.0;

fn main() {
    // -- sinks ---------------------------------------------------------------
    let mut pretty = PrettyPrintSink::new(Box::new(std::io::stdout()));
    let mut recorder = RecorderSink::new();

    // -- tree, probe, and host surface ---------------------------------------
    let probe = BridgeProbe::new();
    let mut tree = LayoutTree::with_bridge(Box::new(probe.bridge()));
    let mut surface = MemorySurface::new();
    let mut flush_index: u64 = 0;

    // 1. Build a playback-controls cluster: a bar holding three buttons and
    //    a time label.
    let bar = tree.create_node(&mut surface);
    let play = tree.create_node_from_markup(&mut surface, "<button class=\"play\"></button>");
    let mute = tree.create_node_from_markup(&mut surface, "<button class=\"mute\"></button>");
    let fullscreen =
        tree.create_node_from_markup(&mut surface, "<button class=\"fullscreen\"></button>");
    let time_label = tree.create_node(&mut surface);
    tree.add_child(bar, play);
    tree.add_child(bar, mute);
    tree.add_child(bar, fullscreen);
    tree.add_child(bar, time_label);

    // Also exercise the Tracer wrapper (just to prove it compiles and
    // dispatches).
    {
        let begin = FlushBeginEvent {
            flush_index,
            dirty_nodes: dirty_nodes(&tree),
        };
        let mut tracer = Tracer::new(&mut pretty);
        tracer.flush_begin(&begin);
    }

    emit_flush(&mut tree, &mut surface, &mut pretty, &mut recorder, flush_index);
    flush_index += 1;

    // 2. Lay the cluster out as a horizontal row.
    tree.set_width(bar, BAR_WIDTH);
    tree.set_height(bar, BAR_HEIGHT);
    let mut left = BUTTON_MARGIN;
    for button in [play, mute, fullscreen] {
        tree.set_x(button, left);
        tree.set_y(button, (BAR_HEIGHT - BUTTON_SIZE) / 2.0);
        tree.set_width(button, BUTTON_SIZE);
        tree.set_height(button, BUTTON_SIZE);
        left += BUTTON_SIZE + BUTTON_MARGIN;
    }
    tree.set_x(time_label, left);
    tree.set_width(time_label, BAR_WIDTH - left - BUTTON_MARGIN);
    tree.set_height(time_label, BAR_HEIGHT);
    emit_flush(&mut tree, &mut surface, &mut pretty, &mut recorder, flush_index);
    flush_index += 1;

    // 3. Compact mode: hide the time label and narrow the bar.
    tree.set_visible(time_label, false);
    tree.set_width(bar, BAR_WIDTH - 40.0);
    emit_flush(&mut tree, &mut surface, &mut pretty, &mut recorder, flush_index);
    flush_index += 1;

    // 4. Move the fullscreen button to the front of the row.
    tree.insert_before(bar, fullscreen, play);
    emit_flush(&mut tree, &mut surface, &mut pretty, &mut recorder, flush_index);
    flush_index += 1;

    // 5. Replace the row wholesale: label first, then the buttons.
    tree.set_children(bar, &[time_label, play, mute, fullscreen]);
    emit_flush(&mut tree, &mut surface, &mut pretty, &mut recorder, flush_index);
    flush_index += 1;

    // 6. Tear the mute button out entirely.
    tree.remove_child(bar, mute);
    emit_flush(&mut tree, &mut surface, &mut pretty, &mut recorder, flush_index);
    flush_index += 1;
    tree.destroy_node(mute, &mut surface);

    // -- export Chrome trace --------------------------------------------------
    let path = "trace.json";
    let file = File::create(path).expect("failed to create trace.json");
    let mut writer = BufWriter::new(file);
    veneer_debug::chrome::export(recorder.as_bytes(), &mut writer)
        .expect("failed to write Chrome trace");

    println!(
        "Wrote {path} ({flush_index} flushes, {} schedules / {} unschedules)",
        probe.schedule_count(),
        probe.unschedule_count(),
    );
}

fn emit_flush(
    tree: &mut LayoutTree,
    surface: &mut MemorySurface,
    pretty: &mut PrettyPrintSink,
    recorder: &mut RecorderSink,
    flush_index: u64,
) {
    let begin = FlushBeginEvent {
        flush_index,
        dirty_nodes: dirty_nodes(tree),
    };
    pretty.on_flush_begin(&begin);
    recorder.on_flush_begin(&begin);

    let stats = tree.flush(surface);

    let end = FlushEndEvent::new(flush_index, &stats);
    pretty.on_flush_end(&end);
    recorder.on_flush_end(&end);

    let commits = commit_records(&surface.take_ops());
    pretty.on_flush_commits(flush_index, &commits);
    recorder.on_flush_commits(flush_index, &commits);
}

fn dirty_nodes(tree: &LayoutTree) -> u32 {
    u32::try_from(tree.dirty_count()).unwrap_or(u32::MAX)
}

/// Rebuilds rich commit records from the surface's call log.
fn commit_records(ops: &[SurfaceOp]) -> Vec<CommitRecord> {
    ops.iter()
        .filter_map(|op| match *op {
            SurfaceOp::OffsetLeft(element, _) => Some(CommitRecord {
                element,
                kind: CommitKind::Property(Property::X),
            }),
            SurfaceOp::OffsetTop(element, _) => Some(CommitRecord {
                element,
                kind: CommitKind::Property(Property::Y),
            }),
            SurfaceOp::Width(element, _) => Some(CommitRecord {
                element,
                kind: CommitKind::Property(Property::Width),
            }),
            SurfaceOp::Height(element, _) => Some(CommitRecord {
                element,
                kind: CommitKind::Property(Property::Height),
            }),
            SurfaceOp::Display(element, _) => Some(CommitRecord {
                element,
                kind: CommitKind::Property(Property::Visible),
            }),
            SurfaceOp::Insert { child, .. } => Some(CommitRecord {
                element: child,
                kind: CommitKind::Attach,
            }),
            SurfaceOp::Detach(element) => Some(CommitRecord {
                element,
                kind: CommitKind::Detach,
            }),
            SurfaceOp::Create(_) | SurfaceOp::CreateFromMarkup(_) => None,
        })
        .collect()
}
