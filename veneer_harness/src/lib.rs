// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory host surface and scheduler probes for veneer tests and demos.

#![no_std]

extern crate alloc;

use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cell::Cell;

use veneer_core::dirty::DisplayState;
use veneer_core::node::ElementId;
use veneer_core::scheduler::SchedulerBridge;
use veneer_core::surface::HostSurface;

/// One host-surface call, in the order the surface received it.
///
/// [`MemorySurface`] logs calls, not effects: a detach for an element that
/// is not attached still produces a [`SurfaceOp::Detach`] entry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SurfaceOp {
    /// A bare element was created.
    Create(ElementId),
    /// An element was created from a markup string.
    CreateFromMarkup(ElementId),
    /// The left offset of an element was written.
    OffsetLeft(ElementId, f64),
    /// The top offset of an element was written.
    OffsetTop(ElementId, f64),
    /// The width of an element was written.
    Width(ElementId, f64),
    /// The height of an element was written.
    Height(ElementId, f64),
    /// The display state of an element was written.
    Display(ElementId, DisplayState),
    /// A child was inserted under a parent, before an optional sibling.
    Insert {
        /// Element the child was inserted under.
        parent: ElementId,
        /// Element that was inserted.
        child: ElementId,
        /// Sibling the child was placed before, or `None` for append.
        reference: Option<ElementId>,
    },
    /// An element was detached from its parent.
    Detach(ElementId),
}

/// Last style values written to one element.
///
/// Fields stay `None` until the corresponding surface call arrives, so a
/// test can tell "never written" apart from "written with the default".
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ElementStyle {
    /// Left offset, if ever written.
    pub left: Option<f64>,
    /// Top offset, if ever written.
    pub top: Option<f64>,
    /// Width, if ever written.
    pub width: Option<f64>,
    /// Height, if ever written.
    pub height: Option<f64>,
    /// Display state, if ever written.
    pub display: Option<DisplayState>,
}

/// [`HostSurface`] that applies calls to an in-memory element forest.
///
/// The surface keeps per-element parent links, ordered child lists, and the
/// last written [`ElementStyle`], alongside a flat [`SurfaceOp`] log. Slots
/// grow on demand, so elements minted elsewhere can be passed straight in.
#[derive(Clone, Debug, Default)]
pub struct MemorySurface {
    parents: Vec<Option<u32>>,
    children: Vec<Vec<u32>>,
    styles: Vec<ElementStyle>,
    markup: Vec<Option<String>>,
    ops: Vec<SurfaceOp>,
    next: u32,
}

impl MemorySurface {
    /// Creates an empty surface.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            parents: Vec::new(),
            children: Vec::new(),
            styles: Vec::new(),
            markup: Vec::new(),
            ops: Vec::new(),
            next: 0,
        }
    }

    /// Number of element slots the surface has seen.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.parents.len()
    }

    /// Parent of `element`, or `None` while detached.
    #[must_use]
    pub fn parent_of(&self, element: ElementId) -> Option<ElementId> {
        let idx = element.0 as usize;
        self.parents.get(idx).copied().flatten().map(ElementId)
    }

    /// Children of `element`, in attachment order.
    #[must_use]
    pub fn children_of(&self, element: ElementId) -> Vec<ElementId> {
        let idx = element.0 as usize;
        match self.children.get(idx) {
            Some(kids) => kids.iter().map(|&raw| ElementId(raw)).collect(),
            None => Vec::new(),
        }
    }

    /// Whether `element` currently has a parent.
    #[must_use]
    pub fn is_attached(&self, element: ElementId) -> bool {
        self.parent_of(element).is_some()
    }

    /// Last styles written to `element`.
    #[must_use]
    pub fn style_of(&self, element: ElementId) -> ElementStyle {
        let idx = element.0 as usize;
        self.styles.get(idx).copied().unwrap_or_default()
    }

    /// Markup `element` was created from, if any.
    #[must_use]
    pub fn markup_of(&self, element: ElementId) -> Option<&str> {
        let idx = element.0 as usize;
        self.markup.get(idx)?.as_deref()
    }

    /// The call log so far.
    #[must_use]
    pub fn ops(&self) -> &[SurfaceOp] {
        &self.ops
    }

    /// Number of insert calls logged so far.
    #[must_use]
    pub fn attach_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, SurfaceOp::Insert { .. }))
            .count()
    }

    /// Number of detach calls logged so far.
    #[must_use]
    pub fn detach_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, SurfaceOp::Detach(_)))
            .count()
    }

    /// Drains and returns the call log, leaving the forest intact.
    pub fn take_ops(&mut self) -> Vec<SurfaceOp> {
        core::mem::take(&mut self.ops)
    }

    fn ensure_slot(&mut self, element: ElementId) {
        let needed = element.0 as usize + 1;
        if self.parents.len() < needed {
            self.parents.resize(needed, None);
            self.children.resize_with(needed, Vec::new);
            self.styles.resize(needed, ElementStyle::default());
            self.markup.resize_with(needed, || None);
        }
        self.next = self.next.max(element.0.saturating_add(1));
    }

    fn mint(&mut self) -> ElementId {
        let element = ElementId(self.next);
        self.ensure_slot(element);
        element
    }
}

impl HostSurface for MemorySurface {
    fn create_element(&mut self) -> ElementId {
        let element = self.mint();
        self.ops.push(SurfaceOp::Create(element));
        element
    }

    fn create_element_from_markup(&mut self, markup: &str) -> ElementId {
        let element = self.mint();
        self.markup[element.0 as usize] = Some(markup.to_string());
        self.ops.push(SurfaceOp::CreateFromMarkup(element));
        element
    }

    fn set_offset_left(&mut self, element: ElementId, value: f64) {
        self.ensure_slot(element);
        self.ops.push(SurfaceOp::OffsetLeft(element, value));
        self.styles[element.0 as usize].left = Some(value);
    }

    fn set_offset_top(&mut self, element: ElementId, value: f64) {
        self.ensure_slot(element);
        self.ops.push(SurfaceOp::OffsetTop(element, value));
        self.styles[element.0 as usize].top = Some(value);
    }

    fn set_width(&mut self, element: ElementId, value: f64) {
        self.ensure_slot(element);
        self.ops.push(SurfaceOp::Width(element, value));
        self.styles[element.0 as usize].width = Some(value);
    }

    fn set_height(&mut self, element: ElementId, value: f64) {
        self.ensure_slot(element);
        self.ops.push(SurfaceOp::Height(element, value));
        self.styles[element.0 as usize].height = Some(value);
    }

    fn set_display(&mut self, element: ElementId, state: DisplayState) {
        self.ensure_slot(element);
        self.ops.push(SurfaceOp::Display(element, state));
        self.styles[element.0 as usize].display = Some(state);
    }

    fn insert_before(
        &mut self,
        parent: ElementId,
        child: ElementId,
        reference: Option<ElementId>,
    ) {
        self.ensure_slot(parent);
        self.ensure_slot(child);
        if let Some(reference) = reference {
            self.ensure_slot(reference);
        }
        self.ops.push(SurfaceOp::Insert {
            parent,
            child,
            reference,
        });

        // Move semantics: an attached child leaves its old parent first.
        let child_idx = child.0 as usize;
        if let Some(old_parent) = self.parents[child_idx] {
            self.children[old_parent as usize].retain(|&raw| raw != child.0);
        }
        let siblings = &mut self.children[parent.0 as usize];
        let position = match reference {
            // A reference that is not a child of `parent` degrades to append.
            Some(reference) => siblings
                .iter()
                .position(|&raw| raw == reference.0)
                .unwrap_or(siblings.len()),
            None => siblings.len(),
        };
        siblings.insert(position, child.0);
        self.parents[child_idx] = Some(parent.0);
    }

    fn remove_from_parent(&mut self, element: ElementId) {
        self.ensure_slot(element);
        self.ops.push(SurfaceOp::Detach(element));
        let idx = element.0 as usize;
        if let Some(parent) = self.parents[idx].take() {
            self.children[parent as usize].retain(|&raw| raw != element.0);
        }
    }
}

/// Shared counters observed through a [`RecordingBridge`].
///
/// Clone the probe freely; all clones read the same counters.
#[derive(Clone, Debug, Default)]
pub struct BridgeProbe {
    schedules: Rc<Cell<u32>>,
    unschedules: Rc<Cell<u32>>,
}

impl BridgeProbe {
    /// Creates a probe with zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a bridge that reports into this probe's counters.
    #[must_use]
    pub fn bridge(&self) -> RecordingBridge {
        RecordingBridge {
            schedules: Rc::clone(&self.schedules),
            unschedules: Rc::clone(&self.unschedules),
        }
    }

    /// Number of `schedule_flush` calls observed.
    #[must_use]
    pub fn schedule_count(&self) -> u32 {
        self.schedules.get()
    }

    /// Number of `unschedule_flush` calls observed.
    #[must_use]
    pub fn unschedule_count(&self) -> u32 {
        self.unschedules.get()
    }

    /// Whether a flush is currently requested.
    ///
    /// Relies on schedule and unschedule strictly alternating, which the
    /// tree guarantees.
    #[must_use]
    pub fn armed(&self) -> bool {
        self.schedules.get() > self.unschedules.get()
    }
}

/// [`SchedulerBridge`] that counts calls into a shared [`BridgeProbe`].
#[derive(Clone, Debug)]
pub struct RecordingBridge {
    schedules: Rc<Cell<u32>>,
    unschedules: Rc<Cell<u32>>,
}

impl SchedulerBridge for RecordingBridge {
    fn schedule_flush(&mut self) {
        self.schedules.set(self.schedules.get() + 1);
    }

    fn unschedule_flush(&mut self) {
        self.unschedules.set(self.unschedules.get() + 1);
    }
}
