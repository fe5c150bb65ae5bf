// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Child list traversal.

use super::id::NodeId;

/// Iterator over the direct children of a node, in child-list order.
///
/// Yields full [`NodeId`] handles (index plus current generation), so the
/// results stay valid for use with any tree API.
#[derive(Debug)]
pub struct Children<'a> {
    indices: core::slice::Iter<'a, u32>,
    generations: &'a [u32],
}

impl<'a> Children<'a> {
    pub(crate) fn new(indices: &'a [u32], generations: &'a [u32]) -> Self {
        Self {
            indices: indices.iter(),
            generations,
        }
    }

    fn handle(&self, idx: u32) -> NodeId {
        NodeId {
            idx,
            generation: self.generations[idx as usize],
        }
    }
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let &idx = self.indices.next()?;
        Some(self.handle(idx))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.indices.size_hint()
    }
}

impl DoubleEndedIterator for Children<'_> {
    fn next_back(&mut self) -> Option<NodeId> {
        let &idx = self.indices.next_back()?;
        Some(self.handle(idx))
    }
}

impl ExactSizeIterator for Children<'_> {}
