// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deferred-commit vocabulary.
//!
//! Mutations never touch the host surface directly. Each one records what
//! became stale on the node — a property in its [`DirtyProps`] set, or a
//! [`StructuralOp`] — and the next flush commits the *current* value once,
//! no matter how many times it changed in between.
//!
//! # Property commits
//!
//! Each [`Property`] maps to exactly one host-surface write:
//!
//! - [`X`](Property::X) — left offset within the parent element.
//! - [`Y`](Property::Y) — top offset within the parent element.
//! - [`Width`](Property::Width) / [`Height`](Property::Height) — element size.
//! - [`Visible`](Property::Visible) — [`DisplayState::Shown`] or
//!   [`DisplayState::Hidden`].
//!
//! # Structural ops
//!
//! A node carries at most one pending [`StructuralOp`]. Re-adding a removed
//! node before the flush overwrites the pending [`Removal`](StructuralOp::Removal)
//! with an [`Addition`](StructuralOp::Addition), so only the final intent
//! reaches the host. Removals detach the node's element during its own flush
//! step; additions are deferred further, to a per-parent child-order
//! reconciliation at the end of the flush, so siblings land in tree order.

use bitflags::bitflags;

/// A node property committed to the host surface during flush.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Property {
    /// Horizontal offset within the parent element.
    X,
    /// Vertical offset within the parent element.
    Y,
    /// Element width.
    Width,
    /// Element height.
    Height,
    /// Whether the element is shown or hidden.
    Visible,
}

impl Property {
    /// Every property, in commit order.
    pub const ALL: [Self; 5] = [Self::X, Self::Y, Self::Width, Self::Height, Self::Visible];

    /// The [`DirtyProps`] flag recording that this property is pending.
    #[must_use]
    pub const fn flag(self) -> DirtyProps {
        match self {
            Self::X => DirtyProps::X,
            Self::Y => DirtyProps::Y,
            Self::Width => DirtyProps::WIDTH,
            Self::Height => DirtyProps::HEIGHT,
            Self::Visible => DirtyProps::VISIBLE,
        }
    }
}

bitflags! {
    /// The set of properties whose values changed since their last commit.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct DirtyProps: u8 {
        /// [`Property::X`] is pending.
        const X = 1 << 0;
        /// [`Property::Y`] is pending.
        const Y = 1 << 1;
        /// [`Property::Width`] is pending.
        const WIDTH = 1 << 2;
        /// [`Property::Height`] is pending.
        const HEIGHT = 1 << 3;
        /// [`Property::Visible`] is pending.
        const VISIBLE = 1 << 4;
    }
}

/// The structural change pending for a node's host element, if any.
///
/// Only the most recent op is kept; a new structural mutation overwrites
/// whatever was pending.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum StructuralOp {
    /// No structural change pending.
    #[default]
    None,
    /// The node's element must be detached from its host parent.
    Removal,
    /// The node's element must be attached under its parent's element.
    Addition,
}

/// The display state committed for [`Property::Visible`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DisplayState {
    /// The element participates in host layout.
    Shown,
    /// The element is removed from host layout.
    Hidden,
}

// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_flags_are_distinct() {
        let mut seen = DirtyProps::empty();
        for property in Property::ALL {
            let flag = property.flag();
            assert!(
                !seen.intersects(flag),
                "flag for {property:?} overlaps another property"
            );
            seen |= flag;
        }
        assert_eq!(seen, DirtyProps::all(), "every flag bit is covered");
    }

    #[test]
    fn commit_order_is_geometry_then_visibility() {
        assert_eq!(
            Property::ALL,
            [
                Property::X,
                Property::Y,
                Property::Width,
                Property::Height,
                Property::Visible,
            ],
            "commit order is part of the host-facing contract"
        );
    }

    #[test]
    fn default_structural_op_is_none() {
        assert_eq!(StructuralOp::default(), StructuralOp::None);
    }

    #[test]
    fn default_dirty_props_is_empty() {
        assert!(DirtyProps::default().is_empty());
    }
}
