// Copyright 2026 the Fresco Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! View tree data model.
//!
//! A *view* is a node in a retained rendering tree. Each view has:
//!
//! - An identity ([`ViewId`]) — a generational handle that becomes stale
//!   when the view is destroyed, preventing use-after-free bugs at the
//!   API level.
//! - Topology — parent, first-child, and sibling links forming an ordered
//!   tree. Insertion order is painting order; hit-testing runs through it
//!   in reverse.
//! - An optional string **key** identifying its position among siblings
//!   for stable replace/update. Key uniqueness is per sibling set and is
//!   backed by a per-parent lookup map; the ordered sibling list stays
//!   authoritative and the map is maintained by the same operations that
//!   mutate the list.
//! - A [`ViewFlags`](crate::flags::ViewFlags) word of needs/structural
//!   bits, a parent-assigned **frame**, self-reported **own bounds**, a
//!   structural [`ViewRole`], an optional [`ViewHooks`] table, observers,
//!   and event listeners.
//!
//! Views are created detached, attached with
//! [`append_child`](ViewTree::append_child) /
//! [`prepend_child`](ViewTree::prepend_child) /
//! [`insert_before`](ViewTree::insert_before) /
//! [`replace_child`](ViewTree::replace_child) (which mounts the subtree
//! if the parent is mounted), and detached with
//! [`remove_from_parent`](ViewTree::remove_from_parent) (which unmounts
//! and resets all flags). Exactly one parent owns a child at a time.

mod hooks;
mod id;
mod traverse;
mod tree;

pub use hooks::{
    CascadeError, CascadeResult, CascadeStage, DISPLAY_STAGES, HitBounds, HookBox,
    PROCESS_STAGES, ViewHooks, ViewObserver, ViewRole,
};
pub use id::{INVALID, ViewId};
pub use traverse::{Children, ChildrenRev};
pub use tree::ViewTree;
