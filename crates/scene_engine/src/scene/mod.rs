//! Scene management
//!
//! The scene graph is an ownership tree: every [`Node`] exclusively owns
//! its children, and the [`Scene`] owns the root. One frame is driven by
//! two calls — `Scene::update(delta)` propagates time through the tree,
//! then `Scene::render(...)` acquires a frame-pacer permit, traverses the
//! tree recording draw commands into a single command stream, and commits
//! that stream with a completion callback that returns the permit.

mod node;
mod scene;

pub use node::{Node, NodeAnimator, NodeId};
pub use scene::Scene;

use thiserror::Error;

/// Errors raised by scene-tree structural operations
#[derive(Debug, Error)]
pub enum SceneError {
    /// `remove_child` was asked for a node that is not a direct child
    ///
    /// The tree is left untouched; sibling counts do not change.
    #[error("no direct child with id {0:?}")]
    ChildNotFound(NodeId),
}
