//! Error types for Lattice ARIA.

use thiserror::Error;

use crate::dom::NodeId;

/// Errors raised by the behaviors.
///
/// Integration-contract violations (the host rendered or attached nodes
/// incorrectly) are reported through this type right before the behavior
/// panics, since accessibility guarantees cannot be upheld past that point.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AriaError {
    /// A focused item has no attached node, or its node has an empty id.
    #[error("focused item {item:?} has no attached node with a non-empty id")]
    MissingItemId {
        /// Display string of the offending item.
        item: String,
    },
}

/// Errors raised by document implementations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    /// The node does not belong to this document.
    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),

    /// Appending would make a node its own ancestor.
    #[error("cannot append {child:?} under its own descendant {parent:?}")]
    HierarchyCycle {
        /// The node that was being appended.
        child: NodeId,
        /// The requested parent.
        parent: NodeId,
    },
}
