//! Creating element subtrees from parsed documents.
//!
//! Each node whose name is registered in an [`InflaterRegistry`] becomes an
//! element. Common properties are applied by the tree, then the behavior's
//! [`on_inflate`](crate::element::ElementBehavior::on_inflate) reads its own.

mod reader;
mod registry;

use std::io;

pub use registry::InflaterRegistry;

use crate::element::ElementId;
use crate::parser::Node;
use crate::value::ValueType;

/// Errors from loading a document into a tree.
#[derive(Debug, thiserror::Error)]
pub enum InflateError {
    #[error("could not read document: {0}")]
    Io(#[from] io::Error),
    #[error("inflate target is not in the tree")]
    InvalidTarget,
}

/// What a behavior sees while it is inflated.
#[derive(Debug, Clone, Copy)]
pub struct InflateInfo<'a> {
    /// The node the element is created from. Properties are its children.
    pub node: &'a Node,
    /// How `value` and `connection` are interpreted for this element type.
    pub sync_type: ValueType,
    /// The element the new one will be added to.
    pub target: ElementId,
}
