//! Canonical problem tree
//!
//! Every parser produces a [`Node`] tree and every renderer consumes one. Trees are built only
//! through [`Node::add_child`] (or the constructors that call it), so the allowed-child tables in
//! [`NodeKind`] hold for any tree that exists.

mod kind;
mod node;
mod treeviz;

pub use kind::NodeKind;
pub use node::{Children, Descendants, Node};
