//! Per-node renderer overrides
//!
//! Every renderer looks up each node's kind in an [`Overrides`] table before using its built-in
//! output. An override receives the node and a [`Render`] handle that renders any other node the
//! usual way (overrides included), so it can wrap or replace a node's output without
//! reimplementing its children.

use crate::ast::{Node, NodeKind};
use crate::error::Result;
use std::collections::HashMap;

/// Renders one node to text in the current output format
pub trait Render {
    fn render(&mut self, node: &Node) -> Result<String>;

    /// Render each node and concatenate the results
    fn render_all(&mut self, nodes: &[Node]) -> Result<String> {
        let mut out = String::new();
        for node in nodes {
            out.push_str(&self.render(node)?);
        }
        Ok(out)
    }
}

pub type NodeRenderer = Box<dyn Fn(&Node, &mut dyn Render) -> Result<String> + Send + Sync>;

/// Replacement renderers keyed by node kind
#[derive(Default)]
pub struct Overrides {
    renderers: HashMap<NodeKind, NodeRenderer>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the renderer for every node of `kind`
    pub fn with<F>(mut self, kind: NodeKind, renderer: F) -> Self
    where
        F: Fn(&Node, &mut dyn Render) -> Result<String> + Send + Sync + 'static,
    {
        self.renderers.insert(kind, Box::new(renderer));
        self
    }

    pub fn get(&self, kind: NodeKind) -> Option<&NodeRenderer> {
        self.renderers.get(&kind)
    }

    pub fn is_empty(&self) -> bool {
        self.renderers.is_empty()
    }
}
