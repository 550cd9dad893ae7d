//! Plan introspection: a small node/edge graph rendered as Graphviz DOT.
//!
//! Edges point from a child to the operator that consumes it (the direction
//! tuples flow). A `BufferedSplitter` shared by several consumers shows up
//! once, with one outgoing edge per consumer.

use std::collections::HashMap;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::traits::PlanNode;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanGraph {
    nodes: Vec<String>,
    edges: Vec<(usize, usize)>,
    #[serde(skip)]
    shared: HashMap<usize, usize>,
}

impl PlanGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph for a whole plan.
    pub fn of(plan: &dyn PlanNode) -> Self {
        let mut graph = Self::new();
        plan.explain(&mut graph);
        graph
    }

    /// Add an operator whose children have already been explained.
    pub fn operator(&mut self, label: impl Into<String>, children: &[usize]) -> usize {
        let idx = self.nodes.len();
        self.nodes.push(label.into());
        for &child in children {
            self.edges.push((child, idx));
        }
        idx
    }

    /// Index previously registered for a shared subplan, keyed by its address.
    pub fn shared(&self, key: usize) -> Option<usize> {
        self.shared.get(&key).copied()
    }

    pub fn register_shared(&mut self, key: usize, idx: usize) {
        self.shared.insert(key, idx);
    }

    pub fn labels(&self) -> &[String] {
        &self.nodes
    }

    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph plan {\n  rankdir=BT;\n");
        for (i, label) in self.nodes.iter().enumerate() {
            let escaped = label.replace('\\', "\\\\").replace('"', "\\\"");
            let _ = writeln!(out, "  n{i} [label=\"{escaped}\"];");
        }
        for (from, to) in &self.edges {
            let _ = writeln!(out, "  n{from} -> n{to};");
        }
        out.push_str("}\n");
        out
    }
}
