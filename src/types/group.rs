//! Group entities.

use serde::{Deserialize, Serialize};

use super::node::Node;

/// A named permission bundle.
///
/// Names are unique case-insensitively; `weight` is an optional ordering
/// hint where higher means more senior.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Group {
    name: String,
    #[serde(default)]
    weight: Option<i32>,
    #[serde(default)]
    nodes: Vec<Node>,
}

impl Group {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Group {
            name: name.into(),
            weight: None,
            nodes: Vec::new(),
        }
    }

    pub fn with_weight(mut self, weight: i32) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn with_node(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn weight(&self) -> Option<i32> {
        self.weight
    }

    /// Weight used for ordering; an absent weight counts as 0.
    pub fn effective_weight(&self) -> i32 {
        self.weight.unwrap_or(0)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}
