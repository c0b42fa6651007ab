//! User entities (permission subjects).

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::node::Node;

/// A permission subject, identified by a stable UUID.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    uuid: Uuid,
    #[serde(default)]
    name: Option<String>,
    /// Stored primary group; `None` means the default group.
    #[serde(default)]
    primary_group: Option<String>,
    #[serde(default)]
    nodes: Vec<Node>,
}

impl Display for User {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match &self.name {
            Some(name) => write!(f, "{} ({})", name, self.uuid),
            None => write!(f, "{}", self.uuid),
        }
    }
}

impl User {
    pub fn new(uuid: Uuid) -> Self {
        User {
            uuid,
            name: None,
            primary_group: None,
            nodes: Vec::new(),
        }
    }

    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_primary_group<S: Into<String>>(mut self, group: S) -> Self {
        self.primary_group = Some(group.into());
        self
    }

    pub fn with_node(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The stored primary group, without falling back to the default group.
    pub fn primary_group(&self) -> Option<&str> {
        self.primary_group.as_deref()
    }

    /// The primary group, or `default_group` when none is stored.
    pub fn primary_group_or<'a>(&'a self, default_group: &'a str) -> &'a str {
        self.primary_group.as_deref().unwrap_or(default_group)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;

    #[test]
    fn test_primary_group_falls_back_to_default() {
        let user = User::new(Uuid::nil());
        assert_eq!(user.primary_group(), None);
        assert_eq!(user.primary_group_or("default"), "default");

        let user = user.with_primary_group("admin");
        assert_eq!(user.primary_group_or("default"), "admin");
    }

    #[test]
    fn test_user_display() {
        let user = User::new(Uuid::nil()).with_name("alice");
        assert_snapshot!(user.to_string(), @"alice (00000000-0000-0000-0000-000000000000)");
        assert_snapshot!(User::new(Uuid::nil()).to_string(), @"00000000-0000-0000-0000-000000000000");
    }

    #[test]
    fn test_user_deserialization() {
        let user: User = serde_json::from_str(
            r#"{"uuid":"6f9619ff-8b86-d011-b42d-00c04fc964ff","nodes":[{"key":"group.admin"}]}"#,
        )
        .unwrap();
        assert_eq!(user.name(), None);
        assert_eq!(user.nodes().len(), 1);
        assert!(user.nodes()[0].is_membership_of("admin"));
    }
}
