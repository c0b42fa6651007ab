//! Permission assignments ("nodes") attached to groups and users.
//!
//! A node is stored as a flat key plus value, optional expiry and context.
//! Some keys carry structure: `group.<name>` is an inheritance
//! (parent) assignment, `prefix.<priority>.<text>` / `suffix.<priority>.<text>`
//! are chat meta, and `meta.<key>.<value>` is a free-form meta pair.
//! [`NodeKind`] exposes that structure without changing the stored form.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

static INHERITANCE_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)^group\.(.+)$").expect("inheritance key regex"));

static CHAT_META_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)^(prefix|suffix)\.(-?\d+)\.(.*)$").expect("chat meta key regex")
});

static META_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)^meta\.([^.]+)\.(.*)$").expect("meta key regex"));

/// The kind of entity a node is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum HolderType {
    Group,
    User,
}

/// Structural view of a node key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind<'a> {
    Permission,
    Inheritance { group: &'a str },
    Prefix { priority: i32, text: &'a str },
    Suffix { priority: i32, text: &'a str },
    Meta { key: &'a str, value: &'a str },
}

fn default_value() -> bool {
    true
}

/// One granted or denied permission entry.
///
/// Context and expiry are opaque to the exporter; they are re-serialized
/// verbatim into the command for the node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Node {
    key: String,
    #[serde(default = "default_value")]
    value: bool,
    /// Unix timestamp (seconds) after which the node no longer applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expiry: Option<i64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    context: BTreeMap<String, String>,
}

impl Node {
    pub fn new<S: Into<String>>(key: S) -> Self {
        Node {
            key: key.into(),
            value: true,
            expiry: None,
            context: BTreeMap::new(),
        }
    }

    /// Shorthand for a `group.<name>` inheritance node.
    pub fn inheritance<S: AsRef<str>>(group: S) -> Self {
        Node::new(format!("group.{}", group.as_ref()))
    }

    pub fn with_value(mut self, value: bool) -> Self {
        self.value = value;
        self
    }

    pub fn with_expiry(mut self, expiry: i64) -> Self {
        self.expiry = Some(expiry);
        self
    }

    pub fn with_context<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> bool {
        self.value
    }

    pub fn expiry(&self) -> Option<i64> {
        self.expiry
    }

    pub fn is_temporary(&self) -> bool {
        self.expiry.is_some()
    }

    pub fn context(&self) -> &BTreeMap<String, String> {
        &self.context
    }

    pub fn kind(&self) -> NodeKind<'_> {
        if let Some(caps) = INHERITANCE_KEY.captures(&self.key) {
            if let Some(group) = caps.get(1) {
                return NodeKind::Inheritance {
                    group: group.as_str(),
                };
            }
        }

        if let Some(caps) = CHAT_META_KEY.captures(&self.key) {
            // Only canonical integers, so the key survives replay unchanged.
            let priority = caps.get(2).and_then(|p| {
                p.as_str()
                    .parse::<i32>()
                    .ok()
                    .filter(|n| n.to_string() == p.as_str())
            });
            if let (Some(kind), Some(priority), Some(text)) = (caps.get(1), priority, caps.get(3)) {
                let text = text.as_str();
                return if kind.as_str().eq_ignore_ascii_case("prefix") {
                    NodeKind::Prefix { priority, text }
                } else {
                    NodeKind::Suffix { priority, text }
                };
            }
        }

        if let Some(caps) = META_KEY.captures(&self.key) {
            if let (Some(key), Some(value)) = (caps.get(1), caps.get(2)) {
                return NodeKind::Meta {
                    key: key.as_str(),
                    value: value.as_str(),
                };
            }
        }

        NodeKind::Permission
    }

    /// The inherited group name, if this is an inheritance node.
    pub fn group_name(&self) -> Option<&str> {
        match self.kind() {
            NodeKind::Inheritance { group } => Some(group),
            _ => None,
        }
    }

    /// True when this node grants membership of `group` (case-insensitive).
    pub fn is_membership_of(&self, group: &str) -> bool {
        self.group_name()
            .is_some_and(|name| name.eq_ignore_ascii_case(group))
    }
}
