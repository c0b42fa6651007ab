//! Rendering of stored state as single-line replay commands.
//!
//! Every command is `<prefix> <subcommand> <args...>` on one line. Arguments
//! that would not survive whitespace splitting are double-quoted with `"`
//! and `\` escaped; arguments containing a line break are rejected, since a
//! command must never span lines.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

use crate::error::ExportError;
use crate::types::{HolderType, Node, NodeKind};

static NEEDS_QUOTING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[\s"\\]"#).expect("quoting regex"));

/// Quote a single argument if it contains whitespace, quotes or backslashes.
pub fn quote_arg(arg: &str) -> Result<Cow<'_, str>, ExportError> {
    if arg.contains(['\n', '\r']) {
        return Err(ExportError::InvalidNode(format!(
            "argument {arg:?} contains a line break"
        )));
    }
    if arg.is_empty() {
        return Ok(Cow::Borrowed("\"\""));
    }
    if !NEEDS_QUOTING.is_match(arg) {
        return Ok(Cow::Borrowed(arg));
    }
    let escaped = arg.replace('\\', "\\\\").replace('"', "\\\"");
    Ok(Cow::Owned(format!("\"{escaped}\"")))
}

/// Builds command lines with a fixed invocation prefix.
#[derive(Debug, Clone)]
pub struct CommandWriter {
    prefix: String,
}

impl CommandWriter {
    pub fn new<S: Into<String>>(prefix: S) -> Self {
        CommandWriter {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn line<'a, I>(&self, args: I) -> Result<String, ExportError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut out = self.prefix.clone();
        for arg in args {
            out.push(' ');
            out.push_str(&quote_arg(arg)?);
        }
        Ok(out)
    }

    pub fn create_group(&self, name: &str) -> Result<String, ExportError> {
        self.line(["creategroup", name])
    }

    pub fn create_track(&self, name: &str) -> Result<String, ExportError> {
        self.line(["createtrack", name])
    }

    pub fn track_append(&self, track: &str, group: &str) -> Result<String, ExportError> {
        self.line(["track", track, "append", group])
    }

    pub fn switch_primary_group(&self, user: Uuid, group: &str) -> Result<String, ExportError> {
        let id = user.to_string();
        self.line(["user", id.as_str(), "switchprimarygroup", group])
    }

    pub fn remove_parent(&self, user: Uuid, group: &str) -> Result<String, ExportError> {
        let id = user.to_string();
        self.line(["user", id.as_str(), "parent", "remove", group])
    }

    /// Render one node held by `holder` as the command that recreates it.
    pub fn node(
        &self,
        node: &Node,
        holder_type: HolderType,
        holder: &str,
    ) -> Result<String, ExportError> {
        let value = node.value().to_string();
        let expiry = node.expiry().map(|e| e.to_string());
        let temporary = expiry.is_some();

        let mut args: Vec<Cow<'_, str>> = vec![holder_type.as_ref().into(), holder.into()];

        // Negated structured nodes go through the generic form so the value survives.
        match (node.kind(), node.value()) {
            (NodeKind::Inheritance { group }, true) => {
                args.push("parent".into());
                args.push(if temporary { "addtemp" } else { "add" }.into());
                args.push(group.into());
            }
            (NodeKind::Prefix { priority, text }, true) => {
                args.push("meta".into());
                args.push(if temporary { "addtempprefix" } else { "addprefix" }.into());
                args.push(priority.to_string().into());
                args.push(text.into());
            }
            (NodeKind::Suffix { priority, text }, true) => {
                args.push("meta".into());
                args.push(if temporary { "addtempsuffix" } else { "addsuffix" }.into());
                args.push(priority.to_string().into());
                args.push(text.into());
            }
            (NodeKind::Meta { key, value }, true) => {
                args.push("meta".into());
                args.push(if temporary { "settemp" } else { "set" }.into());
                args.push(key.into());
                args.push(value.into());
            }
            _ => {
                args.push("permission".into());
                args.push(if temporary { "settemp" } else { "set" }.into());
                args.push(node.key().into());
                args.push(value.as_str().into());
            }
        }

        if let Some(expiry) = &expiry {
            args.push(expiry.as_str().into());
        }

        for (key, value) in node.context() {
            args.push(format!("{key}={value}").into());
        }

        self.line(args.iter().map(|a| a.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yare::parameterized;

    const ALICE: &str = "c5b7a2c4-3f1e-4d55-9a4e-0b1f8a6d2e10";

    #[parameterized(
        plain = { "admin", "admin" },
        empty = { "", "\"\"" },
        space = { "[Admin] ", "\"[Admin] \"" },
        quote = { "say \"hi\"", "\"say \\\"hi\\\"\"" },
        backslash = { "a\\b", "\"a\\\\b\"" },
        tab = { "a\tb", "\"a\tb\"" },
    )]
    fn test_quote_arg(input: &str, expected: &str) {
        assert_eq!(quote_arg(input).unwrap(), expected);
    }

    #[test]
    fn test_quote_arg_rejects_line_breaks() {
        assert!(matches!(
            quote_arg("a\nb"),
            Err(ExportError::InvalidNode(_))
        ));
        assert!(matches!(
            quote_arg("a\rb"),
            Err(ExportError::InvalidNode(_))
        ));
    }

    #[parameterized(
        permission = {
            Node::new("essentials.fly"),
            "/lp group admin permission set essentials.fly true"
        },
        negated_permission = {
            Node::new("essentials.fly").with_value(false),
            "/lp group admin permission set essentials.fly false"
        },
        temporary_permission = {
            Node::new("worldedit.*").with_expiry(1_900_000_000),
            "/lp group admin permission settemp worldedit.* true 1900000000"
        },
        context = {
            Node::new("essentials.fly").with_context("world", "nether").with_context("server", "lobby"),
            "/lp group admin permission set essentials.fly true server=lobby world=nether"
        },
        inheritance = {
            Node::inheritance("mod"),
            "/lp group admin parent add mod"
        },
        temporary_inheritance = {
            Node::inheritance("mod").with_expiry(1_900_000_000).with_context("server", "lobby"),
            "/lp group admin parent addtemp mod 1900000000 server=lobby"
        },
        negated_inheritance = {
            Node::inheritance("mod").with_value(false),
            "/lp group admin permission set group.mod false"
        },
        prefix = {
            Node::new("prefix.100.[Admin] "),
            "/lp group admin meta addprefix 100 \"[Admin] \""
        },
        padded_prefix_priority = {
            Node::new("prefix.007.x"),
            "/lp group admin permission set prefix.007.x true"
        },
        temporary_suffix = {
            Node::new("suffix.5.!").with_expiry(42),
            "/lp group admin meta addtempsuffix 5 ! 42"
        },
        meta = {
            Node::new("meta.color.dark red"),
            "/lp group admin meta set color \"dark red\""
        },
    )]
    fn test_group_node_commands(node: Node, expected: &str) {
        let writer = CommandWriter::new("/lp");
        assert_eq!(writer.node(&node, HolderType::Group, "admin").unwrap(), expected);
    }

    #[test]
    fn test_user_node_command() {
        let writer = CommandWriter::new("/lp");
        let line = writer
            .node(&Node::inheritance("admin"), HolderType::User, ALICE)
            .unwrap();
        assert_eq!(line, format!("/lp user {ALICE} parent add admin"));
    }

    #[test]
    fn test_node_with_line_break_is_rejected() {
        let writer = CommandWriter::new("/lp");
        let result = writer.node(&Node::new("meta.motd.a\nb"), HolderType::Group, "admin");
        assert!(matches!(result, Err(ExportError::InvalidNode(_))));
    }

    #[test]
    fn test_structural_commands() {
        let writer = CommandWriter::new("/perms");
        let user = Uuid::parse_str(ALICE).unwrap();
        assert_eq!(writer.create_group("admin").unwrap(), "/perms creategroup admin");
        assert_eq!(writer.create_track("staff").unwrap(), "/perms createtrack staff");
        assert_eq!(
            writer.track_append("staff", "mod").unwrap(),
            "/perms track staff append mod"
        );
        assert_eq!(
            writer.switch_primary_group(user, "admin").unwrap(),
            format!("/perms user {ALICE} switchprimarygroup admin")
        );
        assert_eq!(
            writer.remove_parent(user, "default").unwrap(),
            format!("/perms user {ALICE} parent remove default")
        );
    }
}
