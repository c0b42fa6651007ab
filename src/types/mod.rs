//! Data model for the stored permission state.
//!
//! Groups, tracks and users are read-only snapshots handed out by a
//! [`Storage`](crate::traits::Storage) implementation. Permission
//! assignments ([`Node`]) are attached to groups and users and are
//! rendered back into commands by [`crate::command`].

mod group;
mod node;
mod record;
mod track;
mod user;

pub use group::Group;
pub use node::{HolderType, Node, NodeKind};
pub use record::ExportRecord;
pub use track::Track;
pub use user::User;
