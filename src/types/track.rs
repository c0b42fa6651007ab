//! Tracks: ordered promotion paths of group names.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Track {
    name: String,
    #[serde(default)]
    groups: Vec<String>,
}

impl Track {
    pub fn new<S, I, G>(name: S, groups: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = G>,
        G: Into<String>,
    {
        Track {
            name: name.into(),
            groups: groups.into_iter().map(Into::into).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Member groups in promotion order. May be empty.
    pub fn groups(&self) -> &[String] {
        &self.groups
    }
}
