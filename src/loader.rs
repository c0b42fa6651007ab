use serde::Deserialize;

use crate::error::ExportError;
use crate::memory::MemoryStorage;
use crate::types::{Group, Track, User};

#[derive(Debug, Default, Deserialize)]
struct Snapshot {
    #[serde(default)]
    groups: Vec<Group>,
    #[serde(default)]
    tracks: Vec<Track>,
    #[serde(default)]
    users: Vec<User>,
}

/// Load a JSON snapshot of stored state into a [`MemoryStorage`].
///
/// Any JSON error is mapped into `ExportError::Snapshot`.
///
/// Example:
/// ```rust
/// use permscript::{load_snapshot, Storage};
/// let snapshot = r#"{
///     "groups": [{"name": "default"}, {"name": "admin", "weight": 10}],
///     "tracks": [{"name": "staff", "groups": ["admin"]}]
/// }"#;
/// let storage = load_snapshot(snapshot).unwrap();
/// assert_eq!(storage.groups().unwrap().len(), 2);
/// ```
pub fn load_snapshot(text: &str) -> Result<MemoryStorage, ExportError> {
    let snapshot: Snapshot = serde_json::from_str(text)?;
    let storage = MemoryStorage::new();
    for group in snapshot.groups {
        storage.insert_group(group);
    }
    for track in snapshot.tracks {
        storage.insert_track(track);
    }
    for user in snapshot.users {
        storage.insert_user(user);
    }
    Ok(storage)
}
