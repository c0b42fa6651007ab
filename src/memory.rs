//! In-memory storage.
//!
//! Backs snapshot-based exports and tests. Loading a user marks it as
//! cached until [`Storage::release_user`] is called, mirroring a storage
//! layer that keeps loaded users in memory; the load/release counters let
//! callers check that every loaded user was released exactly once.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::RwLock;
use tracing::warn;
use uuid::Uuid;

use crate::error::ExportError;
use crate::traits::Storage;
use crate::types::{Group, Track, User};

#[derive(Debug, Default)]
pub struct MemoryStorage {
    /// Keyed by lowercase name.
    groups: RwLock<HashMap<String, Group>>,
    /// Insertion order is enumeration order.
    tracks: RwLock<Vec<Track>>,
    users: RwLock<HashMap<Uuid, User>>,
    cached: RwLock<HashSet<Uuid>>,
    failing: RwLock<HashSet<Uuid>>,
    load_delay: RwLock<Option<Duration>>,
    loads: AtomicUsize,
    releases: AtomicUsize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a group. Names collide case-insensitively.
    pub fn insert_group(&self, group: Group) {
        self.groups
            .write()
            .insert(group.name().to_lowercase(), group);
    }

    /// Insert a track, replacing any track of the same name in place.
    pub fn insert_track(&self, track: Track) {
        let mut tracks = self.tracks.write();
        match tracks.iter_mut().find(|t| t.name() == track.name()) {
            Some(existing) => *existing = track,
            None => tracks.push(track),
        }
    }

    pub fn insert_user(&self, user: User) {
        self.users.write().insert(user.uuid(), user);
    }

    /// Make every subsequent load of `uuid` fail with a storage error.
    pub fn fail_on_load(&self, uuid: Uuid) {
        self.failing.write().insert(uuid);
    }

    /// Delay every user load, simulating slow backend reads.
    pub fn set_load_delay(&self, delay: Duration) {
        *self.load_delay.write() = Some(delay);
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }

    pub fn release_count(&self) -> usize {
        self.releases.load(Ordering::Relaxed)
    }

    /// Users loaded but not yet released.
    pub fn cached_users(&self) -> usize {
        self.cached.read().len()
    }
}

impl Storage for MemoryStorage {
    fn unique_users(&self) -> Result<HashSet<Uuid>, ExportError> {
        Ok(self.users.read().keys().copied().collect())
    }

    fn load_user(&self, uuid: Uuid) -> Result<User, ExportError> {
        if let Some(delay) = *self.load_delay.read() {
            std::thread::sleep(delay);
        }
        if self.failing.read().contains(&uuid) {
            return Err(ExportError::Storage(format!("failed to load user {uuid}")));
        }

        let user = self
            .users
            .read()
            .get(&uuid)
            .cloned()
            .ok_or(ExportError::UserNotFound(uuid))?;

        self.loads.fetch_add(1, Ordering::Relaxed);
        self.cached.write().insert(uuid);
        Ok(user)
    }

    fn release_user(&self, user: &User) {
        if !self.cached.write().remove(&user.uuid()) {
            warn!(event = "Storage", phase = "Release", user = %user.uuid(), "user was not cached");
            return;
        }
        self.releases.fetch_add(1, Ordering::Relaxed);
    }

    fn groups(&self) -> Result<Vec<Group>, ExportError> {
        Ok(self.groups.read().values().cloned().collect())
    }

    fn tracks(&self) -> Result<Vec<Track>, ExportError> {
        Ok(self.tracks.read().clone())
    }
}
