use std::collections::HashSet;

use uuid::Uuid;

use crate::error::ExportError;
use crate::types::{Group, Track, User};

/// Read access to the stored permission state.
///
/// Implementations must tolerate concurrent calls to [`load_user`](Self::load_user)
/// and [`release_user`](Self::release_user) from many worker threads; the
/// exporter calls the remaining methods once per job from the driving thread.
pub trait Storage: Send + Sync {
    /// Every user identifier known to storage. May be a long-running scan.
    fn unique_users(&self) -> Result<HashSet<Uuid>, ExportError>;

    /// Load one user. May block on I/O.
    fn load_user(&self, uuid: Uuid) -> Result<User, ExportError>;

    /// Release whatever loading `user` cached. Called once per exported user.
    fn release_user(&self, _user: &User) {
        // Default: nothing cached
    }

    /// All groups, in any order.
    fn groups(&self) -> Result<Vec<Group>, ExportError>;

    /// All tracks, in storage enumeration order.
    fn tracks(&self) -> Result<Vec<Track>, ExportError>;
}

/// A listener for human-readable progress and result messages.
pub trait Observer: Send + Sync {
    fn notify(&self, message: &str);
}
