use std::collections::HashMap;

use crate::realtime::types::ConnId;

/// Identity -> live connection. At most one entry per identity; the last
/// registration wins.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    by_user: HashMap<String, ConnId>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unconditionally overwrite any existing mapping. Returns the replaced id.
    pub fn register(&mut self, user: &str, conn: ConnId) -> Option<ConnId> {
        self.by_user.insert(user.to_string(), conn)
    }

    pub fn lookup(&self, user: &str) -> Option<ConnId> {
        self.by_user.get(user).copied()
    }

    /// Remove the mapping if present. Returns the removed id.
    pub fn deregister(&mut self, user: &str) -> Option<ConnId> {
        self.by_user.remove(user)
    }

    /// Remove the mapping only if it still points at `conn`.
    pub fn deregister_if(&mut self, user: &str, conn: ConnId) -> bool {
        if self.lookup(user) == Some(conn) {
            self.by_user.remove(user);
            true
        } else {
            false
        }
    }

    pub fn len(&self) -> usize {
        self.by_user.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_user.is_empty()
    }

    pub fn clear(&mut self) {
        self.by_user.clear();
    }
}
