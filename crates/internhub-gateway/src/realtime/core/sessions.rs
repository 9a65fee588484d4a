use std::collections::HashMap;

use crate::realtime::types::{ConnId, Connection};

/// Every live session, identified or not. Broadcast audience.
#[derive(Debug, Default)]
pub struct SessionTable {
    sessions: HashMap<ConnId, Connection>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, conn: Connection) {
        self.sessions.insert(conn.id(), conn);
    }

    pub fn remove(&mut self, id: ConnId) -> Option<Connection> {
        self.sessions.remove(&id)
    }

    pub fn get(&self, id: ConnId) -> Option<&Connection> {
        self.sessions.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Connection> {
        self.sessions.values()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn clear(&mut self) {
        self.sessions.clear();
    }
}
