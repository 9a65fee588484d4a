use std::collections::HashSet;

/// Identities currently flagged online. Mutated by connect/disconnect and by
/// explicit status signals, independently of the connection registry.
#[derive(Debug, Default)]
pub struct OnlineSet {
    users: HashSet<String>,
}

impl OnlineSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_online(&mut self, user: &str) {
        if !self.users.contains(user) {
            self.users.insert(user.to_string());
        }
    }

    pub fn mark_offline(&mut self, user: &str) {
        self.users.remove(user);
    }

    pub fn is_online(&self, user: &str) -> bool {
        self.users.contains(user)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn clear(&mut self) {
        self.users.clear();
    }
}
