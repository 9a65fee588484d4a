use std::sync::{Mutex, MutexGuard};

use internhub_core::error::Result;
use internhub_core::protocol::{names, OutboundEvent, UserStatus};

use crate::realtime::core::{ConnectionRegistry, OnlineSet, SessionTable};
use crate::realtime::types::{ConnId, Connection, Delivery};

/// Point-in-time hub sizes (for metrics and readiness).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HubStats {
    pub sessions: usize,
    pub registered: usize,
    pub online: usize,
}

/// What a disconnect did to presence state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Departure {
    /// Session had no identity; nothing beyond detaching.
    Anonymous,
    /// Identity deregistered, marked offline and broadcast.
    Evicted(Delivery),
    /// Stale-disconnect guard: the registry entry no longer belonged to this
    /// connection, so presence was left alone.
    Superseded,
}

struct HubState {
    sessions: SessionTable,
    registry: ConnectionRegistry,
    online: OnlineSet,
}

impl HubState {
    fn broadcast(&self, out: &OutboundEvent) -> Delivery {
        let mut d = Delivery::default();
        for conn in self.sessions.iter() {
            d.record(conn.try_push(out));
        }
        d
    }
}

/// Live sessions, connection registry and online set behind one lock.
///
/// Every operation runs its mutation and the resulting fan-out inside the same
/// critical section with non-blocking sends, so no client can observe a status
/// event before the state it describes, and the lock is never held across an
/// `.await`.
pub struct PresenceHub {
    state: Mutex<HubState>,
}

impl Default for PresenceHub {
    fn default() -> Self {
        Self::new()
    }
}

impl PresenceHub {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(HubState {
                sessions: SessionTable::new(),
                registry: ConnectionRegistry::new(),
                online: OnlineSet::new(),
            }),
        }
    }

    // The guarded data is plain maps, always consistent between statements,
    // so a poisoned lock is safe to keep using.
    fn lock(&self) -> MutexGuard<'_, HubState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add a session to the broadcast audience (`Unidentified`).
    pub fn attach(&self, conn: Connection) {
        self.lock().sessions.insert(conn);
    }

    /// Bind `user` to `conn`: register, mark online, broadcast online.
    pub fn identify(&self, conn: ConnId, user: &str) -> Result<Delivery> {
        let out = status_event(user, true)?;
        let mut st = self.lock();
        if let Some(prev) = st.registry.register(user, conn) {
            if prev != conn {
                tracing::debug!(user_id = %user, conn_id = %conn, replaced = %prev, "registry entry overwritten");
            }
        }
        st.online.mark_online(user);
        Ok(st.broadcast(&out))
    }

    /// Explicit online/offline signal: update the online set and broadcast.
    /// Does not touch the registry.
    pub fn set_status(&self, user: &str, is_online: bool) -> Result<Delivery> {
        let out = status_event(user, is_online)?;
        let mut st = self.lock();
        if is_online {
            st.online.mark_online(user);
        } else {
            st.online.mark_offline(user);
        }
        Ok(st.broadcast(&out))
    }

    /// Reply to a status query: one `user:status` per identity, in request
    /// order, to the requesting session only.
    pub fn report_statuses(&self, requester: ConnId, users: &[String]) -> Result<Delivery> {
        let st = self.lock();
        let mut d = Delivery::default();
        let Some(conn) = st.sessions.get(requester) else {
            return Ok(d);
        };
        for user in users {
            let out = status_event(user, st.online.is_online(user))?;
            d.record(conn.try_push(&out));
        }
        Ok(d)
    }

    /// Resolve a relay target. The returned handle is a snapshot taken at the
    /// moment of the lookup.
    pub fn route(&self, user: &str) -> Option<Connection> {
        let st = self.lock();
        let id = st.registry.lookup(user)?;
        st.sessions.get(id).cloned()
    }

    /// Remove a session. If it was bound to `identity`, deregister, mark
    /// offline and broadcast, unless `guard_stale` is set and the registry
    /// entry now belongs to a different connection.
    pub fn detach(&self, conn: ConnId, identity: Option<&str>, guard_stale: bool) -> Result<Departure> {
        let Some(user) = identity else {
            self.lock().sessions.remove(conn);
            return Ok(Departure::Anonymous);
        };

        let out = status_event(user, false)?;
        let mut st = self.lock();
        st.sessions.remove(conn);

        if guard_stale {
            if !st.registry.deregister_if(user, conn) {
                return Ok(Departure::Superseded);
            }
        } else {
            st.registry.deregister(user);
        }
        st.online.mark_offline(user);
        Ok(Departure::Evicted(st.broadcast(&out)))
    }

    pub fn lookup(&self, user: &str) -> Option<ConnId> {
        self.lock().registry.lookup(user)
    }

    pub fn is_online(&self, user: &str) -> bool {
        self.lock().online.is_online(user)
    }

    pub fn stats(&self) -> HubStats {
        let st = self.lock();
        HubStats {
            sessions: st.sessions.len(),
            registered: st.registry.len(),
            online: st.online.len(),
        }
    }

    /// Drop all state (process teardown).
    pub fn clear(&self) {
        let mut st = self.lock();
        st.sessions.clear();
        st.registry.clear();
        st.online.clear();
    }
}

fn status_event(user: &str, is_online: bool) -> Result<OutboundEvent> {
    OutboundEvent::new(names::USER_STATUS, &UserStatus::new(user, is_online))
}
