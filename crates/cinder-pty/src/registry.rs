use std::collections::HashMap;

use crate::channel::ChannelId;
use crate::session::Session;

/// Authoritative `channel -> session` map.
///
/// The registry never kills anything. Entries it hands back (replaced or
/// removed) are the caller's to dispose; dropping them disposes them too.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: HashMap<ChannelId, Session>,
}

impl SessionRegistry {
    /// Create a new, empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `session` under `channel_id`, returning whatever was there before.
    pub fn put(&mut self, channel_id: &str, session: Session) -> Option<Session> {
        self.sessions.insert(channel_id.to_string(), session)
    }

    pub fn get(&self, channel_id: &str) -> Option<&Session> {
        self.sessions.get(channel_id)
    }

    pub fn get_mut(&mut self, channel_id: &str) -> Option<&mut Session> {
        self.sessions.get_mut(channel_id)
    }

    pub fn remove(&mut self, channel_id: &str) -> Option<Session> {
        self.sessions.remove(channel_id)
    }

    pub fn contains(&self, channel_id: &str) -> bool {
        self.sessions.contains_key(channel_id)
    }

    pub fn for_each<F>(&mut self, mut f: F)
    where
        F: FnMut(&str, &mut Session),
    {
        for (channel_id, session) in self.sessions.iter_mut() {
            f(channel_id, session);
        }
    }

    /// Remove and return every entry.
    pub fn drain(&mut self) -> Vec<(ChannelId, Session)> {
        self.sessions.drain().collect()
    }

    /// All channel ids with a session, sorted.
    pub fn channel_ids(&self) -> Vec<ChannelId> {
        let mut ids: Vec<ChannelId> = self.sessions.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
