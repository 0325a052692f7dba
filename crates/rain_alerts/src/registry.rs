//! Session registry: active conversations and their alert jobs.
//!
//! Entries are keyed by conversation. Replacing an entry happens under the
//! `DashMap` shard lock, so concurrent starts for one conversation always
//! leave exactly one live entry. Tick gates are kept apart from the entries
//! and outlive them: a job's in-flight tick still holds its gate after the
//! entry is gone, and whichever job comes next waits on the same gate.

use std::sync::Arc;

use common::{ConversationId, Location};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::state::AlertState;
use crate::timer::JobHandle;

/// Everything the bot holds for one registered conversation.
#[derive(Debug, Clone)]
pub struct SessionEntry {
    pub location: Location,
    pub state: Arc<Mutex<AlertState>>,
    pub job: JobHandle,
}

#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    entries: Arc<DashMap<ConversationId, SessionEntry>>,
    tick_gates: Arc<DashMap<ConversationId, Arc<Mutex<()>>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build and store a new entry while holding the conversation's shard
    /// lock, returning the entry it displaced. `make` must not touch the
    /// registry.
    pub fn replace_with<F>(&self, conversation: ConversationId, make: F) -> Option<SessionEntry>
    where
        F: FnOnce() -> SessionEntry,
    {
        match self.entries.entry(conversation) {
            Entry::Occupied(mut slot) => Some(slot.insert(make())),
            Entry::Vacant(slot) => {
                slot.insert(make());
                None
            }
        }
    }

    pub fn remove(&self, conversation: ConversationId) -> Option<SessionEntry> {
        self.entries.remove(&conversation).map(|(_, entry)| entry)
    }

    pub fn location(&self, conversation: ConversationId) -> Option<Location> {
        self.entries.get(&conversation).map(|e| e.location)
    }

    /// Snapshot of the conversation's alert flags.
    pub async fn alert_state(&self, conversation: ConversationId) -> Option<AlertState> {
        let state = self.entries.get(&conversation).map(|e| e.state.clone())?;
        let snapshot = *state.lock().await;
        Some(snapshot)
    }

    /// The conversation's tick gate, created on first use. Every job ever
    /// scheduled for the conversation shares it, across stops and restarts.
    pub fn tick_gate(&self, conversation: ConversationId) -> Arc<Mutex<()>> {
        self.tick_gates
            .entry(conversation)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    pub fn contains(&self, conversation: ConversationId) -> bool {
        self.entries.contains_key(&conversation)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn conversations(&self) -> Vec<ConversationId> {
        self.entries.iter().map(|e| *e.key()).collect()
    }
}
