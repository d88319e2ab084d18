//! Per-tab session identity.
//!
//! A session is the anchor for exactly one conversation log. Navigations mint
//! a new session in place; a replaced tab gets a brand-new session under its
//! new identity while the old one is discarded with its log.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use heymic_core::EventBus;
use heymic_protocols::message::BroadcastEvent;
use heymic_protocols::types::{LogEntry, TabId};
use parking_lot::RwLock;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::conversation::ConversationStore;

/// Session data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub session_id: String,
    pub tab_id: TabId,
    pub url: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Strictly increasing across every session the manager has issued.
    pub generation: u64,
}

/// Session manager.
pub struct SessionManager {
    sessions: Arc<RwLock<HashMap<TabId, SessionRecord>>>,
    conversation: ConversationStore,
    events: EventBus,
    generation: AtomicU64,
}

impl SessionManager {
    pub fn new(conversation: ConversationStore, events: EventBus) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            conversation,
            events,
            generation: AtomicU64::new(0),
        }
    }

    fn mint(&self, tab_id: TabId, url: Option<String>, previous: Option<&str>) -> SessionRecord {
        let mut session_id = Uuid::new_v4().to_string();
        while Some(session_id.as_str()) == previous {
            session_id = Uuid::new_v4().to_string();
        }
        SessionRecord {
            session_id,
            tab_id,
            url,
            created_at: Utc::now(),
            generation: self.generation.fetch_add(1, Ordering::Relaxed) + 1,
        }
    }

    pub fn get(&self, tab_id: TabId) -> Option<SessionRecord> {
        self.sessions.read().get(&tab_id).cloned()
    }

    /// Existing session for the tab, or a new one opened against `best_url`.
    pub fn get_or_create(&self, tab_id: TabId, best_url: Option<&str>) -> SessionRecord {
        let mut sessions = self.sessions.write();
        if let Some(existing) = sessions.get(&tab_id) {
            return existing.clone();
        }
        let record = self.mint(tab_id, best_url.map(str::to_string), None);
        debug!(tab_id, session_id = %record.session_id, "session created");
        sessions.insert(tab_id, record.clone());
        record
    }

    /// Replace the tab's session with a fresh one and drop the old log.
    ///
    /// Without `new_url` the previous session's address carries over.
    pub fn reset(&self, tab_id: TabId, new_url: Option<&str>) -> SessionRecord {
        let (previous, record) = {
            let mut sessions = self.sessions.write();
            let previous = sessions.get(&tab_id).cloned();
            let url = new_url
                .map(str::to_string)
                .or_else(|| previous.as_ref().and_then(|p| p.url.clone()));
            let record = self.mint(
                tab_id,
                url,
                previous.as_ref().map(|p| p.session_id.as_str()),
            );
            sessions.insert(tab_id, record.clone());
            (previous, record)
        };

        if let Some(previous) = &previous {
            self.conversation.discard(&previous.session_id);
        }
        debug!(
            tab_id,
            session_id = %record.session_id,
            previous = ?previous.as_ref().map(|p| &p.session_id),
            "session reset"
        );
        self.events.publish(BroadcastEvent::TabSessionReset {
            tab_id,
            session_id: record.session_id.clone(),
            previous_session_id: previous.map(|p| p.session_id),
            url: record.url.clone(),
        });
        record
    }

    /// Update the address of an existing session. The session id is kept.
    pub fn refresh_url(&self, tab_id: TabId, url: Option<&str>) -> Option<SessionRecord> {
        let mut sessions = self.sessions.write();
        let record = sessions.get_mut(&tab_id)?;
        if let Some(url) = url {
            record.url = Some(url.to_string());
        }
        Some(record.clone())
    }

    /// Drop the tab's session and its log.
    pub fn discard(&self, tab_id: TabId) -> Option<SessionRecord> {
        let removed = self.sessions.write().remove(&tab_id)?;
        self.conversation.discard(&removed.session_id);
        debug!(tab_id, session_id = %removed.session_id, "session discarded");
        Some(removed)
    }

    /// Append to the tab's current log, opening a session if needed.
    pub fn append(&self, tab_id: TabId, best_url: Option<&str>, entry: LogEntry) -> SessionRecord {
        let session = self.get_or_create(tab_id, best_url);
        self.conversation.append(&session.session_id, entry);
        session
    }

    /// The tab's current log, oldest first.
    pub fn log(&self, tab_id: TabId) -> Vec<LogEntry> {
        self.get(tab_id)
            .map(|s| self.conversation.entries(&s.session_id))
            .unwrap_or_default()
    }

    pub fn conversation(&self) -> &ConversationStore {
        &self.conversation
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
