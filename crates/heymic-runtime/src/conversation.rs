//! Per-session conversation logs.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use heymic_protocols::types::LogEntry;
use parking_lot::RwLock;

/// Default number of entries kept per session.
pub const DEFAULT_MAX_ENTRIES: usize = 200;

/// Bounded, insertion-ordered log. Once full, every append evicts the oldest entry.
#[derive(Debug, Clone)]
pub struct ConversationLog {
    entries: VecDeque<LogEntry>,
    max_entries: usize,
}

impl ConversationLog {
    pub fn new(max_entries: usize) -> Self {
        let max_entries = max_entries.max(1);
        Self {
            entries: VecDeque::with_capacity(max_entries.min(DEFAULT_MAX_ENTRIES)),
            max_entries,
        }
    }

    pub fn push(&mut self, entry: LogEntry) {
        while self.entries.len() >= self.max_entries {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }
}

impl Default for ConversationLog {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

/// Logs for every live session, keyed by session id.
pub struct ConversationStore {
    logs: Arc<RwLock<HashMap<String, ConversationLog>>>,
    max_entries: usize,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::with_max_entries(DEFAULT_MAX_ENTRIES)
    }

    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            logs: Arc::new(RwLock::new(HashMap::new())),
            max_entries,
        }
    }

    pub fn append(&self, session_id: &str, entry: LogEntry) {
        let mut logs = self.logs.write();
        logs.entry(session_id.to_string())
            .or_insert_with(|| ConversationLog::new(self.max_entries))
            .push(entry);
    }

    /// Entries for a session, oldest first. Unknown sessions have none.
    pub fn entries(&self, session_id: &str) -> Vec<LogEntry> {
        self.logs
            .read()
            .get(session_id)
            .map(ConversationLog::entries)
            .unwrap_or_default()
    }

    pub fn len(&self, session_id: &str) -> usize {
        self.logs.read().get(session_id).map_or(0, ConversationLog::len)
    }

    /// Destroy a session's log.
    pub fn discard(&self, session_id: &str) {
        self.logs.write().remove(session_id);
    }

    pub fn session_count(&self) -> usize {
        self.logs.read().len()
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}
