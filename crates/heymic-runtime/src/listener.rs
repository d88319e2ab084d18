//! Page-side listener plumbing.
//!
//! Everything here is best-effort: a tab may have no listener (restricted,
//! not loaded yet, or closed). The in-process flags stay authoritative.

use std::sync::Arc;

use heymic_protocols::host::{ActionHost, ScriptingHost, TabsHost};
use heymic_protocols::message::PageCommand;
use heymic_protocols::types::TabId;

use crate::host_call::best_effort;

#[derive(Clone)]
pub struct PageBridge {
    tabs: Arc<dyn TabsHost>,
    scripting: Arc<dyn ScriptingHost>,
    action: Arc<dyn ActionHost>,
    scripts: Vec<String>,
}

impl PageBridge {
    pub fn new(
        tabs: Arc<dyn TabsHost>,
        scripting: Arc<dyn ScriptingHost>,
        action: Arc<dyn ActionHost>,
        scripts: Vec<String>,
    ) -> Self {
        Self {
            tabs,
            scripting,
            action,
            scripts,
        }
    }

    /// Inject the listener scripts. Returns whether injection succeeded.
    pub async fn inject(&self, tab_id: TabId) -> bool {
        if self.scripts.is_empty() {
            return false;
        }
        best_effort(
            "scripting.executeScript",
            self.scripting.inject_scripts(tab_id, &self.scripts),
        )
        .await
    }

    pub async fn signal(&self, tab_id: TabId, command: PageCommand) -> bool {
        best_effort("tabs.sendMessage", self.tabs.send_to_tab(tab_id, command)).await
    }

    pub async fn badge(&self, tab_id: TabId, enabled: bool) {
        best_effort("action.setBadgeText", self.action.set_badge(tab_id, enabled)).await;
    }

    pub fn scripts(&self) -> &[String] {
        &self.scripts
    }
}
