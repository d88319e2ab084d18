//! Target window resolution.

use heymic_protocols::host::WindowsHost;
use heymic_protocols::types::{WindowId, WindowInfo};
use parking_lot::Mutex;
use tracing::debug;

/// Remembers the last normal window that had focus.
#[derive(Default)]
pub struct FocusTracker {
    last_normal: Mutex<Option<WindowId>>,
}

impl FocusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a focus change. Popups, devtools and app windows are ignored.
    pub fn record(&self, window: &WindowInfo) {
        if window.is_normal() {
            debug!(window_id = window.id, "normal window focused");
            *self.last_normal.lock() = Some(window.id);
        }
    }

    pub fn forget(&self, window_id: WindowId) {
        let mut last = self.last_normal.lock();
        if *last == Some(window_id) {
            *last = None;
        }
    }

    pub fn last_normal(&self) -> Option<WindowId> {
        *self.last_normal.lock()
    }

    /// Explicit window, else last focused normal window, else the focused
    /// normal window, else the first normal window.
    pub async fn resolve(
        &self,
        windows: &dyn WindowsHost,
        explicit: Option<WindowId>,
    ) -> Option<WindowId> {
        if explicit.is_some() {
            return explicit;
        }
        if let Some(last) = self.last_normal() {
            match windows.get_window(last).await {
                Ok(window) if window.is_normal() => return Some(window.id),
                _ => self.forget(last),
            }
        }
        let normal = match windows.list_normal_windows().await {
            Ok(list) => list,
            Err(e) => {
                debug!(error = %e, "listing windows failed");
                return None;
            }
        };
        normal
            .iter()
            .find(|w| w.focused)
            .or_else(|| normal.first())
            .map(|w| w.id)
    }
}
