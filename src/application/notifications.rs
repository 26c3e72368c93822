//! Per-task progress notifications.
//!
//! Each task owns its own slot keyed by [`TaskId`], so concurrent transfers
//! never overwrite each other's visible status. Slots are created when a
//! task is promoted to the foreground and removed when it finishes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::domain::{NotifyError, Progress, TaskId};

/// Title of the ongoing download notification.
pub const DOWNLOAD_TITLE: &str = "Downloading";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub text: String,
    /// `None` hides the bar.
    pub progress: Option<Progress>,
    pub ongoing: bool,
}

impl Notification {
    pub fn starting() -> Self {
        Self {
            title: DOWNLOAD_TITLE.to_string(),
            text: "Starting download...".to_string(),
            progress: None,
            ongoing: true,
        }
    }

    pub fn progress(file_name: &str, progress: Progress) -> Self {
        let text = match progress {
            Progress::Determinate(percent) => format!("Downloading: {} ({}%)", file_name, percent),
            Progress::Indeterminate => format!("Downloading: {}", file_name),
        };
        Self {
            title: DOWNLOAD_TITLE.to_string(),
            text,
            progress: Some(progress),
            ongoing: true,
        }
    }

    pub fn completed(file_name: &str) -> Self {
        Self::finished(format!("Download complete: {}", file_name))
    }

    pub fn failed(file_name: &str) -> Self {
        Self::finished(format!("Download failed: {}", file_name))
    }

    fn finished(text: String) -> Self {
        Self {
            title: DOWNLOAD_TITLE.to_string(),
            text,
            progress: None,
            ongoing: false,
        }
    }
}

/// Presentation side channel for running transfers.
///
/// Failures are reported but never stop a transfer.
pub trait Notifier: Send + Sync {
    /// Create the task's slot and make it visible.
    fn promote_foreground(&self, id: TaskId, notification: Notification)
        -> Result<(), NotifyError>;

    fn update(&self, id: TaskId, notification: Notification) -> Result<(), NotifyError>;

    /// Drop the task's slot. Removing an unknown slot is a no-op.
    fn remove(&self, id: TaskId);
}

/// In-process notification surface, logged through `tracing` and
/// readable by the UI.
#[derive(Clone)]
pub struct NotificationCenter {
    inner: Arc<Mutex<CenterState>>,
}

struct CenterState {
    permitted: bool,
    active: HashMap<TaskId, Notification>,
}

impl NotificationCenter {
    pub fn new(permitted: bool) -> Self {
        Self {
            inner: Arc::new(Mutex::new(CenterState {
                permitted,
                active: HashMap::new(),
            })),
        }
    }

    pub fn get(&self, id: TaskId) -> Option<Notification> {
        self.lock().active.get(&id).cloned()
    }

    pub fn active_count(&self) -> usize {
        self.lock().active.len()
    }

    fn lock(&self) -> MutexGuard<'_, CenterState> {
        // A poisoned map only holds display text
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn post(&self, id: TaskId, notification: Notification) -> Result<(), NotifyError> {
        let mut state = self.lock();
        if !state.permitted {
            return Err(NotifyError::PermissionDenied);
        }
        tracing::debug!(task_id = %id, text = %notification.text, "notification");
        state.active.insert(id, notification);
        Ok(())
    }
}

impl Notifier for NotificationCenter {
    fn promote_foreground(
        &self,
        id: TaskId,
        notification: Notification,
    ) -> Result<(), NotifyError> {
        self.post(id, notification)
            .map_err(|e| NotifyError::ForegroundUnavailable(e.to_string()))
    }

    fn update(&self, id: TaskId, notification: Notification) -> Result<(), NotifyError> {
        self.post(id, notification)
    }

    fn remove(&self, id: TaskId) {
        if self.lock().active.remove(&id).is_some() {
            tracing::debug!(task_id = %id, "notification removed");
        }
    }
}
