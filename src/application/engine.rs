//! Task execution engine.
//!
//! [`TaskExecutionPort`] is the only thing the submitter and the UI see of
//! background work. [`TaskEngine`] implements it in-process: every task runs
//! as its own future on a tokio runtime with its own cancellation token and
//! a pair of `watch` channels for state and progress. Watch channels keep
//! only the latest value, which is exactly what observers are promised.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::{Map, Value};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::notifications::Notifier;
use super::transfer::{run_transfer, TransferContext, TransferOutcome};
use crate::api::ResourceFetcher;
use crate::domain::{
    DownloadRequest, Progress, SubmitError, TaskId, TaskInfo, TaskOutcome, TaskResult, TaskState,
};

pub trait TaskExecutionPort: Send + Sync {
    /// Enqueue a download. Every call creates a new, independent task.
    fn submit(&self, request: DownloadRequest, tags: &[&str]) -> Result<TaskId, SubmitError>;

    fn observe_state(&self, id: TaskId) -> Option<watch::Receiver<TaskState>>;

    fn observe_progress(&self, id: TaskId) -> Option<watch::Receiver<Progress>>;

    /// Request cancellation. Returns `false` for unknown or finished tasks.
    fn cancel(&self, id: TaskId) -> bool;

    /// Snapshot of all tasks carrying `tag`, oldest first.
    fn tasks_by_tag(&self, tag: &str) -> Vec<TaskInfo>;

    fn result(&self, id: TaskId) -> Option<TaskResult>;

    /// Forget finished tasks and their results. Returns how many were removed.
    fn clear_finished(&self) -> usize;
}

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub download_dir: PathBuf,
    pub chunk_size: usize,
}

#[derive(Clone)]
pub struct TaskEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    runtime: Handle,
    settings: EngineSettings,
    fetcher: Arc<dyn ResourceFetcher>,
    notifier: Arc<dyn Notifier>,
    closed: AtomicBool,
    tasks: Mutex<Registry>,
}

#[derive(Default)]
struct Registry {
    next_seq: u64,
    entries: HashMap<TaskId, TaskEntry>,
}

struct TaskEntry {
    seq: u64,
    tags: Vec<String>,
    state: watch::Sender<TaskState>,
    progress: watch::Sender<Progress>,
    cancel: CancellationToken,
    result: Option<TaskResult>,
}

impl TaskEntry {
    fn info(&self, id: TaskId) -> TaskInfo {
        TaskInfo {
            id,
            state: *self.state.borrow(),
            progress: *self.progress.borrow(),
            result: self.result.clone(),
        }
    }
}

impl TaskEngine {
    pub fn new(
        runtime: Handle,
        settings: EngineSettings,
        fetcher: Arc<dyn ResourceFetcher>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                runtime,
                settings,
                fetcher,
                notifier,
                closed: AtomicBool::new(false),
                tasks: Mutex::new(Registry::default()),
            }),
        }
    }

    /// Stop accepting work and cancel everything still in flight.
    pub fn shutdown(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        let registry = self.inner.lock();
        for entry in registry.entries.values() {
            if !entry.state.borrow().is_finished() {
                entry.cancel.cancel();
            }
        }
        tracing::info!("task engine shut down");
    }
}

impl EngineInner {
    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.tasks.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Apply a forward transition. Returns `false` if the task is gone or
    /// the transition is not allowed from its current state.
    fn transition(&self, id: TaskId, next: TaskState) -> bool {
        let mut registry = self.lock();
        let Some(entry) = registry.entries.get_mut(&id) else {
            return false;
        };
        Self::apply(entry, next, None)
    }

    fn finish(&self, id: TaskId, outcome: TaskOutcome) {
        let mut registry = self.lock();
        if let Some(entry) = registry.entries.get_mut(&id) {
            let next = outcome.state();
            Self::apply(entry, next, Some(TaskResult::new(outcome)));
        }
    }

    fn apply(entry: &mut TaskEntry, next: TaskState, result: Option<TaskResult>) -> bool {
        let current = *entry.state.borrow();
        if !current.can_transition_to(next) {
            return false;
        }
        // Result first, so anyone woken by the state change can read it
        if result.is_some() {
            entry.result = result;
        }
        entry.state.send_replace(next);
        true
    }

    async fn execute(self: Arc<Self>, input: Map<String, Value>, ctx: TransferContext) {
        let id = ctx.id;
        if ctx.cancel.is_cancelled() || !self.transition(id, TaskState::Running) {
            return;
        }

        let request = DownloadRequest::from_input_data(&input);

        let outcome = match run_transfer(&request, &ctx).await {
            Ok(TransferOutcome::Completed(summary)) => TaskOutcome::Succeeded {
                file_name: summary.file_name,
            },
            Ok(TransferOutcome::Cancelled { .. }) => TaskOutcome::Cancelled,
            Err(reason) => TaskOutcome::Failed(reason),
        };
        self.finish(id, outcome);
    }
}

impl TaskExecutionPort for TaskEngine {
    fn submit(&self, request: DownloadRequest, tags: &[&str]) -> Result<TaskId, SubmitError> {
        if self.inner.closed.load(Ordering::SeqCst) {
            return Err(SubmitError::EngineClosed);
        }

        let id = TaskId::new();
        let (state_tx, _) = watch::channel(TaskState::Enqueued);
        let (progress_tx, _) = watch::channel(Progress::default());
        let cancel = CancellationToken::new();

        {
            let mut registry = self.inner.lock();
            let seq = registry.next_seq;
            registry.next_seq += 1;
            registry.entries.insert(
                id,
                TaskEntry {
                    seq,
                    tags: tags.iter().map(|t| t.to_string()).collect(),
                    state: state_tx,
                    progress: progress_tx.clone(),
                    cancel: cancel.clone(),
                    result: None,
                },
            );
        }

        tracing::info!(
            task_id = %id,
            url = %request.url(),
            file_name = %request.file_name(),
            "download enqueued"
        );

        let ctx = TransferContext {
            id,
            download_dir: self.inner.settings.download_dir.clone(),
            chunk_size: self.inner.settings.chunk_size,
            fetcher: Arc::clone(&self.inner.fetcher),
            notifier: Arc::clone(&self.inner.notifier),
            progress: progress_tx,
            cancel,
        };
        self.inner
            .runtime
            .spawn(Arc::clone(&self.inner).execute(request.to_input_data(), ctx));

        Ok(id)
    }

    fn observe_state(&self, id: TaskId) -> Option<watch::Receiver<TaskState>> {
        self.inner.lock().entries.get(&id).map(|e| e.state.subscribe())
    }

    fn observe_progress(&self, id: TaskId) -> Option<watch::Receiver<Progress>> {
        self.inner
            .lock()
            .entries
            .get(&id)
            .map(|e| e.progress.subscribe())
    }

    fn cancel(&self, id: TaskId) -> bool {
        let mut registry = self.inner.lock();
        let Some(entry) = registry.entries.get_mut(&id) else {
            return false;
        };

        let current = *entry.state.borrow();
        match current {
            TaskState::Enqueued => {
                entry.cancel.cancel();
                EngineInner::apply(
                    entry,
                    TaskState::Cancelled,
                    Some(TaskResult::new(TaskOutcome::Cancelled)),
                );
            }
            // The transfer notices between chunks and reports back itself
            TaskState::Running => entry.cancel.cancel(),
            _ => return false,
        }

        tracing::info!(task_id = %id, state = %current, "cancellation requested");
        true
    }

    fn tasks_by_tag(&self, tag: &str) -> Vec<TaskInfo> {
        let registry = self.inner.lock();
        let mut tagged: Vec<(u64, TaskInfo)> = registry
            .entries
            .iter()
            .filter(|(_, entry)| entry.tags.iter().any(|t| t == tag))
            .map(|(id, entry)| (entry.seq, entry.info(*id)))
            .collect();
        tagged.sort_by_key(|(seq, _)| *seq);
        tagged.into_iter().map(|(_, info)| info).collect()
    }

    fn result(&self, id: TaskId) -> Option<TaskResult> {
        self.inner
            .lock()
            .entries
            .get(&id)
            .and_then(|e| e.result.clone())
    }

    fn clear_finished(&self) -> usize {
        let mut registry = self.inner.lock();
        let before = registry.entries.len();
        registry
            .entries
            .retain(|_, entry| !entry.state.borrow().is_finished());
        before - registry.entries.len()
    }
}
