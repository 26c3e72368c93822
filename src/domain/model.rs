use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::error::FailureReason;

/// Key for the source URL in a task's input data.
pub const KEY_URL: &str = "url";
/// Key for the destination file name in input and output data.
pub const KEY_FILE_NAME: &str = "fileName";
/// Key for the percentage in a task's progress data.
pub const KEY_PROGRESS: &str = "progress";

/// Shown for tasks that have not reported an output file name.
pub const UNKNOWN_FILE_NAME: &str = "unknown file";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(Uuid);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// A download as handed to the execution engine.
///
/// The file name is derived once at submission time and never changes
/// afterwards, so the fields are private.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    url: String,
    file_name: String,
}

impl DownloadRequest {
    pub fn new(url: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            file_name: file_name.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn to_input_data(&self) -> Map<String, Value> {
        let mut data = Map::new();
        data.insert(KEY_URL.to_string(), Value::String(self.url.clone()));
        data.insert(
            KEY_FILE_NAME.to_string(),
            Value::String(self.file_name.clone()),
        );
        data
    }

    /// Missing keys become an empty URL (rejected later by the transfer)
    /// and the unknown-file placeholder.
    pub fn from_input_data(data: &Map<String, Value>) -> Self {
        let url = data
            .get(KEY_URL)
            .and_then(Value::as_str)
            .unwrap_or_default();
        let file_name = data
            .get(KEY_FILE_NAME)
            .and_then(Value::as_str)
            .unwrap_or(UNKNOWN_FILE_NAME);
        Self::new(url, file_name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskState {
    Enqueued,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl TaskState {
    pub fn is_finished(self) -> bool {
        matches!(
            self,
            TaskState::Succeeded | TaskState::Failed | TaskState::Cancelled
        )
    }

    /// Transitions only move forward; nothing leaves a terminal state.
    pub fn can_transition_to(self, next: TaskState) -> bool {
        match (self, next) {
            (TaskState::Enqueued, TaskState::Running) => true,
            (TaskState::Enqueued | TaskState::Running, next) => next.is_finished(),
            _ => false,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TaskState::Enqueued => "ENQUEUED",
            TaskState::Running => "RUNNING",
            TaskState::Succeeded => "SUCCEEDED",
            TaskState::Failed => "FAILED",
            TaskState::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Completion of a running transfer.
///
/// `Indeterminate` covers resources that do not report a usable length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Progress {
    #[default]
    Indeterminate,
    Determinate(u8),
}

impl Progress {
    pub fn from_bytes(read: u64, total: Option<u64>) -> Self {
        match total {
            Some(total) if total > 0 => {
                let percent = (u128::from(read) * 100 / u128::from(total)).min(100);
                Progress::Determinate(percent as u8)
            }
            _ => Progress::Indeterminate,
        }
    }

    pub fn percent(self) -> u8 {
        match self {
            Progress::Determinate(percent) => percent,
            Progress::Indeterminate => 0,
        }
    }

    pub fn to_progress_data(self) -> Map<String, Value> {
        let mut data = Map::new();
        data.insert(KEY_PROGRESS.to_string(), Value::from(self.percent()));
        data
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Succeeded { file_name: String },
    Failed(FailureReason),
    Cancelled,
}

impl TaskOutcome {
    pub fn state(&self) -> TaskState {
        match self {
            TaskOutcome::Succeeded { .. } => TaskState::Succeeded,
            TaskOutcome::Failed(_) => TaskState::Failed,
            TaskOutcome::Cancelled => TaskState::Cancelled,
        }
    }
}

/// Produced once per task, kept until the finished task is cleared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskResult {
    pub outcome: TaskOutcome,
}

impl TaskResult {
    pub fn new(outcome: TaskOutcome) -> Self {
        Self { outcome }
    }

    /// `{"fileName": ..}` on success, nothing otherwise.
    pub fn output_data(&self) -> Option<Map<String, Value>> {
        match &self.outcome {
            TaskOutcome::Succeeded { file_name } => {
                let mut data = Map::new();
                data.insert(KEY_FILE_NAME.to_string(), Value::String(file_name.clone()));
                Some(data)
            }
            TaskOutcome::Failed(_) | TaskOutcome::Cancelled => None,
        }
    }
}

/// Point-in-time view of one task for observers.
#[derive(Debug, Clone)]
pub struct TaskInfo {
    pub id: TaskId,
    pub state: TaskState,
    pub progress: Progress,
    pub result: Option<TaskResult>,
}

impl TaskInfo {
    /// `{"progress": n}` for the latest reported progress.
    pub fn progress_data(&self) -> Map<String, Value> {
        self.progress.to_progress_data()
    }

    pub fn display_file_name(&self) -> String {
        self.result
            .as_ref()
            .and_then(TaskResult::output_data)
            .and_then(|data| {
                data.get(KEY_FILE_NAME)
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .unwrap_or_else(|| UNKNOWN_FILE_NAME.to_string())
    }
}
