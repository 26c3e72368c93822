pub mod error;
pub mod model;

pub use error::{FailureReason, NotifyError, SubmitError};
pub use model::{
    DownloadRequest, Progress, TaskId, TaskInfo, TaskOutcome, TaskResult, TaskState,
};
