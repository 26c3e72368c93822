use std::sync::Arc;

use super::engine::TaskExecutionPort;
use crate::domain::{DownloadRequest, SubmitError, TaskId};
use crate::utils::derive_file_name;

/// Turns user input into enqueued download tasks.
#[derive(Clone)]
pub struct DownloadSubmitter {
    port: Arc<dyn TaskExecutionPort>,
    work_tag: String,
    max_file_name_length: usize,
}

impl DownloadSubmitter {
    pub fn new(
        port: Arc<dyn TaskExecutionPort>,
        work_tag: impl Into<String>,
        max_file_name_length: usize,
    ) -> Self {
        Self {
            port,
            work_tag: work_tag.into(),
            max_file_name_length,
        }
    }

    pub fn work_tag(&self) -> &str {
        &self.work_tag
    }

    /// Blank input is rejected here and never reaches the engine.
    pub fn start_download(&self, url: &str) -> Result<TaskId, SubmitError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(SubmitError::BlankUrl);
        }

        let file_name = derive_file_name(url, self.max_file_name_length);
        let request = DownloadRequest::new(url, file_name);
        self.port.submit(request, &[self.work_tag.as_str()])
    }
}
