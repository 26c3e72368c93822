pub mod engine;
pub mod notifications;
pub mod submitter;
pub mod transfer;

#[cfg(test)]
mod test_support;

pub use engine::{EngineSettings, TaskEngine, TaskExecutionPort};
pub use notifications::NotificationCenter;
pub use submitter::DownloadSubmitter;
