use std::path::PathBuf;
use std::sync::Arc;

use futures::TryStreamExt;
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::watch;
use tokio_util::io::StreamReader;
use tokio_util::sync::CancellationToken;

use super::notifications::{Notification, Notifier};
use crate::api::ResourceFetcher;
use crate::domain::{DownloadRequest, FailureReason, Progress, TaskId};

/// Bytes read from the network per iteration.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Everything one transfer needs besides its request.
///
/// Each running task owns its own context; nothing in it is shared with
/// other transfers except the fetcher and the notification surface.
pub struct TransferContext {
    pub id: TaskId,
    pub download_dir: PathBuf,
    pub chunk_size: usize,
    pub fetcher: Arc<dyn ResourceFetcher>,
    pub notifier: Arc<dyn Notifier>,
    pub progress: watch::Sender<Progress>,
    pub cancel: CancellationToken,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferSummary {
    pub file_name: String,
    pub path: PathBuf,
    pub bytes_written: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    Completed(TransferSummary),
    /// Stopped on request. Whatever was written stays on disk.
    Cancelled { bytes_written: u64 },
}

/// Run one download from request to terminal outcome.
///
/// The task's notification slot is removed on every exit path that got
/// past input validation.
pub async fn run_transfer(
    request: &DownloadRequest,
    ctx: &TransferContext,
) -> Result<TransferOutcome, FailureReason> {
    if request.url().trim().is_empty() {
        return Err(FailureReason::InvalidInput("missing download URL".to_string()));
    }

    if let Err(e) = ctx
        .notifier
        .promote_foreground(ctx.id, Notification::starting())
    {
        tracing::warn!(task_id = %ctx.id, error = %e, "continuing without foreground notification");
    }

    let result = stream_to_file(request, ctx).await;

    match &result {
        Ok(TransferOutcome::Completed(summary)) => {
            tracing::info!(
                task_id = %ctx.id,
                path = %summary.path.display(),
                bytes = summary.bytes_written,
                "download complete"
            );
            notify(ctx, Notification::completed(request.file_name()));
        }
        Ok(TransferOutcome::Cancelled { bytes_written }) => {
            tracing::info!(task_id = %ctx.id, bytes = bytes_written, "download cancelled");
        }
        Err(e) => {
            tracing::error!(task_id = %ctx.id, url = %request.url(), error = %e, "download failed");
            notify(ctx, Notification::failed(request.file_name()));
        }
    }

    ctx.notifier.remove(ctx.id);
    result
}

async fn stream_to_file(
    request: &DownloadRequest,
    ctx: &TransferContext,
) -> Result<TransferOutcome, FailureReason> {
    let resource = tokio::select! {
        biased;
        _ = ctx.cancel.cancelled() => return Ok(TransferOutcome::Cancelled { bytes_written: 0 }),
        opened = ctx.fetcher.open(request.url()) => opened?,
    };
    let total = resource.content_length;

    tokio::fs::create_dir_all(&ctx.download_dir).await?;
    let path = ctx.download_dir.join(request.file_name());
    // Existing files with the same name are overwritten
    let mut file = tokio::fs::File::create(&path).await?;

    tracing::debug!(task_id = %ctx.id, path = %path.display(), total = ?total, "streaming");

    let mut reader = StreamReader::new(resource.body.map_err(std::io::Error::other));
    let mut buffer = vec![0u8; ctx.chunk_size.max(1)];
    let mut bytes_written: u64 = 0;

    loop {
        let read = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => {
                return Ok(close_cancelled(ctx.id, file, bytes_written).await);
            }
            read = reader.read(&mut buffer) => read,
        };

        let n = match read {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                // Keep what has been written so far
                let _ = file.flush().await;
                return Err(FailureReason::Network(e.to_string()));
            }
        };

        file.write_all(&buffer[..n]).await?;
        bytes_written += n as u64;

        publish_progress(ctx, request, Progress::from_bytes(bytes_written, total));
    }

    file.flush().await?;
    file.sync_all().await?;

    Ok(TransferOutcome::Completed(TransferSummary {
        file_name: request.file_name().to_string(),
        path,
        bytes_written,
    }))
}

/// Cancellation always ends `Cancelled`, even if the final flush fails.
async fn close_cancelled<W>(id: TaskId, mut file: W, bytes_written: u64) -> TransferOutcome
where
    W: AsyncWrite + Unpin,
{
    if let Err(e) = file.flush().await {
        tracing::warn!(task_id = %id, error = %e, "flush after cancel failed");
    }
    TransferOutcome::Cancelled { bytes_written }
}

fn publish_progress(ctx: &TransferContext, request: &DownloadRequest, progress: Progress) {
    let changed = ctx.progress.send_if_modified(|current| {
        if *current == progress {
            false
        } else {
            *current = progress;
            true
        }
    });

    if changed {
        tracing::debug!(task_id = %ctx.id, progress = ?progress, "progress");
        notify(ctx, Notification::progress(request.file_name(), progress));
    }
}

fn notify(ctx: &TransferContext, notification: Notification) {
    if let Err(e) = ctx.notifier.update(ctx.id, notification) {
        tracing::debug!(task_id = %ctx.id, error = %e, "notification skipped");
    }
}
