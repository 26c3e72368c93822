//! Fakes shared by the application tests.

use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use reqwest::StatusCode;

use super::notifications::{Notification, Notifier};
use crate::api::client::{FetchError, ResourceFetcher, Result};
use crate::api::RemoteResource;
use crate::domain::{NotifyError, Progress, TaskId};

type Body = BoxStream<'static, std::result::Result<Bytes, FetchError>>;

/// Hands out one prepared body, then fails every later open.
pub struct FakeFetcher {
    content_length: Option<u64>,
    body: Mutex<Option<Body>>,
}

impl FakeFetcher {
    pub fn new(content_length: Option<u64>, body: Body) -> Self {
        Self {
            content_length,
            body: Mutex::new(Some(body)),
        }
    }

    /// `count` chunks of `size` bytes each.
    pub fn chunks(content_length: Option<u64>, count: usize, size: usize) -> Self {
        let chunks = (0..count).map(move |i| Ok::<_, FetchError>(Bytes::from(vec![i as u8; size])));
        Self::new(content_length, stream::iter(chunks).boxed())
    }

    /// `count` good chunks followed by a broken connection.
    pub fn failing_after(content_length: Option<u64>, count: usize, size: usize) -> Self {
        let chunks = (0..count)
            .map(move |i| Ok::<_, FetchError>(Bytes::from(vec![i as u8; size])))
            .chain(std::iter::once(Err(FetchError::Status(
                StatusCode::BAD_GATEWAY,
            ))));
        Self::new(content_length, stream::iter(chunks).boxed())
    }
}

#[async_trait]
impl ResourceFetcher for FakeFetcher {
    async fn open(&self, _url: &str) -> Result<RemoteResource> {
        let body = self
            .body
            .lock()
            .unwrap()
            .take()
            .ok_or(FetchError::Status(StatusCode::GONE))?;
        Ok(RemoteResource {
            content_length: self.content_length,
            body,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifierCall {
    Promote(TaskId, Notification),
    Update(TaskId, Notification),
    Remove(TaskId),
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub deny: bool,
    calls: Mutex<Vec<NotifierCall>>,
}

impl RecordingNotifier {
    pub fn denying() -> Self {
        Self {
            deny: true,
            calls: Mutex::default(),
        }
    }

    pub fn calls(&self) -> Vec<NotifierCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Progress values carried by update calls, in order.
    pub fn progress_values(&self) -> Vec<Progress> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                NotifierCall::Update(_, n) => n.progress,
                _ => None,
            })
            .collect()
    }

    pub fn last_text(&self) -> Option<String> {
        self.calls().into_iter().rev().find_map(|call| match call {
            NotifierCall::Promote(_, n) | NotifierCall::Update(_, n) => Some(n.text),
            NotifierCall::Remove(_) => None,
        })
    }

    fn record(&self, call: NotifierCall) -> std::result::Result<(), NotifyError> {
        self.calls.lock().unwrap().push(call);
        if self.deny {
            Err(NotifyError::PermissionDenied)
        } else {
            Ok(())
        }
    }
}

impl Notifier for RecordingNotifier {
    fn promote_foreground(
        &self,
        id: TaskId,
        notification: Notification,
    ) -> std::result::Result<(), NotifyError> {
        self.record(NotifierCall::Promote(id, notification))
    }

    fn update(
        &self,
        id: TaskId,
        notification: Notification,
    ) -> std::result::Result<(), NotifyError> {
        self.record(NotifierCall::Update(id, notification))
    }

    fn remove(&self, id: TaskId) {
        self.calls.lock().unwrap().push(NotifierCall::Remove(id));
    }
}
