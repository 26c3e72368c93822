use std::sync::Arc;
use std::time::Duration;

use iced::{Subscription, Task};

use crate::application::{DownloadSubmitter, NotificationCenter, TaskExecutionPort};
use crate::ui::{DownloadMessage, DownloadView, TaskRow};

/// How often the task list is refreshed from the engine.
const REFRESH_INTERVAL: Duration = Duration::from_millis(250);

/// Handles the UI needs from the background side.
#[derive(Clone)]
pub struct Services {
    pub port: Arc<dyn TaskExecutionPort>,
    pub submitter: DownloadSubmitter,
    pub notifications: NotificationCenter,
}

pub struct DownloadApp {
    view: DownloadView,
    services: Services,
}

impl DownloadApp {
    pub fn new(services: Services) -> Self {
        let mut app = Self {
            view: DownloadView::default(),
            services,
        };
        app.refresh();
        app
    }

    fn refresh(&mut self) {
        let work_tag = self.services.submitter.work_tag();
        self.view.tasks = self
            .services
            .port
            .tasks_by_tag(work_tag)
            .into_iter()
            .map(|info| TaskRow {
                notice: self
                    .services
                    .notifications
                    .get(info.id)
                    .filter(|n| n.ongoing)
                    .map(|n| format!("{}: {}", n.title, n.text)),
                info,
            })
            .collect();
        self.view.active_notifications = self.services.notifications.active_count();
    }
}

#[derive(Debug, Clone)]
pub enum Message {
    UiMessage(DownloadMessage),
    /// Periodic poll of task state and progress
    Tick,
}

pub fn update(app: &mut DownloadApp, message: Message) -> Task<Message> {
    match message {
        Message::UiMessage(ui_msg) => {
            app.view.update(ui_msg.clone());

            match ui_msg {
                DownloadMessage::StartPressed => {
                    match app.services.submitter.start_download(&app.view.download_url) {
                        Ok(id) => {
                            app.view.status_message = format!("Download enqueued: {}", id);
                            app.view.download_url.clear();
                        }
                        Err(e) => {
                            app.view.status_message = e.to_string();
                        }
                    }
                    app.refresh();
                }
                DownloadMessage::CancelPressed(id) => {
                    let file_name = app.view.file_name_of(id).unwrap_or_default();
                    if app.services.port.cancel(id) {
                        app.view.status_message = format!("Cancelled task: {}", file_name);
                    }
                    app.refresh();
                }
                DownloadMessage::ClearFinishedPressed => {
                    let removed = app.services.port.clear_finished();
                    app.view.status_message = format!("Cleared {} finished task(s)", removed);
                    app.refresh();
                }
                DownloadMessage::UrlChanged(_) => {}
            }
        }
        Message::Tick => app.refresh(),
    }
    Task::none()
}

pub fn view(app: &DownloadApp) -> iced::Element<'_, Message> {
    app.view.view().map(Message::UiMessage)
}

pub fn subscription(_app: &DownloadApp) -> Subscription<Message> {
    iced::time::every(REFRESH_INTERVAL).map(|_| Message::Tick)
}
