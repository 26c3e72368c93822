use iced::{
    widget::{button, column, progress_bar, row, scrollable, text, text_input, Column, Space},
    Element, Length,
};

use serde_json::Value;

use crate::domain::model::KEY_PROGRESS;
use crate::domain::{TaskId, TaskInfo};

/// One entry of the task list.
#[derive(Debug, Clone)]
pub struct TaskRow {
    pub info: TaskInfo,
    /// Current notification text for the task, if it has one.
    pub notice: Option<String>,
}

/// Main view state
pub struct DownloadView {
    pub download_url: String,
    pub status_message: String,
    pub active_notifications: usize,
    pub tasks: Vec<TaskRow>,
}

impl Default for DownloadView {
    fn default() -> Self {
        Self {
            download_url: String::new(),
            status_message: "Enter a link to download".to_string(),
            active_notifications: 0,
            tasks: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum DownloadMessage {
    UrlChanged(String),
    StartPressed,
    CancelPressed(TaskId),
    ClearFinishedPressed,
}

impl DownloadView {
    pub fn update(&mut self, message: DownloadMessage) {
        match message {
            DownloadMessage::UrlChanged(url) => {
                self.download_url = url;
            }
            DownloadMessage::StartPressed
            | DownloadMessage::CancelPressed(_)
            | DownloadMessage::ClearFinishedPressed => {
                // Will be handled by the app
            }
        }
    }

    pub fn file_name_of(&self, id: TaskId) -> Option<String> {
        self.tasks
            .iter()
            .find(|row| row.info.id == id)
            .map(|row| row.info.display_file_name())
    }

    pub fn view(&self) -> Element<'_, DownloadMessage> {
        let tasks = Column::with_children(self.tasks.iter().map(task_item))
            .spacing(8)
            .width(Length::Fill);

        column![
            text("Work Downloader").size(28),
            Space::new().height(Length::Fixed(12.0)),
            row![
                text_input("Enter download link...", &self.download_url)
                    .on_input(DownloadMessage::UrlChanged)
                    .on_submit(DownloadMessage::StartPressed)
                    .padding(10)
                    .width(Length::Fill),
                button("Start download")
                    .on_press(DownloadMessage::StartPressed)
                    .padding([10, 20]),
            ]
            .spacing(8),
            text(&self.status_message).size(14),
            Space::new().height(Length::Fixed(12.0)),
            row![
                text(format!("Download tasks ({} active notifications)", self.active_notifications))
                    .size(18)
                    .width(Length::Fill),
                button("Clear finished")
                    .on_press(DownloadMessage::ClearFinishedPressed)
                    .padding([6, 12]),
            ]
            .spacing(8),
            scrollable(tasks).height(Length::Fill),
        ]
        .padding(20)
        .spacing(10)
        .into()
    }
}

fn task_item(row: &TaskRow) -> Element<'_, DownloadMessage> {
    let info = &row.info;
    let percent = info
        .progress_data()
        .get(KEY_PROGRESS)
        .and_then(Value::as_u64)
        .unwrap_or(0);

    let mut item = column![
        text(format!("File: {}", info.display_file_name())).size(16),
        text(format!("Status: {}", info.state)).size(13),
        progress_bar(0.0..=100.0, percent as f32),
        text(format!("Progress: {}%", percent)).size(13),
    ]
    .spacing(4);

    if let Some(notice) = &row.notice {
        item = item.push(text(notice).size(12));
    }

    if !info.state.is_finished() {
        item = item.push(
            button("Cancel")
                .on_press(DownloadMessage::CancelPressed(info.id))
                .width(Length::Fill),
        );
    }

    item.into()
}
