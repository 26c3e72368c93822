mod api;
mod app;
mod application;
mod config;
mod domain;
mod ui;
mod utils;

use std::sync::Arc;

use api::HttpFetcher;
use application::{DownloadSubmitter, NotificationCenter, TaskEngine, TaskExecutionPort};
use config::AppConfig;

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("work_downloader=info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = match AppConfig::default_path() {
        Some(path) => AppConfig::load(&path)?,
        None => AppConfig::default(),
    };
    tracing::info!(download_dir = %config.download_dir.display(), "starting");

    // Transfers run here, independent of the UI event loop
    let runtime = tokio::runtime::Runtime::new()?;

    let notifications = NotificationCenter::new(config.notifications_enabled);
    let fetcher = Arc::new(HttpFetcher::new(&config.client_config())?);
    let engine = TaskEngine::new(
        runtime.handle().clone(),
        config.engine_settings(),
        fetcher,
        Arc::new(notifications.clone()),
    );
    let port: Arc<dyn TaskExecutionPort> = Arc::new(engine.clone());
    let submitter = DownloadSubmitter::new(
        Arc::clone(&port),
        config.work_tag.clone(),
        config.max_file_name_length,
    );
    let services = app::Services {
        port,
        submitter,
        notifications,
    };

    let result = iced::application(
        move || app::DownloadApp::new(services.clone()),
        app::update,
        app::view,
    )
    .title("Work Downloader")
    .subscription(app::subscription)
    .run();

    engine.shutdown();
    result?;
    Ok(())
}
