mod api;
mod app;
mod application;
mod config;
mod domain;
mod extractor;
mod ui;
mod utils;

use clap::Parser;
use iced::{window, Size};
use tracing_subscriber::EnvFilter;

fn main() -> iced::Result {
    let args = config::Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| args.log_filter().into()),
        )
        .init();

    let config = config::AppConfig::from(args);
    tracing::info!(yt_dlp = %config.ytdlp_program.display(), "starting video downloader");

    iced::application(
        move || app::DownloadApp::new(config.clone()),
        app::update,
        app::view,
    )
    .title("Video Downloader")
    .window(window::Settings {
        size: Size::new(400.0, 700.0),
        ..Default::default()
    })
    .run()
}
