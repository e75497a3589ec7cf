use std::path::PathBuf;

use clap::Parser;

use crate::api::ThumbnailConfig;

/// Fetch video formats and download one with yt-dlp
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the yt-dlp executable
    #[arg(long = "yt-dlp", env = "YT_DLP_PATH", default_value = "yt-dlp")]
    pub yt_dlp: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub ytdlp_program: PathBuf,
    pub thumbnail: ThumbnailConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ytdlp_program: PathBuf::from("yt-dlp"),
            thumbnail: ThumbnailConfig::default(),
        }
    }
}

impl Args {
    /// Default log filter when `RUST_LOG` is not set
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "video_format_downloader=debug"
        } else {
            "video_format_downloader=info"
        }
    }
}

impl From<Args> for AppConfig {
    fn from(args: Args) -> Self {
        Self {
            ytdlp_program: args.yt_dlp,
            ..Default::default()
        }
    }
}
