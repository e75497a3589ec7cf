use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::sync::LazyLock;

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use regex::Regex;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::task::JoinHandle;

use super::{ByteProgress, DownloadRequest, Extractor, ExtractorError, Result};
use crate::domain::{FormatOption, VideoInfo};
use crate::utils::escape_output_template;

const PROGRESS_PREFIX: &str = "vfd-progress";

static PROGRESS_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^vfd-progress\|([^|]*)\|([^|]*)\|([^|]*)$").expect("progress pattern is valid")
});

/// Subset of `yt-dlp -J` output the application reads.
#[derive(Debug, Deserialize)]
struct RawInfo {
    title: String,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    formats: Vec<RawFormat>,
}

#[derive(Debug, Deserialize)]
struct RawFormat {
    format_id: String,
    #[serde(default)]
    format_note: Option<String>,
    #[serde(default)]
    filesize: Option<f64>,
}

/// Runs the `yt-dlp` executable for metadata and downloads.
#[derive(Debug, Clone)]
pub struct YtDlp {
    program: PathBuf,
}

impl YtDlp {
    pub fn new(program: PathBuf) -> Self {
        Self { program }
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command
            .env("PYTHONIOENCODING", "UTF-8")
            .stdin(Stdio::null())
            .kill_on_drop(true);
        command
    }

    fn spawn_error(&self, source: std::io::Error) -> ExtractorError {
        ExtractorError::Spawn {
            program: self.program.display().to_string(),
            source,
        }
    }
}

#[async_trait]
impl Extractor for YtDlp {
    async fn extract_info(&self, url: &str) -> Result<VideoInfo> {
        tracing::debug!(program = %self.program.display(), url, "extracting metadata");

        let output = self
            .command()
            .args(metadata_args(url))
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractorError::Process(failure_message(
                last_line(&stderr),
                output.status,
            )));
        }

        parse_info(&output.stdout)
    }

    fn download(&self, request: DownloadRequest) -> BoxStream<'static, Result<ByteProgress>> {
        futures::stream::unfold(
            RunState::Start {
                ytdlp: self.clone(),
                request,
            },
            |state| async move {
                match state {
                    RunState::Start { ytdlp, request } => {
                        tracing::debug!(
                            url = %request.url,
                            format = %request.format_id,
                            destination = %request.destination.display(),
                            "starting yt-dlp download"
                        );
                        let args = match download_args(&request) {
                            Ok(args) => args,
                            Err(e) => return Some((Err(e), RunState::Finished)),
                        };
                        let mut child = match ytdlp
                            .command()
                            .args(args)
                            .stdout(Stdio::piped())
                            .stderr(Stdio::piped())
                            .spawn()
                        {
                            Ok(child) => child,
                            Err(e) => return Some((Err(ytdlp.spawn_error(e)), RunState::Finished)),
                        };

                        let (stdout, stderr) = match (child.stdout.take(), child.stderr.take()) {
                            (Some(stdout), Some(stderr)) => (stdout, stderr),
                            _ => {
                                return Some((
                                    Err(ExtractorError::Process(
                                        "yt-dlp output pipes unavailable".to_string(),
                                    )),
                                    RunState::Finished,
                                ))
                            }
                        };

                        let running = RunState::Running {
                            child,
                            lines: BufReader::new(stdout).lines(),
                            stderr_tail: tokio::spawn(read_stderr_tail(stderr)),
                        };
                        next_progress(running).await
                    }
                    running @ RunState::Running { .. } => next_progress(running).await,
                    RunState::Finished => None,
                }
            },
        )
        .boxed()
    }
}

enum RunState {
    Start {
        ytdlp: YtDlp,
        request: DownloadRequest,
    },
    Running {
        child: Child,
        lines: Lines<BufReader<ChildStdout>>,
        stderr_tail: JoinHandle<Option<String>>,
    },
    Finished,
}

/// Read stdout until the next progress report or process exit.
async fn next_progress(state: RunState) -> Option<(Result<ByteProgress>, RunState)> {
    let RunState::Running {
        mut child,
        mut lines,
        stderr_tail,
    } = state
    else {
        return None;
    };

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if let Some(progress) = parse_progress_line(&line) {
                    return Some((
                        Ok(progress),
                        RunState::Running {
                            child,
                            lines,
                            stderr_tail,
                        },
                    ));
                }
                tracing::trace!(line = %line, "yt-dlp output");
            }
            Ok(None) => break,
            Err(e) => return Some((Err(ExtractorError::Io(e)), RunState::Finished)),
        }
    }

    let status = match child.wait().await {
        Ok(status) => status,
        Err(e) => return Some((Err(ExtractorError::Io(e)), RunState::Finished)),
    };
    let tail = stderr_tail.await.ok().flatten();

    if status.success() {
        tracing::debug!("yt-dlp download finished");
        None
    } else {
        tracing::warn!(%status, "yt-dlp download failed");
        Some((
            Err(ExtractorError::Process(failure_message(tail.as_deref(), status))),
            RunState::Finished,
        ))
    }
}

async fn read_stderr_tail(stderr: ChildStderr) -> Option<String> {
    let mut lines = BufReader::new(stderr).lines();
    let mut last = None;
    while let Ok(Some(line)) = lines.next_line().await {
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            last = Some(trimmed.to_string());
        }
    }
    last
}

fn metadata_args(url: &str) -> Vec<String> {
    vec![
        "-J".to_string(),
        "--no-playlist".to_string(),
        "--no-warnings".to_string(),
        "--skip-download".to_string(),
        "--".to_string(),
        url.to_string(),
    ]
}

fn download_args(request: &DownloadRequest) -> Result<Vec<String>> {
    let destination = request
        .destination
        .to_str()
        .ok_or_else(|| ExtractorError::InvalidDestination(request.destination.clone()))?;

    Ok(vec![
        "--newline".to_string(),
        "--no-playlist".to_string(),
        "--no-warnings".to_string(),
        "--progress-template".to_string(),
        format!(
            "download:{}|%(progress.downloaded_bytes)s|%(progress.total_bytes)s|%(progress.total_bytes_estimate)s",
            PROGRESS_PREFIX
        ),
        "-f".to_string(),
        request.format_id.clone(),
        "-o".to_string(),
        escape_output_template(destination),
        "--".to_string(),
        request.url.clone(),
    ])
}

fn parse_info(stdout: &[u8]) -> Result<VideoInfo> {
    let raw: RawInfo = serde_json::from_slice(stdout)?;

    let formats = raw
        .formats
        .into_iter()
        .filter_map(|format| {
            let filesize = format.filesize.filter(|size| size.is_finite() && *size >= 1.0)? as u64;
            let note = format
                .format_note
                .map(|note| note.trim().to_string())
                .filter(|note| !note.is_empty())
                .unwrap_or_else(|| format.format_id.clone());
            Some(FormatOption {
                id: format.format_id,
                note,
                filesize,
            })
        })
        .collect();

    Ok(VideoInfo {
        title: raw.title,
        thumbnail_url: raw.thumbnail.filter(|url| !url.is_empty()),
        formats,
    })
}

fn parse_progress_line(line: &str) -> Option<ByteProgress> {
    let caps = PROGRESS_LINE.captures(line.trim())?;
    let downloaded = parse_byte_count(&caps[1])?;
    let total = parse_byte_count(&caps[2]).or_else(|| parse_byte_count(&caps[3]));
    Some(ByteProgress { downloaded, total })
}

/// yt-dlp prints `NA` for unknown fields and floats for estimates.
fn parse_byte_count(field: &str) -> Option<u64> {
    let field = field.trim();
    field.parse::<u64>().ok().or_else(|| {
        field
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite() && *value >= 0.0)
            .map(|value| value as u64)
    })
}

fn last_line(output: &str) -> Option<&str> {
    output.lines().rev().map(str::trim).find(|l| !l.is_empty())
}

fn failure_message(stderr_tail: Option<&str>, status: ExitStatus) -> String {
    match stderr_tail {
        Some(line) => line.to_string(),
        None => format!("yt-dlp exited with {}", status),
    }
}
