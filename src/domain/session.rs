use super::{AppError, DownloadPhase, DownloadPlan, FetchedVideo, FormatChoice, FormatOption, Thumbnail};
use crate::utils::sanitize_filename;

/// Converts byte counts into a 0-100 indicator that never moves backwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressMeter {
    percent: u8,
}

impl ProgressMeter {
    pub fn percent(&self) -> u8 {
        self.percent
    }

    pub fn reset(&mut self) {
        self.percent = 0;
    }

    /// Record a progress report and return the resulting percentage.
    /// Reports without a usable total leave the value unchanged.
    pub fn update(&mut self, downloaded: u64, total: Option<u64>) -> u8 {
        if let Some(total) = total.filter(|t| *t > 0) {
            let percent = (u128::from(downloaded) * 100 / u128::from(total)).min(100) as u8;
            self.percent = self.percent.max(percent);
        }
        self.percent
    }
}

/// The single mutable slot holding whatever the last successful fetch returned.
#[derive(Debug, Default)]
pub struct Session {
    url: Option<String>,
    title: String,
    formats: Vec<FormatOption>,
    thumbnail: Option<Thumbnail>,
    selected: Option<usize>,
    phase: DownloadPhase,
    progress: ProgressMeter,
}

impl Session {
    pub fn phase(&self) -> DownloadPhase {
        self.phase
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn formats(&self) -> &[FormatOption] {
        &self.formats
    }

    pub fn thumbnail(&self) -> Option<&Thumbnail> {
        self.thumbnail.as_ref()
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn progress(&self) -> u8 {
        self.progress.percent()
    }

    pub fn is_busy(&self) -> bool {
        matches!(
            self.phase,
            DownloadPhase::Fetching | DownloadPhase::AwaitingSavePath | DownloadPhase::Downloading
        )
    }

    pub fn can_download(&self) -> bool {
        !self.is_busy() && !self.formats.is_empty()
    }

    /// Picker entries, in the same order as the fetched formats.
    pub fn choices(&self) -> Vec<FormatChoice> {
        self.formats
            .iter()
            .enumerate()
            .map(|(index, format)| FormatChoice {
                index,
                label: format.label(),
            })
            .collect()
    }

    pub fn selected_choice(&self) -> Option<FormatChoice> {
        let index = self.selected?;
        self.formats.get(index).map(|format| FormatChoice {
            index,
            label: format.label(),
        })
    }

    pub fn size_text(&self) -> Option<String> {
        self.selected
            .and_then(|index| self.formats.get(index))
            .map(FormatOption::size_text)
    }

    pub fn begin_fetch(&mut self) -> bool {
        if self.is_busy() {
            return false;
        }
        self.phase = DownloadPhase::Fetching;
        true
    }

    /// Apply the outcome of a fetch. Failures keep the previous video intact.
    pub fn finish_fetch(&mut self, result: Result<FetchedVideo, AppError>) -> Result<(), AppError> {
        match result {
            Ok(video) => {
                self.selected = if video.formats.is_empty() { None } else { Some(0) };
                self.url = Some(video.url);
                self.title = video.title;
                self.formats = video.formats;
                self.thumbnail = video.thumbnail;
                self.phase = DownloadPhase::Fetched;
                Ok(())
            }
            Err(e) => {
                self.phase = self.resting_phase();
                Err(e)
            }
        }
    }

    /// Select a format by position and return its size string.
    pub fn select_format(&mut self, index: usize) -> Option<String> {
        let text = self.formats.get(index).map(FormatOption::size_text)?;
        self.selected = Some(index);
        Some(text)
    }

    /// Resolve the current selection into a download request.
    pub fn plan_download(&self, url: &str) -> Result<DownloadPlan, AppError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(AppError::MissingUrl);
        }
        let format = self
            .selected
            .and_then(|index| self.formats.get(index))
            .ok_or(AppError::NoFormatSelected)?;

        let stem = sanitize_filename(&self.title);
        let stem = stem.trim_matches(|c| c == '.' || c == ' ');
        let suggested_filename = if stem.is_empty() {
            "video.mp4".to_string()
        } else {
            format!("{}.mp4", stem)
        };

        Ok(DownloadPlan {
            url: url.to_string(),
            format_id: format.id.clone(),
            suggested_filename,
        })
    }

    /// Hold the session while the save dialog is open.
    pub fn begin_save_dialog(&mut self) -> bool {
        if !self.can_download() {
            return false;
        }
        self.phase = DownloadPhase::AwaitingSavePath;
        true
    }

    pub fn cancel_save_dialog(&mut self) {
        if self.phase == DownloadPhase::AwaitingSavePath {
            self.phase = self.resting_phase();
        }
    }

    /// Only a session waiting on the save dialog can start downloading.
    pub fn begin_download(&mut self) -> bool {
        if self.phase != DownloadPhase::AwaitingSavePath || self.formats.is_empty() {
            return false;
        }
        self.progress.reset();
        self.phase = DownloadPhase::Downloading;
        true
    }

    pub fn record_progress(&mut self, downloaded: u64, total: Option<u64>) -> u8 {
        self.progress.update(downloaded, total)
    }

    /// Leave the downloading phase, whatever the outcome.
    pub fn finish_download(&mut self) {
        self.phase = self.resting_phase();
    }

    fn resting_phase(&self) -> DownloadPhase {
        if self.url.is_some() {
            DownloadPhase::Fetched
        } else {
            DownloadPhase::Idle
        }
    }
}
