use std::fmt;

use bytes::Bytes;

use crate::utils::format_megabytes;

/// A selectable media stream reported by the extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOption {
    pub id: String,
    pub note: String,
    pub filesize: u64,
}

impl FormatOption {
    /// Label shown in the format picker, e.g. `720p - 12.34 MB`.
    pub fn label(&self) -> String {
        format!("{} - {} MB", self.note, format_megabytes(self.filesize))
    }

    pub fn size_text(&self) -> String {
        format!("Size: {} MB", format_megabytes(self.filesize))
    }
}

/// Metadata returned by the extractor for a single URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoInfo {
    pub title: String,
    pub thumbnail_url: Option<String>,
    pub formats: Vec<FormatOption>,
}

/// Decoded RGBA thumbnail, already resized for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub width: u32,
    pub height: u32,
    pub rgba: Bytes,
}

/// Everything a successful fetch produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedVideo {
    pub url: String,
    pub title: String,
    pub formats: Vec<FormatOption>,
    pub thumbnail: Option<Thumbnail>,
}

/// Entry in the format picker. Carries its position so a selection always
/// resolves back to the same format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatChoice {
    pub index: usize,
    pub label: String,
}

impl fmt::Display for FormatChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// Resolved download request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadPlan {
    pub url: String,
    pub format_id: String,
    pub suggested_filename: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DownloadPhase {
    #[default]
    Idle,
    Fetching,
    Fetched,
    AwaitingSavePath,
    Downloading,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_label() {
        let format = FormatOption {
            id: "22".to_string(),
            note: "720p".to_string(),
            filesize: 5 * 1024 * 1024 + 512 * 1024,
        };
        assert_eq!(format.label(), "720p - 5.50 MB");
        assert_eq!(format.size_text(), "Size: 5.50 MB");
    }

    #[test]
    fn test_choice_displays_label() {
        let choice = FormatChoice {
            index: 3,
            label: "audio - 1.00 MB".to_string(),
        };
        assert_eq!(choice.to_string(), "audio - 1.00 MB");
    }
}
