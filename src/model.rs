use std::fmt;
use std::path::PathBuf;

use eframe::egui::ColorImage;
use serde::Deserialize;

use crate::error::{AppError, Result};

/// A video host the application knows how to download from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    YouTube,
    Reddit,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::YouTube => f.write_str("YouTube"),
            Category::Reddit => f.write_str("Reddit"),
        }
    }
}

/// Outcome of classifying the text in the link field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Empty, or not an absolute URL with a host
    Invalid,
    /// A well-formed URL whose host is not in the host table
    Unrecognized,
    Recognized(Category),
}

impl Classification {
    /// Turns a non-downloadable result into the matching error.
    pub fn into_category(self, link: &str) -> Result<Category> {
        match self {
            Classification::Recognized(category) => Ok(category),
            Classification::Unrecognized => Err(AppError::UnrecognizedHost(link.to_string())),
            Classification::Invalid => Err(AppError::InvalidUrl(link.to_string())),
        }
    }
}

/// State of the download button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlState {
    Disabled,
    Enabled(Category),
}

impl ControlState {
    pub fn is_enabled(&self) -> bool {
        matches!(self, ControlState::Enabled(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            ControlState::Disabled => "URL Unrecognized",
            ControlState::Enabled(Category::YouTube) => "Download Youtube Video",
            ControlState::Enabled(Category::Reddit) => "Download Reddit Video",
        }
    }
}

/// One activation of the download button
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadJob {
    pub category: Category,
    pub url: String,
    pub destination: PathBuf,
    /// Fetch title, uploader, duration and thumbnail before downloading
    pub preview: bool,
}

/// The fields of yt-dlp's JSON info dict the window displays
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MediaInfo {
    #[serde(default)]
    pub title: String,
    pub channel: Option<String>,
    pub uploader: Option<String>,
    /// Seconds
    pub duration: Option<f64>,
    /// Remote thumbnail URL
    pub thumbnail: Option<String>,
}

impl MediaInfo {
    pub fn uploader_name(&self) -> Option<&str> {
        self.channel.as_deref().or(self.uploader.as_deref())
    }

    /// Duration as `M:SS`
    pub fn duration_text(&self) -> Option<String> {
        let secs = self.duration?;
        if !secs.is_finite() || secs < 0.0 {
            return None;
        }
        let secs = secs.floor() as u64;
        Some(format!("{}:{:02}", secs / 60, secs % 60))
    }
}

/// Represents the current state of a download
#[derive(Clone, Debug, PartialEq)]
pub enum DownloadStatus {
    /// Retrieving media info and thumbnail
    FetchingInfo,
    /// Download is in progress
    Downloading,
    /// Download has completed successfully
    Done,
    /// yt-dlp or the thumbnail step failed; holds the error text
    Failed(String),
}

/// Data structure for tracking a download task in the UI
pub struct DownloadTask {
    pub id: u64,
    pub job: DownloadJob,
    /// Filled once the preview step returns
    pub info: Option<MediaInfo>,
    pub status: DownloadStatus,
    /// Progress fraction (0.0 to 1.0)
    pub progress: f32,
}

impl DownloadTask {
    pub fn new(id: u64, job: DownloadJob) -> Self {
        let status = if job.preview { DownloadStatus::FetchingInfo } else { DownloadStatus::Downloading };
        Self { id, job, info: None, status, progress: 0.0 }
    }

    pub fn title(&self) -> &str {
        match &self.info {
            Some(info) if !info.title.is_empty() => &info.title,
            _ => &self.job.url,
        }
    }

    /// Applies one event from the job's channel.
    pub fn apply(&mut self, event: JobEvent) {
        match event {
            JobEvent::Info(info) => {
                self.info = Some(info);
                self.status = DownloadStatus::Downloading;
            }
            // Thumbnails are cached by the window, not the task
            JobEvent::Thumbnail(_) => {}
            JobEvent::Progress(p) => {
                // Only update if progress increased
                if p > self.progress {
                    self.progress = p.min(1.0);
                }
            }
            JobEvent::Finished(Ok(())) => {
                self.progress = 1.0;
                self.status = DownloadStatus::Done;
            }
            JobEvent::Finished(Err(e)) => self.status = DownloadStatus::Failed(e),
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.status, DownloadStatus::Done | DownloadStatus::Failed(_))
    }
}

/// Messages a running job sends back to the window
pub enum JobEvent {
    Info(MediaInfo),
    Thumbnail(ColorImage),
    Progress(f32),
    Finished(std::result::Result<(), String>),
}
