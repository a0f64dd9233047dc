use std::{
    fs::File,
    io::Write,
    path::{Path, PathBuf},
    process::Stdio,
};

use eframe::egui::ColorImage;
use once_cell::sync::Lazy;
use rust_embed::RustEmbed;
use tokio::{
    io::{AsyncBufReadExt, AsyncReadExt, BufReader},
    process::Command,
    sync::{mpsc::UnboundedSender, Mutex},
};
use tracing::{debug, info, trace, warn};

use crate::error::{AppError, Result};
use crate::model::{DownloadJob, JobEvent, MediaInfo};
use crate::progress::{parse_progress_from_line, PROGRESS_TEMPLATE};
use crate::thumbnail::{self, clear_thumbnails, prepare_thumbnail};

/// Drop a yt-dlp binary in `assets/` to bundle it.
#[derive(RustEmbed)]
#[folder = "assets/"]
pub struct Asset;

// The thumbnail file names are fixed, so only one preview may touch them at a time.
static PREVIEW_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

/// Runs `fut` while holding the preview lock.
pub async fn with_preview_lock<T>(fut: impl Future<Output = T>) -> T {
    let _guard = PREVIEW_LOCK.lock().await;
    fut.await
}

/// Handle on the yt-dlp executable.
#[derive(Debug, Clone)]
pub struct YtDlp {
    program: PathBuf,
}

impl YtDlp {
    /// Uses the bundled binary if there is one, otherwise `bin` from `PATH`.
    pub fn locate(bin: &str) -> Result<Self> {
        let Some(data) = Asset::get(bin) else {
            return Ok(Self { program: PathBuf::from(bin) });
        };

        let tmp = std::env::temp_dir().join(bin);
        if !tmp.exists() {
            debug!("unpacking bundled {bin} to {}", tmp.display());
            let mut f = File::create(&tmp)?;
            f.write_all(&data.data)?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                std::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o755))?;
            }
        }
        Ok(Self { program: tmp })
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Reads title, uploader, duration and thumbnail URL, and writes the
    /// thumbnail into `thumbnail_dir`. Nothing is downloaded.
    pub async fn fetch_info(&self, url: &str, thumbnail_dir: &Path) -> Result<MediaInfo> {
        let output = Command::new(&self.program)
            .args(info_args(url, thumbnail_dir))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::Extraction(
                last_error_line(&stderr).unwrap_or_else(|| format!("yt-dlp exited with {}", output.status)),
            ));
        }
        parse_info(&output.stdout)
    }

    /// Downloads `url` into `destination`, reporting progress on `events`.
    pub async fn download(&self, url: &str, destination: &Path, events: &UnboundedSender<JobEvent>) -> Result<()> {
        tokio::fs::create_dir_all(destination).await?;

        let mut child = Command::new(&self.program)
            .args(download_args(url, destination))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let out = child
            .stdout
            .take()
            .ok_or_else(|| AppError::Extraction("yt-dlp stdout not captured".into()))?;
        let mut err = child
            .stderr
            .take()
            .ok_or_else(|| AppError::Extraction("yt-dlp stderr not captured".into()))?;

        // Drain stderr alongside stdout so neither pipe fills up.
        let stderr_task = tokio::spawn(async move {
            let mut buf = String::new();
            let _ = err.read_to_string(&mut buf).await;
            buf
        });

        let mut lines = BufReader::new(out).lines();
        while let Some(line) = lines.next_line().await? {
            trace!("yt-dlp> {line}");
            if let Some(pct) = parse_progress_from_line(&line) {
                let _ = events.send(JobEvent::Progress(pct));
            }
        }

        let status = child.wait().await?;
        let stderr = stderr_task.await.unwrap_or_default();
        if status.success() {
            Ok(())
        } else {
            Err(AppError::Extraction(
                last_error_line(&stderr).unwrap_or_else(|| format!("yt-dlp exited with {status}")),
            ))
        }
    }

    fn spawn_error(&self, e: std::io::Error) -> AppError {
        if e.kind() == std::io::ErrorKind::NotFound {
            AppError::MissingExecutable(self.program.display().to_string())
        } else {
            AppError::Io(e)
        }
    }
}

/// Runs one button press to completion. Always ends with
/// [`JobEvent::Finished`].
pub async fn run_job(job: DownloadJob, bin: String, thumbnail_dir: PathBuf, events: UnboundedSender<JobEvent>) {
    info!(category = %job.category, url = %job.url, "starting download");
    let result = drive_job(&job, &bin, &thumbnail_dir, &events).await;
    match &result {
        Ok(()) => info!(url = %job.url, "download finished"),
        Err(e) => warn!(url = %job.url, "download failed: {e}"),
    }
    let _ = events.send(JobEvent::Finished(result.map_err(|e| e.to_string())));
}

async fn drive_job(job: &DownloadJob, bin: &str, thumbnail_dir: &Path, events: &UnboundedSender<JobEvent>) -> Result<()> {
    let ytdlp = YtDlp::locate(bin)?;
    debug!("using {}", ytdlp.program().display());

    if job.preview {
        let (info, thumbnail) = with_preview_lock(fetch_preview(&ytdlp, &job.url, thumbnail_dir)).await?;
        let _ = events.send(JobEvent::Info(info));
        if let Some(img) = thumbnail {
            let _ = events.send(JobEvent::Thumbnail(img));
        }
    }

    ytdlp.download(&job.url, &job.destination, events).await
}

/// Info plus thumbnail. A missing or broken thumbnail is not an error.
async fn fetch_preview(ytdlp: &YtDlp, url: &str, thumbnail_dir: &Path) -> Result<(MediaInfo, Option<ColorImage>)> {
    clear_thumbnails(thumbnail_dir)?;
    let info = ytdlp.fetch_info(url, thumbnail_dir).await?;

    let dir = thumbnail_dir.to_path_buf();
    let fallback = info.thumbnail.clone();
    let thumbnail = match tokio::task::spawn_blocking(move || prepare_thumbnail(&dir, fallback.as_deref())).await {
        Ok(Ok(img)) => img,
        Ok(Err(e)) => {
            warn!("thumbnail unavailable: {e}");
            None
        }
        Err(e) => {
            warn!("thumbnail task failed: {e}");
            None
        }
    };
    if thumbnail.is_none() {
        debug!("no thumbnail for {url}");
    }
    Ok((info, thumbnail))
}

fn info_args(url: &str, thumbnail_dir: &Path) -> Vec<String> {
    vec![
        "-J".to_owned(),
        "--no-simulate".to_owned(),
        "--skip-download".to_owned(),
        "--no-playlist".to_owned(),
        "--write-thumbnail".to_owned(),
        "-o".to_owned(),
        thumbnail::output_template(thumbnail_dir),
        "--".to_owned(),
        url.to_owned(),
    ]
}

fn download_args(url: &str, destination: &Path) -> Vec<String> {
    vec![
        "--newline".to_owned(),
        "--no-playlist".to_owned(),
        "--no-colors".to_owned(),
        "--progress-template".to_owned(),
        PROGRESS_TEMPLATE.to_owned(),
        "-o".to_owned(),
        destination.join("%(title)s.%(ext)s").display().to_string(),
        "--".to_owned(),
        url.to_owned(),
    ]
}

pub fn parse_info(stdout: &[u8]) -> Result<MediaInfo> {
    Ok(serde_json::from_slice(stdout)?)
}

fn last_error_line(stderr: &str) -> Option<String> {
    stderr
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .last()
        .map(str::to_owned)
}
