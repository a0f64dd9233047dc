use std::path::PathBuf;

/// Compile-time settings of the window. Nothing here is read from disk and
/// every value resets on restart.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub window_title: String,
    pub window_size: [f32; 2],
    /// Where downloads land until the user picks another folder
    pub default_save_path: PathBuf,
    /// Directory yt-dlp writes `thumbnail.<ext>` into
    pub thumbnail_dir: PathBuf,
    pub ytdlp_binary: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            window_title: "Universal Video Downloader".to_string(),
            window_size: [1000.0, 400.0],
            default_save_path: PathBuf::from("./downloads"),
            thumbnail_dir: PathBuf::from("."),
            ytdlp_binary: if cfg!(target_os = "windows") { "yt-dlp.exe" } else { "yt-dlp" }.to_string(),
        }
    }
}
