//! Universal Video Downloader: paste a YouTube or Reddit link, press the
//! button, and yt-dlp saves the video into the chosen folder.

// Compile-time settings
mod config;
// Link text -> supported site
mod classifier;
// Download button state and binding
mod controller;
// yt-dlp spawning logic
mod downloader;
mod error;
mod logging;
// Data models for classification, jobs and status
mod model;
// Progress parsing utilities
mod progress;
// Thumbnail conversion and decoding
mod thumbnail;

use config::AppConfig;
use controller::LinkController;
use downloader::run_job;
use model::{ControlState, DownloadJob, DownloadStatus, DownloadTask, JobEvent};

// eframe/egui for GUI application framework
use eframe::{egui, App, Frame};
use egui::{Color32, RichText, TextureOptions, Visuals};
// OnceCell for single-time runtime initialization
use once_cell::sync::OnceCell;
// FileDialog for folder selection dialogs
use rfd::FileDialog;
use std::{collections::HashMap, path::PathBuf, sync::Arc};
use tokio::{
    runtime::Runtime,
    sync::mpsc::{unbounded_channel, UnboundedReceiver},
};
use tracing::{error, info};

// Global Tokio runtime stored in a OnceCell for lazy init
static RUNTIME: OnceCell<Arc<Runtime>> = OnceCell::new();

const MEDIA_ERROR_TEXT: &str = "There was an error retrieving the requested media.";

/// Program entry point: initializes logging and runtime, then launches GUI
fn main() -> Result<(), eframe::Error> {
    logging::init_logging();

    let rt = Arc::new(Runtime::new().expect("failed to start the tokio runtime"));
    let _ = RUNTIME.set(rt);

    let config = AppConfig::default();
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(config.window_title.clone())
            .with_inner_size(config.window_size),
        ..Default::default()
    };
    info!("starting {}", config.window_title);

    let title = config.window_title.clone();
    eframe::run_native(
        &title,
        options,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(Visuals::dark());
            Box::new(UvdApp::new(config))
        }),
    )
}

/// State owned by the window
struct UvdApp {
    config: AppConfig,
    /// Text of the link field
    url_input: String,
    /// Destination folder for downloads
    save_path: PathBuf,
    controller: LinkController,
    /// Jobs started from this window, newest last
    downloads: Vec<DownloadTask>,
    /// Cached textures for video thumbnails, by task id
    thumbnails: HashMap<u64, egui::TextureHandle>,
    /// Event channels of running jobs, by task id
    event_rxs: HashMap<u64, UnboundedReceiver<JobEvent>>,
    next_id: u64,
}

impl UvdApp {
    fn new(config: AppConfig) -> Self {
        Self {
            save_path: config.default_save_path.clone(),
            config,
            url_input: String::new(),
            controller: LinkController::default(),
            downloads: Vec::new(),
            thumbnails: HashMap::new(),
            event_rxs: HashMap::new(),
            next_id: 0,
        }
    }

    fn start_job(&mut self, job: DownloadJob) {
        let id = self.next_id;
        self.next_id += 1;

        let mut task = DownloadTask::new(id, job.clone());
        match RUNTIME.get() {
            Some(rt) => {
                let (tx, rx) = unbounded_channel();
                self.event_rxs.insert(id, rx);
                rt.spawn(run_job(
                    job,
                    self.config.ytdlp_binary.clone(),
                    self.config.thumbnail_dir.clone(),
                    tx,
                ));
            }
            None => {
                error!("no runtime to run download {id}");
                task.apply(JobEvent::Finished(Err("background runtime not running".into())));
            }
        }
        self.downloads.push(task);
    }

    fn poll_jobs(&mut self, ctx: &egui::Context) {
        for (id, rx) in self.event_rxs.iter_mut() {
            while let Ok(event) = rx.try_recv() {
                if let JobEvent::Thumbnail(img) = event {
                    let tex = ctx.load_texture(format!("thumbnail-{id}"), img, TextureOptions::default());
                    self.thumbnails.insert(*id, tex);
                    continue;
                }
                if let Some(task) = self.downloads.iter_mut().find(|t| t.id == *id) {
                    task.apply(event);
                }
            }
        }

        let finished: Vec<u64> = self.downloads.iter().filter(|t| t.is_finished()).map(|t| t.id).collect();
        for id in finished {
            self.event_rxs.remove(&id);
        }
    }

    fn downloads_panel(&mut self, ui: &mut egui::Ui) {
        let mut to_remove = vec![];

        for task in &self.downloads {
            ui.group(|ui| {
                ui.horizontal(|ui| {
                    // Show thumbnail if available
                    if let Some(tex) = self.thumbnails.get(&task.id) {
                        ui.add(egui::Image::new(tex).fit_to_exact_size(egui::vec2(225.0, 125.0)));
                    }
                    ui.vertical(|ui| {
                        ui.label(RichText::new(task.title()).strong());
                        if let Some(info) = &task.info {
                            if let Some(uploader) = info.uploader_name() {
                                ui.label(format!("Uploaded by: {uploader}"));
                            }
                            if let Some(duration) = info.duration_text() {
                                ui.label(format!("Duration: {duration}"));
                            }
                        }

                        match &task.status {
                            DownloadStatus::FetchingInfo => {
                                ui.label("Retrieving media info…");
                            }
                            DownloadStatus::Downloading => {
                                ui.label("Downloading");
                                ui.add(egui::ProgressBar::new(task.progress).show_percentage());
                            }
                            DownloadStatus::Done => {
                                ui.label("Done");
                                ui.add(egui::ProgressBar::new(task.progress).show_percentage());
                            }
                            DownloadStatus::Failed(e) => {
                                ui.label(RichText::new(MEDIA_ERROR_TEXT).color(Color32::RED));
                                ui.label(RichText::new(e).small().weak());
                            }
                        }

                        if task.is_finished() {
                            ui.horizontal(|ui| {
                                if matches!(task.status, DownloadStatus::Done) && ui.button("Open Folder").clicked() {
                                    open_folder(task.job.destination.clone());
                                }
                                // Queue removal of finished task
                                if ui.add(egui::Button::new("❌").fill(Color32::RED)).clicked() {
                                    to_remove.push(task.id);
                                }
                            });
                        }
                    });
                });
            });
        }

        if !to_remove.is_empty() {
            self.downloads.retain(|t| !to_remove.contains(&t.id));
            for id in to_remove {
                self.thumbnails.remove(&id);
            }
        }
    }

    fn link_area(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let field = egui::TextEdit::singleline(&mut self.url_input)
                .hint_text("Enter Target URL Here")
                .desired_width((ui.available_width() - 200.0).max(100.0));
            if ui.add(field).changed() {
                self.controller.on_link_changed(&self.url_input);
            }

            let button = egui::Button::new(self.controller.label());
            let response = ui.add_enabled(self.controller.is_enabled(), button);
            let response = match self.controller.state() {
                ControlState::Enabled(category) => response.on_hover_text(format!("{category} link detected")),
                ControlState::Disabled => {
                    response.on_disabled_hover_text("Paste a www.youtube.com or www.reddit.com link")
                }
            };
            if response.clicked() {
                if let Some(job) = self.controller.activate(&self.url_input, &self.save_path) {
                    self.start_job(job);
                }
            }
        });

        // Folder selection
        let folder_text = format!("Current Directory: {}", self.save_path.display());
        if ui.add(egui::Button::new(RichText::new(folder_text).color(Color32::from_rgb(0xbf, 0x77, 0xbe))).frame(false)).clicked() {
            if let Some(folder) = FileDialog::new().set_directory(&self.save_path).pick_folder() {
                info!("download folder set to {}", folder.display());
                self.save_path = folder;
            }
        }
    }
}

/// GUI update loop: called each frame to redraw and handle interactions
impl App for UvdApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        self.poll_jobs(ctx);

        egui::SidePanel::right("downloads_panel").min_width(320.0).show(ctx, |ui| {
            ui.heading("Downloads");
            ui.separator();
            egui::ScrollArea::vertical()
                .auto_shrink([false; 2])
                .show(ui, |ui| self.downloads_panel(ui));
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading(&self.config.window_title);
            ui.add_space(8.0);
            self.link_area(ui);
        });

        // Request periodic repaint for progress updates
        if !self.event_rxs.is_empty() {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }
    }
}

fn open_folder(folder: PathBuf) {
    std::thread::spawn(move || {
        #[cfg(target_os = "windows")]
        let opener = "explorer";
        #[cfg(target_os = "macos")]
        let opener = "open";
        #[cfg(all(unix, not(target_os = "macos")))]
        let opener = "xdg-open";

        if let Err(e) = std::process::Command::new(opener).arg(&folder).spawn() {
            tracing::warn!("could not open {}: {e}", folder.display());
        }
    });
}
