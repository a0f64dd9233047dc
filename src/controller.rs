//! Drives the download button from the text in the link field.

use std::path::Path;

use tracing::debug;

use crate::classifier::classify;
use crate::model::{Category, ControlState, DownloadJob};

/// The operation the download button runs when pressed.
pub type ActionBinding = Box<dyn Fn(&str, &Path) -> DownloadJob + Send>;

/// Download button state. Holds at most one binding; enabling always
/// installs a fresh one and disabling drops it.
pub struct LinkController {
    state: ControlState,
    binding: Option<ActionBinding>,
}

impl Default for LinkController {
    fn default() -> Self {
        Self { state: ControlState::Disabled, binding: None }
    }
}

impl LinkController {
    pub fn state(&self) -> ControlState {
        self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.state.is_enabled() && self.binding.is_some()
    }

    pub fn label(&self) -> &'static str {
        self.state.label()
    }

    /// Re-evaluates the link after every edit of the field.
    pub fn on_link_changed(&mut self, text: &str) {
        let next = match classify(text).into_category(text) {
            Ok(category) => ControlState::Enabled(category),
            Err(e) => {
                debug!("download disabled: {e}");
                ControlState::Disabled
            }
        };

        if next != self.state {
            debug!(from = ?self.state, to = ?next, "button state changed");
        }
        self.state = next;
        self.binding = match next {
            ControlState::Enabled(category) => Some(binding_for(category)),
            ControlState::Disabled => None,
        };
    }

    /// Runs the bound operation for the current link and folder.
    ///
    /// Returns `None` while the button is disabled.
    pub fn activate(&self, url: &str, destination: &Path) -> Option<DownloadJob> {
        if !self.state.is_enabled() {
            return None;
        }
        let action = self.binding.as_ref()?;
        Some(action(url.trim_matches([' ', '\n']), destination))
    }
}

fn binding_for(category: Category) -> ActionBinding {
    match category {
        Category::YouTube => Box::new(|url: &str, destination: &Path| DownloadJob {
            category: Category::YouTube,
            url: url.to_string(),
            destination: destination.to_path_buf(),
            preview: true,
        }),
        Category::Reddit => Box::new(|url: &str, destination: &Path| DownloadJob {
            category: Category::Reddit,
            url: url.to_string(),
            destination: destination.to_path_buf(),
            preview: false,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YOUTUBE: &str = "https://www.youtube.com/watch?v=abc";
    const REDDIT: &str = "https://www.reddit.com/r/test";

    fn dest() -> &'static Path {
        Path::new("./downloads")
    }

    #[test]
    fn starts_disabled() {
        let controller = LinkController::default();
        assert!(!controller.is_enabled());
        assert_eq!(controller.label(), "URL Unrecognized");
        assert_eq!(controller.activate(YOUTUBE, dest()), None);
    }

    #[test]
    fn walks_through_the_scenario() {
        let mut c = LinkController::default();

        c.on_link_changed("");
        assert!(!c.is_enabled());
        assert_eq!(c.label(), "URL Unrecognized");

        c.on_link_changed(YOUTUBE);
        assert!(c.is_enabled());
        assert_eq!(c.label(), "Download Youtube Video");

        c.on_link_changed("not a url");
        assert!(!c.is_enabled());

        c.on_link_changed(REDDIT);
        assert!(c.is_enabled());
        assert_eq!(c.label(), "Download Reddit Video");

        c.on_link_changed(YOUTUBE);
        c.on_link_changed("https://example.com");
        assert!(!c.is_enabled());
        assert_eq!(c.state(), ControlState::Disabled);
        assert_eq!(c.activate("https://example.com", dest()), None);
    }

    #[test]
    fn enabled_iff_last_classification_recognized() {
        let inputs = ["", YOUTUBE, "x", REDDIT, REDDIT, "https://example.com", YOUTUBE, "  "];
        let mut c = LinkController::default();
        for text in inputs {
            c.on_link_changed(text);
            let recognized = matches!(classify(text), crate::model::Classification::Recognized(_));
            assert_eq!(c.is_enabled(), recognized, "{text:?}");
        }
    }

    #[test]
    fn rebinding_replaces_previous_action() {
        let mut c = LinkController::default();
        c.on_link_changed(YOUTUBE);
        c.on_link_changed(REDDIT);

        let job = c.activate(REDDIT, dest()).expect("enabled");
        assert_eq!(job.category, Category::Reddit);
        assert!(!job.preview);
        assert_eq!(job.url, REDDIT);
        assert_eq!(job.destination, dest());
    }

    #[test]
    fn disabling_drops_stale_binding() {
        let mut c = LinkController::default();
        c.on_link_changed(YOUTUBE);
        c.on_link_changed("https://example.com");
        assert!(c.binding.is_none());

        c.on_link_changed(REDDIT);
        let job = c.activate(REDDIT, dest()).expect("enabled");
        assert_eq!(job.category, Category::Reddit);
    }

    #[test]
    fn youtube_jobs_fetch_a_preview() {
        let mut c = LinkController::default();
        c.on_link_changed(YOUTUBE);
        let job = c.activate(&format!(" {YOUTUBE}\n"), dest()).expect("enabled");
        assert_eq!(job.category, Category::YouTube);
        assert!(job.preview);
        assert_eq!(job.url, YOUTUBE);
    }
}
