//! User-facing terminal output: the progress bar and the echo lines.

use dataset_uploader_core::contract::Notifier;
use dataset_uploader_core::error::PipelineError;
use indicatif::{ProgressBar, ProgressStyle};

/// Progress bar counting uploaded files (not bytes).
pub fn upload_progress_bar() -> anyhow::Result<ProgressBar> {
    let style = ProgressStyle::with_template("{msg} {bar:40.cyan/blue} {pos}/{len}")?
        .progress_chars("##-");
    Ok(ProgressBar::new(0)
        .with_style(style)
        .with_message("Uploading files to the object store"))
}

/// Prints pipeline lines to stdout without tearing the progress bar.
pub struct ConsoleNotifier {
    progress: ProgressBar,
}

impl ConsoleNotifier {
    pub fn new(progress: ProgressBar) -> Self {
        Self { progress }
    }

    pub fn error(&self, err: &PipelineError) {
        self.notify(&format!("Error: {err}"));
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, line: &str) {
        self.progress.suspend(|| println!("{line}"));
    }
}
