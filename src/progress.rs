use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner frames shown next to a running download.
const SPINNER_FRAMES: &str = "|/-\\ ";

/// Redraw interval for the progress line.
const REDRAW_INTERVAL: Duration = Duration::from_millis(100);

/// Progress line for one download.
///
/// Each download owns its own bar, so spinner state never leaks between
/// transfers.
pub struct DownloadProgress {
    bar: ProgressBar,
}

impl DownloadProgress {
    /// Start a progress line for `label`. With an unknown `total` the line
    /// shows a spinner and the byte count instead of a percentage.
    pub fn start(label: &str, total: Option<u64>, visible: bool) -> Self {
        let bar = match (visible, total) {
            (false, _) => ProgressBar::hidden(),
            (true, Some(total)) => ProgressBar::new(total).with_style(
                ProgressStyle::with_template("  {spinner} Downloading {msg}: {percent:>3}% ({bytes}/{total_bytes})")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .tick_chars(SPINNER_FRAMES),
            ),
            (true, None) => ProgressBar::new_spinner().with_style(
                ProgressStyle::with_template("  {spinner} Downloading {msg}: {bytes}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner())
                    .tick_chars(SPINNER_FRAMES),
            ),
        };
        bar.set_message(label.to_string());
        if visible {
            bar.enable_steady_tick(REDRAW_INTERVAL);
        }
        Self { bar }
    }

    pub fn set_position(&self, bytes: u64) {
        self.bar.set_position(bytes);
    }

    pub fn finish(self) {
        self.bar.finish_and_clear();
    }

    pub fn abandon(self) {
        self.bar.abandon();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_progress_still_tracks_position() {
        let progress = DownloadProgress::start("kof98.zip", Some(1000), false);
        progress.set_position(250);
        assert_eq!(progress.bar.position(), 250);
        progress.finish();

        let progress = DownloadProgress::start("mystery.bin", None, false);
        progress.set_position(42);
        assert_eq!(progress.bar.position(), 42);
        progress.abandon();
    }
}
