//! Progress and end-of-run summary.
//!
//! A [`Reporter`] owns the progress bar for a run and collects one
//! [`DownloadResult`] per track. Per-track outcomes are printed above the bar as
//! they arrive; [`Reporter::finish`] prints the summary table and the counts.

use std::path::Path;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tabled::Table;

use crate::{
    info, success,
    types::{DownloadResult, Summary, SummaryTableRow, Track, TrackStatus},
    warning,
};

pub struct Reporter {
    pb: ProgressBar,
    results: Vec<DownloadResult>,
    summary: Summary,
}

impl Reporter {
    pub fn new(total: usize) -> Self {
        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::with_template(
                "{spinner:.blue} {msg} [{bar:30.cyan/blue}] {pos}/{len} {elapsed}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ")
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        Self::with_bar(pb)
    }

    /// Draws the bar only when stdout is a terminal, so redirected output
    /// holds just the status lines and the summary.
    pub fn for_output(is_terminal: bool, total: usize) -> Self {
        if is_terminal {
            Self::new(total)
        } else {
            Self::hidden(total)
        }
    }

    /// A reporter that draws nothing.
    pub fn hidden(total: usize) -> Self {
        Self::with_bar(ProgressBar::with_draw_target(
            Some(total as u64),
            ProgressDrawTarget::hidden(),
        ))
    }

    fn with_bar(pb: ProgressBar) -> Self {
        Self {
            pb,
            results: Vec::new(),
            summary: Summary::default(),
        }
    }

    pub fn track_started(&self, index: usize, track: &Track) {
        log::info!(
            "Processing track {}/{}: '{}'",
            index + 1,
            self.pb.length().unwrap_or(0),
            track
        );
        self.pb.set_message(format!("{}", track));
    }

    pub fn record(&mut self, result: DownloadResult) {
        self.pb.suspend(|| match result.status {
            TrackStatus::Success => success!(
                "{} ({})",
                result.track,
                result.source.as_deref().unwrap_or("-")
            ),
            TrackStatus::Degraded => warning!("{} degraded: {}", result.track, result.message),
            TrackStatus::Failed => warning!("{} failed: {}", result.track, result.message),
        });

        self.summary.add(result.status);
        self.results.push(result);
        self.pb.inc(1);
    }

    pub fn summary(&self) -> Summary {
        self.summary
    }

    pub fn results(&self) -> &[DownloadResult] {
        &self.results
    }

    /// Clears the bar and prints the summary. Returns the final counts.
    pub fn finish(self, folder: &Path) -> Summary {
        self.pb.finish_and_clear();

        if !self.results.is_empty() {
            let rows: Vec<SummaryTableRow> = self.results.iter().map(table_row).collect();
            println!("{}", Table::new(rows));
        }

        let folder = std::path::absolute(folder).unwrap_or_else(|_| folder.to_path_buf());
        log::info!(
            "Done: {} succeeded, {} degraded, {} failed",
            self.summary.succeeded,
            self.summary.degraded,
            self.summary.failed
        );

        info!(
            "{} tracks: {} succeeded, {} degraded, {} failed",
            self.summary.total(),
            self.summary.succeeded,
            self.summary.degraded,
            self.summary.failed
        );
        info!("Files are in {}", folder.display());

        self.summary
    }
}

fn table_row(result: &DownloadResult) -> SummaryTableRow {
    let details = match (result.status, result.bitrate_kbps) {
        (TrackStatus::Failed, _) | (_, None) => result.message.clone(),
        (_, Some(kbps)) => format!("{} kbps", kbps),
    };

    SummaryTableRow {
        status: result.status.to_string(),
        track: result.track.title.clone(),
        artist: result.track.artist.clone(),
        source: result.source.clone().unwrap_or_else(|| "-".to_string()),
        details,
    }
}
