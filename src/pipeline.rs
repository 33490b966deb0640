use std::path::Path;

use crate::{download::TrackDownloader, report::Reporter, types::Summary, types::Track};

/// Runs every track through the downloader, one at a time and in playlist order.
///
/// A failing track never stops the run. The returned counts always add up to
/// `tracks.len()`.
pub async fn process_tracks(
    tracks: &[Track],
    folder: &Path,
    downloader: &TrackDownloader,
    reporter: &mut Reporter,
) -> Summary {
    for (index, track) in tracks.iter().enumerate() {
        reporter.track_started(index, track);
        let result = downloader.download(track, folder).await;
        reporter.record(result);
    }

    reporter.summary()
}
