//! Spotify Playlist Ripper Library
//!
//! This library resolves a Spotify playlist into its tracks, downloads every
//! track from an external audio source, encodes it as an MP3 and checks that the
//! result meets the configured bitrate. The work is done one track at a time and
//! every track ends up in the final summary, either as a success, a degraded
//! file or a failure.
//!
//! # Modules
//!
//! - `cli` - Command-line entry points
//! - `config` - Configuration management and environment variables
//! - `download` - Search, download and MP3 encoding of a single track
//! - `error` - Crate-wide error type
//! - `logging` - File logger setup
//! - `management` - Access token lifetime
//! - `pipeline` - Sequential processing of a resolved playlist
//! - `quality` - Bitrate and format validation of downloaded files
//! - `report` - Progress bar and final summary
//! - `spotify` - Spotify Web API client implementation
//! - `types` - Data structures and type definitions
//! - `utils` - Utility functions and helpers

pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod logging;
pub mod management;
pub mod pipeline;
pub mod quality;
pub mod report;
pub mod spotify;
pub mod types;
pub mod utils;

pub use error::{Error, Result};

/// Prints an informational message with a blue bullet point.
///
/// # Example
///
/// ```
/// info!("Fetching track list from playlist {}", url);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
///
/// # Example
///
/// ```
/// success!("Downloaded {} tracks", count);
/// ```
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Only used for fatal errors: missing credentials, an unresolvable playlist or
/// an unusable download folder. The program exits with status 1 after printing.
///
/// # Example
///
/// ```
/// error!("Missing required environment variable: {}", var_name);
/// // Program exits here - code after this will not execute
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// Used for per-track problems and configuration issues that don't stop the run.
///
/// # Example
///
/// ```
/// warning!("No source found for {}", track);
/// ```
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
