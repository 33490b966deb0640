use std::{fs::OpenOptions, io::Write};

use env_logger::{Builder, Target};

use crate::config;

/// Initializes the `log` facade.
///
/// Records are appended to `log_file` as
/// `<timestamp> - <LEVEL> - <module> - <message>` so the terminal stays free
/// for the progress bar. When the file cannot be opened the logger writes to
/// stderr instead and the error is returned for the caller to report.
pub fn init(level: &str, log_file: &str) -> Result<(), String> {
    let mut builder = Builder::new();
    builder
        .parse_filters(config::log_filter(level))
        .format(|buf, record| {
            writeln!(
                buf,
                "{} - {} - {} - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S,%3f"),
                record.level(),
                record.module_path().unwrap_or("spotrip"),
                record.args()
            )
        });

    let file = OpenOptions::new().create(true).append(true).open(log_file);
    let result = match file {
        Ok(file) => {
            builder.target(Target::Pipe(Box::new(file)));
            Ok(())
        }
        Err(e) => {
            builder.target(Target::Stderr);
            Err(format!("Cannot open log file {}: {}", log_file, e))
        }
    };

    // A second init in the same process (tests) keeps the first logger.
    let _ = builder.try_init();
    result
}
