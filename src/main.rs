use clap::{
    CommandFactory, Parser,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use spotrip::{cli, config, logging, warning};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    /// Spotify playlist link, URI or id
    #[clap(required_unless_present = "completions")]
    playlist_url: Option<String>,

    /// Folder for the MP3 files [default: DEFAULT_DOWNLOAD_DIR or "Downloads"]
    download_folder: Option<String>,

    /// Print shell completions and exit
    #[clap(long, value_name = "SHELL", exclusive = true)]
    completions: Option<Shell>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(shell, &mut cmd, name, &mut std::io::stdout());
        return;
    }

    let loaded = config::load_env().await;
    if let Err(e) = logging::init(&config::log_level(), &config::log_file()) {
        warning!("{}. Logging to stderr.", e);
    }

    match loaded {
        Ok(files) => {
            for file in files {
                log::debug!("Loaded environment from {}", file.display());
            }
        }
        Err(e) => {
            log::warn!("Cannot load environment: {}", e);
            warning!("Cannot load environment. Err: {}", e);
        }
    }

    let Some(playlist_url) = cli.playlist_url else {
        return;
    };

    let code = cli::download(playlist_url, cli.download_folder).await;
    std::process::exit(code);
}
