//! Build script for spotrip.
//!
//! Copies the `.env.example` template into the local data directory, next to
//! the `.env` that [`config::load_env`] reads at runtime:
//! - Linux: `~/.local/share/spotrip/.env.example`
//! - macOS: `~/Library/Application Support/spotrip/.env.example`
//! - Windows: `%LOCALAPPDATA%/spotrip/.env.example`
//!
//! A missing template only produces a cargo warning.

use std::{env, fs, path::PathBuf};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=.env.example");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let template = manifest_dir.join(".env.example");

    if !template.is_file() {
        println!(
            "cargo:warning=.env.example not found at {}",
            template.display()
        );
        return Ok(());
    }

    let mut out_dir = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    out_dir.push("spotrip");
    fs::create_dir_all(&out_dir)?;
    fs::copy(&template, out_dir.join(".env.example"))?;

    Ok(())
}
