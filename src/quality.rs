//! Quality Validator.
//!
//! Probes a file with `ffprobe` and decides whether it meets the MP3 bitrate
//! target. Files that miss the target are reported as degraded, never
//! re-encoded.

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use crate::{
    config,
    error::{Error, Result},
};

/// Container and stream properties of an audio file.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioProbe {
    pub format_name: String,
    pub bit_rate_bps: u64,
    pub duration_ms: Option<u64>,
}

impl AudioProbe {
    pub fn bitrate_kbps(&self) -> u32 {
        (self.bit_rate_bps / 1000) as u32
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Accepted,
    Degraded(Vec<String>),
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }

    pub fn reasons(&self) -> String {
        match self {
            Verdict::Accepted => String::new(),
            Verdict::Degraded(reasons) => reasons.join("; "),
        }
    }
}

/// Result of validating one file.
#[derive(Debug, Clone)]
pub struct QualityReport {
    pub probe: Option<AudioProbe>,
    pub verdict: Verdict,
}

impl QualityReport {
    pub fn bitrate_kbps(&self) -> Option<u32> {
        self.probe.as_ref().map(AudioProbe::bitrate_kbps)
    }
}

#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, path: &Path) -> Result<AudioProbe>;
}

/// Thresholds a downloaded file is held to.
#[derive(Debug, Clone, Copy)]
pub struct QualityPolicy {
    pub target_kbps: u32,
    /// Encoders report 319999 for a 320k stream, so the target is relaxed slightly.
    pub tolerance_kbps: u32,
    pub duration_tolerance_ms: u64,
}

impl Default for QualityPolicy {
    fn default() -> Self {
        Self::new(320)
    }
}

impl QualityPolicy {
    pub fn new(target_kbps: u32) -> Self {
        Self {
            target_kbps,
            tolerance_kbps: 5,
            duration_tolerance_ms: 5000,
        }
    }

    pub fn min_bit_rate_bps(&self) -> u64 {
        u64::from(self.target_kbps.saturating_sub(self.tolerance_kbps)) * 1000
    }

    pub fn evaluate(&self, probe: &AudioProbe, expected_duration_ms: Option<u64>) -> Verdict {
        let mut reasons = Vec::new();

        if !probe.format_name.to_lowercase().contains("mp3") {
            reasons.push(format!("format is {}, expected mp3", probe.format_name));
        }

        if probe.bit_rate_bps < self.min_bit_rate_bps() {
            reasons.push(format!(
                "bitrate {} kbps is below {} kbps",
                probe.bitrate_kbps(),
                self.target_kbps
            ));
        }

        if let Some(expected) = expected_duration_ms {
            match probe.duration_ms {
                Some(actual) if actual.abs_diff(expected) > self.duration_tolerance_ms => {
                    reasons.push(format!(
                        "duration {} differs from expected {}",
                        crate::utils::format_duration(actual),
                        crate::utils::format_duration(expected)
                    ));
                }
                Some(_) => {}
                None => reasons.push("duration unknown".to_string()),
            }
        }

        if reasons.is_empty() {
            Verdict::Accepted
        } else {
            Verdict::Degraded(reasons)
        }
    }
}

/// Probes and evaluates a file.
///
/// A missing file or a failed probe is not an error: the file is degraded with
/// the probe failure as reason.
pub async fn validate(
    prober: &dyn Prober,
    policy: &QualityPolicy,
    path: &Path,
    expected_duration_ms: Option<u64>,
) -> QualityReport {
    if !async_fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
    {
        log::warn!("Validation failed: {} does not exist", path.display());
        return QualityReport {
            probe: None,
            verdict: Verdict::Degraded(vec!["file does not exist".to_string()]),
        };
    }

    match prober.probe(path).await {
        Ok(probe) => {
            let verdict = policy.evaluate(&probe, expected_duration_ms);
            match &verdict {
                Verdict::Accepted => log::info!(
                    "Validation successful for {}: format={}, bitrate={}bps",
                    path.display(),
                    probe.format_name,
                    probe.bit_rate_bps
                ),
                Verdict::Degraded(_) => log::warn!(
                    "Validation failed for {}: {}",
                    path.display(),
                    verdict.reasons()
                ),
            }
            QualityReport {
                probe: Some(probe),
                verdict,
            }
        }
        Err(e) => {
            log::error!("Error probing {}: {}", path.display(), e);
            QualityReport {
                probe: None,
                verdict: Verdict::Degraded(vec![format!("probe failed: {}", e)]),
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    format_name: Option<String>,
    bit_rate: Option<String>,
    duration: Option<String>,
}

/// Parses `ffprobe -of json -show_entries format=...` output.
pub fn parse_ffprobe_json(output: &str) -> Result<AudioProbe> {
    let parsed: FfprobeOutput = serde_json::from_str(output)?;
    let format = parsed.format;

    Ok(AudioProbe {
        format_name: format.format_name.unwrap_or_default(),
        bit_rate_bps: format
            .bit_rate
            .and_then(|b| b.trim().parse::<u64>().ok())
            .unwrap_or(0),
        duration_ms: format
            .duration
            .and_then(|d| d.trim().parse::<f64>().ok())
            .map(|secs| (secs * 1000.0).round() as u64),
    })
}

pub struct FfprobeProber {
    bin: String,
}

impl FfprobeProber {
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }

    pub fn from_env() -> Self {
        Self::new(config::ffprobe_bin())
    }
}

#[async_trait]
impl Prober for FfprobeProber {
    async fn probe(&self, path: &Path) -> Result<AudioProbe> {
        let output = Command::new(&self.bin)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=format_name,bit_rate,duration",
                "-of",
                "json",
            ])
            .arg(path)
            .output()
            .await
            .map_err(|e| Error::tool(&self.bin, e.to_string()))?;

        if !output.status.success() {
            return Err(Error::tool(
                &self.bin,
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        parse_ffprobe_json(&String::from_utf8_lossy(&output.stdout))
    }
}
