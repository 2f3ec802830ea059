use anyhow::{anyhow, Context, Result};
use regex::Regex;
use std::process::Command;

/// Verify ffmpeg is on PATH and report its version triple. No minimum
/// version is enforced; the subtitles filter and H.264 encoders used here
/// are available in every release still in circulation.
pub fn check_ffmpeg() -> Result<(u32, u32, u32)> {
    let output = Command::new("ffmpeg")
        .arg("-version")
        .output()
        .context("Failed to execute ffmpeg -version. Is ffmpeg installed and in PATH?")?;

    if !output.status.success() {
        return Err(anyhow!("ffmpeg -version command failed"));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_version_triple(&stdout)
        .ok_or_else(|| anyhow!("Failed to parse ffmpeg version from output: {}", stdout))
}

/// Extract the version triple from `ffmpeg -version` banner text. Handles
/// distro prefixes like "n6.1.1" or "6.1.1-static".
fn parse_version_triple(banner: &str) -> Option<(u32, u32, u32)> {
    let re = Regex::new(r"ffmpeg version[^\d]*(\d+)\.(\d+)\.(\d+)").unwrap();
    let caps = re.captures(banner)?;
    let major = caps[1].parse().ok()?;
    let minor = caps[2].parse().ok()?;
    let patch = caps[3].parse().ok()?;
    Some((major, minor, patch))
}
