use std::process::Command;
use tracing::debug;

use crate::config::AccelCategory;

/// Check for a usable NVIDIA GPU by running nvidia-smi.
pub fn has_nvidia_gpu() -> bool {
    match Command::new("nvidia-smi").output() {
        Ok(output) => output.status.success(),
        Err(_) => false,
    }
}

/// Apple Silicon is a compile-time property of the build target.
pub fn is_apple_silicon() -> bool {
    cfg!(all(target_os = "macos", target_arch = "aarch64"))
}

/// Resolve `Auto` to a concrete category based on what this host has.
/// Explicit categories pass through unprobed; the user asserted them.
pub fn resolve_category(category: AccelCategory) -> AccelCategory {
    match category {
        AccelCategory::Auto => {
            if has_nvidia_gpu() {
                debug!("Auto acceleration resolved to nvidia");
                AccelCategory::Nvidia
            } else if is_apple_silicon() {
                debug!("Auto acceleration resolved to apple");
                AccelCategory::Apple
            } else {
                debug!("Auto acceleration resolved to cpu");
                AccelCategory::Cpu
            }
        }
        other => other,
    }
}
