pub mod runner;

use std::path::Path;
use tracing::warn;

use crate::config::{AccelCategory, AccelConfig, StyleConfig};
use crate::fonts::{self, ResolvedFont};

const NVENC_DEFAULT_QP: u32 = 23;
const VIDEOTOOLBOX_DEFAULT_QUALITY: u32 = 65;
const QSV_DEFAULT_QUALITY: u32 = 23;
const AMF_DEFAULT_QP: u32 = 23;

/// Build the full ffmpeg argument list for burning one subtitle into one
/// video. Pure apart from an existence check on an explicitly configured
/// font file; `accel.category` must already be resolved (no probing here).
pub fn build_command(
    video_path: &Path,
    subtitle_path: &Path,
    output_path: &Path,
    style: &StyleConfig,
    accel: &AccelConfig,
    resolved_font: Option<&ResolvedFont>,
) -> Vec<String> {
    let category = if accel.enabled {
        accel.category
    } else {
        AccelCategory::Cpu
    };

    let mut command = vec!["ffmpeg".to_string()];

    // subtitles filter needs CPU frames, so only the decode side is
    // accelerated; no hw output format is forced.
    if let Some(api) = hwaccel_api(category) {
        command.push("-hwaccel".to_string());
        command.push(api.to_string());
    }

    command.push("-i".to_string());
    command.push(video_path.to_string_lossy().to_string());

    command.push("-vf".to_string());
    command.push(subtitle_filter(subtitle_path, style, resolved_font));

    command.push("-c:v".to_string());
    command.push(encoder_name(category).to_string());
    command.extend(quality_args(category, accel.quality));

    command.push("-c:a".to_string());
    command.push("copy".to_string());

    command.push("-y".to_string());
    command.push(output_path.to_string_lossy().to_string());

    command
}

fn hwaccel_api(category: AccelCategory) -> Option<&'static str> {
    match category {
        AccelCategory::Nvidia => Some("cuda"),
        AccelCategory::Apple => Some("videotoolbox"),
        AccelCategory::Amd => Some("dxva2"),
        AccelCategory::Intel => Some("qsv"),
        AccelCategory::Cpu | AccelCategory::Auto => None,
    }
}

fn encoder_name(category: AccelCategory) -> &'static str {
    match category {
        AccelCategory::Nvidia => "h264_nvenc",
        AccelCategory::Apple => "h264_videotoolbox",
        AccelCategory::Amd => "h264_amf",
        AccelCategory::Intel => "h264_qsv",
        AccelCategory::Cpu | AccelCategory::Auto => "libx264",
    }
}

/// Quality arguments in each encoder's native unit system. libx264 is left
/// at its defaults.
fn quality_args(category: AccelCategory, quality: Option<u32>) -> Vec<String> {
    match category {
        AccelCategory::Nvidia => {
            let qp = quality.unwrap_or(NVENC_DEFAULT_QP);
            vec![
                "-preset".to_string(),
                "p4".to_string(),
                "-rc".to_string(),
                "constqp".to_string(),
                "-qp".to_string(),
                qp.to_string(),
            ]
        }
        AccelCategory::Apple => {
            let q = quality.unwrap_or(VIDEOTOOLBOX_DEFAULT_QUALITY);
            vec!["-q:v".to_string(), q.to_string()]
        }
        AccelCategory::Intel => {
            let q = quality.unwrap_or(QSV_DEFAULT_QUALITY);
            vec!["-global_quality".to_string(), q.to_string()]
        }
        AccelCategory::Amd => {
            let qp = quality.unwrap_or(AMF_DEFAULT_QP);
            vec![
                "-rc".to_string(),
                "cqp".to_string(),
                "-qp_i".to_string(),
                qp.to_string(),
                "-qp_p".to_string(),
                qp.to_string(),
                "-qp_b".to_string(),
                qp.to_string(),
            ]
        }
        AccelCategory::Cpu | AccelCategory::Auto => Vec::new(),
    }
}

/// Escape a path for use inside an ffmpeg filter argument: forward slashes
/// only, drive-letter colons escaped.
pub fn escape_filter_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/").replace(':', "\\:")
}

fn subtitle_filter(
    subtitle_path: &Path,
    style: &StyleConfig,
    resolved_font: Option<&ResolvedFont>,
) -> String {
    // Upstream normalization rewrites subtitles as UTF-8, so the charset is
    // declared unconditionally.
    let mut filter = format!(
        "subtitles='{}':charenc=UTF-8",
        escape_filter_path(subtitle_path)
    );

    let font = choose_font(style, resolved_font);

    if let Some(ResolvedFont::File(path)) = &font {
        if let Some(dir) = path.parent() {
            filter.push_str(&format!(":fontsdir='{}'", escape_filter_path(dir)));
        }
    }

    filter.push_str(&format!(
        ":force_style='{}'",
        force_style_clause(style, font.as_ref())
    ));

    filter
}

/// Font precedence: explicit style font (file path or family name), then the
/// per-language resolution when auto_font is on.
fn choose_font(style: &StyleConfig, resolved_font: Option<&ResolvedFont>) -> Option<ResolvedFont> {
    if let Some(font) = &style.font {
        if fonts::is_font_file_path(font) {
            let path = Path::new(font);
            if path.is_file() {
                return Some(ResolvedFont::File(path.to_path_buf()));
            }
            warn!("Configured font file not found: {}", font);
        } else {
            return Some(ResolvedFont::Name(font.clone()));
        }
    }

    if style.auto_font {
        return resolved_font.cloned();
    }

    None
}

fn force_style_clause(style: &StyleConfig, font: Option<&ResolvedFont>) -> String {
    let mut params = Vec::new();

    if let Some(size) = style.font_size {
        params.push(format!("FontSize={}", size));
    }
    if let Some(margin) = style.margin_v {
        params.push(format!("MarginV={}", margin));
    }
    if let Some(alignment) = style.alignment {
        params.push(format!("Alignment={}", alignment));
    }

    match font {
        Some(ResolvedFont::File(path)) => {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                params.push(format!("FontName={}", stem));
            }
        }
        Some(ResolvedFont::Name(name)) => {
            params.push(format!("FontName={}", name));
        }
        None => {}
    }

    // Always pinned so baked-in subtitle styles cannot reintroduce them.
    params.push(format!("Outline={}", style.outline.unwrap_or(0)));
    params.push(format!("Shadow={}", style.shadow.unwrap_or(0)));

    params.join(",")
}
