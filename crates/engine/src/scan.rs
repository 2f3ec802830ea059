use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Allowed video file extensions
const VIDEO_EXTENSIONS: &[&str] = &[".mp4", ".avi", ".mov", ".mkv", ".flv", ".wmv"];

/// Subtitle file extensions. ".str" is a common typo'd variant kept for
/// compatibility with existing libraries.
pub const SUBTITLE_EXTENSIONS: &[&str] = &[".srt", ".str"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoAsset {
    /// File stem, without extension.
    pub base: String,
    /// Extension including the leading dot, original case.
    pub ext: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageGroup {
    /// Language code taken verbatim from the directory name.
    pub code: String,
    pub dir: PathBuf,
}

/// Scan the video root (flat, no recursion) for video files, sorted by
/// file name. A missing or unreadable root yields an empty list.
pub fn discover_videos(video_root: &Path) -> Vec<VideoAsset> {
    let mut assets = Vec::new();

    if !video_root.is_dir() {
        warn!("Video root is not a directory: {}", video_root.display());
        return assets;
    }

    for entry in WalkDir::new(video_root)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
    {
        match entry {
            Ok(entry) => {
                if !entry.file_type().is_file() {
                    continue;
                }

                let path = entry.path();
                if !is_video_file(path) {
                    continue;
                }

                let base = match path.file_stem().and_then(|s| s.to_str()) {
                    Some(stem) => stem.to_string(),
                    None => continue,
                };
                let ext = match path.extension().and_then(|e| e.to_str()) {
                    Some(ext) => format!(".{}", ext),
                    None => continue,
                };

                assets.push(VideoAsset {
                    base,
                    ext,
                    path: path.to_path_buf(),
                });
            }
            Err(e) => {
                warn!("Error accessing directory entry: {}", e);
                continue;
            }
        }
    }

    assets.sort_by(|a, b| {
        a.path
            .file_name()
            .cmp(&b.path.file_name())
    });
    debug!("Found {} video files", assets.len());
    assets
}

/// Scan the subtitle root for language groups: immediate subdirectories that
/// directly contain at least one subtitle file. Sorted by directory name.
pub fn discover_languages(subtitle_root: &Path) -> Vec<LanguageGroup> {
    let mut groups = Vec::new();

    if !subtitle_root.is_dir() {
        warn!(
            "Subtitle root is not a directory: {}",
            subtitle_root.display()
        );
        return groups;
    }

    for entry in WalkDir::new(subtitle_root)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
    {
        match entry {
            Ok(entry) => {
                if !entry.file_type().is_dir() {
                    continue;
                }

                let dir = entry.path();
                if !contains_subtitle_file(dir) {
                    debug!("Skipping directory without subtitles: {}", dir.display());
                    continue;
                }

                let code = match dir.file_name().and_then(|n| n.to_str()) {
                    Some(name) => name.to_string(),
                    None => continue,
                };

                groups.push(LanguageGroup {
                    code,
                    dir: dir.to_path_buf(),
                });
            }
            Err(e) => {
                warn!("Error accessing directory entry: {}", e);
                continue;
            }
        }
    }

    groups.sort_by(|a, b| a.code.cmp(&b.code));
    debug!("Found {} language groups", groups.len());
    groups
}

/// Check if a file has a video extension
pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext_lower = format!(".{}", ext.to_lowercase());
            VIDEO_EXTENSIONS.contains(&ext_lower.as_str())
        })
        .unwrap_or(false)
}

/// Check if a file name ends in a subtitle extension (exact suffix match).
pub fn is_subtitle_file(name: &str) -> bool {
    SUBTITLE_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}

fn contains_subtitle_file(dir: &Path) -> bool {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Failed to read directory {}: {}", dir.display(), e);
            return false;
        }
    };

    for entry in entries.flatten() {
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            if is_subtitle_file(name) {
                return true;
            }
        }
    }

    false
}
