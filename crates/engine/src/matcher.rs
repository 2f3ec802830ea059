use std::path::PathBuf;
use tracing::debug;

use crate::scan::{is_subtitle_file, LanguageGroup, VideoAsset, SUBTITLE_EXTENSIONS};

/// Result of resolving a subtitle for one (video, language) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubtitleMatch {
    Matched(PathBuf),
    /// No subtitle found; carries the file stem that was searched for.
    Unmatched(String),
}

/// Resolve the subtitle file for a video within a language group.
///
/// Naming conventions are tried in priority order, each against both
/// subtitle extensions, and the first existing file wins:
///   1. `{name}_{lang}`
///   2. `{lang}_{name}`
///   3. `{name}.{lang}`
///   4. `{lang}`
/// If none exist, fall back to a substring scan: any subtitle file in the
/// group directory whose name contains the language code. The listing is
/// sorted so the pick is deterministic.
pub fn match_subtitle(video: &VideoAsset, group: &LanguageGroup) -> SubtitleMatch {
    let name = &video.base;
    let lang = &group.code;

    let stems = [
        format!("{}_{}", name, lang),
        format!("{}_{}", lang, name),
        format!("{}.{}", name, lang),
        lang.clone(),
    ];

    for stem in &stems {
        for ext in SUBTITLE_EXTENSIONS {
            let candidate = group.dir.join(format!("{}{}", stem, ext));
            if candidate.is_file() {
                debug!(
                    "Matched subtitle for {} [{}]: {}",
                    name,
                    lang,
                    candidate.display()
                );
                return SubtitleMatch::Matched(candidate);
            }
        }
    }

    // Fallback: any subtitle file whose name contains the language code.
    if let Ok(entries) = std::fs::read_dir(&group.dir) {
        let mut names: Vec<String> = entries
            .flatten()
            .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|e| e.file_name().to_str().map(String::from))
            .filter(|n| is_subtitle_file(n))
            .collect();
        names.sort();

        for file_name in names {
            if file_name.contains(lang.as_str()) {
                let candidate = group.dir.join(&file_name);
                debug!(
                    "Fuzzy-matched subtitle for {} [{}]: {}",
                    name,
                    lang,
                    candidate.display()
                );
                return SubtitleMatch::Matched(candidate);
            }
        }
    }

    debug!("No subtitle for {} [{}]", name, lang);
    SubtitleMatch::Unmatched(name.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    fn video(base: &str) -> VideoAsset {
        VideoAsset {
            base: base.to_string(),
            ext: ".mp4".to_string(),
            path: PathBuf::from(format!("/videos/{}.mp4", base)),
        }
    }

    fn group(dir: &TempDir, code: &str) -> LanguageGroup {
        LanguageGroup {
            code: code.to_string(),
            dir: dir.path().to_path_buf(),
        }
    }

    fn touch(dir: &TempDir, name: &str) {
        File::create(dir.path().join(name)).expect("create fixture file");
    }

    #[test]
    fn test_name_lang_wins_over_lang_name() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "movie_AR.srt");
        touch(&dir, "AR_movie.srt");

        let result = match_subtitle(&video("movie"), &group(&dir, "AR"));
        assert_eq!(
            result,
            SubtitleMatch::Matched(dir.path().join("movie_AR.srt"))
        );
    }

    #[test]
    fn test_srt_wins_over_str_within_pattern() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "movie_AR.srt");
        touch(&dir, "movie_AR.str");

        let result = match_subtitle(&video("movie"), &group(&dir, "AR"));
        assert_eq!(
            result,
            SubtitleMatch::Matched(dir.path().join("movie_AR.srt"))
        );
    }

    #[test]
    fn test_str_accepted_when_srt_absent() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "movie_AR.str");

        let result = match_subtitle(&video("movie"), &group(&dir, "AR"));
        assert_eq!(
            result,
            SubtitleMatch::Matched(dir.path().join("movie_AR.str"))
        );
    }

    #[test]
    fn test_bare_lang_pattern() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "AR.srt");

        let result = match_subtitle(&video("movie"), &group(&dir, "AR"));
        assert_eq!(result, SubtitleMatch::Matched(dir.path().join("AR.srt")));
    }

    #[test]
    fn test_fuzzy_fallback_sorted_first_hit() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "zz_AR_extra.srt");
        touch(&dir, "aa_AR_extra.srt");

        let result = match_subtitle(&video("movie"), &group(&dir, "AR"));
        assert_eq!(
            result,
            SubtitleMatch::Matched(dir.path().join("aa_AR_extra.srt"))
        );
    }

    #[test]
    fn test_unmatched_carries_video_base() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "unrelated.srt");

        let result = match_subtitle(&video("movie"), &group(&dir, "FR"));
        assert_eq!(result, SubtitleMatch::Unmatched("movie".to_string()));
    }

    #[test]
    fn test_non_subtitle_files_ignored_by_fallback() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "notes_AR.txt");

        let result = match_subtitle(&video("movie"), &group(&dir, "AR"));
        assert_eq!(result, SubtitleMatch::Unmatched("movie".to_string()));
    }
}
