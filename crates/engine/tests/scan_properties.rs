use proptest::prelude::*;
use std::fs;
use std::path::PathBuf;
use subburn_engine::scan::{discover_languages, discover_videos, is_video_file};
use tempfile::TempDir;

/// Generate valid video file names with allowed extensions
fn video_file_name() -> impl Strategy<Value = String> {
    let extensions = vec![".mp4", ".avi", ".mov", ".mkv", ".flv", ".wmv"];
    ("[a-zA-Z0-9_-]{3,20}", prop::sample::select(extensions))
        .prop_map(|(name, ext)| format!("{}{}", name, ext))
}

/// Generate non-video file names
fn non_video_file_name() -> impl Strategy<Value = String> {
    let extensions = vec![".txt", ".jpg", ".png", ".nfo", ".srt", ".sub"];
    ("[a-zA-Z0-9_-]{3,20}", prop::sample::select(extensions))
        .prop_map(|(name, ext)| format!("{}{}", name, ext))
}

/// *For any* flat directory of mixed files, discovery returns exactly the
/// video files, sorted by file name, and never descends into subdirectories.
#[test]
fn property_flat_video_discovery() {
    proptest!(|(
        video_files in prop::collection::hash_set(video_file_name(), 1..15),
        other_files in prop::collection::hash_set(non_video_file_name(), 0..8),
    )| {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        for name in &video_files {
            fs::write(root.join(name), "video content").unwrap();
        }
        for name in &other_files {
            fs::write(root.join(name), "other content").unwrap();
        }

        // A nested video must not be discovered; the scan is flat.
        let nested = root.join("nested");
        fs::create_dir(&nested).unwrap();
        fs::write(nested.join("deep.mp4"), "nested video").unwrap();

        let results = discover_videos(root);

        prop_assert_eq!(results.len(), video_files.len());

        for asset in &results {
            let file_name = format!("{}{}", asset.base, asset.ext);
            prop_assert!(video_files.contains(&file_name),
                "Unexpected asset discovered: {}", file_name);
            prop_assert_eq!(asset.path.clone(), root.join(&file_name));
        }

        // Sorted by file name
        for pair in results.windows(2) {
            let a = format!("{}{}", pair[0].base, pair[0].ext);
            let b = format!("{}{}", pair[1].base, pair[1].ext);
            prop_assert!(a <= b, "Discovery order not sorted: {} before {}", a, b);
        }
    });
}

/// *For any* set of subtitle-bearing and empty subdirectories, only the
/// former qualify as language groups, sorted by directory name.
#[test]
fn property_language_group_qualification() {
    proptest!(|(
        qualified in prop::collection::hash_set("[A-Z]{2}", 1..6),
        unqualified in prop::collection::hash_set("[a-z]{4,8}", 0..4),
    )| {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        for code in &qualified {
            let dir = root.join(code);
            fs::create_dir(&dir).unwrap();
            fs::write(dir.join("sample.srt"), "1\n00:00:01,000 --> 00:00:02,000\nhi\n").unwrap();
        }
        for name in &unqualified {
            let dir = root.join(name);
            fs::create_dir(&dir).unwrap();
            fs::write(dir.join("readme.txt"), "not a subtitle").unwrap();
        }

        // Subtitle files directly in the root are not groups
        fs::write(root.join("stray.srt"), "stray").unwrap();

        let groups = discover_languages(root);

        let mut expected: Vec<String> = qualified.iter().cloned().collect();
        expected.sort();
        let found: Vec<String> = groups.iter().map(|g| g.code.clone()).collect();
        prop_assert_eq!(found, expected);

        for group in &groups {
            prop_assert_eq!(group.dir.clone(), root.join(&group.code));
        }
    });
}

#[test]
fn property_video_file_extension_detection() {
    proptest!(|(
        filename in "[a-zA-Z0-9_-]{3,20}",
        ext in prop::sample::select(vec![
            ".mp4", ".avi", ".mov", ".mkv", ".flv", ".wmv",
            ".MP4", ".AVI", ".MKV", // case insensitivity
        ])
    )| {
        let path = PathBuf::from(format!("{}{}", filename, ext));
        prop_assert!(is_video_file(&path),
            "File with extension {} should be recognized as video", ext);
    });
}

#[test]
fn property_non_video_file_rejection() {
    proptest!(|(
        filename in "[a-zA-Z0-9_-]{3,20}",
        ext in prop::sample::select(vec![
            ".txt", ".jpg", ".png", ".nfo", ".srt", ".sub", ".ts", ".m2ts"
        ])
    )| {
        let path = PathBuf::from(format!("{}{}", filename, ext));
        prop_assert!(!is_video_file(&path),
            "File with extension {} should not be recognized as video", ext);
    });
}

// Unit tests for edge cases

#[test]
fn test_missing_video_root_yields_empty() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("does_not_exist");
    assert!(discover_videos(&missing).is_empty());
}

#[test]
fn test_missing_subtitle_root_yields_empty() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("does_not_exist");
    assert!(discover_languages(&missing).is_empty());
}

#[test]
fn test_video_root_that_is_a_file_yields_empty() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("not_a_dir");
    fs::write(&file, "contents").unwrap();
    assert!(discover_videos(&file).is_empty());
}

#[test]
fn test_str_extension_qualifies_language_dir() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().join("AR");
    fs::create_dir(&dir).unwrap();
    fs::write(dir.join("movie.str"), "subtitle").unwrap();

    let groups = discover_languages(temp_dir.path());
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].code, "AR");
}

#[test]
fn test_nested_subtitles_do_not_qualify_parent() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().join("AR");
    let inner = dir.join("inner");
    fs::create_dir_all(&inner).unwrap();
    fs::write(inner.join("movie.srt"), "subtitle").unwrap();

    // AR holds no subtitle directly, only via a nested directory
    assert!(discover_languages(temp_dir.path()).is_empty());
}

#[test]
fn test_video_asset_fields() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("My.Movie.2024.mkv"), "x").unwrap();

    let assets = discover_videos(temp_dir.path());
    assert_eq!(assets.len(), 1);
    assert_eq!(assets[0].base, "My.Movie.2024");
    assert_eq!(assets[0].ext, ".mkv");
}
