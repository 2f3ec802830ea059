use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

const FONT_EXTENSIONS: &[&str] = &[".ttf", ".otf", ".ttc", ".woff", ".woff2"];

/// Recommended font families per uppercase language code, priority ordered.
const LANGUAGE_FONT_MAP: &[(&str, &[&str])] = &[
    // Arabic script
    ("AR", &["Noto Sans Arabic", "Arial Unicode MS", "Traditional Arabic", "Simplified Arabic"]),
    ("FA", &["Noto Sans Arabic", "Arial Unicode MS", "Traditional Arabic"]),
    ("UR", &["Noto Sans Arabic", "Arial Unicode MS"]),
    // East Asian
    ("CN", &["Noto Sans CJK SC", "Microsoft YaHei", "SimHei", "PingFang SC", "Noto Sans SC"]),
    ("ZH", &["Noto Sans CJK SC", "Microsoft YaHei", "SimHei", "PingFang SC", "Noto Sans SC"]),
    ("TW", &["Noto Sans CJK TC", "Microsoft JhengHei", "PingFang TC", "Noto Sans TC"]),
    ("HK", &["Noto Sans CJK HK", "Microsoft JhengHei", "PingFang HK", "Noto Sans HK"]),
    ("JP", &["Noto Sans CJK JP", "Yu Gothic", "Meiryo", "MS Gothic", "Hiragino Sans"]),
    ("JA", &["Noto Sans CJK JP", "Yu Gothic", "Meiryo", "MS Gothic"]),
    ("KR", &["Noto Sans CJK KR", "Malgun Gothic", "Nanum Gothic", "Apple SD Gothic Neo"]),
    ("KO", &["Noto Sans CJK KR", "Malgun Gothic", "Nanum Gothic"]),
    // Southeast Asian
    ("TH", &["Noto Sans Thai", "Leelawadee", "Tahoma", "Arial Unicode MS"]),
    ("VI", &["Noto Sans", "Arial Unicode MS", "Times New Roman"]),
    ("MY", &["Noto Sans Myanmar", "Myanmar Text", "Arial Unicode MS"]),
    ("KM", &["Noto Sans Khmer", "Khmer UI", "Arial Unicode MS"]),
    ("LO", &["Noto Sans Lao", "DokChampa", "Arial Unicode MS"]),
    // South Asian
    ("HI", &["Noto Sans Devanagari", "Mangal", "Arial Unicode MS"]),
    ("BN", &["Noto Sans Bengali", "Vrinda", "Arial Unicode MS"]),
    ("TA", &["Noto Sans Tamil", "Latha", "Arial Unicode MS"]),
    ("TE", &["Noto Sans Telugu", "Gautami", "Arial Unicode MS"]),
    // European
    ("EN", &["Arial", "Helvetica", "Noto Sans", "Roboto"]),
    ("ES", &["Arial", "Helvetica", "Noto Sans"]),
    ("FR", &["Arial", "Helvetica", "Noto Sans"]),
    ("DE", &["Arial", "Helvetica", "Noto Sans"]),
    ("IT", &["Arial", "Helvetica", "Noto Sans"]),
    ("PT", &["Arial", "Helvetica", "Noto Sans"]),
    ("RU", &["Noto Sans", "Arial Unicode MS", "DejaVu Sans"]),
    ("EL", &["Noto Sans", "Arial Unicode MS", "DejaVu Sans"]),
    // Other
    ("HE", &["Noto Sans Hebrew", "Arial Unicode MS", "David"]),
    ("TR", &["Noto Sans", "Arial", "Calibri"]),
    ("ID", &["Noto Sans", "Arial", "Calibri"]),
    ("MS", &["Noto Sans", "Arial", "Calibri"]),
];

/// Generic fallbacks when no language-specific entry matches.
const FALLBACK_FONTS: &[&str] = &[
    "Noto Sans",
    "Arial Unicode MS",
    "DejaVu Sans",
    "FreeSans",
    "Liberation Sans",
];

/// Keywords matched against font file names when no recommended family name
/// appears in the local font assets.
const LANGUAGE_KEYWORDS: &[(&str, &[&str])] = &[
    ("AR", &["arabic", "arab"]),
    ("FA", &["arabic", "persian", "farsi"]),
    ("UR", &["arabic", "urdu"]),
    ("TH", &["thai"]),
    ("MY", &["myanmar", "burma"]),
    ("HE", &["hebrew"]),
    ("HI", &["devanagari", "hindi"]),
    ("BN", &["bengali"]),
    ("TA", &["tamil"]),
    ("CN", &["cjk", "chinese", "sc", "hans", "simp"]),
    ("ZH", &["cjk", "chinese", "sc", "hans", "simp"]),
    ("TW", &["cjk", "chinese", "tc", "hant", "trad"]),
    ("HK", &["cjk", "chinese", "hk"]),
    ("JP", &["cjk", "japanese", "jp"]),
    ("JA", &["cjk", "japanese", "jp"]),
    ("KR", &["cjk", "korean", "kr"]),
    ("KO", &["cjk", "korean", "kr"]),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontAsset {
    pub name: String,
    pub path: PathBuf,
}

/// A font usable for subtitle rendering: either a local font file or an
/// installed family name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedFont {
    File(PathBuf),
    Name(String),
}

/// Recommended font families for a language code: exact table match, then a
/// two-character prefix match, then the generic fallbacks.
pub fn recommend(language_code: &str) -> Vec<String> {
    let lang = language_code.to_uppercase();

    for (key, fonts) in LANGUAGE_FONT_MAP {
        if *key == lang {
            return fonts.iter().map(|f| f.to_string()).collect();
        }
    }

    let prefix: String = lang.chars().take(2).collect();
    if !prefix.is_empty() {
        for (key, fonts) in LANGUAGE_FONT_MAP {
            if key.starts_with(&prefix) {
                return fonts.iter().map(|f| f.to_string()).collect();
            }
        }
    }

    FALLBACK_FONTS.iter().map(|f| f.to_string()).collect()
}

/// List font files in a directory, sorted by file name. Missing directory
/// yields an empty list.
pub fn list_font_assets(fonts_dir: &Path) -> Vec<FontAsset> {
    let mut assets = Vec::new();

    if !fonts_dir.is_dir() {
        return assets;
    }

    for entry in WalkDir::new(fonts_dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .into_iter()
        .flatten()
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let name = match entry.file_name().to_str() {
            Some(name) => name.to_string(),
            None => continue,
        };
        if !is_font_file_name(&name) {
            continue;
        }
        assets.push(FontAsset {
            name,
            path: entry.path().to_path_buf(),
        });
    }

    assets.sort_by(|a, b| a.name.cmp(&b.name));
    assets
}

/// Pick a usable font for a language. Local font assets win over installed
/// families; "Arial" is the unconditional last resort, so this never fails.
pub fn resolve_available(language_code: &str, fonts_dir: &Path) -> ResolvedFont {
    let recommended = recommend(language_code);

    if let Some(path) = find_font_file(language_code, &recommended, fonts_dir) {
        debug!("Resolved font file for {}: {}", language_code, path.display());
        return ResolvedFont::File(path);
    }

    for family in &recommended {
        if system_font_installed(family) {
            debug!("Resolved system font for {}: {}", language_code, family);
            return ResolvedFont::Name(family.clone());
        }
    }

    if system_font_installed("Arial Unicode MS") {
        return ResolvedFont::Name("Arial Unicode MS".to_string());
    }

    ResolvedFont::Name("Arial".to_string())
}

/// Whether a style font value refers to a font file rather than a family name.
pub fn is_font_file_path(font: &str) -> bool {
    if font.contains('/') || font.contains('\\') {
        return true;
    }
    is_font_file_name(font)
}

fn is_font_file_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    FONT_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

fn find_font_file(
    language_code: &str,
    recommended: &[String],
    fonts_dir: &Path,
) -> Option<PathBuf> {
    let assets = list_font_assets(fonts_dir);
    if assets.is_empty() {
        return None;
    }

    // File name contains a recommended family name.
    for family in recommended {
        let family_key = squash(family);
        for asset in &assets {
            if squash(&asset.name).contains(&family_key) {
                return Some(asset.path.clone());
            }
        }
    }

    // File name contains a language keyword.
    let lang = language_code.to_uppercase();
    for (key, keywords) in LANGUAGE_KEYWORDS {
        if *key != lang {
            continue;
        }
        for keyword in *keywords {
            for asset in &assets {
                if asset.name.to_lowercase().contains(keyword) {
                    return Some(asset.path.clone());
                }
            }
        }
    }

    None
}

/// Case- and separator-insensitive form used for font name containment checks.
fn squash(s: &str) -> String {
    s.to_lowercase().replace([' ', '-'], "")
}

fn system_font_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    #[cfg(target_os = "macos")]
    {
        dirs.push(PathBuf::from("/System/Library/Fonts"));
        dirs.push(PathBuf::from("/Library/Fonts"));
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(home).join("Library/Fonts"));
        }
    }

    #[cfg(target_os = "windows")]
    {
        let windir = std::env::var("WINDIR").unwrap_or_else(|_| "C:\\Windows".to_string());
        dirs.push(PathBuf::from(windir).join("Fonts"));
    }

    #[cfg(all(unix, not(target_os = "macos")))]
    {
        dirs.push(PathBuf::from("/usr/share/fonts"));
        dirs.push(PathBuf::from("/usr/local/share/fonts"));
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(&home).join(".fonts"));
            dirs.push(PathBuf::from(&home).join(".local/share/fonts"));
        }
    }

    dirs
}

fn system_font_installed(family: &str) -> bool {
    let family_key = squash(family);

    for dir in system_font_dirs() {
        if !dir.is_dir() {
            continue;
        }
        for entry in WalkDir::new(&dir).follow_links(false).into_iter().flatten() {
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if is_font_file_name(name) && squash(name).contains(&family_key) {
                    return true;
                }
            }
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recommend_exact_match() {
        let fonts = recommend("AR");
        assert_eq!(fonts[0], "Noto Sans Arabic");
    }

    #[test]
    fn test_recommend_case_insensitive() {
        assert_eq!(recommend("ar"), recommend("AR"));
    }

    #[test]
    fn test_recommend_prefix_match() {
        // "JPN" falls back to the "JP" entry via its two-char prefix.
        assert_eq!(recommend("JPN"), recommend("JP"));
    }

    #[test]
    fn test_recommend_unknown_uses_fallbacks() {
        let fonts = recommend("XQ");
        assert_eq!(fonts[0], "Noto Sans");
        assert_eq!(fonts.len(), FALLBACK_FONTS.len());
    }

    #[test]
    fn test_is_font_file_path() {
        assert!(is_font_file_path("NotoSansArabic.ttf"));
        assert!(is_font_file_path("/usr/share/fonts/arial.otf"));
        assert!(is_font_file_path("fonts\\arial.ttf"));
        assert!(!is_font_file_path("Noto Sans Arabic"));
    }

    #[test]
    fn test_squash() {
        assert_eq!(squash("Noto Sans Arabic"), "notosansarabic");
        assert_eq!(squash("NotoSans-Arabic"), "notosansarabic");
    }
}
