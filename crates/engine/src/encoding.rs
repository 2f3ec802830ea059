use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, warn};

/// Detection below this confidence is logged and the guess is treated as one
/// candidate among many rather than trusted outright.
const CONFIDENCE_FLOOR: f32 = 0.7;

/// Generic fallback candidates, tried in order after the detector's guess and
/// any per-language hints.
const FALLBACK_ENCODINGS: &[&str] = &[
    "utf-8",
    "utf-8-sig",
    "windows-1256",
    "windows-1252",
    "gbk",
    "big5",
    "shift_jis",
    "euc-kr",
    "windows-1251",
    "latin-1",
];

#[derive(Debug, Clone, PartialEq)]
pub struct DetectedEncoding {
    pub name: String,
    pub confidence: f32,
}

/// Per-language encoding candidates, keyed by uppercase language code.
/// Tried between the detector's guess and the generic fallback list.
pub fn encoding_hints(language_code: &str) -> &'static [&'static str] {
    match language_code.to_uppercase().as_str() {
        "AR" => &["windows-1256", "iso-8859-6", "utf-8"],
        "FA" => &["windows-1256", "utf-8"],
        "CN" => &["gbk", "gb18030", "utf-8"],
        "TW" => &["big5", "utf-8"],
        "JP" => &["shift_jis", "euc-jp", "iso-2022-jp", "utf-8"],
        "KR" => &["euc-kr", "utf-8"],
        "TH" => &["windows-874", "utf-8"],
        "HE" => &["windows-1255", "iso-8859-8", "utf-8"],
        "RU" => &["windows-1251", "koi8-r", "utf-8"],
        "EL" => &["windows-1253", "iso-8859-7", "utf-8"],
        "TR" => &["windows-1254", "iso-8859-9", "utf-8"],
        _ => &[],
    }
}

/// Statistically detect a file's text encoding.
pub fn detect(path: &Path) -> Result<DetectedEncoding> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let (charset, confidence, _language) = chardet::detect(&bytes);
    Ok(DetectedEncoding {
        name: charset,
        confidence,
    })
}

/// Strict whole-file UTF-8 check.
pub fn is_utf8(path: &Path) -> bool {
    match std::fs::read(path) {
        Ok(bytes) => std::str::from_utf8(&bytes).is_ok(),
        Err(_) => false,
    }
}

/// Rewrite a subtitle file as UTF-8 in place. Already-UTF-8 files are left
/// byte-identical. Returns the name of the source encoding that decoded the
/// file.
///
/// The original is backed up to a sibling `.bak` before rewriting; the backup
/// is retained on success and restored (then removed) if every candidate
/// fails to decode.
pub fn normalize_to_utf8(path: &Path, language_code: Option<&str>) -> Result<String> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    if std::str::from_utf8(&bytes).is_ok() {
        debug!("{} is already UTF-8", path.display());
        return Ok("utf-8".to_string());
    }

    let mut candidates: Vec<String> = Vec::new();

    let (charset, confidence, _language) = chardet::detect(&bytes);
    if !charset.is_empty() {
        if confidence < CONFIDENCE_FLOOR {
            warn!(
                "Low-confidence encoding detection for {} ({} at {:.2})",
                path.display(),
                charset,
                confidence
            );
        }
        candidates.push(chardet::charset2encoding(&charset).to_string());
    }

    if let Some(code) = language_code {
        for hint in encoding_hints(code) {
            candidates.push((*hint).to_string());
        }
    }

    for fallback in FALLBACK_ENCODINGS {
        candidates.push((*fallback).to_string());
    }

    dedup_preserving_order(&mut candidates);
    convert_in_place(path, &bytes, &candidates)
}

/// Try each candidate encoding against the file's bytes; the first strict
/// decode wins and the file is rewritten as UTF-8 (BOM dropped).
pub fn convert_in_place(path: &Path, bytes: &[u8], candidates: &[String]) -> Result<String> {
    let backup_path = backup_path_for(path);
    std::fs::copy(path, &backup_path)
        .with_context(|| format!("Failed to back up {}", path.display()))?;

    for candidate in candidates {
        if let Some(text) = try_decode(bytes, candidate) {
            std::fs::write(path, text.as_bytes())
                .with_context(|| format!("Failed to rewrite {}", path.display()))?;
            debug!(
                "Converted {} from {} to UTF-8",
                path.display(),
                candidate
            );
            return Ok(candidate.clone());
        }
    }

    // Nothing decoded cleanly; put the original back.
    if let Err(e) = std::fs::copy(&backup_path, path) {
        warn!("Failed to restore {} from backup: {}", path.display(), e);
    } else if let Err(e) = std::fs::remove_file(&backup_path) {
        warn!("Failed to remove backup {}: {}", backup_path.display(), e);
    }

    anyhow::bail!(
        "Could not decode {} with any candidate encoding (tried: {})",
        path.display(),
        candidates.join(", ")
    )
}

fn backup_path_for(path: &Path) -> std::path::PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".bak");
    std::path::PathBuf::from(name)
}

/// Strict decode of `bytes` as `label`, `None` on any malformed sequence.
fn try_decode(bytes: &[u8], label: &str) -> Option<String> {
    match label.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" | "utf-8-sig" => {
            let stripped = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
            std::str::from_utf8(stripped).ok().map(String::from)
        }
        // encoding_rs resolves the latin-1 label to windows-1252; decode the
        // real ISO-8859-1 byte-to-codepoint mapping instead.
        "latin-1" | "latin1" | "iso-8859-1" => {
            Some(bytes.iter().map(|&b| b as char).collect())
        }
        _ => {
            let encoding = encoding_rs::Encoding::for_label(label.as_bytes())?;
            let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
            if had_errors {
                None
            } else {
                Some(text.into_owned())
            }
        }
    }
}

fn dedup_preserving_order(candidates: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    candidates.retain(|c| seen.insert(c.to_lowercase()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hints_known_language() {
        assert_eq!(encoding_hints("AR")[0], "windows-1256");
        assert_eq!(encoding_hints("ar")[0], "windows-1256");
        assert_eq!(encoding_hints("RU")[0], "windows-1251");
    }

    #[test]
    fn test_hints_unknown_language_empty() {
        assert!(encoding_hints("XX").is_empty());
    }

    #[test]
    fn test_try_decode_strict_utf8_rejects_invalid() {
        assert!(try_decode(&[0xFF, 0xFE, 0x41], "utf-8").is_none());
    }

    #[test]
    fn test_try_decode_strips_bom() {
        let decoded = try_decode(&[0xEF, 0xBB, 0xBF, b'h', b'i'], "utf-8").unwrap();
        assert_eq!(decoded, "hi");
    }

    #[test]
    fn test_try_decode_latin1_total() {
        let decoded = try_decode(&[0xE9, 0xFF], "latin-1").unwrap();
        assert_eq!(decoded, "\u{e9}\u{ff}");
    }

    #[test]
    fn test_try_decode_gbk() {
        // "你好" in GBK
        let decoded = try_decode(&[0xC4, 0xE3, 0xBA, 0xC3], "gbk").unwrap();
        assert_eq!(decoded, "你好");
    }

    #[test]
    fn test_dedup_preserves_first_occurrence() {
        let mut candidates = vec![
            "gbk".to_string(),
            "utf-8".to_string(),
            "GBK".to_string(),
            "big5".to_string(),
        ];
        dedup_preserving_order(&mut candidates);
        assert_eq!(candidates, vec!["gbk", "utf-8", "big5"]);
    }
}
