//! Favicon and webmanifest integrity checks.
//!
//! The report feeds the renderer so broken icon links are dropped from
//! the page head; it never fails a conversion.

use std::path::Path;

/// Signature validators, keyed by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaviconValidator {
    Ico,
    Png,
    Svg,
}

impl FaviconValidator {
    pub fn for_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "ico" => Some(Self::Ico),
            "png" => Some(Self::Png),
            "svg" => Some(Self::Svg),
            _ => None,
        }
    }

    /// Checks the on-disk file against the format's signature. Any read
    /// failure counts as invalid.
    pub fn validate(&self, path: &Path) -> bool {
        match self {
            Self::Ico => starts_with(path, &[0x00, 0x00, 0x01, 0x00]),
            Self::Png => starts_with(path, b"\x89PNG\r\n\x1a\n"),
            Self::Svg => std::fs::read_to_string(path)
                .map(|content| {
                    let lower = content.to_ascii_lowercase();
                    lower.contains("<svg") && lower.contains("</svg>")
                })
                .unwrap_or(false),
        }
    }
}

fn starts_with(path: &Path, signature: &[u8]) -> bool {
    match std::fs::read(path) {
        Ok(bytes) => bytes.len() >= signature.len() && &bytes[..signature.len()] == signature,
        Err(_) => false,
    }
}

/// Favicon resources that are absent or fail their signature check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FaviconReport {
    pub missing: Vec<String>,
    pub invalid: Vec<String>,
}

impl FaviconReport {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.invalid.is_empty()
    }

    pub fn flags(&self, file_name: &str) -> bool {
        self.missing.iter().any(|name| name == file_name)
            || self.invalid.iter().any(|name| name == file_name)
    }
}

/// Check every required favicon file under the images directory, then the
/// webmanifest.
pub fn verify_favicon_resources(images_dir: &Path, required_files: &[String]) -> FaviconReport {
    let mut report = FaviconReport::default();

    for file_name in required_files {
        let path = images_dir.join(file_name);
        if !path.exists() {
            report.missing.push(file_name.clone());
            continue;
        }
        let validator = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(FaviconValidator::for_extension);
        if let Some(validator) = validator
            && !validator.validate(&path)
        {
            report.invalid.push(file_name.clone());
        }
    }

    validate_webmanifest(&images_dir.join("site.webmanifest"), &mut report);
    report
}

/// The manifest must parse as JSON and carry `name` plus a non-empty
/// `icons` array whose entries all have `src`, `sizes` and `type`.
fn validate_webmanifest(manifest_path: &Path, report: &mut FaviconReport) {
    const MANIFEST: &str = "site.webmanifest";

    if !manifest_path.exists() {
        report.missing.push(MANIFEST.to_string());
        return;
    }

    let manifest: serde_json::Value = match std::fs::read_to_string(manifest_path)
        .ok()
        .and_then(|content| serde_json::from_str(&content).ok())
    {
        Some(value) => value,
        None => {
            report.invalid.push(MANIFEST.to_string());
            return;
        }
    };

    if manifest.get("name").is_none() {
        report.invalid.push(MANIFEST.to_string());
        return;
    }
    let Some(icons) = manifest.get("icons").and_then(|icons| icons.as_array()) else {
        report.invalid.push(MANIFEST.to_string());
        return;
    };
    if icons.is_empty()
        || icons.iter().any(|icon| {
            ["src", "sizes", "type"]
                .iter()
                .any(|field| icon.get(field).is_none())
        })
    {
        report.invalid.push(MANIFEST.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const VALID_MANIFEST: &str = r#"{
        "name": "tagdown",
        "icons": [{"src": "i.png", "sizes": "192x192", "type": "image/png"}]
    }"#;

    fn required(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn test_png_signature_check() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("good.png");
        let bad = dir.path().join("bad.png");
        std::fs::write(&good, b"\x89PNG\r\n\x1a\nrest").unwrap();
        std::fs::write(&bad, b"GIF89a").unwrap();

        assert!(FaviconValidator::Png.validate(&good));
        assert!(!FaviconValidator::Png.validate(&bad));
    }

    #[test]
    fn test_ico_signature_check() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("favicon.ico");
        std::fs::write(&good, [0x00, 0x00, 0x01, 0x00, 0x01]).unwrap();

        assert!(FaviconValidator::Ico.validate(&good));
    }

    #[test]
    fn test_svg_needs_both_tags_case_insensitive() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("icon.svg");
        let bad = dir.path().join("broken.svg");
        std::fs::write(&good, "<SVG viewBox=\"0 0 1 1\"></SVG>").unwrap();
        std::fs::write(&bad, "<svg>never closed").unwrap();

        assert!(FaviconValidator::Svg.validate(&good));
        assert!(!FaviconValidator::Svg.validate(&bad));
    }

    #[test]
    fn test_missing_files_are_reported() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("site.webmanifest"), VALID_MANIFEST).unwrap();

        let report = verify_favicon_resources(dir.path(), &required(&["favicon.ico"]));

        assert_eq!(report.missing, vec!["favicon.ico"]);
        assert!(report.invalid.is_empty());
    }

    #[test]
    fn test_invalid_signature_is_reported() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("favicon.png"), b"not a png").unwrap();
        std::fs::write(dir.path().join("site.webmanifest"), VALID_MANIFEST).unwrap();

        let report = verify_favicon_resources(dir.path(), &required(&["favicon.png"]));

        assert_eq!(report.invalid, vec!["favicon.png"]);
    }

    #[test]
    fn test_manifest_missing_fields_is_invalid() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("site.webmanifest"),
            r#"{"name": "x", "icons": [{"src": "i.png"}]}"#,
        )
        .unwrap();

        let report = verify_favicon_resources(dir.path(), &[]);

        assert_eq!(report.invalid, vec!["site.webmanifest"]);
    }

    #[test]
    fn test_absent_manifest_is_missing_not_invalid() {
        let dir = TempDir::new().unwrap();

        let report = verify_favicon_resources(dir.path(), &[]);

        assert_eq!(report.missing, vec!["site.webmanifest"]);
        assert!(report.invalid.is_empty());
    }

    #[test]
    fn test_clean_report() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("favicon.ico"), [0x00, 0x00, 0x01, 0x00]).unwrap();
        std::fs::write(dir.path().join("site.webmanifest"), VALID_MANIFEST).unwrap();

        let report = verify_favicon_resources(dir.path(), &required(&["favicon.ico"]));

        assert!(report.is_clean());
    }
}
