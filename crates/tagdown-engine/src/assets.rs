//! Asset handling: the fixed relative layout the rendered page links
//! against, and the copy step that materializes it next to the output.

use std::path::{Path, PathBuf};
use std::time::Duration;
use tagdown_config::AssetSources;
use tracing::{info, warn};

const COPY_ATTEMPTS: u32 = 3;
const COPY_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Relative paths the rendered page uses to reference its assets,
/// regardless of where the sources live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPaths {
    pub css: String,
    pub js: String,
    pub images: String,
}

pub fn asset_paths() -> AssetPaths {
    AssetPaths {
        css: "assets/css".to_string(),
        js: "assets/js".to_string(),
        images: "assets/images".to_string(),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to copy {src} to {dst}: {source}")]
    Copy {
        src: PathBuf,
        dst: PathBuf,
        source: std::io::Error,
    },
    #[error("IO error preparing assets: {0}")]
    Io(#[from] std::io::Error),
}

/// Copy the configured source directories into `<output_dir>/assets`,
/// replacing whatever was there. A missing source directory is only a
/// warning; the other asset types are still copied.
pub fn prepare_assets(sources: &AssetSources, output_dir: &Path) -> Result<(), AssetError> {
    let assets_dir = output_dir.join("assets");

    if assets_dir.exists() {
        info!(path = %assets_dir.display(), "clearing previous assets");
        let _ = std::fs::remove_dir_all(&assets_dir);
    }

    let layout = [
        ("css", &sources.css),
        ("js", &sources.js),
        ("images", &sources.images),
    ];

    for (kind, _) in &layout {
        std::fs::create_dir_all(assets_dir.join(kind))?;
    }

    for (kind, source_dir) in &layout {
        if !source_dir.exists() {
            warn!(path = %source_dir.display(), "missing asset source directory");
            continue;
        }
        copy_dir_contents(source_dir, &assets_dir.join(kind))?;
    }

    info!(path = %assets_dir.display(), "assets copied");
    verify_assets_integrity(&assets_dir);
    Ok(())
}

fn copy_dir_contents(source_dir: &Path, dest_dir: &Path) -> Result<(), AssetError> {
    for entry in std::fs::read_dir(source_dir)? {
        let entry = entry?;
        let src = entry.path();
        let dst = dest_dir.join(entry.file_name());

        if src.is_dir() {
            std::fs::create_dir_all(&dst)?;
            copy_dir_contents(&src, &dst)?;
        } else {
            copy_with_retry(&src, &dst).map_err(|source| AssetError::Copy {
                src: src.clone(),
                dst: dst.clone(),
                source,
            })?;
        }
    }
    Ok(())
}

/// Retries transient permission errors (antivirus scans, editors holding
/// handles) a fixed number of times, then propagates.
fn copy_with_retry(src: &Path, dst: &Path) -> Result<(), std::io::Error> {
    for attempt in 1..=COPY_ATTEMPTS {
        if dst.exists() {
            let _ = std::fs::remove_file(dst);
        }
        match std::fs::copy(src, dst) {
            Ok(_) => return Ok(()),
            Err(error)
                if error.kind() == std::io::ErrorKind::PermissionDenied
                    && attempt < COPY_ATTEMPTS =>
            {
                warn!(src = %src.display(), attempt, "permission denied copying asset; retrying");
                std::thread::sleep(COPY_RETRY_DELAY);
            }
            Err(error) => return Err(error),
        }
    }
    unreachable!("loop either returns a copy result or an error")
}

/// Post-copy sanity check: each asset type directory should hold at least
/// one file with a plausible extension. Problems are logged, not fatal.
fn verify_assets_integrity(assets_dir: &Path) {
    let expected: [(&str, &[&str]); 3] = [
        ("css", &["css"]),
        ("js", &["js"]),
        ("images", &["png", "jpg", "jpeg", "gif", "ico", "svg", "webmanifest"]),
    ];

    for (kind, extensions) in expected {
        let type_dir = assets_dir.join(kind);
        if !type_dir.exists() {
            warn!(kind, "asset type directory missing after copy");
            continue;
        }
        let files = collect_files(&type_dir);
        if files.is_empty() {
            warn!(kind, "no files found in asset directory");
        } else if !files.iter().any(|file| {
            file.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| extensions.contains(&ext))
        }) {
            warn!(kind, "no files with an expected extension in asset directory");
        }
    }
}

fn collect_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let Ok(entries) = std::fs::read_dir(dir) else {
        return files;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            files.extend(collect_files(&path));
        } else {
            files.push(path);
        }
    }
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn sources_in(dir: &Path) -> AssetSources {
        let sources = AssetSources {
            css: dir.join("css"),
            js: dir.join("js"),
            images: dir.join("images"),
        };
        std::fs::create_dir_all(&sources.css).unwrap();
        std::fs::create_dir_all(&sources.js).unwrap();
        std::fs::create_dir_all(&sources.images).unwrap();
        sources
    }

    #[test]
    fn test_asset_paths_are_the_fixed_relative_layout() {
        let paths = asset_paths();

        assert_eq!(paths.css, "assets/css");
        assert_eq!(paths.js, "assets/js");
        assert_eq!(paths.images, "assets/images");
    }

    #[test]
    fn test_prepare_assets_copies_nested_structure() {
        let source_root = TempDir::new().unwrap();
        let sources = sources_in(source_root.path());
        std::fs::write(sources.css.join("styles.css"), "body {}").unwrap();
        std::fs::create_dir_all(sources.images.join("favicons")).unwrap();
        std::fs::write(sources.images.join("favicons/favicon.ico"), "x").unwrap();
        let output = TempDir::new().unwrap();

        prepare_assets(&sources, output.path()).unwrap();

        assert_eq!(
            std::fs::read_to_string(output.path().join("assets/css/styles.css")).unwrap(),
            "body {}"
        );
        assert!(output.path().join("assets/images/favicons/favicon.ico").exists());
        assert!(output.path().join("assets/js").is_dir());
    }

    #[test]
    fn test_prepare_assets_replaces_previous_tree() {
        let source_root = TempDir::new().unwrap();
        let sources = sources_in(source_root.path());
        let output = TempDir::new().unwrap();
        let stale = output.path().join("assets/css/stale.css");
        std::fs::create_dir_all(stale.parent().unwrap()).unwrap();
        std::fs::write(&stale, "old").unwrap();

        prepare_assets(&sources, output.path()).unwrap();

        assert!(!stale.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_source_entry_surfaces_copy_error() {
        let source_root = TempDir::new().unwrap();
        let sources = sources_in(source_root.path());
        // A dangling symlink fails the copy with a non-transient error.
        std::os::unix::fs::symlink(
            source_root.path().join("gone.css"),
            sources.css.join("styles.css"),
        )
        .unwrap();
        let output = TempDir::new().unwrap();

        let result = prepare_assets(&sources, output.path());

        assert!(matches!(result, Err(AssetError::Copy { .. })));
    }

    #[test]
    fn test_copy_retry_propagates_non_transient_errors_immediately() {
        let dir = TempDir::new().unwrap();
        let started = std::time::Instant::now();

        let result = copy_with_retry(&dir.path().join("missing.css"), &dir.path().join("out.css"));

        assert_eq!(
            result.unwrap_err().kind(),
            std::io::ErrorKind::NotFound
        );
        // Only permission errors are retried, so no delay was taken.
        assert!(started.elapsed() < COPY_RETRY_DELAY);
    }

    #[test]
    fn test_missing_source_dir_is_not_fatal() {
        let source_root = TempDir::new().unwrap();
        let mut sources = sources_in(source_root.path());
        sources.js = source_root.path().join("does-not-exist");
        let output = TempDir::new().unwrap();

        prepare_assets(&sources, output.path()).unwrap();

        assert!(output.path().join("assets/js").is_dir());
    }
}
