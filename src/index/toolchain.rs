//! Discovery of the toolchain's bundled library source archive
//!
//! Order: an explicitly configured path, then an archive next to a toolchain binary
//! found on `PATH`, then the toolchain home (`JAVA_HOME`, or `/usr/libexec/java_home`
//! on macOS).

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

/// Binaries whose location identifies an installed toolchain
pub const TOOLCHAIN_BINARIES: &[&str] = &["javac", "java", "javac.exe", "java.exe"];

/// File name of the bundled library source archive
pub const ARCHIVE_NAME: &str = "src.zip";

/// Finds the source archive, or `None` when no toolchain ships one
pub fn discover_source_archive(configured: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = configured {
        if path.is_file() {
            return Some(path.to_path_buf());
        }
        debug!("Configured source archive {} does not exist", path.display());
        return None;
    }

    let found = binary_directory()
        .and_then(|dir| archive_near(&dir))
        .or_else(|| toolchain_home().and_then(|home| archive_near(&home)));
    match &found {
        Some(path) => info!("Using library source archive {}", path.display()),
        None => info!("No library source archive found; library classes will not resolve"),
    }
    found
}

/// Checks the usual spots for the archive relative to a binary or home directory
pub fn archive_near(dir: &Path) -> Option<PathBuf> {
    let candidates = [
        dir.join(ARCHIVE_NAME),
        dir.join("..").join(ARCHIVE_NAME),
        dir.join("lib").join(ARCHIVE_NAME),
        dir.join("..").join("lib").join(ARCHIVE_NAME),
    ];
    candidates
        .into_iter()
        .find(|candidate| candidate.is_file())
        .map(|candidate| fs::canonicalize(&candidate).unwrap_or(candidate))
}

fn binary_directory() -> Option<PathBuf> {
    TOOLCHAIN_BINARIES.iter().find_map(|binary| {
        let path = which::which(binary).ok()?;
        // Distribution launchers are usually symlinks into the real install
        let resolved = fs::canonicalize(&path).unwrap_or(path);
        debug!("Found toolchain binary {}", resolved.display());
        resolved.parent().map(Path::to_path_buf)
    })
}

fn toolchain_home() -> Option<PathBuf> {
    if let Some(home) = env::var_os("JAVA_HOME") {
        let home = PathBuf::from(home);
        if home.is_dir() {
            return Some(home);
        }
    }

    if cfg!(target_os = "macos") {
        let output = Command::new("/usr/libexec/java_home").output().ok()?;
        if output.status.success() {
            let home = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if !home.is_empty() {
                return Some(PathBuf::from(home));
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_archive_near_checks_parent_and_lib() {
        let home = tempfile::tempdir().unwrap();
        let bin = home.path().join("bin");
        fs::create_dir_all(&bin).unwrap();
        assert!(archive_near(&bin).is_none());

        fs::create_dir_all(home.path().join("lib")).unwrap();
        fs::write(home.path().join("lib").join(ARCHIVE_NAME), b"").unwrap();
        let found = archive_near(&bin).unwrap();
        assert!(found.ends_with("lib/src.zip"));

        fs::write(bin.join(ARCHIVE_NAME), b"").unwrap();
        assert!(archive_near(&bin).unwrap().ends_with("bin/src.zip"));
    }

    #[test]
    fn test_configured_path_wins() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("custom.zip");
        fs::write(&archive, b"").unwrap();
        assert_eq!(discover_source_archive(Some(&archive)), Some(archive));
        assert_eq!(discover_source_archive(Some(&dir.path().join("missing.zip"))), None);
    }
}
