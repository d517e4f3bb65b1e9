//! Marker-file staleness tracking.
//!
//! Each build stage leaves a timestamped marker behind on success. A stage is
//! stale when its marker is missing or any watched input is newer than it.
//! The scheme is deliberately coarse: every doubtful case (unreadable file,
//! missing watched item) counts as stale, so the worst outcome is a needless
//! rebuild, never a skipped one.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Directory prefixes skipped by default when scanning for sources: the
/// build output tree and any vendored submodule tree. Generated files under
/// these would otherwise look like edited sources.
pub const DEFAULT_EXCLUDED: [&str; 2] = ["build", "submods"];

/// Declared set of inputs a stage depends on.
#[derive(Debug, Default, Clone)]
pub struct WatchSet {
    /// Individual files watched as-is (e.g. the configuration file).
    pub files: Vec<PathBuf>,
    /// Trees scanned recursively for build-description and source files.
    pub roots: Vec<PathBuf>,
    /// Stage-specific additions; directories here are watched wholesale.
    pub extra: Vec<PathBuf>,
    /// Prefixes excluded from the `roots` scan.
    pub excluded: Vec<PathBuf>,
}

impl WatchSet {
    fn is_excluded(&self, path: &Path) -> bool {
        self.excluded.iter().any(|prefix| path.starts_with(prefix))
    }

    /// Every concrete path this set currently covers.
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut out = self.files.clone();
        for root in &self.roots {
            let walk = WalkDir::new(root)
                .into_iter()
                .filter_entry(|e| !self.is_excluded(e.path()));
            for entry in walk.filter_map(|e| e.ok()) {
                if entry.file_type().is_file() && is_watched_source(entry.path()) {
                    out.push(entry.path().to_owned());
                }
            }
        }
        for extra in &self.extra {
            if extra.is_dir() {
                for entry in WalkDir::new(extra).into_iter().filter_map(|e| e.ok()) {
                    if entry.file_type().is_file() {
                        out.push(entry.path().to_owned());
                    }
                }
            } else {
                out.push(extra.clone());
            }
        }
        out
    }
}

/// Build-description files and C++ sources/headers count as watched inputs.
fn is_watched_source(path: &Path) -> bool {
    if path.file_name().is_some_and(|n| n == "CMakeLists.txt") {
        return true;
    }
    path.extension()
        .is_some_and(|ext| ext == "hxx" || ext == "cxx")
}

/// True when the stage guarded by `marker` must run again.
pub fn is_stale(marker: &Path, watch: &WatchSet) -> Result<bool> {
    let marker_time = match fs::metadata(marker).and_then(|m| m.modified()) {
        Ok(t) => t,
        Err(_) => return Ok(true),
    };

    for path in watch.paths() {
        match fs::metadata(&path).and_then(|m| m.modified()) {
            Ok(t) if t > marker_time => return Ok(true),
            Ok(_) => {}
            // A watched item that vanished or can't be read is a change too.
            Err(_) => return Ok(true),
        }
    }
    Ok(false)
}

/// Record that a stage just completed. Only the timestamp matters.
pub fn write_marker(marker: &Path) -> Result<()> {
    if let Some(parent) = marker.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(marker, "Done!\n").with_context(|| format!("Failed to write {}", marker.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::{Duration, SystemTime};

    fn backdate(path: &Path, secs: u64) {
        let earlier = SystemTime::now() - Duration::from_secs(secs);
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(earlier)
            .unwrap();
    }

    #[test]
    fn absent_marker_is_stale() {
        let dir = tempfile::tempdir().unwrap();
        let watch = WatchSet::default();
        assert!(is_stale(&dir.path().join("all.touch"), &watch).unwrap());
    }

    #[test]
    fn fresh_marker_is_not_stale() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("thing.cxx");
        fs::write(&src, "int x;").unwrap();
        backdate(&src, 60);

        let marker = dir.path().join("all.touch");
        write_marker(&marker).unwrap();

        let watch = WatchSet {
            roots: vec![dir.path().to_owned()],
            ..Default::default()
        };
        assert!(!is_stale(&marker, &watch).unwrap());
    }

    #[test]
    fn single_newer_item_flips_to_stale() {
        let dir = tempfile::tempdir().unwrap();
        let quiet = dir.path().join("quiet.cxx");
        let edited = dir.path().join("edited.hxx");
        fs::write(&quiet, "a").unwrap();
        fs::write(&edited, "b").unwrap();
        backdate(&quiet, 120);
        backdate(&edited, 120);

        let marker = dir.path().join("all.touch");
        write_marker(&marker).unwrap();
        backdate(&marker, 60);

        let watch = WatchSet {
            roots: vec![dir.path().to_owned()],
            ..Default::default()
        };
        assert!(!is_stale(&marker, &watch).unwrap());

        // Touch exactly one watched file past the marker.
        fs::write(&edited, "changed").unwrap();
        assert!(is_stale(&marker, &watch).unwrap());
    }

    #[test]
    fn excluded_prefixes_do_not_count() {
        let dir = tempfile::tempdir().unwrap();
        let build = dir.path().join("build");
        fs::create_dir(&build).unwrap();

        let marker = dir.path().join("all.touch");
        write_marker(&marker).unwrap();
        backdate(&marker, 60);

        // Generated file newer than the marker, but under an excluded tree.
        fs::write(build.join("generated.cxx"), "x").unwrap();

        let watch = WatchSet {
            roots: vec![dir.path().to_owned()],
            excluded: vec![build],
            ..Default::default()
        };
        assert!(!is_stale(&marker, &watch).unwrap());
    }

    #[test]
    fn extra_directory_is_watched_wholesale() {
        let dir = tempfile::tempdir().unwrap();
        let nsis = dir.path().join("NSIS");
        fs::create_dir(&nsis).unwrap();

        let marker = dir.path().join("pkg.exe");
        fs::write(&marker, "installer").unwrap();
        backdate(&marker, 60);

        // Not a source extension, still watched because it's under extra.
        fs::write(nsis.join("setup.nsi"), "Section").unwrap();

        let watch = WatchSet {
            extra: vec![nsis],
            ..Default::default()
        };
        assert!(is_stale(&marker, &watch).unwrap());
    }

    #[test]
    fn only_build_files_and_sources_are_scanned() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.md"), "readme").unwrap();
        fs::write(dir.path().join("CMakeLists.txt"), "project(x)").unwrap();
        fs::write(dir.path().join("a.cxx"), "int a;").unwrap();
        fs::write(dir.path().join("a.hxx"), "int b;").unwrap();

        let watch = WatchSet {
            roots: vec![dir.path().to_owned()],
            ..Default::default()
        };
        let mut found: Vec<String> = watch
            .paths()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        found.sort();
        assert_eq!(found, ["CMakeLists.txt", "a.cxx", "a.hxx"]);
    }
}
