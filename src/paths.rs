//! Deterministic path derivation for the build, install, and staging trees.
//!
//! Pure functions over a root path: nothing in here touches the filesystem,
//! so destination layout is unit-testable on any host.

use crate::matrix::{Arch, BuildCell};
use std::path::{Path, PathBuf};

pub const BUILD_DIR: &str = "build";
pub const STAGING_DIR: &str = "nsis";

/// Layout of an installed (or staged) artifact tree:
/// `include/<namespace>` for headers, `lib/<arch>/<config>` for binaries.
#[derive(Debug, Clone)]
pub struct ArtifactTree {
    root: PathBuf,
    namespace: String,
}

impl ArtifactTree {
    pub fn new(root: impl Into<PathBuf>, namespace: &str) -> Self {
        Self {
            root: root.into(),
            namespace: namespace.to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn include_root(&self) -> PathBuf {
        self.root.join("include")
    }

    pub fn include_dir(&self) -> PathBuf {
        self.include_root().join(&self.namespace)
    }

    pub fn lib_root(&self) -> PathBuf {
        self.root.join("lib")
    }

    pub fn arch_dir(&self, arch: Arch) -> PathBuf {
        self.lib_root().join(arch.dir_name())
    }

    pub fn cell_dir(&self, cell: BuildCell) -> PathBuf {
        self.arch_dir(cell.arch).join(cell.config.as_str())
    }

    /// Every directory of the tree, parents strictly before children, so the
    /// list can be handed to a plain (non-recursive) mkdir loop. The root
    /// itself is not included; install prefixes are expected to exist.
    pub fn creation_order(&self) -> Vec<PathBuf> {
        let mut dirs = vec![self.include_root(), self.include_dir(), self.lib_root()];
        for arch in Arch::ALL {
            dirs.push(self.arch_dir(arch));
            for config in crate::matrix::BuildConfig::ALL {
                dirs.push(self.arch_dir(arch).join(config.as_str()));
            }
        }
        dirs
    }

    /// Children before parents, for bottom-up empty-directory cleanup.
    pub fn removal_order(&self) -> Vec<PathBuf> {
        let mut dirs = self.creation_order();
        dirs.reverse();
        dirs
    }
}

/// Paths inside the build output tree rooted at `<root>/build`.
#[derive(Debug, Clone)]
pub struct BuildTree {
    root: PathBuf,
}

impl BuildTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn build_root(&self) -> PathBuf {
        self.root.join(BUILD_DIR)
    }

    pub fn arch_dir(&self, arch: Arch) -> PathBuf {
        self.build_root().join(arch.dir_name())
    }

    /// A built artifact for one matrix cell, e.g. `build/x64/Debug/foo.lib`.
    pub fn artifact(&self, cell: BuildCell, name: &str) -> PathBuf {
        self.arch_dir(cell.arch).join(cell.config.as_str()).join(name)
    }

    /// Some generators leave the RelWithDebInfo symbol file in the target's
    /// intermediate directory instead of the configuration output directory.
    pub fn intermediate_pdb(&self, arch: Arch, target_stem: &str, pdb: &str) -> PathBuf {
        self.arch_dir(arch)
            .join(format!("{target_stem}.dir"))
            .join("RelWithDebInfo")
            .join(pdb)
    }

    /// Marker recording the last successful run of a stage.
    pub fn marker(&self, stage: &str) -> PathBuf {
        self.build_root().join(format!("{stage}.touch"))
    }

    /// Scratch tree the packager input gets staged into.
    pub fn staging_root(&self) -> PathBuf {
        self.build_root().join(STAGING_DIR)
    }

    /// Final resting place of the generated installer.
    pub fn package_artifact(&self, file_name: &str) -> PathBuf {
        self.build_root().join(file_name)
    }
}

/// Debug-symbol companion for a library file: same stem, `.pdb` extension.
pub fn pdb_companion(lib: &str) -> String {
    match lib.rsplit_once('.') {
        Some((stem, _)) => format!("{stem}.pdb"),
        None => format!("{lib}.pdb"),
    }
}
