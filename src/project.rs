//! Project manifest (`project.toml`).
//!
//! Checked in by the library project that uses `wmk`: which CMake targets to
//! build and test, which headers and libraries get installed, and what the
//! installer is called. Unlike `winmake.toml` this file survives `scrub`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const PROJECT_FILE: &str = "project.toml";

#[derive(Deserialize, Debug, Clone)]
pub struct Project {
    /// Project name, used for the installer file name.
    pub name: String,
    /// Include namespace; headers install under `include/<namespace>`.
    pub namespace: String,
    /// CMake targets built by the `all` stage.
    pub build_targets: Vec<String>,
    /// CMake targets built before the test runner executes.
    #[serde(default)]
    pub test_targets: Vec<String>,
    /// Header files installed to `include/<namespace>`, relative to the root.
    pub headers: Vec<PathBuf>,
    /// Library file names copied from every matrix cell's output directory.
    pub libs: Vec<String>,
    /// CMake find-module shipped with the package and deployed by
    /// `cmake-install`, e.g. `FindANSAK.cmake`.
    #[serde(default)]
    pub find_module: Option<PathBuf>,
    /// Directory holding the packager's input files.
    #[serde(default = "default_package_dir")]
    pub package_dir: PathBuf,
    /// Packager script name, run from the staging directory.
    #[serde(default = "default_installer_script")]
    pub installer_script: String,
}

fn default_package_dir() -> PathBuf {
    PathBuf::from("NSIS")
}

fn default_installer_script() -> String {
    "setup.nsi".to_string()
}

impl Project {
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(PROJECT_FILE);
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Installer artifact name; the Unicode feature version is part of it so
    /// packages built against different Unicode tables can coexist.
    pub fn package_file_name(&self, unicode_version: u32) -> String {
        format!("{}-u{}-setup.exe", self.name, unicode_version)
    }

    /// CMake cache define selecting the Unicode feature version, e.g.
    /// `ANSAK_UNICODE_SUPPORT` for namespace `ansak`.
    pub fn unicode_define(&self) -> String {
        format!("{}_UNICODE_SUPPORT", self.namespace.to_uppercase())
    }

    /// Name of the generated version descriptor staged for the packager.
    pub fn version_descriptor(&self) -> String {
        format!("{}Version.nsh", self.namespace)
    }
}
