//! Configuration produced by the external configure step (`winmake.toml`).
//!
//! The configure script probes the machine (generator, packager, compiler)
//! and writes its findings here. `wmk` treats the file as read-only input;
//! the `scrub` target deletes it so configuration can start over.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "winmake.toml";

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    /// CMake generator identifier, e.g. "Visual Studio 17 2022".
    pub generator: String,
    /// Root of the install tree (`include/`, `lib/` go under here).
    pub prefix: PathBuf,
    /// Optional compiler override, exported as `CXX` during generation.
    #[serde(default)]
    pub compiler: Option<String>,
    /// Location of makensis.exe, when the configure step found one.
    #[serde(default)]
    pub makensis: Option<PathBuf>,
    /// Unicode feature version the library is built against.
    pub unicode_version: u32,
    /// Version string recorded in the generated installer.
    pub package_version: String,
}

impl Config {
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        if !path.exists() {
            return Err(anyhow::anyhow!(
                "{} not found in {}.\n\n\
                💡 Tip: Run the configure step first; it probes for a generator \
                and writes {}.",
                CONFIG_FILE,
                root.display(),
                CONFIG_FILE
            ));
        }
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
    }
}
