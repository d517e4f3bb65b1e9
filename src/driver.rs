//! External tool delegates: CMake for generation and builds, CTest for tests.
//!
//! The orchestrator only sees the [`BuildDriver`] trait, so tests can swap in
//! a recording fake; [`CmakeDriver`] is the real thing. Delegates report
//! their exit code rather than failing, and a tool that cannot be spawned at
//! all reports [`EXIT_TOOL_MISSING`](crate::matrix::EXIT_TOOL_MISSING).

use crate::config::Config;
use crate::matrix::{Arch, BuildCell, EXIT_TOOL_MISSING, StepFailure};
use crate::paths::BuildTree;
use crate::project::Project;
use anyhow::{Context, Result};
use colored::*;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

pub trait BuildDriver {
    /// One-time per-architecture generation; a no-op when the generator has
    /// already left its cache behind.
    fn generate(&self, arch: Arch) -> Result<i32>;

    /// Build one target for one matrix cell.
    fn build(&self, target: &str, cell: BuildCell) -> Result<i32>;

    /// Run the test suite for one architecture.
    fn test(&self, arch: Arch) -> Result<i32>;
}

pub struct CmakeDriver {
    source_dir: PathBuf,
    build: BuildTree,
    generator: String,
    compiler: Option<String>,
    unicode_define: String,
    unicode_version: u32,
    verbose: bool,
}

impl CmakeDriver {
    pub fn new(config: &Config, project: &Project, root: &Path, verbose: bool) -> Self {
        // cmake wants the source dir relative to the cell's build dir or
        // absolute; absolute is the robust choice.
        let source_dir = root
            .canonicalize()
            .unwrap_or_else(|_| root.to_path_buf());
        Self {
            source_dir,
            build: BuildTree::new(root),
            generator: config.generator.clone(),
            compiler: config.compiler.clone(),
            unicode_define: project.unicode_define(),
            unicode_version: config.unicode_version,
            verbose,
        }
    }

    fn run(&self, cmd: &mut Command) -> Result<i32> {
        if self.verbose {
            println!("   {} {:?}", "→".cyan(), cmd);
        }
        match cmd.status() {
            Ok(status) => Ok(status.code().unwrap_or(1)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(EXIT_TOOL_MISSING),
            Err(e) => Err(e).context("Failed to spawn external tool"),
        }
    }
}

impl BuildDriver for CmakeDriver {
    fn generate(&self, arch: Arch) -> Result<i32> {
        let arch_dir = self.build.arch_dir(arch);
        if arch_dir.join("CMakeCache.txt").exists() {
            return Ok(0);
        }

        println!(
            "{} Generating {} build system ({})",
            "⚙".cyan(),
            arch.dir_name(),
            self.generator
        );
        let mut cmd = Command::new("cmake");
        cmd.current_dir(&arch_dir)
            .arg(&self.source_dir)
            .arg(format!("-D{}={}", self.unicode_define, self.unicode_version))
            .args(["-G", &self.generator])
            .args(["-A", arch.platform()]);
        if let Some(cxx) = &self.compiler {
            cmd.env("CXX", cxx);
        }
        self.run(&mut cmd)
    }

    fn build(&self, target: &str, cell: BuildCell) -> Result<i32> {
        println!("{} Building {} [{}]", "🔨".blue(), target.bold(), cell);
        let mut cmd = Command::new("cmake");
        cmd.arg("--build")
            .arg(self.build.arch_dir(cell.arch))
            .args(["--config", cell.config.as_str()])
            .args(["--target", target]);
        self.run(&mut cmd)
    }

    fn test(&self, arch: Arch) -> Result<i32> {
        println!("{} Running tests [{}]", "🧪".magenta(), arch.dir_name());
        let mut cmd = Command::new("ctest");
        cmd.current_dir(self.build.arch_dir(arch))
            .args(["-C", "Release"]);
        self.run(&mut cmd)
    }
}

/// Locate CMake's Modules directory by asking cmake itself; used by the
/// `cmake-install` / `cmake-uninstall` targets to deploy a find-module.
pub fn cmake_modules_path() -> Result<PathBuf> {
    let output = match Command::new("cmake").arg("--system-information").output() {
        Ok(out) => out,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(StepFailure::new("cmake --system-information", EXIT_TOOL_MISSING).into());
        }
        Err(e) => return Err(e).context("Failed to run cmake --system-information"),
    };

    let stdout = String::from_utf8_lossy(&output.stdout);
    let root_line = stdout
        .lines()
        .find(|line| line.starts_with("CMAKE_ROOT"))
        .context("cmake --system-information did not report CMAKE_ROOT")?;
    // The value is rendered as: CMAKE_ROOT "C:/Program Files/CMake/share/cmake-3.25"
    let quoted = root_line
        .split('"')
        .nth(1)
        .context("unexpected CMAKE_ROOT format")?;
    Ok(PathBuf::from(quoted).join("Modules"))
}
