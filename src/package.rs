//! Installer packaging via NSIS.
//!
//! Stages the packager's input files, the find-module, a generated version
//! descriptor, the headers, and every matrix artifact into a scratch tree
//! under `build/nsis`, then runs `makensis` there and copies the resulting
//! installer up to `build/`.

use crate::config::Config;
use crate::install::{copy_into, create_dirs};
use crate::matrix::{BuildConfig, EXIT_TOOL_MISSING, StepFailure, cells};
use crate::paths::{ArtifactTree, BuildTree, pdb_companion};
use crate::project::Project;
use crate::stale::{WatchSet, is_stale};
use anyhow::{Context, Result};
use colored::*;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

/// The packager location is optional in configuration; requesting `package`
/// without one is fatal before any staging work happens.
pub fn packager_path(config: &Config) -> Result<PathBuf> {
    config.makensis.clone().context(
        "makensis could not be located, package target not available.\n\n\
        💡 Tip: install NSIS and re-run the configure step.",
    )
}

/// Build the installer. Returns false when the existing artifact is already
/// newer than everything it is built from.
pub fn package(
    config: &Config,
    project: &Project,
    build: &BuildTree,
    root: &Path,
    watch: &WatchSet,
    verbose: bool,
) -> Result<bool> {
    let makensis = packager_path(config)?;
    let file_name = project.package_file_name(config.unicode_version);
    let artifact = build.package_artifact(&file_name);

    if !is_stale(&artifact, watch)? {
        println!("{} Package {} is up to date", "⚡".green(), file_name);
        return Ok(false);
    }

    let stage = ArtifactTree::new(build.staging_root(), &project.namespace);
    let mut dirs = vec![stage.root().to_path_buf()];
    dirs.extend(stage.creation_order());
    create_dirs(&dirs)?;

    // Packager inputs and the find-module land at the staging root, next to
    // the installer script that references them.
    let input_dir = root.join(&project.package_dir);
    for entry in fs::read_dir(&input_dir)
        .with_context(|| format!("Failed to read {}", input_dir.display()))?
    {
        let path = entry?.path();
        if path.is_file() {
            copy_into(&path, stage.root())?;
        }
    }
    if let Some(find_module) = &project.find_module {
        copy_into(&root.join(find_module), stage.root())?;
    }

    write_version_descriptor(config, project, stage.root())?;

    for header in &project.headers {
        copy_into(&root.join(header), &stage.include_dir())?;
    }

    for lib in &project.libs {
        let pdb = pdb_companion(lib);
        let stem = lib.rsplit_once('.').map_or(lib.as_str(), |(s, _)| s);
        for cell in cells() {
            let dest = stage.cell_dir(cell);
            copy_into(&build.artifact(cell, lib), &dest)?;
            if cell.config.has_debug_symbols() {
                let mut pdb_src = build.artifact(cell, &pdb);
                // RelWithDebInfo symbols sometimes only exist in the
                // target's intermediate directory.
                if cell.config == BuildConfig::RelWithDebInfo && !pdb_src.is_file() {
                    pdb_src = build.intermediate_pdb(cell.arch, stem, &pdb);
                }
                copy_into(&pdb_src, &dest)?;
            }
        }
    }

    println!("{} Running makensis...", "📦".blue());
    let mut cmd = Command::new(&makensis);
    cmd.arg(&project.installer_script).current_dir(stage.root());
    if verbose {
        println!("   {} {:?}", "→".cyan(), cmd);
    }
    let code = match cmd.status() {
        Ok(status) => status.code().unwrap_or(1),
        Err(e) if e.kind() == io::ErrorKind::NotFound => EXIT_TOOL_MISSING,
        Err(e) => return Err(e).context("Failed to spawn makensis"),
    };
    StepFailure::check("makensis", code)?;

    copy_into(&stage.root().join(&file_name), &build.build_root())?;
    println!("{} Package ready: {}", "✓".green(), artifact.display());
    Ok(true)
}

/// Small generated descriptor the installer script includes; records which
/// Unicode tables and library version went into the build.
fn write_version_descriptor(config: &Config, project: &Project, stage_root: &Path) -> Result<()> {
    let path = stage_root.join(project.version_descriptor());
    let body = format!(
        "!define {} {}\n!define {}_LIB_VERSION {}\n",
        project.unicode_define(),
        config.unicode_version,
        project.namespace.to_uppercase(),
        config.package_version
    );
    fs::write(&path, body).with_context(|| format!("Failed to write {}", path.display()))
}
