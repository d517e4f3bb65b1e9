//! Deploying and removing the library under the configured prefix.
//!
//! Install and uninstall are mirror images over the same manifest: headers to
//! `include/<namespace>`, every library (plus its debug-symbol companion
//! where the configuration has one) to all eight `lib/<arch>/<config>`
//! destinations. Uninstall removes the files then prunes any directory it
//! left empty, so an install followed by an uninstall leaves the prefix tree
//! exactly as it was found.

use crate::matrix::cells;
use crate::paths::{ArtifactTree, BuildTree, pdb_companion};
use crate::project::Project;
use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Create each directory in order, parents first. An existing directory is
/// fine; anything else in the way is not.
pub fn create_dirs(dirs: &[PathBuf]) -> Result<()> {
    for dir in dirs {
        match fs::create_dir(dir) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                if !dir.is_dir() {
                    return Err(anyhow::anyhow!(
                        "{} exists and is not a directory",
                        dir.display()
                    ));
                }
            }
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("Failed to create {}", dir.display())));
            }
        }
    }
    Ok(())
}

/// Copy `src` into directory `dir`, keeping its file name.
pub fn copy_into(src: &Path, dir: &Path) -> Result<()> {
    let name = src
        .file_name()
        .with_context(|| format!("{} has no file name", src.display()))?;
    fs::copy(src, dir.join(name)).with_context(|| {
        format!("Failed to copy {} to {}", src.display(), dir.display())
    })?;
    Ok(())
}

/// Remove a file if it is there; absence is not an error.
pub fn rm_f(path: &Path) -> Result<()> {
    if path.is_file() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Remove a directory only when it exists and holds nothing.
pub fn remove_if_empty(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        let mut entries =
            fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))?;
        if entries.next().is_none() {
            fs::remove_dir(dir)
                .with_context(|| format!("Failed to remove {}", dir.display()))?;
        }
    }
    Ok(())
}

pub fn install(project: &Project, prefix: &Path, build: &BuildTree, root: &Path) -> Result<()> {
    annotate_privileges(install_inner(project, prefix, build, root), "install", prefix)
}

fn install_inner(project: &Project, prefix: &Path, build: &BuildTree, root: &Path) -> Result<()> {
    let tree = ArtifactTree::new(prefix, &project.namespace);
    create_dirs(&tree.creation_order())?;

    for header in &project.headers {
        copy_into(&root.join(header), &tree.include_dir())?;
    }

    for lib in &project.libs {
        let pdb = pdb_companion(lib);
        for cell in cells() {
            let dest = tree.cell_dir(cell);
            copy_into(&build.artifact(cell, lib), &dest)?;
            if cell.config.has_debug_symbols() {
                copy_into(&build.artifact(cell, &pdb), &dest)?;
            }
        }
    }
    Ok(())
}

pub fn uninstall(project: &Project, prefix: &Path) -> Result<()> {
    annotate_privileges(uninstall_inner(project, prefix), "uninstall", prefix)
}

fn uninstall_inner(project: &Project, prefix: &Path) -> Result<()> {
    let tree = ArtifactTree::new(prefix, &project.namespace);

    for header in &project.headers {
        let name = header
            .file_name()
            .with_context(|| format!("{} has no file name", header.display()))?;
        rm_f(&tree.include_dir().join(name))?;
    }

    for lib in &project.libs {
        let pdb = pdb_companion(lib);
        for cell in cells() {
            let dir = tree.cell_dir(cell);
            rm_f(&dir.join(lib))?;
            if cell.config.has_debug_symbols() {
                rm_f(&dir.join(&pdb))?;
            }
        }
    }

    // Children come before parents, so each directory is judged after its
    // own cleanup; a non-empty directory simply stays, as do its ancestors.
    for dir in tree.removal_order() {
        remove_if_empty(&dir)?;
    }
    Ok(())
}

fn annotate_privileges(result: Result<()>, verb: &str, prefix: &Path) -> Result<()> {
    match result {
        Err(err) if is_permission_denied(&err) => Err(err.context(format!(
            "wmk {} for prefix {} must be run from an Admin-privilege shell",
            verb,
            prefix.display()
        ))),
        other => other,
    }
}

fn is_permission_denied(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<io::Error>()
            .is_some_and(|e| e.kind() == io::ErrorKind::PermissionDenied)
    })
}
