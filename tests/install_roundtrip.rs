//! Install/uninstall symmetry over a fabricated build tree.
//!
//! These tests never touch a compiler: the matrix artifacts are plain files
//! laid out the way a finished `all` stage would leave them.

use std::fs;
use std::path::{Path, PathBuf};
use winmake::install;
use winmake::matrix::cells;
use winmake::paths::{ArtifactTree, BuildTree, pdb_companion};
use winmake::project::Project;

fn sample_project() -> Project {
    toml::from_str(
        r#"
        name = "ansak-string"
        namespace = "ansak"
        build_targets = ["ansakString"]
        test_targets = ["ansakStringTest"]
        headers = ["interface/string.hxx", "interface/string_trim.hxx"]
        libs = ["ansakString.lib"]
        "#,
    )
    .unwrap()
}

/// Lay out headers and all 8 cells' worth of build artifacts under `root`.
fn fabricate_build_outputs(root: &Path, project: &Project) {
    fs::create_dir_all(root.join("interface")).unwrap();
    for header in &project.headers {
        fs::write(root.join(header), "#pragma once\n").unwrap();
    }

    let build = BuildTree::new(root);
    for lib in &project.libs {
        let pdb = pdb_companion(lib);
        for cell in cells() {
            let lib_path = build.artifact(cell, lib);
            fs::create_dir_all(lib_path.parent().unwrap()).unwrap();
            fs::write(&lib_path, "archive").unwrap();
            if cell.config.has_debug_symbols() {
                fs::write(build.artifact(cell, &pdb), "symbols").unwrap();
            }
        }
    }
}

/// Relative listing of everything under `root`, sorted for comparison.
fn listing(root: &Path) -> Vec<PathBuf> {
    let mut entries: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.path().strip_prefix(root).unwrap().to_owned())
        .collect();
    entries.sort();
    entries
}

#[test]
fn install_then_uninstall_restores_the_prefix_tree() {
    let scratch = tempfile::tempdir().unwrap();
    let root = scratch.path();
    let project = sample_project();
    fabricate_build_outputs(root, &project);

    let prefix = root.join("prefix");
    fs::create_dir(&prefix).unwrap();
    let before = listing(&prefix);
    assert!(before.is_empty());

    let build = BuildTree::new(root);
    install::install(&project, &prefix, &build, root).unwrap();

    // Spot checks: headers are architecture-neutral, libraries per-cell.
    let tree = ArtifactTree::new(&prefix, "ansak");
    assert!(tree.include_dir().join("string.hxx").is_file());
    for cell in cells() {
        assert!(tree.cell_dir(cell).join("ansakString.lib").is_file());
        assert_eq!(
            tree.cell_dir(cell).join("ansakString.pdb").is_file(),
            cell.config.has_debug_symbols()
        );
    }

    install::uninstall(&project, &prefix).unwrap();
    assert_eq!(listing(&prefix), before);
}

#[test]
fn uninstall_leaves_foreign_files_and_their_directories() {
    let scratch = tempfile::tempdir().unwrap();
    let root = scratch.path();
    let project = sample_project();
    fabricate_build_outputs(root, &project);

    let prefix = root.join("prefix");
    fs::create_dir(&prefix).unwrap();
    let build = BuildTree::new(root);
    install::install(&project, &prefix, &build, root).unwrap();

    // Another package's header shares the include root.
    let foreign = prefix.join("include").join("other.h");
    fs::write(&foreign, "// not ours").unwrap();

    install::uninstall(&project, &prefix).unwrap();

    assert!(foreign.is_file());
    assert!(prefix.join("include").is_dir());
    // Everything that was ours is gone, including the namespace directory.
    assert!(!prefix.join("include").join("ansak").exists());
    assert!(!prefix.join("lib").exists());
}

#[test]
fn uninstall_of_a_clean_prefix_is_a_no_op() {
    let scratch = tempfile::tempdir().unwrap();
    let prefix = scratch.path().join("prefix");
    fs::create_dir(&prefix).unwrap();

    install::uninstall(&sample_project(), &prefix).unwrap();
    assert!(listing(&prefix).is_empty());
    assert!(prefix.is_dir());
}
