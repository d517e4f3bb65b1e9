//! Top-level target dispatch.
//!
//! The orchestrator runs an execution plan target by target, tracking which
//! stages already completed in this invocation so an implied dependency
//! (`test` needs `all`, `package` needs `test`) never runs twice. Handlers
//! insert themselves into the completed set even when a staleness check let
//! them skip their work.

use crate::config::{CONFIG_FILE, Config};
use crate::driver::{BuildDriver, cmake_modules_path};
use crate::install::{self, copy_into, create_dirs, rm_f};
use crate::matrix::{Arch, StepFailure, cells, run_matrix};
use crate::package;
use crate::paths::BuildTree;
use crate::project::Project;
use crate::stale::{DEFAULT_EXCLUDED, WatchSet, is_stale, write_marker};
use crate::target::Target;
use anyhow::{Context, Result};
use colored::*;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

pub struct Orchestrator<D: BuildDriver> {
    config: Config,
    project: Project,
    driver: D,
    root: PathBuf,
    build: BuildTree,
    done: HashSet<Target>,
    step_performed: bool,
    verbose: bool,
}

impl<D: BuildDriver> Orchestrator<D> {
    pub fn new(config: Config, project: Project, driver: D, root: &Path, verbose: bool) -> Self {
        Self {
            config,
            project,
            driver,
            root: root.to_path_buf(),
            build: BuildTree::new(root),
            done: HashSet::new(),
            step_performed: false,
            verbose,
        }
    }

    /// Stages that completed (or were found up to date) so far.
    pub fn completed(&self) -> &HashSet<Target> {
        &self.done
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn run(&mut self, plan: &[Target]) -> Result<()> {
        for &target in plan {
            self.run_target(target)?;
        }
        if !self.step_performed {
            let names: Vec<&str> = plan.iter().map(|t| t.name()).collect();
            println!(
                "{} Nothing to do for targets [{}]",
                "!".yellow(),
                names.join(", ")
            );
        }
        Ok(())
    }

    fn run_target(&mut self, target: Target) -> Result<()> {
        match target {
            Target::All => self.make_all(),
            Target::Test => self.test(),
            Target::Install => self.install(),
            Target::Uninstall => self.uninstall(),
            Target::Package => self.package(),
            Target::Clean => self.clean(),
            Target::Scrub => self.scrub(),
            Target::CmakeInstall => self.cmake_install(),
            Target::CmakeUninstall => self.cmake_uninstall(),
            Target::Help => self.help(),
        }
    }

    /// Watched inputs of the `all` stage; `test` shares them, since tests
    /// depend transitively on library staleness.
    fn source_watch(&self) -> WatchSet {
        WatchSet {
            files: vec![self.root.join(CONFIG_FILE)],
            roots: vec![self.root.clone()],
            extra: Vec::new(),
            excluded: DEFAULT_EXCLUDED.iter().map(|d| self.root.join(d)).collect(),
        }
    }

    fn package_watch(&self) -> WatchSet {
        let mut watch = self.source_watch();
        watch.extra.push(self.root.join(&self.project.package_dir));
        watch
    }

    fn make_all(&mut self) -> Result<()> {
        if self.done.contains(&Target::All) {
            return Ok(());
        }

        let mut dirs = vec![self.build.build_root()];
        for arch in Arch::ALL {
            dirs.push(self.build.arch_dir(arch));
        }
        create_dirs(&dirs)?;

        if !is_stale(&self.build.marker("all"), &self.source_watch())? {
            println!("{} Library is up to date", "⚡".green());
            self.done.insert(Target::All);
            return Ok(());
        }

        for arch in Arch::ALL {
            let code = self.driver.generate(arch)?;
            StepFailure::check("cmake generate", code)?;
        }

        run_matrix(&self.project.build_targets, &cells(), |target, cell| {
            self.driver.build(target, cell)
        })?;

        write_marker(&self.build.marker("all"))?;
        self.done.insert(Target::All);
        self.step_performed = true;
        Ok(())
    }

    fn test(&mut self) -> Result<()> {
        if self.done.contains(&Target::Test) {
            return Ok(());
        }
        self.make_all()?;

        if !is_stale(&self.build.marker("test"), &self.source_watch())? {
            println!("{} Tests are up to date", "⚡".green());
            self.done.insert(Target::Test);
            return Ok(());
        }

        run_matrix(&self.project.test_targets, &cells(), |target, cell| {
            self.driver.build(target, cell)
        })?;
        for arch in Arch::ALL {
            let code = self.driver.test(arch)?;
            StepFailure::check("ctest", code)?;
        }

        write_marker(&self.build.marker("test"))?;
        self.done.insert(Target::Test);
        self.step_performed = true;
        Ok(())
    }

    fn install(&mut self) -> Result<()> {
        self.make_all()?;
        install::install(&self.project, &self.config.prefix, &self.build, &self.root)?;
        println!(
            "{} Installed to {}",
            "✓".green(),
            self.config.prefix.display()
        );
        self.done.insert(Target::Install);
        self.step_performed = true;
        Ok(())
    }

    fn uninstall(&mut self) -> Result<()> {
        install::uninstall(&self.project, &self.config.prefix)?;
        println!(
            "{} Removed from {}",
            "✓".green(),
            self.config.prefix.display()
        );
        self.done.insert(Target::Uninstall);
        self.step_performed = true;
        Ok(())
    }

    fn package(&mut self) -> Result<()> {
        if self.done.contains(&Target::Package) {
            return Ok(());
        }
        // Fail before triggering a build when no packager is available.
        package::packager_path(&self.config)?;
        self.test()?;

        let performed = package::package(
            &self.config,
            &self.project,
            &self.build,
            &self.root,
            &self.package_watch(),
            self.verbose,
        )?;
        self.done.insert(Target::Package);
        if performed {
            self.step_performed = true;
        }
        Ok(())
    }

    fn clean(&mut self) -> Result<()> {
        let file_name = self.project.package_file_name(self.config.unicode_version);
        let mut doomed: Vec<PathBuf> = Arch::ALL
            .into_iter()
            .map(|arch| self.build.arch_dir(arch))
            .collect();
        doomed.push(self.build.staging_root());
        doomed.push(self.build.package_artifact(&file_name));
        doomed.push(self.build.marker("all"));
        doomed.push(self.build.marker("test"));

        for path in doomed {
            delete_path(&path)?;
        }
        self.done.insert(Target::Clean);
        self.step_performed = true;
        Ok(())
    }

    fn scrub(&mut self) -> Result<()> {
        let build_root = self.build.build_root();
        if build_root.is_dir() {
            fs::remove_dir_all(&build_root)
                .with_context(|| format!("Failed to remove {}", build_root.display()))?;
        }
        rm_f(&self.root.join(CONFIG_FILE))?;
        self.done.insert(Target::Scrub);
        self.step_performed = true;
        Ok(())
    }

    fn cmake_install(&mut self) -> Result<()> {
        let module = self
            .project
            .find_module
            .as_ref()
            .context("project.toml declares no find_module; nothing to deploy")?;
        let modules_dir = cmake_modules_path()?;
        println!(
            "Copying {} to {}",
            module.display(),
            modules_dir.display()
        );
        copy_into(&self.root.join(module), &modules_dir)?;
        self.done.insert(Target::CmakeInstall);
        self.step_performed = true;
        Ok(())
    }

    fn cmake_uninstall(&mut self) -> Result<()> {
        let module = self
            .project
            .find_module
            .as_ref()
            .context("project.toml declares no find_module; nothing to remove")?;
        let name = module
            .file_name()
            .with_context(|| format!("{} has no file name", module.display()))?;
        let modules_dir = cmake_modules_path()?;
        println!(
            "Removing {} from {}",
            module.display(),
            modules_dir.display()
        );
        rm_f(&modules_dir.join(name))?;
        self.done.insert(Target::CmakeUninstall);
        self.step_performed = true;
        Ok(())
    }

    fn help(&mut self) -> Result<()> {
        print_help();
        self.done.insert(Target::Help);
        self.step_performed = true;
        Ok(())
    }
}

fn delete_path(path: &Path) -> Result<()> {
    if path.is_dir() {
        fs::remove_dir_all(path).with_context(|| format!("Failed to remove {}", path.display()))
    } else {
        rm_f(path)
    }
}

pub fn print_help() {
    println!("Makefile simulator for ease-of-deployment without a POSIX shell");
    println!("  * help: this message");
    println!("  * all: (default target) compile the libraries for every architecture and configuration");
    println!("  * test: compile and run all tests");
    println!("  * install: deploy headers and libraries to the prefix");
    println!("  * uninstall: remove the headers and libraries at the prefix");
    println!("  * package: build an installer, place it in build\\ (unaffected by prefix setting)");
    println!("  * clean: drop per-architecture outputs, markers and the staged installer");
    println!("  * scrub: drop the whole build tree and the generated configuration");
    println!("  * cmake-install: deploy the project's find-module to CMAKE_ROOT/Modules");
    println!("  * cmake-uninstall: remove the find-module from CMake's Modules");
    println!("Run the configure step before wmk. There are some important settings");
    println!("to be determined there.");
}
