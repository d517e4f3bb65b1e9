//! Target names and execution-plan resolution.
//!
//! The target set is closed: every name maps to exactly one handler in the
//! orchestrator, and an unknown name is rejected before anything runs.

use anyhow::Result;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    All,
    Test,
    Install,
    Uninstall,
    Package,
    Clean,
    Scrub,
    CmakeInstall,
    CmakeUninstall,
    Help,
}

impl Target {
    pub const ALL_TARGETS: [Target; 10] = [
        Target::All,
        Target::Test,
        Target::Install,
        Target::Uninstall,
        Target::Package,
        Target::Clean,
        Target::Scrub,
        Target::CmakeInstall,
        Target::CmakeUninstall,
        Target::Help,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Target::All => "all",
            Target::Test => "test",
            Target::Install => "install",
            Target::Uninstall => "uninstall",
            Target::Package => "package",
            Target::Clean => "clean",
            Target::Scrub => "scrub",
            Target::CmakeInstall => "cmake-install",
            Target::CmakeUninstall => "cmake-uninstall",
            Target::Help => "help",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Target {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Target::ALL_TARGETS
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = Target::ALL_TARGETS.iter().map(|t| t.name()).collect();
                anyhow::anyhow!("unknown target '{}' (expected one of: {})", s, known.join(", "))
            })
    }
}

/// Normalize a raw request list into an execution plan.
///
/// `help` discards everything else, `clean` always goes first, duplicates
/// collapse to their first occurrence, and an empty request means `all`.
/// Any unknown name fails the whole resolution; nothing runs.
pub fn resolve_plan(raw: &[String]) -> Result<Vec<Target>> {
    let requested: Vec<Target> = raw
        .iter()
        .map(|name| name.parse())
        .collect::<Result<Vec<_>>>()?;

    if requested.contains(&Target::Help) {
        return Ok(vec![Target::Help]);
    }

    let mut plan = Vec::new();
    if requested.contains(&Target::Clean) {
        plan.push(Target::Clean);
    }
    for target in requested {
        if target != Target::Clean && !plan.contains(&target) {
            plan.push(target);
        }
    }
    if plan.is_empty() {
        plan.push(Target::All);
    }
    Ok(plan)
}
