//! The architecture × configuration build matrix.
//!
//! Every build stage repeats its work over 8 cells: two architectures times
//! four CMake configurations, in one canonical order. The matrix loop is
//! strictly sequential and fail-fast; partial build state is left for the
//! build system's own incrementality to sort out on retry.

use anyhow::Result;
use std::error::Error;
use std::fmt;

/// Exit code reported when a required external tool cannot be found,
/// matching what cmd.exe reports for an unrecognized command.
pub const EXIT_TOOL_MISSING: i32 = 9009;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    X64,
    Win32,
}

impl Arch {
    /// Primary architecture first.
    pub const ALL: [Arch; 2] = [Arch::X64, Arch::Win32];

    /// Directory name under the build and lib trees.
    pub fn dir_name(self) -> &'static str {
        match self {
            Arch::X64 => "x64",
            Arch::Win32 => "Win32",
        }
    }

    /// Value handed to the generator's `-A` platform switch.
    pub fn platform(self) -> &'static str {
        self.dir_name()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildConfig {
    Release,
    Debug,
    RelWithDebInfo,
    MinSizeRel,
}

impl BuildConfig {
    pub const ALL: [BuildConfig; 4] = [
        BuildConfig::Release,
        BuildConfig::Debug,
        BuildConfig::RelWithDebInfo,
        BuildConfig::MinSizeRel,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BuildConfig::Release => "Release",
            BuildConfig::Debug => "Debug",
            BuildConfig::RelWithDebInfo => "RelWithDebInfo",
            BuildConfig::MinSizeRel => "MinSizeRel",
        }
    }

    /// Whether the build system emits a debug-symbol companion file that
    /// travels with the library on install and packaging.
    pub fn has_debug_symbols(self) -> bool {
        matches!(self, BuildConfig::Debug | BuildConfig::RelWithDebInfo)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BuildCell {
    pub arch: Arch,
    pub config: BuildConfig,
}

impl fmt::Display for BuildCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.arch.dir_name(), self.config.as_str())
    }
}

/// The full matrix in canonical execution order: primary architecture before
/// secondary, configurations in their fixed order within each.
pub fn cells() -> Vec<BuildCell> {
    let mut out = Vec::with_capacity(Arch::ALL.len() * BuildConfig::ALL.len());
    for arch in Arch::ALL {
        for config in BuildConfig::ALL {
            out.push(BuildCell { arch, config });
        }
    }
    out
}

/// A delegate step that exited non-zero (or could not be started at all).
/// The code crosses the process boundary verbatim.
#[derive(Debug)]
pub struct StepFailure {
    pub what: String,
    pub code: i32,
}

impl StepFailure {
    pub fn new(what: impl Into<String>, code: i32) -> Self {
        Self {
            what: what.into(),
            code,
        }
    }

    pub fn check(what: &str, code: i32) -> Result<(), StepFailure> {
        if code == 0 {
            Ok(())
        } else {
            Err(StepFailure::new(what, code))
        }
    }
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.code == EXIT_TOOL_MISSING {
            write!(f, "{}: required tool not found (is it on PATH?)", self.what)
        } else {
            write!(f, "{} failed with exit code {}", self.what, self.code)
        }
    }
}

impl Error for StepFailure {}

/// Run `action` for every target over every cell, in declaration order.
/// The first non-zero exit code aborts the remaining matrix.
pub fn run_matrix<F>(targets: &[String], cells: &[BuildCell], mut action: F) -> Result<()>
where
    F: FnMut(&str, BuildCell) -> Result<i32>,
{
    for target in targets {
        for &cell in cells {
            let code = action(target, cell)?;
            if code != 0 {
                return Err(
                    StepFailure::new(format!("build of '{}' for {}", target, cell), code).into(),
                );
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_cell_order() {
        let cells = cells();
        assert_eq!(cells.len(), 8);
        let rendered: Vec<String> = cells.iter().map(|c| c.to_string()).collect();
        assert_eq!(
            rendered,
            [
                "x64/Release",
                "x64/Debug",
                "x64/RelWithDebInfo",
                "x64/MinSizeRel",
                "Win32/Release",
                "Win32/Debug",
                "Win32/RelWithDebInfo",
                "Win32/MinSizeRel",
            ]
        );
    }

    #[test]
    fn matrix_runs_once_per_target_cell_pair() {
        let targets = vec!["libA".to_string(), "libB".to_string()];
        let mut seen = Vec::new();
        run_matrix(&targets, &cells(), |t, cell| {
            seen.push(format!("{t}:{cell}"));
            Ok(0)
        })
        .unwrap();
        assert_eq!(seen.len(), 16);
        assert_eq!(seen[0], "libA:x64/Release");
        assert_eq!(seen[8], "libB:x64/Release");
    }

    #[test]
    fn failure_at_cell_three_stops_the_rest() {
        let targets = vec!["lib".to_string()];
        let mut calls = 0;
        let err = run_matrix(&targets, &cells(), |_, _| {
            calls += 1;
            Ok(if calls == 3 { 42 } else { 0 })
        })
        .unwrap_err();

        assert_eq!(calls, 3);
        let failure = err.downcast_ref::<StepFailure>().unwrap();
        assert_eq!(failure.code, 42);
        assert!(failure.to_string().contains("RelWithDebInfo"));
    }

    #[test]
    fn tool_missing_renders_guidance() {
        let failure = StepFailure::new("cmake generate", EXIT_TOOL_MISSING);
        assert!(failure.to_string().contains("not found"));
    }

    #[test]
    fn check_passes_zero_and_fails_nonzero() {
        assert!(StepFailure::check("step", 0).is_ok());
        assert_eq!(StepFailure::check("step", 2).unwrap_err().code, 2);
    }

    #[test]
    fn debug_symbol_configs() {
        assert!(BuildConfig::Debug.has_debug_symbols());
        assert!(BuildConfig::RelWithDebInfo.has_debug_symbols());
        assert!(!BuildConfig::Release.has_debug_symbols());
        assert!(!BuildConfig::MinSizeRel.has_debug_symbols());
    }
}
