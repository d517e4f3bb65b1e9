//! # winmake - make without make
//!
//! winmake (`wmk`) gives a native library project the minimal Makefile-like
//! targets (`all`, `test`, `install`, `uninstall`, `package`, ...) on
//! platforms without a POSIX shell or `make`. It orchestrates; the actual
//! compiling, testing and installer generation are delegated to CMake,
//! CTest and NSIS.
//!
//! ## How a run works
//!
//! 1. The requested target names resolve into a deduplicated plan
//!    ([`target::resolve_plan`]): `help` wins alone, `clean` goes first,
//!    nothing requested means `all`.
//! 2. Each planned target's handler runs once ([`orchestrate`]), consulting
//!    marker-file staleness ([`stale`]) before delegating real work.
//! 3. Build and test stages repeat over the full architecture ×
//!    configuration matrix ([`matrix`]), fail-fast, in one canonical order.
//!
//! ## Module Organization
//!
//! - [`target`] - Target names and execution-plan resolution
//! - [`orchestrate`] - Top-level dispatch and completed-stage tracking
//! - [`matrix`] - The 2×4 architecture/configuration matrix and fail-fast loop
//! - [`stale`] - Marker-file staleness checks
//! - [`driver`] - CMake/CTest delegates behind a trait seam
//! - [`install`] - Manifest-driven install and mirror uninstall
//! - [`package`] - NSIS staging and installer generation
//! - [`paths`] - Pure path derivation for every tree this tool touches
//! - [`config`] / [`project`] - The generated and checked-in halves of setup

/// Configuration written by the configure step (`winmake.toml`).
pub mod config;

/// External build/test delegates (CMake, CTest).
pub mod driver;

/// Install and uninstall under the configured prefix.
pub mod install;

/// The architecture × configuration build matrix.
pub mod matrix;

/// Top-level target dispatch.
pub mod orchestrate;

/// Installer packaging via NSIS.
pub mod package;

/// Path derivation for build, install and staging trees.
pub mod paths;

/// The consuming project's manifest (`project.toml`).
pub mod project;

/// Marker-file staleness tracking.
pub mod stale;

/// Target names and plan resolution.
pub mod target;
