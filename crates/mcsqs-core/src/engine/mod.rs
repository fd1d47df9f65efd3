//! # Engine Module
//!
//! This module drives the external `mcsqs` program through a complete special
//! quasirandom structure search.
//!
//! ## Overview
//!
//! A run owns a single directory. Every external program is started in that
//! directory through the [`launcher::Launcher`] seam, and all communication
//! with those programs happens through the fixed file names in [`files`].
//! The engine never changes the working directory of the calling process.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Cluster cutoffs, scaling, time budget, weights and tool paths
//! - **Process Control** ([`launcher`]) - Starting, waiting on with a deadline, and killing programs
//! - **File Contract** ([`files`]) - Canonical and per-instance output names
//! - **Objective Values** ([`objective`]) - Numeric values and the perfect-match sentinel
//! - **Stages** ([`tasks`]) - Input preparation, cluster generation, search and aggregation
//! - **Results** ([`state`]) - Candidates, the final result bundle and how the run ended
//! - **Progress Monitoring** ([`progress`]) - Phase and per-instance progress events
//! - **Error Handling** ([`error`]) - Engine error taxonomy

pub mod config;
pub mod context;
pub mod error;
pub mod files;
pub mod launcher;
pub mod objective;
pub mod progress;
pub mod state;
pub mod tasks;

#[cfg(test)]
pub(crate) mod fakes;
