//! # mcsqs Orchestration Library
//!
//! Generates special quasirandom structures (SQS) for disordered crystals by driving
//! the `mcsqs` Monte Carlo search of the Alloy Theoretic Automated Toolkit (ATAT).
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture with a clear separation of concerns.
//!
//! - **[`core`]: The Foundation.** Contains the stateless crystal structure model
//!   (`Structure`, `Lattice`, `Site`) and the readers and writers for the ATAT lattice
//!   format and CIF.
//!
//! - **[`engine`]: The Logic Core.** Holds the run configuration, the process launcher
//!   abstraction, and the individual stages of a run: preparing the input files,
//!   generating clusters, running the time-bounded parallel search, and aggregating
//!   the results.
//!
//! - **[`workflows`]: The Public API.** Ties the stages together into complete
//!   procedures. [`workflows::sqs::run`] performs a full search from a disordered
//!   structure and [`workflows::sqs::collect`] reads back the results of a search
//!   that already ran in a given directory.

pub mod core;
pub mod engine;
pub mod workflows;
