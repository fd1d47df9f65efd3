//! The stages of an SQS run.
//!
//! Each submodule implements one stage, in the order a run executes them:
//! writing the input files and argument lists, generating the cluster
//! definitions, running the time-bounded search, and collecting the results.
//! Stages communicate only through their return values and the files in the
//! run directory.

pub mod aggregate;
pub mod clusters;
pub mod prepare;
pub mod search;
