//! # Workflows Module
//!
//! High-level entry points that run complete procedures on top of the engine.
//!
//! ## Overview
//!
//! - **SQS Search** ([`sqs::run`]) - From a disordered structure to the best
//!   special quasirandom structure, through input preparation, cluster
//!   generation, the time-bounded parallel search and result collection.
//! - **Result Collection** ([`sqs::collect`]) - Reads the results of a search
//!   that already ran, for example one that was interrupted or run by hand.
//!
//! Both take the [`crate::engine::launcher::Launcher`] that starts the external
//! programs, so callers can substitute their own process handling.

pub mod sqs;
