//! # Core Module
//!
//! This module provides the stateless building blocks of the library: the crystal
//! structure model and the file formats used to exchange structures with the
//! external ATAT programs.
//!
//! ## Architecture
//!
//! - **Structure Representation** ([`models`]) - Lattices, sites with fractional
//!   occupancies, and complete periodic structures
//! - **File I/O** ([`io`]) - Reading and writing the ATAT lattice format and CIF
//!
//! Nothing in this module spawns processes or touches the filesystem beyond the
//! explicit path-based helpers of [`io::traits::StructureFile`].

pub mod io;
pub mod models;
