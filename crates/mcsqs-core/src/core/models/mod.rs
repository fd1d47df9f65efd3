//! # Core Models Module
//!
//! This module contains the crystal structure model consumed and produced by the
//! SQS workflow.
//!
//! ## Overview
//!
//! A [`structure::Structure`] is a [`lattice::Lattice`] plus the [`site::Site`]s of one
//! unit cell. Sites carry one or more species with fractional occupancies, which is
//! how a disordered crystal (the input to an SQS search) is represented. The model
//! is deliberately small: it supports exactly what the workflow needs, namely
//! disorder checks, site counting, supercell expansion and conversion to and from
//! the file formats in [`crate::core::io`].
//!
//! ## Key Components
//!
//! - [`lattice`] - Lattice vectors, cell parameters and coordinate conversions
//! - [`site`] - Species, occupancies and fractional positions
//! - [`structure`] - The complete periodic structure and its supercell expansion
//!
//! ## Usage
//!
//! ```ignore
//! use mcsqs::core::models::{lattice::Lattice, site::{Site, Species}, structure::Structure};
//!
//! let lattice = Lattice::from_parameters([3.6, 3.6, 3.6], [90.0, 90.0, 90.0]);
//! let site = Site::new(vec![Species::new("Au", 0.5), Species::new("Cu", 0.5)], Point3::origin());
//! let structure = Structure::new(lattice, vec![site]);
//! assert!(structure.is_disordered());
//! ```

pub mod lattice;
pub mod site;
pub mod structure;
