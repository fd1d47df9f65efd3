//! Provides input/output functionality for crystal structure file formats.
//!
//! This module contains readers and writers for the formats exchanged with the
//! ATAT tool suite: the ATAT lattice format used by `mcsqs` itself and CIF,
//! which is what `str2cif` produces from the search output. Both formats are
//! accessed through the [`traits::StructureFile`] trait.

pub mod atat;
pub mod cif;
pub mod traits;
