//! Fixed file names shared between this crate and the ATAT programs.
//!
//! `mcsqs` reads and writes relative paths in its working directory, so the
//! run directory layout is a contract: names are fixed, and instance outputs
//! are namespaced by a 1-based index when more than one instance runs.

use std::io;
use std::path::{Path, PathBuf};

/// Disordered input structure for `mcsqs`.
pub const INPUT_STRUCTURE: &str = "rndstr.in";
/// Supercell shape override read by `mcsqs -rc`.
pub const CELL_OVERRIDE: &str = "sqscell.out";
/// Cluster definitions written by the cluster generation step.
pub const CLUSTERS: &str = "clusters.out";

const STRUCTURE_STEM: &str = "bestsqs";
const CORRELATION_STEM: &str = "bestcorr";

/// The result files of either the run-level best or one indexed instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFiles {
    /// `bestsqs[i].out`, the structure in ATAT format.
    pub structure: String,
    /// `bestcorr[i].out`, the correlation report ending in the objective value.
    pub correlations: String,
    /// `bestsqs[i].cif`, the structure converted by `str2cif`.
    pub structure_cif: String,
}

impl OutputFiles {
    /// The unindexed files holding the best result of the run.
    pub fn canonical() -> Self {
        Self::with_suffix("")
    }

    /// The files written by instance `index` (1-based) of a parallel run.
    pub fn instance(index: usize) -> Self {
        Self::with_suffix(&index.to_string())
    }

    fn with_suffix(suffix: &str) -> Self {
        Self {
            structure: format!("{STRUCTURE_STEM}{suffix}.out"),
            correlations: format!("{CORRELATION_STEM}{suffix}.out"),
            structure_cif: format!("{STRUCTURE_STEM}{suffix}.cif"),
        }
    }

    /// Returns `true` when both the structure and the correlation report exist in `dir`.
    pub fn exist_in(&self, dir: &Path) -> bool {
        dir.join(&self.structure).is_file() && dir.join(&self.correlations).is_file()
    }

    pub fn structure_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.structure)
    }

    pub fn correlations_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.correlations)
    }

    pub fn structure_cif_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.structure_cif)
    }
}

/// Lists, in ascending order, the instance indices that left a `bestsqs<i>.out` file in `dir`.
///
/// Only the ATAT output counts; converted `.cif` files and any other names are ignored.
pub fn indexed_instances(dir: &Path) -> io::Result<Vec<usize>> {
    let mut indices = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if let Some(index) = parse_instance_index(name) {
            indices.push(index);
        }
    }
    indices.sort_unstable();
    Ok(indices)
}

fn parse_instance_index(name: &str) -> Option<usize> {
    let digits = name.strip_prefix(STRUCTURE_STEM)?.strip_suffix(".out")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().filter(|&index| index > 0)
}
