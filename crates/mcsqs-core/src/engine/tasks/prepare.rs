use crate::core::io::atat::AtatFile;
use crate::core::io::traits::StructureFile;
use crate::core::models::structure::Structure;
use crate::engine::config::{Scaling, SearchWeights, SqsConfig};
use crate::engine::context::RunContext;
use crate::engine::error::EngineError;
use crate::engine::files::{CELL_OVERRIDE, INPUT_STRUCTURE};
use crate::engine::progress::{PHASE_PREPARE, Progress};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use tracing::{debug, info, instrument};

/// The files written to the run directory and the argument lists derived from them.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedInput {
    /// One `-<size>=<cutoff>` flag per cluster size.
    pub cluster_args: Vec<String>,
    /// Arguments shared by every search instance, weights included.
    pub search_args: Vec<String>,
    /// Number of atoms in the supercell the search looks for.
    pub atom_count: usize,
}

/// Checks that a structure and configuration describe a meaningful search.
///
/// Runs before anything touches the filesystem or starts a process.
pub fn validate(structure: &Structure, config: &SqsConfig) -> Result<(), EngineError> {
    let invalid = |message: String| Err(EngineError::InvalidInput(message));

    if structure.is_ordered() {
        return invalid(
            "structure is fully ordered; at least one site needs a partial occupancy".into(),
        );
    }
    match config.scaling {
        Scaling::Factor(factor) => {
            if !factor.is_finite() || factor < 1.0 || factor.fract() != 0.0 {
                return invalid(format!(
                    "scaling factor must be a positive integer, got {}",
                    factor
                ));
            }
            if scaled_atom_count(factor, structure.num_sites()).is_none() {
                return invalid(format!("scaling factor {} is too large", factor));
            }
        }
        Scaling::Supercell(multipliers) => {
            if multipliers.contains(&0) {
                return invalid(format!(
                    "supercell multipliers must be positive, got {:?}",
                    multipliers
                ));
            }
            if structure.supercell_site_count(multipliers).is_none() {
                return invalid(format!("supercell {:?} is too large", multipliers));
            }
        }
    }
    if config.clusters.is_empty() {
        return invalid("at least one cluster cutoff is required".into());
    }
    for (&size, &cutoff) in &config.clusters {
        if size < 2 {
            return invalid(format!("cluster size must be at least 2, got {}", size));
        }
        if !cutoff.is_finite() || cutoff <= 0.0 {
            return invalid(format!(
                "cutoff for {}-body clusters must be a positive distance, got {}",
                size, cutoff
            ));
        }
    }
    if config.instances == 0 {
        return invalid("instance count must be at least 1".into());
    }
    if config.search_time.is_zero() {
        return invalid("search time must be positive".into());
    }
    Ok(())
}

#[instrument(skip_all, name = "prepare_input_task")]
pub fn run(structure: &Structure, context: &RunContext) -> Result<PreparedInput, EngineError> {
    context.reporter.report(Progress::PhaseStart {
        name: PHASE_PREPARE,
    });
    let config = context.config;
    validate(structure, config)?;

    // A scalar factor leaves the supercell shape to mcsqs. A vector expands
    // the cell here and pins the shape with an identity sqscell.out.
    let expanded;
    let (written, atom_count, mut search_args) = match config.scaling {
        Scaling::Factor(factor) => {
            let atom_count = scaled_atom_count(factor, structure.num_sites()).ok_or_else(|| {
                EngineError::InvalidInput(format!("scaling factor {} is too large", factor))
            })?;
            (structure, atom_count, vec![format!("-n={}", atom_count)])
        }
        Scaling::Supercell(multipliers) => {
            expanded = structure.supercell(multipliers);
            write_identity_cell(context)?;
            let atom_count = expanded.num_sites();
            let args = vec!["-rc".to_string(), format!("-n={}", atom_count)];
            (&expanded, atom_count, args)
        }
    };

    let input_path = context.directory.join(INPUT_STRUCTURE);
    AtatFile::write_to_path(written, &input_path).map_err(io::Error::other)?;
    debug!(path = %input_path.display(), sites = written.num_sites(), "Wrote input structure.");

    search_args.extend(weight_args(&config.weights));
    let cluster_args = config
        .clusters
        .iter()
        .map(|(size, cutoff)| format!("-{}={}", size, cutoff))
        .collect();

    info!(atom_count, "Input prepared.");
    context.reporter.report(Progress::PhaseFinish);

    Ok(PreparedInput {
        cluster_args,
        search_args,
        atom_count,
    })
}

/// `factor * sites`, or `None` when the factor is not exactly representable
/// as a `usize` or the product overflows.
fn scaled_atom_count(factor: f64, sites: usize) -> Option<usize> {
    let whole = factor as usize;
    if whole as f64 != factor {
        return None;
    }
    whole.checked_mul(sites)
}

fn write_identity_cell(context: &RunContext) -> Result<(), EngineError> {
    let path = context.directory.join(CELL_OVERRIDE);
    let mut writer = BufWriter::new(File::create(&path)?);
    AtatFile::write_identity_cell(&mut writer)?;
    writer.flush()?;
    debug!(path = %path.display(), "Wrote identity supercell override.");
    Ok(())
}

fn weight_args(weights: &SearchWeights) -> [String; 5] {
    [
        format!("-T={}", weights.temperature),
        format!("-wr={}", weights.wr),
        format!("-wn={}", weights.wn),
        format!("-wd={}", weights.wd),
        format!("-tol={}", weights.tol),
    ]
}
