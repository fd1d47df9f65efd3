use crate::core::io::cif::CifFile;
use crate::core::io::traits::StructureFile;
use crate::core::models::structure::Structure;
use crate::engine::error::EngineError;
use crate::engine::files::{OutputFiles, indexed_instances};
use crate::engine::launcher::{Invocation, Launcher};
use crate::engine::objective::ObjectiveValue;
use crate::engine::progress::{PHASE_COLLECT, Progress, ProgressReporter};
use crate::engine::state::{RunOutcome, SqsCandidate, SqsResult};
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// Reads the results left in a run directory into an [`SqsResult`].
///
/// The canonical `bestsqs.out`/`bestcorr.out` pair gives the best structure
/// and objective. Every `bestsqs<i>.out` becomes a candidate and must have a
/// matching `bestcorr<i>.out`; an instance that reports a perfect match is
/// given the best objective. Structures are converted to CIF with `str2cif` inside the
/// directory and read back, so the directory also ends up holding the `.cif`
/// form of every result.
#[instrument(skip_all, name = "aggregate_task", fields(dir = %directory.display()))]
pub async fn run(
    launcher: &dyn Launcher,
    str2cif: &Path,
    directory: &Path,
    outcome: RunOutcome,
    reporter: &ProgressReporter<'_>,
) -> Result<SqsResult, EngineError> {
    reporter.report(Progress::PhaseStart {
        name: PHASE_COLLECT,
    });
    let directory = directory.canonicalize()?;

    let canonical = OutputFiles::canonical();
    if !canonical.exist_in(&directory) {
        return Err(EngineError::SearchFailed {
            reason: format!(
                "no {} and {} in {}",
                canonical.structure,
                canonical.correlations,
                directory.display()
            ),
        });
    }
    let best_structure = convert_and_read(launcher, str2cif, &directory, &canonical).await?;
    let objective = read_objective(&canonical.correlations_path(&directory))?;
    info!(%objective, sites = best_structure.num_sites(), "Read best structure.");

    let indices = indexed_instances(&directory)?;
    reporter.report(Progress::TaskStart {
        total_steps: indices.len() as u64,
    });
    let mut candidates = Vec::with_capacity(indices.len());
    for index in indices {
        let files = OutputFiles::instance(index);
        let correlations = files.correlations_path(&directory);
        if !correlations.is_file() {
            return Err(EngineError::CorrelationReport {
                path: correlations,
                message: format!("missing report for {}", files.structure),
            });
        }
        let structure = convert_and_read(launcher, str2cif, &directory, &files).await?;
        let own = read_objective(&files.correlations_path(&directory))?;
        candidates.push(SqsCandidate {
            instance: index,
            structure,
            objective: own.reconcile(objective),
        });
        reporter.report(Progress::TaskIncrement);
    }
    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);

    info!(candidates = candidates.len(), "Collected results.");
    Ok(SqsResult {
        best_structure,
        objective,
        candidates,
        directory,
        outcome,
    })
}

async fn convert_and_read(
    launcher: &dyn Launcher,
    str2cif: &Path,
    directory: &Path,
    files: &OutputFiles,
) -> Result<Structure, EngineError> {
    let invocation = Invocation::new(str2cif, directory)
        .stdin_from(&files.structure)
        .stdout_to(&files.structure_cif);
    debug!(command = %invocation, "Converting structure.");
    let report = launcher.run(invocation).await?;
    if !report.success() {
        warn!(%report, file = %files.structure, "Structure conversion exited abnormally.");
    }

    let path = files.structure_cif_path(directory);
    let (structure, metadata) =
        CifFile::read_from_path(&path).map_err(|e| EngineError::StructureParse {
            path: path.clone(),
            message: e.to_string(),
        })?;
    for warning in &metadata.warnings {
        debug!(file = %files.structure_cif, "{}", warning);
    }
    Ok(structure)
}

fn read_objective(path: &Path) -> Result<ObjectiveValue, EngineError> {
    let contents = std::fs::read_to_string(path)?;
    ObjectiveValue::from_report(&contents).map_err(|e| EngineError::CorrelationReport {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
