use crate::core::models::structure::Structure;
use crate::engine::config::SqsConfig;
use crate::engine::context::RunContext;
use crate::engine::error::EngineError;
use crate::engine::launcher::Launcher;
use crate::engine::progress::ProgressReporter;
use crate::engine::state::{RunOutcome, SqsResult};
use crate::engine::tasks;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// Searches for a special quasirandom structure approximating `structure`.
///
/// The run takes place in `config.directory`, which is created if needed, or
/// in a new temporary directory that is kept after the run so its files can
/// be inspected. The returned result names the directory either way.
///
/// # Errors
///
/// - [`EngineError::InvalidInput`] before anything is written or started if the
///   structure is ordered or the configuration is out of range.
/// - [`EngineError::SearchTimeout`] if the time budget ran out before any
///   instance wrote a result.
/// - [`EngineError::SearchFailed`] if the programs stopped without a result.
/// - Launch, I/O and parse errors from the individual stages.
#[instrument(skip_all, name = "sqs_workflow")]
pub async fn run(
    structure: &Structure,
    config: &SqsConfig,
    launcher: &dyn Launcher,
    reporter: &ProgressReporter<'_>,
) -> Result<SqsResult, EngineError> {
    tasks::prepare::validate(structure, config)?;

    let directory = run_directory(config.directory.as_deref())?;
    info!(
        dir = %directory.display(),
        instances = config.instances,
        budget_secs = config.search_time.as_secs_f64(),
        "Starting SQS search."
    );
    let context = RunContext::new(config, &directory, launcher, reporter);

    let prepared = tasks::prepare::run(structure, &context)?;
    let cluster_report = tasks::clusters::run(&prepared, &context).await?;
    let outcome = tasks::search::run(&prepared, &context, cluster_report).await?;
    let result = tasks::aggregate::run(
        launcher,
        &config.tools.str2cif,
        &directory,
        outcome,
        reporter,
    )
    .await?;

    info!(
        objective = %result.objective,
        candidates = result.candidates.len(),
        "SQS workflow complete."
    );
    Ok(result)
}

/// Reads the results of a search that already ran in `directory`.
#[instrument(skip_all, name = "collect_workflow", fields(dir = %directory.display()))]
pub async fn collect(
    directory: &Path,
    str2cif: &Path,
    launcher: &dyn Launcher,
    reporter: &ProgressReporter<'_>,
) -> Result<SqsResult, EngineError> {
    tasks::aggregate::run(launcher, str2cif, directory, RunOutcome::Completed, reporter).await
}

fn run_directory(requested: Option<&Path>) -> Result<PathBuf, EngineError> {
    match requested {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            Ok(dir.to_path_buf())
        }
        None => Ok(tempfile::Builder::new().prefix("mcsqs-").tempdir()?.keep()),
    }
}
