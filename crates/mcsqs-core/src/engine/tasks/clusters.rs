use super::prepare::PreparedInput;
use crate::engine::context::RunContext;
use crate::engine::error::EngineError;
use crate::engine::files::CLUSTERS;
use crate::engine::launcher::ExitReport;
use crate::engine::progress::{PHASE_CLUSTERS, Progress};
use tracing::{info, instrument, warn};

/// Runs `mcsqs` once with the cluster cutoffs to write the cluster definitions.
///
/// A failure here is not fatal by itself: a search without clusters produces
/// no output, which the search task reports with this exit report attached.
#[instrument(skip_all, name = "cluster_generation_task")]
pub async fn run(
    prepared: &PreparedInput,
    context: &RunContext<'_>,
) -> Result<ExitReport, EngineError> {
    context.reporter.report(Progress::PhaseStart {
        name: PHASE_CLUSTERS,
    });

    let invocation = context.mcsqs().args(prepared.cluster_args.iter().cloned());
    info!(command = %invocation, "Generating clusters.");
    let report = context.launcher.run(invocation).await?;

    if !report.success() {
        warn!(%report, "Cluster generation exited abnormally.");
    }
    if !context.directory.join(CLUSTERS).is_file() {
        warn!("Cluster generation did not write {}.", CLUSTERS);
    }

    context.reporter.report(Progress::PhaseFinish);
    Ok(report)
}
