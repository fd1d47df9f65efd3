use super::prepare::PreparedInput;
use crate::engine::context::RunContext;
use crate::engine::error::EngineError;
use crate::engine::files::OutputFiles;
use crate::engine::launcher::{ExitReport, Instance, WaitOutcome};
use crate::engine::progress::{PHASE_SEARCH, PHASE_SELECT_BEST, Progress};
use crate::engine::state::RunOutcome;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

struct RunningInstance {
    index: usize,
    handle: Box<dyn Instance>,
    exit: Option<ExitReport>,
}

/// Runs the search instances against a shared time budget and leaves the
/// best result under the canonical `bestsqs.out` and `bestcorr.out` names.
///
/// With more than one instance, each gets its own `-ip=<k>` index and
/// `mcsqs -best` picks the best of their outputs once they have all stopped,
/// whether they finished or were killed at the deadline. A single instance
/// writes the canonical files itself.
///
/// # Errors
///
/// - [`EngineError::SearchTimeout`] if the budget ran out and no canonical output exists.
/// - [`EngineError::SearchFailed`] if the programs exited within the budget
///   without producing canonical output. The exit reports of every
///   invocation, cluster generation included, are part of the reason.
#[instrument(skip_all, name = "search_task", fields(instances = context.config.instances))]
pub async fn run(
    prepared: &PreparedInput,
    context: &RunContext<'_>,
    cluster_report: ExitReport,
) -> Result<RunOutcome, EngineError> {
    let config = context.config;
    let parallel = config.instances > 1;
    let mut reports = vec![cluster_report];

    context.reporter.report(Progress::PhaseStart { name: PHASE_SEARCH });
    let mut instances = spawn_instances(prepared, context).await?;

    context.reporter.report(Progress::TaskStart {
        total_steps: instances.len() as u64,
    });
    let deadline = Instant::now() + config.search_time;
    let mut timed_out = false;
    for instance in &mut instances {
        // The deadline is shared: once it has passed, waits on the remaining
        // instances only pick up the ones that already exited.
        match instance.handle.wait_until(deadline).await? {
            WaitOutcome::Completed(report) => {
                if !report.success() {
                    warn!(instance = instance.index, %report, "Search instance exited abnormally.");
                }
                instance.exit = Some(report);
                context.reporter.report(Progress::TaskIncrement);
            }
            WaitOutcome::TimedOut => timed_out = true,
        }
    }

    if timed_out {
        info!(
            budget_secs = config.search_time.as_secs_f64(),
            "Search budget exhausted; stopping running instances."
        );
        for instance in instances.iter_mut().filter(|i| i.exit.is_none()) {
            instance.handle.kill().await?;
            debug!(instance = instance.index, "Killed search instance.");
            context.reporter.report(Progress::TaskIncrement);
        }
    }
    context.reporter.report(Progress::TaskFinish);
    context.reporter.report(Progress::PhaseFinish);
    reports.extend(instances.into_iter().filter_map(|i| i.exit));

    if parallel {
        reports.push(select_best(context).await?);
    }

    let canonical = OutputFiles::canonical();
    if canonical.exist_in(context.directory) {
        if timed_out {
            warn!("Search timed out; using the best structure found before the deadline.");
            context.reporter.message(format!(
                "Search stopped after {:.0}s; results are the best found within the budget.",
                config.search_time.as_secs_f64()
            ));
            return Ok(RunOutcome::TimedOutRecovered);
        }
        info!("Search completed.");
        return Ok(RunOutcome::Completed);
    }

    if timed_out {
        return Err(EngineError::SearchTimeout {
            budget: config.search_time,
            directory: context.directory.to_path_buf(),
        });
    }
    let diagnostics = reports
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    Err(EngineError::SearchFailed {
        reason: format!(
            "no {} and {} in {} ({})",
            canonical.structure,
            canonical.correlations,
            context.directory.display(),
            diagnostics
        ),
    })
}

async fn spawn_instances(
    prepared: &PreparedInput,
    context: &RunContext<'_>,
) -> Result<Vec<RunningInstance>, EngineError> {
    let count = context.config.instances;
    let mut instances: Vec<RunningInstance> = Vec::with_capacity(count);

    for index in 1..=count {
        let mut invocation = context.mcsqs().args(prepared.search_args.iter().cloned());
        if count > 1 {
            invocation = invocation.arg(format!("-ip={}", index));
        }
        debug!(instance = index, command = %invocation, "Starting search instance.");

        match context.launcher.spawn(invocation).await {
            Ok(handle) => instances.push(RunningInstance {
                index,
                handle,
                exit: None,
            }),
            Err(e) => {
                for started in &mut instances {
                    let _ = started.handle.kill().await;
                }
                return Err(e);
            }
        }
    }
    info!(count, "Search instances started.");
    Ok(instances)
}

async fn select_best(context: &RunContext<'_>) -> Result<ExitReport, EngineError> {
    context.reporter.report(Progress::PhaseStart {
        name: PHASE_SELECT_BEST,
    });
    let invocation = context.mcsqs().arg("-best");
    info!(command = %invocation, "Selecting best structure across instances.");
    let report = context.launcher.run(invocation).await?;
    if !report.success() {
        warn!(%report, "Best-structure selection exited abnormally.");
    }
    context.reporter.report(Progress::PhaseFinish);
    Ok(report)
}
