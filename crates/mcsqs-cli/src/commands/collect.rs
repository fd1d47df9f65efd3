use super::{print_summary, require_tool, write_best};
use crate::cli::CollectArgs;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use mcsqs::engine::config::ToolPaths;
use mcsqs::engine::files::OutputFiles;
use mcsqs::engine::launcher::ProcessLauncher;
use mcsqs::engine::progress::ProgressReporter;
use mcsqs::workflows;
use tracing::info;

pub async fn run(args: CollectArgs) -> Result<()> {
    let str2cif = args.str2cif.unwrap_or_else(|| ToolPaths::default().str2cif);
    let str2cif = require_tool(&str2cif)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    info!("Collecting results from {:?}", &args.directory);
    let result =
        workflows::sqs::collect(&args.directory, &str2cif, &ProcessLauncher::new(), &reporter)
            .await?;

    let output_path = match args.output {
        Some(path) => {
            write_best(&result, &path)?;
            path
        }
        None => OutputFiles::canonical().structure_cif_path(&result.directory),
    };
    print_summary(&result, &output_path);
    Ok(())
}
