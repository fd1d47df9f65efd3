pub mod collect;
pub mod run;

use crate::error::{CliError, Result};
use mcsqs::core::io::cif::CifFile;
use mcsqs::core::io::traits::StructureFile;
use mcsqs::engine::launcher::locate_executable;
use mcsqs::engine::state::{RunOutcome, SqsResult};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Resolves an ATAT program on `PATH` before a run starts.
fn require_tool(program: &Path) -> Result<PathBuf> {
    let resolved =
        locate_executable(program).ok_or_else(|| CliError::MissingTool(program.to_path_buf()))?;
    debug!("Resolved {:?} to {:?}", program, resolved);
    Ok(resolved)
}

fn write_best(result: &SqsResult, output_path: &Path) -> Result<()> {
    info!("Writing best structure to {:?}", output_path);
    CifFile::write_to_path(&result.best_structure, output_path).map_err(|e| {
        CliError::FileParsing {
            path: output_path.to_path_buf(),
            source: e.into(),
        }
    })
}

fn print_summary(result: &SqsResult, output_path: &Path) {
    if result.outcome == RunOutcome::TimedOutRecovered {
        println!("Note: the search time ran out; the best structure found before the deadline was kept.");
    }
    println!(
        "✅ Best structure (objective: {}, {} sites) written to: {}",
        result.objective,
        result.best_structure.num_sites(),
        output_path.display()
    );
    println!("  Run directory: {}", result.directory.display());

    let ranked = result.ranked();
    if !ranked.is_empty() {
        println!("  {:<10} {}", "Instance", "Objective");
        for candidate in ranked {
            println!("  {:<10} {}", candidate.instance, candidate.objective);
        }
    }
}
