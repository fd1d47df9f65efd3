use super::{print_summary, require_tool, write_best};
use crate::cli::RunArgs;
use crate::config::builder::build_config;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use mcsqs::{
    core::io::{atat::AtatFile, cif::CifFile, traits::StructureFile},
    core::models::structure::Structure,
    engine::launcher::ProcessLauncher,
    engine::progress::ProgressReporter,
    workflows,
};
use std::path::Path;
use tracing::info;

pub async fn run(args: RunArgs) -> Result<()> {
    info!("Merging configuration from file and CLI arguments...");
    let mut app_config = build_config(&args)?;

    let tools = &mut app_config.core_config.tools;
    tools.mcsqs = require_tool(&tools.mcsqs)?;
    tools.str2cif = require_tool(&tools.str2cif)?;

    info!("Loading input structure from {:?}", &app_config.input_path);
    let structure = load_structure(&app_config.input_path)?;
    info!(
        "Loaded {} site(s), composition {:?}",
        structure.num_sites(),
        structure.composition()
    );

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Starting SQS search with {} instance(s)...",
        app_config.core_config.instances
    );
    let result = workflows::sqs::run(
        &structure,
        &app_config.core_config,
        &ProcessLauncher::new(),
        &reporter,
    )
    .await?;

    write_best(&result, &app_config.output_path)?;
    print_summary(&result, &app_config.output_path);
    Ok(())
}

/// Reads `.cif` files as CIF and anything else as an ATAT lattice file.
fn load_structure(path: &Path) -> Result<Structure> {
    let is_cif = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("cif"));
    let parsed = if is_cif {
        CifFile::read_from_path(path).map(|(structure, _)| structure).map_err(anyhow::Error::from)
    } else {
        AtatFile::read_from_path(path).map(|(structure, ())| structure).map_err(anyhow::Error::from)
    };
    parsed.map_err(|source| CliError::FileParsing {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const CIF: &str = "\
data_CuAu
_cell_length_a 3.6
_cell_length_b 3.6
_cell_length_c 3.6
_cell_angle_alpha 90
_cell_angle_beta 90
_cell_angle_gamma 90
loop_
_atom_site_label
_atom_site_type_symbol
_atom_site_fract_x
_atom_site_fract_y
_atom_site_fract_z
_atom_site_occupancy
Cu1 Cu 0 0 0 0.5
Au1 Au 0 0 0 0.5
";

    const ATAT: &str = "\
3.6 0 0
0 3.6 0
0 0 3.6
1 0 0
0 1 0
0 0 1
0 0 0 Cu=0.5,Au=0.5
";

    #[test]
    fn structure_format_follows_the_extension() {
        let dir = tempdir().unwrap();
        let cif = dir.path().join("rndstr.CIF");
        let atat = dir.path().join("rndstr.in");
        fs::write(&cif, CIF).unwrap();
        fs::write(&atat, ATAT).unwrap();

        for path in [cif, atat] {
            let structure = load_structure(&path).unwrap();
            assert_eq!(structure.num_sites(), 1, "{:?}", path);
            assert!(structure.is_disordered());
        }
    }

    #[test]
    fn unreadable_structure_reports_its_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.in");
        fs::write(&path, "not a lattice\n").unwrap();

        match load_structure(&path) {
            Err(CliError::FileParsing { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected a parsing error, got {:?}", other.map(|s| s.num_sites())),
        }
    }
}
