use super::defaults::DefaultsConfig;
use super::file::{FileConfig, FileSearchConfig, FileToolsConfig, FileWeightsConfig};
use super::models::AppConfig;
use crate::cli::RunArgs;
use crate::error::{CliError, Result};
use crate::utils::parser;
use mcsqs::engine::config::{Scaling, SearchWeights, SqsConfigBuilder, ToolPaths};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Merges command-line arguments over the config file over built-in defaults.
pub fn build_config(args: &RunArgs) -> Result<AppConfig> {
    let defaults = DefaultsConfig::default();

    let file_config = if let Some(config_path) = &args.config {
        FileConfig::from_file(config_path)?
    } else {
        FileConfig::default()
    };

    let mut file_config = apply_set_values(file_config, &args.set_values)?;

    let search_file = file_config.search.take().unwrap_or_default();
    let weights_file = file_config.weights.take().unwrap_or_default();
    let tools_file = file_config.tools.take().unwrap_or_default();

    let clusters = merge_clusters(file_config.clusters.take().unwrap_or_default(), &args.clusters)?;
    if clusters.is_empty() {
        return Err(CliError::Config(
            "No cluster cutoffs given. Use --cluster SIZE=CUTOFF or a [clusters] table.".into(),
        ));
    }

    let scaling = resolve_scaling(args, &search_file, defaults.scaling)?;

    let minutes = args
        .search_minutes
        .or(search_file.search_minutes)
        .unwrap_or(defaults.search_minutes);
    let search_time = Duration::try_from_secs_f64(minutes * 60.0)
        .ok()
        .filter(|d| !d.is_zero())
        .ok_or_else(|| {
            CliError::Config(format!("Search time must be a positive number of minutes, got {}", minutes))
        })?;

    let instances = args
        .instances
        .or(search_file.instances)
        .unwrap_or(defaults.instances);

    let weights = merge_weights(args, &weights_file, &defaults.weights);
    let tools = merge_tools(args, tools_file, defaults.tools);

    let mut builder = SqsConfigBuilder::new()
        .clusters(clusters)
        .scaling(scaling)
        .search_time(search_time)
        .instances(instances)
        .weights(weights)
        .tools(tools);
    if let Some(directory) = args.directory.clone().or(search_file.directory) {
        builder = builder.directory(directory);
    }
    let core_config = builder
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    Ok(AppConfig {
        input_path: args.input.clone(),
        output_path: args.output.clone(),
        core_config,
    })
}

fn merge_clusters(file: BTreeMap<String, f64>, cli: &[String]) -> Result<BTreeMap<u32, f64>> {
    let mut clusters = BTreeMap::new();
    for (size, cutoff) in file {
        let size = size.trim().parse().map_err(|_| {
            CliError::Config(format!("Invalid cluster size in [clusters]: '{}'", size))
        })?;
        clusters.insert(size, cutoff);
    }
    for spec in cli {
        let (size, cutoff) =
            parser::parse_cluster(spec).map_err(|e| CliError::Argument(e.to_string()))?;
        clusters.insert(size, cutoff);
    }
    Ok(clusters)
}

fn resolve_scaling(args: &RunArgs, file: &FileSearchConfig, default: f64) -> Result<Scaling> {
    if let Some(spec) = &args.scaling.supercell {
        let multipliers =
            parser::parse_supercell(spec).map_err(|e| CliError::Argument(e.to_string()))?;
        return Ok(Scaling::Supercell(multipliers));
    }
    if let Some(factor) = args.scaling.scaling {
        return Ok(Scaling::Factor(factor));
    }
    match (file.scaling, file.supercell) {
        (Some(_), Some(_)) => Err(CliError::Config(
            "[search] sets both 'scaling' and 'supercell'; choose one.".into(),
        )),
        (None, Some(multipliers)) => Ok(Scaling::Supercell(multipliers)),
        (Some(factor), None) => Ok(Scaling::Factor(factor)),
        (None, None) => Ok(Scaling::Factor(default)),
    }
}

fn merge_weights(args: &RunArgs, file: &FileWeightsConfig, defaults: &SearchWeights) -> SearchWeights {
    SearchWeights {
        temperature: args
            .temperature
            .or(file.temperature)
            .unwrap_or(defaults.temperature),
        wr: args.wr.or(file.wr).unwrap_or(defaults.wr),
        wn: args.wn.or(file.wn).unwrap_or(defaults.wn),
        wd: args.wd.or(file.wd).unwrap_or(defaults.wd),
        tol: args.tol.or(file.tol).unwrap_or(defaults.tol),
    }
}

fn merge_tools(args: &RunArgs, file: FileToolsConfig, defaults: ToolPaths) -> ToolPaths {
    ToolPaths {
        mcsqs: args.mcsqs.clone().or(file.mcsqs).unwrap_or(defaults.mcsqs),
        str2cif: args
            .str2cif
            .clone()
            .or(file.str2cif)
            .unwrap_or(defaults.str2cif),
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| {
        CliError::Config(format!("Invalid value for {}: {}", key, value))
    })
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        let (key, value) =
            parser::parse_key_value(kv_pair).map_err(|e| CliError::Config(e.to_string()))?;

        match key {
            "search.search-minutes" => {
                config.search.get_or_insert_with(Default::default).search_minutes =
                    Some(parse_value(key, value)?);
            }
            "search.instances" => {
                config.search.get_or_insert_with(Default::default).instances = Some(parse_value(key, value)?);
            }
            "search.directory" => {
                config.search.get_or_insert_with(Default::default).directory = Some(PathBuf::from(value));
            }
            "search.scaling" => {
                let search = config.search.get_or_insert_with(Default::default);
                search.scaling = Some(parse_value(key, value)?);
                search.supercell = None;
            }
            "search.supercell" => {
                let search = config.search.get_or_insert_with(Default::default);
                search.supercell = Some(
                    parser::parse_supercell(value).map_err(|e| CliError::Config(e.to_string()))?,
                );
                search.scaling = None;
            }
            "weights.temperature" => {
                config.weights.get_or_insert_with(Default::default).temperature =
                    Some(parse_value(key, value)?);
            }
            "weights.wr" => {
                config.weights.get_or_insert_with(Default::default).wr = Some(parse_value(key, value)?);
            }
            "weights.wn" => {
                config.weights.get_or_insert_with(Default::default).wn = Some(parse_value(key, value)?);
            }
            "weights.wd" => {
                config.weights.get_or_insert_with(Default::default).wd = Some(parse_value(key, value)?);
            }
            "weights.tol" => {
                config.weights.get_or_insert_with(Default::default).tol = Some(parse_value(key, value)?);
            }
            "tools.mcsqs" => {
                config.tools.get_or_insert_with(Default::default).mcsqs = Some(PathBuf::from(value));
            }
            "tools.str2cif" => {
                config.tools.get_or_insert_with(Default::default).str2cif = Some(PathBuf::from(value));
            }
            _ => match key.strip_prefix("clusters.") {
                Some(size) => {
                    let cutoff = parse_value(key, value)?;
                    config
                        .clusters
                        .get_or_insert_with(BTreeMap::new)
                        .insert(size.to_string(), cutoff);
                }
                None => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            },
        }
    }
    Ok(config)
}
