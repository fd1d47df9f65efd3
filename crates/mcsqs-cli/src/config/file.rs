use crate::error::{CliError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileSearchConfig {
    /// Time budget in minutes.
    pub search_minutes: Option<f64>,
    pub instances: Option<usize>,
    pub directory: Option<PathBuf>,
    pub scaling: Option<f64>,
    pub supercell: Option<[u32; 3]>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileWeightsConfig {
    pub temperature: Option<f64>,
    pub wr: Option<f64>,
    pub wn: Option<f64>,
    pub wd: Option<f64>,
    pub tol: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileToolsConfig {
    pub mcsqs: Option<PathBuf>,
    pub str2cif: Option<PathBuf>,
}

/// The contents of a `--config` TOML file. Every table and key is optional.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileConfig {
    pub search: Option<FileSearchConfig>,
    pub weights: Option<FileWeightsConfig>,
    pub tools: Option<FileToolsConfig>,
    /// Cutoff distance keyed by cluster size. TOML keys are strings, so sizes
    /// are parsed when the configuration is built.
    pub clusters: Option<BTreeMap<String, f64>>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const FULL_CONFIG: &str = r#"
[search]
search-minutes = 30
instances = 4
directory = "runs/cuau"
supercell = [2, 2, 2]

[weights]
temperature = 2.0
wd = 0.25

[tools]
mcsqs = "/opt/atat/bin/mcsqs"

[clusters]
2 = 5.5
3 = 3.0
"#;

    #[test]
    fn full_config_parses_every_table() {
        let config = FileConfig::from_toml(FULL_CONFIG).unwrap();

        let search = config.search.unwrap();
        assert_eq!(search.search_minutes, Some(30.0));
        assert_eq!(search.instances, Some(4));
        assert_eq!(search.directory, Some(PathBuf::from("runs/cuau")));
        assert_eq!(search.supercell, Some([2, 2, 2]));
        assert_eq!(search.scaling, None);

        let weights = config.weights.unwrap();
        assert_eq!(weights.temperature, Some(2.0));
        assert_eq!(weights.wd, Some(0.25));
        assert_eq!(weights.wr, None);

        let tools = config.tools.unwrap();
        assert_eq!(tools.mcsqs, Some(PathBuf::from("/opt/atat/bin/mcsqs")));
        assert_eq!(tools.str2cif, None);

        let clusters = config.clusters.unwrap();
        assert_eq!(clusters.get("2"), Some(&5.5));
        assert_eq!(clusters.get("3"), Some(&3.0));
    }

    #[test]
    fn empty_file_is_all_defaults() {
        assert_eq!(FileConfig::from_toml("").unwrap(), FileConfig::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(FileConfig::from_toml("[search]\nsearch_minutes = 5\n").is_err());
        assert!(FileConfig::from_toml("[optimizer]\nsteps = 5\n").is_err());
    }

    #[test]
    fn unparsable_file_reports_its_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[search\n").unwrap();

        match FileConfig::from_file(&path) {
            Err(CliError::FileParsing { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected a parsing error, got {:?}", other),
        }
    }
}
