use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_SEARCH_TIME: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
}

/// How the disordered input cell is enlarged into the SQS supercell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scaling {
    /// Multiply the atom count by this factor and let `mcsqs` choose the
    /// supercell shape. Must be a positive integer value.
    Factor(f64),
    /// Expand the cell along each lattice vector before the search and fix
    /// the cell shape during the search.
    Supercell([u32; 3]),
}

impl Default for Scaling {
    fn default() -> Self {
        Scaling::Factor(1.0)
    }
}

/// Tuning parameters of the Monte Carlo search, passed to every instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchWeights {
    /// Monte Carlo temperature (`-T`).
    pub temperature: f64,
    /// Weight of the cluster range term (`-wr`).
    pub wr: f64,
    /// Penalty for cluster size (`-wn`).
    pub wn: f64,
    /// Decay of the weights with cluster diameter (`-wd`).
    pub wd: f64,
    /// Tolerance for considering two correlations equal (`-tol`).
    pub tol: f64,
}

impl Default for SearchWeights {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            wr: 1.0,
            wn: 1.0,
            wd: 0.5,
            tol: 1e-3,
        }
    }
}

/// Locations of the external ATAT programs.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolPaths {
    pub mcsqs: PathBuf,
    pub str2cif: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            mcsqs: PathBuf::from("mcsqs"),
            str2cif: PathBuf::from("str2cif"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqsConfig {
    /// Cluster cutoff distance in Å keyed by cluster size (2 = pairs, 3 = triplets, ...).
    pub clusters: BTreeMap<u32, f64>,
    pub scaling: Scaling,
    pub search_time: Duration,
    /// Run directory. A fresh temporary directory is created and kept when `None`.
    pub directory: Option<PathBuf>,
    pub instances: usize,
    pub weights: SearchWeights,
    pub tools: ToolPaths,
}

#[derive(Default)]
pub struct SqsConfigBuilder {
    clusters: Option<BTreeMap<u32, f64>>,
    scaling: Option<Scaling>,
    search_time: Option<Duration>,
    directory: Option<PathBuf>,
    instances: Option<usize>,
    weights: Option<SearchWeights>,
    tools: Option<ToolPaths>,
}

impl SqsConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clusters(mut self, clusters: BTreeMap<u32, f64>) -> Self {
        self.clusters = Some(clusters);
        self
    }
    pub fn cluster(mut self, size: u32, cutoff: f64) -> Self {
        self.clusters.get_or_insert_with(BTreeMap::new).insert(size, cutoff);
        self
    }
    pub fn scaling(mut self, scaling: Scaling) -> Self {
        self.scaling = Some(scaling);
        self
    }
    pub fn search_time(mut self, search_time: Duration) -> Self {
        self.search_time = Some(search_time);
        self
    }
    pub fn directory(mut self, directory: PathBuf) -> Self {
        self.directory = Some(directory);
        self
    }
    pub fn instances(mut self, instances: usize) -> Self {
        self.instances = Some(instances);
        self
    }
    pub fn weights(mut self, weights: SearchWeights) -> Self {
        self.weights = Some(weights);
        self
    }
    pub fn tools(mut self, tools: ToolPaths) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn build(self) -> Result<SqsConfig, ConfigError> {
        Ok(SqsConfig {
            clusters: self
                .clusters
                .ok_or(ConfigError::MissingParameter("clusters"))?,
            scaling: self.scaling.unwrap_or_default(),
            search_time: self.search_time.unwrap_or(DEFAULT_SEARCH_TIME),
            directory: self.directory,
            instances: self.instances.unwrap_or_else(default_instances),
            weights: self.weights.unwrap_or_default(),
            tools: self.tools.unwrap_or_default(),
        })
    }
}

/// One instance per available CPU.
pub fn default_instances() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}
