use mcsqs::engine::config::{self as core_config, SearchWeights, ToolPaths};

pub struct DefaultsConfig {
    pub search_minutes: f64,
    pub scaling: f64,
    pub instances: usize,
    pub weights: SearchWeights,
    pub tools: ToolPaths,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            search_minutes: core_config::DEFAULT_SEARCH_TIME.as_secs_f64() / 60.0,
            scaling: 1.0,
            instances: core_config::default_instances(),
            weights: SearchWeights::default(),
            tools: ToolPaths::default(),
        }
    }
}
