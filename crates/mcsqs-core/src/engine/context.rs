use super::config::SqsConfig;
use super::launcher::{Invocation, Launcher};
use super::progress::ProgressReporter;
use std::path::Path;

/// Everything the stages of one run share: the configuration, the run
/// directory every program executes in, the launcher that starts them and
/// the progress sink.
#[derive(Clone, Copy)]
pub struct RunContext<'a> {
    pub config: &'a SqsConfig,
    pub directory: &'a Path,
    pub launcher: &'a dyn Launcher,
    pub reporter: &'a ProgressReporter<'a>,
}

impl<'a> RunContext<'a> {
    pub fn new(
        config: &'a SqsConfig,
        directory: &'a Path,
        launcher: &'a dyn Launcher,
        reporter: &'a ProgressReporter<'a>,
    ) -> Self {
        Self {
            config,
            directory,
            launcher,
            reporter,
        }
    }

    /// An `mcsqs` invocation in the run directory.
    pub fn mcsqs(&self) -> Invocation {
        Invocation::new(&self.config.tools.mcsqs, self.directory)
    }
}
