//! Scripted stand-ins for the ATAT programs, used by the engine and workflow tests.
//!
//! A [`FakeLauncher`] records every invocation and answers each one with a
//! [`Script`]: files to write into the working directory after a delay, and
//! how long the "process" keeps running afterwards. `str2cif` is emulated by
//! converting the redirected ATAT input to CIF with the crate's own formats.

use super::error::EngineError;
use super::files::{OutputFiles, indexed_instances};
use super::launcher::{ExitReport, Instance, Invocation, Launcher, WaitOutcome};
use super::objective::ObjectiveValue;
use crate::core::io::atat::AtatFile;
use crate::core::io::cif::CifFile;
use crate::core::io::traits::StructureFile;
use crate::core::models::lattice::Lattice;
use crate::core::models::site::{Site, Species};
use crate::core::models::structure::Structure;
use async_trait::async_trait;
use nalgebra::Point3;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

#[derive(Debug, Clone, Default)]
pub(crate) struct Script {
    write_delay: Duration,
    exit_delay: Duration,
    writes: Vec<(String, String)>,
    exit_code: i32,
}

impl Script {
    /// Finishes immediately with exit code 0 and no output.
    pub fn done() -> Self {
        Self::default()
    }

    /// Writes its files and exits after `delay`.
    pub fn after(delay: Duration) -> Self {
        Self {
            write_delay: delay,
            exit_delay: delay,
            ..Self::default()
        }
    }

    /// Keeps running until `delay` after writing its files.
    pub fn running_until(mut self, delay: Duration) -> Self {
        self.exit_delay = delay.max(self.write_delay);
        self
    }

    pub fn writing(mut self, name: impl Into<String>, contents: impl Into<String>) -> Self {
        self.writes.push((name.into(), contents.into()));
        self
    }

    pub fn exit_code(mut self, code: i32) -> Self {
        self.exit_code = code;
        self
    }

    /// Writes the structure and correlation report of `files`.
    pub fn writing_output(self, files: &OutputFiles, atoms: usize, objective: &str) -> Self {
        self.writing(files.structure.clone(), ordered_output(atoms))
            .writing(files.correlations.clone(), correlation_report(objective))
    }
}

type Responder = Box<dyn Fn(&Invocation) -> Script + Send + Sync>;

pub(crate) struct FakeLauncher {
    responder: Responder,
    invocations: Arc<Mutex<Vec<Invocation>>>,
    killed: Arc<Mutex<Vec<Invocation>>>,
}

impl FakeLauncher {
    pub fn new(responder: impl Fn(&Invocation) -> Script + Send + Sync + 'static) -> Self {
        Self {
            responder: Box::new(responder),
            invocations: Arc::new(Mutex::new(Vec::new())),
            killed: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().unwrap().clone()
    }

    pub fn invocations_of(&self, program: &str) -> Vec<Invocation> {
        self.invocations()
            .into_iter()
            .filter(|i| i.program == Path::new(program))
            .collect()
    }

    pub fn killed(&self) -> Vec<Invocation> {
        self.killed.lock().unwrap().clone()
    }
}

#[async_trait]
impl Launcher for FakeLauncher {
    async fn spawn(&self, invocation: Invocation) -> Result<Box<dyn Instance>, EngineError> {
        self.invocations.lock().unwrap().push(invocation.clone());
        let script = if invocation.program.file_name() == Some("str2cif".as_ref()) {
            convert_to_cif(&invocation)
        } else {
            (self.responder)(&invocation)
        };

        let dir = invocation.working_dir.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(script.write_delay).await;
            for (name, contents) in &script.writes {
                std::fs::write(dir.join(name), contents).unwrap();
            }
            tokio::time::sleep(script.exit_delay - script.write_delay).await;
            script.exit_code
        });

        Ok(Box::new(FakeInstance {
            invocation,
            task,
            killed: Arc::clone(&self.killed),
            exit: None,
        }))
    }
}

struct FakeInstance {
    invocation: Invocation,
    task: JoinHandle<i32>,
    killed: Arc<Mutex<Vec<Invocation>>>,
    exit: Option<ExitReport>,
}

impl FakeInstance {
    fn finish(&mut self, code: Option<i32>) -> ExitReport {
        let report = ExitReport::new(self.invocation.program_name(), code);
        self.exit = Some(report.clone());
        report
    }
}

#[async_trait]
impl Instance for FakeInstance {
    async fn wait_until(&mut self, deadline: Instant) -> Result<WaitOutcome, EngineError> {
        if let Some(exit) = &self.exit {
            return Ok(WaitOutcome::Completed(exit.clone()));
        }
        match tokio::time::timeout_at(deadline, &mut self.task).await {
            Ok(joined) => Ok(WaitOutcome::Completed(self.finish(Some(joined.unwrap())))),
            Err(_) => Ok(WaitOutcome::TimedOut),
        }
    }

    async fn wait(&mut self) -> Result<ExitReport, EngineError> {
        if let Some(exit) = &self.exit {
            return Ok(exit.clone());
        }
        let code = (&mut self.task).await.unwrap();
        Ok(self.finish(Some(code)))
    }

    async fn kill(&mut self) -> Result<(), EngineError> {
        if self.exit.is_none() {
            self.task.abort();
            let _ = (&mut self.task).await;
            self.killed.lock().unwrap().push(self.invocation.clone());
            self.finish(None);
        }
        Ok(())
    }
}

fn convert_to_cif(invocation: &Invocation) -> Script {
    let (Some(input), Some(output)) = (&invocation.stdin, &invocation.stdout) else {
        return Script::done().exit_code(1);
    };
    let output = output.display().to_string();
    match AtatFile::read_from_path(invocation.working_dir.join(input)) {
        Ok((structure, ())) => {
            let mut buffer = Vec::new();
            CifFile::write_to(&structure, &mut buffer).unwrap();
            Script::done().writing(output, String::from_utf8(buffer).unwrap())
        }
        Err(_) => Script::done().writing(output, "").exit_code(1),
    }
}

/// Emulates `mcsqs -best`: copies the best indexed instance output to the canonical names.
pub(crate) fn select_best(dir: &Path) -> Script {
    let mut best: Option<(ObjectiveValue, OutputFiles)> = None;
    for index in indexed_instances(dir).unwrap() {
        let files = OutputFiles::instance(index);
        let Ok(report) = std::fs::read_to_string(files.correlations_path(dir)) else {
            continue;
        };
        let objective = ObjectiveValue::from_report(&report).unwrap();
        if best.as_ref().is_none_or(|(b, _)| objective.total_cmp(b).is_lt()) {
            best = Some((objective, files));
        }
    }

    let canonical = OutputFiles::canonical();
    match best {
        Some((_, files)) => Script::done()
            .writing(
                canonical.structure,
                std::fs::read_to_string(files.structure_path(dir)).unwrap(),
            )
            .writing(
                canonical.correlations,
                std::fs::read_to_string(files.correlations_path(dir)).unwrap(),
            ),
        None => Script::done().exit_code(1),
    }
}

/// Answers `mcsqs` the way a run with `instances` parallel searches would.
///
/// Cluster generation writes `clusters.out`, instance `k` (or the single
/// unindexed instance) writes an `atoms`-site structure and the objective
/// `objectives[k - 1]` after `delays[k - 1]` and keeps running until
/// `lifetimes[k - 1]`, and `-best` selects the lowest objective.
pub(crate) fn mcsqs_responder(
    atoms: usize,
    objectives: Vec<&'static str>,
    delays: Vec<Duration>,
    lifetimes: Vec<Duration>,
) -> impl Fn(&Invocation) -> Script + Send + Sync + 'static {
    move |invocation| {
        if invocation.has_arg("-best") {
            return select_best(&invocation.working_dir);
        }
        let index = invocation
            .args
            .iter()
            .find_map(|a| a.strip_prefix("-ip=").and_then(|k| k.parse::<usize>().ok()));
        let is_search = invocation.args.iter().any(|a| a.starts_with("-T="));
        match (index, is_search) {
            (Some(k), _) => Script::after(delays[k - 1])
                .writing_output(&OutputFiles::instance(k), atoms, objectives[k - 1])
                .running_until(lifetimes[k - 1]),
            (None, true) => Script::after(delays[0])
                .writing_output(&OutputFiles::canonical(), atoms, objectives[0])
                .running_until(lifetimes[0]),
            (None, false) => Script::done().writing("clusters.out", "2\n2.500000\n"),
        }
    }
}

/// An ordered Au/Cu chain with `atoms` sites, in ATAT format.
pub(crate) fn ordered_output(atoms: usize) -> String {
    let lattice = Lattice::from_parameters([2.0 * atoms as f64, 4.0, 4.0], [90.0, 90.0, 90.0]);
    let sites = (0..atoms)
        .map(|i| {
            let element = if i % 2 == 0 { "Au" } else { "Cu" };
            Site::ordered(element, Point3::new(i as f64 / atoms as f64, 0.0, 0.0))
        })
        .collect();
    let mut buffer = Vec::new();
    AtatFile::write_to(&Structure::new(lattice, sites), &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

pub(crate) fn correlation_report(objective: &str) -> String {
    format!(
        "2\t2.500000\t-0.333333\t0.000000\t-0.333333\n2\t3.535534\t0.333333\t0.000000\t0.333333\nObjective_function= {}\n",
        objective
    )
}

/// A one-site cubic cell with Au and Cu sharing the site equally.
pub(crate) fn disordered_cell() -> Structure {
    let lattice = Lattice::from_parameters([3.6, 3.6, 3.6], [90.0, 90.0, 90.0]);
    Structure::new(
        lattice,
        vec![Site::new(
            vec![Species::new("Au", 0.5), Species::new("Cu", 0.5)],
            Point3::origin(),
        )],
    )
}

pub(crate) fn ordered_cell() -> Structure {
    let lattice = Lattice::from_parameters([3.6, 3.6, 3.6], [90.0, 90.0, 90.0]);
    Structure::new(lattice, vec![Site::ordered("Au", Point3::origin())])
}
