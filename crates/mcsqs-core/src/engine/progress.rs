pub const PHASE_PREPARE: &str = "Preparing Input";
pub const PHASE_CLUSTERS: &str = "Generating Clusters";
pub const PHASE_SEARCH: &str = "Searching";
pub const PHASE_SELECT_BEST: &str = "Selecting Best";
pub const PHASE_COLLECT: &str = "Collecting Results";

/// Events emitted while an SQS run advances.
///
/// During the search phase a task is started with one step per instance and
/// incremented as each instance reaches a terminal state, so a front-end can
/// display how many instances are still running.
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    PhaseStart { name: &'static str },
    PhaseFinish,

    TaskStart { total_steps: u64 },
    TaskIncrement,
    TaskFinish,

    /// A noteworthy condition the user should see, such as a timeout that
    /// still produced usable output.
    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }

    pub fn message(&self, text: impl Into<String>) {
        self.report(Progress::Message(text.into()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn reporter_without_callback_ignores_events() {
        let reporter = ProgressReporter::new();
        reporter.report(Progress::Message("nothing listens".to_string()));
    }

    #[test]
    fn reporter_forwards_events_to_callback_in_order() {
        let seen = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            seen.lock().unwrap().push(event);
        }));
        reporter.report(Progress::PhaseStart { name: PHASE_SEARCH });
        reporter.report(Progress::TaskIncrement);
        reporter.message("recovered");
        drop(reporter);
        let seen = seen.into_inner().unwrap();
        assert_eq!(
            seen,
            vec![
                Progress::PhaseStart { name: "Searching" },
                Progress::TaskIncrement,
                Progress::Message("recovered".to_string()),
            ]
        );
    }
}
