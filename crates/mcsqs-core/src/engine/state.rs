use super::objective::ObjectiveValue;
use crate::core::models::structure::Structure;
use std::path::PathBuf;

/// How the search phase of a successful run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every instance finished within the time budget.
    Completed,
    /// The budget ran out and the instances were killed, but enough output
    /// was written before the deadline to select a best structure.
    TimedOutRecovered,
}

/// The structure found by one search instance.
#[derive(Debug, Clone, PartialEq)]
pub struct SqsCandidate {
    /// 1-based instance index, matching the `bestsqs<i>.out` file it was read from.
    pub instance: usize,
    pub structure: Structure,
    /// The instance's objective value, with a perfect-match sentinel replaced
    /// by the objective of the run-level best.
    pub objective: ObjectiveValue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqsResult {
    pub best_structure: Structure,
    /// Objective of the run-level best, exactly as reported.
    pub objective: ObjectiveValue,
    /// One entry per indexed instance output, in instance order. Empty for
    /// single-instance runs.
    pub candidates: Vec<SqsCandidate>,
    /// Absolute path of the run directory.
    pub directory: PathBuf,
    pub outcome: RunOutcome,
}

impl SqsResult {
    /// Returns the candidates ordered best first. Ties keep instance order.
    pub fn ranked(&self) -> Vec<&SqsCandidate> {
        let mut ranked: Vec<&SqsCandidate> = self.candidates.iter().collect();
        ranked.sort_by(|a, b| a.objective.total_cmp(&b.objective));
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::lattice::Lattice;
    use crate::core::models::site::Site;
    use nalgebra::Point3;

    fn candidate(instance: usize, objective: ObjectiveValue) -> SqsCandidate {
        let lattice = Lattice::from_parameters([3.0, 3.0, 3.0], [90.0, 90.0, 90.0]);
        SqsCandidate {
            instance,
            structure: Structure::new(lattice, vec![Site::ordered("Cu", Point3::origin())]),
            objective,
        }
    }

    #[test]
    fn ranked_orders_candidates_best_first() {
        let candidates = vec![
            candidate(1, ObjectiveValue::Numeric(0.5)),
            candidate(2, ObjectiveValue::Numeric(-0.5)),
            candidate(3, ObjectiveValue::PerfectMatch),
            candidate(4, ObjectiveValue::Numeric(-0.5)),
        ];
        let result = SqsResult {
            best_structure: candidates[2].structure.clone(),
            objective: ObjectiveValue::PerfectMatch,
            candidates,
            directory: PathBuf::from("/tmp/run"),
            outcome: RunOutcome::Completed,
        };
        let order: Vec<usize> = result.ranked().iter().map(|c| c.instance).collect();
        assert_eq!(order, vec![3, 2, 4, 1]);
    }
}
