use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The text `mcsqs` writes instead of a number when every correlation matches.
pub const PERFECT_MATCH: &str = "Perfect_match";

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ObjectiveParseError {
    #[error("report is empty")]
    EmptyReport,
    #[error("'{0}' is neither a number nor {PERFECT_MATCH}")]
    InvalidValue(String),
}

/// The objective function value of an SQS candidate. Lower is better.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ObjectiveValue {
    Numeric(f64),
    PerfectMatch,
}

impl ObjectiveValue {
    /// Extracts the objective value from the contents of a `bestcorr.out` file.
    ///
    /// The value is the text after the last `=` on the last non-empty line,
    /// e.g. `Objective_function= -0.8125` or `Objective_function= Perfect_match`.
    pub fn from_report(contents: &str) -> Result<Self, ObjectiveParseError> {
        let last_line = contents
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .ok_or(ObjectiveParseError::EmptyReport)?;
        let value = last_line.rsplit('=').next().unwrap_or(last_line);
        value.parse()
    }

    /// Replaces a perfect-match sentinel reported by a single instance with the
    /// objective value of the run-level best.
    ///
    /// The run-level best is never worse than any instance, so the substitution
    /// keeps the relative ranking of instances intact. Numeric values are
    /// returned unchanged.
    pub fn reconcile(self, best: ObjectiveValue) -> ObjectiveValue {
        match self {
            ObjectiveValue::PerfectMatch => best,
            numeric => numeric,
        }
    }

    pub fn is_perfect_match(&self) -> bool {
        matches!(self, ObjectiveValue::PerfectMatch)
    }

    /// Total order with the better value first: a perfect match ranks ahead of
    /// every number, numbers ascend.
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (ObjectiveValue::PerfectMatch, ObjectiveValue::PerfectMatch) => Ordering::Equal,
            (ObjectiveValue::PerfectMatch, _) => Ordering::Less,
            (_, ObjectiveValue::PerfectMatch) => Ordering::Greater,
            (ObjectiveValue::Numeric(a), ObjectiveValue::Numeric(b)) => a.total_cmp(b),
        }
    }
}

impl FromStr for ObjectiveValue {
    type Err = ObjectiveParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == PERFECT_MATCH {
            return Ok(ObjectiveValue::PerfectMatch);
        }
        s.parse::<f64>()
            .map(ObjectiveValue::Numeric)
            .map_err(|_| ObjectiveParseError::InvalidValue(s.to_string()))
    }
}

impl fmt::Display for ObjectiveValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectiveValue::Numeric(value) => write!(f, "{}", value),
            ObjectiveValue::PerfectMatch => f.write_str(PERFECT_MATCH),
        }
    }
}
