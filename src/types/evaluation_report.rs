use std::fmt;
use std::time::Duration;

use super::verdict::Verdict;

/// Detailed evaluation report returned by
/// [`RuleSet::evaluate_detailed()`](super::ruleset::RuleSet::evaluate_detailed).
///
/// Contains the verdict, the rules checked before the scan stopped, and the
/// wall-clock duration of the evaluation.
#[derive(Debug, Clone)]
#[must_use]
pub struct EvaluationReport {
    verdict: Option<Verdict>,
    considered: Vec<String>,
    duration: Duration,
}

impl EvaluationReport {
    pub(crate) fn new(verdict: Option<Verdict>, considered: Vec<String>, duration: Duration) -> Self {
        Self {
            verdict,
            considered,
            duration,
        }
    }

    /// The evaluation verdict, same as [`RuleSet::evaluate()`](super::ruleset::RuleSet::evaluate).
    #[must_use]
    pub fn verdict(&self) -> Option<&Verdict> {
        self.verdict.as_ref()
    }

    /// Names of the rules checked, in scan order. The last one is the match,
    /// if there was one.
    #[must_use]
    pub fn considered(&self) -> &[String] {
        &self.considered
    }

    /// Wall-clock duration of the evaluation.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.verdict {
            Some(v) => write!(f, "verdict: {v}")?,
            None => write!(f, "verdict: none")?,
        }
        write!(f, ", considered: [{}]", self.considered.join(", "))?;
        write!(f, ", duration: {:?}", self.duration)?;
        Ok(())
    }
}
