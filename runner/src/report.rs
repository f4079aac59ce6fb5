//! Results of running a provisioning script.
use rtt_shell::{Exchange, Verdict};
use std::path::{Path, PathBuf};

/// Outcome of one checked step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Command or check which was run.
    pub step: String,
    /// Verdict for the step.
    pub verdict: Verdict,
    /// Response line of the exchange, absent on timeout.
    pub response: Option<String>,
}

impl Outcome {
    /// Outcome of a shell exchange.
    pub fn exchange(command: &str, exchange: Option<&Exchange>) -> Self {
        Self {
            step: command.to_owned(),
            verdict: Verdict::of(exchange),
            response: exchange.map(|e| e.response.clone()),
        }
    }
}

/// Outcomes of every checked step in a script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    path: PathBuf,
    outcomes: Vec<Outcome>,
}

impl Report {
    /// Create an empty report for a script.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            outcomes: Vec::new(),
        }
    }

    /// Script the report belongs to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record an outcome.
    pub fn push(&mut self, outcome: Outcome) {
        self.outcomes.push(outcome);
    }

    /// Recorded outcomes in execution order.
    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    /// Number of outcomes with the verdict.
    pub fn count(&self, verdict: Verdict) -> usize {
        self.outcomes.iter().filter(|o| o.verdict == verdict).count()
    }

    /// Whether every step passed.
    pub fn passed(&self) -> bool {
        self.outcomes.iter().all(|o| o.verdict == Verdict::Pass)
    }
}
