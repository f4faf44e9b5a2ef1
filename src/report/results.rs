//! Outcome map owned by the runner

use indexmap::IndexMap;
use serde::Serialize;

use crate::checks::CheckOutcome;

/// Check outcomes keyed by check id, in the order they were first recorded
///
/// Recording an id twice keeps its original position and replaces the
/// outcome (last write wins).
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ResultSet {
    outcomes: IndexMap<String, CheckOutcome>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an outcome, returning the one it replaced
    pub fn record(
        &mut self,
        check: impl Into<String>,
        outcome: CheckOutcome,
    ) -> Option<CheckOutcome> {
        let check = check.into();
        let previous = self.outcomes.insert(check.clone(), outcome);
        if previous.is_some() {
            tracing::debug!(check = %check, "Outcome overwritten");
        }
        previous
    }

    pub fn get(&self, check: &str) -> Option<&CheckOutcome> {
        self.outcomes.get(check)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CheckOutcome)> {
        self.outcomes.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, CheckOutcome)> for ResultSet {
    fn from_iter<I: IntoIterator<Item = (S, CheckOutcome)>>(iter: I) -> Self {
        let mut set = ResultSet::new();
        for (check, outcome) in iter {
            set.record(check, outcome);
        }
        set
    }
}
