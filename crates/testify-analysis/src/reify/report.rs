//! ReificationReport: one outcome per reified test field.

use serde::{Deserialize, Serialize};

use crate::analysis::markers::Role;

/// What reification did with one test field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldAction {
    /// A fresh fake was written to both sides.
    #[serde(rename = "fake")]
    Faked,
    /// A fresh virtual was written to both sides.
    #[serde(rename = "virtual")]
    Virtualized,
    /// The SUT already held a mock; it was mirrored into the test field.
    Reused,
    /// The author's value was copied into the SUT field.
    Propagated,
    /// Matched, but nothing was synthesized.
    Unchanged,
    /// No SUT counterpart, or nothing to delegate to.
    Unmatched,
}

impl FieldAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Faked => "fake",
            Self::Virtualized => "virtual",
            Self::Reused => "reused",
            Self::Propagated => "propagated",
            Self::Unchanged => "unchanged",
            Self::Unmatched => "unmatched",
        }
    }

    /// Whether a value was written into the SUT or test field.
    pub fn is_injection(self) -> bool {
        matches!(
            self,
            Self::Faked | Self::Virtualized | Self::Reused | Self::Propagated
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOutcome {
    pub field: String,
    pub role: Option<Role>,
    /// Raw name of the matched SUT field.
    pub sut_field: Option<String>,
    pub action: FieldAction,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReificationReport {
    pub test_class: String,
    pub outcomes: Vec<FieldOutcome>,
}

impl ReificationReport {
    pub fn new(test_class: impl Into<String>) -> Self {
        Self {
            test_class: test_class.into(),
            outcomes: Vec::new(),
        }
    }

    pub fn outcome(&self, field: &str) -> Option<&FieldOutcome> {
        self.outcomes.iter().find(|o| o.field == field)
    }

    pub fn injected(&self) -> usize {
        self.outcomes.iter().filter(|o| o.action.is_injection()).count()
    }

    pub fn unchanged(&self) -> usize {
        self.count(FieldAction::Unchanged)
    }

    pub fn unmatched(&self) -> usize {
        self.count(FieldAction::Unmatched)
    }

    fn count(&self, action: FieldAction) -> usize {
        self.outcomes.iter().filter(|o| o.action == action).count()
    }
}
