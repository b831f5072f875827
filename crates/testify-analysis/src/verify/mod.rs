//! Read-only checks over analyzed descriptors.
//!
//! `verify` never touches instances; it reports wiring problems that would
//! otherwise surface as silent no-ops during reification.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::analysis::markers::{Markers, Role};
use crate::classfile::annotation;
use crate::descriptor::{SutDescriptor, TestDescriptor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FindingKind {
    /// More than one of fake/virtual/real on one field.
    ConflictingRoles,
    /// A fake or virtual field with no SUT field to wire into.
    UnmatchedCollaborator,
    /// A virtual SUT was requested but the SUT class is final.
    FinalSut,
    /// A concrete SUT without a usable constructor.
    MissingConstructor,
}

impl FindingKind {
    pub fn rule_id(self) -> &'static str {
        match self {
            Self::ConflictingRoles => "conflicting-roles",
            Self::UnmatchedCollaborator => "unmatched-collaborator",
            Self::FinalSut => "final-sut",
            Self::MissingConstructor => "missing-constructor",
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            Self::ConflictingRoles | Self::FinalSut | Self::MissingConstructor => Severity::Error,
            Self::UnmatchedCollaborator => Severity::Warning,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub kind: FindingKind,
    pub severity: Severity,
    pub test_class: String,
    /// Offending member, when the finding is about one.
    pub member: Option<String>,
    pub message: String,
}

impl Finding {
    fn new(kind: FindingKind, test_class: &str, member: Option<&str>, message: String) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            test_class: test_class.to_string(),
            member: member.map(str::to_string),
            message,
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.kind.rule_id(), self.message)
    }
}

/// Check `test` (and its SUT, when analyzed) for wiring problems.
pub fn verify(
    test: &TestDescriptor,
    sut: Option<&SutDescriptor>,
    markers: &Markers,
    loose_matching: bool,
) -> Vec<Finding> {
    let mut findings = Vec::new();
    let test_class = test.test_class();

    for field in test.field_descriptors() {
        let roles = markers.roles(field.annotations());
        if roles.len() > 1 {
            let names: Vec<&str> = roles.iter().map(|r| r.as_str()).collect();
            findings.push(Finding::new(
                FindingKind::ConflictingRoles,
                test_class,
                Some(field.name()),
                format!("field {} is marked {}", field.name(), names.join(" and ")),
            ));
        }

        let Some(sut) = sut else { continue };
        let wants_mock = roles.iter().any(|r| matches!(r, Role::Fake | Role::Virtual));
        if !wants_mock {
            continue;
        }
        let ty = field.generic_type();
        let matched = sut.find_field_descriptor_named(ty, field.declared_name()).is_some()
            || (loose_matching && sut.find_field_descriptor(ty).is_some());
        if !matched {
            findings.push(Finding::new(
                FindingKind::UnmatchedCollaborator,
                test_class,
                Some(field.name()),
                format!(
                    "no field of {} in {} receives collaborator {}",
                    ty,
                    sut.sut_class(),
                    field.declared_name()
                ),
            ));
        }
    }

    if let (Some(sut), Some(sut_field)) = (sut, test.sut_field()) {
        let wants_virtual = annotation::find(sut_field.annotations(), &markers.sut)
            .and_then(|a| a.boolean("value"))
            .unwrap_or(false);
        if wants_virtual && sut.is_final() {
            findings.push(Finding::new(
                FindingKind::FinalSut,
                test_class,
                Some(sut_field.name()),
                format!("{} is final and cannot be virtualized", sut.sut_class()),
            ));
        }
        if !sut.is_abstract() && sut.constructor().is_none() {
            findings.push(Finding::new(
                FindingKind::MissingConstructor,
                test_class,
                Some(sut_field.name()),
                format!("{} declares no usable constructor", sut.sut_class()),
            ));
        }
    }

    findings
}
