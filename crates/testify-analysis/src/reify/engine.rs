//! ReificationEngine: wires collaborators into a test/SUT instance pair.

use std::sync::Arc;

use testify_core::errors::ReificationError;
use testify_core::events::types::{FieldReifiedEvent, ReificationCompletedEvent};
use testify_core::events::EventDispatcher;

use super::report::{FieldAction, FieldOutcome, ReificationReport};
use crate::analysis::markers::{Markers, Role};
use crate::descriptor::{FieldDescriptor, SutDescriptor, TestDescriptor};
use crate::mock::MockProvider;
use crate::runtime::{ObjectId, Runtime, Value};

/// Runs the per-field reification decision for one test instance.
pub struct ReificationEngine {
    mocks: Arc<dyn MockProvider>,
    markers: Arc<Markers>,
    loose_matching: bool,
    events: EventDispatcher,
}

impl ReificationEngine {
    pub fn new(mocks: Arc<dyn MockProvider>, markers: Arc<Markers>) -> Self {
        Self {
            mocks,
            markers,
            loose_matching: true,
            events: EventDispatcher::new(),
        }
    }

    /// Disable the type-only retry for role-marked fields.
    pub fn loose_matching(mut self, enabled: bool) -> Self {
        self.loose_matching = enabled;
        self
    }

    pub fn with_events(mut self, events: EventDispatcher) -> Self {
        self.events = events;
        self
    }

    pub fn mocks(&self) -> &Arc<dyn MockProvider> {
        &self.mocks
    }

    /// Reify every non-SUT field of `test` in declaration order.
    ///
    /// Mock provider failures propagate; a field without a SUT counterpart
    /// is reported as unmatched and left alone.
    pub fn reify(
        &self,
        runtime: &mut Runtime,
        test: &TestDescriptor,
        sut: &SutDescriptor,
        test_instance: ObjectId,
        sut_instance: ObjectId,
    ) -> Result<ReificationReport, ReificationError> {
        let _span = tracing::debug_span!("testify.reify", test_class = %test.test_class()).entered();
        let mut report = ReificationReport::new(test.test_class());

        for field in test.field_descriptors() {
            let role = self.markers.role(field.annotations());
            let outcome = match self.match_sut_field(field, role, sut) {
                Some(sut_field) => {
                    let action =
                        self.reify_field(runtime, field, role, sut_field, test_instance, sut_instance)?;
                    FieldOutcome {
                        field: field.name().to_string(),
                        role,
                        sut_field: Some(sut_field.name().to_string()),
                        action,
                    }
                }
                None => FieldOutcome {
                    field: field.name().to_string(),
                    role,
                    sut_field: None,
                    action: FieldAction::Unmatched,
                },
            };

            tracing::debug!(
                field = %outcome.field,
                role = outcome.role.map(Role::as_str),
                sut_field = outcome.sut_field.as_deref(),
                action = outcome.action.as_str(),
                "field reified"
            );
            self.events.emit_field_reified(&FieldReifiedEvent {
                test_class: test.test_class().to_string(),
                field: outcome.field.clone(),
                action: outcome.action.as_str(),
            });
            report.outcomes.push(outcome);
        }

        self.events.emit_reification_completed(&ReificationCompletedEvent {
            test_class: test.test_class().to_string(),
            injected: report.injected(),
            unchanged: report.unchanged(),
            unmatched: report.unmatched(),
        });
        Ok(report)
    }

    /// Exact (type, name) match, then type-only for role-marked fields.
    fn match_sut_field<'s>(
        &self,
        field: &FieldDescriptor,
        role: Option<Role>,
        sut: &'s SutDescriptor,
    ) -> Option<&'s FieldDescriptor> {
        sut.find_field_descriptor_named(field.generic_type(), field.declared_name())
            .or_else(|| {
                if role.is_some() && self.loose_matching {
                    sut.find_field_descriptor(field.generic_type())
                } else {
                    None
                }
            })
    }

    fn reify_field(
        &self,
        runtime: &mut Runtime,
        field: &FieldDescriptor,
        role: Option<Role>,
        sut_field: &FieldDescriptor,
        test_instance: ObjectId,
        sut_instance: ObjectId,
    ) -> Result<FieldAction, ReificationError> {
        let test_value = field.get_value(runtime, test_instance)?;
        let sut_value = sut_field.get_value(runtime, sut_instance)?;

        if !test_value.is_null() {
            return self.propagate_author_value(
                runtime,
                field,
                role,
                sut_field,
                test_value,
                sut_value,
                (test_instance, sut_instance),
            );
        }

        let ty = sut_field.ty();
        let (value, action) = match (role, sut_value.is_null()) {
            (Some(Role::Fake | Role::Virtual), false) if self.mocks.is_mock(runtime, &sut_value) => {
                (sut_value, FieldAction::Reused)
            }
            (Some(Role::Fake), _) => (self.mocks.create_fake(runtime, ty)?, FieldAction::Faked),
            (Some(Role::Virtual), false) => (
                self.mocks.create_virtual(runtime, ty, &sut_value)?,
                FieldAction::Virtualized,
            ),
            (Some(Role::Virtual), true) => return Ok(FieldAction::Unmatched),
            (Some(Role::Real) | None, _) => return Ok(FieldAction::Unchanged),
        };

        sut_field.set_value(runtime, sut_instance, value.clone())?;
        field.set_value(runtime, test_instance, value)?;
        Ok(action)
    }

    /// The author already assigned the test field. A virtual-marked plain
    /// value is wrapped first; the result is mirrored into the SUT.
    #[allow(clippy::too_many_arguments)]
    fn propagate_author_value(
        &self,
        runtime: &mut Runtime,
        field: &FieldDescriptor,
        role: Option<Role>,
        sut_field: &FieldDescriptor,
        test_value: Value,
        sut_value: Value,
        (test_instance, sut_instance): (ObjectId, ObjectId),
    ) -> Result<FieldAction, ReificationError> {
        if role == Some(Role::Virtual) && !self.mocks.is_mock(runtime, &test_value) {
            let wrapped = self.mocks.create_virtual(runtime, sut_field.ty(), &test_value)?;
            sut_field.set_value(runtime, sut_instance, wrapped.clone())?;
            field.set_value(runtime, test_instance, wrapped)?;
            return Ok(FieldAction::Virtualized);
        }
        if test_value == sut_value {
            return Ok(FieldAction::Unchanged);
        }
        sut_field.set_value(runtime, sut_instance, test_value)?;
        Ok(FieldAction::Propagated)
    }
}

impl std::fmt::Debug for ReificationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReificationEngine")
            .field("markers", &self.markers)
            .field("loose_matching", &self.loose_matching)
            .field("events", &self.events)
            .finish()
    }
}
