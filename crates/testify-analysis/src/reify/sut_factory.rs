//! SutFactory: builds the SUT through its canonical constructor.

use std::sync::Arc;

use testify_core::errors::{AnalysisError, ReificationError};

use crate::analysis::markers::Markers;
use crate::classfile::annotation;
use crate::descriptor::{ParameterDescriptor, SutDescriptor, TestDescriptor};
use crate::mock::MockProvider;
use crate::runtime::{ObjectId, Runtime, Value};

pub struct SutFactory {
    mocks: Arc<dyn MockProvider>,
    markers: Arc<Markers>,
}

impl SutFactory {
    pub fn new(mocks: Arc<dyn MockProvider>, markers: Arc<Markers>) -> Self {
        Self { mocks, markers }
    }

    /// Construct the SUT and store it in the test's SUT field.
    ///
    /// An already-populated SUT field is returned as is. Each constructor
    /// argument comes from the test field matching (type, name), then type,
    /// then a collaborator provider, and finally the type default. When the
    /// SUT marker sets `value = true` the SUT is wrapped in a virtual.
    pub fn construct(
        &self,
        runtime: &mut Runtime,
        test: &TestDescriptor,
        sut: &SutDescriptor,
        test_instance: ObjectId,
    ) -> Result<ObjectId, ReificationError> {
        let sut_field = test.sut_field().ok_or_else(|| AnalysisError::MissingSutField {
            test_class: test.test_class().to_string(),
        })?;
        if let Some(existing) = sut_field.get_value(runtime, test_instance)?.as_object() {
            tracing::debug!(sut_class = %sut.sut_class(), object = %existing, "SUT already assigned");
            return Ok(existing);
        }

        let constructor = sut.constructor().ok_or_else(|| AnalysisError::ConstructorNotFound {
            class: sut.sut_class().to_string(),
            descriptor: "<canonical>".to_string(),
        })?;

        let mut args = Vec::with_capacity(constructor.parameter_count());
        for param in sut.parameter_descriptors() {
            args.push(self.argument_for(runtime, test, param, test_instance)?);
        }

        let id = constructor.new_instance(runtime, &args)?;
        if !constructor.has_body(runtime) {
            assign_parameters(runtime, sut, id, &args)?;
        }

        let wants_virtual = annotation::find(sut_field.annotations(), &self.markers.sut)
            .and_then(|a| a.boolean("value"))
            .unwrap_or(false);
        let value = if wants_virtual {
            self.mocks.create_virtual(runtime, sut_field.ty(), &Value::Ref(id))?
        } else {
            Value::Ref(id)
        };
        sut_field.set_value(runtime, test_instance, value.clone())?;

        tracing::debug!(
            sut_class = %sut.sut_class(),
            arguments = args.len(),
            virtual_sut = wants_virtual,
            "constructed SUT"
        );
        Ok(value.as_object().unwrap_or(id))
    }

    fn argument_for(
        &self,
        runtime: &mut Runtime,
        test: &TestDescriptor,
        param: &ParameterDescriptor,
        test_instance: ObjectId,
    ) -> Result<Value, AnalysisError> {
        let ty = param.generic_type();
        let field = test
            .find_field_descriptor_named(ty, param.declared_name())
            .or_else(|| test.find_field_descriptor(ty));
        if let Some(field) = field {
            let value = field.get_value(runtime, test_instance)?;
            if !value.is_null() {
                return Ok(value);
            }
        }
        let provider = test
            .find_collaborator_provider(ty, Some(param.declared_name()))
            .or_else(|| test.find_collaborator_provider(ty, None));
        if let Some(provider) = provider {
            if let Some(value) = provider.invoke(runtime, Some(test_instance), &[])? {
                return Ok(value);
            }
        }
        Ok(Value::default_for(param.ty()))
    }
}

/// Default constructor body: each argument goes to the SUT field matching
/// (type, name), else the single field matching the type.
fn assign_parameters(
    runtime: &mut Runtime,
    sut: &SutDescriptor,
    instance: ObjectId,
    args: &[Value],
) -> Result<(), AnalysisError> {
    for (param, value) in sut.parameter_descriptors().iter().zip(args) {
        let ty = param.generic_type();
        let target = sut
            .find_field_descriptor_named(ty, param.declared_name())
            .or_else(|| sut.find_field_descriptor(ty));
        match target {
            Some(field) => field.set_value(runtime, instance, value.clone())?,
            None => tracing::debug!(
                parameter = %param.declared_name(),
                sut_class = %sut.sut_class(),
                "no field for constructor parameter"
            ),
        }
    }
    Ok(())
}

impl std::fmt::Debug for SutFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SutFactory").field("sut_marker", &self.markers.sut).finish()
    }
}
