//! Mock provider seam: how fakes and virtuals are created and recognised.

use testify_core::errors::MockError;

use crate::classfile::types::TypeRef;
use crate::runtime::{ObjectOrigin, Runtime, Value};

/// Creates and recognises mock collaborators.
///
/// The reification engine only talks to this trait, so a different mocking
/// strategy can be swapped in without touching analysis.
pub trait MockProvider: Send + Sync {
    /// Whether `value` is a mock this provider (or another) created.
    fn is_mock(&self, runtime: &Runtime, value: &Value) -> bool;

    /// A fresh fake of `ty` with no behaviour beyond stubs.
    fn create_fake(&self, runtime: &mut Runtime, ty: &TypeRef) -> Result<Value, MockError>;

    /// A fresh virtual of `ty` forwarding unstubbed calls to `delegate`.
    fn create_virtual(
        &self,
        runtime: &mut Runtime,
        ty: &TypeRef,
        delegate: &Value,
    ) -> Result<Value, MockError>;
}

/// Mocks as tagged heap objects.
///
/// A virtual starts with a copy of its delegate's field slots. Field
/// descriptors read a virtual's fields from the delegate and write through
/// to it, so calls forwarded to the delegate see injected collaborators.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArenaMockProvider;

impl ArenaMockProvider {
    pub fn new() -> Self {
        Self
    }

    fn mockable_class<'a>(&self, ty: &'a TypeRef) -> Result<&'a str, MockError> {
        match ty {
            TypeRef::Class(name) => Ok(name),
            TypeRef::Primitive(_) => Err(MockError::Unmockable {
                type_name: ty.to_string(),
                reason: "primitive types cannot be mocked".to_string(),
            }),
            TypeRef::Array(_) => Err(MockError::Unmockable {
                type_name: ty.to_string(),
                reason: "array types cannot be mocked".to_string(),
            }),
        }
    }
}

impl MockProvider for ArenaMockProvider {
    fn is_mock(&self, runtime: &Runtime, value: &Value) -> bool {
        match value {
            Value::Ref(id) => runtime
                .heap()
                .try_object(*id)
                .is_some_and(|obj| obj.is_mock()),
            _ => false,
        }
    }

    fn create_fake(&self, runtime: &mut Runtime, ty: &TypeRef) -> Result<Value, MockError> {
        let class = self.mockable_class(ty)?;
        let id = runtime.heap_mut().allocate(class, ObjectOrigin::Fake);
        tracing::trace!(class, object = %id, "created fake");
        Ok(Value::Ref(id))
    }

    fn create_virtual(
        &self,
        runtime: &mut Runtime,
        ty: &TypeRef,
        delegate: &Value,
    ) -> Result<Value, MockError> {
        let class = self.mockable_class(ty)?;
        let delegate = match delegate {
            Value::Ref(id) if runtime.heap().try_object(*id).is_some() => *id,
            Value::Ref(id) => {
                return Err(MockError::InvalidDelegate {
                    type_name: class.to_string(),
                    message: format!("delegate {id} does not belong to this heap"),
                })
            }
            other => {
                return Err(MockError::InvalidDelegate {
                    type_name: class.to_string(),
                    message: format!("delegate must be an object, got {}", other.type_label(runtime.heap())),
                })
            }
        };
        let id = runtime
            .heap_mut()
            .allocate(class, ObjectOrigin::Virtual { delegate });
        runtime.heap_mut().copy_slots(delegate, id);
        tracing::trace!(class, object = %id, delegate = %delegate, "created virtual");
        Ok(Value::Ref(id))
    }
}
