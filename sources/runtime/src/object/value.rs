use enum_as_inner::EnumAsInner;
use support::descriptor::{BaseType, FieldType};

/// Address of a heap object. The heap itself belongs to the interpreter.
pub type JvmPointer = usize;

#[derive(Debug, Clone, Copy, PartialEq, EnumAsInner)]
pub enum RuntimeValue {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Reference(Option<JvmPointer>),
}

impl RuntimeValue {
    pub fn null_ref() -> Self {
        RuntimeValue::Reference(None)
    }

    /// Category 2 values take two local variable slots.
    pub fn is_wide(&self) -> bool {
        matches!(self, RuntimeValue::Long(_) | RuntimeValue::Double(_))
    }

    pub fn default_for_field(field: &FieldType) -> RuntimeValue {
        match field {
            FieldType::Base(ty) => match ty {
                BaseType::Float => RuntimeValue::Float(0.0),
                BaseType::Double => RuntimeValue::Double(0.0),
                BaseType::Long => RuntimeValue::Long(0),
                _ => RuntimeValue::Int(0),
            },
            FieldType::Object(_) | FieldType::Array(_) => RuntimeValue::null_ref(),
        }
    }
}
