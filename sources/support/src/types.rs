use std::fmt;

use crate::descriptor::{DescriptorError, MethodType};

pub type MethodName = String;

/// A method name paired with its parsed descriptor, the key methods are looked up
/// and natives are registered by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodDescriptor(MethodName, MethodType);

impl MethodDescriptor {
    pub fn new(name: MethodName, ty: MethodType) -> Self {
        Self(name, ty)
    }

    pub fn name(&self) -> &MethodName {
        &self.0
    }

    pub fn descriptor(&self) -> &MethodType {
        &self.1
    }
}

impl<T, U> TryFrom<(T, U)> for MethodDescriptor
where
    T: Into<String>,
    U: AsRef<str>,
{
    type Error = DescriptorError;

    fn try_from(value: (T, U)) -> Result<Self, Self::Error> {
        Ok(Self(value.0.into(), MethodType::parse(value.1.as_ref())?))
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.0, self.1)
    }
}
