use crate::{
    attributes::{Attribute, Attributes, CodeAttribute},
    flags::{ClassFileAccessFlags, MethodAccessFlags},
    pool::ConstantPool,
};
use anyhow::Result;
use std::fmt;

/// The parts of a parsed class file the runtime builds a class from.
#[derive(Debug, Clone)]
pub struct ClassFile {
    pub constant_pool: ConstantPool,
    pub access_flags: ClassFileAccessFlags,
    pub this_class: String,
    pub super_class: Option<String>,
    pub methods: Vec<MethodInfo>,
}

impl ClassFile {
    pub fn new(access_flags: ClassFileAccessFlags, this_class: impl Into<String>) -> Self {
        Self {
            constant_pool: ConstantPool::new(),
            access_flags,
            this_class: this_class.into(),
            super_class: None,
            methods: vec![],
        }
    }

    pub fn with_super_class(mut self, super_class: impl Into<String>) -> Self {
        self.super_class = Some(super_class.into());
        self
    }

    pub fn with_method(mut self, method: MethodInfo) -> Self {
        self.methods.push(method);
        self
    }

    pub fn locate(&self, name: &str, descriptor: &str) -> Option<&MethodInfo> {
        self.methods
            .iter()
            .find(|method| method.name == name && method.descriptor == descriptor)
    }
}

/// A `method_info` structure with its name and descriptor already pulled out of
/// the constant pool.
#[derive(Debug, Clone)]
pub struct MethodInfo {
    pub flags: MethodAccessFlags,
    pub name: String,
    pub descriptor: String,
    pub attributes: Attributes,
}

impl MethodInfo {
    pub fn new(
        flags: MethodAccessFlags,
        name: impl Into<String>,
        descriptor: impl Into<String>,
    ) -> Self {
        Self {
            flags,
            name: name.into(),
            descriptor: descriptor.into(),
            attributes: Attributes::default(),
        }
    }

    /// Attach a `Code` attribute, interning its name in `constant_pool`.
    pub fn with_code(mut self, code: &CodeAttribute, constant_pool: &mut ConstantPool) -> Self {
        let name = constant_pool.utf8_index("Code");
        self.attributes.values.push(Attribute {
            name,
            data: code.encode(),
        });
        self
    }

    /// The method body, absent for abstract and native methods.
    pub fn code_attribute(&self, constant_pool: &ConstantPool) -> Result<Option<CodeAttribute>> {
        self.attributes.find_known_attribute(constant_pool)
    }
}

impl fmt::Display for MethodInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {}{}", self.flags.flags, self.name, self.descriptor)
    }
}
