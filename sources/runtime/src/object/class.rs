use std::{
    fmt,
    sync::{Arc, OnceLock, Weak},
};

use parse::{
    classfile::ClassFile,
    flags::{ClassFileAccessFlag, ClassFileAccessFlags},
    pool::ConstantPool,
};
use support::descriptor::BaseType;

use crate::error::{LinkageError, Throwable};

use super::{loader::ClassLoader, method::Method};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassType {
    Class,
    Interface,
    Array,
    Primitive,
}

/// A loaded class. Owns its methods, which point back at it weakly.
pub struct Class {
    name: String,
    ty: ClassType,
    access_flags: ClassFileAccessFlags,
    super_class: Option<Arc<Class>>,
    component_type: Option<Arc<Class>>,
    loader: Weak<dyn ClassLoader>,
    constant_pool: ConstantPool,
    methods: OnceLock<Box<[Arc<Method>]>>,
}

impl Class {
    /// Define a class from its class file and link its methods.
    pub fn define(
        class_file: ClassFile,
        super_class: Option<Arc<Class>>,
        loader: Weak<dyn ClassLoader>,
    ) -> Result<Arc<Self>, Throwable> {
        let ty = if class_file.access_flags.has(ClassFileAccessFlag::INTERFACE) {
            ClassType::Interface
        } else {
            ClassType::Class
        };

        let class = Arc::new(Self {
            name: class_file.this_class,
            ty,
            access_flags: class_file.access_flags,
            super_class,
            component_type: None,
            loader,
            constant_pool: class_file.constant_pool,
            methods: OnceLock::new(),
        });

        let methods = class_file
            .methods
            .iter()
            .map(|info| Method::new(Arc::downgrade(&class), info, &class.constant_pool).map(Arc::new))
            .collect::<Result<Box<[_]>, _>>()?;

        // Nothing else can see the class yet, so this is the only assignment.
        let _ = class.methods.set(methods);

        Ok(class)
    }

    pub fn new_primitive(base: BaseType, loader: Weak<dyn ClassLoader>) -> Self {
        Self {
            name: base.keyword().to_string(),
            ty: ClassType::Primitive,
            access_flags: (ClassFileAccessFlag::PUBLIC
                | ClassFileAccessFlag::FINAL
                | ClassFileAccessFlag::ABSTRACT)
                .into(),
            super_class: None,
            component_type: None,
            loader,
            constant_pool: ConstantPool::new(),
            methods: OnceLock::new(),
        }
    }

    pub fn new_array(
        name: String,
        component_type: Arc<Class>,
        super_class: Option<Arc<Class>>,
        loader: Weak<dyn ClassLoader>,
    ) -> Self {
        Self {
            name,
            ty: ClassType::Array,
            access_flags: (ClassFileAccessFlag::PUBLIC
                | ClassFileAccessFlag::FINAL
                | ClassFileAccessFlag::ABSTRACT)
                .into(),
            super_class,
            component_type: Some(component_type),
            loader,
            constant_pool: ConstantPool::new(),
            methods: OnceLock::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> ClassType {
        self.ty
    }

    pub fn access_flags(&self) -> ClassFileAccessFlags {
        self.access_flags
    }

    pub fn is_interface(&self) -> bool {
        self.ty == ClassType::Interface
    }

    pub fn is_array(&self) -> bool {
        self.ty == ClassType::Array
    }

    pub fn is_primitive(&self) -> bool {
        self.ty == ClassType::Primitive
    }

    pub fn super_class(&self) -> Option<&Arc<Class>> {
        self.super_class.as_ref()
    }

    pub fn component_type(&self) -> Option<&Arc<Class>> {
        self.component_type.as_ref()
    }

    /// The defining loader, which must still be alive.
    pub fn loader(&self) -> Result<Arc<dyn ClassLoader>, LinkageError> {
        self.loader
            .upgrade()
            .ok_or_else(|| LinkageError::LoaderUnavailable(self.name.clone()))
    }

    pub fn constant_pool(&self) -> &ConstantPool {
        &self.constant_pool
    }

    pub fn methods(&self) -> &[Arc<Method>] {
        self.methods.get().map(|methods| &methods[..]).unwrap_or(&[])
    }

    pub fn get_method(&self, name: &str, descriptor: &str) -> Option<Arc<Method>> {
        self.methods()
            .iter()
            .find(|method| method.name() == name && method.descriptor() == descriptor)
            .cloned()
    }

    pub fn clinit(&self) -> Option<Arc<Method>> {
        self.methods().iter().find(|method| method.is_clinit()).cloned()
    }

    pub fn main_method(&self) -> Option<Arc<Method>> {
        self.methods().iter().find(|method| method.is_main()).cloned()
    }

    /// Whether `other` is this class or one of its superclasses.
    pub fn is_subclass_of(&self, other: &Class) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }

        let mut current = self.super_class.as_deref();
        while let Some(class) = current {
            if std::ptr::eq(class, other) {
                return true;
            }
            current = class.super_class.as_deref();
        }

        false
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field(
                "super_class",
                &self.super_class.as_ref().map(|class| class.name()),
            )
            .field("methods", &self.methods().len())
            .finish()
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
