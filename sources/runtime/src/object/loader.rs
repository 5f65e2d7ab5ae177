use std::{
    collections::{hash_map::Entry, HashMap},
    sync::{Arc, Weak},
};

use parking_lot::RwLock;
use parse::classfile::ClassFile;
use support::descriptor::{ArrayType, BaseType, FieldType};
use tracing::debug;

use crate::{
    constants::JAVA_LANG_OBJECT,
    error::{ClassFormatError, LinkageError, Throwable},
};

use super::class::Class;

/// Turns a type descriptor into a loaded class.
pub trait ClassLoader: Send + Sync {
    fn load_class(&self, ty: &FieldType) -> Result<Arc<Class>, LinkageError>;
}

#[derive(Debug, Clone)]
pub struct BootOptions {
    /// Register the primitive classes and their one-dimensional arrays up front
    /// instead of on first request.
    pub preload_primitives: bool,
}

impl Default for BootOptions {
    fn default() -> Self {
        Self {
            preload_primitives: true,
        }
    }
}

const PRIMITIVES: [BaseType; 9] = [
    BaseType::Boolean,
    BaseType::Byte,
    BaseType::Short,
    BaseType::Char,
    BaseType::Int,
    BaseType::Long,
    BaseType::Float,
    BaseType::Double,
    BaseType::Void,
];

/// An in-memory loader. Classes are handed to it already parsed through
/// `define_class`, primitives and array classes it makes itself.
pub struct BootstrapClassLoader {
    this: Weak<BootstrapClassLoader>,
    classes: RwLock<HashMap<String, Arc<Class>>>,
}

impl BootstrapClassLoader {
    pub fn new(options: BootOptions) -> Arc<Self> {
        let loader = Arc::new_cyclic(|this| Self {
            this: this.clone(),
            classes: RwLock::new(HashMap::new()),
        });

        if options.preload_primitives {
            for base in PRIMITIVES {
                let primitive = loader.primitive_class(base);

                if base != BaseType::Void {
                    let array = ArrayType {
                        field_type: Box::new(FieldType::Base(base)),
                    };
                    loader.register_array(&array, primitive);
                }
            }
        }

        loader
    }

    fn handle(&self) -> Weak<dyn ClassLoader> {
        self.this.clone()
    }

    /// Link `class_file` into a class owned by this loader. The superclass must
    /// already be loadable.
    pub fn define_class(&self, class_file: ClassFile) -> Result<Arc<Class>, Throwable> {
        let name = class_file.this_class.clone();

        if self.classes.read().contains_key(&name) {
            return Err(LinkageError::Other {
                class_name: name,
                reason: "duplicate class definition".to_string(),
            }
            .into());
        }

        class_file
            .constant_pool
            .perform_format_checking()
            .map_err(|source| ClassFormatError::ConstantPool {
                class_name: name.clone(),
                source,
            })?;

        let super_class = match &class_file.super_class {
            Some(super_name) => Some(self.load_class(&FieldType::object(super_name.as_str()))?),
            None => None,
        };

        let class = Class::define(class_file, super_class, self.handle())?;

        match self.classes.write().entry(name) {
            Entry::Occupied(entry) => Err(LinkageError::Other {
                class_name: entry.key().clone(),
                reason: "duplicate class definition".to_string(),
            }
            .into()),
            Entry::Vacant(entry) => {
                debug!("Defined {} ({} methods)", class.name(), class.methods().len());
                Ok(Arc::clone(entry.insert(class)))
            }
        }
    }

    /// A class this loader already holds, without creating anything.
    pub fn find_class(&self, name: &str) -> Option<Arc<Class>> {
        self.classes.read().get(name).cloned()
    }

    pub fn class_count(&self) -> usize {
        self.classes.read().len()
    }

    fn primitive_class(&self, base: BaseType) -> Arc<Class> {
        let key = base.to_string();
        let mut classes = self.classes.write();

        Arc::clone(
            classes
                .entry(key)
                .or_insert_with(|| Arc::new(Class::new_primitive(base, self.handle()))),
        )
    }

    fn register_array(&self, array: &ArrayType, component: Arc<Class>) -> Arc<Class> {
        let key = array.to_string();
        let super_class = self.find_class(JAVA_LANG_OBJECT);
        let mut classes = self.classes.write();

        Arc::clone(classes.entry(key.clone()).or_insert_with(|| {
            Arc::new(Class::new_array(key, component, super_class, self.handle()))
        }))
    }
}

impl ClassLoader for BootstrapClassLoader {
    fn load_class(&self, ty: &FieldType) -> Result<Arc<Class>, LinkageError> {
        let key = ty.internal_name();

        if let Some(class) = self.find_class(&key) {
            debug!("Fast path: {}", key);
            return Ok(class);
        }

        debug!("Slow path: {}", key);

        match ty {
            FieldType::Base(base) => Ok(self.primitive_class(*base)),
            FieldType::Array(array) => {
                // Load the component first, no lock may be held across a load.
                let component = self.load_class(&array.field_type)?;
                Ok(self.register_array(array, component))
            }
            FieldType::Object(_) => Err(LinkageError::ClassNotFound(key)),
        }
    }
}
