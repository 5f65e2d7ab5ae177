use std::{collections::HashMap, fmt, sync::Arc};

use parking_lot::RwLock;
use support::types::MethodDescriptor;
use tracing::{debug, trace};

use crate::{
    error::Throwable,
    internal,
    object::{class::Class, value::RuntimeValue},
};

pub type NativeStaticFunction =
    fn(class: &Arc<Class>, args: Vec<RuntimeValue>) -> Result<Option<RuntimeValue>, Throwable>;

pub type NativeInstanceFunction =
    fn(this: RuntimeValue, args: Vec<RuntimeValue>) -> Result<Option<RuntimeValue>, Throwable>;

#[derive(Clone, Copy)]
pub enum NativeFunction {
    Static(NativeStaticFunction),
    Instance(NativeInstanceFunction),
}

impl NativeFunction {
    pub fn is_static(&self) -> bool {
        matches!(self, NativeFunction::Static(_))
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeFunction::Static(_) => f.write_str("NativeFunction::Static"),
            NativeFunction::Instance(_) => f.write_str("NativeFunction::Instance"),
        }
    }
}

/// The native implementation bound to a method, if any.
#[derive(Debug, Clone, Copy, Default)]
pub enum NativeHandle {
    #[default]
    Absent,
    Registered(NativeFunction),
}

impl NativeHandle {
    pub fn is_registered(&self) -> bool {
        matches!(self, NativeHandle::Registered(_))
    }

    pub fn function(&self) -> Option<NativeFunction> {
        match self {
            NativeHandle::Registered(function) => Some(*function),
            NativeHandle::Absent => None,
        }
    }
}

/// A group of natives belonging to one class.
pub trait NativeModule {
    fn classname(&self) -> &'static str;

    fn methods(&self) -> Vec<((&'static str, &'static str), NativeFunction)> {
        vec![]
    }
}

/// Native implementations by class and method, bound onto methods once their class
/// is loaded.
#[derive(Default)]
pub struct NativeRegistry {
    modules: RwLock<HashMap<String, HashMap<MethodDescriptor, NativeFunction>>>,
}

impl NativeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &self,
        class_name: &str,
        method: (&str, &str),
        function: NativeFunction,
    ) -> Result<(), Throwable> {
        let key = MethodDescriptor::try_from(method)
            .map_err(|e| internal!("bad native descriptor for {}: {}", class_name, e))?;

        let mut modules = self.modules.write();
        let methods = modules.entry(class_name.to_string()).or_default();

        if methods.contains_key(&key) {
            return Err(internal!("{}.{} is already registered", class_name, key));
        }

        methods.insert(key, function);
        Ok(())
    }

    pub fn register_module(&self, module: &dyn NativeModule) -> Result<(), Throwable> {
        for (method, function) in module.methods() {
            self.register(module.classname(), method, function)?;
        }

        Ok(())
    }

    pub fn lookup(&self, class_name: &str, method: &MethodDescriptor) -> Option<NativeFunction> {
        self.modules.read().get(class_name)?.get(method).copied()
    }

    /// Attach every registered implementation to the matching native methods of
    /// `class`, returning how many were bound. `registerNatives()V` hooks are
    /// skipped, natives without an implementation stay unbound.
    pub fn bind(&self, class: &Class) -> Result<usize, Throwable> {
        let mut bound = 0;

        for method in class.methods().iter().filter(|m| m.is_native()) {
            if method.is_register_natives() {
                trace!("Skipping registerNatives hook of {}", class.name());
                continue;
            }

            if method.native_handle().is_registered() {
                continue;
            }

            let key = MethodDescriptor::new(method.name().to_string(), method.method_type().clone());
            let Some(function) = self.lookup(class.name(), &key) else {
                debug!("No native implementation for {}.{}", class.name(), key);
                continue;
            };

            match method.register_native(function) {
                Ok(()) => bound += 1,
                // Another binder got there between the check above and here.
                Err(_) if method.native_handle().is_registered() => {
                    trace!("{} was bound concurrently", method);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(bound)
    }
}

#[macro_export]
macro_rules! static_method {
    (name: $name: expr, descriptor: $descriptor: expr => $method: expr) => {
        (
            ($name, $descriptor),
            $crate::native::NativeFunction::Static($method),
        )
    };
}

#[macro_export]
macro_rules! instance_method {
    (name: $name: expr, descriptor: $descriptor: expr => $method: expr) => {
        (
            ($name, $descriptor),
            $crate::native::NativeFunction::Instance($method),
        )
    };
}
