use std::{
    fmt,
    sync::{Arc, OnceLock, Weak},
};

use anyhow::anyhow;
use bytes::Bytes;
use parse::{classfile::MethodInfo, pool::ConstantPool};
use support::descriptor::MethodType;
use tracing::trace;

use crate::{
    constants::{
        CLINIT_METHOD_DESCRIPTOR, CLINIT_METHOD_NAME, CONSTRUCTOR_NAME, MAIN_METHOD_DESCRIPTOR,
        MAIN_METHOD_NAME, REGISTER_NATIVES_METHOD_DESCRIPTOR, REGISTER_NATIVES_METHOD_NAME,
    },
    error::{ClassFormatError, LinkageError, Throwable},
    internal,
    native::{NativeFunction, NativeHandle},
};

use super::{
    class::Class,
    exception::ExceptionTable,
    loader::ClassLoader,
    member::ClassMember,
};

const ACC_SYNCHRONIZED: u16 = 0x0020;
const ACC_VARARGS: u16 = 0x0080;
const ACC_NATIVE: u16 = 0x0100;
const ACC_ABSTRACT: u16 = 0x0400;

/// A method of a loaded class.
///
/// Everything but the native binding and the resolved parameter types is fixed when
/// the method is built, so interpreter threads read it without synchronisation.
/// Those two are single-assignment cells: once set they never change.
#[derive(Debug)]
pub struct Method {
    member: ClassMember,
    method_type: MethodType,
    max_stack: u16,
    max_locals: u16,
    code: Bytes,
    exception_table: ExceptionTable,
    native: OnceLock<NativeFunction>,
    parameter_types: OnceLock<Arc<[Arc<Class>]>>,
}

impl Method {
    /// Build a method of `class` from its parsed `method_info`.
    ///
    /// The descriptor is parsed whether or not the method has a body. Catch types
    /// named by the exception table are looked up by name in `constant_pool` but
    /// not loaded.
    pub fn new(
        class: Weak<Class>,
        info: &MethodInfo,
        constant_pool: &ConstantPool,
    ) -> Result<Self, ClassFormatError> {
        let member = ClassMember::new(class, info.flags.bits(), &info.name, &info.descriptor);

        let method_type = MethodType::parse(&info.descriptor).map_err(|source| {
            ClassFormatError::Descriptor {
                class_name: member.class_name(),
                method_name: info.name.clone(),
                source,
            }
        })?;

        let mut method = Self {
            method_type,
            max_stack: 0,
            max_locals: 0,
            code: Bytes::new(),
            exception_table: ExceptionTable::default(),
            native: OnceLock::new(),
            parameter_types: OnceLock::new(),
            member,
        };

        let code_error = |source: anyhow::Error| ClassFormatError::Code {
            class_name: method.member.class_name(),
            method_name: info.name.clone(),
            source,
        };

        let code = info.code_attribute(constant_pool).map_err(code_error)?;
        let Some(code) = code else {
            return Ok(method);
        };

        if method.is_native() || method.is_abstract() {
            return Err(code_error(anyhow!(
                "abstract and native methods cannot carry a Code attribute"
            )));
        }

        if !code.exception_table.is_empty() {
            let table = ExceptionTable::copy_from(&code.exception_table, constant_pool)
                .and_then(|table| table.verify_bounds(code.code.len()).map(|_| table))
                .map_err(|source| ClassFormatError::ExceptionTable {
                    class_name: method.member.class_name(),
                    method_name: info.name.clone(),
                    source,
                })?;

            method.exception_table = table;
        }

        method.max_stack = code.max_stack;
        method.max_locals = code.max_locals;
        method.code = code.code;

        Ok(method)
    }

    pub fn member(&self) -> &ClassMember {
        &self.member
    }

    pub fn class(&self) -> Option<Arc<Class>> {
        self.member.class()
    }

    pub fn name(&self) -> &str {
        self.member.name()
    }

    pub fn descriptor(&self) -> &str {
        self.member.descriptor()
    }

    pub fn method_type(&self) -> &MethodType {
        &self.method_type
    }

    pub fn access_flags(&self) -> u16 {
        self.member.access_flags()
    }

    pub fn is_public(&self) -> bool {
        self.member.is_public()
    }

    pub fn is_private(&self) -> bool {
        self.member.is_private()
    }

    pub fn is_static(&self) -> bool {
        self.member.is_static()
    }

    pub fn is_final(&self) -> bool {
        self.member.is_final()
    }

    pub fn is_native(&self) -> bool {
        self.member.has(ACC_NATIVE)
    }

    pub fn is_abstract(&self) -> bool {
        self.member.has(ACC_ABSTRACT)
    }

    pub fn is_synchronized(&self) -> bool {
        self.member.has(ACC_SYNCHRONIZED)
    }

    pub fn is_varargs(&self) -> bool {
        self.member.has(ACC_VARARGS)
    }

    // Sizing is zero and code is empty when there is no body, check `has_code`.

    pub fn max_stack(&self) -> u16 {
        self.max_stack
    }

    pub fn max_locals(&self) -> u16 {
        self.max_locals
    }

    pub fn code(&self) -> &Bytes {
        &self.code
    }

    pub fn has_code(&self) -> bool {
        !self.code.is_empty()
    }

    pub fn exception_table(&self) -> &ExceptionTable {
        &self.exception_table
    }

    /// Parameters declared in the descriptor.
    pub fn arg_count(&self) -> usize {
        self.method_type.arg_count()
    }

    /// Arguments the caller passes: instance methods also take the receiver.
    pub fn actual_arg_count(&self) -> usize {
        if self.is_static() {
            self.arg_count()
        } else {
            self.arg_count() + 1
        }
    }

    /// Local variable slots the arguments fill on entry, `long` and `double`
    /// taking two each.
    pub fn arg_slot_count(&self) -> usize {
        let receiver = if self.is_static() { 0 } else { 1 };
        self.method_type.arg_slot_count() + receiver
    }

    pub fn is_void_return_type(&self) -> bool {
        self.method_type.is_void_return()
    }

    pub fn is_constructor(&self) -> bool {
        !self.is_static() && self.name() == CONSTRUCTOR_NAME
    }

    pub fn is_clinit(&self) -> bool {
        self.is_static()
            && self.name() == CLINIT_METHOD_NAME
            && self.descriptor() == CLINIT_METHOD_DESCRIPTOR
    }

    /// `static void registerNatives()`, which the bootstrap sequence skips.
    pub fn is_register_natives(&self) -> bool {
        self.is_static()
            && self.name() == REGISTER_NATIVES_METHOD_NAME
            && self.descriptor() == REGISTER_NATIVES_METHOD_DESCRIPTOR
    }

    pub fn is_main(&self) -> bool {
        self.is_static()
            && self.name() == MAIN_METHOD_NAME
            && self.descriptor() == MAIN_METHOD_DESCRIPTOR
    }

    pub fn native_handle(&self) -> NativeHandle {
        match self.native.get() {
            Some(function) => NativeHandle::Registered(*function),
            None => NativeHandle::Absent,
        }
    }

    /// Bind the implementation of a native method. A method accepts exactly one
    /// binding, of the same static-ness as itself.
    pub fn register_native(&self, function: NativeFunction) -> Result<(), Throwable> {
        if !self.is_native() {
            return Err(internal!("{} is not a native method", self));
        }

        if function.is_static() != self.is_static() {
            return Err(internal!(
                "static-ness of the native implementation does not match {}",
                self
            ));
        }

        self.native
            .set(function)
            .map_err(|_| internal!("{} already has a native implementation", self))
    }

    /// The classes of the declared parameters, in order.
    ///
    /// Resolved through the declaring class's loader on first use and reused after
    /// that. A failed resolution is not remembered, the next call tries again.
    pub fn parameter_types(&self) -> Result<Arc<[Arc<Class>]>, LinkageError> {
        if let Some(types) = self.parameter_types.get() {
            return Ok(Arc::clone(types));
        }

        let resolved = self.resolve_parameter_types()?;
        Ok(Arc::clone(self.parameter_types.get_or_init(|| resolved)))
    }

    fn resolve_parameter_types(&self) -> Result<Arc<[Arc<Class>]>, LinkageError> {
        if self.arg_count() == 0 {
            return Ok(Vec::new().into());
        }

        let loader = self.loader()?;

        trace!("resolving parameter types of {}", self);

        let types = self
            .method_type
            .parameters
            .iter()
            .map(|parameter| loader.load_class(parameter))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(types.into())
    }

    /// Where to continue after `thrown` is raised at `pc`, if this method handles it.
    ///
    /// The declaring class and its loader are only needed when a catch type has to
    /// be loaded, so a dropped class or loader goes unnoticed otherwise.
    pub fn find_exception_handler(
        &self,
        pc: u16,
        thrown: &Class,
    ) -> Result<Option<u16>, LinkageError> {
        self.exception_table
            .find_handler_pc(pc, thrown, || self.loader())
    }

    fn loader(&self) -> Result<Arc<dyn ClassLoader>, LinkageError> {
        self.class()
            .ok_or_else(|| LinkageError::ClassUnloaded(self.member.class_name()))?
            .loader()
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{Method name:{} descriptor:{}}}",
            self.name(),
            self.descriptor()
        )
    }
}
