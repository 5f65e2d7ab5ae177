#![allow(dead_code)]

use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, Weak,
    },
};

use bytes::Bytes;
use parse::{
    attributes::{Attributes, CodeAttribute, ExceptionEntry},
    classfile::{ClassFile, MethodInfo},
    flags::{ClassFileAccessFlag, MethodAccessFlag},
};
use runtime::{
    constants::JAVA_LANG_OBJECT,
    error::{LinkageError, Throwable},
    object::{
        class::Class,
        loader::{BootOptions, BootstrapClassLoader, ClassLoader},
    },
};
use support::descriptor::FieldType;
use tracing::Level;
use tracing_subscriber::fmt;

pub fn init_logging() {
    let format = fmt::format()
        .with_ansi(true)
        .without_time()
        .with_level(true)
        .with_target(false)
        .with_thread_names(false)
        .with_source_location(true)
        .compact();

    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .event_format(format)
        .with_writer(std::io::stderr)
        .try_init();
}

/// A bootstrap loader holding `java/lang/Object` and a small throwable hierarchy.
pub fn make_loader() -> Arc<BootstrapClassLoader> {
    init_logging();

    let loader = BootstrapClassLoader::new(BootOptions::default());

    loader
        .define_class(TestClass::new(JAVA_LANG_OBJECT).root().build())
        .expect("object to define");

    for (name, super_name) in [
        ("java/lang/String", JAVA_LANG_OBJECT),
        ("java/lang/Throwable", JAVA_LANG_OBJECT),
        ("java/lang/Exception", "java/lang/Throwable"),
        ("java/lang/RuntimeException", "java/lang/Exception"),
        ("java/io/IOException", "java/lang/Exception"),
    ] {
        loader
            .define_class(TestClass::new(name).extends(super_name).build())
            .expect("hierarchy to define");
    }

    loader
}

/// Builds class files the way a compiler would lay them out.
pub struct TestClass {
    file: ClassFile,
}

impl TestClass {
    pub fn new(name: &str) -> Self {
        Self {
            file: ClassFile::new(ClassFileAccessFlag::PUBLIC.into(), name)
                .with_super_class(JAVA_LANG_OBJECT),
        }
    }

    pub fn root(mut self) -> Self {
        self.file.super_class = None;
        self
    }

    pub fn extends(self, super_class: &str) -> Self {
        Self {
            file: self.file.with_super_class(super_class),
        }
    }

    /// A method without a body: abstract or native.
    pub fn method(self, flags: MethodAccessFlag, name: &str, descriptor: &str) -> Self {
        Self {
            file: self
                .file
                .with_method(MethodInfo::new(flags.into(), name, descriptor)),
        }
    }

    /// A method with `code_length` bytes of `nop`s ending in `return`, guarded by
    /// `handlers` of the form `(start, end, handler, catch type)`.
    pub fn code_method(
        mut self,
        flags: MethodAccessFlag,
        name: &str,
        descriptor: &str,
        code_length: usize,
        handlers: &[(u16, u16, u16, Option<&str>)],
    ) -> Self {
        let exception_table = handlers
            .iter()
            .map(|(start_pc, end_pc, handler_pc, catch_type)| ExceptionEntry {
                start_pc: *start_pc,
                end_pc: *end_pc,
                handler_pc: *handler_pc,
                catch_type: catch_type
                    .map(|name| self.file.constant_pool.class_index(name))
                    .unwrap_or(0),
            })
            .collect();

        let mut code = vec![0x00; code_length.saturating_sub(1)];
        code.push(0xB1);

        let attribute = CodeAttribute {
            max_stack: 2,
            max_locals: 4,
            code: Bytes::from(code),
            exception_table,
            attributes: Attributes::default(),
        };

        let info = MethodInfo::new(flags.into(), name, descriptor)
            .with_code(&attribute, &mut self.file.constant_pool);

        Self {
            file: self.file.with_method(info),
        }
    }

    pub fn build(self) -> ClassFile {
        self.file
    }
}

/// Forwards to a bootstrap loader, counting requests. Classes it defines are owned
/// by the caller rather than kept in a registry, so tests can drop them.
pub struct CountingLoader {
    inner: Arc<BootstrapClassLoader>,
    calls: AtomicUsize,
    requests: Mutex<HashSet<String>>,
}

impl CountingLoader {
    pub fn new(inner: Arc<BootstrapClassLoader>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(HashSet::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requested(&self, name: &str) -> bool {
        self.requests.lock().expect("lock").contains(name)
    }

    pub fn inner(&self) -> &Arc<BootstrapClassLoader> {
        &self.inner
    }

    pub fn define(self: &Arc<Self>, file: ClassFile) -> Result<Arc<Class>, Throwable> {
        let super_class = match &file.super_class {
            Some(name) => Some(self.inner.load_class(&FieldType::object(name.as_str()))?),
            None => None,
        };

        let handle: Weak<dyn ClassLoader> = Arc::downgrade(self) as Weak<dyn ClassLoader>;
        Class::define(file, super_class, handle)
    }
}

impl ClassLoader for CountingLoader {
    fn load_class(&self, ty: &FieldType) -> Result<Arc<Class>, LinkageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .expect("lock")
            .insert(ty.internal_name());

        self.inner.load_class(ty)
    }
}
