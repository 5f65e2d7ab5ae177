use support::descriptor::DescriptorError;
use thiserror::Error;

/// The class being loaded is structurally broken. Fatal for that load attempt.
#[derive(Error, Debug)]
pub enum ClassFormatError {
    #[error("method {class_name}.{method_name} has a malformed descriptor: {source}")]
    Descriptor {
        class_name: String,
        method_name: String,
        #[source]
        source: DescriptorError,
    },

    #[error("method {class_name}.{method_name} has a malformed Code attribute: {source}")]
    Code {
        class_name: String,
        method_name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("method {class_name}.{method_name} has a malformed exception table: {source}")]
    ExceptionTable {
        class_name: String,
        method_name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("class {class_name} has a malformed constant pool: {source}")]
    ConstantPool {
        class_name: String,
        #[source]
        source: anyhow::Error,
    },
}

/// A symbolic type reference could not be turned into a loaded class.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LinkageError {
    #[error("class not found: {0}")]
    ClassNotFound(String),

    #[error("class {0} has been unloaded")]
    ClassUnloaded(String),

    #[error("the loader for {0} is no longer alive")]
    LoaderUnavailable(String),

    #[error("could not link {class_name}: {reason}")]
    Other { class_name: String, reason: String },
}

#[derive(Error, Debug)]
pub enum Throwable {
    #[error(transparent)]
    ClassFormat(#[from] ClassFormatError),

    #[error(transparent)]
    Linkage(#[from] LinkageError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl Throwable {
    /// The `java/lang` error class a caller should raise for this condition.
    pub fn class_name(&self) -> &'static str {
        match self {
            Throwable::ClassFormat(_) => "java/lang/ClassFormatError",
            Throwable::Linkage(LinkageError::ClassNotFound(_)) => "java/lang/NoClassDefFoundError",
            Throwable::Linkage(_) => "java/lang/LinkageError",
            Throwable::Internal(_) => "java/lang/InternalError",
        }
    }
}

#[macro_export]
macro_rules! internal {
    ($msg:literal $(,)?) => {
        $crate::error::Throwable::Internal(anyhow::anyhow!($msg))
    };
    ($err:expr $(,)?) => {
        $crate::error::Throwable::Internal(anyhow::anyhow!($err))
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::Throwable::Internal(anyhow::anyhow!($fmt, $($arg)*))
    };
}
