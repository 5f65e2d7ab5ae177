//! Names and descriptors the runtime treats specially.

pub const MAIN_METHOD_NAME: &str = "main";
pub const MAIN_METHOD_DESCRIPTOR: &str = "([Ljava/lang/String;)V";

pub const CLINIT_METHOD_NAME: &str = "<clinit>";
pub const CLINIT_METHOD_DESCRIPTOR: &str = "()V";

pub const CONSTRUCTOR_NAME: &str = "<init>";

pub const REGISTER_NATIVES_METHOD_NAME: &str = "registerNatives";
pub const REGISTER_NATIVES_METHOD_DESCRIPTOR: &str = "()V";

pub const JAVA_LANG_OBJECT: &str = "java/lang/Object";
