pub mod class;
pub mod exception;
pub mod loader;
pub mod member;
pub mod method;
pub mod value;
