pub mod attributes;
pub mod classfile;
pub mod flags;
pub mod pool;

extern crate anyhow;
extern crate bytes;
extern crate enum_as_inner;
extern crate support;
