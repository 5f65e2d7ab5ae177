use std::sync::{Arc, Weak};

use super::class::Class;

// Bits shared by every member kind. Method-only bits live on `Method`.
const ACC_PUBLIC: u16 = 0x0001;
const ACC_PRIVATE: u16 = 0x0002;
const ACC_PROTECTED: u16 = 0x0004;
const ACC_STATIC: u16 = 0x0008;
const ACC_FINAL: u16 = 0x0010;
const ACC_SYNTHETIC: u16 = 0x1000;

/// What fields and methods have in common: who declared them, their access flags,
/// their name and their descriptor. None of it changes after construction.
#[derive(Debug, Clone)]
pub struct ClassMember {
    class: Weak<Class>,
    access_flags: u16,
    name: String,
    descriptor: String,
}

impl ClassMember {
    pub fn new(
        class: Weak<Class>,
        access_flags: u16,
        name: impl Into<String>,
        descriptor: impl Into<String>,
    ) -> Self {
        Self {
            class,
            access_flags,
            name: name.into(),
            descriptor: descriptor.into(),
        }
    }

    /// The declaring class, or `None` once it has been dropped.
    pub fn class(&self) -> Option<Arc<Class>> {
        self.class.upgrade()
    }

    pub(crate) fn class_name(&self) -> String {
        self.class()
            .map(|class| class.name().to_string())
            .unwrap_or_else(|| "<unloaded>".to_string())
    }

    pub fn access_flags(&self) -> u16 {
        self.access_flags
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    pub(crate) fn has(&self, flag: u16) -> bool {
        self.access_flags & flag != 0
    }

    pub fn is_public(&self) -> bool {
        self.has(ACC_PUBLIC)
    }

    pub fn is_private(&self) -> bool {
        self.has(ACC_PRIVATE)
    }

    pub fn is_protected(&self) -> bool {
        self.has(ACC_PROTECTED)
    }

    pub fn is_static(&self) -> bool {
        self.has(ACC_STATIC)
    }

    pub fn is_final(&self) -> bool {
        self.has(ACC_FINAL)
    }

    pub fn is_synthetic(&self) -> bool {
        self.has(ACC_SYNTHETIC)
    }
}
