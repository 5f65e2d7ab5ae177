use std::sync::{Arc, OnceLock};

use anyhow::{anyhow, Result};
use parse::{attributes::ExceptionEntry, pool::ConstantPool};
use support::descriptor::FieldType;
use tracing::trace;

use crate::error::LinkageError;

use super::{class::Class, loader::ClassLoader};

/// What a handler catches.
#[derive(Debug)]
pub enum CatchType {
    /// catch_type 0, used for `finally` blocks.
    Any,
    /// A class named in the constant pool. The class itself is only loaded the
    /// first time a throw inside the handler's range needs it.
    Class {
        name: String,
        resolved: OnceLock<Arc<Class>>,
    },
}

impl CatchType {
    pub fn class_name(&self) -> Option<&str> {
        match self {
            CatchType::Any => None,
            CatchType::Class { name, .. } => Some(name),
        }
    }

    /// `loader` is only asked for when the class has not been loaded yet.
    fn resolve<F>(&self, loader: F) -> Result<Option<Arc<Class>>, LinkageError>
    where
        F: FnOnce() -> Result<Arc<dyn ClassLoader>, LinkageError>,
    {
        let (name, resolved) = match self {
            CatchType::Any => return Ok(None),
            CatchType::Class { name, resolved } => (name, resolved),
        };

        if let Some(class) = resolved.get() {
            return Ok(Some(Arc::clone(class)));
        }

        trace!("resolving catch type {}", name);
        let class = loader()?.load_class(&FieldType::object(name.as_str()))?;

        // Whoever publishes first wins, a racing resolution of the same name
        // produced the same class anyway.
        Ok(Some(Arc::clone(resolved.get_or_init(|| class))))
    }
}

#[derive(Debug)]
pub struct ExceptionHandler {
    pub start_pc: u16,
    pub end_pc: u16,
    pub handler_pc: u16,
    pub catch_type: CatchType,
}

impl ExceptionHandler {
    /// Whether `pc` falls inside `[start_pc, end_pc)`.
    pub fn covers(&self, pc: u16) -> bool {
        (self.start_pc..self.end_pc).contains(&pc)
    }

    fn catches<F>(&self, thrown: &Class, loader: F) -> Result<bool, LinkageError>
    where
        F: FnOnce() -> Result<Arc<dyn ClassLoader>, LinkageError>,
    {
        Ok(match self.catch_type.resolve(loader)? {
            None => true,
            Some(catch) => thrown.is_subclass_of(&catch),
        })
    }
}

/// A method's exception handlers in declaration order.
#[derive(Debug, Default)]
pub struct ExceptionTable {
    handlers: Vec<ExceptionHandler>,
}

impl ExceptionTable {
    /// Build the table from raw `Code` attribute rows. Catch type names are looked
    /// up in `constant_pool` now, the classes they name are not loaded.
    pub fn copy_from(entries: &[ExceptionEntry], constant_pool: &ConstantPool) -> Result<Self> {
        let mut handlers = Vec::with_capacity(entries.len());

        for entry in entries {
            if entry.start_pc > entry.end_pc {
                return Err(anyhow!(
                    "handler range [{}, {}) ends before it starts",
                    entry.start_pc,
                    entry.end_pc
                ));
            }

            let catch_type = match entry.catch_type {
                0 => CatchType::Any,
                index => CatchType::Class {
                    name: constant_pool.class_name(index)?.to_string(),
                    resolved: OnceLock::new(),
                },
            };

            handlers.push(ExceptionHandler {
                start_pc: entry.start_pc,
                end_pc: entry.end_pc,
                handler_pc: entry.handler_pc,
                catch_type,
            });
        }

        Ok(Self { handlers })
    }

    /// Check every range and handler against the length of the code they guard.
    pub fn verify_bounds(&self, code_length: usize) -> Result<()> {
        for handler in &self.handlers {
            if handler.end_pc as usize > code_length {
                return Err(anyhow!(
                    "handler range [{}, {}) runs past the end of {} bytes of code",
                    handler.start_pc,
                    handler.end_pc,
                    code_length
                ));
            }

            if handler.handler_pc as usize >= code_length {
                return Err(anyhow!(
                    "handler pc {} is outside {} bytes of code",
                    handler.handler_pc,
                    code_length
                ));
            }
        }

        Ok(())
    }

    /// The first handler, in declaration order, whose range covers `pc` and which
    /// catches `thrown` (either unconditionally or through an ancestor-or-self
    /// catch type). Catch types are loaded as they are reached, `loader` is only
    /// called when one of them still needs loading.
    pub fn find_handler<F>(
        &self,
        pc: u16,
        thrown: &Class,
        loader: F,
    ) -> Result<Option<&ExceptionHandler>, LinkageError>
    where
        F: Fn() -> Result<Arc<dyn ClassLoader>, LinkageError>,
    {
        for handler in self.handlers.iter().filter(|h| h.covers(pc)) {
            if handler.catches(thrown, &loader)? {
                return Ok(Some(handler));
            }
        }

        Ok(None)
    }

    /// Like `find_handler`, but only the pc to jump to.
    pub fn find_handler_pc<F>(
        &self,
        pc: u16,
        thrown: &Class,
        loader: F,
    ) -> Result<Option<u16>, LinkageError>
    where
        F: Fn() -> Result<Arc<dyn ClassLoader>, LinkageError>,
    {
        Ok(self
            .find_handler(pc, thrown, loader)?
            .map(|handler| handler.handler_pc))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExceptionHandler> {
        self.handlers.iter()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
