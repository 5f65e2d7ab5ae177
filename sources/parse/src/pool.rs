use anyhow::{anyhow, Result};
use enum_as_inner::EnumAsInner;

/// A class's constant pool. Indices are 1-based as in the class file, slot 0 is
/// never valid and `long`/`double` entries own the slot after them.
#[derive(Debug, Clone, Default)]
pub struct ConstantPool {
    entries: Vec<ConstantEntry>,
}

impl ConstantPool {
    pub fn new() -> Self {
        Self { entries: vec![] }
    }

    /// Append an entry and return the index it was stored at.
    pub fn insert(&mut self, entry: ConstantEntry) -> u16 {
        let wide = matches!(entry, ConstantEntry::Long(_) | ConstantEntry::Double(_));
        self.entries.push(entry);
        let index = self.entries.len() as u16;

        if wide {
            self.entries.push(ConstantEntry::Reserved);
        }

        index
    }

    /// Intern a UTF-8 constant, reusing an existing entry with the same contents.
    pub fn utf8_index(&mut self, value: &str) -> u16 {
        let existing = self.entries.iter().position(|entry| {
            entry
                .as_utf8()
                .filter(|utf8| utf8.string == value)
                .is_some()
        });

        match existing {
            Some(position) => (position + 1) as u16,
            None => self.insert(ConstantEntry::Utf8(ConstantUtf8 {
                string: value.to_string(),
            })),
        }
    }

    /// Intern a class constant (and its name) for `class_name`.
    pub fn class_index(&mut self, class_name: &str) -> u16 {
        let name = self.utf8_index(class_name);
        let existing = self.entries.iter().position(|entry| {
            entry
                .as_class()
                .filter(|class| class.name == name)
                .is_some()
        });

        match existing {
            Some(position) => (position + 1) as u16,
            None => self.insert(ConstantEntry::Class(ConstantClass { name })),
        }
    }

    pub fn get(&self, index: u16) -> Option<&ConstantEntry> {
        if index == 0 {
            return None;
        }

        self.entries.get((index - 1) as usize)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn utf8(&self, index: u16) -> Result<&str> {
        let entry = self
            .get(index)
            .ok_or(anyhow!("no constant at index {}", index))?;

        match entry {
            ConstantEntry::Utf8(data) => Ok(&data.string),
            other => Err(anyhow!("expected Utf8 got {:?} @ {}", other, index)),
        }
    }

    pub fn class_name(&self, index: u16) -> Result<&str> {
        let entry = self
            .get(index)
            .ok_or(anyhow!("no constant at index {}", index))?;

        match entry {
            ConstantEntry::Class(data) => self.utf8(data.name),
            other => Err(anyhow!("expected Class got {:?} @ {}", other, index)),
        }
    }

    /// Check that every cross reference in the pool lands on an entry of the
    /// right kind.
    pub fn perform_format_checking(&self) -> Result<()> {
        for item in self.entries.iter() {
            match item {
                ConstantEntry::Class(data) => {
                    self.utf8(data.name)?;
                }
                ConstantEntry::String(data) => {
                    self.utf8(data.string)?;
                }
                ConstantEntry::NameAndType(data) => {
                    self.utf8(data.name)?;
                    self.utf8(data.descriptor)?;
                }
                ConstantEntry::Method(data) => {
                    self.class_name(data.class)?;
                    let name_and_type = self
                        .get(data.name_and_type)
                        .and_then(|entry| entry.as_name_and_type())
                        .ok_or(anyhow!(
                            "method ref points at {} which is not a NameAndType",
                            data.name_and_type
                        ))?;
                    self.utf8(name_and_type.name)?;
                }
                ConstantEntry::Integer(_) => {}
                ConstantEntry::Float(_) => {}
                ConstantEntry::Long(_) => {}
                ConstantEntry::Double(_) => {}
                ConstantEntry::Utf8(_) => {}
                ConstantEntry::Reserved => {}
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ConstantClass {
    pub name: u16,
}

#[derive(Debug, Clone)]
pub struct ConstantMethod {
    pub class: u16,
    pub name_and_type: u16,
}

#[derive(Debug, Clone)]
pub struct ConstantString {
    pub string: u16,
}

#[derive(Debug, Clone)]
pub struct ConstantNameAndType {
    pub name: u16,
    pub descriptor: u16,
}

#[derive(Debug, Clone)]
pub struct ConstantUtf8 {
    pub string: String,
}

#[derive(EnumAsInner, Clone, Debug)]
pub enum ConstantEntry {
    Class(ConstantClass),
    Method(ConstantMethod),
    String(ConstantString),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    NameAndType(ConstantNameAndType),
    Utf8(ConstantUtf8),
    Reserved,
}
