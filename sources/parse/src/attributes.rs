use crate::pool::ConstantPool;
use anyhow::{anyhow, Result};
use bytes::{BufMut, Bytes, BytesMut};
use support::bytes_ext::SafeBuf;

#[derive(Debug, Clone)]
pub struct Attribute {
    /// Index of the attribute's name in the constant pool.
    pub name: u16,
    pub data: Bytes,
}

#[derive(Debug, Clone, Default)]
pub struct Attributes {
    pub values: Vec<Attribute>,
}

impl Attributes {
    pub fn new(values: Vec<Attribute>) -> Self {
        Self { values }
    }

    /// Decode the attribute `T`, failing when it is absent.
    pub fn known_attribute<T>(&self, constant_pool: &ConstantPool) -> Result<T>
    where
        T: KnownAttribute,
    {
        self.find_known_attribute(constant_pool)?
            .ok_or(anyhow!("could not locate known attribute {}", T::id()))
    }

    /// Decode the attribute `T` if the member carries one.
    pub fn find_known_attribute<T>(&self, constant_pool: &ConstantPool) -> Result<Option<T>>
    where
        T: KnownAttribute,
    {
        let mut found_attr: Option<&Attribute> = None;

        for attr in self.values.iter() {
            if constant_pool.utf8(attr.name)? == T::id() {
                if found_attr.is_some() {
                    return Err(anyhow!("duplicate {} attribute", T::id()));
                }
                found_attr = Some(attr);
            }
        }

        match found_attr {
            Some(attr) => Ok(Some(T::decode(attr.data.clone(), constant_pool)?)),
            None => Ok(None),
        }
    }

    pub fn parse(bytes: &mut Bytes) -> Result<Self> {
        let length = bytes.try_get_u16()?;
        let mut attributes = Attributes {
            values: Vec::with_capacity(length.into()),
        };

        for _ in 0..length {
            let name = bytes.try_get_u16()?;
            let attr_length = bytes.try_get_u32()?;
            let data = bytes.try_get_bytes(attr_length as usize)?;

            attributes.values.push(Attribute { name, data });
        }

        Ok(attributes)
    }
}

pub trait KnownAttribute
where
    Self: Sized,
{
    fn decode(bytes: Bytes, constant_pool: &ConstantPool) -> Result<Self>;
    fn id() -> &'static str;
}

#[derive(Debug, Clone)]
pub struct CodeAttribute {
    pub max_stack: u16,
    pub max_locals: u16,
    pub code: Bytes,
    pub exception_table: Vec<ExceptionEntry>,
    pub attributes: Attributes,
}

/// A raw exception table row. `catch_type` is a constant pool index, 0 meaning
/// the handler catches everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExceptionEntry {
    pub start_pc: u16,
    pub end_pc: u16,
    pub handler_pc: u16,
    pub catch_type: u16,
}

impl KnownAttribute for CodeAttribute {
    fn decode(mut bytes: Bytes, _constant_pool: &ConstantPool) -> Result<Self> {
        let max_stack = bytes.try_get_u16()?;
        let max_locals = bytes.try_get_u16()?;

        let code_length = bytes.try_get_u32()?;
        if code_length == 0 {
            return Err(anyhow!("code attribute with an empty body"));
        }
        let code = bytes.try_get_bytes(code_length as usize)?;

        let exception_length = bytes.try_get_u16()?;
        let mut exception_table: Vec<ExceptionEntry> = Vec::with_capacity(exception_length.into());
        for _ in 0..exception_length {
            exception_table.push(ExceptionEntry {
                start_pc: bytes.try_get_u16()?,
                end_pc: bytes.try_get_u16()?,
                handler_pc: bytes.try_get_u16()?,
                catch_type: bytes.try_get_u16()?,
            })
        }
        let attributes = Attributes::parse(&mut bytes)?;

        Ok(CodeAttribute {
            max_stack,
            max_locals,
            code,
            exception_table,
            attributes,
        })
    }

    fn id() -> &'static str {
        "Code"
    }
}

impl CodeAttribute {
    /// Lay the attribute back out in class-file order, nested attributes included.
    pub fn encode(&self) -> Bytes {
        let mut out = BytesMut::new();
        out.put_u16(self.max_stack);
        out.put_u16(self.max_locals);
        out.put_u32(self.code.len() as u32);
        out.put_slice(&self.code);

        out.put_u16(self.exception_table.len() as u16);
        for entry in &self.exception_table {
            out.put_u16(entry.start_pc);
            out.put_u16(entry.end_pc);
            out.put_u16(entry.handler_pc);
            out.put_u16(entry.catch_type);
        }

        out.put_u16(self.attributes.values.len() as u16);
        for attr in &self.attributes.values {
            out.put_u16(attr.name);
            out.put_u32(attr.data.len() as u32);
            out.put_slice(&attr.data);
        }

        out.freeze()
    }
}
