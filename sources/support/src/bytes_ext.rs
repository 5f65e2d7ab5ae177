use anyhow::{anyhow, Result};
use bytes::{Buf, Bytes};

/// Checked reads over a class-file buffer. The plain `Buf` getters panic when the
/// buffer runs dry, truncated attributes must surface as errors instead.
pub trait SafeBuf {
    fn try_get_u8(&mut self) -> Result<u8>;
    fn try_get_u16(&mut self) -> Result<u16>;
    fn try_get_u32(&mut self) -> Result<u32>;
    fn try_get_bytes(&mut self, len: usize) -> Result<Bytes>;
}

macro_rules! checked {
    ($self: expr, $size: expr, $read: ident) => {{
        if $self.remaining() < $size {
            return Err(anyhow!(
                "needed {} bytes but only {} remain",
                $size,
                $self.remaining()
            ));
        }

        Ok($self.$read())
    }};
}

impl SafeBuf for Bytes {
    fn try_get_u8(&mut self) -> Result<u8> {
        checked!(self, 1, get_u8)
    }

    fn try_get_u16(&mut self) -> Result<u16> {
        checked!(self, 2, get_u16)
    }

    fn try_get_u32(&mut self) -> Result<u32> {
        checked!(self, 4, get_u32)
    }

    fn try_get_bytes(&mut self, len: usize) -> Result<Bytes> {
        if self.remaining() < len {
            return Err(anyhow!(
                "needed {} bytes but only {} remain",
                len,
                self.remaining()
            ));
        }

        Ok(self.split_to(len))
    }
}
