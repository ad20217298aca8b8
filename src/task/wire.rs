//! Sequential Binary Wire Codec
//!
//! Tasks travel as a type tag followed by variant-specific fields, written and
//! read strictly in order. The reader fails fast on truncated or malformed
//! input so a task is never partially populated.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{CoordinationError, Result};

/// Sequential writer for the task wire form.
pub struct TaskWriter {
    buf: BytesMut,
}

impl TaskWriter {
    pub fn new() -> Self {
        Self { buf: BytesMut::new() }
    }

    /// UTF-8 string with a big-endian u16 length prefix.
    pub fn write_string(&mut self, value: &str) -> Result<()> {
        let bytes = value.as_bytes();
        if bytes.len() > u16::MAX as usize {
            return Err(CoordinationError::malformed(format!(
                "string of {} bytes exceeds wire limit",
                bytes.len()
            )));
        }
        self.buf.put_u16(bytes.len() as u16);
        self.buf.put_slice(bytes);
        Ok(())
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buf.put_u8(value as u8);
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.put_u8(value);
    }

    pub fn write_u64(&mut self, value: u64) {
        self.buf.put_u64(value);
    }

    pub fn finish(self) -> Bytes {
        self.buf.freeze()
    }
}

impl Default for TaskWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Sequential reader over a task wire form.
pub struct TaskReader {
    buf: Bytes,
}

impl TaskReader {
    pub fn new(buf: Bytes) -> Self {
        Self { buf }
    }

    fn need(&self, n: usize, what: &str) -> Result<()> {
        if self.buf.remaining() < n {
            return Err(CoordinationError::malformed(format!(
                "truncated input reading {what}: need {n} bytes, have {}",
                self.buf.remaining()
            )));
        }
        Ok(())
    }

    pub fn read_string(&mut self) -> Result<String> {
        self.need(2, "string length")?;
        let len = self.buf.get_u16() as usize;
        self.need(len, "string body")?;
        let raw = self.buf.split_to(len);
        String::from_utf8(raw.to_vec())
            .map_err(|e| CoordinationError::malformed(format!("invalid UTF-8 string: {e}")))
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        self.need(1, "bool")?;
        match self.buf.get_u8() {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(CoordinationError::malformed(format!(
                "invalid bool byte {other:#x}"
            ))),
        }
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.need(1, "u8")?;
        Ok(self.buf.get_u8())
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        self.need(8, "u64")?;
        Ok(self.buf.get_u64())
    }

    /// Bytes left unread, for trailing-garbage checks.
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_each_field_type() {
        let mut writer = TaskWriter::new();
        writer.write_string("databases/db1").unwrap();
        writer.write_bool(true);
        writer.write_u64(5000);
        writer.write_u8(26);

        let mut reader = TaskReader::new(writer.finish());
        assert_eq!(reader.read_string().unwrap(), "databases/db1");
        assert!(reader.read_bool().unwrap());
        assert_eq!(reader.read_u64().unwrap(), 5000);
        assert_eq!(reader.read_u8().unwrap(), 26);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn truncated_string_fails_fast() {
        let mut writer = TaskWriter::new();
        writer.write_string("resource").unwrap();
        let full = writer.finish();

        let mut reader = TaskReader::new(full.slice(..4));
        assert!(reader.read_string().is_err());
    }

    #[test]
    fn invalid_bool_byte_is_rejected() {
        let mut writer = TaskWriter::new();
        writer.write_u8(7);

        let mut reader = TaskReader::new(writer.finish());
        assert!(reader.read_bool().is_err());
    }

    #[test]
    fn empty_input_cannot_yield_u64() {
        let mut reader = TaskReader::new(Bytes::new());
        assert!(reader.read_u64().is_err());
    }
}
