//! Fixed-layout primitives shared by the trace and motif codecs.
//!
//! Integers are little-endian. Strings occupy a fixed number of bytes,
//! zero-padded on the right; decoding strips trailing zero bytes and nothing
//! else, so a value may not itself end in a zero byte.

use crate::error::CodecError;

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

/// Accumulates a whole file in memory so that no bytes reach disk until
/// every field has been checked.
pub(crate) struct Writer {
    buf: Vec<u8>,
    origin: String,
}

impl Writer {
    pub(crate) fn new(origin: impl Into<String>) -> Self {
        Self {
            buf: Vec::new(),
            origin: origin.into(),
        }
    }

    pub(crate) fn put_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub(crate) fn put_i32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub(crate) fn put_i64(&mut self, value: i64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// A count or index that must fit the `i32` slot it is stored in.
    pub(crate) fn put_len_i32(&mut self, field: &'static str, value: usize) -> Result<(), CodecError> {
        let value = i32::try_from(value).map_err(|_| CodecError::FieldTooLong {
            origin: self.origin.clone(),
            field,
            len: value,
            max: i32::MAX as usize,
        })?;
        self.put_i32(value);
        Ok(())
    }

    pub(crate) fn put_len_i64(&mut self, field: &'static str, value: usize) -> Result<(), CodecError> {
        let value = i64::try_from(value).map_err(|_| CodecError::FieldTooLong {
            origin: self.origin.clone(),
            field,
            len: value,
            max: i64::MAX as usize,
        })?;
        self.put_i64(value);
        Ok(())
    }

    pub(crate) fn put_str(&mut self, field: &'static str, value: &str, width: usize) -> Result<(), CodecError> {
        let bytes = value.as_bytes();
        if bytes.len() > width {
            return Err(CodecError::FieldTooLong {
                origin: self.origin.clone(),
                field,
                len: bytes.len(),
                max: width,
            });
        }
        if bytes.last() == Some(&0) {
            return Err(CodecError::TrailingZeroByte {
                origin: self.origin.clone(),
                field,
            });
        }
        self.buf.extend_from_slice(bytes);
        self.buf.resize(self.buf.len() + (width - bytes.len()), 0);
        Ok(())
    }

    pub(crate) fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

pub(crate) struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
    origin: String,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(bytes: &'a [u8], origin: impl Into<String>) -> Self {
        Self {
            bytes,
            offset: 0,
            origin: origin.into(),
        }
    }

    pub(crate) fn origin(&self) -> &str {
        &self.origin
    }

    pub(crate) fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    /// Fail with `TruncatedFile` unless at least `needed` bytes remain.
    pub(crate) fn require(&self, field: &'static str, needed: usize) -> Result<(), CodecError> {
        if needed > self.remaining() {
            return Err(CodecError::TruncatedFile {
                origin: self.origin.clone(),
                field,
                offset: self.offset,
                needed,
                available: self.remaining(),
            });
        }
        Ok(())
    }

    fn take(&mut self, field: &'static str, n: usize) -> Result<&'a [u8], CodecError> {
        self.require(field, n)?;
        let slice = &self.bytes[self.offset..self.offset + n];
        self.offset += n;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N], CodecError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(field, N)?);
        Ok(out)
    }

    pub(crate) fn u8(&mut self, field: &'static str) -> Result<u8, CodecError> {
        Ok(self.array::<1>(field)?[0])
    }

    pub(crate) fn i32(&mut self, field: &'static str) -> Result<i32, CodecError> {
        Ok(i32::from_le_bytes(self.array(field)?))
    }

    pub(crate) fn i64(&mut self, field: &'static str) -> Result<i64, CodecError> {
        Ok(i64::from_le_bytes(self.array(field)?))
    }

    /// An `i32` that must be a valid count or index.
    pub(crate) fn len_i32(&mut self, field: &'static str) -> Result<usize, CodecError> {
        let value = self.i32(field)?;
        usize::try_from(value).map_err(|_| self.malformed(format!("{} is negative ({})", field, value)))
    }

    pub(crate) fn len_i64(&mut self, field: &'static str) -> Result<usize, CodecError> {
        let value = self.i64(field)?;
        usize::try_from(value).map_err(|_| self.malformed(format!("{} is out of range ({})", field, value)))
    }

    pub(crate) fn str(&mut self, field: &'static str, width: usize) -> Result<String, CodecError> {
        let raw = self.take(field, width)?;
        let end = raw.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
        String::from_utf8(raw[..end].to_vec())
            .map_err(|_| self.malformed(format!("{} is not valid UTF-8", field)))
    }

    pub(crate) fn malformed(&self, detail: String) -> CodecError {
        CodecError::MalformedHeader {
            origin: self.origin.clone(),
            detail,
        }
    }

    /// Succeeds only when every byte has been consumed.
    pub(crate) fn finish(self) -> Result<(), CodecError> {
        match self.remaining() {
            0 => Ok(()),
            extra => Err(CodecError::TrailingBytes {
                origin: self.origin,
                extra,
            }),
        }
    }
}
