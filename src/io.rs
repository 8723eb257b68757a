//! Little-endian section framing for serialized dictionaries.
//!
//! Every component serializes as a length-prefixed section: a `u64`
//! element count followed by the raw elements, zero-padded so that the
//! next section starts on an 8-byte boundary. Keeping every section
//! 8-aligned relative to the start of the file is what makes the
//! zero-copy view path possible: a memory-mapped region (itself page
//! aligned) can hand out `&[u32]`/`&[u64]` slices directly.
//!
//! The writer always emits little-endian bytes. The owned reader decodes
//! element-wise and therefore works at any alignment; the view reader
//! reinterprets in place and reports misalignment as corruption.

use std::borrow::Cow;

use zerocopy::FromBytes;

use crate::error::{Error, Result};

#[inline]
fn padded(len: usize) -> usize {
    len.div_ceil(8) * 8
}

/// Serialized size of a `u32` section holding `n` elements.
#[inline]
pub(crate) fn u32_section_len(n: usize) -> usize {
    8 + padded(n * 4)
}

/// Serialized size of a `u64` section holding `n` elements.
#[inline]
pub(crate) fn u64_section_len(n: usize) -> usize {
    8 + n * 8
}

/// Serialized size of a raw byte section holding `n` bytes.
#[inline]
pub(crate) fn blob_section_len(n: usize) -> usize {
    8 + padded(n)
}

/// Append-only buffer that keeps 8-byte section alignment.
pub(crate) struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub(crate) fn with_capacity(cap: usize) -> Self {
        Self {
            buf: Vec::with_capacity(cap),
        }
    }

    pub(crate) fn into_inner(self) -> Vec<u8> {
        debug_assert_eq!(self.buf.len() % 8, 0);
        self.buf
    }

    pub(crate) fn len(&self) -> usize {
        self.buf.len()
    }

    fn pad8(&mut self) {
        while self.buf.len() % 8 != 0 {
            self.buf.push(0);
        }
    }

    pub(crate) fn put_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    /// Raw bytes with no framing; the caller keeps them 8-aligned.
    pub(crate) fn put_raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub(crate) fn put_u32_section(&mut self, xs: &[u32]) {
        self.put_u64(xs.len() as u64);
        for &x in xs {
            self.buf.extend_from_slice(&x.to_le_bytes());
        }
        self.pad8();
    }

    pub(crate) fn put_u64_section(&mut self, xs: &[u64]) {
        self.put_u64(xs.len() as u64);
        for &x in xs {
            self.buf.extend_from_slice(&x.to_le_bytes());
        }
    }

    pub(crate) fn put_blob_section(&mut self, bytes: &[u8]) {
        self.put_u64(bytes.len() as u64);
        self.buf.extend_from_slice(bytes);
        self.pad8();
    }
}

/// Bounds-checked cursor over a serialized dictionary.
///
/// `zero_copy` selects between decoding into owned vectors and handing
/// out borrowed slices of the underlying region.
pub(crate) struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(Error::CorruptData(format!(
                "section of {n} bytes exceeds the {} remaining",
                self.remaining()
            )));
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn skip_pad8(&mut self) -> Result<()> {
        let n = padded(self.pos) - self.pos;
        self.take(n).map(|_| ())
    }

    pub(crate) fn get_u64(&mut self) -> Result<u64> {
        let raw = self.take(8)?;
        Ok(u64::from_le_bytes(raw.try_into().expect("8-byte slice")))
    }

    /// Raw bytes with no framing (the fixed-size code table).
    pub(crate) fn get_raw(&mut self, n: usize, zero_copy: bool) -> Result<Cow<'a, [u8]>> {
        let raw = self.take(n)?;
        Ok(if zero_copy {
            Cow::Borrowed(raw)
        } else {
            Cow::Owned(raw.to_vec())
        })
    }

    pub(crate) fn get_u32_section(&mut self, zero_copy: bool) -> Result<Cow<'a, [u32]>> {
        let count = usize::try_from(self.get_u64()?)
            .map_err(|_| Error::CorruptData("u32 section count overflows usize".into()))?;
        let byte_len = count
            .checked_mul(4)
            .filter(|&b| b <= self.remaining())
            .ok_or_else(|| {
                Error::CorruptData(format!("u32 section count {count} exceeds input"))
            })?;
        let raw = self.take(byte_len)?;
        let out = if zero_copy {
            let units = <[u32]>::ref_from_bytes(raw)
                .map_err(|_| Error::CorruptData("misaligned u32 section in mapped region".into()))?;
            Cow::Borrowed(units)
        } else {
            Cow::Owned(
                raw.chunks_exact(4)
                    .map(|c| u32::from_le_bytes(c.try_into().expect("4-byte chunk")))
                    .collect(),
            )
        };
        self.skip_pad8()?;
        Ok(out)
    }

    pub(crate) fn get_u64_section(&mut self, zero_copy: bool) -> Result<Cow<'a, [u64]>> {
        let count = usize::try_from(self.get_u64()?)
            .map_err(|_| Error::CorruptData("u64 section count overflows usize".into()))?;
        let byte_len = count
            .checked_mul(8)
            .filter(|&b| b <= self.remaining())
            .ok_or_else(|| {
                Error::CorruptData(format!("u64 section count {count} exceeds input"))
            })?;
        let raw = self.take(byte_len)?;
        let out = if zero_copy {
            let words = <[u64]>::ref_from_bytes(raw)
                .map_err(|_| Error::CorruptData("misaligned u64 section in mapped region".into()))?;
            Cow::Borrowed(words)
        } else {
            Cow::Owned(
                raw.chunks_exact(8)
                    .map(|c| u64::from_le_bytes(c.try_into().expect("8-byte chunk")))
                    .collect(),
            )
        };
        Ok(out)
    }

    pub(crate) fn get_blob_section(&mut self, zero_copy: bool) -> Result<Cow<'a, [u8]>> {
        let len = usize::try_from(self.get_u64()?)
            .map_err(|_| Error::CorruptData("blob length overflows usize".into()))?;
        if len > self.remaining() {
            return Err(Error::CorruptData(format!(
                "blob of {len} bytes exceeds input"
            )));
        }
        let raw = self.take(len)?;
        let out = if zero_copy {
            Cow::Borrowed(raw)
        } else {
            Cow::Owned(raw.to_vec())
        };
        self.skip_pad8()?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sections_round_trip() {
        let mut w = ByteWriter::with_capacity(64);
        w.put_u64(7);
        w.put_u32_section(&[1, 2, 3]);
        w.put_u64_section(&[10, 20]);
        w.put_blob_section(b"abcde");
        let bytes = w.into_inner();
        assert_eq!(bytes.len() % 8, 0);
        assert_eq!(
            bytes.len(),
            8 + u32_section_len(3) + u64_section_len(2) + blob_section_len(5)
        );

        let mut r = ByteReader::new(&bytes);
        assert_eq!(r.get_u64().unwrap(), 7);
        assert_eq!(r.get_u32_section(false).unwrap().as_ref(), &[1, 2, 3]);
        assert_eq!(r.get_u64_section(false).unwrap().as_ref(), &[10, 20]);
        assert_eq!(r.get_blob_section(false).unwrap().as_ref(), b"abcde");
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn truncated_section_is_rejected() {
        let mut w = ByteWriter::with_capacity(16);
        w.put_u32_section(&[1, 2, 3, 4]);
        let bytes = w.into_inner();
        let mut r = ByteReader::new(&bytes[..bytes.len() - 8]);
        assert!(r.get_u32_section(false).is_err());
    }

    #[test]
    fn bogus_count_is_rejected_before_allocation() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&u64::MAX.to_le_bytes());
        let mut r = ByteReader::new(&bytes);
        assert!(r.get_u64_section(false).is_err());
    }
}
