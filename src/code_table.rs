//! Order-preserving byte-to-code compaction.
//!
//! Transition codes index the double array, so a dense code space keeps
//! BASE placement tight. Bytes that actually occur in the key set get
//! contiguous codes in increasing byte order; everything else is
//! unmapped. Because the assignment preserves byte order, walking
//! children in code order enumerates keys in raw-byte lexicographic
//! order with no extra bookkeeping.
//!
//! Code 0 is reserved for the end-of-key sentinel unless the key set
//! contains the byte `0x00` (bin mode), in which case no byte value can
//! serve as a sentinel and key ends are marked positionally throughout
//! the dictionary.

use std::borrow::Cow;

use crate::error::{Error, Result};
use crate::io::{ByteReader, ByteWriter};

const TABLE_LEN: usize = 256;

/// Unmapped bytes point at this slot; the validity check in
/// [`CodeTable::get_code`] rejects them regardless of its contents.
const UNMAPPED: u8 = 0xFF;

/// Bijection between occurring bytes and a compact code alphabet.
pub struct CodeTable<'a> {
    c2i: Cow<'a, [u8]>,
    i2c: Cow<'a, [u8]>,
    alphabet_size: u32,
    bin_mode: bool,
}

impl CodeTable<'static> {
    /// Derive the table from the byte set of `keys`.
    pub(crate) fn from_keys<K: AsRef<[u8]>>(keys: &[K]) -> CodeTable<'static> {
        let mut present = [false; TABLE_LEN];
        for key in keys {
            for &b in key.as_ref() {
                present[b as usize] = true;
            }
        }
        let bin_mode = present[0];

        let mut c2i = vec![UNMAPPED; TABLE_LEN];
        let mut i2c = vec![0u8; TABLE_LEN];
        let mut code: u32 = if bin_mode {
            0
        } else {
            // Reserve code 0 for the end-of-key sentinel so that codes
            // order exactly as bytes with "key ends here" sorting first.
            c2i[0] = 0;
            i2c[0] = 0;
            1
        };
        for (b, _) in present.iter().enumerate().filter(|(_, &p)| p) {
            c2i[b] = code as u8;
            i2c[code as usize] = b as u8;
            code += 1;
        }

        CodeTable {
            c2i: Cow::Owned(c2i),
            i2c: Cow::Owned(i2c),
            alphabet_size: code,
            bin_mode,
        }
    }
}

impl<'a> CodeTable<'a> {
    /// Number of assigned codes, including the reserved sentinel code
    /// in non-bin mode.
    pub fn alphabet_size(&self) -> u32 {
        self.alphabet_size
    }

    /// True iff the key set contains the byte `0x00`.
    pub fn bin_mode(&self) -> bool {
        self.bin_mode
    }

    /// Code of `b`, or `None` when `b` does not occur in any key.
    #[inline]
    pub fn get_code(&self, b: u8) -> Option<u32> {
        let code = u32::from(self.c2i[b as usize]);
        // A real code maps back to its byte; the sentinel code never
        // labels an edge.
        if code >= self.alphabet_size
            || self.i2c[code as usize] != b
            || (!self.bin_mode && code == 0)
        {
            return None;
        }
        Some(code)
    }

    /// Byte for a code produced by construction. Total for valid codes.
    #[inline]
    pub fn get_byte(&self, code: u32) -> u8 {
        debug_assert!(code < self.alphabet_size);
        self.i2c[code as usize]
    }

    pub(crate) fn into_owned(self) -> CodeTable<'static> {
        CodeTable {
            c2i: Cow::Owned(self.c2i.into_owned()),
            i2c: Cow::Owned(self.i2c.into_owned()),
            alphabet_size: self.alphabet_size,
            bin_mode: self.bin_mode,
        }
    }

    pub(crate) fn serialized_len(&self) -> usize {
        2 * TABLE_LEN
    }

    pub(crate) fn write_into(&self, w: &mut ByteWriter) {
        w.put_raw(&self.c2i);
        w.put_raw(&self.i2c);
    }

    /// Read the table back; `alphabet_size` and `bin_mode` come from the
    /// dictionary header. Verifies the mapping is a bijection over the
    /// assigned code range.
    pub(crate) fn read(
        r: &mut ByteReader<'a>,
        zero_copy: bool,
        alphabet_size: u32,
        bin_mode: bool,
    ) -> Result<CodeTable<'a>> {
        if alphabet_size as usize > TABLE_LEN {
            return Err(Error::CorruptData(format!(
                "alphabet size {alphabet_size} exceeds the byte range"
            )));
        }
        let c2i = r.get_raw(TABLE_LEN, zero_copy)?;
        let i2c = r.get_raw(TABLE_LEN, zero_copy)?;
        let first_code = if bin_mode { 0 } else { 1 };
        for code in first_code..alphabet_size {
            let b = i2c[code as usize];
            if u32::from(c2i[b as usize]) != code {
                return Err(Error::CorruptData(format!(
                    "code table is not a bijection at code {code}"
                )));
            }
        }
        Ok(CodeTable {
            c2i,
            i2c,
            alphabet_size,
            bin_mode,
        })
    }
}
