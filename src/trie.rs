//! The public dictionary type.

use std::fs;
use std::path::Path;

use log::debug;

use crate::builder::TrieBuilder;
use crate::code_table::CodeTable;
use crate::error::{Error, Result};
use crate::io::{ByteReader, ByteWriter};
use crate::iter::{PredictiveIter, PrefixIter};
use crate::tail::TailStore;
use crate::xcda::XcdaArray;

/// File magic for the 32-bit-unit dictionary variant.
const MAGIC: &[u8; 8] = b"XDART32\0";
const HEADER_LEN: usize = 40;

/// Compressed, read-only string dictionary.
///
/// Maps each of `N` distinct byte strings to a dense id in `[0, N)` and
/// back, and answers prefix, predictive, and enumerative queries, all
/// over an XOR double-array trie backed by succinct bit vectors.
///
/// A dictionary either owns its storage ([`Trie::from_keys`],
/// [`Trie::load`]) or borrows a serialized region in place
/// ([`Trie::mmap`]). Queries take `&self` and the structure is immutable,
/// so one instance can be shared freely across threads; iterators carry
/// their own cursor and must stay on one thread each.
pub struct Trie<'a> {
    num_keys: usize,
    max_length: usize,
    table: CodeTable<'a>,
    xcda: XcdaArray<'a>,
    tails: TailStore<'a>,
}

impl Trie<'static> {
    /// Build a dictionary from strictly sorted, distinct keys.
    ///
    /// Equivalent to `TrieBuilder::new().build(keys)`.
    pub fn from_keys<K: AsRef<[u8]>>(keys: &[K]) -> Result<Trie<'static>> {
        TrieBuilder::new().build(keys)
    }

    /// Read a dictionary from a file written by [`Trie::save`], copying
    /// it into owned storage.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Trie<'static>> {
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// Parse a serialized dictionary into owned storage. Works at any
    /// alignment.
    pub fn from_bytes(bytes: &[u8]) -> Result<Trie<'static>> {
        Ok(read_trie(bytes, false)?.into_owned())
    }
}

impl<'a> Trie<'a> {
    /// Reinterpret a serialized dictionary in place, borrowing `region`
    /// with zero copies. The region must outlive the trie, start on an
    /// 8-byte boundary (memory-mapped pages do), and hold little-endian
    /// data; misalignment is reported as corruption.
    pub fn mmap(region: &'a [u8]) -> Result<Trie<'a>> {
        if region.as_ptr() as usize % 8 != 0 {
            return Err(Error::CorruptData(
                "mapped region is not 8-byte aligned".into(),
            ));
        }
        read_trie(region, true)
    }

    /// Number of stored keys.
    pub fn num_keys(&self) -> usize {
        self.num_keys
    }

    /// Length in bytes of the longest stored key.
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Number of distinct codes in the transition alphabet.
    pub fn alphabet_size(&self) -> u32 {
        self.table.alphabet_size()
    }

    /// True iff the key set contains the byte `0x00`.
    pub fn bin_mode(&self) -> bool {
        self.table.bin_mode()
    }

    /// Number of double-array slots.
    pub fn num_nodes(&self) -> usize {
        self.xcda.num_nodes()
    }

    /// Dense id of `key`, or `None` when it is not stored.
    pub fn lookup<K: AsRef<[u8]>>(&self, key: K) -> Option<usize> {
        let key = key.as_ref();
        let mut node = 0u32;
        for (pos, &b) in key.iter().enumerate() {
            if self.xcda.has_link(node) {
                let tail = self.tails.tail(self.xcda.link(node));
                return (tail == &key[pos..]).then(|| self.xcda.leaf_id(node));
            }
            let code = self.table.get_code(b)?;
            node = self.xcda.child(node, code)?;
        }
        if self.xcda.has_link(node) {
            // The stored key continues past the query in its tail.
            return None;
        }
        self.xcda.is_leaf(node).then(|| self.xcda.leaf_id(node))
    }

    /// The key stored under `id`, or `None` when `id >= num_keys()`.
    pub fn decode(&self, id: usize) -> Option<Vec<u8>> {
        let mut node = self.xcda.leaf_pos(id)?;
        let link = self
            .xcda
            .has_link(node)
            .then(|| self.xcda.link(node));

        let mut buf = Vec::with_capacity(self.max_length);
        while node != 0 {
            let parent = self.xcda.check(node);
            buf.push(self.table.get_byte(self.xcda.label(parent, node)));
            node = parent;
        }
        buf.reverse();
        if let Some(offset) = link {
            buf.extend_from_slice(self.tails.tail(offset));
        }
        Some(buf)
    }

    /// Iterate the stored keys that are prefixes of `query`, shortest
    /// first.
    pub fn prefix_iter<'t, 'k>(&'t self, query: &'k [u8]) -> PrefixIter<'t, 'k> {
        PrefixIter::new(self, query)
    }

    /// Iterate the stored keys that `query` is a prefix of, in
    /// lexicographic order.
    pub fn predictive_iter<'t, 'k>(&'t self, query: &'k [u8]) -> PredictiveIter<'t, 'k> {
        PredictiveIter::new(self, query)
    }

    /// Iterate every stored key in lexicographic order.
    pub fn enumerative_iter(&self) -> PredictiveIter<'_, 'static> {
        PredictiveIter::new(self, &[])
    }

    /// Exact size in bytes of the serialized dictionary.
    pub fn memory_in_bytes(&self) -> usize {
        HEADER_LEN
            + self.table.serialized_len()
            + self.xcda.serialized_len()
            + self.tails.serialized_len()
    }

    /// Serialize into a byte vector of exactly [`Trie::memory_in_bytes`]
    /// bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut w = ByteWriter::with_capacity(self.memory_in_bytes());
        w.put_raw(MAGIC);
        w.put_u64(self.num_keys as u64);
        w.put_u64(self.max_length as u64);
        w.put_u64(u64::from(self.table.alphabet_size()));
        w.put_u64(u64::from(self.table.bin_mode()));
        self.table.write_into(&mut w);
        self.xcda.write_into(&mut w);
        self.tails.write_into(&mut w);
        debug_assert_eq!(w.len(), self.memory_in_bytes());
        w.into_inner()
    }

    /// Write the dictionary to `path`, returning the number of bytes
    /// written.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<usize> {
        let bytes = self.to_bytes();
        fs::write(path, &bytes)?;
        debug!("saved dictionary: {} bytes", bytes.len());
        Ok(bytes.len())
    }

    pub(crate) fn from_parts(
        num_keys: usize,
        max_length: usize,
        table: CodeTable<'static>,
        xcda: XcdaArray<'static>,
        tails: TailStore<'static>,
    ) -> Trie<'static> {
        debug_assert_eq!(xcda.num_leaves(), num_keys);
        Trie {
            num_keys,
            max_length,
            table,
            xcda,
            tails,
        }
    }

    pub(crate) fn xcda(&self) -> &XcdaArray<'a> {
        &self.xcda
    }

    pub(crate) fn tails(&self) -> &TailStore<'a> {
        &self.tails
    }

    pub(crate) fn table(&self) -> &CodeTable<'a> {
        &self.table
    }

    fn into_owned(self) -> Trie<'static> {
        Trie {
            num_keys: self.num_keys,
            max_length: self.max_length,
            table: self.table.into_owned(),
            xcda: self.xcda.into_owned(),
            tails: self.tails.into_owned(),
        }
    }
}

fn read_trie(bytes: &[u8], zero_copy: bool) -> Result<Trie<'_>> {
    let mut r = ByteReader::new(bytes);
    let magic = r.get_raw(MAGIC.len(), true)?;
    if magic.as_ref() != MAGIC.as_slice() {
        return Err(Error::CorruptData("bad magic tag".into()));
    }
    let num_keys = usize::try_from(r.get_u64()?)
        .map_err(|_| Error::CorruptData("key count overflows usize".into()))?;
    let max_length = usize::try_from(r.get_u64()?)
        .map_err(|_| Error::CorruptData("max length overflows usize".into()))?;
    let alphabet_size = u32::try_from(r.get_u64()?)
        .map_err(|_| Error::CorruptData("alphabet size out of range".into()))?;
    let bin_mode = match r.get_u64()? {
        0 => false,
        1 => true,
        other => {
            return Err(Error::CorruptData(format!(
                "bad bin-mode flag {other}"
            )))
        }
    };

    let table = CodeTable::read(&mut r, zero_copy, alphabet_size, bin_mode)?;
    let xcda = XcdaArray::read(&mut r, zero_copy)?;
    let tails = TailStore::read(&mut r, zero_copy, bin_mode)?;

    if xcda.num_leaves() != num_keys {
        return Err(Error::CorruptData(format!(
            "header says {num_keys} keys but the leaf vector holds {}",
            xcda.num_leaves()
        )));
    }
    if r.remaining() != 0 {
        return Err(Error::CorruptData(format!(
            "{} trailing bytes after the dictionary",
            r.remaining()
        )));
    }

    Ok(Trie {
        num_keys,
        max_length,
        table,
        xcda,
        tails,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> Vec<&'static [u8]> {
        vec![b"a".as_slice(), b"ab", b"ada", b"adage", b"ban", b"bank"]
    }

    #[test]
    fn lookup_and_decode_are_inverse() {
        let trie = Trie::from_keys(&keys()).unwrap();
        assert_eq!(trie.num_keys(), 6);
        for key in keys() {
            let id = trie.lookup(key).unwrap();
            assert!(id < trie.num_keys());
            assert_eq!(trie.decode(id).unwrap(), key);
        }
    }

    #[test]
    fn absent_keys_return_none() {
        let trie = Trie::from_keys(&keys()).unwrap();
        for absent in [b"".as_slice(), b"ad", b"adagio", b"banks", b"c", b"\xFF"] {
            assert_eq!(trie.lookup(absent), None, "{absent:?}");
        }
        assert_eq!(trie.decode(6), None);
    }

    #[test]
    fn unsorted_input_is_rejected() {
        assert!(matches!(
            Trie::from_keys(&[b"b".as_slice(), b"a"]),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            Trie::from_keys(&[b"a".as_slice(), b"a"]),
            Err(Error::InvalidInput(_))
        ));
        let empty: &[&[u8]] = &[];
        assert!(matches!(
            Trie::from_keys(empty),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn bytes_round_trip_preserves_queries() {
        let trie = Trie::from_keys(&keys()).unwrap();
        let bytes = trie.to_bytes();
        assert_eq!(bytes.len(), trie.memory_in_bytes());

        let owned = Trie::from_bytes(&bytes).unwrap();
        assert_eq!(owned.num_keys(), trie.num_keys());
        assert_eq!(owned.max_length(), trie.max_length());
        for key in keys() {
            assert_eq!(owned.lookup(key), trie.lookup(key));
        }
    }

    #[test]
    fn truncated_bytes_are_rejected() {
        let trie = Trie::from_keys(&keys()).unwrap();
        let bytes = trie.to_bytes();
        assert!(Trie::from_bytes(&bytes[..bytes.len() - 1]).is_err());

        let mut bad_magic = bytes.clone();
        bad_magic[0] ^= 0xFF;
        assert!(Trie::from_bytes(&bad_magic).is_err());
    }
}
