//! Succinct bit vector with constant-time rank and select.
//!
//! # Layout
//!
//! The raw bits live in plain 64-bit words. Two auxiliary indexes are
//! built on top, both optional:
//!
//! - **Rank hints**: one pair of words per 512-bit block (8 data words).
//!   The first word of the pair is the absolute number of ones before the
//!   block; the second packs seven 9-bit running popcounts, one before
//!   each of words 1..=7 inside the block. A final sentinel pair carries
//!   the total popcount so `rank1(len)` needs no special casing beyond a
//!   single compare.
//! - **Select hints**: for every interval of 1024 ones, the first block
//!   whose cumulative rank passes the interval boundary, closed by a
//!   sentinel equal to the block count. A select query binary-searches
//!   only the few blocks between two consecutive hints.
//!
//! `rank1` is two array reads and one popcount. `select1` is a bounded
//! binary search, one branch-free 9-bit-lane comparison to pick the word
//! inside the block, and one in-word select.
//!
//! Keeping the three arrays separate (rather than interleaving them)
//! costs a cache line on some queries but lets a serialized vector be
//! reinterpreted in place from a mapped file.

use std::borrow::Cow;

use crate::bit_tools::{select_in_word, uleq_step_9, ONES_STEP_9};
use crate::error::{Error, Result};
use crate::io::{self, ByteReader, ByteWriter};

const WORDS_PER_BLOCK: usize = 8;
const ONES_PER_SELECT_HINT: usize = 1024;

/// Append-only bit accumulator; [`BitVectorBuilder::freeze`] turns it
/// into an immutable [`BitVector`].
#[derive(Default, Clone)]
pub struct BitVectorBuilder {
    words: Vec<u64>,
    len: usize,
}

impl BitVectorBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty builder with room for `bits` bits.
    pub fn with_capacity(bits: usize) -> Self {
        Self {
            words: Vec::with_capacity(bits.div_ceil(64)),
            len: 0,
        }
    }

    /// Append one bit.
    pub fn push(&mut self, bit: bool) {
        if self.len % 64 == 0 {
            self.words.push(0);
        }
        if bit {
            self.words[self.len / 64] |= 1 << (self.len % 64);
        }
        self.len += 1;
    }

    /// Number of bits accumulated so far.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Return true if no bits have been pushed.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Finalize into an immutable vector, building the requested indexes.
    /// Select support requires rank support.
    pub fn freeze(self, enable_rank: bool, enable_select: bool) -> BitVector<'static> {
        debug_assert!(enable_rank || !enable_select);
        let num_ones = self
            .words
            .iter()
            .map(|w| w.count_ones() as usize)
            .sum::<usize>();

        let rank_hints = if enable_rank {
            build_rank_hints(&self.words, num_ones)
        } else {
            Vec::new()
        };
        let select_hints = if enable_rank && enable_select {
            build_select_hints(&rank_hints)
        } else {
            Vec::new()
        };

        BitVector {
            words: Cow::Owned(self.words),
            rank_hints: Cow::Owned(rank_hints),
            select_hints: Cow::Owned(select_hints),
            len: self.len,
            num_ones,
        }
    }
}

fn build_rank_hints(words: &[u64], num_ones: usize) -> Vec<u64> {
    let num_blocks = words.len().div_ceil(WORDS_PER_BLOCK);
    let mut hints = Vec::with_capacity(2 * (num_blocks + 1));

    let mut abs = 0u64;
    for block in words.chunks(WORDS_PER_BLOCK) {
        hints.push(abs);
        let mut packed = 0u64;
        let mut in_block = 0u64;
        for wi in 0..WORDS_PER_BLOCK {
            if wi != 0 {
                packed = (packed << 9) | in_block;
            }
            // Missing words of a trailing partial block count as zero,
            // so the packed ranks stay well-defined up to the pad.
            in_block += u64::from(block.get(wi).copied().unwrap_or(0).count_ones());
        }
        hints.push(packed);
        abs += in_block;
    }

    // Sentinel pair: rank1(len) and every "rank after the last block"
    // probe resolve through it.
    hints.push(num_ones as u64);
    hints.push(0);
    hints
}

fn build_select_hints(rank_hints: &[u64]) -> Vec<u64> {
    let num_blocks = rank_hints.len() / 2 - 1;
    let mut hints = Vec::new();
    let mut threshold = ONES_PER_SELECT_HINT as u64;
    for bi in 0..num_blocks {
        // A block holds at most 512 ones, so each block crosses at most
        // one 1024-one boundary.
        if rank_hints[2 * (bi + 1)] > threshold {
            hints.push(bi as u64);
            threshold += ONES_PER_SELECT_HINT as u64;
        }
    }
    hints.push(num_blocks as u64);
    hints
}

/// Immutable bit array with constant-time `rank1`/`select1`.
///
/// Owns its storage after a build, or borrows it from an externally
/// owned region after [`BitVector::read`] in zero-copy mode.
pub struct BitVector<'a> {
    words: Cow<'a, [u64]>,
    rank_hints: Cow<'a, [u64]>,
    select_hints: Cow<'a, [u64]>,
    len: usize,
    num_ones: usize,
}

impl std::fmt::Debug for BitVector<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitVector")
            .field("len", &self.len)
            .field("num_ones", &self.num_ones)
            .finish()
    }
}

impl<'a> BitVector<'a> {
    /// Total number of bits.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Return true if the vector has length 0.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total number of set bits.
    pub fn num_ones(&self) -> usize {
        self.num_ones
    }

    /// Return true if the bit at index `i` is set.
    #[inline]
    pub fn get(&self, i: usize) -> bool {
        debug_assert!(i < self.len);
        self.words[i / 64] & (1u64 << (i % 64)) != 0
    }

    /// Number of set bits in `[0, i)`. Requires rank support and
    /// `i <= len()`.
    #[inline]
    pub fn rank1(&self, i: usize) -> usize {
        debug_assert!(i <= self.len);
        debug_assert!(!self.rank_hints.is_empty());
        if i == self.len {
            return self.num_ones;
        }
        let (wi, wj) = (i / 64, i % 64);
        let (bi, bj) = (wi / WORDS_PER_BLOCK, wi % WORDS_PER_BLOCK);
        let mut r = self.rank_hints[2 * bi] as usize + self.rank_in_block(bi, bj);
        if wj != 0 {
            r += (self.words[wi] << (64 - wj)).count_ones() as usize;
        }
        r
    }

    /// Position of the `n`-th set bit, or `None` when `n >= num_ones()`.
    /// Requires select support.
    pub fn select1(&self, n: usize) -> Option<usize> {
        if n >= self.num_ones {
            return None;
        }
        debug_assert!(!self.select_hints.is_empty());
        let bi = self.select_block(n);

        let mut cur = self.rank_for_block(bi);
        debug_assert!(cur <= n);

        // Branch-free pick of the word inside the block: compare all
        // seven packed running ranks against n - cur at once.
        let packed = self.rank_hints[2 * bi + 1];
        let target = ((n - cur) as u64) * ONES_STEP_9;
        let wj = (uleq_step_9(packed, target).wrapping_mul(ONES_STEP_9) >> 54 & 0x7) as usize;
        cur += self.rank_in_block(bi, wj);
        debug_assert!(cur <= n);

        let wi = bi * WORDS_PER_BLOCK + wj;
        Some(wi * 64 + select_in_word(self.words[wi], (n - cur) as u64) as usize)
    }

    #[inline]
    fn rank_for_block(&self, bi: usize) -> usize {
        self.rank_hints[2 * bi] as usize
    }

    #[inline]
    fn rank_in_block(&self, bi: usize, wj: usize) -> usize {
        (self.rank_hints[2 * bi + 1] >> ((7 - wj) * 9) & 0x1FF) as usize
    }

    /// Largest block whose starting rank is `<= n`, found by a binary
    /// search bounded between two consecutive select hints.
    fn select_block(&self, n: usize) -> usize {
        let hi = n / ONES_PER_SELECT_HINT;
        let mut a = if hi == 0 {
            0
        } else {
            self.select_hints[hi - 1] as usize
        };
        let mut b = self.select_hints[hi] as usize + 1;
        while b - a > 1 {
            let mid = a + (b - a) / 2;
            if self.rank_for_block(mid) <= n {
                a = mid;
            } else {
                b = mid;
            }
        }
        a
    }

    pub(crate) fn into_owned(self) -> BitVector<'static> {
        BitVector {
            words: Cow::Owned(self.words.into_owned()),
            rank_hints: Cow::Owned(self.rank_hints.into_owned()),
            select_hints: Cow::Owned(self.select_hints.into_owned()),
            len: self.len,
            num_ones: self.num_ones,
        }
    }

    /// Exact serialized size in bytes.
    pub(crate) fn serialized_len(&self) -> usize {
        8 + io::u64_section_len(self.words.len())
            + io::u64_section_len(self.rank_hints.len())
            + io::u64_section_len(self.select_hints.len())
    }

    pub(crate) fn write_into(&self, w: &mut ByteWriter) {
        w.put_u64(self.len as u64);
        w.put_u64_section(&self.words);
        w.put_u64_section(&self.rank_hints);
        w.put_u64_section(&self.select_hints);
    }

    /// Read a vector back from a serialized section, borrowing the
    /// underlying words when `zero_copy` is set. Runs the cheap
    /// structural checks; deeper inconsistencies are undefined behavior
    /// of the query results, never memory unsafety.
    pub(crate) fn read(r: &mut ByteReader<'a>, zero_copy: bool) -> Result<BitVector<'a>> {
        let len = usize::try_from(r.get_u64()?)
            .map_err(|_| Error::CorruptData("bit vector length overflows usize".into()))?;
        let words = r.get_u64_section(zero_copy)?;
        let rank_hints = r.get_u64_section(zero_copy)?;
        let select_hints = r.get_u64_section(zero_copy)?;

        if words.len() != len.div_ceil(64) {
            return Err(Error::CorruptData(format!(
                "bit vector of {len} bits carries {} words",
                words.len()
            )));
        }
        let num_blocks = words.len().div_ceil(WORDS_PER_BLOCK);
        if !rank_hints.is_empty() && rank_hints.len() != 2 * (num_blocks + 1) {
            return Err(Error::CorruptData("rank hint count mismatch".into()));
        }
        if !select_hints.is_empty() {
            if rank_hints.is_empty() {
                return Err(Error::CorruptData("select hints without rank hints".into()));
            }
            if select_hints[select_hints.len() - 1] != num_blocks as u64 {
                return Err(Error::CorruptData("select hint sentinel mismatch".into()));
            }
        }

        let num_ones = if rank_hints.is_empty() {
            words.iter().map(|w| w.count_ones() as usize).sum()
        } else {
            rank_hints[rank_hints.len() - 2] as usize
        };
        Ok(BitVector {
            words,
            rank_hints,
            select_hints,
            len,
            num_ones,
        })
    }
}
