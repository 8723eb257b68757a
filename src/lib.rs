//! # Compressed String Dictionaries
//!
//! *A phone book squeezed to its information-theoretic limit that still
//! answers every query in place.*
//!
//! ## Intuition First
//!
//! Imagine a phone book where the names have been packed so tightly that
//! the book is barely larger than the entropy of its contents. Normally
//! that kind of packing destroys structure: to find a name you would
//! have to unpack everything. This crate keeps the packing *and* the
//! structure. Every name gets a dense integer id, and the book answers
//! "what is the id of this name?", "what name has id 42?", "which
//! entries are prefixes of this string?", and "which entries start with
//! this string?" without ever unpacking.
//!
//! ## The Problem
//!
//! A dictionary over `N` distinct byte strings wants three things that
//! pull in different directions:
//!
//! - **Dense ids**: each key maps to an integer in `[0, N)` and back.
//! - **Prefix structure**: common-prefix and predictive search, not just
//!   membership.
//! - **Minimal space**: close to the compressed size of the key set,
//!   loadable by `mmap` without parsing.
//!
//! Hash maps give the first at the cost of the second and third. Sorted
//! arrays give the second at the cost of the first. Pointer-based tries
//! give both at a ruinous space cost.
//!
//! ## Historical Context
//!
//! ```text
//! 1989  Aoe       The double array: a trie in two integer vectors
//! 1989  Jacobson  Succinct rank/select over bit vectors
//! 2007  Yata      Compacted double arrays with suffix tails (DASTrie)
//! 2008  Vigna     Broadword rank9/select9 engineering
//! 2017  Kanda     XOR-compressed double arrays (XCDA)
//! ```
//!
//! Aoe's double array stores a trie as two vectors BASE and CHECK such
//! that the child of node `v` on symbol `c` sits at `BASE[v] + c` (here,
//! `BASE[v] ^ c`) and is valid iff `CHECK[child] = v`. Kanda's XCDA
//! observed that under the XOR transition the arrays compress further.
//! Jacobson's rank/select turns plain bit vectors into the glue that
//! maps trie slots to dense ids with no id table at all.
//!
//! ## Mathematical Formulation
//!
//! For a key set `K`, `|K| = N`, the dictionary realizes a bijection
//! `lookup : K → [0, N)` with inverse `decode`, plus the two quantified
//! queries
//!
//! - `prefix(q)   = { k ∈ K : k is a prefix of q }`, emitted shortest first,
//! - `predict(q)  = { k ∈ K : q is a prefix of k }`, emitted in
//!   lexicographic order,
//!
//! built from two succinct primitives over a bit vector `B`:
//!
//! - `rank1(i)` — number of set bits in `B[0..i)`,
//! - `select1(n)` — position of the `n`-th set bit.
//!
//! ## Complexity Analysis
//!
//! - `lookup`/`decode`: O(|key|) array probes, O(1) per byte.
//! - `rank1`/`select1`: O(1) with a ~25% bit vector space overhead.
//! - Construction: O(total key bytes × free-list scan), single pass,
//!   single thread.
//!
//! ## What Could Go Wrong
//!
//! 1. **Static only.** Nothing can be inserted after construction;
//!    rebuilding is the only mutation.
//! 2. **Ids are dense but not sorted.** Enumeration yields *keys* in
//!    lexicographic order; the ids attached to them are rank order over
//!    trie slots.
//! 3. **Endianness.** A serialized dictionary memory-maps in place only
//!    on a little-endian host; there is no byte-swapping load path.
//!
//! ## Implementation Notes
//!
//! This crate provides:
//! - [`Trie`]: the dictionary — build, query, save/load/mmap.
//! - [`TrieBuilder`]: construction options (tail deduplication).
//! - [`BitVector`]: the underlying succinct rank/select bit vector.
//!
//! ## References
//!
//! - Aoe, J. (1989). "An efficient digital search algorithm by using a
//!   double-array structure."
//! - Jacobson, G. (1989). "Succinct Static Data Structures."
//! - Yata, S., et al. (2007). "A compact static double-array keeping
//!   character codes."
//! - Kanda, S., et al. (2017). "Compressed double-array tries for
//!   string dictionaries supporting fast lookup."

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bit_tools;
pub mod bitvec;
pub mod builder;
pub mod code_table;
pub mod error;
pub mod iter;
pub mod tail;
pub mod trie;
pub mod xcda;

mod io;

pub use bitvec::{BitVector, BitVectorBuilder};
pub use builder::TrieBuilder;
pub use error::{Error, Result};
pub use iter::{PredictiveIter, PrefixIter};
pub use trie::Trie;
