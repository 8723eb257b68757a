//! Dictionary construction.
//!
//! Construction walks the sorted key list recursively. Each call owns
//! one node and the contiguous range of keys passing through it; it
//! splits the range by the next byte, claims a BASE value whose
//! XOR-children all land on free slots, and recurses. A range that has
//! narrowed to a single key stops early: the remaining suffix goes to
//! the tail pool and the node becomes a tail terminus.
//!
//! Free slots are kept in a circular doubly-linked list in ascending
//! order; BASE search walks the list and takes the first candidate
//! whose child slots are all free, which makes the layout deterministic
//! for a given key list. The array grows in 512-slot chunks so that a
//! candidate's whole child fan (codes are below 512) stays in bounds.

use log::debug;

use crate::bitvec::BitVectorBuilder;
use crate::code_table::CodeTable;
use crate::error::{Error, Result};
use crate::tail::TailWriter;
use crate::trie::Trie;
use crate::xcda::{XcdaArray, NO_PARENT};

const CHUNK: usize = 512;

/// Configurable builder for [`Trie`].
///
/// `Trie::from_keys` covers the common case; the builder exists for the
/// build-time options.
pub struct TrieBuilder {
    dedup_tails: bool,
}

impl Default for TrieBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TrieBuilder {
    /// Builder with default options (no tail deduplication).
    pub fn new() -> Self {
        Self { dedup_tails: false }
    }

    /// Reuse identical suffixes in the tail pool. Slower build, smaller
    /// dictionary; query results are unaffected.
    pub fn dedup_tails(mut self, yes: bool) -> Self {
        self.dedup_tails = yes;
        self
    }

    /// Build a dictionary from strictly sorted, distinct keys.
    pub fn build<K: AsRef<[u8]>>(&self, keys: &[K]) -> Result<Trie<'static>> {
        if keys.is_empty() {
            return Err(Error::InvalidInput("empty key set".into()));
        }
        for i in 1..keys.len() {
            if keys[i - 1].as_ref() >= keys[i].as_ref() {
                return Err(Error::InvalidInput(format!(
                    "keys must be strictly sorted: violation at index {i}"
                )));
            }
        }

        let table = CodeTable::from_keys(keys);
        let max_length = keys.iter().map(|k| k.as_ref().len()).max().unwrap_or(0);

        let mut c = Construction::new(table.bin_mode(), self.dedup_tails);
        c.expand(0, keys, 0, keys.len(), 0, &table);
        Ok(c.freeze(keys.len(), max_length, table))
    }
}

struct Construction {
    bases: Vec<u32>,
    checks: Vec<u32>,
    used: Vec<bool>,
    next_free: Vec<u32>,
    prev_free: Vec<u32>,
    free_head: Option<u32>,
    leaf_flags: Vec<bool>,
    link_flags: Vec<bool>,
    tails: TailWriter,
}

impl Construction {
    fn new(bin_mode: bool, dedup_tails: bool) -> Self {
        let mut c = Self {
            bases: Vec::new(),
            checks: Vec::new(),
            used: Vec::new(),
            next_free: Vec::new(),
            prev_free: Vec::new(),
            free_head: None,
            leaf_flags: Vec::new(),
            link_flags: Vec::new(),
            tails: TailWriter::new(bin_mode, dedup_tails),
        };
        c.grow();
        c.allocate(0); // root
        c
    }

    /// Expand `node`, which owns `keys[lo..hi]` sharing a `depth`-byte
    /// prefix.
    fn expand<K: AsRef<[u8]>>(
        &mut self,
        node: u32,
        keys: &[K],
        lo: usize,
        hi: usize,
        depth: usize,
        table: &CodeTable<'_>,
    ) {
        let mut lo = lo;

        // The shortest key of the range sorts first; if it ends here the
        // node is terminal and the rest of the range continues below it.
        if keys[lo].as_ref().len() == depth {
            self.leaf_flags[node as usize] = true;
            lo += 1;
            if lo == hi {
                return;
            }
        } else if hi - lo == 1 {
            // A lone key with bytes left: divert its suffix to the tail
            // pool instead of burning one slot per byte.
            let suffix = &keys[lo].as_ref()[depth..];
            self.leaf_flags[node as usize] = true;
            self.link_flags[node as usize] = true;
            self.bases[node as usize] = self.tails.write(suffix);
            return;
        }

        let mut children: Vec<(u32, usize, usize)> = Vec::new();
        let mut i = lo;
        while i < hi {
            let b = keys[i].as_ref()[depth];
            let code = table
                .get_code(b)
                .expect("key byte missing from its own code table");
            let start = i;
            while i < hi && keys[i].as_ref()[depth] == b {
                i += 1;
            }
            children.push((code, start, i));
        }

        let base = self.find_base(&children);
        self.bases[node as usize] = base;
        for &(code, _, _) in &children {
            let slot = base ^ code;
            self.allocate(slot);
            self.checks[slot as usize] = node;
        }
        for &(code, start, end) in &children {
            self.expand(base ^ code, keys, start, end, depth + 1, table);
        }
    }

    /// First BASE (in free-list scan order) whose child slots are all
    /// free.
    fn find_base(&mut self, children: &[(u32, usize, usize)]) -> u32 {
        let first_code = children[0].0;
        loop {
            if let Some(head) = self.free_head {
                let mut f = head;
                loop {
                    let base = f ^ first_code;
                    if children.iter().all(|&(c, _, _)| {
                        let slot = (base ^ c) as usize;
                        debug_assert!(slot < self.used.len());
                        !self.used[slot]
                    }) {
                        return base;
                    }
                    f = self.next_free[f as usize];
                    if f == head {
                        break;
                    }
                }
            }
            self.grow();
        }
    }

    fn grow(&mut self) {
        let old = self.bases.len();
        let new_len = old + CHUNK;
        self.bases.resize(new_len, 0);
        self.checks.resize(new_len, NO_PARENT);
        self.used.resize(new_len, false);
        self.next_free.resize(new_len, 0);
        self.prev_free.resize(new_len, 0);
        self.leaf_flags.resize(new_len, false);
        self.link_flags.resize(new_len, false);
        for i in old..new_len {
            self.push_free(i as u32);
        }
    }

    fn push_free(&mut self, i: u32) {
        match self.free_head {
            None => {
                self.free_head = Some(i);
                self.next_free[i as usize] = i;
                self.prev_free[i as usize] = i;
            }
            Some(head) => {
                // Append before the head: the list stays in ascending
                // slot order, so scans are deterministic.
                let tail = self.prev_free[head as usize];
                self.next_free[tail as usize] = i;
                self.prev_free[i as usize] = tail;
                self.next_free[i as usize] = head;
                self.prev_free[head as usize] = i;
            }
        }
    }

    fn allocate(&mut self, i: u32) {
        debug_assert!(!self.used[i as usize]);
        let next = self.next_free[i as usize];
        let prev = self.prev_free[i as usize];
        if next == i {
            self.free_head = None;
        } else {
            self.next_free[prev as usize] = next;
            self.prev_free[next as usize] = prev;
            if self.free_head == Some(i) {
                self.free_head = Some(next);
            }
        }
        self.used[i as usize] = true;
    }

    fn freeze(self, num_keys: usize, max_length: usize, table: CodeTable<'static>) -> Trie<'static> {
        // Trailing never-used chunk space carries no information.
        let num_nodes = self
            .used
            .iter()
            .rposition(|&u| u)
            .map_or(1, |last| last + 1);

        let mut units = Vec::with_capacity(2 * num_nodes);
        for i in 0..num_nodes {
            units.push(self.bases[i]);
            units.push(self.checks[i]);
        }

        let mut leaves = BitVectorBuilder::with_capacity(num_nodes);
        let mut links = BitVectorBuilder::with_capacity(num_nodes);
        for i in 0..num_nodes {
            leaves.push(self.leaf_flags[i]);
            links.push(self.link_flags[i]);
        }

        let xcda = XcdaArray::from_parts(units, leaves.freeze(true, true), links.freeze(true, false));
        let tails = self.tails.freeze();
        debug!(
            "built dictionary: {num_keys} keys, {num_nodes} slots, max key length {max_length}"
        );
        Trie::from_parts(num_keys, max_length, table, xcda, tails)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_is_deterministic() {
        let keys = ["alpha", "beta", "betatron", "gamma"];
        let a = TrieBuilder::new().build(&keys).unwrap();
        let b = TrieBuilder::new().build(&keys).unwrap();
        assert_eq!(a.to_bytes(), b.to_bytes());
    }

    #[test]
    fn dedup_shrinks_shared_suffixes_without_changing_queries() {
        // Both branches collapse to the identical suffix "_suffix".
        let keys = ["prefix_a_suffix", "prefix_b_suffix"];
        let plain = TrieBuilder::new().build(&keys).unwrap();
        let deduped = TrieBuilder::new().dedup_tails(true).build(&keys).unwrap();

        assert!(deduped.memory_in_bytes() < plain.memory_in_bytes());
        for key in keys {
            assert_eq!(deduped.lookup(key), plain.lookup(key));
            let id = deduped.lookup(key).unwrap();
            assert_eq!(deduped.decode(id).unwrap(), key.as_bytes());
        }
    }

    #[test]
    fn unary_chains_become_tails() {
        // One branching node at the root, then two long chains.
        let keys = ["administrator", "zookeeper"];
        let trie = TrieBuilder::new().build(&keys).unwrap();
        // Root plus two tail termini is all the slots this needs, so the
        // node count stays far below the total key bytes.
        assert!(trie.num_nodes() <= 512);
        for key in keys {
            assert_eq!(
                trie.decode(trie.lookup(key).unwrap()).unwrap(),
                key.as_bytes()
            );
        }
    }
}
