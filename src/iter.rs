//! Streaming query iterators.
//!
//! All three query shapes share the same calling convention: construct,
//! then drive with `next()` and read the current match through `id()`
//! and `decoded()`.
//!
//! ```
//! # use xdart::Trie;
//! let trie = Trie::from_keys(&["Mac", "MacBook", "iMac"]).unwrap();
//! let mut it = trie.predictive_iter(b"Mac");
//! while it.next() {
//!     println!("{} -> {:?}", it.id(), it.decoded());
//! }
//! ```
//!
//! Iterators are single-pass and non-restartable; `next()` keeps
//! returning `false` once the result set is exhausted. `decoded()` is a
//! view that the following `next()` call invalidates. No per-step
//! allocation happens beyond the one reusable key buffer.

use crate::trie::Trie;

/// Yields the stored keys that are prefixes of a query, shortest first.
///
/// At most `query.len() + 1` results exist (one per query position,
/// counting the empty key), and they appear in strictly increasing
/// length order.
pub struct PrefixIter<'t, 'k> {
    trie: &'t Trie<'t>,
    query: &'k [u8],
    node: u32,
    pos: usize,
    check_terminal: bool,
    done: bool,
    id: usize,
    key_len: usize,
}

impl<'t, 'k> PrefixIter<'t, 'k> {
    pub(crate) fn new(trie: &'t Trie<'t>, query: &'k [u8]) -> Self {
        Self {
            trie,
            query,
            node: 0,
            pos: 0,
            check_terminal: true,
            done: false,
            id: 0,
            key_len: 0,
        }
    }

    /// Advance to the next match; `false` once exhausted.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> bool {
        while !self.done {
            if self.check_terminal {
                self.check_terminal = false;
                let xcda = self.trie.xcda();
                if xcda.has_link(self.node) {
                    // The stored key is this path plus its tail; it can
                    // only match if the tail sits inside the query.
                    self.done = true;
                    let tail = self.trie.tails().tail(xcda.link(self.node));
                    if self.query[self.pos..].starts_with(tail) {
                        self.id = xcda.leaf_id(self.node);
                        self.key_len = self.pos + tail.len();
                        return true;
                    }
                    return false;
                }
                if xcda.is_leaf(self.node) {
                    self.id = xcda.leaf_id(self.node);
                    self.key_len = self.pos;
                    return true;
                }
            }
            if self.pos == self.query.len() {
                self.done = true;
                break;
            }
            let Some(code) = self.trie.table().get_code(self.query[self.pos]) else {
                self.done = true;
                break;
            };
            let Some(child) = self.trie.xcda().child(self.node, code) else {
                self.done = true;
                break;
            };
            self.node = child;
            self.pos += 1;
            self.check_terminal = true;
        }
        false
    }

    /// Id of the current match.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Bytes of the current match: a prefix view of the query.
    pub fn decoded(&self) -> &'k [u8] {
        &self.query[..self.key_len]
    }
}

/// One pending subtree of the predictive depth-first walk.
struct Frame {
    node: u32,
    /// Key length before this node's incoming label.
    depth: u32,
    label: u8,
    /// The descent frame re-enters a node whose label is already in the
    /// buffer; child frames append theirs.
    push_label: bool,
}

/// Yields the stored keys extending a query, in lexicographic order.
///
/// With an empty query this enumerates the whole dictionary, which is
/// what [`Trie::enumerative_iter`] constructs.
pub struct PredictiveIter<'t, 'k> {
    trie: &'t Trie<'t>,
    query: &'k [u8],
    stack: Vec<Frame>,
    buf: Vec<u8>,
    started: bool,
    done: bool,
    id: usize,
}

impl<'t, 'k> PredictiveIter<'t, 'k> {
    pub(crate) fn new(trie: &'t Trie<'t>, query: &'k [u8]) -> Self {
        Self {
            trie,
            query,
            stack: Vec::new(),
            buf: Vec::with_capacity(trie.max_length()),
            started: false,
            done: false,
            id: 0,
        }
    }

    /// Advance to the next match; `false` once exhausted.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> bool {
        if self.done {
            return false;
        }
        if !self.started {
            self.started = true;
            if !self.descend() {
                self.done = true;
                return false;
            }
        }

        let xcda = self.trie.xcda();
        while let Some(frame) = self.stack.pop() {
            self.buf.truncate(frame.depth as usize);
            if frame.push_label {
                self.buf.push(frame.label);
            }
            let node = frame.node;

            if xcda.has_link(node) {
                // Tail termini have no out-edges; emit and move on.
                self.buf
                    .extend_from_slice(self.trie.tails().tail(xcda.link(node)));
                self.id = xcda.leaf_id(node);
                return true;
            }

            // Push children in reverse code order so the smallest pops
            // first; code order equals byte order by construction.
            let depth = self.buf.len() as u32;
            for code in (0..self.trie.alphabet_size()).rev() {
                if let Some(child) = xcda.child(node, code) {
                    self.stack.push(Frame {
                        node: child,
                        depth,
                        label: self.trie.table().get_byte(code),
                        push_label: true,
                    });
                }
            }

            if xcda.is_leaf(node) {
                self.id = xcda.leaf_id(node);
                return true;
            }
        }
        self.done = true;
        false
    }

    /// Walk the query from the root; seed the stack with the deepest
    /// matching node. A query that dies inside the trie, or inside a
    /// tail it does not prefix, has no results.
    fn descend(&mut self) -> bool {
        let xcda = self.trie.xcda();
        let mut node = 0u32;
        for (pos, &b) in self.query.iter().enumerate() {
            if xcda.has_link(node) {
                let tail = self.trie.tails().tail(xcda.link(node));
                if !tail.starts_with(&self.query[pos..]) {
                    return false;
                }
                self.buf.extend_from_slice(&self.query[..pos]);
                self.stack.push(Frame {
                    node,
                    depth: pos as u32,
                    label: 0,
                    push_label: false,
                });
                return true;
            }
            let Some(code) = self.trie.table().get_code(b) else {
                return false;
            };
            let Some(child) = xcda.child(node, code) else {
                return false;
            };
            node = child;
        }
        self.buf.extend_from_slice(self.query);
        self.stack.push(Frame {
            node,
            depth: self.query.len() as u32,
            label: 0,
            push_label: false,
        });
        true
    }

    /// Id of the current match.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Bytes of the current match; invalidated by the next `next()`.
    pub fn decoded(&self) -> &[u8] {
        &self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Trie<'static> {
        Trie::from_keys(&["a", "ab", "abc", "b", "bcd"]).unwrap()
    }

    #[test]
    fn prefix_results_grow_strictly() {
        let trie = sample();
        let mut it = trie.prefix_iter(b"abcd");
        let mut found = Vec::new();
        while it.next() {
            found.push(it.decoded().to_vec());
        }
        assert_eq!(found, vec![b"a".to_vec(), b"ab".to_vec(), b"abc".to_vec()]);
        assert!(!it.next());
    }

    #[test]
    fn prefix_of_absent_query_stops_at_dead_end() {
        let trie = sample();
        let mut it = trie.prefix_iter(b"azz");
        assert!(it.next());
        assert_eq!(it.decoded(), b"a");
        assert!(!it.next());
    }

    #[test]
    fn predictive_results_are_lexicographic() {
        let trie = sample();
        let mut it = trie.predictive_iter(b"a");
        let mut found = Vec::new();
        while it.next() {
            assert_eq!(trie.lookup(it.decoded()), Some(it.id()));
            found.push(it.decoded().to_vec());
        }
        assert_eq!(found, vec![b"a".to_vec(), b"ab".to_vec(), b"abc".to_vec()]);
    }

    #[test]
    fn predictive_enters_tails() {
        let trie = sample();
        let mut it = trie.predictive_iter(b"bc");
        assert!(it.next());
        assert_eq!(it.decoded(), b"bcd");
        assert!(!it.next());
    }

    #[test]
    fn enumeration_matches_input_order() {
        let trie = sample();
        let mut it = trie.enumerative_iter();
        let mut found = Vec::new();
        while it.next() {
            found.push(it.decoded().to_vec());
        }
        let expected: Vec<Vec<u8>> = ["a", "ab", "abc", "b", "bcd"]
            .iter()
            .map(|s| s.as_bytes().to_vec())
            .collect();
        assert_eq!(found, expected);
    }

    #[test]
    fn empty_query_on_empty_key() {
        let trie = Trie::from_keys(&[""]).unwrap();
        let mut it = trie.predictive_iter(b"");
        assert!(it.next());
        assert_eq!(it.decoded(), b"");
        assert_eq!(it.id(), 0);
        assert!(!it.next());
    }
}
