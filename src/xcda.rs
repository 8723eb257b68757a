//! Double-array node storage with XOR transitions.
//!
//! # Theory
//!
//! A double array encodes a trie in two integer fields per slot. BASE
//! determines where a node's children live: the child of `v` on code `c`
//! sits at slot `base(v) ^ c`. CHECK stores each slot's parent, so an
//! edge is valid iff the XOR-computed slot points back at the node we
//! came from. Invalid transitions need no sentinel beyond that check,
//! and the incoming label of any node is recoverable as
//! `base(parent) ^ slot`, which is what drives `decode`.
//!
//! Two succinct bit vectors ride along:
//!
//! - leaf bits mark slots where a key ends; the rank of a leaf slot is
//!   the key's dense id, and select reverses the mapping.
//! - link bits mark slots whose BASE field holds a tail-pool offset
//!   instead of a child base (the slot is a tail terminus).
//!
//! Slots that construction left unoccupied carry the reserved parent
//! sentinel, as does the root, so no edge can validate into them.

use std::borrow::Cow;

use crate::bitvec::BitVector;
use crate::error::{Error, Result};
use crate::io::{self, ByteReader, ByteWriter};

/// Check value of the root and of unoccupied slots. Node indices are
/// bounded by the unit count, so no real parent can collide with it.
pub(crate) const NO_PARENT: u32 = u32::MAX;

/// BASE/CHECK slot vector plus the leaf and tail-link bit vectors.
pub struct XcdaArray<'a> {
    /// Two units per slot: `[base-or-link, check]`.
    units: Cow<'a, [u32]>,
    leaves: BitVector<'a>,
    links: BitVector<'a>,
}

impl<'a> XcdaArray<'a> {
    pub(crate) fn from_parts(
        units: Vec<u32>,
        leaves: BitVector<'static>,
        links: BitVector<'static>,
    ) -> XcdaArray<'static> {
        debug_assert_eq!(units.len() % 2, 0);
        debug_assert_eq!(leaves.len(), units.len() / 2);
        debug_assert_eq!(links.len(), units.len() / 2);
        XcdaArray {
            units: Cow::Owned(units),
            leaves,
            links,
        }
    }

    /// Number of slots, occupied or not.
    pub fn num_nodes(&self) -> usize {
        self.units.len() / 2
    }

    /// Number of key-terminal slots.
    pub fn num_leaves(&self) -> usize {
        self.leaves.num_ones()
    }

    #[inline]
    pub(crate) fn base(&self, u: u32) -> u32 {
        self.units[2 * u as usize]
    }

    #[inline]
    pub(crate) fn check(&self, u: u32) -> u32 {
        self.units[2 * u as usize + 1]
    }

    /// True iff a key ends at `u`.
    #[inline]
    pub(crate) fn is_leaf(&self, u: u32) -> bool {
        self.leaves.get(u as usize)
    }

    /// True iff `u` is a tail terminus (its BASE field is a pool offset).
    #[inline]
    pub(crate) fn has_link(&self, u: u32) -> bool {
        self.links.get(u as usize)
    }

    /// Tail-pool offset of a tail terminus.
    #[inline]
    pub(crate) fn link(&self, u: u32) -> u32 {
        debug_assert!(self.has_link(u));
        self.base(u)
    }

    /// Follow the edge labelled `code` out of `v`. `None` when no such
    /// edge exists; tail termini have no outgoing edges and always
    /// return `None` (their BASE field can never satisfy the check).
    #[inline]
    pub(crate) fn child(&self, v: u32, code: u32) -> Option<u32> {
        let u = self.base(v) ^ code;
        if (u as usize) < self.num_nodes() && self.check(u) == v {
            Some(u)
        } else {
            None
        }
    }

    /// The code labelling the edge into `u` from its parent.
    #[inline]
    pub(crate) fn label(&self, parent: u32, u: u32) -> u32 {
        self.base(parent) ^ u
    }

    /// Dense id of the leaf at `u`: the number of leaf slots before it.
    #[inline]
    pub(crate) fn leaf_id(&self, u: u32) -> usize {
        debug_assert!(self.is_leaf(u));
        self.leaves.rank1(u as usize)
    }

    /// Slot of the id-th leaf, `None` when `id` is out of range.
    #[inline]
    pub(crate) fn leaf_pos(&self, id: usize) -> Option<u32> {
        self.leaves.select1(id).map(|pos| pos as u32)
    }

    pub(crate) fn into_owned(self) -> XcdaArray<'static> {
        XcdaArray {
            units: Cow::Owned(self.units.into_owned()),
            leaves: self.leaves.into_owned(),
            links: self.links.into_owned(),
        }
    }

    pub(crate) fn serialized_len(&self) -> usize {
        io::u32_section_len(self.units.len())
            + self.leaves.serialized_len()
            + self.links.serialized_len()
    }

    pub(crate) fn write_into(&self, w: &mut ByteWriter) {
        w.put_u32_section(&self.units);
        self.leaves.write_into(w);
        self.links.write_into(w);
    }

    pub(crate) fn read(r: &mut ByteReader<'a>, zero_copy: bool) -> Result<XcdaArray<'a>> {
        let units = r.get_u32_section(zero_copy)?;
        let leaves = BitVector::read(r, zero_copy)?;
        let links = BitVector::read(r, zero_copy)?;
        if units.is_empty() || units.len() % 2 != 0 {
            return Err(Error::CorruptData(format!(
                "unit vector holds {} entries, expected a positive even count",
                units.len()
            )));
        }
        let num_nodes = units.len() / 2;
        if leaves.len() != num_nodes || links.len() != num_nodes {
            return Err(Error::CorruptData(
                "leaf/link bit vectors do not cover the unit vector".into(),
            ));
        }
        Ok(XcdaArray {
            units,
            leaves,
            links,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitvec::BitVectorBuilder;

    fn bits(pattern: &[bool], select: bool) -> BitVector<'static> {
        let mut b = BitVectorBuilder::new();
        for &bit in pattern {
            b.push(bit);
        }
        b.freeze(true, select)
    }

    /// Root with two children on codes 1 and 2, both terminal.
    fn tiny() -> XcdaArray<'static> {
        let units = vec![
            0, NO_PARENT, // slot 0: root, base 0
            0, 0, // slot 1: child on code 1
            0, 0, // slot 2: child on code 2
            0, NO_PARENT, // slot 3: free
        ];
        XcdaArray::from_parts(
            units,
            bits(&[false, true, true, false], true),
            bits(&[false, false, false, false], false),
        )
    }

    #[test]
    fn transitions_validate_via_check() {
        let x = tiny();
        assert_eq!(x.child(0, 1), Some(1));
        assert_eq!(x.child(0, 2), Some(2));
        assert_eq!(x.child(0, 3), None);
        assert_eq!(x.child(1, 1), None);
    }

    #[test]
    fn leaf_rank_and_select_are_inverse() {
        let x = tiny();
        assert_eq!(x.num_leaves(), 2);
        assert_eq!(x.leaf_id(1), 0);
        assert_eq!(x.leaf_id(2), 1);
        assert_eq!(x.leaf_pos(0), Some(1));
        assert_eq!(x.leaf_pos(1), Some(2));
        assert_eq!(x.leaf_pos(2), None);
    }

    #[test]
    fn labels_recover_codes() {
        let x = tiny();
        assert_eq!(x.label(0, 1), 1);
        assert_eq!(x.label(0, 2), 2);
    }
}
