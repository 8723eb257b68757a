use std::collections::BTreeSet;

use proptest::prelude::*;
use zerocopy::IntoBytes;

use xdart::bitvec::BitVectorBuilder;
use xdart::Trie;

proptest! {
    #[test]
    fn bitvector_rank_select_laws(
        bits in prop::collection::vec(any::<bool>(), 1..3000),
    ) {
        let mut b = BitVectorBuilder::with_capacity(bits.len());
        for &bit in &bits {
            b.push(bit);
        }
        let bv = b.freeze(true, true);

        // rank1 counts exactly; select1 inverts it at every set bit.
        let mut ones = 0;
        for (i, &bit) in bits.iter().enumerate() {
            prop_assert_eq!(bv.rank1(i), ones);
            prop_assert_eq!(bv.get(i), bit);
            if bit {
                prop_assert_eq!(bv.select1(ones), Some(i));
                ones += 1;
            }
        }
        prop_assert_eq!(bv.rank1(bits.len()), ones);
        prop_assert_eq!(bv.num_ones(), ones);
        prop_assert_eq!(bv.select1(ones), None);
    }
}

fn key_sets() -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::btree_set(prop::collection::vec(any::<u8>(), 0..12), 1..80)
        .prop_map(|set| set.into_iter().collect())
}

/// Copy serialized bytes into 8-byte-aligned storage for the mmap path.
fn aligned(bytes: &[u8]) -> Vec<u64> {
    assert_eq!(bytes.len() % 8, 0);
    let mut words = vec![0u64; bytes.len() / 8];
    words.as_mut_slice().as_mut_bytes().copy_from_slice(bytes);
    words
}

proptest! {
    #[test]
    fn lookup_and_decode_form_a_bijection(keys in key_sets()) {
        let trie = Trie::from_keys(&keys).unwrap();
        prop_assert_eq!(trie.num_keys(), keys.len());

        let mut seen = vec![false; keys.len()];
        for key in &keys {
            let id = trie.lookup(key).unwrap();
            prop_assert!(id < keys.len());
            prop_assert!(!seen[id], "id {} assigned twice", id);
            seen[id] = true;
            prop_assert_eq!(&trie.decode(id).unwrap(), key);
        }
    }

    #[test]
    fn absent_keys_look_up_to_none(
        keys in key_sets(),
        probes in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..14), 1..20),
    ) {
        let set: BTreeSet<&Vec<u8>> = keys.iter().collect();
        let trie = Trie::from_keys(&keys).unwrap();
        for probe in &probes {
            if !set.contains(probe) {
                prop_assert_eq!(trie.lookup(probe), None);
            }
        }
    }

    #[test]
    fn prefix_iteration_is_sound_and_complete(
        keys in key_sets(),
        query in prop::collection::vec(any::<u8>(), 0..14),
    ) {
        let trie = Trie::from_keys(&keys).unwrap();
        let expected: Vec<&Vec<u8>> =
            keys.iter().filter(|k| query.starts_with(k)).collect();

        let mut it = trie.prefix_iter(&query);
        let mut got = Vec::new();
        let mut last_len = None;
        while it.next() {
            prop_assert_eq!(trie.lookup(it.decoded()), Some(it.id()));
            if let Some(prev) = last_len {
                prop_assert!(it.decoded().len() > prev, "lengths must strictly grow");
            }
            last_len = Some(it.decoded().len());
            got.push(it.decoded().to_vec());
        }
        prop_assert!(!it.next());
        let expected: Vec<Vec<u8>> = expected.into_iter().cloned().collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn predictive_iteration_is_sound_and_complete(
        keys in key_sets(),
        query in prop::collection::vec(any::<u8>(), 0..6),
    ) {
        let trie = Trie::from_keys(&keys).unwrap();
        // Input keys are sorted, so the filtered list is already in
        // lexicographic order.
        let expected: Vec<Vec<u8>> = keys
            .iter()
            .filter(|k| k.starts_with(&query))
            .cloned()
            .collect();

        let mut it = trie.predictive_iter(&query);
        let mut got = Vec::new();
        while it.next() {
            prop_assert_eq!(trie.lookup(it.decoded()), Some(it.id()));
            got.push(it.decoded().to_vec());
        }
        prop_assert!(!it.next());
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn enumeration_equals_sorted_input(keys in key_sets()) {
        let trie = Trie::from_keys(&keys).unwrap();
        let mut it = trie.enumerative_iter();
        let mut got = Vec::new();
        while it.next() {
            got.push(it.decoded().to_vec());
        }
        prop_assert_eq!(got, keys);
    }

    #[test]
    fn serialization_preserves_every_query(keys in key_sets()) {
        let trie = Trie::from_keys(&keys).unwrap();
        let bytes = trie.to_bytes();
        prop_assert_eq!(bytes.len(), trie.memory_in_bytes());

        let loaded = Trie::from_bytes(&bytes).unwrap();
        let words = aligned(&bytes);
        let mapped = Trie::mmap(words.as_slice().as_bytes()).unwrap();

        prop_assert_eq!(loaded.memory_in_bytes(), trie.memory_in_bytes());
        prop_assert_eq!(mapped.memory_in_bytes(), trie.memory_in_bytes());
        for other in [&loaded, &mapped] {
            prop_assert_eq!(other.num_keys(), trie.num_keys());
            prop_assert_eq!(other.max_length(), trie.max_length());
            prop_assert_eq!(other.bin_mode(), trie.bin_mode());
            prop_assert_eq!(other.alphabet_size(), trie.alphabet_size());
            for key in &keys {
                let id = other.lookup(key).unwrap();
                prop_assert_eq!(Some(id), trie.lookup(key));
                prop_assert_eq!(&other.decode(id).unwrap(), key);
            }
        }
    }
}
