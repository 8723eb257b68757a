#![no_main]
use libfuzzer_sys::fuzz_target;
use xdart::Trie;

fuzz_target!(|data: Vec<Vec<u8>>| {
    let mut keys = data;
    keys.sort();
    keys.dedup();
    if keys.is_empty() {
        return;
    }

    let trie = Trie::from_keys(&keys).expect("sorted distinct keys must build");
    assert_eq!(trie.num_keys(), keys.len());

    // Every key resolves, decodes back, and the ids are a bijection.
    let mut seen = vec![false; keys.len()];
    for key in &keys {
        let id = trie.lookup(key).expect("stored key must resolve");
        assert!(id < keys.len());
        assert!(!seen[id]);
        seen[id] = true;
        assert_eq!(&trie.decode(id).unwrap(), key);
    }

    // Enumeration yields exactly the sorted input.
    let mut it = trie.enumerative_iter();
    for key in &keys {
        assert!(it.next());
        assert_eq!(it.decoded(), key.as_slice());
    }
    assert!(!it.next());

    // A serialized round trip answers identically.
    let bytes = trie.to_bytes();
    assert_eq!(bytes.len(), trie.memory_in_bytes());
    let loaded = Trie::from_bytes(&bytes).unwrap();
    for key in &keys {
        assert_eq!(loaded.lookup(key), trie.lookup(key));
    }
});
