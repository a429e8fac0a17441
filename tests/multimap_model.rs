use std::collections::HashMap;
use std::sync::Arc;
use std::thread;

use lockmaps::ConcurrentMultiMap;

#[derive(Debug, Clone)]
enum Op {
    Put(u8, u8),
    PutAll(u8, Vec<u8>),
    Delete(u8, u8),
    DeleteAll(u8),
    Replace(u8, Vec<u8>),
}

fn op_strategy() -> impl proptest::strategy::Strategy<Value = Op> {
    use proptest::prelude::*;
    let values = proptest::collection::vec(0u8..8, 0..4);
    prop_oneof![
        6 => (0u8..8, 0u8..8).prop_map(|(k, v)| Op::Put(k, v)),
        1 => (0u8..8, values.clone()).prop_map(|(k, vs)| Op::PutAll(k, vs)),
        3 => (0u8..8, 0u8..8).prop_map(|(k, v)| Op::Delete(k, v)),
        1 => (0u8..8).prop_map(Op::DeleteAll),
        1 => (0u8..8, values).prop_map(|(k, vs)| Op::Replace(k, vs)),
    ]
}

proptest::proptest! {
    #[test]
    fn multimap_ops_consistent(ops in proptest::collection::vec(op_strategy(), 0..128)) {
        let mut model: HashMap<String, Vec<u8>> = HashMap::new();
        let mmap: ConcurrentMultiMap<u8> = ConcurrentMultiMap::new(4);

        for op in ops {
            match op {
                Op::Put(k, v) => {
                    model.entry(k.to_string()).or_default().push(v);
                    mmap.put(k.to_string(), v);
                }
                Op::PutAll(k, vs) => {
                    model.insert(k.to_string(), vs.clone());
                    mmap.put_all(k.to_string(), vs);
                }
                Op::Delete(k, v) => {
                    let key = k.to_string();
                    if let Some(values) = model.get_mut(&key) {
                        values.retain(|x| *x != v);
                        if values.is_empty() {
                            model.remove(&key);
                        }
                    }
                    mmap.delete(&key, &v);
                    assert!(!mmap.contains_entry(&key, &v));
                }
                Op::DeleteAll(k) => {
                    let key = k.to_string();
                    let expect = model.get_mut(&key).map(std::mem::take);
                    assert_eq!(expect, mmap.delete_all(&key));
                }
                Op::Replace(k, vs) => {
                    let key = k.to_string();
                    let expect = model.get_mut(&key).map(|values| {
                        *values = vs.clone();
                        vs.clone()
                    });
                    assert_eq!(expect, mmap.replace_values(&key, vs));
                }
            }
            assert_eq!(model.len(), mmap.len());
        }

        assert!(mmap.equals(&model));
        for (k, values) in model.iter() {
            assert!(mmap.contains_key(k));
            assert_eq!(&mmap.get(k), values);
            for v in values {
                assert!(mmap.contains_entry(k, v));
                assert!(mmap.contains_value(v));
            }
        }
        let entries: HashMap<String, Vec<u8>> = mmap.entries().into_iter().collect();
        assert_eq!(entries, model);

        mmap.clear();
        assert!(mmap.is_empty());
    }
}

#[test]
fn multimap_parallel_writers_no_lost_updates() {
    const N: usize = 6;
    const M: usize = 1000;

    let mmap: Arc<ConcurrentMultiMap<usize>> = Arc::new(ConcurrentMultiMap::new(N * M));
    let handles: Vec<_> = (0..N)
        .map(|n| {
            let mmap = Arc::clone(&mmap);
            thread::spawn(move || {
                for m in 0..M {
                    mmap.put(format!("{}:{}", n, m), n * M + m);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("writer panicked");
    }

    assert_eq!(mmap.len(), N * M);
    assert_eq!(mmap.get("3:17"), [3 * M + 17]);
}

#[test]
fn multimap_readers_and_writers_interleave() {
    let mmap: Arc<ConcurrentMultiMap<usize>> = Arc::new(ConcurrentMultiMap::new(1));
    mmap.put("k", 0);

    let writer = {
        let mmap = Arc::clone(&mmap);
        thread::spawn(move || {
            for i in 1..500 {
                mmap.put("k", i);
                mmap.delete("k", &(i - 1));
            }
        })
    };
    let readers: Vec<_> = (0..4)
        .map(|_| {
            let mmap = Arc::clone(&mmap);
            thread::spawn(move || {
                for _ in 0..500 {
                    // A writer holds the lock across append and delete of a
                    // single call only, so the key may briefly hold two values.
                    let values = mmap.get("k");
                    assert!(values.len() <= 2);
                    let _ = mmap.contains_value(&0);
                }
            })
        })
        .collect();

    writer.join().expect("writer panicked");
    for reader in readers {
        reader.join().expect("reader panicked");
    }
    assert_eq!(mmap.get("k"), [499]);
}
