use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use seqlog::AppendLog;
use tempfile::TempDir;

const WRITERS: usize = 4;
const INSERTS_PER_WRITER: usize = 100;
const READERS: usize = 4;

#[test]
fn test_concurrent_inserts_allocate_unique_dense_keys() {
    let temp_dir = TempDir::new().unwrap();
    let log = Arc::new(AppendLog::open(temp_dir.path().join("store.log")).unwrap());

    let handles: Vec<_> = (0..WRITERS)
        .map(|t| {
            let log = Arc::clone(&log);
            thread::spawn(move || {
                (0..INSERTS_PER_WRITER)
                    .map(|i| {
                        let value = format!("writer{}-item{}", t, i).into_bytes();
                        (log.insert(&value).unwrap(), value)
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut expected: HashMap<u64, Vec<u8>> = HashMap::new();
    for handle in handles {
        for (key, value) in handle.join().unwrap() {
            assert!(expected.insert(key, value).is_none(), "key {} issued twice", key);
        }
    }

    let total = (WRITERS * INSERTS_PER_WRITER) as u64;
    assert_eq!(expected.len() as u64, total);
    for key in 0..total {
        assert_eq!(log.get(key).unwrap().as_ref(), expected.get(&key));
    }
    assert_eq!(log.get(total).unwrap(), None);
}

#[test]
fn test_readers_never_see_partial_records() {
    let temp_dir = TempDir::new().unwrap();
    let log = Arc::new(AppendLog::open(temp_dir.path().join("store.log")).unwrap());
    let done = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..READERS)
        .map(|_| {
            let log = Arc::clone(&log);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut highest_seen = 0u64;
                while !done.load(Ordering::Acquire) {
                    // Keys are dense, so every key below a visible one is visible too
                    let mut key = 0u64;
                    while let Some(value) = log.get(key).unwrap() {
                        assert_eq!(value, key.to_string().repeat(3).into_bytes());
                        key += 1;
                    }
                    assert!(key >= highest_seen, "log shrank from {} to {}", highest_seen, key);
                    highest_seen = key;
                }
            })
        })
        .collect();

    for i in 0..300u64 {
        assert_eq!(log.insert(i.to_string().repeat(3).as_bytes()).unwrap(), i);
    }
    done.store(true, Ordering::Release);

    for reader in readers {
        reader.join().unwrap();
    }
}
