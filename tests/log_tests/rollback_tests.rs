use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use seqlog::config::{Config, SyncStrategy};
use seqlog::log::{LogFile, ReadAt};
use seqlog::{AppendLog, SeqLogError};

// =============================================================================
// Failure-Injecting Backing File
// =============================================================================

/// In-memory log file whose writes, truncates and syncs can be made to fail.
/// Clones share the same bytes and switches.
#[derive(Clone, Default)]
struct FlakyFile {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    data: RwLock<Vec<u8>>,
    /// Next write stores this many bytes, then fails
    fail_write_after: Mutex<Option<usize>>,
    fail_truncate: AtomicBool,
    fail_sync: AtomicBool,
}

impl FlakyFile {
    fn contents(&self) -> Vec<u8> {
        self.inner.data.read().clone()
    }

    fn fail_next_write_after(&self, bytes: usize) {
        *self.inner.fail_write_after.lock() = Some(bytes);
    }

    fn fail_truncate(&self, fail: bool) {
        self.inner.fail_truncate.store(fail, Ordering::SeqCst);
    }

    fn fail_sync(&self, fail: bool) {
        self.inner.fail_sync.store(fail, Ordering::SeqCst);
    }
}

impl ReadAt for FlakyFile {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        self.inner.data.read().as_slice().read_at(buf, offset)
    }
}

impl LogFile for FlakyFile {
    fn size(&self) -> io::Result<u64> {
        Ok(self.inner.data.read().len() as u64)
    }

    fn write_all_at(&self, buf: &[u8], offset: u64) -> io::Result<()> {
        let limit = self.inner.fail_write_after.lock().take();
        let written = limit.map_or(buf.len(), |n| n.min(buf.len()));

        let mut data = self.inner.data.write();
        let offset = offset as usize;
        if data.len() < offset + written {
            data.resize(offset + written, 0);
        }
        data[offset..offset + written].copy_from_slice(&buf[..written]);

        match limit {
            Some(_) => Err(io::Error::new(io::ErrorKind::Other, "disk full")),
            None => Ok(()),
        }
    }

    fn truncate(&self, len: u64) -> io::Result<()> {
        if self.inner.fail_truncate.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::Other, "truncate refused"));
        }
        self.inner.data.write().resize(len as usize, 0);
        Ok(())
    }

    fn sync_data(&self) -> io::Result<()> {
        if self.inner.fail_sync.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::Other, "sync failed"));
        }
        Ok(())
    }
}

fn setup_flaky_log(strategy: SyncStrategy) -> (FlakyFile, AppendLog<FlakyFile>) {
    let file = FlakyFile::default();
    let config = Config::builder().sync_strategy(strategy).build();
    let log = AppendLog::with_file(file.clone(), config).unwrap();
    (file, log)
}

// =============================================================================
// Rollback Tests
// =============================================================================

#[test]
fn test_partial_write_is_rolled_back() {
    let (file, log) = setup_flaky_log(SyncStrategy::OsManaged);
    log.insert(b"a").unwrap();
    log.insert(b"b").unwrap();
    let before = file.contents();

    file.fail_next_write_after(3);
    let err = log.insert(b"c").unwrap_err();

    assert!(matches!(err, SeqLogError::Io(_)));
    assert_eq!(file.contents(), before);
    assert_eq!(log.len(), before.len() as u64);
    assert_eq!(log.get(2).unwrap(), None);
}

#[test]
fn test_key_is_reused_after_failed_insert() {
    let (file, log) = setup_flaky_log(SyncStrategy::OsManaged);
    log.insert(b"a").unwrap();

    file.fail_next_write_after(0);
    assert!(log.insert(b"lost").is_err());

    assert_eq!(log.insert(b"b").unwrap(), 1);
    assert_eq!(log.get(0).unwrap(), Some(b"a".to_vec()));
    assert_eq!(log.get(1).unwrap(), Some(b"b".to_vec()));
    assert_eq!(file.contents(), b"0 YQ==\n1 Yg==\n");
}

#[test]
fn test_failed_truncate_reports_both_errors() {
    let (file, log) = setup_flaky_log(SyncStrategy::OsManaged);
    log.insert(b"a").unwrap();

    file.fail_next_write_after(2);
    file.fail_truncate(true);

    match log.insert(b"b") {
        Err(SeqLogError::Rollback { write, truncate }) => {
            assert_eq!(write.to_string(), "disk full");
            assert_eq!(truncate.to_string(), "truncate refused");
        }
        other => panic!("Expected rollback error, got {:?}", other),
    }

    // The partial bytes stay on disk, but readers never look past them
    assert_eq!(file.contents(), b"0 YQ==\n1 ");
    assert_eq!(log.len(), 7);
    assert_eq!(log.get(0).unwrap(), Some(b"a".to_vec()));
    assert_eq!(log.get(1).unwrap(), None);
}

#[test]
fn test_sync_failure_rolls_back() {
    let (file, log) = setup_flaky_log(SyncStrategy::EveryWrite);
    log.insert(b"a").unwrap();

    file.fail_sync(true);
    assert!(matches!(log.insert(b"b"), Err(SeqLogError::Io(_))));
    assert_eq!(file.contents(), b"0 YQ==\n");

    file.fail_sync(false);
    assert_eq!(log.insert(b"b").unwrap(), 1);
}

#[test]
fn test_every_n_entries_syncs_on_schedule() {
    let (file, log) = setup_flaky_log(SyncStrategy::EveryNEntries { count: 3 });

    // Sync only runs on the third insert, so the first two succeed
    file.fail_sync(true);
    assert_eq!(log.insert(b"a").unwrap(), 0);
    assert_eq!(log.insert(b"b").unwrap(), 1);
    assert!(log.insert(b"c").is_err());

    file.fail_sync(false);
    assert_eq!(log.insert(b"c").unwrap(), 2);
    assert_eq!(log.get(2).unwrap(), Some(b"c".to_vec()));
}
