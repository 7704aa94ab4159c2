//! Simple, volatile, in-memory implementations of the two pluggable persistence tiers:
//! [`KVStore`] and [`AncientStore`].

use std::{
    collections::{HashMap, HashSet},
    marker::PhantomData,
    sync::{Arc, Mutex},
};

use chainstore::store::pluggables::{
    AncientError, AncientStore, AncientTable, KVGet, KVStore, WriteBatch,
};
use chainstore::types::data_types::BlockNumber;

/// An in-memory implementation of [`KVStore`].
#[derive(Clone)]
pub(crate) struct MemDB(Arc<Mutex<HashMap<Vec<u8>, Vec<u8>>>>);

impl MemDB {
    /// Create a new, empty `MemDB`.
    pub(crate) fn new() -> MemDB {
        MemDB(Arc::new(Mutex::new(HashMap::new())))
    }
}

impl KVStore for MemDB {
    type WriteBatch = MemWriteBatch;
    type Snapshot<'a> = MemDBSnapshot<'a>;

    fn write(&mut self, wb: Self::WriteBatch) {
        let mut map = self.0.lock().unwrap();
        for (key, value) in wb.insertions {
            map.insert(key, value);
        }
        for key in wb.deletions {
            map.remove(&key);
        }
    }

    fn clear(&mut self) {
        self.0.lock().unwrap().clear();
    }

    fn snapshot<'b>(&'b self) -> MemDBSnapshot<'b> {
        MemDBSnapshot(self.0.lock().unwrap().clone(), PhantomData)
    }
}

impl KVGet for MemDB {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.0.lock().unwrap().get(key).cloned()
    }
}

// A simple implementation of [`WriteBatch`].
pub(crate) struct MemWriteBatch {
    insertions: HashMap<Vec<u8>, Vec<u8>>,
    deletions: HashSet<Vec<u8>>,
}

impl WriteBatch for MemWriteBatch {
    fn new() -> Self {
        MemWriteBatch {
            insertions: HashMap::new(),
            deletions: HashSet::new(),
        }
    }

    fn set(&mut self, key: &[u8], value: &[u8]) {
        let _ = self.deletions.remove(key);
        self.insertions.insert(key.to_vec(), value.to_vec());
    }

    fn delete(&mut self, key: &[u8]) {
        let _ = self.insertions.remove(key);
        self.deletions.insert(key.to_vec());
    }
}

/// A simple implementation of [`KVGet`] used as `KVStore::Snapshot` for `MemDB`.
pub(crate) struct MemDBSnapshot<'a>(HashMap<Vec<u8>, Vec<u8>>, PhantomData<&'a ()>);

impl KVGet for MemDBSnapshot<'_> {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.0.get(key).cloned()
    }
}

/// An in-memory implementation of [`AncientStore`].
///
/// Rows beyond the committed cursor model the freezer's not-yet-fsynced tail:
/// [`reopen`](Self::reopen) simulates a crash by dropping them, which is exactly the recovery
/// behavior required of a real implementation.
#[derive(Clone)]
pub(crate) struct MemAncient(Arc<Mutex<AncientInner>>);

struct AncientInner {
    // Committed and staged rows, in parallel per table; `items` is the committed cursor.
    tables: [Vec<Vec<u8>>; 4],
    items: u64,
}

impl MemAncient {
    /// Create a new, empty `MemAncient`.
    pub(crate) fn new() -> MemAncient {
        MemAncient(Arc::new(Mutex::new(AncientInner {
            tables: [Vec::new(), Vec::new(), Vec::new(), Vec::new()],
            items: 0,
        })))
    }

    /// Simulate an unclean shutdown followed by a reopen: staged rows vanish, committed rows
    /// survive.
    #[allow(dead_code)]
    pub(crate) fn reopen(&self) {
        let mut inner = self.0.lock().unwrap();
        let items = inner.items as usize;
        for table in inner.tables.iter_mut() {
            table.truncate(items);
        }
    }
}

fn table_index(table: AncientTable) -> usize {
    match table {
        AncientTable::Headers => 0,
        AncientTable::Bodies => 1,
        AncientTable::Receipts => 2,
        AncientTable::TotalDifficulties => 3,
    }
}

impl AncientStore for MemAncient {
    fn items(&self) -> u64 {
        self.0.lock().unwrap().items
    }

    fn get(&self, table: AncientTable, number: BlockNumber) -> Option<Vec<u8>> {
        let inner = self.0.lock().unwrap();
        if number.int() >= inner.items {
            return None;
        }
        inner.tables[table_index(table)]
            .get(number.int() as usize)
            .cloned()
    }

    fn append(
        &mut self,
        number: BlockNumber,
        header: &[u8],
        body: &[u8],
        receipts: &[u8],
        total_difficulty: &[u8],
    ) -> Result<(), AncientError> {
        let mut inner = self.0.lock().unwrap();
        let expected = inner.tables[0].len() as u64;
        if number.int() != expected {
            return Err(AncientError::UnexpectedNumber {
                expected: BlockNumber::new(expected),
                got: number,
            });
        }
        inner.tables[0].push(header.to_vec());
        inner.tables[1].push(body.to_vec());
        inner.tables[2].push(receipts.to_vec());
        inner.tables[3].push(total_difficulty.to_vec());
        Ok(())
    }

    fn commit(&mut self) -> Result<(), AncientError> {
        let mut inner = self.0.lock().unwrap();
        inner.items = inner.tables[0].len() as u64;
        Ok(())
    }

    fn truncate_to(&mut self, items: u64) -> Result<(), AncientError> {
        let mut inner = self.0.lock().unwrap();
        if items > inner.items {
            return Err(AncientError::TruncateBeyondTail {
                items: inner.items,
                requested: items,
            });
        }
        for table in inner.tables.iter_mut() {
            table.truncate(items as usize);
        }
        inner.items = items;
        Ok(())
    }
}
