use std::ops::Bound;
use std::sync::Arc;

use anyhow::{bail, Result};
use crossbeam_skiplist::map::Entry;
use crossbeam_skiplist::SkipMap;

use crate::{
    cursor::{Cursor, CursorIterator, RangeOptions},
    db::Db,
    error::Error,
    iterator,
};

/// An in-process ordered engine over a lock-free skiplist.
///
/// The map itself may be shared across threads; each cursor opened on it is
/// single-owner. Reads copy out of the map, so nothing handed to callers
/// aliases live engine memory.
pub struct MemDb {
    sl: Arc<SkipMap<Vec<u8>, Vec<u8>>>,
}

impl MemDb {
    pub fn new() -> MemDb {
        MemDb {
            sl: Arc::new(SkipMap::new()),
        }
    }

    /// Open a native cursor scoped to the bounds in `opts`. The cursor
    /// starts unpositioned; seek it before reading.
    pub fn cursor(&self, opts: &RangeOptions) -> MemCursor {
        MemCursor {
            sl: Arc::clone(&self.sl),
            lower: opts.lower_bound().map(|b| b.to_vec()),
            upper: opts.upper_bound().map(|b| b.to_vec()),
            key: Vec::new(),
            value: Vec::new(),
            valid: false,
        }
    }
}

impl Default for MemDb {
    fn default() -> MemDb {
        MemDb::new()
    }
}

impl Db for MemDb {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        if key.is_empty() {
            bail!(Error::EmptyKey)
        }
        Ok(self.sl.get(key).map(|e| e.value().clone()))
    }

    fn has(&self, key: &[u8]) -> Result<bool> {
        if key.is_empty() {
            bail!(Error::EmptyKey)
        }
        Ok(self.sl.contains_key(key))
    }

    fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        if key.is_empty() {
            bail!(Error::EmptyKey)
        }
        self.sl.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        if key.is_empty() {
            bail!(Error::EmptyKey)
        }
        self.sl.remove(key);
        Ok(())
    }

    fn iterator(
        &self,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
    ) -> Result<Box<dyn iterator::Iterator>> {
        let opts = RangeOptions::new(start, end);
        let source = self.cursor(&opts);
        Ok(Box::new(CursorIterator::new(source, opts, false)))
    }

    fn reverse_iterator(
        &self,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
    ) -> Result<Box<dyn iterator::Iterator>> {
        let opts = RangeOptions::new(start, end);
        let source = self.cursor(&opts);
        Ok(Box::new(CursorIterator::new(source, opts, true)))
    }
}

/// The engine's native cursor over a `[start, end)` slice of the map.
///
/// Position is tracked by owned current-key; each step re-resolves the
/// neighbor against the live map, so the cursor tolerates concurrent
/// writes without pinning map internals. The current pair sits in internal
/// buffers that are overwritten on every movement, which is exactly the
/// transient-buffer contract `CursorIterator` copies out of.
pub struct MemCursor {
    sl: Arc<SkipMap<Vec<u8>, Vec<u8>>>,
    lower: Option<Vec<u8>>,
    upper: Option<Vec<u8>>,
    key: Vec<u8>,
    value: Vec<u8>,
    valid: bool,
}

impl MemCursor {
    fn in_range(&self, key: &[u8]) -> bool {
        if let Some(lower) = &self.lower {
            if key < lower.as_slice() {
                return false;
            }
        }
        if let Some(upper) = &self.upper {
            if key >= upper.as_slice() {
                return false;
            }
        }
        true
    }

    fn load(&mut self, entry: Option<Entry<'_, Vec<u8>, Vec<u8>>>) {
        match entry {
            Some(e) if self.in_range(e.key()) => {
                self.key.clear();
                self.key.extend_from_slice(e.key());
                self.value.clear();
                self.value.extend_from_slice(e.value());
                self.valid = true;
            }
            _ => {
                self.key.clear();
                self.value.clear();
                self.valid = false;
            }
        }
    }
}

impl Cursor for MemCursor {
    fn seek_to_first(&mut self) {
        let sl = Arc::clone(&self.sl);
        let entry = match &self.lower {
            Some(lower) => sl.lower_bound(Bound::Included(lower.as_slice())),
            None => sl.front(),
        };
        self.load(entry);
    }

    fn seek_to_last(&mut self) {
        let sl = Arc::clone(&self.sl);
        let entry = match &self.upper {
            Some(upper) => sl.upper_bound(Bound::Excluded(upper.as_slice())),
            None => sl.back(),
        };
        self.load(entry);
    }

    fn next(&mut self) {
        if !self.valid {
            return;
        }
        let sl = Arc::clone(&self.sl);
        let entry = sl.lower_bound(Bound::Excluded(self.key.as_slice()));
        self.load(entry);
    }

    fn prev(&mut self) {
        if !self.valid {
            return;
        }
        let sl = Arc::clone(&self.sl);
        let entry = sl.upper_bound(Bound::Excluded(self.key.as_slice()));
        self.load(entry);
    }

    fn valid(&self) -> bool {
        self.valid
    }

    fn key(&self) -> &[u8] {
        &self.key
    }

    fn value(&self) -> &[u8] {
        &self.value
    }

    fn err(&self) -> Option<&anyhow::Error> {
        None
    }

    fn close(&mut self) {
        self.valid = false;
        self.key.clear();
        self.value.clear();
    }
}
