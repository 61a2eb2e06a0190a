use std::cell::{Cell, RefCell};

use anyhow::Result;
use bytes::Bytes;

use crate::iterator;

/// A native ordered cursor, as exposed by an embedded storage engine.
///
/// The cursor is already scoped to its key range when handed out; stepping
/// past either end of the range makes it report invalid. The slices
/// returned by `key` and `value` live in engine-owned memory that the
/// engine is free to reuse on the next cursor movement, so anything that
/// outlives a movement must be copied out first.
pub trait Cursor {
    /// Position the cursor at the first key of its range.
    fn seek_to_first(&mut self);

    /// Position the cursor at the last key of its range.
    fn seek_to_last(&mut self);

    /// Step to the next key in ascending order.
    fn next(&mut self);

    /// Step to the previous key in ascending order.
    fn prev(&mut self);

    /// Returns `true` if the cursor points at a key within its range.
    fn valid(&self) -> bool;

    /// Engine-owned bytes of the current key; defined only while valid.
    fn key(&self) -> &[u8];

    /// Engine-owned bytes of the current value; defined only while valid.
    fn value(&self) -> &[u8];

    /// The engine's sticky fault, if stepping the cursor failed.
    fn err(&self) -> Option<&anyhow::Error>;

    /// Release the engine-side handle. Called at most once.
    fn close(&mut self);
}

/// Range configuration handed to the engine when a cursor is opened.
///
/// Bounds are optional on both sides; the range is `[lower, upper)`. The
/// iterator that owns the cursor also owns this object and releases it by
/// dropping it on close.
pub struct RangeOptions {
    lower: Option<Vec<u8>>,
    upper: Option<Vec<u8>>,
}

impl RangeOptions {
    pub fn new(start: Option<&[u8]>, end: Option<&[u8]>) -> RangeOptions {
        RangeOptions {
            lower: start.map(|s| s.to_vec()),
            upper: end.map(|e| e.to_vec()),
        }
    }

    pub fn lower_bound(&self) -> Option<&[u8]> {
        self.lower.as_deref()
    }

    pub fn upper_bound(&self) -> Option<&[u8]> {
        self.upper.as_deref()
    }
}

/// The local half of the iterator contract: a native cursor presented as an
/// `iterator::Iterator`, traversing ascending or descending within the
/// cursor's range.
///
/// Construction performs the positioning step itself (`seek_to_first` for
/// ascending, `seek_to_last` for descending), so the iterator is handed to
/// the caller already positioned, or already invalid over an empty range.
///
/// Key and value bytes are copied out of engine memory lazily, on first
/// access per position, and cached until the next advance. The copy is what
/// callers get, so nothing they hold is invalidated when the engine reuses
/// its buffers on the following movement. The caches are dropped the moment
/// the iterator goes invalid, not on the next advance.
pub struct CursorIterator<C: Cursor> {
    source: Option<C>,
    opts: Option<RangeOptions>,
    reverse: bool,
    invalid: Cell<bool>,
    key: RefCell<Option<Bytes>>,
    value: RefCell<Option<Bytes>>,
}

impl<C: Cursor> CursorIterator<C> {
    pub fn new(mut source: C, opts: RangeOptions, reverse: bool) -> CursorIterator<C> {
        if !reverse {
            source.seek_to_first();
        } else {
            source.seek_to_last();
        }

        CursorIterator {
            source: Some(source),
            opts: Some(opts),
            reverse,
            invalid: Cell::new(false),
            key: RefCell::new(None),
            value: RefCell::new(None),
        }
    }

    fn invalidate(&self) {
        self.invalid.set(true);
        self.key.take();
        self.value.take();
    }

    fn assert_valid(&self) {
        if !iterator::Iterator::valid(self) {
            panic!("iterator is invalid");
        }
    }
}

impl<C: Cursor> iterator::Iterator for CursorIterator<C> {
    fn valid(&self) -> bool {
        // Once invalid, forever invalid.
        if self.invalid.get() {
            return false;
        }

        match &self.source {
            Some(source) if source.valid() => true,
            _ => {
                self.invalidate();
                false
            }
        }
    }

    fn next(&mut self) {
        self.assert_valid();

        self.key.take();
        self.value.take();

        if let Some(source) = self.source.as_mut() {
            if !self.reverse {
                source.next();
            } else {
                source.prev();
            }
        }
    }

    fn key(&self) -> Bytes {
        self.assert_valid();
        self.key
            .borrow_mut()
            .get_or_insert_with(|| {
                let source = self.source.as_ref().expect("valid iterator has a cursor");
                Bytes::copy_from_slice(source.key())
            })
            .clone()
    }

    fn value(&self) -> Bytes {
        self.assert_valid();
        self.value
            .borrow_mut()
            .get_or_insert_with(|| {
                let source = self.source.as_ref().expect("valid iterator has a cursor");
                Bytes::copy_from_slice(source.value())
            })
            .clone()
    }

    fn error(&self) -> Option<&anyhow::Error> {
        self.source.as_ref().and_then(|s| s.err())
    }

    fn close(&mut self) -> Result<()> {
        if let Some(mut source) = self.source.take() {
            source.close();
        }
        self.opts.take();
        self.key.take();
        self.value.take();
        Ok(())
    }
}
