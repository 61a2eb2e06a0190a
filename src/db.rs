use anyhow::Result;

use crate::iterator::Iterator;

/// The backend facade range-query code is written against.
///
/// A backend is anything that can answer point reads, accept point writes,
/// and hand out iterators over a `[start, end)` key range, whether an
/// embedded engine or a connection to a remote peer. Callers validate
/// their range keys before asking for an iterator; the backend does not
/// re-check them.
pub trait Db {
    /// Fetch the value stored under `key`, if any.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Returns `true` if `key` is present.
    fn has(&self, key: &[u8]) -> Result<bool>;

    /// Store `value` under `key`, replacing any existing value.
    fn set(&self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Remove `key` if present.
    fn delete(&self, key: &[u8]) -> Result<()>;

    /// An ascending iterator over `[start, end)`, unbounded on either side
    /// where `None`. The iterator is primed: it is already positioned at
    /// the first pair, or invalid if the range is empty.
    fn iterator(&self, start: Option<&[u8]>, end: Option<&[u8]>)
        -> Result<Box<dyn Iterator>>;

    /// A descending iterator over `[start, end)`; same contract otherwise.
    fn reverse_iterator(
        &self,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
    ) -> Result<Box<dyn Iterator>>;
}
