use anyhow::Result;
use bytes::Bytes;

/// A cursor over an ordered sequence of key/value pairs.
///
/// Iterators traverse a byte-ordered key space in one direction, fixed at
/// construction, within an optional `[start, end)` bound. They are produced
/// by a backend, an embedded engine or a remote peer, and consumed by
/// range-query code that never learns which backend it is talking to.
///
/// An iterator is "valid" while it points at a key/value pair. It is
/// constructed already positioned at the first pair of its range (or
/// immediately invalid if the range is empty), so no seek is required
/// before the first read. Once invalid, whether from exhausting the range
/// or from an underlying fault, it never becomes valid again; `error`
/// distinguishes the two.
///
/// `key`, `value`, and `next` will panic if the iterator is not valid.
/// Calling them while invalid is a bug in the caller, not a recoverable
/// condition, and is reported loudly rather than with stale or empty data.
///
/// Iterators are single-owner: they provide no internal locking and exactly
/// one consumer drives them from construction to `close`.
pub trait Iterator {
    /// Returns `true` while the iterator points at a key/value pair.
    ///
    /// Returning `false` means the iterator is finished for good; check
    /// `error` to tell exhaustion from a fault.
    fn valid(&self) -> bool;

    /// Advance to the next pair in the iteration order.
    ///
    /// Either lands on exactly one new pair or renders the iterator
    /// permanently invalid. For remote backends this is the sole blocking
    /// point: it suspends the calling thread until the peer answers.
    ///
    /// # Panics
    ///
    /// If the iterator is not valid.
    fn next(&mut self);

    /// The key at the current position.
    ///
    /// The returned bytes are an independently owned handle; they stay
    /// intact when the iterator advances or closes.
    ///
    /// # Panics
    ///
    /// If the iterator is not valid.
    fn key(&self) -> Bytes;

    /// The value at the current position.
    ///
    /// Same ownership rules as `key`.
    ///
    /// # Panics
    ///
    /// If the iterator is not valid.
    fn value(&self) -> Bytes;

    /// The sticky fault that stopped the iteration, if any.
    ///
    /// `None` does not imply more data remains; an exhausted iterator also
    /// reports `None`. Once set, the fault is never cleared.
    fn error(&self) -> Option<&anyhow::Error>;

    /// Release the iterator's resources.
    ///
    /// What this does is backend-specific: local iterators free their
    /// cursor and range configuration, the forward remote iterator
    /// half-closes its send side so the peer can tear down, and the reverse
    /// remote iterator does nothing because the peer owns that stream's
    /// lifetime. A close-time failure is returned to the caller but the
    /// iterator is already finished either way. No further operations are
    /// defined after `close`.
    fn close(&mut self) -> Result<()>;
}
