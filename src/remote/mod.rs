pub mod stream;

use anyhow::Result;
use bytes::Bytes;

use crate::{iterator, pb};

/// Client half of a forward range stream.
///
/// Each `recv` corresponds to one message from the peer; it blocks the
/// calling thread until a pair, the end-of-data marker, or a transport
/// fault arrives. `close_send` half-closes the send direction so the peer
/// can release its side of the stream.
pub trait IteratorClient {
    fn recv(&mut self) -> Result<pb::Pair>;
    fn close_send(&mut self) -> Result<()>;
}

/// Client half of a reverse range stream.
///
/// Reverse streams are server-driven: the peer owns the stream lifetime,
/// and the client has no send direction, hence no `close_send` here.
pub trait ReverseIteratorClient {
    fn recv(&mut self) -> Result<pb::Pair>;
}

/// Forward remote iterator: presents a stream of received pairs as the
/// shared iterator contract.
///
/// Construction performs one blocking receive to prime the iterator, so it
/// is handed to the caller already positioned, or already invalid if the
/// stream opened empty or broken. Exhaustion arrives in-band as a pair
/// with `valid = false`; a transport fault is recorded once and sticks.
pub struct RemoteIterator<C: IteratorClient> {
    client: C,
    cur: Option<pb::Pair>,
    err: Option<anyhow::Error>,
}

impl<C: IteratorClient> RemoteIterator<C> {
    pub fn new(client: C) -> RemoteIterator<C> {
        let mut itr = RemoteIterator {
            client,
            cur: None,
            err: None,
        };
        itr.receive();
        itr
    }

    fn receive(&mut self) {
        match self.client.recv() {
            Ok(pair) => self.cur = Some(pair),
            Err(err) => self.err = Some(err),
        }
    }

    fn assert_valid(&self) {
        if !iterator::Iterator::valid(self) {
            panic!("iterator is invalid");
        }
    }
}

impl<C: IteratorClient> iterator::Iterator for RemoteIterator<C> {
    fn valid(&self) -> bool {
        self.err.is_none() && matches!(&self.cur, Some(cur) if cur.valid)
    }

    fn next(&mut self) {
        self.assert_valid();
        self.receive();
    }

    fn key(&self) -> Bytes {
        self.assert_valid();
        match &self.cur {
            Some(cur) => cur.key.clone(),
            None => panic!("iterator is invalid"),
        }
    }

    fn value(&self) -> Bytes {
        self.assert_valid();
        match &self.cur {
            Some(cur) => cur.value.clone(),
            None => panic!("iterator is invalid"),
        }
    }

    fn error(&self) -> Option<&anyhow::Error> {
        self.err.as_ref()
    }

    fn close(&mut self) -> Result<()> {
        self.client.close_send()
    }
}

/// Reverse remote iterator: same mechanics as `RemoteIterator` over the
/// descending stream kind.
///
/// `close` is deliberately a no-op. The reverse stream is server-driven;
/// the peer, not the client, decides when the stream ends, and there is no
/// client send side to half-close. The asymmetry with the forward iterator
/// is a property of the protocol, not an oversight; keep it.
pub struct RemoteReverseIterator<C: ReverseIteratorClient> {
    client: C,
    cur: Option<pb::Pair>,
    err: Option<anyhow::Error>,
}

impl<C: ReverseIteratorClient> RemoteReverseIterator<C> {
    pub fn new(client: C) -> RemoteReverseIterator<C> {
        let mut itr = RemoteReverseIterator {
            client,
            cur: None,
            err: None,
        };
        itr.receive();
        itr
    }

    fn receive(&mut self) {
        match self.client.recv() {
            Ok(pair) => self.cur = Some(pair),
            Err(err) => self.err = Some(err),
        }
    }

    fn assert_valid(&self) {
        if !iterator::Iterator::valid(self) {
            panic!("iterator is invalid");
        }
    }
}

impl<C: ReverseIteratorClient> iterator::Iterator for RemoteReverseIterator<C> {
    fn valid(&self) -> bool {
        self.err.is_none() && matches!(&self.cur, Some(cur) if cur.valid)
    }

    fn next(&mut self) {
        self.assert_valid();
        self.receive();
    }

    fn key(&self) -> Bytes {
        self.assert_valid();
        match &self.cur {
            Some(cur) => cur.key.clone(),
            None => panic!("iterator is invalid"),
        }
    }

    fn value(&self) -> Bytes {
        self.assert_valid();
        match &self.cur {
            Some(cur) => cur.value.clone(),
            None => panic!("iterator is invalid"),
        }
    }

    fn error(&self) -> Option<&anyhow::Error> {
        self.err.as_ref()
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    use anyhow::anyhow;

    use super::*;
    use crate::{error::Error, iterator::Iterator};

    fn pair(key: &[u8], value: &[u8]) -> pb::Pair {
        pb::Pair {
            key: Bytes::copy_from_slice(key),
            value: Bytes::copy_from_slice(value),
            valid: true,
        }
    }

    // `valid` defaults to false, which is exactly the end-of-data marker.
    fn end_marker() -> pb::Pair {
        pb::Pair::default()
    }

    struct ScriptClient {
        replies: VecDeque<Result<pb::Pair>>,
        closes: Rc<Cell<usize>>,
    }

    impl ScriptClient {
        fn new(replies: Vec<Result<pb::Pair>>) -> (ScriptClient, Rc<Cell<usize>>) {
            let closes = Rc::new(Cell::new(0));
            let client = ScriptClient {
                replies: replies.into(),
                closes: Rc::clone(&closes),
            };
            (client, closes)
        }
    }

    impl IteratorClient for ScriptClient {
        fn recv(&mut self) -> Result<pb::Pair> {
            self.replies
                .pop_front()
                .unwrap_or_else(|| Err(anyhow!(Error::StreamClosed)))
        }

        fn close_send(&mut self) -> Result<()> {
            self.closes.set(self.closes.get() + 1);
            Ok(())
        }
    }

    struct ScriptReverseClient {
        replies: VecDeque<Result<pb::Pair>>,
    }

    impl ReverseIteratorClient for ScriptReverseClient {
        fn recv(&mut self) -> Result<pb::Pair> {
            self.replies
                .pop_front()
                .unwrap_or_else(|| Err(anyhow!(Error::StreamClosed)))
        }
    }

    #[test]
    fn test_forward_scenario() {
        let (client, _) = ScriptClient::new(vec![
            Ok(pair(b"x", b"1")),
            Ok(pair(b"y", b"2")),
            Ok(end_marker()),
        ]);
        let mut it = RemoteIterator::new(client);

        assert!(it.valid());
        assert_eq!(it.key(), b"x".as_slice());
        assert_eq!(it.value(), b"1".as_slice());

        it.next();
        assert!(it.valid());
        assert_eq!(it.key(), b"y".as_slice());

        it.next();
        assert!(!it.valid());
        assert!(it.error().is_none());
    }

    #[test]
    fn test_empty_stream_starts_invalid() {
        let (client, _) = ScriptClient::new(vec![Ok(end_marker())]);
        let it = RemoteIterator::new(client);

        assert!(!it.valid());
        assert!(it.error().is_none());
    }

    #[test]
    fn test_priming_fault() {
        let (client, _) = ScriptClient::new(vec![Err(anyhow!(Error::Transport(
            "connection refused".to_string()
        )))]);
        let it = RemoteIterator::new(client);

        assert!(!it.valid());
        assert!(it
            .error()
            .unwrap()
            .to_string()
            .contains("connection refused"));
    }

    #[test]
    fn test_fault_on_second_receive_is_sticky() {
        let (client, _) = ScriptClient::new(vec![
            Ok(pair(b"x", b"1")),
            Err(anyhow!(Error::Transport("connection reset".to_string()))),
        ]);
        let mut it = RemoteIterator::new(client);
        assert!(it.valid());

        it.next();
        assert!(!it.valid());
        assert!(it.error().unwrap().to_string().contains("connection reset"));
        // Still there on a second look.
        assert!(it.error().is_some());
    }

    #[test]
    fn test_forward_close_half_closes() {
        let (client, closes) = ScriptClient::new(vec![Ok(pair(b"x", b"1"))]);
        let mut it = RemoteIterator::new(client);

        it.close().unwrap();
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn test_reverse_scenario() {
        let client = ScriptReverseClient {
            replies: vec![
                Ok(pair(b"y", b"2")),
                Ok(pair(b"x", b"1")),
                Ok(end_marker()),
            ]
            .into(),
        };
        let mut it = RemoteReverseIterator::new(client);

        assert_eq!(it.key(), b"y".as_slice());
        it.next();
        assert_eq!(it.key(), b"x".as_slice());
        it.next();
        assert!(!it.valid());
        assert!(it.error().is_none());
    }

    #[test]
    fn test_reverse_close_is_a_no_op() {
        let client = ScriptReverseClient {
            replies: vec![Ok(pair(b"y", b"2")), Ok(pair(b"x", b"1"))].into(),
        };
        let mut it = RemoteReverseIterator::new(client);

        // Closing mid-stream touches nothing: the peer owns this stream's
        // lifetime, and the current position stays readable.
        it.close().unwrap();
        assert!(it.valid());
        assert_eq!(it.key(), b"y".as_slice());

        it.next();
        assert_eq!(it.key(), b"x".as_slice());
    }

    #[test]
    #[should_panic(expected = "iterator is invalid")]
    fn test_next_panics_after_exhaustion() {
        let (client, _) = ScriptClient::new(vec![Ok(pair(b"x", b"1")), Ok(end_marker())]);
        let mut it = RemoteIterator::new(client);

        it.next();
        assert!(!it.valid());
        it.next();
    }

    #[test]
    #[should_panic(expected = "iterator is invalid")]
    fn test_key_panics_after_fault() {
        let (client, _) = ScriptClient::new(vec![Err(anyhow!(Error::StreamClosed))]);
        let it = RemoteIterator::new(client);
        it.key();
    }
}
