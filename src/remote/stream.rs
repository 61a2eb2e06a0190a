use anyhow::{anyhow, Result};
use log::debug;
use tokio::sync::{mpsc, oneshot};

use super::{IteratorClient, ReverseIteratorClient};
use crate::{error::Error, iterator::Iterator, pb};

/// Forward stream client fed by an in-process pair channel.
///
/// `recv` blocks the calling thread; a channel that dies without the
/// in-band end-of-data marker surfaces as a transport fault, not as
/// exhaustion. The half-close signal is a one-shot: only the first
/// `close_send` reaches the peer.
pub struct ChannelIteratorClient {
    pairs: mpsc::Receiver<Result<pb::Pair>>,
    close: Option<oneshot::Sender<()>>,
}

impl IteratorClient for ChannelIteratorClient {
    fn recv(&mut self) -> Result<pb::Pair> {
        match self.pairs.blocking_recv() {
            Some(res) => res,
            None => Err(anyhow!(Error::StreamClosed)),
        }
    }

    fn close_send(&mut self) -> Result<()> {
        if let Some(close) = self.close.take() {
            // The peer may already be gone; half-close is fire-and-forget.
            let _ = close.send(());
        }
        Ok(())
    }
}

/// Reverse stream client: receive-only, no send side to half-close.
pub struct ChannelReverseIteratorClient {
    pairs: mpsc::Receiver<Result<pb::Pair>>,
}

impl ReverseIteratorClient for ChannelReverseIteratorClient {
    fn recv(&mut self) -> Result<pb::Pair> {
        match self.pairs.blocking_recv() {
            Some(res) => res,
            None => Err(anyhow!(Error::StreamClosed)),
        }
    }
}

/// Peer-side handle of a pair stream, handed to `serve_pairs`.
pub struct PairSender {
    pairs: mpsc::Sender<Result<pb::Pair>>,
    hangup: Option<oneshot::Receiver<()>>,
}

impl PairSender {
    fn half_closed(&mut self) -> bool {
        match &mut self.hangup {
            // Anything but "no signal yet" means the client is done with us.
            Some(hangup) => !matches!(
                hangup.try_recv(),
                Err(oneshot::error::TryRecvError::Empty)
            ),
            None => false,
        }
    }
}

/// Create a forward pair stream: the peer end for `serve_pairs`, the client
/// end for `RemoteIterator`.
pub fn pair_channel(capacity: usize) -> (PairSender, ChannelIteratorClient) {
    let (tx, rx) = mpsc::channel(capacity);
    let (close_tx, close_rx) = oneshot::channel();
    (
        PairSender {
            pairs: tx,
            hangup: Some(close_rx),
        },
        ChannelIteratorClient {
            pairs: rx,
            close: Some(close_tx),
        },
    )
}

/// Create a reverse pair stream for `RemoteReverseIterator`. No half-close
/// wiring: the serving side runs the stream to completion on its own.
pub fn reverse_pair_channel(capacity: usize) -> (PairSender, ChannelReverseIteratorClient) {
    let (tx, rx) = mpsc::channel(capacity);
    (
        PairSender {
            pairs: tx,
            hangup: None,
        },
        ChannelReverseIteratorClient { pairs: rx },
    )
}

/// Peer-side pump: drain `source` into the stream, one message per pair,
/// then the in-band end-of-data marker, or the fault that stopped the
/// range re-surfaced as a transport error. Between sends it watches for
/// the client's half-close and for hangup, and cuts the stream short on
/// either. Closes `source` before returning.
pub fn serve_pairs(mut source: Box<dyn Iterator>, mut sink: PairSender) -> Result<()> {
    while source.valid() {
        if sink.half_closed() {
            debug!("client half-closed, ending range stream");
            return source.close();
        }

        let pair = pb::Pair {
            key: source.key(),
            value: source.value(),
            valid: true,
        };
        if sink.pairs.blocking_send(Ok(pair)).is_err() {
            debug!("client hung up, ending range stream");
            return source.close();
        }

        source.next();
    }

    let done = match source.error() {
        Some(err) => Err(anyhow!(Error::Transport(err.to_string()))),
        None => Ok(pb::Pair::default()),
    };
    let _ = sink.pairs.blocking_send(done);

    source.close()
}
