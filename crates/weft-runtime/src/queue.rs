//! Port addresses and the bounded queues behind them.
//!
//! Every port in a running program is backed by exactly one [`PortQueue`]
//! with one logical writer and one logical reader; fan-in and fan-out are
//! realized by the network transport joining distinct queues, never by
//! sharing a queue between senders. Capacity 0 turns the queue into a
//! rendezvous point: the sender parks an offer and unblocks only once the
//! reader has begun its receive and taken it, which is what gives
//! unbuffered connections their synchronous handoff semantics.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use arcstr::ArcStr;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::msg::Msg;

/// Address of one port: node path, port name, optional array slot.
/// Scalar ports carry no slot index. Root ports have the empty path.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortAddr {
    pub path: ArcStr,
    pub port: ArcStr,
    pub idx: Option<u8>,
}

impl PortAddr {
    pub fn new(path: impl Into<ArcStr>, port: impl Into<ArcStr>) -> Self {
        Self {
            path: path.into(),
            port: port.into(),
            idx: None,
        }
    }

    pub fn slot(path: impl Into<ArcStr>, port: impl Into<ArcStr>, idx: u8) -> Self {
        Self {
            path: path.into(),
            port: port.into(),
            idx: Some(idx),
        }
    }

    /// Address of a port on the program root, like `exit` or `start`.
    pub fn root(port: impl Into<ArcStr>) -> Self {
        Self::new(arcstr::literal!(""), port)
    }
}

impl fmt::Display for PortAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path, self.port)?;
        if let Some(idx) = self.idx {
            write!(f, "[{idx}]")?;
        }
        Ok(())
    }
}

/// A message paired with its sender-local sequence number, used for
/// reordering at fan-in points.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexedMsg {
    pub msg: Msg,
    pub index: u64,
}

#[derive(Default, Debug)]
struct State {
    buf: VecDeque<IndexedMsg>,
    offer: Option<IndexedMsg>,
}

/// Bounded FIFO of indexed messages with cancellation-aware operations.
///
/// Single-producer, single-consumer by contract. `send` assigns indices
/// from the queue's own monotonic counter; the transport moves messages
/// between queues with `send_indexed`/`receive_indexed`, preserving the
/// index assigned at the original sender.
pub struct PortQueue {
    capacity: usize,
    state: Mutex<State>,
    readable: Notify,
    writable: Notify,
    next_index: AtomicU64,
}

impl PortQueue {
    pub fn bounded(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            capacity,
            state: Mutex::new(State::default()),
            readable: Notify::new(),
            writable: Notify::new(),
            next_index: AtomicU64::new(0),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Enqueue a fresh message under the next sender-local index.
    /// Returns `false` iff the token was cancelled before delivery.
    pub async fn send(&self, token: &CancellationToken, msg: Msg) -> bool {
        let index = self.next_index.fetch_add(1, Ordering::Relaxed);
        self.send_indexed(token, IndexedMsg { msg, index }).await
    }

    pub async fn send_indexed(&self, token: &CancellationToken, msg: IndexedMsg) -> bool {
        if self.capacity == 0 {
            return self.send_rendezvous(token, msg).await;
        }
        let mut msg = Some(msg);
        loop {
            {
                let mut state = self.state.lock().unwrap();
                if state.buf.len() < self.capacity {
                    state.buf.push_back(msg.take().unwrap());
                    drop(state);
                    self.readable.notify_one();
                    return true;
                }
            }
            tokio::select! {
                _ = token.cancelled() => return false,
                _ = self.writable.notified() => {}
            }
        }
    }

    async fn send_rendezvous(&self, token: &CancellationToken, msg: IndexedMsg) -> bool {
        {
            let mut state = self.state.lock().unwrap();
            debug_assert!(state.offer.is_none(), "port queue has a single writer");
            state.offer = Some(msg);
        }
        self.readable.notify_one();
        loop {
            if self.state.lock().unwrap().offer.is_none() {
                return true;
            }
            tokio::select! {
                _ = token.cancelled() => {
                    // Whoever gets the lock first decides: a taken offer
                    // was delivered, a retracted one was not.
                    let mut state = self.state.lock().unwrap();
                    return state.offer.take().is_none();
                }
                _ = self.writable.notified() => {}
            }
        }
    }

    /// Dequeue, stripping the index. Returns `None` iff the token was
    /// cancelled before a message arrived.
    pub async fn receive(&self, token: &CancellationToken) -> Option<Msg> {
        self.receive_indexed(token).await.map(|indexed| indexed.msg)
    }

    pub async fn receive_indexed(&self, token: &CancellationToken) -> Option<IndexedMsg> {
        loop {
            if let Some(msg) = self.try_receive() {
                return Some(msg);
            }
            tokio::select! {
                _ = token.cancelled() => return None,
                _ = self.readable.notified() => {}
            }
        }
    }

    /// Non-blocking dequeue. Takes a parked rendezvous offer as well,
    /// which is what lets the fan-in poller drain unbuffered senders.
    pub fn try_receive(&self) -> Option<IndexedMsg> {
        let mut state = self.state.lock().unwrap();
        let taken = state.offer.take().or_else(|| state.buf.pop_front());
        drop(state);
        if taken.is_some() {
            self.writable.notify_one();
        }
        taken
    }

    /// Resolves once a message can be taken. Used by the fan-in merger to
    /// park instead of spinning while all its senders are idle.
    pub async fn readable(&self) {
        loop {
            {
                let state = self.state.lock().unwrap();
                if state.offer.is_some() || !state.buf.is_empty() {
                    return;
                }
            }
            self.readable.notified().await;
        }
    }
}

impl fmt::Debug for PortQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock().unwrap();
        f.debug_struct("PortQueue")
            .field("capacity", &self.capacity)
            .field("len", &state.buf.len())
            .field("offered", &state.offer.is_some())
            .finish()
    }
}
