//! The network transport: moves indexed messages from sender queues to
//! receiver queues.
//!
//! A connection with several receivers first goes through a broadcaster
//! that copies every message into one internal tap queue per receiver,
//! so each receiver sees the full stream. Receivers are then serviced
//! one task each: a plain forwarder when fed by a single sender, or a
//! merger when fed by several. The merger gathers a batch with
//! non-blocking polls, sorts it by sender-local index and forwards it in
//! order. The merge order is best effort by design: messages produced
//! far apart always arrive in order (backpressure drains one batch
//! before the next is gathered), while near-simultaneous messages are
//! merged in index order within their batch. A total order across
//! independent senders would need a central sequencer, which the
//! independent-process model deliberately avoids.

use std::sync::Arc;

use indexmap::IndexMap;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::program::Connection;
use crate::queue::{PortAddr, PortQueue};

#[derive(Clone)]
struct Endpoint {
    addr: PortAddr,
    queue: Arc<PortQueue>,
}

struct Route {
    receiver: Endpoint,
    senders: Vec<Endpoint>,
}

struct Broadcast {
    sender: Endpoint,
    taps: Vec<Arc<PortQueue>>,
}

/// Services every connection of a program. Owns no program queues; the
/// only queues it creates are the internal taps behind broadcasts.
pub struct Network {
    routes: Vec<Route>,
    broadcasts: Vec<Broadcast>,
}

impl Network {
    /// Group connections by receiver port. Every route ends up with at
    /// least one sender because a connection always names its sender.
    pub fn new(connections: &[Connection]) -> Self {
        let mut routes: IndexMap<PortAddr, Route> = IndexMap::new();
        let mut broadcasts = Vec::new();

        for connection in connections {
            let sender = Endpoint {
                addr: connection.meta.sender.clone(),
                queue: connection.sender.clone(),
            };

            // One sender endpoint per receiver: the sender queue itself
            // for a single receiver, or a tap fed by a broadcaster when
            // the same stream must reach every receiver.
            let sender_ends: Vec<Endpoint> = if connection.receivers.len() > 1 {
                let taps: Vec<Arc<PortQueue>> = connection
                    .receivers
                    .iter()
                    .map(|_| PortQueue::bounded(connection.sender.capacity()))
                    .collect();
                broadcasts.push(Broadcast {
                    sender: sender.clone(),
                    taps: taps.clone(),
                });
                taps.into_iter()
                    .map(|queue| Endpoint {
                        addr: sender.addr.clone(),
                        queue,
                    })
                    .collect()
            } else {
                vec![sender]
            };

            let receiver_ends = connection.receivers.iter().zip(&connection.meta.receivers);
            for ((queue, addr), sender_end) in receiver_ends.zip(sender_ends) {
                routes
                    .entry(addr.clone())
                    .or_insert_with(|| Route {
                        receiver: Endpoint {
                            addr: addr.clone(),
                            queue: queue.clone(),
                        },
                        senders: Vec::new(),
                    })
                    .senders
                    .push(sender_end);
            }
        }

        Self {
            routes: routes.into_values().collect(),
            broadcasts,
        }
    }

    /// Run until cancellation. In-flight messages may be dropped once
    /// the token fires; every loop kind exits promptly.
    pub async fn run(self, token: CancellationToken) {
        let mut tasks = JoinSet::new();
        for broadcast in self.broadcasts {
            tracing::debug!(
                "network: broadcast {} -> {} taps",
                broadcast.sender.addr,
                broadcast.taps.len()
            );
            tasks.spawn(run_broadcast(token.clone(), broadcast));
        }
        for route in self.routes {
            let token = token.clone();
            if route.senders.len() == 1 {
                let sender = route.senders.into_iter().next().unwrap();
                tracing::debug!("network: forward {} -> {}", sender.addr, route.receiver.addr);
                tasks.spawn(one_to_one(token, sender, route.receiver));
            } else {
                tracing::debug!(
                    "network: merge {} senders -> {}",
                    route.senders.len(),
                    route.receiver.addr
                );
                tasks.spawn(fan_in(token, route.senders, route.receiver));
            }
        }
        while tasks.join_next().await.is_some() {}
    }
}

async fn run_broadcast(token: CancellationToken, broadcast: Broadcast) {
    loop {
        let Some(msg) = broadcast.sender.queue.receive_indexed(&token).await else {
            return;
        };
        for tap in &broadcast.taps {
            if !tap.send_indexed(&token, msg.clone()).await {
                return;
            }
        }
    }
}

async fn one_to_one(token: CancellationToken, sender: Endpoint, receiver: Endpoint) {
    loop {
        let Some(msg) = sender.queue.receive_indexed(&token).await else {
            return;
        };
        if !receiver.queue.send_indexed(&token, msg).await {
            return;
        }
    }
}

async fn fan_in(token: CancellationToken, senders: Vec<Endpoint>, receiver: Endpoint) {
    loop {
        let mut batch = Vec::with_capacity(senders.len());
        let mut rounds_since_first = 0;

        // Gather: poll each sender non-blockingly, at most one message
        // per sender per round. Once something is buffered, give the
        // other senders N more rounds to land in the same batch. While
        // nothing is buffered, park on readability instead of spinning.
        loop {
            if !batch.is_empty() && rounds_since_first >= senders.len() {
                break;
            }
            if token.is_cancelled() {
                return;
            }
            for sender in &senders {
                if let Some(msg) = sender.queue.try_receive() {
                    batch.push(msg);
                }
            }
            if batch.is_empty() {
                let waits: Vec<_> = senders
                    .iter()
                    .map(|sender| Box::pin(sender.queue.readable()))
                    .collect();
                tokio::select! {
                    _ = token.cancelled() => return,
                    _ = futures::future::select_all(waits) => {}
                }
            } else {
                rounds_since_first += 1;
                tokio::task::yield_now().await;
            }
        }

        // Polling order is not arrival order; restore it per batch.
        batch.sort_by_key(|msg| msg.index);

        // The bottleneck by design: a slow receiver holds up the next
        // gather, which is what bounds batch accumulation.
        for msg in batch {
            if !receiver.queue.send_indexed(&token, msg).await {
                return;
            }
        }
    }
}
