//! Broadcast of one byte stream to a changing set of subscribers.
//!
//! The subscriber set is owned by a single actor task. Registration,
//! removal and broadcast are requests handled one at a time by that task, so
//! a removal can never overtake a chunk that is already being delivered.

use std::collections::BTreeMap;

use bytes::Bytes;
use serbridge_transport::{ByteReceiver, ByteSender, TrySendError};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::SlowConsumerPolicy;
use crate::error::{Result, RouteError};

/// Stable handle for a registered subscriber. Ids grow monotonically, so
/// id order is registration order.
pub type SubscriberId = u64;

const COMMAND_QUEUE_DEPTH: usize = 32;

enum Command {
    Register {
        sender: ByteSender,
        reply: oneshot::Sender<SubscriberId>,
    },
    Remove(SubscriberId),
    Count(oneshot::Sender<usize>),
}

/// Cloneable handle used to register and remove subscribers.
#[derive(Debug, Clone)]
pub struct DuplicatorHandle {
    commands: mpsc::Sender<Command>,
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Register { .. } => f.write_str("Register"),
            Command::Remove(id) => f.debug_tuple("Remove").field(id).finish(),
            Command::Count(_) => f.write_str("Count"),
        }
    }
}

impl DuplicatorHandle {
    /// Add a subscriber. Chunks broadcast after this returns reach it.
    pub async fn register(&self, sender: ByteSender) -> Result<SubscriberId> {
        let (reply, id) = oneshot::channel();
        self.commands
            .send(Command::Register { sender, reply })
            .await
            .map_err(|_| RouteError::DuplicatorGone)?;
        id.await.map_err(|_| RouteError::DuplicatorGone)
    }

    /// Remove a subscriber. Removing an unknown id is a no-op.
    pub async fn remove(&self, id: SubscriberId) -> Result<()> {
        self.commands
            .send(Command::Remove(id))
            .await
            .map_err(|_| RouteError::DuplicatorGone)
    }

    /// Number of subscribers currently registered.
    pub async fn subscriber_count(&self) -> Result<usize> {
        let (reply, count) = oneshot::channel();
        self.commands
            .send(Command::Count(reply))
            .await
            .map_err(|_| RouteError::DuplicatorGone)?;
        count.await.map_err(|_| RouteError::DuplicatorGone)
    }
}

/// The actor owning the subscriber set.
pub struct Duplicator {
    input: ByteReceiver,
    commands: mpsc::Receiver<Command>,
    subscribers: BTreeMap<SubscriberId, ByteSender>,
    next_id: SubscriberId,
    policy: SlowConsumerPolicy,
}

impl Duplicator {
    /// Build the actor and its handle without starting it.
    pub fn new(input: ByteReceiver, policy: SlowConsumerPolicy) -> (Self, DuplicatorHandle) {
        let (tx, rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
        let actor = Self {
            input,
            commands: rx,
            subscribers: BTreeMap::new(),
            next_id: 1,
            policy,
        };
        (actor, DuplicatorHandle { commands: tx })
    }

    /// Build the actor and run it on its own task.
    pub fn spawn(
        input: ByteReceiver,
        policy: SlowConsumerPolicy,
    ) -> (DuplicatorHandle, JoinHandle<()>) {
        let (actor, handle) = Self::new(input, policy);
        (handle, tokio::spawn(actor.run()))
    }

    /// Serve requests until the input stream ends.
    pub async fn run(mut self) {
        let mut accepting = true;
        loop {
            tokio::select! {
                biased;
                command = self.commands.recv(), if accepting => match command {
                    Some(command) => self.apply(command),
                    None => accepting = false,
                },
                chunk = self.input.recv() => match chunk {
                    Some(chunk) => self.broadcast(chunk).await,
                    None => break,
                },
            }
        }
        debug!(
            subscribers = self.subscribers.len(),
            "duplicator input closed"
        );
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::Register { sender, reply } => {
                let id = self.next_id;
                self.next_id += 1;
                self.subscribers.insert(id, sender);
                info!(
                    subscriber = id,
                    count = self.subscribers.len(),
                    "registered subscriber"
                );
                let _ = reply.send(id);
            }
            Command::Remove(id) => {
                if self.subscribers.remove(&id).is_some() {
                    info!(
                        subscriber = id,
                        count = self.subscribers.len(),
                        "removed subscriber"
                    );
                }
            }
            Command::Count(reply) => {
                let _ = reply.send(self.subscribers.len());
            }
        }
    }

    async fn broadcast(&mut self, chunk: Bytes) {
        let mut dropped = Vec::new();

        for (&id, sender) in &self.subscribers {
            let delivered = match self.policy {
                SlowConsumerPolicy::Block => sender.send(chunk.clone()).await.is_ok(),
                SlowConsumerPolicy::Disconnect => match sender.try_send(chunk.clone()) {
                    Ok(()) => true,
                    Err(TrySendError::Full(_)) => {
                        warn!(subscriber = id, "subscriber queue full, disconnecting");
                        false
                    }
                    Err(TrySendError::Closed(_)) => false,
                },
            };
            if !delivered {
                dropped.push(id);
            }
        }

        for id in dropped {
            self.subscribers.remove(&id);
            info!(
                subscriber = id,
                count = self.subscribers.len(),
                "dropped subscriber"
            );
        }
    }
}
