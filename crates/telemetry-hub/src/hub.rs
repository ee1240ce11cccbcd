use std::collections::HashMap;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::subscription::{SubscriberId, Subscription};
use crate::{HubError, HubResult};

/// Per-subscriber queue depth.
pub const DEFAULT_SUBSCRIBER_CAPACITY: usize = 64;

const COMMAND_QUEUE_CAPACITY: usize = 256;

/// Commands processed by the hub task, strictly in arrival order.
pub(crate) enum HubCommand<T> {
    Subscribe {
        response: oneshot::Sender<Subscription<T>>,
    },
    Unsubscribe {
        id: SubscriberId,
    },
    Publish {
        value: T,
    },
    Count {
        response: oneshot::Sender<usize>,
    },
}

/// The hub task state: the subscriber table and its command queue.
pub struct BroadcastHub<T> {
    subscribers: HashMap<SubscriberId, mpsc::Sender<T>>,
    commands: mpsc::Receiver<HubCommand<T>>,
    weak_commands: mpsc::WeakSender<HubCommand<T>>,
    subscriber_capacity: usize,
    next_id: u64,
    cancel: CancellationToken,
}

impl<T> BroadcastHub<T>
where
    T: Clone + Send + 'static,
{
    /// Start a hub with the default subscriber queue depth.
    ///
    /// The task exits when `cancel` fires or every [`HubHandle`] is dropped;
    /// either way all subscriber queues are closed.
    pub fn spawn(cancel: CancellationToken) -> (HubHandle<T>, JoinHandle<()>) {
        Self::spawn_with_capacity(DEFAULT_SUBSCRIBER_CAPACITY, cancel)
    }

    pub fn spawn_with_capacity(
        subscriber_capacity: usize,
        cancel: CancellationToken,
    ) -> (HubHandle<T>, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
        let hub = Self {
            subscribers: HashMap::new(),
            commands: rx,
            weak_commands: tx.downgrade(),
            subscriber_capacity: subscriber_capacity.max(1),
            next_id: 0,
            cancel,
        };
        let task = tokio::spawn(hub.run());
        (HubHandle { commands: tx }, task)
    }

    async fn run(mut self) {
        info!(capacity = self.subscriber_capacity, "broadcast hub started");

        loop {
            let command = tokio::select! {
                biased;
                () = self.cancel.cancelled() => break,
                command = self.commands.recv() => match command {
                    Some(command) => command,
                    None => break,
                },
            };
            self.handle(command);
        }

        let remaining = self.subscribers.len();
        self.subscribers.clear();
        info!(subscribers = remaining, "broadcast hub stopped");
    }

    fn handle(&mut self, command: HubCommand<T>) {
        match command {
            HubCommand::Subscribe { response } => {
                let id = SubscriberId(self.next_id);
                self.next_id = self.next_id.wrapping_add(1);

                let (tx, rx) = mpsc::channel(self.subscriber_capacity);
                let subscription = Subscription::new(id, rx, self.weak_commands.clone());
                if response.send(subscription).is_ok() {
                    self.subscribers.insert(id, tx);
                    debug!(subscriber = %id, total = self.subscribers.len(), "subscriber added");
                }
            }
            HubCommand::Unsubscribe { id } => {
                if self.subscribers.remove(&id).is_some() {
                    debug!(subscriber = %id, total = self.subscribers.len(), "subscriber removed");
                }
            }
            HubCommand::Publish { value } => self.publish(&value),
            HubCommand::Count { response } => {
                if response.send(self.subscribers.len()).is_err() {
                    debug!("subscriber count requester went away");
                }
            }
        }
    }

    fn publish(&mut self, value: &T) {
        self.subscribers
            .retain(|id, queue| match queue.try_send(value.clone()) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    warn!(subscriber = %id, "subscriber queue full, update skipped");
                    true
                }
                Err(TrySendError::Closed(_)) => {
                    debug!(subscriber = %id, "subscriber gone, removing");
                    false
                }
            });
    }
}

/// Cloneable front end for a running [`BroadcastHub`].
pub struct HubHandle<T> {
    commands: mpsc::Sender<HubCommand<T>>,
}

impl<T> Clone for HubHandle<T> {
    fn clone(&self) -> Self {
        Self {
            commands: self.commands.clone(),
        }
    }
}

impl<T> std::fmt::Debug for HubHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HubHandle")
            .field("closed", &self.commands.is_closed())
            .finish()
    }
}

impl<T> HubHandle<T>
where
    T: Send + 'static,
{
    /// Register a new subscriber queue. Values published before this returns
    /// are never delivered to it.
    ///
    /// # Errors
    ///
    /// [`HubError::Closed`] if the hub task has stopped.
    pub async fn subscribe(&self) -> HubResult<Subscription<T>> {
        let (response, rx) = oneshot::channel();
        self.send(HubCommand::Subscribe { response }).await?;
        rx.await.map_err(|_| HubError::Closed)
    }

    /// Remove a subscriber, closing its queue. Unknown ids are ignored.
    ///
    /// # Errors
    ///
    /// [`HubError::Closed`] if the hub task has stopped.
    pub async fn unsubscribe(&self, id: SubscriberId) -> HubResult<()> {
        self.send(HubCommand::Unsubscribe { id }).await
    }

    /// Queue `value` for every current subscriber.
    ///
    /// A subscriber whose queue is full misses this value; the publisher never
    /// waits on a slow viewer.
    ///
    /// # Errors
    ///
    /// [`HubError::Closed`] if the hub task has stopped.
    pub async fn publish(&self, value: T) -> HubResult<()> {
        self.send(HubCommand::Publish { value }).await
    }

    /// Number of registered subscribers once every earlier command has run.
    ///
    /// # Errors
    ///
    /// [`HubError::Closed`] if the hub task has stopped.
    pub async fn subscriber_count(&self) -> HubResult<usize> {
        let (response, rx) = oneshot::channel();
        self.send(HubCommand::Count { response }).await?;
        rx.await.map_err(|_| HubError::Closed)
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    async fn send(&self, command: HubCommand<T>) -> HubResult<()> {
        self.commands.send(command).await.map_err(|_| HubError::Closed)
    }
}
