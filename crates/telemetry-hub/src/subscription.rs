use std::fmt;

use tokio::sync::mpsc::{self, error::TryRecvError};
use tracing::debug;

use crate::hub::HubCommand;

/// Identifies one subscriber for the lifetime of a hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(pub(crate) u64);

impl SubscriberId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Receiving end of one subscriber queue.
///
/// The queue yields published values in publish order and returns `None` once
/// the subscriber has been removed from the hub or the hub has stopped.
/// Dropping the subscription asks the hub to forget it; if the hub command queue
/// is momentarily full the entry is instead reaped by the next publish.
#[derive(Debug)]
pub struct Subscription<T> {
    id: SubscriberId,
    receiver: mpsc::Receiver<T>,
    commands: mpsc::WeakSender<HubCommand<T>>,
}

impl<T> Subscription<T> {
    pub(crate) fn new(
        id: SubscriberId,
        receiver: mpsc::Receiver<T>,
        commands: mpsc::WeakSender<HubCommand<T>>,
    ) -> Self {
        Self {
            id,
            receiver,
            commands,
        }
    }

    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Wait for the next value. `None` means the queue is closed for good.
    pub async fn recv(&mut self) -> Option<T> {
        self.receiver.recv().await
    }

    pub fn try_recv(&mut self) -> Result<T, TryRecvError> {
        self.receiver.try_recv()
    }

    /// Values queued and not yet received.
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_closed(&self) -> bool {
        self.receiver.is_closed()
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        let Some(commands) = self.commands.upgrade() else {
            return;
        };
        if commands
            .try_send(HubCommand::Unsubscribe { id: self.id })
            .is_err()
        {
            debug!(subscriber = %self.id, "unsubscribe on drop deferred to next publish");
        }
    }
}
