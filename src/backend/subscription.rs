use tokio::sync::broadcast::{self, error::RecvError};

use crate::common::{debug, warn};
use crate::core::Principal;

/// Registration for identity change notifications.
/// Dropping the subscription also unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    receiver: Option<broadcast::Receiver<Option<Principal>>>,
}

impl Subscription {
    pub(crate) fn new(receiver: broadcast::Receiver<Option<Principal>>) -> Self {
        Self {
            receiver: Some(receiver),
        }
    }

    pub fn is_active(&self) -> bool {
        self.receiver.is_some()
    }

    /// Wait for the next identity change.
    /// Return `None` once unsubscribed or the collaborator went away.
    pub async fn next(&mut self) -> Option<Option<Principal>> {
        loop {
            let receiver = self.receiver.as_mut()?;
            match receiver.recv().await {
                Ok(change) => return Some(change),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Identity change listener lagged");
                }
                Err(RecvError::Closed) => {
                    self.receiver = None;
                    return None;
                }
            }
        }
    }

    pub fn unsubscribe(mut self) {
        if self.receiver.take().is_some() {
            debug!("Identity change listener unsubscribed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn closed_channel_ends_subscription() {
        let (tx, rx) = broadcast::channel(4);
        let mut subscription = Subscription::new(rx);

        tx.send(None).unwrap();
        assert_eq!(subscription.next().await, Some(None));

        drop(tx);
        assert_eq!(subscription.next().await, None);
        assert!(!subscription.is_active());
    }
}
