//! Unbounded multi-consumer pub/sub for inbound frames.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;

/// Fan-out channel over a single producer.
///
/// Every live subscriber observes every item published after it subscribed,
/// in publish order. Buffering is unbounded: a slow subscriber never causes
/// items to be dropped for itself or anyone else.
pub struct FrameBus<T> {
    /// `None` once the bus is closed.
    subscribers: Mutex<Option<Vec<mpsc::UnboundedSender<T>>>>,
}

impl<T> Default for FrameBus<T>
where
    T: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FrameBus<T>
where
    T: Clone + Send + 'static,
{
    /// Create an open bus with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(Some(Vec::with_capacity(4))),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Vec<mpsc::UnboundedSender<T>>>> {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Deliver an item to every live subscriber.
    ///
    /// Subscribers whose receiving side was dropped are pruned. Returns the
    /// number of subscribers that received the item; publishing on a closed
    /// bus delivers nothing.
    pub fn publish(&self, item: T) -> usize {
        let mut guard = self.lock();
        let Some(subscribers) = guard.as_mut() else {
            return 0;
        };
        subscribers.retain(|tx| tx.send(item.clone()).is_ok());
        subscribers.len()
    }

    /// Subscribe to items published from now on.
    ///
    /// Subscribing to a closed bus yields a subscription that is already
    /// exhausted.
    #[must_use]
    pub fn subscribe(&self) -> Subscription<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        if let Some(subscribers) = self.lock().as_mut() {
            subscribers.push(tx);
        }
        Subscription { rx }
    }

    /// Close the bus. Subscribers drain what was already published, then end.
    pub fn close(&self) {
        if self.lock().take().is_some() {
            tracing::trace!("frame bus closed");
        }
    }
}

/// Receiving side of a [`FrameBus`] subscription.
#[derive(Debug)]
pub struct Subscription<T> {
    rx: mpsc::UnboundedReceiver<T>,
}

impl<T> Subscription<T>
where
    T: Send + 'static,
{
    /// Receive the next item, or `None` once the bus is closed and drained.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_every_subscriber_sees_every_item() {
        let bus = FrameBus::new();
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        assert_eq!(bus.publish(1), 2);
        assert_eq!(bus.publish(2), 2);
        bus.close();

        assert_eq!(a.recv().await, Some(1));
        assert_eq!(a.recv().await, Some(2));
        assert_eq!(a.recv().await, None);
        assert_eq!(b.recv().await, Some(1));
        assert_eq!(b.recv().await, Some(2));
        assert_eq!(b.recv().await, None);
    }

    #[test]
    fn test_recv_waits_for_publish() {
        let bus = FrameBus::new();
        let mut sub = bus.subscribe();
        let mut recv = tokio_test::task::spawn(sub.recv());

        tokio_test::assert_pending!(recv.poll());
        bus.publish('x');
        assert!(recv.is_woken());
        tokio_test::assert_ready_eq!(recv.poll(), Some('x'));
    }

    #[tokio::test]
    async fn test_late_subscriber_only_sees_later_items() {
        let bus = FrameBus::new();
        let _early = bus.subscribe();
        bus.publish("first");
        let mut late = bus.subscribe();
        bus.publish("second");
        bus.close();

        assert_eq!(late.recv().await, Some("second"));
        assert_eq!(late.recv().await, None);
    }

    #[tokio::test]
    async fn test_buffering_is_unbounded() {
        let bus = FrameBus::new();
        let mut sub = bus.subscribe();
        for i in 0..50_000 {
            bus.publish(i);
        }
        bus.close();
        let mut count = 0;
        while sub.recv().await.is_some() {
            count += 1;
        }
        assert_eq!(count, 50_000);
    }

    #[test]
    fn test_dropped_subscribers_are_pruned() {
        let bus = FrameBus::new();
        let keep = bus.subscribe();
        drop(bus.subscribe());
        assert_eq!(bus.publish(7), 1);
        drop(keep);
        assert_eq!(bus.publish(8), 0);
    }

    #[tokio::test]
    async fn test_subscribe_after_close_is_exhausted() {
        let bus = FrameBus::<u8>::new();
        bus.close();
        let mut sub = bus.subscribe();
        assert_eq!(sub.recv().await, None);
        assert_eq!(bus.publish(1), 0);
    }
}
