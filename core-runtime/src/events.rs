//! # Event Bus System
//!
//! Provides typed publish/subscribe channels built on `tokio::sync::broadcast`.
//! Each core component owns a bus for its own event type: the player publishes
//! track-status, time-update and state-change notifications, the cache manager
//! publishes lifecycle diagnostics. Presentation code subscribes without the
//! producer knowing who listens.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::EventBus;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let bus: EventBus<String> = EventBus::new(16);
//! let mut subscriber = bus.subscribe();
//!
//! bus.emit("ready".to_string()).ok();
//! assert_eq!(subscriber.recv().await.unwrap(), "ready");
//! # }
//! ```
//!
//! ## Error Handling
//!
//! `tokio::sync::broadcast` can produce two receive errors:
//!
//! - **`RecvError::Lagged(n)`**: the subscriber fell behind and missed `n`
//!   events. Non-fatal; time-update notifications are the usual casualty.
//! - **`RecvError::Closed`**: every sender was dropped. Treat as shutdown.
//!
//! Producers ignore the result of [`EventBus::emit`]: publishing with nobody
//! listening is normal.

use std::fmt;
use tokio::sync::broadcast;

// Re-export commonly used types
pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for an event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

/// Implemented by event enums that can be logged with a severity.
pub trait Severity {
    fn severity(&self) -> EventSeverity;
}

/// Broadcast channel for one event type.
///
/// Cloning the bus yields another handle to the same channel.
///
/// # Example
///
/// ```rust
/// use core_runtime::events::EventBus;
///
/// let bus: EventBus<u32> = EventBus::new(8);
/// assert_eq!(bus.subscriber_count(), 0);
///
/// let _subscriber = bus.subscribe();
/// assert_eq!(bus.subscriber_count(), 1);
/// ```
pub struct EventBus<E> {
    sender: broadcast::Sender<E>,
}

impl<E: Clone> EventBus<E> {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// When a subscriber falls behind by more than `capacity` events it
    /// receives `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an error
    /// if there are none.
    pub fn emit(&self, event: E) -> Result<usize, SendError<E>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<E> {
        self.sender.subscribe()
    }

    /// Creates a new subscriber wrapped in an [`EventStream`].
    pub fn stream(&self) -> EventStream<E> {
        EventStream::new(self.subscribe())
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl<E: Clone> Default for EventBus<E> {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl<E> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<E> fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.sender.receiver_count())
            .finish()
    }
}

type EventFilter<E> = Box<dyn Fn(&E) -> bool + Send + Sync>;

/// Receiver with an optional filter.
///
/// # Example
///
/// ```rust
/// use core_runtime::events::EventBus;
///
/// let bus: EventBus<u32> = EventBus::new(8);
/// let evens = bus.stream().filter(|n| n % 2 == 0);
/// ```
pub struct EventStream<E> {
    receiver: Receiver<E>,
    filter: Option<EventFilter<E>>,
}

impl<E: Clone> EventStream<E> {
    /// Creates a new event stream from a receiver.
    pub fn new(receiver: Receiver<E>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events matching `predicate` will be returned.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Receives the next event that passes the filter (if any).
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` events.
    /// Returns `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<E, RecvError> {
        loop {
            let event = self.receiver.recv().await?;

            let Some(filter) = &self.filter else {
                return Ok(event);
            };

            if filter(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive an event without blocking.
    ///
    /// Returns `None` if no matching events are currently available.
    pub fn try_recv(&mut self) -> Option<Result<E, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    let Some(filter) = &self.filter else {
                        return Some(Ok(event));
                    };

                    if filter(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }

    /// Drains every event currently buffered, skipping lag markers.
    pub fn drain(&mut self) -> Vec<E> {
        let mut events = Vec::new();
        while let Some(result) = self.try_recv() {
            match result {
                Ok(event) => events.push(event),
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
        events
    }
}

impl<E> fmt::Debug for EventStream<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum TestEvent {
        Loading(String),
        Tick(u32),
        Failed,
    }

    impl Severity for TestEvent {
        fn severity(&self) -> EventSeverity {
            match self {
                TestEvent::Failed => EventSeverity::Error,
                TestEvent::Loading(_) => EventSeverity::Info,
                TestEvent::Tick(_) => EventSeverity::Debug,
            }
        }
    }

    #[tokio::test]
    async fn test_event_bus_subscription() {
        let bus: EventBus<TestEvent> = EventBus::new(10);
        let _sub1 = bus.subscribe();
        let _sub2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[tokio::test]
    async fn test_event_emission_no_subscribers() {
        let bus: EventBus<TestEvent> = EventBus::new(10);
        assert!(bus.emit(TestEvent::Failed).is_err());
    }

    #[tokio::test]
    async fn test_multiple_subscribers_receive_same_event() {
        let bus = EventBus::new(10);
        let mut sub1 = bus.subscribe();
        let mut sub2 = bus.subscribe();

        let event = TestEvent::Loading("box-4444-5m.mp3".to_string());
        assert_eq!(bus.emit(event.clone()).unwrap(), 2);

        assert_eq!(sub1.recv().await.unwrap(), event);
        assert_eq!(sub2.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_cloned_bus_shares_channel() {
        let bus = EventBus::new(10);
        let clone = bus.clone();
        let mut sub = bus.subscribe();

        clone.emit(TestEvent::Tick(1)).unwrap();
        assert_eq!(sub.recv().await.unwrap(), TestEvent::Tick(1));
    }

    #[tokio::test]
    async fn test_event_stream_with_filter() {
        let bus = EventBus::new(10);
        let mut stream = bus
            .stream()
            .filter(|event| !matches!(event, TestEvent::Tick(_)));

        bus.emit(TestEvent::Tick(1)).ok();
        bus.emit(TestEvent::Tick(2)).ok();
        bus.emit(TestEvent::Failed).ok();

        assert_eq!(stream.recv().await.unwrap(), TestEvent::Failed);
    }

    #[tokio::test]
    async fn test_try_recv_and_drain() {
        let bus = EventBus::new(10);
        let mut stream = bus.stream();
        assert!(stream.try_recv().is_none());

        bus.emit(TestEvent::Tick(1)).ok();
        bus.emit(TestEvent::Tick(2)).ok();

        assert_eq!(stream.drain(), vec![TestEvent::Tick(1), TestEvent::Tick(2)]);
        assert!(stream.drain().is_empty());
    }

    #[tokio::test]
    async fn test_lagged_subscriber_keeps_receiving() {
        let bus = EventBus::new(2);
        let mut stream = bus.stream();

        for n in 0..5 {
            bus.emit(TestEvent::Tick(n)).ok();
        }

        assert!(matches!(stream.try_recv(), Some(Err(RecvError::Lagged(_)))));
        assert_eq!(stream.drain(), vec![TestEvent::Tick(3), TestEvent::Tick(4)]);
    }

    #[test]
    fn test_severity() {
        assert_eq!(TestEvent::Failed.severity(), EventSeverity::Error);
        assert!(TestEvent::Tick(0).severity() < TestEvent::Loading(String::new()).severity());
    }
}
