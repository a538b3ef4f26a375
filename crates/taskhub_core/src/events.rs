//! Change notifications for views.
//!
//! Views register once at startup; the coordinator publishes after every
//! cache mutation and for every user-facing notice.

use crate::store::Collection;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// Transient message for the user (a toast in the web client).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

impl Display for Notice {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HubEvent {
    /// Cached records of this collection changed; dependent views re-render.
    Changed(Collection),
    Notice(Notice),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn Fn(&HubEvent)>;

/// Ordered subscriber list.
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, subscriber: impl Fn(&HubEvent) + 'static) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    /// Returns `false` when `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(existing, _)| *existing != id);
        self.subscribers.len() != before
    }

    /// Delivers `event` to every subscriber in registration order.
    pub fn publish(&self, event: &HubEvent) {
        for (_, subscriber) in &self.subscribers {
            subscriber(event);
        }
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{EventBus, HubEvent, Notice};
    use crate::store::Collection;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn publish_reaches_subscribers_in_order_until_unsubscribed() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();

        let first = {
            let seen = Rc::clone(&seen);
            bus.subscribe(move |event| seen.borrow_mut().push(("first", event.clone())))
        };
        {
            let seen = Rc::clone(&seen);
            bus.subscribe(move |event| seen.borrow_mut().push(("second", event.clone())));
        }

        bus.publish(&HubEvent::Changed(Collection::Goals));
        assert!(bus.unsubscribe(first));
        assert!(!bus.unsubscribe(first));
        bus.publish(&HubEvent::Notice(Notice::success("saved")));

        let seen = seen.borrow();
        let labels: Vec<_> = seen.iter().map(|(label, _)| *label).collect();
        assert_eq!(labels, vec!["first", "second", "second"]);
        assert_eq!(seen[2].1, HubEvent::Notice(Notice::success("saved")));
    }
}
