/// file: src/bus.rs
/// description: synchronous in-process publish/subscribe for same-session events
use crate::types::{ClubJoinEvent, LocalEvent, LocalEventKind};
use chrono::Utc;
use parking_lot::Mutex;
use std::{
    panic::{self, AssertUnwindSafe},
    sync::{Arc, Weak},
};
use tracing::{error, trace};

pub type Callback = Arc<dyn Fn(&LocalEvent) + Send + Sync>;

struct Registration {
    id: u64,
    kind: LocalEventKind,
    callback: Callback,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    // kept in registration order
    entries: Vec<Registration>,
}

/// Named-channel fan-out keyed by [`LocalEventKind`].
///
/// Cloning is cheap and every clone shares the same subscribers.
#[derive(Clone, Default)]
pub struct LocalEventBus {
    registry: Arc<Mutex<Registry>>,
}

impl LocalEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invokes every current subscriber of the event's kind before returning.
    ///
    /// A subscriber that panics is logged and skipped; the rest still run.
    /// No lock is held while callbacks execute, so they may publish or
    /// (un)subscribe themselves.
    pub fn publish(&self, event: LocalEvent) {
        let kind = event.kind();
        let callbacks: Vec<Callback> = {
            let registry = self.registry.lock();
            registry
                .entries
                .iter()
                .filter(|r| r.kind == kind)
                .map(|r| r.callback.clone())
                .collect()
        };

        trace!(event = kind.name(), subscribers = callbacks.len(), "Publishing local event");
        if callbacks.is_empty() {
            return;
        }

        let event = event.stamped(Utc::now());
        for callback in callbacks {
            let delivered = event.clone();
            if panic::catch_unwind(AssertUnwindSafe(|| callback(&delivered))).is_err() {
                error!(event = kind.name(), "Local event subscriber panicked");
            }
        }
    }

    pub fn subscribe<F>(&self, kind: LocalEventKind, callback: F) -> Subscription
    where
        F: Fn(&LocalEvent) + Send + Sync + 'static,
    {
        let mut registry = self.registry.lock();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.entries.push(Registration {
            id,
            kind,
            callback: Arc::new(callback),
        });

        Subscription {
            registry: Arc::downgrade(&self.registry),
            id,
        }
    }

    pub fn publish_club_join(&self, event: ClubJoinEvent) {
        self.publish(LocalEvent::ClubJoined(event));
    }

    pub fn on_club_join<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&ClubJoinEvent) + Send + Sync + 'static,
    {
        self.subscribe(LocalEventKind::ClubJoined, move |event| match event {
            LocalEvent::ClubJoined(join) => callback(join),
        })
    }

    pub fn subscriber_count(&self, kind: LocalEventKind) -> usize {
        self.registry
            .lock()
            .entries
            .iter()
            .filter(|r| r.kind == kind)
            .count()
    }
}

/// Handle returned by [`LocalEventBus::subscribe`].
///
/// Dropping it leaves the registration in place; call
/// [`Subscription::unsubscribe`] to remove it.
pub struct Subscription {
    registry: Weak<Mutex<Registry>>,
    id: u64,
}

impl Subscription {
    /// Removes exactly this registration. Further calls are no-ops.
    pub fn unsubscribe(&self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.lock().entries.retain(|r| r.id != self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&str) -> Box<dyn Fn(&ClubJoinEvent) + Send + Sync>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let handle = log.clone();
        let make = move |name: &str| {
            let log = handle.clone();
            let name = name.to_string();
            Box::new(move |e: &ClubJoinEvent| log.lock().push(format!("{name}:{}", e.club_id)))
                as Box<dyn Fn(&ClubJoinEvent) + Send + Sync>
        };
        (log, make)
    }

    #[test]
    fn publish_fans_out_in_registration_order() {
        let bus = LocalEventBus::new();
        let (log, make) = recorder();
        for name in ["a", "b", "c"] {
            let cb = make(name);
            bus.on_club_join(move |e| cb(e));
        }

        bus.publish_club_join(ClubJoinEvent::new(9, 1, "Yael"));

        assert_eq!(*log.lock(), vec!["a:9", "b:9", "c:9"]);
    }

    #[test]
    fn publish_without_subscribers_is_a_noop() {
        let bus = LocalEventBus::new();
        bus.publish_club_join(ClubJoinEvent::new(1, 1, "Omer"));
        assert_eq!(bus.subscriber_count(LocalEventKind::ClubJoined), 0);
    }

    #[test]
    fn unsubscribe_is_idempotent() {
        let bus = LocalEventBus::new();
        let (log, make) = recorder();
        let first = make("first");
        let second = make("second");
        let sub = bus.on_club_join(move |e| first(e));
        bus.on_club_join(move |e| second(e));

        sub.unsubscribe();
        sub.unsubscribe();
        bus.publish_club_join(ClubJoinEvent::new(2, 1, "Omer"));

        assert_eq!(*log.lock(), vec!["second:2"]);
        assert_eq!(bus.subscriber_count(LocalEventKind::ClubJoined), 1);
    }

    #[test]
    fn unsubscribe_removes_only_its_own_registration() {
        let bus = LocalEventBus::new();
        let (log, make) = recorder();
        let a = make("a");
        let b = make("b");
        let sub_a = bus.on_club_join(move |e| a(e));
        let sub_b = bus.on_club_join(move |e| b(e));

        sub_b.unsubscribe();
        bus.publish_club_join(ClubJoinEvent::new(5, 1, "Omer"));
        sub_a.unsubscribe();
        bus.publish_club_join(ClubJoinEvent::new(6, 1, "Omer"));

        assert_eq!(*log.lock(), vec!["a:5"]);
    }

    #[test]
    fn missing_timestamp_is_stamped_at_publish() {
        let bus = LocalEventBus::new();
        let seen = Arc::new(Mutex::new(None));
        let sink = seen.clone();
        bus.on_club_join(move |e| *sink.lock() = e.timestamp);

        let before = Utc::now();
        bus.publish_club_join(ClubJoinEvent::new(1, 2, "Tal"));

        let stamped = (*seen.lock()).expect("timestamp should be set");
        assert!(stamped >= before);
    }

    #[test]
    fn panicking_subscriber_does_not_starve_the_rest() {
        let bus = LocalEventBus::new();
        let (log, make) = recorder();
        bus.on_club_join(|_| panic!("subscriber failure"));
        let after = make("after");
        bus.on_club_join(move |e| after(e));

        bus.publish_club_join(ClubJoinEvent::new(4, 1, "Gil"));

        assert_eq!(*log.lock(), vec!["after:4"]);
    }

    #[test]
    fn subscriber_may_unsubscribe_during_publish() {
        let bus = LocalEventBus::new();
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let calls = Arc::new(Mutex::new(0));

        let (slot_in, calls_in) = (slot.clone(), calls.clone());
        let sub = bus.on_club_join(move |_| {
            *calls_in.lock() += 1;
            if let Some(sub) = slot_in.lock().as_ref() {
                sub.unsubscribe();
            }
        });
        *slot.lock() = Some(sub);

        bus.publish_club_join(ClubJoinEvent::new(1, 1, "Roni"));
        bus.publish_club_join(ClubJoinEvent::new(1, 1, "Roni"));

        assert_eq!(*calls.lock(), 1);
    }
}
