use crate::device::Myo;
use crate::events::Event;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

/// Subscription name that receives every published event.
pub const WILDCARD: &str = "*";

/// Subscriber callback. Receives the originating device, if any, and the event.
pub type Callback = Rc<dyn Fn(Option<&Myo>, &Event)>;

/// Identifier handed out on subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

struct Subscription {
    id: SubscriptionId,
    callback: Callback,
}

/// Name-keyed subscription table plus a wildcard list.
///
/// Each exact name holds at most one callback; subscribing again under the
/// same name replaces it. [`WILDCARD`] subscribers are appended and all of
/// them run, in registration order, after the named slot.
///
/// Publishing is synchronous. A callback may publish or (un)subscribe on the
/// same bus; nested publishes run depth-first before the outer one resumes.
#[derive(Default)]
pub struct EventBus {
    named: RefCell<HashMap<String, Subscription>>,
    wildcard: RefCell<Vec<Subscription>>,
    next_id: Cell<u64>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, name: &str, callback: F) -> SubscriptionId
    where
        F: Fn(Option<&Myo>, &Event) + 'static,
    {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        let subscription = Subscription {
            id,
            callback: Rc::new(callback),
        };

        if name == WILDCARD {
            self.wildcard.borrow_mut().push(subscription);
        } else if let Some(previous) = self.named.borrow_mut().insert(name.to_string(), subscription) {
            log::debug!("Subscription {:?} on '{}' replaced by {:?}", previous.id, name, id);
        }
        id
    }

    /// Drop the slot for `name`. For [`WILDCARD`], drops every wildcard subscriber.
    pub fn unsubscribe(&self, name: &str) {
        if name == WILDCARD {
            self.wildcard.borrow_mut().clear();
        } else {
            self.named.borrow_mut().remove(name);
        }
    }

    /// Run the slot for `event.name()`, then every wildcard subscriber.
    ///
    /// Wildcard subscribers never receive the device.
    pub fn publish(&self, myo: Option<&Myo>, event: &Event) {
        // Borrows are released before each call so callbacks can re-enter.
        let slot = self
            .named
            .borrow()
            .get(event.name())
            .map(|s| s.callback.clone());
        if let Some(callback) = slot {
            callback(myo, event);
        }

        let wildcard: Vec<Callback> = self
            .wildcard
            .borrow()
            .iter()
            .map(|s| s.callback.clone())
            .collect();
        for callback in wildcard {
            callback(None, event);
        }
    }

    /// Id of the callback currently registered under `name`.
    pub fn subscription(&self, name: &str) -> Option<SubscriptionId> {
        self.named.borrow().get(name).map(|s| s.id)
    }

    pub fn wildcard_count(&self) -> usize {
        self.wildcard.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Pose;

    type Log = Rc<RefCell<Vec<String>>>;

    fn recorder(log: &Log, tag: &'static str) -> impl Fn(Option<&Myo>, &Event) + 'static {
        let log = log.clone();
        move |myo, event| {
            let who = myo.map(|m| m.mac_address.as_str()).unwrap_or("-");
            log.borrow_mut().push(format!("{}:{}:{}", tag, event.name(), who));
        }
    }

    #[test]
    fn test_named_slot_is_replaced() {
        let bus = EventBus::new();
        let log: Log = Rc::default();
        let first = bus.subscribe("fist", recorder(&log, "a"));
        let second = bus.subscribe("fist", recorder(&log, "b"));
        assert_ne!(first, second);
        assert_eq!(bus.subscription("fist"), Some(second));

        bus.publish(None, &Event::PoseEntered(Pose::Fist));
        assert_eq!(*log.borrow(), vec!["b:fist:-"]);
    }

    #[test]
    fn test_wildcard_appends_and_runs_after_named() {
        let bus = EventBus::new();
        let log: Log = Rc::default();
        bus.subscribe(WILDCARD, recorder(&log, "w1"));
        bus.subscribe("ready", recorder(&log, "named"));
        bus.subscribe(WILDCARD, recorder(&log, "w2"));
        assert_eq!(bus.wildcard_count(), 2);

        bus.publish(None, &Event::Ready);
        assert_eq!(*log.borrow(), vec!["named:ready:-", "w1:ready:-", "w2:ready:-"]);
    }

    #[test]
    fn test_wildcard_without_named_gets_no_device() {
        let bus = EventBus::new();
        let log: Log = Rc::default();
        bus.subscribe(WILDCARD, recorder(&log, "w"));
        bus.subscribe("zero_orientation", recorder(&log, "named"));

        let myo = Myo::new("aa:bb", Some("left".into()), "0");
        bus.publish(Some(&myo), &Event::ZeroOrientation);
        bus.publish(Some(&myo), &Event::PoseEntered(Pose::Rest));
        assert_eq!(
            *log.borrow(),
            vec!["named:zero_orientation:aa:bb", "w:zero_orientation:-", "w:rest:-"]
        );
    }

    #[test]
    fn test_unsubscribe() {
        let bus = EventBus::new();
        let log: Log = Rc::default();
        bus.subscribe("ready", recorder(&log, "named"));
        bus.subscribe(WILDCARD, recorder(&log, "w1"));
        bus.subscribe(WILDCARD, recorder(&log, "w2"));

        bus.unsubscribe("ready");
        bus.publish(None, &Event::Ready);
        assert_eq!(log.borrow().len(), 2);

        bus.unsubscribe(WILDCARD);
        assert_eq!(bus.wildcard_count(), 0);
        bus.publish(None, &Event::Ready);
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn test_nested_publish_is_depth_first() {
        let bus = Rc::new(EventBus::new());
        let log: Log = Rc::default();

        let inner_bus = Rc::downgrade(&bus);
        let inner_log = log.clone();
        bus.subscribe("ready", move |_, _| {
            inner_log.borrow_mut().push("ready".into());
            if let Some(bus) = inner_bus.upgrade() {
                bus.publish(None, &Event::ZeroOrientation);
            }
            inner_log.borrow_mut().push("ready done".into());
        });
        bus.subscribe("zero_orientation", recorder(&log, "named"));
        bus.subscribe(WILDCARD, recorder(&log, "w"));

        bus.publish(None, &Event::Ready);
        assert_eq!(
            *log.borrow(),
            vec![
                "ready",
                "named:zero_orientation:-",
                "w:zero_orientation:-",
                "ready done",
                "w:ready:-",
            ]
        );
    }

    #[test]
    fn test_subscribe_from_callback() {
        let bus = Rc::new(EventBus::new());
        let log: Log = Rc::default();

        let inner_bus = Rc::downgrade(&bus);
        let inner_log = log.clone();
        bus.subscribe("ready", move |_, _| {
            if let Some(bus) = inner_bus.upgrade() {
                bus.subscribe("socket_closed", recorder(&inner_log, "late"));
            }
        });

        bus.publish(None, &Event::Ready);
        bus.publish(None, &Event::SocketClosed(Default::default()));
        assert_eq!(*log.borrow(), vec!["late:socket_closed:-"]);
    }
}
