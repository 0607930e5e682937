use std::fmt;

use enum_map::{Enum, EnumMap};
use serde::Serialize;

use crate::snake::Position;

/// Discriminant of a [`GameEvent`], used as the subscription key.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Enum)]
pub enum EventKind {
    HeadAdded,
    TailRemoved,
    AppleMoved,
    ScoreChanged,
    Captured,
    Failed,
}

impl EventKind {
    /// Iterates over every event kind.
    pub fn iter() -> impl Iterator<Item = EventKind> {
        (0..Self::LENGTH).map(Self::from_usize)
    }
}

/// Notification emitted by the engine.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum GameEvent {
    /// A new head cell was inserted.
    HeadAdded { position: Position },
    /// A cell is no longer part of the snake, either the tail after a move or
    /// any body cell retracted by a reset.
    TailRemoved { position: Position },
    AppleMoved { position: Position },
    ScoreChanged { score: u32 },
    /// The next head coincides with the apple. Fires before the move is
    /// checked for validity.
    Captured { position: Position },
    Failed,
}

impl GameEvent {
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::HeadAdded { .. } => EventKind::HeadAdded,
            Self::TailRemoved { .. } => EventKind::TailRemoved,
            Self::AppleMoved { .. } => EventKind::AppleMoved,
            Self::ScoreChanged { .. } => EventKind::ScoreChanged,
            Self::Captured { .. } => EventKind::Captured,
            Self::Failed => EventKind::Failed,
        }
    }
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HeadAdded { position } => write!(f, "head added at {position}"),
            Self::TailRemoved { position } => write!(f, "cell removed at {position}"),
            Self::AppleMoved { position } => write!(f, "apple moved to {position}"),
            Self::ScoreChanged { score } => write!(f, "score is now {score}"),
            Self::Captured { position } => write!(f, "apple captured at {position}"),
            Self::Failed => f.write_str("snake crashed"),
        }
    }
}

/// Handle returned by [`EventBus::subscribe`]; needed to unsubscribe.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// Callback invoked synchronously for every matching event.
pub type Callback = Box<dyn FnMut(&GameEvent)>;

struct Subscriber {
    id: SubscriptionId,
    callback: Callback,
}

/// Per-kind ordered subscriber lists.
///
/// Delivery is synchronous and follows subscription order. Callbacks receive
/// a shared reference to the event and cannot reach the bus while it is
/// delivering, so the subscriber list is fixed for the whole round.
#[derive(Default)]
pub struct EventBus {
    subscribers: EnumMap<EventKind, Vec<Subscriber>>,
    next_id: u64,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback` for events of `kind`.
    pub fn subscribe(&mut self, kind: EventKind, callback: Callback) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers[kind].push(Subscriber { id, callback });
        log::debug!("Subscribed {id:?} to {kind:?}");
        id
    }

    /// Removes the subscriber `id` from `kind`.
    ///
    /// Returns whether anything was removed; unknown ids are ignored.
    pub fn unsubscribe(&mut self, kind: EventKind, id: SubscriptionId) -> bool {
        let list = &mut self.subscribers[kind];
        let Some(index) = list.iter().position(|s| s.id == id) else {
            return false;
        };
        list.remove(index);
        log::debug!("Unsubscribed {id:?} from {kind:?}");
        true
    }

    /// Delivers `event` to every subscriber of its kind.
    pub fn emit(&mut self, event: &GameEvent) {
        for subscriber in &mut self.subscribers[event.kind()] {
            (subscriber.callback)(event);
        }
    }

    /// Returns the number of subscribers registered for `kind`.
    #[must_use]
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.subscribers[kind].len()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (kind, list) in &self.subscribers {
            map.entry(&kind, &list.len());
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use pretty_assertions::assert_eq;

    use super::{EventBus, EventKind, GameEvent};
    use crate::snake::Position;

    fn recorder(log: &Rc<RefCell<Vec<String>>>, label: &'static str) -> super::Callback {
        let log = Rc::clone(log);
        Box::new(move |event: &GameEvent| {
            log.borrow_mut()
                .push(format!("{label}:{:?}", event.kind()));
        })
    }

    #[test]
    fn delivery_follows_subscription_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();
        bus.subscribe(EventKind::Failed, recorder(&log, "first"));
        bus.subscribe(EventKind::Failed, recorder(&log, "second"));
        bus.subscribe(EventKind::Failed, recorder(&log, "third"));

        bus.emit(&GameEvent::Failed);

        assert_eq!(
            *log.borrow(),
            vec!["first:Failed", "second:Failed", "third:Failed"]
        );
    }

    #[test]
    fn events_only_reach_their_kind() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();
        bus.subscribe(EventKind::HeadAdded, recorder(&log, "head"));
        bus.subscribe(EventKind::ScoreChanged, recorder(&log, "score"));

        bus.emit(&GameEvent::ScoreChanged { score: 1 });
        bus.emit(&GameEvent::TailRemoved {
            position: Position { x: 0, y: 0 },
        });

        assert_eq!(*log.borrow(), vec!["score:ScoreChanged"]);
    }

    #[test]
    fn unsubscribe_removes_only_that_callback() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();
        let first = bus.subscribe(EventKind::Captured, recorder(&log, "first"));
        bus.subscribe(EventKind::Captured, recorder(&log, "second"));

        assert!(bus.unsubscribe(EventKind::Captured, first));
        bus.emit(&GameEvent::Captured {
            position: Position { x: 1, y: 1 },
        });

        assert_eq!(*log.borrow(), vec!["second:Captured"]);
        assert_eq!(bus.subscriber_count(EventKind::Captured), 1);
    }

    #[test]
    fn unsubscribe_is_idempotent() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();
        let id = bus.subscribe(EventKind::AppleMoved, recorder(&log, "apple"));

        assert!(bus.unsubscribe(EventKind::AppleMoved, id));
        assert!(!bus.unsubscribe(EventKind::AppleMoved, id));
        assert_eq!(bus.subscriber_count(EventKind::AppleMoved), 0);
    }

    #[test]
    fn unsubscribe_under_wrong_kind_is_ignored() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();
        let id = bus.subscribe(EventKind::HeadAdded, recorder(&log, "head"));

        assert!(!bus.unsubscribe(EventKind::TailRemoved, id));
        assert_eq!(bus.subscriber_count(EventKind::HeadAdded), 1);
    }

    #[test]
    fn ids_are_not_reused() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();
        let first = bus.subscribe(EventKind::Failed, recorder(&log, "a"));
        bus.unsubscribe(EventKind::Failed, first);
        let second = bus.subscribe(EventKind::Failed, recorder(&log, "b"));

        assert_ne!(first, second);
    }

    #[test]
    fn kind_iteration_covers_every_variant() {
        assert_eq!(EventKind::iter().count(), 6);
    }

    #[test]
    fn events_display_for_text_output() {
        let event = GameEvent::Captured {
            position: Position { x: 3, y: -1 },
        };

        assert_eq!(event.to_string(), "apple captured at (3, -1)");
        assert_eq!(GameEvent::Failed.to_string(), "snake crashed");
    }

    #[test]
    fn events_serialize_as_tagged_json() {
        let json = serde_json::to_string(&GameEvent::HeadAdded {
            position: Position { x: 6, y: 5 },
        })
        .unwrap();
        assert_eq!(json, r#"{"event":"head-added","position":{"x":6,"y":5}}"#);

        let json = serde_json::to_string(&GameEvent::Failed).unwrap();
        assert_eq!(json, r#"{"event":"failed"}"#);
    }
}
