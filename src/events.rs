//! Named game events with entity listeners.
//!
//! A lightweight broadcaster for level scripting: entities register as
//! listeners of a named event, anything with access to [`GameEvents`] can
//! invoke it, and each listener receives a [`GameEventRaised`] on the next
//! dispatch.

use std::collections::{HashMap, HashSet};

use bevy::prelude::*;

/// Delivered once per listener for each invocation of `event`.
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct GameEventRaised {
    pub event: String,
    pub listener: Entity,
}

/// Registry of named events and their listeners.
#[derive(Resource, Debug, Default)]
pub struct GameEvents {
    listeners: HashMap<String, HashSet<Entity>>,
    pending: Vec<String>,
}

impl GameEvents {
    /// Add `listener` to `event`. Registering twice has no extra effect.
    pub fn register(&mut self, event: &str, listener: Entity) -> bool {
        self.listeners
            .entry(event.to_owned())
            .or_default()
            .insert(listener)
    }

    /// Remove `listener` from `event`. Unknown listeners are ignored.
    pub fn deregister(&mut self, event: &str, listener: Entity) -> bool {
        let Some(set) = self.listeners.get_mut(event) else {
            return false;
        };
        let removed = set.remove(&listener);
        if set.is_empty() {
            self.listeners.remove(event);
        }
        removed
    }

    /// Queue `event` for delivery to its current listeners.
    pub fn invoke(&mut self, event: &str) {
        self.pending.push(event.to_owned());
    }

    pub fn listeners(&self, event: &str) -> impl Iterator<Item = Entity> + '_ {
        self.listeners.get(event).into_iter().flatten().copied()
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.get(event).map_or(0, HashSet::len)
    }

    /// Resolve queued invocations against the listeners registered now.
    pub fn drain(&mut self) -> Vec<GameEventRaised> {
        let pending = std::mem::take(&mut self.pending);
        pending
            .into_iter()
            .flat_map(|event| {
                self.listeners(&event)
                    .map(|listener| GameEventRaised {
                        event: event.clone(),
                        listener,
                    })
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}

/// Deliver queued game events.
pub fn dispatch_game_events(
    mut game_events: ResMut<GameEvents>,
    mut raised: EventWriter<GameEventRaised>,
) {
    if game_events.pending.is_empty() {
        return;
    }
    for event in game_events.drain() {
        trace!("Game event {} -> {}", event.event, event.listener);
        raised.write(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(index: u32) -> Entity {
        Entity::from_raw(index)
    }

    #[test]
    fn register_is_idempotent() {
        let mut events = GameEvents::default();
        assert!(events.register("door", entity(1)));
        assert!(!events.register("door", entity(1)));
        assert_eq!(events.listener_count("door"), 1);
    }

    #[test]
    fn deregister_unknown_is_noop() {
        let mut events = GameEvents::default();
        assert!(!events.deregister("door", entity(1)));
        events.register("door", entity(1));
        assert!(!events.deregister("door", entity(2)));
        assert!(events.deregister("door", entity(1)));
        assert_eq!(events.listener_count("door"), 0);
    }

    #[test]
    fn invoke_reaches_every_listener_once() {
        let mut events = GameEvents::default();
        events.register("door", entity(1));
        events.register("door", entity(2));
        events.register("alarm", entity(3));

        events.invoke("door");
        let mut raised: Vec<Entity> = events.drain().into_iter().map(|r| r.listener).collect();
        raised.sort();

        assert_eq!(raised, vec![entity(1), entity(2)]);
        assert!(events.drain().is_empty());
    }

    #[test]
    fn invoke_without_listeners_is_silent() {
        let mut events = GameEvents::default();
        events.invoke("nobody");
        assert!(events.drain().is_empty());
    }

    #[test]
    fn dispatch_writes_bevy_events() {
        let mut app = App::new();
        app.add_event::<GameEventRaised>();
        app.init_resource::<GameEvents>();
        app.add_systems(Update, dispatch_game_events);

        let listener = app.world_mut().spawn_empty().id();
        {
            let mut events = app.world_mut().resource_mut::<GameEvents>();
            events.register("checkpoint", listener);
            events.invoke("checkpoint");
        }
        app.world_mut().run_schedule(Update);

        let raised = app.world().resource::<Events<GameEventRaised>>();
        let mut cursor = raised.get_cursor();
        let delivered: Vec<_> = cursor.read(raised).cloned().collect();
        assert_eq!(
            delivered,
            vec![GameEventRaised {
                event: "checkpoint".to_owned(),
                listener,
            }]
        );
    }
}
