//! Outside-click subscriptions.
//!
//! A surface that wants to hear about clicks outside itself subscribes with
//! its screen area. The subscription is released when the handle drops, so a
//! closed dropdown can never keep listening.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use ratatui::layout::{Position, Rect};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
struct Registry {
    next_id: u64,
    areas: Vec<(SubscriptionId, Rect)>,
}

#[derive(Default)]
pub struct PointerHub {
    registry: Rc<RefCell<Registry>>,
}

impl PointerHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, area: Rect) -> OutsideClickSubscription {
        let mut registry = self.registry.borrow_mut();
        registry.next_id += 1;
        let id = SubscriptionId(registry.next_id);
        registry.areas.push((id, area));
        OutsideClickSubscription {
            id,
            registry: Rc::downgrade(&self.registry),
        }
    }

    /// Ids of every subscriber whose area does not contain `at`.
    pub fn dispatch(&self, at: Position) -> Vec<SubscriptionId> {
        self.registry
            .borrow()
            .areas
            .iter()
            .filter(|(_, area)| !area.contains(at))
            .map(|(id, _)| *id)
            .collect()
    }

    #[cfg(test)]
    pub fn subscriber_count(&self) -> usize {
        self.registry.borrow().areas.len()
    }
}

pub struct OutsideClickSubscription {
    id: SubscriptionId,
    registry: Weak<RefCell<Registry>>,
}

impl OutsideClickSubscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Track layout changes between frames.
    pub fn set_area(&self, area: Rect) {
        if let Some(registry) = self.registry.upgrade() {
            let mut registry = registry.borrow_mut();
            if let Some(entry) = registry.areas.iter_mut().find(|(id, _)| *id == self.id) {
                entry.1 = area;
            }
        }
    }
}

impl Drop for OutsideClickSubscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.borrow_mut().areas.retain(|(id, _)| *id != self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_clicks_outside_are_reported() {
        let hub = PointerHub::new();
        let sub = hub.subscribe(Rect::new(10, 2, 40, 8));

        assert!(hub.dispatch(Position::new(12, 4)).is_empty());
        assert_eq!(hub.dispatch(Position::new(0, 0)), vec![sub.id()]);

        sub.set_area(Rect::new(0, 0, 5, 5));
        assert!(hub.dispatch(Position::new(0, 0)).is_empty());
    }

    #[test]
    fn dropping_the_handle_unsubscribes() {
        let hub = PointerHub::new();
        let first = hub.subscribe(Rect::new(0, 0, 1, 1));
        let second = hub.subscribe(Rect::new(0, 0, 1, 1));
        assert_eq!(hub.subscriber_count(), 2);

        drop(first);
        assert_eq!(hub.subscriber_count(), 1);
        assert_eq!(hub.dispatch(Position::new(30, 30)), vec![second.id()]);
    }

    #[test]
    fn handle_outliving_hub_is_harmless() {
        let hub = PointerHub::new();
        let sub = hub.subscribe(Rect::new(0, 0, 1, 1));
        drop(hub);
        sub.set_area(Rect::new(1, 1, 1, 1));
        drop(sub);
    }
}
