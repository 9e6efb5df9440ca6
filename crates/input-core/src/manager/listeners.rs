//! Prioritized observers of button transitions.
//!
//! Listeners are kept sorted by descending priority.  Each transition is
//! offered to them in that order until one returns
//! [`ListenerResponse::Consumed`]; listeners further down never see that
//! transition, except those whose [`InputListener::observes_consumed`]
//! returns `true`.  Listeners with equal priority run in registration order.
//!
//! Priorities are read when a listener is added and whenever
//! `reorder_listeners` is called, not on every dispatch, so a listener that
//! changes its priority at run time needs an explicit reorder.

use tracing::debug;

use crate::domain::delta::ButtonDelta;
use crate::domain::ids::{DeviceButtonId, DeviceId, ListenerId};
use crate::domain::value::ButtonValue;

/// What a listener wants done with the transition it was just shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerResponse {
    /// Let lower-priority listeners see it too.
    Continue,
    /// Stop here.
    Consumed,
}

/// Observer of committed button transitions.
///
/// By the time a callback runs, `new` is already stored in the device's
/// current state.
#[cfg_attr(test, mockall::automock)]
pub trait InputListener: Send {
    fn on_device_button_bool(
        &mut self,
        device: DeviceId,
        button: DeviceButtonId,
        old: bool,
        new: bool,
    ) -> ListenerResponse {
        let _ = (device, button, old, new);
        ListenerResponse::Continue
    }

    fn on_device_button_float(
        &mut self,
        device: DeviceId,
        button: DeviceButtonId,
        old: f32,
        new: f32,
    ) -> ListenerResponse {
        let _ = (device, button, old, new);
        ListenerResponse::Continue
    }

    fn priority(&self) -> i32 {
        0
    }

    /// Keep receiving transitions another listener already consumed.  The
    /// return value is ignored for those.  Meant for taps such as recorders
    /// that must see every committed change.
    fn observes_consumed(&self) -> bool {
        false
    }
}

// ── Generic priority list ─────────────────────────────────────────────────────

struct Entry<T: ?Sized> {
    key: u32,
    priority: i32,
    item: Box<T>,
}

/// Boxed items kept in descending priority order, stable for ties.
pub(crate) struct PriorityList<T: ?Sized> {
    entries: Vec<Entry<T>>,
    next_key: u32,
}

impl<T: ?Sized> Default for PriorityList<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_key: 0,
        }
    }
}

impl<T: ?Sized> PriorityList<T> {
    pub(crate) fn insert(&mut self, item: Box<T>, priority: i32) -> u32 {
        let key = self.next_key;
        self.next_key += 1;
        self.entries.push(Entry {
            key,
            priority,
            item,
        });
        self.sort();
        key
    }

    pub(crate) fn remove(&mut self, key: u32) -> Option<Box<T>> {
        let position = self.entries.iter().position(|e| e.key == key)?;
        Some(self.entries.remove(position).item)
    }

    pub(crate) fn reprioritize(&mut self, priority: impl Fn(&T) -> i32) {
        for entry in &mut self.entries {
            entry.priority = priority(&entry.item);
        }
        self.sort();
    }

    fn sort(&mut self) {
        // `sort_by` is stable, which keeps registration order among equals.
        self.entries.sort_by(|a, b| b.priority.cmp(&a.priority));
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.entries.iter_mut().map(|e| &mut *e.item)
    }

    pub(crate) fn keys(&self) -> impl Iterator<Item = u32> + '_ {
        self.entries.iter().map(|e| e.key)
    }
}

// ── ListenerRegistry ──────────────────────────────────────────────────────────

#[derive(Default)]
pub struct ListenerRegistry {
    list: PriorityList<dyn InputListener>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, listener: Box<dyn InputListener>) -> ListenerId {
        let priority = listener.priority();
        ListenerId(self.list.insert(listener, priority))
    }

    /// Removes a listener and hands it back.
    pub fn remove(&mut self, id: ListenerId) -> Option<Box<dyn InputListener>> {
        self.list.remove(id.0)
    }

    /// Re-reads every listener's priority and re-sorts.
    pub fn reorder(&mut self) {
        self.list.reprioritize(|l| l.priority());
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Listener ids in dispatch order.
    pub fn ids(&self) -> impl Iterator<Item = ListenerId> + '_ {
        self.list.keys().map(ListenerId)
    }

    /// Offers one transition to the listeners.  Returns how many saw it.
    pub fn dispatch(&mut self, delta: &ButtonDelta) -> usize {
        let mut notified = 0;
        let mut consumed = false;
        for listener in self.list.iter_mut() {
            if consumed && !listener.observes_consumed() {
                continue;
            }
            notified += 1;
            let response = match (delta.old, delta.new) {
                (ButtonValue::Bool(old), ButtonValue::Bool(new)) => {
                    listener.on_device_button_bool(delta.device, delta.button, old, new)
                }
                (old, new) => listener.on_device_button_float(
                    delta.device,
                    delta.button,
                    old.as_float(),
                    new.as_float(),
                ),
            };
            if response == ListenerResponse::Consumed {
                consumed = true;
            }
        }
        notified
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.len())
            .finish()
    }
}

// ── LoggingListener ───────────────────────────────────────────────────────────

/// Logs every transition at `debug` level.  Never consumes.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingListener {
    priority: i32,
}

impl LoggingListener {
    pub fn new(priority: i32) -> Self {
        Self { priority }
    }
}

impl InputListener for LoggingListener {
    fn on_device_button_bool(
        &mut self,
        device: DeviceId,
        button: DeviceButtonId,
        old: bool,
        new: bool,
    ) -> ListenerResponse {
        debug!(%device, button, old, new, "bool button changed");
        ListenerResponse::Continue
    }

    fn on_device_button_float(
        &mut self,
        device: DeviceId,
        button: DeviceButtonId,
        old: f32,
        new: f32,
    ) -> ListenerResponse {
        debug!(%device, button, old, new, "float button changed");
        ListenerResponse::Continue
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;
    use std::sync::{Arc, Mutex};

    /// Records its tag into a shared log and answers with a fixed response.
    struct Tagged {
        tag: &'static str,
        priority: i32,
        response: ListenerResponse,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl InputListener for Tagged {
        fn on_device_button_bool(
            &mut self,
            _device: DeviceId,
            _button: DeviceButtonId,
            _old: bool,
            _new: bool,
        ) -> ListenerResponse {
            self.log.lock().unwrap().push(self.tag);
            self.response
        }

        fn priority(&self) -> i32 {
            self.priority
        }
    }

    fn press() -> ButtonDelta {
        ButtonDelta {
            device: DeviceId::from_raw(1),
            button: 0,
            old: ButtonValue::Bool(false),
            new: ButtonValue::Bool(true),
        }
    }

    fn tagged(
        tag: &'static str,
        priority: i32,
        response: ListenerResponse,
        log: &Arc<Mutex<Vec<&'static str>>>,
    ) -> Box<dyn InputListener> {
        Box::new(Tagged {
            tag,
            priority,
            response,
            log: Arc::clone(log),
        })
    }

    #[test]
    fn test_dispatch_runs_in_descending_priority_order() {
        // Arrange
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ListenerRegistry::new();
        registry.add(tagged("low", 1, ListenerResponse::Continue, &log));
        registry.add(tagged("high", 10, ListenerResponse::Continue, &log));
        registry.add(tagged("mid", 5, ListenerResponse::Continue, &log));

        // Act
        let notified = registry.dispatch(&press());

        // Assert
        assert_eq!(notified, 3);
        assert_eq!(*log.lock().unwrap(), vec!["high", "mid", "low"]);
    }

    #[test]
    fn test_equal_priorities_keep_registration_order() {
        // Arrange
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ListenerRegistry::new();
        registry.add(tagged("first", 0, ListenerResponse::Continue, &log));
        registry.add(tagged("second", 0, ListenerResponse::Continue, &log));

        // Act
        registry.dispatch(&press());

        // Assert
        assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn test_consumed_transition_stops_lower_priorities() {
        // Arrange
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ListenerRegistry::new();
        registry.add(tagged("l1", 10, ListenerResponse::Consumed, &log));
        registry.add(tagged("l2", 5, ListenerResponse::Continue, &log));

        // Act
        registry.dispatch(&press());

        // Assert
        assert_eq!(*log.lock().unwrap(), vec!["l1"]);
    }

    #[test]
    fn test_observer_still_sees_consumed_transition() {
        // Arrange
        struct Tap {
            log: Arc<Mutex<Vec<&'static str>>>,
        }
        impl InputListener for Tap {
            fn on_device_button_bool(
                &mut self,
                _: DeviceId,
                _: DeviceButtonId,
                _: bool,
                _: bool,
            ) -> ListenerResponse {
                self.log.lock().unwrap().push("tap");
                ListenerResponse::Consumed
            }

            fn observes_consumed(&self) -> bool {
                true
            }
        }
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ListenerRegistry::new();
        registry.add(tagged("first", 0, ListenerResponse::Consumed, &log));
        registry.add(Box::new(Tap {
            log: Arc::clone(&log),
        }));
        registry.add(tagged("last", 0, ListenerResponse::Continue, &log));

        // Act
        let notified = registry.dispatch(&press());

        // Assert
        assert_eq!(notified, 2);
        assert_eq!(*log.lock().unwrap(), vec!["first", "tap"]);
    }

    #[test]
    fn test_removed_listener_is_not_called() {
        // Arrange
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ListenerRegistry::new();
        let id = registry.add(tagged("gone", 0, ListenerResponse::Continue, &log));
        registry.add(tagged("kept", 0, ListenerResponse::Continue, &log));

        // Act
        let removed = registry.remove(id);
        registry.dispatch(&press());

        // Assert
        assert!(removed.is_some());
        assert!(registry.remove(id).is_none());
        assert_eq!(*log.lock().unwrap(), vec!["kept"]);
    }

    #[test]
    fn test_float_transitions_use_float_callback() {
        // Arrange
        let mut mock = MockInputListener::new();
        mock.expect_priority().return_const(0);
        mock.expect_on_device_button_float()
            .with(eq(DeviceId::from_raw(2)), eq(21), eq(0.0), eq(4.5))
            .times(1)
            .return_const(ListenerResponse::Continue);
        mock.expect_on_device_button_bool().never();
        let mut registry = ListenerRegistry::new();
        registry.add(Box::new(mock));

        // Act
        registry.dispatch(&ButtonDelta {
            device: DeviceId::from_raw(2),
            button: 21,
            old: ButtonValue::Float(0.0),
            new: ButtonValue::Float(4.5),
        });

        // Assert: expectations are verified when the mock drops
    }
}
