use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::Rc,
};

use crate::{util::HashMapList, view::ModelRef};

/// Every notification an outlet or view can emit.
#[derive(Clone)]
pub enum Event {
    /// The renderable produced its visual result.
    Render,

    /// The renderable's visual result is now part of the live surface tree.
    Attach,

    /// The renderable was taken out of the live surface tree.
    Detach,

    Show,
    Hide,

    /// The renderable released its resources. Emitted at most once per lifecycle.
    Destroy,

    /// An outlet re-synchronised the order of its children.
    Sort,

    /// Remove model subscriptions: of one model, or of all models when `None`.
    Unbind(Option<ModelRef>),

    /// Re-establish model subscriptions. `(None, None)` rebinds everything in place, `(Some(m),
    /// None)` rebinds the subscriptions of `m`, and `(Some(old), Some(new))` moves the
    /// subscriptions of `old` onto `new`.
    Rebind(Option<ModelRef>, Option<ModelRef>),
}

/// Payload-free discriminant of [`Event`], used to subscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Render,
    Attach,
    Detach,
    Show,
    Hide,
    Destroy,
    Sort,
    Unbind,
    Rebind,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Render => EventKind::Render,
            Event::Attach => EventKind::Attach,
            Event::Detach => EventKind::Detach,
            Event::Show => EventKind::Show,
            Event::Hide => EventKind::Hide,
            Event::Destroy => EventKind::Destroy,
            Event::Sort => EventKind::Sort,
            Event::Unbind(_) => EventKind::Unbind,
            Event::Rebind(..) => EventKind::Rebind,
        }
    }

    /// `Show` or `Hide` depending on the requested visibility.
    pub fn visibility(visible: bool) -> Self {
        if visible {
            Event::Show
        } else {
            Event::Hide
        }
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Unbind(model) => write!(f, "Unbind({})", bound(model)),
            Event::Rebind(from, to) => write!(f, "Rebind({}, {})", bound(from), bound(to)),
            _ => write!(f, "{:?}", self.kind()),
        }
    }
}

fn bound(model: &Option<ModelRef>) -> &'static str {
    match model {
        Some(_) => "model",
        None => "-",
    }
}

impl From<EventKind> for &'static str {
    fn from(kind: EventKind) -> Self {
        use EventKind::*;

        match kind {
            Render => "render",
            Attach => "attach",
            Detach => "detach",
            Show => "show",
            Hide => "hide",
            Destroy => "destroy",
            Sort => "sort",
            Unbind => "unbind",
            Rebind => "rebind",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str((*self).into())
    }
}

pub type Handler = Rc<dyn Fn(&Event)>;

/// Returned by [`Emitter::on()`] and [`Emitter::once()`], to later remove the subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(usize);

struct Listener {
    id: ListenerId,
    once: bool,
    handler: Handler,
}

/// Publish/subscribe primitive carried by every outlet and view.
///
/// Handlers run after the listener table has been released, so a handler may subscribe,
/// unsubscribe or emit on the same emitter.
#[derive(Default)]
pub struct Emitter {
    listeners: RefCell<HashMapList<EventKind, Listener>>,
    next_id: Cell<usize>,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to every future event of `kind`.
    pub fn on<F>(&self, kind: EventKind, handler: F) -> ListenerId
    where
        F: 'static + Fn(&Event),
    {
        self.subscribe(kind, false, Rc::new(handler))
    }

    /// Subscribe to the next event of `kind` only.
    pub fn once<F>(&self, kind: EventKind, handler: F) -> ListenerId
    where
        F: 'static + Fn(&Event),
    {
        self.subscribe(kind, true, Rc::new(handler))
    }

    fn subscribe(&self, kind: EventKind, once: bool, handler: Handler) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);

        self.listeners.borrow_mut().insert(
            kind,
            Listener {
                id,
                once,
                handler,
            },
        );

        id
    }

    /// Returns whether a listener was removed.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners
            .borrow_mut()
            .retain_all(|listener| listener.id != id)
            > 0
    }

    /// Drop every listener of `kind`, or every listener at all.
    pub fn remove_all(&self, kind: Option<EventKind>) {
        let mut listeners = self.listeners.borrow_mut();

        match kind {
            Some(kind) => listeners.retain(&kind, |_| false),
            None => listeners.retain_all(|_| false),
        };
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.borrow().get(&kind).len()
    }

    /// Call every handler subscribed to the event's kind, in subscription order. Returns the
    /// number of handlers called.
    pub fn emit(&self, event: &Event) -> usize {
        let kind = event.kind();

        let handlers = {
            let mut listeners = self.listeners.borrow_mut();
            let handlers = listeners
                .get(&kind)
                .iter()
                .map(|listener| Rc::clone(&listener.handler))
                .collect::<Vec<_>>();
            listeners.retain(&kind, |listener| !listener.once);

            handlers
        };

        log::trace!("emit {kind} to {} handler(s)", handlers.len());

        handlers.iter().for_each(|handler| handler(event));

        handlers.len()
    }
}

impl fmt::Debug for Emitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("listeners", &self.listeners.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> (Rc<RefCell<Vec<&'static str>>>, Emitter) {
        (Rc::new(RefCell::new(Vec::new())), Emitter::new())
    }

    #[test]
    fn handlers_run_in_subscription_order() {
        let (log, emitter) = recorder();

        emitter.on(EventKind::Render, {
            let log = Rc::clone(&log);
            move |_| log.borrow_mut().push("first")
        });
        emitter.on(EventKind::Render, {
            let log = Rc::clone(&log);
            move |_| log.borrow_mut().push("second")
        });
        emitter.on(EventKind::Attach, {
            let log = Rc::clone(&log);
            move |_| log.borrow_mut().push("attach")
        });

        assert_eq!(emitter.emit(&Event::Render), 2);
        assert_eq!(*log.borrow(), ["first", "second"]);
    }

    #[test]
    fn once_fires_a_single_time() {
        let (log, emitter) = recorder();

        emitter.once(EventKind::Destroy, {
            let log = Rc::clone(&log);
            move |_| log.borrow_mut().push("destroy")
        });

        emitter.emit(&Event::Destroy);
        emitter.emit(&Event::Destroy);

        assert_eq!(*log.borrow(), ["destroy"]);
        assert_eq!(emitter.listener_count(EventKind::Destroy), 0);
    }

    #[test]
    fn removed_listeners_stop_receiving() {
        let (log, emitter) = recorder();

        let id = emitter.on(EventKind::Show, {
            let log = Rc::clone(&log);
            move |_| log.borrow_mut().push("show")
        });

        assert!(emitter.remove_listener(id));
        assert!(!emitter.remove_listener(id));
        assert_eq!(emitter.emit(&Event::visibility(true)), 0);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn handlers_may_reenter_the_emitter() {
        let emitter = Rc::new(Emitter::new());
        let count = Rc::new(Cell::new(0));

        emitter.on(EventKind::Sort, {
            let emitter = Rc::downgrade(&emitter);
            let count = Rc::clone(&count);
            move |_| {
                count.set(count.get() + 1);
                if let Some(emitter) = emitter.upgrade() {
                    emitter.once(EventKind::Sort, |_| {});
                }
            }
        });

        emitter.emit(&Event::Sort);

        assert_eq!(count.get(), 1);
        assert_eq!(emitter.listener_count(EventKind::Sort), 2);
    }

    #[test]
    fn kinds_have_wire_names() {
        assert_eq!(EventKind::Rebind.to_string(), "rebind");
        assert_eq!(Event::Hide.kind(), EventKind::Hide);
        assert_eq!(format!("{:?}", Event::Unbind(None)), "Unbind(-)");
    }
}
