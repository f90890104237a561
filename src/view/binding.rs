use std::rc::Rc;

/// Callback subscribed on a model. Identity (not equality) is used to unsubscribe it again.
pub type ModelHandler = Rc<dyn Fn()>;

/// The subscription surface an external data object has to offer so that views can bind to it.
pub trait Model {
    fn on(&self, event: &str, handler: ModelHandler);

    /// Remove a handler previously passed to [`Model::on()`] for the same event.
    fn remove_listener(&self, event: &str, handler: &ModelHandler);
}

pub type ModelRef = Rc<dyn Model>;

/// Whether both references point at the same model instance.
pub fn same_model(a: &ModelRef, b: &ModelRef) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

struct Subscription {
    model: ModelRef,
    event: String,
    handler: ModelHandler,
}

/// The model subscriptions a view holds, so that they can be unbound or moved to another model.
#[derive(Default)]
pub struct Bindings {
    subscriptions: Vec<Subscription>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `handler` to `event` on `model`, and remember the subscription.
    pub fn listen_to<S>(&mut self, model: &ModelRef, event: S, handler: ModelHandler)
    where
        S: AsRef<str>,
    {
        let event = event.as_ref().to_string();
        model.on(&event, Rc::clone(&handler));

        self.subscriptions.push(Subscription {
            model: Rc::clone(model),
            event,
            handler,
        });
    }

    /// Remove the subscriptions on `model`, or every subscription if `None`. Returns how many
    /// were removed.
    pub fn unbind(&mut self, model: Option<&ModelRef>) -> usize {
        let before = self.subscriptions.len();

        self.subscriptions.retain(|subscription| {
            let matches = model.map_or(true, |model| same_model(model, &subscription.model));
            if matches {
                subscription
                    .model
                    .remove_listener(&subscription.event, &subscription.handler);
            }

            !matches
        });

        before - self.subscriptions.len()
    }

    /// Unsubscribe the subscriptions on `from` (every subscription if `None`), then subscribe the
    /// same handlers on `to`, or back on their own model if `None`. Every matching subscription
    /// is removed before any is re-established. Returns how many were moved.
    pub fn rebind(&mut self, from: Option<&ModelRef>, to: Option<&ModelRef>) -> usize {
        let matching = self
            .subscriptions
            .iter()
            .enumerate()
            .filter(|(_, subscription)| {
                from.map_or(true, |model| same_model(model, &subscription.model))
            })
            .map(|(index, _)| index)
            .collect::<Vec<_>>();

        matching.iter().for_each(|index| {
            let subscription = &self.subscriptions[*index];
            subscription
                .model
                .remove_listener(&subscription.event, &subscription.handler);
        });

        matching.iter().for_each(|index| {
            let subscription = &mut self.subscriptions[*index];
            if let Some(to) = to {
                subscription.model = Rc::clone(to);
            }
            subscription
                .model
                .on(&subscription.event, Rc::clone(&subscription.handler));
        });

        matching.len()
    }

    /// Whether any subscription is held on `model`.
    pub fn is_bound_to(&self, model: &ModelRef) -> bool {
        self.subscriptions
            .iter()
            .any(|subscription| same_model(model, &subscription.model))
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::RefCell;

    use super::*;

    /// Records every subscription change as `(call, model id)`.
    pub struct RecordingModel {
        pub id: usize,
        pub calls: Rc<RefCell<Vec<(&'static str, usize)>>>,
        pub handlers: RefCell<Vec<(String, ModelHandler)>>,
    }

    impl RecordingModel {
        pub fn new(id: usize, calls: &Rc<RefCell<Vec<(&'static str, usize)>>>) -> ModelRef {
            Rc::new(Self {
                id,
                calls: Rc::clone(calls),
                handlers: RefCell::new(Vec::new()),
            })
        }
    }

    impl Model for RecordingModel {
        fn on(&self, event: &str, handler: ModelHandler) {
            self.calls.borrow_mut().push(("on", self.id));
            self.handlers.borrow_mut().push((event.to_string(), handler));
        }

        fn remove_listener(&self, event: &str, handler: &ModelHandler) {
            self.calls.borrow_mut().push(("removeListener", self.id));
            self.handlers
                .borrow_mut()
                .retain(|(e, h)| !(e == event && Rc::ptr_eq(h, handler)));
        }
    }

    fn noop() -> ModelHandler {
        Rc::new(|| {})
    }

    #[test]
    fn unbinds_one_model_then_the_rest() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let (model1, model2) = (RecordingModel::new(1, &calls), RecordingModel::new(2, &calls));
        let mut bindings = Bindings::new();

        bindings.listen_to(&model1, "change:foo", noop());
        bindings.listen_to(&model2, "change:foo", noop());

        assert_eq!(bindings.unbind(Some(&model1)), 1);
        assert!(calls.borrow().contains(&("removeListener", 1)));
        assert!(!calls.borrow().contains(&("removeListener", 2)));

        assert_eq!(bindings.unbind(None), 1);
        assert!(calls.borrow().contains(&("removeListener", 2)));
        assert!(bindings.is_empty());
    }

    #[test]
    fn rebind_moves_subscriptions_in_order() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let (model1, model2) = (RecordingModel::new(1, &calls), RecordingModel::new(2, &calls));
        let mut bindings = Bindings::new();

        bindings.listen_to(&model1, "change:foo", noop());
        assert_eq!(bindings.rebind(Some(&model1), Some(&model2)), 1);
        assert_eq!(
            *calls.borrow(),
            [("on", 1), ("removeListener", 1), ("on", 2)]
        );
        assert!(bindings.is_bound_to(&model2));
        assert!(!bindings.is_bound_to(&model1));

        bindings.rebind(Some(&model2), Some(&model1));
        assert_eq!(
            *calls.borrow(),
            [
                ("on", 1),
                ("removeListener", 1),
                ("on", 2),
                ("removeListener", 2),
                ("on", 1)
            ]
        );
    }

    #[test]
    fn rebind_in_place() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let model = RecordingModel::new(7, &calls);
        let mut bindings = Bindings::new();

        bindings.listen_to(&model, "change", noop());
        assert_eq!(bindings.rebind(None, None), 1);

        assert_eq!(
            *calls.borrow(),
            [("on", 7), ("removeListener", 7), ("on", 7)]
        );
        assert_eq!(bindings.len(), 1);
    }
}
