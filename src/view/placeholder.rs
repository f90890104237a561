use std::{any::Any, cell::RefCell, rc::Rc};

use super::{ModelRef, View, ViewBase};
use crate::{
    error::Result,
    event::Emitter,
    surface::{Attributes, NodeHandle, SurfaceRef},
};

/// A leaf view rendering a fixed piece of markup inside a `div`.
pub struct Placeholder {
    base: ViewBase,
    text: String,
    model: RefCell<Option<ModelRef>>,
}

impl Placeholder {
    pub fn new<S>(surface: &SurfaceRef, text: S) -> Rc<Self>
    where
        S: AsRef<str>,
    {
        Rc::new(Self {
            base: ViewBase::new(surface),
            text: text.as_ref().to_string(),
            model: RefCell::new(None),
        })
    }

    pub fn base(&self) -> &ViewBase {
        &self.base
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// The model bound through [`View::bind()`], if any.
    pub fn model(&self) -> Option<ModelRef> {
        self.model.borrow().clone()
    }

    /// See [`ViewBase::listen_to()`].
    pub fn listen_to<S, F>(&self, model: &ModelRef, event: S, handler: F)
    where
        S: AsRef<str>,
        F: 'static + Fn(),
    {
        self.base.listen_to(model, event, handler);
    }
}

impl View for Placeholder {
    fn id(&self) -> &str {
        self.base.id()
    }

    fn emitter(&self) -> &Emitter {
        self.base.emitter()
    }

    fn render(&self) -> Result<NodeHandle> {
        self.base.render_with(|surface, id| {
            let text = surface.markup(&self.text)?;
            let attributes = Attributes::from([
                ("id".to_string(), id.to_string()),
                ("class".to_string(), "placeholder".to_string()),
            ]);

            surface.tag("div", &attributes, &text)
        })
    }

    fn attach(&self) -> Result<()> {
        self.base.attach().map(|_| ())
    }

    fn detach(&self) -> Result<()> {
        self.base.detach().map(|_| ())
    }

    fn toggle(&self, visible: bool, _context: Option<&dyn Any>) -> Result<()> {
        self.base.toggle(visible)
    }

    fn destroy(&self) -> Result<()> {
        self.base.destroy()?;
        self.model.borrow_mut().take();

        Ok(())
    }

    fn bind(&self, model: &ModelRef) -> Result<()> {
        let id = self.base.id().to_string();
        self.base.listen_to(model, "change", move || {
            log::debug!("model bound to `{id}` changed");
        });
        *self.model.borrow_mut() = Some(Rc::clone(model));

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::{
        event::{Event, EventKind},
        surface::{MemorySurface, Surface},
        view::RecordingModel,
    };

    fn surface() -> (Rc<MemorySurface>, SurfaceRef) {
        let memory = Rc::new(MemorySurface::new());
        let surface = Rc::clone(&memory) as SurfaceRef;

        (memory, surface)
    }

    #[test_log::test]
    fn renders_markup_in_a_div() {
        let (memory, surface) = surface();
        let view = Placeholder::new(&surface, "Hello");

        let node = view.render().unwrap();
        memory.update(&"body".into(), &[node]).unwrap();

        assert_eq!(
            memory.html(view.id()).unwrap(),
            format!(r#"<div class="placeholder" id="{}">Hello</div>"#, view.id())
        );
    }

    #[test_log::test]
    fn show_and_hide_are_emitted() {
        let (memory, surface) = surface();
        let view = Placeholder::new(&surface, "Hello");
        let events = Rc::new(RefCell::new(Vec::new()));

        for kind in [EventKind::Show, EventKind::Hide] {
            view.emitter().once(kind, {
                let events = Rc::clone(&events);
                move |event| events.borrow_mut().push(event.kind())
            });
        }

        let node = view.render().unwrap();
        memory.update(&"body".into(), &[node]).unwrap();
        view.toggle(true, None).unwrap();
        view.toggle(false, None).unwrap();

        assert_eq!(*events.borrow(), [EventKind::Show, EventKind::Hide]);
        assert!(!memory.is_visible(view.id()).unwrap());
    }

    #[test_log::test]
    fn unbind_targets_one_model_or_all() {
        let (_memory, surface) = surface();
        let calls = Rc::new(RefCell::new(Vec::new()));
        let (model1, model2) = (RecordingModel::new(1, &calls), RecordingModel::new(2, &calls));
        let view = Placeholder::new(&surface, "Hello");

        view.listen_to(&model1, "change:foo", || {});
        view.listen_to(&model2, "change:foo", || {});

        view.emit(&Event::Unbind(Some(Rc::clone(&model1))));
        assert!(calls.borrow().contains(&("removeListener", 1)));
        assert!(!calls.borrow().contains(&("removeListener", 2)));

        view.emit(&Event::Unbind(None));
        assert!(calls.borrow().contains(&("removeListener", 2)));
    }

    #[test_log::test]
    fn rebind_moves_to_the_new_model() {
        let (_memory, surface) = surface();
        let calls = Rc::new(RefCell::new(Vec::new()));
        let (model1, model2) = (RecordingModel::new(1, &calls), RecordingModel::new(2, &calls));
        let view = Placeholder::new(&surface, "Hello");

        view.listen_to(&model1, "change:foo", || {});
        view.emit(&Event::Rebind(Some(Rc::clone(&model1)), Some(Rc::clone(&model2))));
        assert_eq!(
            *calls.borrow(),
            [("on", 1), ("removeListener", 1), ("on", 2)]
        );

        view.emit(&Event::Rebind(Some(model2), Some(model1)));
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

    #[test_log::test]
    fn bind_subscribes_to_model_changes() {
        let (_memory, surface) = surface();
        let calls = Rc::new(RefCell::new(Vec::new()));
        let model = RecordingModel::new(3, &calls);
        let view = Placeholder::new(&surface, "Hello");
        let destroyed = Rc::new(Cell::new(false));
        view.emitter().on(EventKind::Destroy, {
            let destroyed = Rc::clone(&destroyed);
            move |_| destroyed.set(true)
        });

        view.bind(&model).unwrap();
        assert!(view.model().is_some());
        assert!(view.base().is_bound_to(&model));

        view.destroy().unwrap();
        assert!(destroyed.get());
        assert!(view.model().is_none());
        assert_eq!(*calls.borrow(), [("on", 3), ("removeListener", 3)]);
    }
}
