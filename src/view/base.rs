use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use super::{Bindings, ModelHandler, ModelRef};
use crate::{
    error::{Error, Result},
    event::{Emitter, Event, EventKind},
    outlet::State,
    surface::{NodeHandle, Surface, SurfaceRef, Target},
};

/// Reusable state for [`super::View`] implementations: id, lifecycle state, render cache, event
/// emitter and model bindings. Concrete views hold one and delegate to it.
///
/// Every base subscribes itself to [`Event::Unbind`] and [`Event::Rebind`], so emitting either
/// on the view adjusts its model subscriptions.
pub struct ViewBase {
    id: String,
    surface: SurfaceRef,
    emitter: Emitter,
    bindings: Rc<RefCell<Bindings>>,
    state: Cell<State>,
    cache: RefCell<Option<NodeHandle>>,
    destroyed: Cell<bool>,
}

impl ViewBase {
    /// Create a base with a generated id.
    pub fn new(surface: &SurfaceRef) -> Self {
        Self::with_id(surface, surface.id())
    }

    pub fn with_id<S>(surface: &SurfaceRef, id: S) -> Self
    where
        S: AsRef<str>,
    {
        let emitter = Emitter::new();
        let bindings = Rc::new(RefCell::new(Bindings::new()));

        emitter.on(EventKind::Unbind, {
            let bindings = Rc::clone(&bindings);
            move |event| {
                if let Event::Unbind(model) = event {
                    bindings.borrow_mut().unbind(model.as_ref());
                }
            }
        });

        emitter.on(EventKind::Rebind, {
            let bindings = Rc::clone(&bindings);
            move |event| {
                if let Event::Rebind(from, to) = event {
                    bindings.borrow_mut().rebind(from.as_ref(), to.as_ref());
                }
            }
        });

        Self {
            id: id.as_ref().to_string(),
            surface: Rc::clone(surface),
            emitter,
            bindings,
            state: Cell::new(State::Initial),
            cache: RefCell::new(None),
            destroyed: Cell::new(false),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn surface(&self) -> &dyn Surface {
        &*self.surface
    }

    pub fn emitter(&self) -> &Emitter {
        &self.emitter
    }

    pub fn state(&self) -> State {
        self.state.get()
    }

    /// The cached visual result, if rendered.
    pub fn rendered(&self) -> Option<NodeHandle> {
        self.cache.borrow().clone()
    }

    /// Return the cached result, or run `build` once to produce it and emit [`Event::Render`].
    pub fn render_with<F>(&self, build: F) -> Result<NodeHandle>
    where
        F: FnOnce(&dyn Surface, &str) -> Result<NodeHandle>,
    {
        if let Some(node) = self.rendered() {
            return Ok(node);
        }

        let node = build(&*self.surface, &self.id)?;

        *self.cache.borrow_mut() = Some(node.clone());
        self.state.set(State::Rendered);
        self.destroyed.set(false);
        log::trace!("view `{}` rendered", self.id);

        self.emitter.emit(&Event::Render);

        Ok(node)
    }

    /// Move to [`State::Attached`] and emit [`Event::Attach`]. Returns `false` if already
    /// attached.
    pub fn attach(&self) -> Result<bool> {
        match self.state() {
            State::Initial => Err(Error::Consistency(format!(
                "view `{}` attached before being rendered",
                self.id
            ))),
            State::Attached | State::Bound => Ok(false),
            State::Rendered => {
                self.state.set(State::Attached);
                log::trace!("view `{}` attached", self.id);
                self.emitter.emit(&Event::Attach);

                Ok(true)
            }
        }
    }

    /// Move back to [`State::Rendered`] and emit [`Event::Detach`]. Returns `false` if the view
    /// was not attached.
    pub fn detach(&self) -> Result<bool> {
        if self.state() < State::Attached {
            return Ok(false);
        }

        self.state.set(State::Rendered);
        self.emitter.emit(&Event::Detach);

        Ok(true)
    }

    /// Set the visibility of the rendered element, and emit [`Event::Show`] or [`Event::Hide`].
    pub fn toggle(&self, visible: bool) -> Result<()> {
        if let Some(node) = self.rendered() {
            self.surface.toggle(&Target::Node(node), visible)?;
        }

        self.emitter.emit(&Event::visibility(visible));

        Ok(())
    }

    /// Unbind every model, take the element off the surface, and emit [`Event::Destroy`].
    /// Returns `false` if the view was already destroyed.
    pub fn destroy(&self) -> Result<bool> {
        if self.destroyed.get() {
            return Ok(false);
        }

        if let Some(node) = self.cache.borrow_mut().take() {
            self.surface.remove(&Target::Node(node))?;
        }

        self.bindings.borrow_mut().unbind(None);
        self.state.set(State::Initial);
        self.destroyed.set(true);
        log::debug!("view `{}` destroyed", self.id);

        self.emitter.emit(&Event::Destroy);

        Ok(true)
    }

    /// Subscribe `handler` to `event` on `model`. The subscription is removed by
    /// [`Event::Unbind`] and moved by [`Event::Rebind`].
    pub fn listen_to<S, F>(&self, model: &ModelRef, event: S, handler: F)
    where
        S: AsRef<str>,
        F: 'static + Fn(),
    {
        self.bindings
            .borrow_mut()
            .listen_to(model, event, Rc::new(handler) as ModelHandler);

        if self.state() == State::Attached {
            self.state.set(State::Bound);
        }
    }

    /// Number of model subscriptions held.
    pub fn binding_count(&self) -> usize {
        self.bindings.borrow().len()
    }

    pub fn is_bound_to(&self, model: &ModelRef) -> bool {
        self.bindings.borrow().is_bound_to(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        surface::{Attributes, MemorySurface},
        view::RecordingModel,
    };

    fn base() -> (Rc<MemorySurface>, ViewBase) {
        let surface = Rc::new(MemorySurface::new());
        let base = ViewBase::new(&(Rc::clone(&surface) as SurfaceRef));

        (surface, base)
    }

    fn build(surface: &dyn Surface, id: &str) -> Result<NodeHandle> {
        surface.tag("p", &Attributes::from([("id".into(), id.into())]), &[])
    }

    #[test]
    fn render_is_cached() {
        let (_surface, base) = base();
        let renders = Rc::new(Cell::new(0));
        base.emitter().on(EventKind::Render, {
            let renders = Rc::clone(&renders);
            move |_| renders.set(renders.get() + 1)
        });

        let first = base.render_with(build).unwrap();
        let second = base
            .render_with(|_, _| panic!("render must be cached"))
            .unwrap();

        assert!(NodeHandle::ptr_eq(&first, &second));
        assert_eq!(renders.get(), 1);
        assert_eq!(base.state(), State::Rendered);
    }

    #[test]
    fn attach_requires_render_and_happens_once() {
        let (_surface, base) = base();

        assert!(matches!(base.attach(), Err(Error::Consistency(_))));

        base.render_with(build).unwrap();
        assert!(base.attach().unwrap());
        assert!(!base.attach().unwrap());
        assert!(base.detach().unwrap());
        assert_eq!(base.state(), State::Rendered);
    }

    #[test]
    fn destroy_removes_element_and_bindings_once() {
        let (surface, base) = base();
        let calls = Rc::new(RefCell::new(Vec::new()));
        let model = RecordingModel::new(1, &calls);

        let node = base.render_with(build).unwrap();
        surface.append(&"body".into(), &[node.clone()]).unwrap();
        base.listen_to(&model, "change", || {});

        assert!(base.destroy().unwrap());
        assert!(!base.destroy().unwrap());
        assert!(!surface.is_live(&node));
        assert_eq!(base.binding_count(), 0);
        assert_eq!(*calls.borrow(), [("on", 1), ("removeListener", 1)]);
    }

    #[test]
    fn binding_after_attach_marks_bound() {
        let (_surface, base) = base();
        let calls = Rc::new(RefCell::new(Vec::new()));
        let model = RecordingModel::new(1, &calls);

        base.render_with(build).unwrap();
        base.attach().unwrap();
        base.listen_to(&model, "change", || {});

        assert_eq!(base.state(), State::Bound);
        assert!(base.is_bound_to(&model));
    }
}
