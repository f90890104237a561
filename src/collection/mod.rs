//! Projection of an ordered collection of models onto an [`Outlet`], one child view per model.

use std::{
    any::Any,
    cell::{Cell, RefCell},
    rc::Rc,
};

use crate::{
    error::Result,
    event::{Emitter, Event},
    outlet::{AddOptions, HasOutlet, Outlet, State},
    renderable::Renderable,
    surface::{NodeHandle, Target},
    view::{same_model, ModelRef, View, ViewRef},
};

/// Creates the child view for one model.
pub type ChildViewFactory = Box<dyn Fn() -> ViewRef>;

/// Reactions to changes of the bound collection. Only [`CollectionView::notify()`] invokes them.
pub trait CollectionHooks {
    /// The collection was cleared.
    fn on_reset(&self, _view: &CollectionView) -> Result<()> {
        Ok(())
    }

    /// `model` left the collection.
    fn on_remove(&self, _view: &CollectionView, _model: &ModelRef) -> Result<()> {
        Ok(())
    }
}

/// Hooks that do nothing.
pub struct NoHooks;

impl CollectionHooks for NoHooks {}

/// Hooks that remove (and so destroy) the child views of the models leaving the collection.
pub struct RemoveBoundViews;

impl CollectionHooks for RemoveBoundViews {
    fn on_reset(&self, view: &CollectionView) -> Result<()> {
        view.release_all()
            .into_iter()
            .try_for_each(|child| view.outlet().remove(child).map(|_| ()))
    }

    fn on_remove(&self, view: &CollectionView, model: &ModelRef) -> Result<()> {
        match view.release(model) {
            Some(child) => view.outlet().remove(child).map(|_| ()),
            None => Ok(()),
        }
    }
}

/// A change of the bound collection, as reported by whatever owns it.
#[derive(Clone)]
pub enum CollectionChange {
    Add {
        model: ModelRef,
        at: Option<usize>,
    },
    Remove(ModelRef),
    Reset,
}

/// The binding capability: anything holding an outlet and able to create child views can bind
/// models into it.
pub trait CollectionBinding: HasOutlet {
    fn child_view(&self) -> Result<ViewRef>;

    /// Models already bound into the outlet.
    fn bound_models(&self) -> Vec<ModelRef>;

    /// Create a child view, bind `model` into it, and add it to the outlet. Without an explicit
    /// `options.at`, the view goes after every bound model that precedes `model` within
    /// `collection` (the end if `model` is not part of it), so binding in any order keeps the
    /// collection order.
    fn bind_model(
        &self,
        model: &ModelRef,
        collection: &[ModelRef],
        options: AddOptions,
    ) -> Result<ViewRef> {
        let view = self.child_view()?;
        view.bind(model)?;

        let index_of = |model: &ModelRef| {
            collection
                .iter()
                .position(|item| same_model(item, model))
        };
        let at = options.at.or_else(|| {
            let index = index_of(model)?;
            let preceding = self
                .bound_models()
                .iter()
                .filter(|bound| index_of(*bound).is_some_and(|other| other < index))
                .count();

            Some(preceding.min(self.outlet().len()))
        });
        self.outlet()
            .add(Renderable::View(Rc::clone(&view)), AddOptions { at })?;

        Ok(view)
    }
}

/// A view rendering one child view per bound model inside an [`Outlet`].
pub struct CollectionView {
    emitter: Emitter,
    outlet: Outlet,
    child_view: ChildViewFactory,
    hooks: Box<dyn CollectionHooks>,
    bound: RefCell<Vec<(ModelRef, ViewRef)>>,
    destroyed: Cell<bool>,
}

impl CollectionView {
    pub fn new<F>(outlet: Outlet, child_view: F) -> Rc<Self>
    where
        F: 'static + Fn() -> ViewRef,
    {
        Self::with_hooks(outlet, child_view, NoHooks)
    }

    pub fn with_hooks<F, H>(outlet: Outlet, child_view: F, hooks: H) -> Rc<Self>
    where
        F: 'static + Fn() -> ViewRef,
        H: 'static + CollectionHooks,
    {
        Rc::new(Self {
            emitter: Emitter::new(),
            outlet,
            child_view: Box::new(child_view),
            hooks: Box::new(hooks),
            bound: RefCell::new(Vec::new()),
            destroyed: Cell::new(false),
        })
    }

    /// Bind `model` through a new child view. See [`CollectionBinding::bind_model()`].
    pub fn bind(
        &self,
        model: &ModelRef,
        collection: &[ModelRef],
        options: AddOptions,
    ) -> Result<ViewRef> {
        let view = self.bind_model(model, collection, options)?;
        self.bound
            .borrow_mut()
            .push((Rc::clone(model), Rc::clone(&view)));
        log::debug!(
            "collection `{}`: bound model into `{}` ({} in collection)",
            self.id(),
            view.id(),
            collection.len()
        );

        Ok(view)
    }

    /// Report a change of the bound collection.
    pub fn notify(&self, change: CollectionChange) -> Result<()> {
        match change {
            CollectionChange::Add { model, at } => self
                .bind(&model, &[], AddOptions { at })
                .map(|_| ()),
            CollectionChange::Remove(model) => self.hooks.on_remove(self, &model),
            CollectionChange::Reset => self.hooks.on_reset(self),
        }
    }

    /// Render into `target`, replacing its content, then attach.
    pub fn mount_into<T>(&self, target: T) -> Result<()>
    where
        T: Into<Target>,
    {
        let node = self.render()?;
        self.outlet.surface().update(&target.into(), &[node])?;

        self.attach()
    }

    /// The child view bound to `model`, if any.
    pub fn view_for(&self, model: &ModelRef) -> Option<ViewRef> {
        self.bound
            .borrow()
            .iter()
            .find(|(bound, _)| same_model(bound, model))
            .map(|(_, view)| Rc::clone(view))
    }

    /// Forget the child view bound to `model`, and return it as a renderable.
    pub fn release(&self, model: &ModelRef) -> Option<Renderable> {
        let mut bound = self.bound.borrow_mut();
        let index = bound.iter().position(|(bound, _)| same_model(bound, model))?;

        Some(Renderable::View(bound.remove(index).1))
    }

    /// Forget every bound child view, and return them as renderables.
    pub fn release_all(&self) -> Vec<Renderable> {
        self.bound
            .borrow_mut()
            .drain(..)
            .map(|(_, view)| Renderable::View(view))
            .collect()
    }

    pub fn bound_count(&self) -> usize {
        self.bound.borrow().len()
    }
}

impl HasOutlet for CollectionView {
    fn outlet(&self) -> &Outlet {
        &self.outlet
    }
}

impl CollectionBinding for CollectionView {
    fn child_view(&self) -> Result<ViewRef> {
        Ok((self.child_view)())
    }

    fn bound_models(&self) -> Vec<ModelRef> {
        self.bound
            .borrow()
            .iter()
            .map(|(model, _)| Rc::clone(model))
            .collect()
    }
}

impl View for CollectionView {
    fn id(&self) -> &str {
        self.outlet.id()
    }

    fn emitter(&self) -> &Emitter {
        &self.emitter
    }

    fn render(&self) -> Result<NodeHandle> {
        let rebuild = self.outlet.rendered().is_none();
        let node = self.outlet.render()?;
        if rebuild {
            self.destroyed.set(false);
        }

        Ok(node)
    }

    fn attach(&self) -> Result<()> {
        if self.outlet.state() >= State::Attached {
            return Ok(());
        }
        if self.outlet.state() < State::Rendered {
            self.render()?;
        }

        log::debug!("collection `{}` attached", self.id());
        self.emitter.emit(&Event::Attach);

        self.outlet.attach()
    }

    fn detach(&self) -> Result<()> {
        if self.outlet.state() < State::Attached {
            return Ok(());
        }

        self.emitter.emit(&Event::Detach);

        self.outlet.detach()
    }

    fn toggle(&self, visible: bool, _context: Option<&dyn Any>) -> Result<()> {
        self.outlet.toggle(visible)?;
        self.emitter.emit(&Event::visibility(visible));

        Ok(())
    }

    fn destroy(&self) -> Result<()> {
        if self.destroyed.get() {
            return Ok(());
        }

        self.outlet.destroy()?;
        self.release_all();
        self.destroyed.set(true);

        self.emitter.emit(&Event::Destroy);

        Ok(())
    }
}
