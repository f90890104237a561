mod builder;
mod contents;
mod host;

use std::{
    any::Any,
    cell::{Cell, RefCell},
    fmt,
    rc::Rc,
};

pub use builder::{OutletBuilder, OutletOptions};
pub use host::HasOutlet;

use self::contents::{Contents, Slot};
use crate::{
    error::{Error, Result},
    event::{Emitter, Event, EventKind, ListenerId},
    renderable::Renderable,
    surface::{Attributes, NodeHandle, Position, Surface, SurfaceRef, Target},
};

/// Lifecycle of an outlet or view. Ordered, so that `state >= State::Rendered` reads naturally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum State {
    /// Nothing rendered (or reset).
    Initial = 1,

    /// A visual result exists, but is not part of the live surface.
    Rendered = 2,

    /// The visual result is part of the live surface.
    Attached = 3,

    /// Attached, and listening to bound models.
    Bound = 4,
}

/// Where [`Outlet::add()`] inserts. Appends by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddOptions {
    pub at: Option<usize>,
}

impl AddOptions {
    pub fn at(index: usize) -> Self {
        Self { at: Some(index) }
    }
}

/// An ordered list of renderables wrapped by one element, kept in sync with the surface.
///
/// Cloning an [`Outlet`] clones the handle, not the outlet.
///
/// Handlers of events emitted while the outlet walks its children (render, attach, detach,
/// destroy, queries) must not add, remove, reorder or reset the same outlet. Attempts to do so
/// fail with [`Error::Reentrancy`].
#[derive(Clone)]
pub struct Outlet(Rc<Inner>);

struct Inner {
    id: String,
    tag_name: String,
    attributes: RefCell<Attributes>,
    tag_content: Renderable,
    options: OutletOptions,
    surface: SurfaceRef,
    emitter: Emitter,
    state: Cell<State>,
    contents: RefCell<Contents>,
    cache: RefCell<Option<NodeHandle>>,
    destroyed: Cell<bool>,

    /// Name of the traversal currently walking the contents, if any.
    traversal: Cell<Option<&'static str>>,
}

/// Marks the outlet as being traversed until dropped.
struct Traversal<'a> {
    active: &'a Cell<Option<&'static str>>,
    previous: Option<&'static str>,
}

impl Drop for Traversal<'_> {
    fn drop(&mut self) {
        self.active.set(self.previous);
    }
}

impl Outlet {
    /// Create a new [`OutletBuilder`].
    pub fn build(surface: &SurfaceRef) -> OutletBuilder {
        OutletBuilder::new(surface)
    }

    /// Create an outlet wrapped by a `tag_name` element. Without an `id` attribute, one is
    /// generated by the surface.
    pub fn new<T, C>(surface: &SurfaceRef, tag_name: T, attributes: Attributes, content: C) -> Self
    where
        T: AsRef<str>,
        C: Into<Renderable>,
    {
        Self::with_options(
            surface,
            tag_name,
            attributes,
            content,
            OutletOptions::default(),
        )
    }

    pub fn with_options<T, C>(
        surface: &SurfaceRef,
        tag_name: T,
        mut attributes: Attributes,
        content: C,
        options: OutletOptions,
    ) -> Self
    where
        T: AsRef<str>,
        C: Into<Renderable>,
    {
        let tag_name = match tag_name.as_ref() {
            "" => "div".to_string(),
            name => name.to_string(),
        };
        let id = attributes
            .entry("id".to_string())
            .or_insert_with(|| surface.id())
            .clone();

        Self(Rc::new(Inner {
            id,
            tag_name,
            attributes: RefCell::new(attributes),
            tag_content: content.into(),
            options,
            surface: Rc::clone(surface),
            emitter: Emitter::new(),
            state: Cell::new(State::Initial),
            contents: RefCell::new(Contents::default()),
            cache: RefCell::new(None),
            destroyed: Cell::new(false),
            traversal: Cell::new(None),
        }))
    }

    /// Whether both handles refer to the same outlet.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }

    pub fn id(&self) -> &str {
        &self.0.id
    }

    pub fn tag_name(&self) -> &str {
        &self.0.tag_name
    }

    pub fn attributes(&self) -> Attributes {
        self.0.attributes.borrow().clone()
    }

    /// Set an attribute of the wrapping element. Takes effect on the next render. The `id` is
    /// fixed at construction.
    pub fn set_attribute<K, V>(&self, name: K, value: V) -> Result<()>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        if name.as_ref() == "id" {
            return Err(Error::Consistency(format!(
                "the id of outlet `{}` cannot change",
                self.0.id
            )));
        }

        self.0
            .attributes
            .borrow_mut()
            .insert(name.as_ref().to_string(), value.as_ref().to_string());

        Ok(())
    }

    pub fn tag_content(&self) -> &Renderable {
        &self.0.tag_content
    }

    pub fn options(&self) -> OutletOptions {
        self.0.options
    }

    pub fn state(&self) -> State {
        self.0.state.get()
    }

    pub fn surface(&self) -> &dyn Surface {
        &*self.0.surface
    }

    pub fn surface_ref(&self) -> SurfaceRef {
        Rc::clone(&self.0.surface)
    }

    pub fn emitter(&self) -> &Emitter {
        &self.0.emitter
    }

    pub fn on<F>(&self, kind: EventKind, handler: F) -> ListenerId
    where
        F: 'static + Fn(&Event),
    {
        self.0.emitter.on(kind, handler)
    }

    pub fn once<F>(&self, kind: EventKind, handler: F) -> ListenerId
    where
        F: 'static + Fn(&Event),
    {
        self.0.emitter.once(kind, handler)
    }

    /// The cached visual result, if rendered.
    pub fn rendered(&self) -> Option<NodeHandle> {
        self.0.cache.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.0.contents.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The renderable at `index`, if any.
    pub fn at(&self, index: usize) -> Option<Renderable> {
        self.0.contents.borrow().get(index).cloned()
    }

    pub fn index_of(&self, renderable: &Renderable) -> Option<usize> {
        self.0.contents.borrow().index_of(renderable)
    }

    /// Every held renderable, in order.
    pub fn contents(&self) -> Vec<Renderable> {
        self.0.contents.borrow().renderables()
    }

    fn traverse(&self, operation: &'static str) -> Traversal<'_> {
        let previous = self.0.traversal.replace(Some(operation));

        Traversal {
            active: &self.0.traversal,
            previous,
        }
    }

    fn check_mutable(&self) -> Result<()> {
        match self.0.traversal.get() {
            Some(operation) => Err(Error::Reentrancy {
                id: self.0.id.clone(),
                operation,
            }),
            None => Ok(()),
        }
    }

    /// Produce the wrapping element containing the tag content followed by every held
    /// renderable. The first call emits [`Event::Render`]; later calls return the cached
    /// element until [`Outlet::reset()`].
    pub fn render(&self) -> Result<NodeHandle> {
        if let Some(node) = self.rendered() {
            return Ok(node);
        }

        let _traversal = self.traverse("render");
        let surface = self.surface();

        let mut nodes = self.0.tag_content.render(surface)?;
        let children = self.contents();
        let mut child_nodes = Vec::with_capacity(children.len());
        for child in &children {
            let rendered = child.render(surface)?;
            nodes.extend(rendered.iter().cloned());
            child_nodes.push(rendered);
        }

        let node = surface.tag(&self.0.tag_name, &self.0.attributes.borrow(), &nodes)?;

        self.0.contents.borrow_mut().set_nodes(child_nodes);
        *self.0.cache.borrow_mut() = Some(node.clone());
        self.0.state.set(State::Rendered);
        self.0.destroyed.set(false);
        log::trace!(
            "outlet `{}` rendered with {} child(ren)",
            self.0.id,
            children.len()
        );

        self.0.emitter.emit(&Event::Render);

        Ok(node)
    }

    /// Emit [`Event::Attach`] on the outlet, then attach the tag content and every held
    /// renderable, in order. Renders first if required. Does nothing if already attached.
    pub fn attach(&self) -> Result<()> {
        if self.state() >= State::Attached {
            return Ok(());
        }
        if self.state() < State::Rendered {
            self.render()?;
        }

        let _traversal = self.traverse("attach");
        self.0.state.set(State::Attached);
        log::trace!("outlet `{}` attached", self.0.id);

        self.0.emitter.emit(&Event::Attach);

        self.0.tag_content.attach()?;
        self.contents().iter().try_for_each(Renderable::attach)
    }

    /// Emit [`Event::Detach`] on the outlet, then detach everything it holds. The element stays
    /// where it is on the surface; removing it is up to the caller.
    pub fn detach(&self) -> Result<()> {
        if self.state() < State::Attached {
            return Ok(());
        }

        let _traversal = self.traverse("detach");
        self.0.state.set(State::Rendered);
        log::trace!("outlet `{}` detached", self.0.id);

        self.0.emitter.emit(&Event::Detach);

        self.0.tag_content.detach()?;
        self.contents().iter().try_for_each(Renderable::detach)
    }

    /// Where a renderable inserted at `index` goes on the surface.
    fn position_for(&self, index: usize) -> Position {
        let container = match self.rendered() {
            Some(node) => Target::Node(node),
            None if self.surface().contains(&self.0.id) => Target::Id(self.0.id.clone()),
            None => return Position::None,
        };

        match self.0.contents.borrow().anchor_from(index) {
            Some(anchor) => Position::Before(Target::Node(anchor)),
            None => Position::Append(container),
        }
    }

    /// Insert `renderable` at `options.at` (default: the end), both in the contents and on the
    /// surface. When the outlet is attached, the renderable is attached too.
    pub fn add<R>(&self, renderable: R, options: AddOptions) -> Result<()>
    where
        R: Into<Renderable>,
    {
        let renderable = renderable.into();
        self.check_mutable()?;

        let len = self.len();
        let index = options.at.unwrap_or(len);
        if index > len {
            return Err(Error::Consistency(format!(
                "cannot add at {index}, outlet `{}` holds {len}",
                self.0.id
            )));
        }
        if let Renderable::Outlet(outlet) = &renderable {
            if Outlet::ptr_eq(outlet, self) {
                return Err(Error::Consistency(format!(
                    "outlet `{}` cannot contain itself",
                    self.0.id
                )));
            }
        }
        if renderable.is_stateful() && self.index_of(&renderable).is_some() {
            return Err(Error::Consistency(format!(
                "{renderable:?} is already held by outlet `{}`",
                self.0.id
            )));
        }

        let position = self.position_for(index);
        let nodes = match position {
            Position::None => Vec::new(),
            _ => {
                let _traversal = self.traverse("add");
                renderable.render(self.surface())?
            }
        };
        position.insert(self.surface(), &nodes)?;

        self.0.contents.borrow_mut().insert(
            index,
            Slot {
                renderable: renderable.clone(),
                nodes,
            },
        );
        log::debug!("outlet `{}`: added {renderable:?} at {index}", self.0.id);

        if self.state() >= State::Attached {
            let _traversal = self.traverse("attach");
            renderable.attach()?;
        }

        Ok(())
    }

    /// Append at the end.
    pub fn push<R>(&self, renderable: R) -> Result<()>
    where
        R: Into<Renderable>,
    {
        self.add(renderable, AddOptions::default())
    }

    /// Insert at the start.
    pub fn unshift<R>(&self, renderable: R) -> Result<()>
    where
        R: Into<Renderable>,
    {
        self.add(renderable, AddOptions::at(0))
    }

    /// Remove and return the last renderable.
    pub fn pop(&self) -> Result<Option<Renderable>> {
        match self.len() {
            0 => Ok(None),
            len => self.remove_at(len - 1).map(Some),
        }
    }

    /// Remove and return the first renderable.
    pub fn shift(&self) -> Result<Option<Renderable>> {
        match self.len() {
            0 => Ok(None),
            _ => self.remove_at(0).map(Some),
        }
    }

    /// Destroy `renderable` and drop it from the contents and the surface. Returns `false` if
    /// the outlet does not hold it, which is only an error for strict outlets.
    pub fn remove<R>(&self, renderable: R) -> Result<bool>
    where
        R: Into<Renderable>,
    {
        let renderable = renderable.into();
        self.check_mutable()?;

        match self.index_of(&renderable) {
            Some(index) => self.remove_at(index).map(|_| true),
            None if self.0.options.strict => Err(Error::Consistency(format!(
                "{renderable:?} is not held by outlet `{}`",
                self.0.id
            ))),
            None => {
                log::debug!(
                    "outlet `{}`: {renderable:?} already removed",
                    self.0.id
                );
                Ok(false)
            }
        }
    }

    fn remove_at(&self, index: usize) -> Result<Renderable> {
        self.check_mutable()?;

        let renderable = self
            .at(index)
            .ok_or_else(|| Error::Consistency(format!("no renderable at {index}")))?;

        {
            let _traversal = self.traverse("remove");
            renderable.destroy()?;
        }

        let slot = self.0.contents.borrow_mut().remove(index);
        for node in &slot.nodes {
            self.surface().remove(&Target::Node(node.clone()))?;
        }
        log::debug!("outlet `{}`: removed {renderable:?} from {index}", self.0.id);

        Ok(slot.renderable)
    }

    /// Re-sequence the held renderables to match `order`, which must be a permutation of the
    /// current contents. Emits [`Event::Sort`] once everything is back in place.
    pub fn reorder(&self, order: &[Renderable]) -> Result<()> {
        self.check_mutable()?;

        let mut slots = self
            .0
            .contents
            .borrow()
            .renderables()
            .into_iter()
            .map(Some)
            .collect::<Vec<_>>();
        let mut permutation = Vec::with_capacity(order.len());
        for renderable in order {
            let index = slots
                .iter()
                .position(|slot| {
                    slot.as_ref()
                        .is_some_and(|held| Renderable::same(held, renderable))
                })
                .ok_or_else(|| {
                    Error::Consistency(format!(
                        "{renderable:?} is not held by outlet `{}` (or listed twice)",
                        self.0.id
                    ))
                })?;
            slots[index] = None;
            permutation.push(index);
        }
        if permutation.len() != slots.len() {
            return Err(Error::Consistency(format!(
                "reorder of outlet `{}` lists {} of {} renderables",
                self.0.id,
                permutation.len(),
                slots.len()
            )));
        }

        let mut previous = self
            .0
            .contents
            .borrow_mut()
            .take()
            .into_iter()
            .map(Some)
            .collect::<Vec<_>>();

        for slot in previous.iter().flatten() {
            for node in &slot.nodes {
                self.surface().remove(&Target::Node(node.clone()))?;
            }
        }

        for index in permutation {
            let Some(slot) = previous[index].take() else {
                continue;
            };

            self.position_for(self.len())
                .insert(self.surface(), &slot.nodes)?;
            self.0.contents.borrow_mut().push(slot);
        }
        log::debug!("outlet `{}`: reordered {} child(ren)", self.0.id, self.len());

        self.0.emitter.emit(&Event::Sort);

        Ok(())
    }

    /// Forget every held renderable (without destroying them), take their nodes off the
    /// surface, and drop the render cache. The outlet keeps its identity and can render again.
    pub fn reset(&self) -> Result<()> {
        self.check_mutable()?;

        let nodes = self
            .0
            .contents
            .borrow()
            .nodes()
            .cloned()
            .collect::<Vec<_>>();
        for node in nodes {
            self.surface().remove(&Target::Node(node))?;
        }

        self.0.contents.borrow_mut().take();
        self.0.cache.borrow_mut().take();
        self.0.state.set(State::Initial);
        log::debug!("outlet `{}` reset", self.0.id);

        Ok(())
    }

    /// Show the whole outlet (`index` of `None`), or the renderable at `index`.
    pub fn show(&self, index: Option<usize>, context: Option<&dyn Any>) -> Result<()> {
        self.set_visible(index, true, context)
    }

    /// Hide the whole outlet (`index` of `None`), or the renderable at `index`.
    pub fn hide(&self, index: Option<usize>, context: Option<&dyn Any>) -> Result<()> {
        self.set_visible(index, false, context)
    }

    fn set_visible(
        &self,
        index: Option<usize>,
        visible: bool,
        context: Option<&dyn Any>,
    ) -> Result<()> {
        match index {
            None => self.toggle(visible),
            Some(index) => match self.at(index) {
                Some(child) => child.toggle(self.surface(), visible, context),
                None => Ok(()),
            },
        }
    }

    /// Set the visibility of the wrapping element, and emit [`Event::Show`] or
    /// [`Event::Hide`].
    pub fn toggle(&self, visible: bool) -> Result<()> {
        let target = match self.rendered() {
            Some(node) => Target::Node(node),
            None => Target::Id(self.0.id.clone()),
        };
        self.surface().toggle(&target, visible)?;

        self.0.emitter.emit(&Event::visibility(visible));

        Ok(())
    }

    /// Destroy the tag content and every held renderable, take the element off the surface, emit
    /// [`Event::Destroy`], and reset.
    pub fn destroy(&self) -> Result<()> {
        self.check_mutable()?;
        if self.0.destroyed.get() {
            return Ok(());
        }

        {
            let _traversal = self.traverse("destroy");
            self.0.tag_content.destroy()?;
            self.contents().iter().try_for_each(Renderable::destroy)?;
        }

        match self.rendered() {
            Some(node) => self.surface().remove(&Target::Node(node))?,
            None if self.surface().contains(&self.0.id) => {
                self.surface().remove(&Target::Id(self.0.id.clone()))?
            }
            None => (),
        }

        self.0.contents.borrow_mut().take();
        self.0.cache.borrow_mut().take();
        self.0.state.set(State::Initial);
        self.0.destroyed.set(true);
        log::debug!("outlet `{}` destroyed", self.0.id);

        self.0.emitter.emit(&Event::Destroy);

        Ok(())
    }

    /// Run `f` over a snapshot of the contents, with the outlet marked as traversed.
    fn query<T, F>(&self, f: F) -> T
    where
        F: FnOnce(&[Renderable]) -> T,
    {
        let contents = self.contents();
        let _traversal = self.traverse("query");

        f(&contents)
    }

    /// The renderables for which `predicate` holds, in order.
    pub fn filter<F>(&self, mut predicate: F) -> Vec<Renderable>
    where
        F: FnMut(&Renderable, usize) -> bool,
    {
        self.query(|contents| {
            contents
                .iter()
                .enumerate()
                .filter(|(index, renderable)| predicate(renderable, *index))
                .map(|(_, renderable)| renderable.clone())
                .collect()
        })
    }

    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&Renderable, usize),
    {
        self.query(|contents| {
            contents
                .iter()
                .enumerate()
                .for_each(|(index, renderable)| f(renderable, index))
        })
    }

    /// Whether `predicate` holds for every renderable. Stops at the first that fails.
    pub fn every<F>(&self, mut predicate: F) -> bool
    where
        F: FnMut(&Renderable, usize) -> bool,
    {
        self.query(|contents| {
            contents
                .iter()
                .enumerate()
                .all(|(index, renderable)| predicate(renderable, index))
        })
    }

    pub fn map<T, F>(&self, mut f: F) -> Vec<T>
    where
        F: FnMut(&Renderable, usize) -> T,
    {
        self.query(|contents| {
            contents
                .iter()
                .enumerate()
                .map(|(index, renderable)| f(renderable, index))
                .collect()
        })
    }

    /// Whether `predicate` holds for any renderable. Stops at the first that does.
    pub fn some<F>(&self, mut predicate: F) -> bool
    where
        F: FnMut(&Renderable, usize) -> bool,
    {
        self.query(|contents| {
            contents
                .iter()
                .enumerate()
                .any(|(index, renderable)| predicate(renderable, index))
        })
    }
}

impl fmt::Debug for Outlet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Outlet")
            .field("id", &self.0.id)
            .field("tag_name", &self.0.tag_name)
            .field("state", &self.state())
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::{
        renderable::{mount, tag},
        surface::MemorySurface,
        view::{Placeholder, View},
    };

    fn surface() -> (Rc<MemorySurface>, SurfaceRef) {
        let memory = Rc::new(MemorySurface::new());
        let surface = Rc::clone(&memory) as SurfaceRef;

        (memory, surface)
    }

    fn item(id: &str) -> Renderable {
        tag(
            "p",
            Attributes::from([("id".to_string(), id.to_string())]),
            id,
        )
    }

    fn mounted(surface: &SurfaceRef, id: &str) -> Outlet {
        let outlet = Outlet::build(surface).tag("ul").id(id).build();
        mount(&**surface, "body", &Renderable::from(&outlet)).unwrap();

        outlet
    }

    fn record(outlet: &Outlet, kinds: &[EventKind]) -> Rc<RefCell<Vec<EventKind>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        for kind in kinds {
            outlet.on(*kind, {
                let events = Rc::clone(&events);
                move |event| events.borrow_mut().push(event.kind())
            });
        }

        events
    }

    #[test_log::test]
    fn render_is_computed_once() {
        let (memory, surface) = surface();
        let outlet = Outlet::build(&surface).tag("span").id("o").content("Foo").build();
        let events = record(&outlet, &[EventKind::Render]);

        let first = outlet.render().unwrap();
        let second = outlet.render().unwrap();

        assert!(NodeHandle::ptr_eq(&first, &second));
        assert_eq!(*events.borrow(), [EventKind::Render]);
        assert_eq!(outlet.state(), State::Rendered);
        assert_eq!(memory.html(&first).unwrap(), r#"<span id="o">Foo</span>"#);
    }

    #[test_log::test]
    fn added_renderables_follow_surface_order() {
        let (memory, surface) = surface();
        let outlet = mounted(&surface, "list");

        outlet.push(item("b")).unwrap();
        outlet.unshift(item("a")).unwrap();
        outlet.add(item("d"), AddOptions::default()).unwrap();
        outlet.add(item("c"), AddOptions::at(2)).unwrap();

        assert_eq!(memory.child_ids("list").unwrap(), ["a", "b", "c", "d"]);
        assert_eq!(
            outlet.at(2).and_then(|r| r.id().map(str::to_string)),
            Some("c".to_string())
        );

        let b = outlet.at(1).unwrap();
        assert!(outlet.remove(b).unwrap());
        assert_eq!(memory.child_ids("list").unwrap(), ["a", "c", "d"]);
        assert_eq!(outlet.len(), 3);
    }

    #[test_log::test]
    fn add_before_render_only_splices() {
        let (memory, surface) = surface();
        let outlet = Outlet::build(&surface).id("list").build();

        outlet.push(item("a")).unwrap();
        outlet.push(item("b")).unwrap();
        assert!(outlet.rendered().is_none());

        let node = outlet.render().unwrap();
        assert_eq!(
            memory.html(&node).unwrap(),
            r#"<div id="list"><p id="a">a</p><p id="b">b</p></div>"#
        );
    }

    #[test]
    fn add_out_of_range_fails_without_mutating() {
        let (_memory, surface) = surface();
        let outlet = mounted(&surface, "list");

        assert!(matches!(
            outlet.add(item("a"), AddOptions::at(1)),
            Err(Error::Consistency(_))
        ));
        assert!(outlet.is_empty());
    }

    #[test]
    fn stateful_renderables_are_held_once() {
        let (_memory, surface) = surface();
        let outlet = mounted(&surface, "list");
        let view = Placeholder::new(&surface, "x");

        outlet.push(&view).unwrap();

        assert!(matches!(outlet.push(&view), Err(Error::Consistency(_))));
        assert!(matches!(outlet.push(&outlet), Err(Error::Consistency(_))));
        assert_eq!(outlet.len(), 1);
    }

    #[test_log::test]
    fn remove_destroys_once() {
        let (memory, surface) = surface();
        let outlet = mounted(&surface, "list");
        let view = Placeholder::new(&surface, "x");
        let destroyed = Rc::new(Cell::new(0));
        view.emitter().on(EventKind::Destroy, {
            let destroyed = Rc::clone(&destroyed);
            move |_| destroyed.set(destroyed.get() + 1)
        });

        outlet.push(&view).unwrap();
        assert!(memory.contains(view.id()));

        assert!(outlet.remove(&view).unwrap());
        assert!(!outlet.remove(&view).unwrap());

        assert_eq!(destroyed.get(), 1);
        assert!(!memory.contains(view.id()));
        assert!(outlet.is_empty());
    }

    #[test]
    fn strict_outlets_refuse_unknown_removals() {
        let (_memory, surface) = surface();
        let outlet = Outlet::build(&surface).strict(true).build();

        assert!(matches!(
            outlet.remove(item("a")),
            Err(Error::Consistency(_))
        ));
    }

    #[test_log::test]
    fn pop_and_shift_take_from_the_ends() {
        let (memory, surface) = surface();
        let outlet = mounted(&surface, "list");
        for id in ["a", "b", "c"] {
            outlet.push(item(id)).unwrap();
        }

        assert_eq!(outlet.pop().unwrap().and_then(|r| r.id().map(str::to_string)), Some("c".into()));
        assert_eq!(outlet.shift().unwrap().and_then(|r| r.id().map(str::to_string)), Some("a".into()));
        assert_eq!(memory.child_ids("list").unwrap(), ["b"]);

        outlet.pop().unwrap();
        assert!(outlet.pop().unwrap().is_none());
        assert!(outlet.shift().unwrap().is_none());
    }

    #[test_log::test]
    fn reorder_moves_nodes_and_sorts_once() {
        let (memory, surface) = surface();
        let outlet = mounted(&surface, "list");
        let events = record(&outlet, &[EventKind::Sort, EventKind::Render]);
        for id in ["a", "b", "c"] {
            outlet.push(item(id)).unwrap();
        }
        let (a, b, c) = (
            outlet.at(0).unwrap(),
            outlet.at(1).unwrap(),
            outlet.at(2).unwrap(),
        );

        outlet.reorder(&[c.clone(), a.clone(), b.clone()]).unwrap();

        assert_eq!(memory.child_ids("list").unwrap(), ["c", "a", "b"]);
        assert_eq!(outlet.index_of(&c), Some(0));
        assert_eq!(*events.borrow(), [EventKind::Sort]);
        assert_eq!(outlet.state(), State::Attached);
    }

    #[test]
    fn reorder_requires_a_permutation() {
        let (memory, surface) = surface();
        let outlet = mounted(&surface, "list");
        for id in ["a", "b"] {
            outlet.push(item(id)).unwrap();
        }
        let (a, b) = (outlet.at(0).unwrap(), outlet.at(1).unwrap());

        for order in [vec![a.clone()], vec![a.clone(), a.clone()], vec![a, item("b")]] {
            assert!(matches!(outlet.reorder(&order), Err(Error::Consistency(_))));
        }
        assert!(outlet.reorder(&[b.clone()]).is_err());

        assert_eq!(memory.child_ids("list").unwrap(), ["a", "b"]);
    }

    #[test_log::test]
    fn reset_drops_the_cache() {
        let (memory, surface) = surface();
        let outlet = Outlet::build(&surface).id("o").content("Foo").build();
        outlet.push(item("a")).unwrap();

        let first = outlet.render().unwrap();
        outlet.reset().unwrap();

        assert_eq!(outlet.state(), State::Initial);
        assert!(outlet.is_empty());
        assert!(outlet.rendered().is_none());

        let second = outlet.render().unwrap();
        assert!(!NodeHandle::ptr_eq(&first, &second));
        assert_eq!(memory.html(&second).unwrap(), r#"<div id="o">Foo</div>"#);
    }

    #[test_log::test]
    fn mutation_during_traversal_is_refused() {
        let (_memory, surface) = surface();
        let outlet = mounted(&surface, "list");
        let view = Placeholder::new(&surface, "x");
        let outcome = Rc::new(RefCell::new(None));
        view.emitter().on(EventKind::Attach, {
            let (outlet, outcome) = (outlet.clone(), Rc::clone(&outcome));
            move |_| *outcome.borrow_mut() = Some(outlet.push("late"))
        });

        outlet.push(&view).unwrap();

        assert_eq!(
            outcome.borrow_mut().take(),
            Some(Err(Error::Reentrancy {
                id: "list".into(),
                operation: "attach"
            }))
        );
        assert_eq!(outlet.len(), 1);

        // Nothing is traversing any more.
        outlet.push("later").unwrap();
        assert_eq!(outlet.len(), 2);
    }

    #[test_log::test]
    fn show_and_hide_target_the_outlet_or_a_child() {
        let (memory, surface) = surface();
        let outlet = mounted(&surface, "list");
        let events = record(&outlet, &[EventKind::Show, EventKind::Hide]);
        outlet.push(item("a")).unwrap();
        outlet.push("text").unwrap();

        outlet.hide(None, None).unwrap();
        assert!(!memory.is_visible("list").unwrap());
        outlet.show(None, None).unwrap();
        assert!(memory.is_visible("list").unwrap());

        outlet.hide(Some(0), None).unwrap();
        assert!(!memory.is_visible("a").unwrap());
        outlet.hide(Some(9), None).unwrap();

        assert_eq!(
            outlet.hide(Some(1), None),
            Err(Error::Capability {
                capability: "toggle",
                kind: "text"
            })
        );
        assert_eq!(*events.borrow(), [EventKind::Hide, EventKind::Show]);
    }

    #[test_log::test]
    fn destroy_reaches_every_child() {
        let (memory, surface) = surface();
        let outlet = mounted(&surface, "list");
        let inner = Outlet::build(&surface).id("inner").build();
        let view = Placeholder::new(&surface, "x");
        inner.push(&view).unwrap();
        outlet.push(&inner).unwrap();
        let events = record(&outlet, &[EventKind::Destroy]);
        let inner_events = record(&inner, &[EventKind::Destroy]);

        outlet.destroy().unwrap();
        outlet.destroy().unwrap();

        assert!(!memory.contains("list"));
        assert!(!memory.contains("inner"));
        assert!(!memory.contains(view.id()));
        assert_eq!(*events.borrow(), [EventKind::Destroy]);
        assert_eq!(*inner_events.borrow(), [EventKind::Destroy]);
        assert_eq!(outlet.state(), State::Initial);
    }

    #[test]
    fn queries_see_contents_in_order() {
        let (_memory, surface) = surface();
        let outlet = Outlet::build(&surface).build();
        for text in ["a", "bb", "ccc"] {
            outlet.push(text).unwrap();
        }
        let width = |r: &Renderable| match r {
            Renderable::Text(text) => text.len(),
            _ => 0,
        };

        assert_eq!(outlet.map(|r, i| width(r) + i), [1, 3, 5]);
        assert_eq!(outlet.filter(|r, _| width(r) > 1).len(), 2);
        assert!(outlet.every(|r, _| width(r) > 0));
        assert!(outlet.some(|r, _| width(r) == 3));

        let mut visited = 0;
        assert!(!outlet.every(|_, i| {
            visited += 1;
            i == 0
        }));
        assert_eq!(visited, 2);

        let mut seen = Vec::new();
        outlet.for_each(|_, i| seen.push(i));
        assert_eq!(seen, [0, 1, 2]);
    }

    #[test]
    fn queries_do_not_allow_mutation() {
        let (_memory, surface) = surface();
        let outlet = Outlet::build(&surface).build();
        outlet.push("a").unwrap();

        let results = outlet.map(|_, _| outlet.push("b"));

        assert!(matches!(results[0], Err(Error::Reentrancy { .. })));
        assert_eq!(outlet.len(), 1);
    }

    #[test]
    fn the_id_attribute_is_fixed() {
        let (_memory, surface) = surface();
        let outlet = Outlet::build(&surface).id("o").build();

        assert!(outlet.set_attribute("id", "other").is_err());
        outlet.set_attribute("class", "wide").unwrap();

        assert_eq!(outlet.id(), "o");
        assert_eq!(
            outlet.attributes().get("class").map(String::as_str),
            Some("wide")
        );
    }

    /// Splits markup on `|`, like a backend whose markup parses into several top-level nodes.
    struct Fragments(MemorySurface);

    impl Surface for Fragments {
        fn id(&self) -> String {
            self.0.id()
        }

        fn tag(
            &self,
            name: &str,
            attributes: &Attributes,
            content: &[NodeHandle],
        ) -> Result<NodeHandle> {
            self.0.tag(name, attributes, content)
        }

        fn markup(&self, markup: &str) -> Result<Vec<NodeHandle>> {
            markup.split('|').try_fold(Vec::new(), |mut nodes, part| {
                nodes.extend(self.0.markup(part)?);
                Ok(nodes)
            })
        }

        fn contains(&self, id: &str) -> bool {
            self.0.contains(id)
        }

        fn append(&self, target: &Target, nodes: &[NodeHandle]) -> Result<()> {
            self.0.append(target, nodes)
        }

        fn before(&self, target: &Target, nodes: &[NodeHandle]) -> Result<()> {
            self.0.before(target, nodes)
        }

        fn remove(&self, target: &Target) -> Result<()> {
            self.0.remove(target)
        }

        fn update(&self, target: &Target, nodes: &[NodeHandle]) -> Result<()> {
            self.0.update(target, nodes)
        }

        fn toggle(&self, target: &Target, visible: bool) -> Result<()> {
            self.0.toggle(target, visible)
        }
    }

    #[test_log::test]
    fn markup_spanning_several_nodes_moves_as_one() {
        let fragments = Rc::new(Fragments(MemorySurface::new()));
        let surface = Rc::clone(&fragments) as SurfaceRef;
        let outlet = mounted(&surface, "list");

        outlet.push(item("a")).unwrap();
        outlet.push("x|y").unwrap();
        outlet.push(item("c")).unwrap();
        outlet.add(item("b"), AddOptions::at(1)).unwrap();

        assert_eq!(
            fragments.0.html("list").unwrap(),
            r#"<ul id="list"><p id="a">a</p><p id="b">b</p>xy<p id="c">c</p></ul>"#
        );

        assert!(outlet.remove("x|y").unwrap());
        assert_eq!(
            fragments.0.html("list").unwrap(),
            r#"<ul id="list"><p id="a">a</p><p id="b">b</p><p id="c">c</p></ul>"#
        );
    }
}
