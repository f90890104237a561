//! Anything that can be resolved to surface nodes, and the walker that resolves nested content
//! and carries lifecycle notifications through it.

mod tag;

use std::{any::Any, fmt, rc::Rc};

pub use tag::{tag, TagDescriptor};

use crate::{
    error::{Error, Result},
    outlet::Outlet,
    surface::{NodeHandle, Surface, Target},
    view::{same_view, View, ViewRef},
};

/// A piece of content. Sequences, tags and outlets nest other renderables to any depth.
#[derive(Clone)]
pub enum Renderable {
    /// A markup leaf, inserted as is.
    Text(Rc<str>),

    /// An element created from a descriptor, with its content resolved recursively.
    Tag(Rc<TagDescriptor>),

    /// Consecutive renderables, resolved in order.
    List(Rc<Vec<Renderable>>),

    Outlet(Outlet),

    View(ViewRef),
}

impl Renderable {
    pub fn text<S>(text: S) -> Self
    where
        S: AsRef<str>,
    {
        Renderable::Text(Rc::from(text.as_ref()))
    }

    pub fn list(items: Vec<Renderable>) -> Self {
        Renderable::List(Rc::new(items))
    }

    /// A sequence resolving to no nodes.
    pub fn empty() -> Self {
        Self::list(Vec::new())
    }

    pub fn view(view: ViewRef) -> Self {
        Renderable::View(view)
    }

    /// Name of the variant, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Renderable::Text(_) => "text",
            Renderable::Tag(_) => "tag",
            Renderable::List(_) => "list",
            Renderable::Outlet(_) => "outlet",
            Renderable::View(_) => "view",
        }
    }

    /// Whether the renderable carries its own lifecycle (outlets and views).
    pub fn is_stateful(&self) -> bool {
        matches!(self, Renderable::Outlet(_) | Renderable::View(_))
    }

    /// The surface id addressing this renderable, if it has one.
    pub fn id(&self) -> Option<&str> {
        match self {
            Renderable::Tag(tag) => tag.id(),
            Renderable::Outlet(outlet) => Some(outlet.id()),
            Renderable::View(view) => Some(view.id()),
            Renderable::Text(_) | Renderable::List(_) => None,
        }
    }

    /// Identity comparison. Text compares by value, everything else by instance.
    pub fn same(a: &Self, b: &Self) -> bool {
        match (a, b) {
            (Renderable::Text(a), Renderable::Text(b)) => a == b,
            (Renderable::Tag(a), Renderable::Tag(b)) => Rc::ptr_eq(a, b),
            (Renderable::List(a), Renderable::List(b)) => Rc::ptr_eq(a, b),
            (Renderable::Outlet(a), Renderable::Outlet(b)) => Outlet::ptr_eq(a, b),
            (Renderable::View(a), Renderable::View(b)) => same_view(a, b),
            _ => false,
        }
    }

    /// Resolve to surface nodes. Outlets and views answer from their render cache after the
    /// first call.
    pub fn render(&self, surface: &dyn Surface) -> Result<Vec<NodeHandle>> {
        match self {
            Renderable::Text(text) => surface.markup(text),
            Renderable::Tag(tag) => {
                let content = tag.content().render(surface)?;

                Ok(vec![surface.tag(tag.name(), tag.attributes(), &content)?])
            }
            Renderable::List(items) => {
                let mut nodes = Vec::with_capacity(items.len());
                for item in items.iter() {
                    nodes.extend(item.render(surface)?);
                }

                Ok(nodes)
            }
            Renderable::Outlet(outlet) => Ok(vec![outlet.render()?]),
            Renderable::View(view) => Ok(vec![view.render()?]),
        }
    }

    /// Attach every outlet and view reachable from here, depth first in document order.
    pub fn attach(&self) -> Result<()> {
        match self {
            Renderable::Text(_) => Ok(()),
            Renderable::Tag(tag) => tag.content().attach(),
            Renderable::List(items) => items.iter().try_for_each(Renderable::attach),
            Renderable::Outlet(outlet) => outlet.attach(),
            Renderable::View(view) => view.attach(),
        }
    }

    /// Detach every outlet and view reachable from here, depth first in document order.
    pub fn detach(&self) -> Result<()> {
        match self {
            Renderable::Text(_) => Ok(()),
            Renderable::Tag(tag) => tag.content().detach(),
            Renderable::List(items) => items.iter().try_for_each(Renderable::detach),
            Renderable::Outlet(outlet) => outlet.detach(),
            Renderable::View(view) => view.detach(),
        }
    }

    /// Destroy every outlet and view reachable from here.
    pub fn destroy(&self) -> Result<()> {
        match self {
            Renderable::Text(_) => Ok(()),
            Renderable::Tag(tag) => tag.content().destroy(),
            Renderable::List(items) => items.iter().try_for_each(Renderable::destroy),
            Renderable::Outlet(outlet) => outlet.destroy(),
            Renderable::View(view) => view.destroy(),
        }
    }

    /// Show or hide. Outlets and views toggle themselves, tags are toggled through their `id`.
    pub fn toggle(
        &self,
        surface: &dyn Surface,
        visible: bool,
        context: Option<&dyn Any>,
    ) -> Result<()> {
        match self {
            Renderable::Outlet(outlet) => outlet.toggle(visible),
            Renderable::View(view) => view.toggle(visible, context),
            Renderable::Tag(tag) => match tag.id() {
                Some(id) => surface.toggle(&Target::from(id), visible),
                None => Err(Error::Capability {
                    capability: "toggle",
                    kind: "anonymous tag",
                }),
            },
            Renderable::Text(_) | Renderable::List(_) => Err(Error::Capability {
                capability: "toggle",
                kind: self.kind(),
            }),
        }
    }
}

impl fmt::Debug for Renderable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Renderable::Text(text) => write!(f, "Text({text:?})"),
            Renderable::Tag(tag) => write!(f, "Tag({})", tag.name()),
            Renderable::List(items) => f.debug_list().entries(items.iter()).finish(),
            Renderable::Outlet(outlet) => write!(f, "Outlet({})", outlet.id()),
            Renderable::View(view) => write!(f, "View({})", view.id()),
        }
    }
}

impl From<&str> for Renderable {
    fn from(text: &str) -> Self {
        Renderable::text(text)
    }
}

impl From<String> for Renderable {
    fn from(text: String) -> Self {
        Renderable::Text(Rc::from(text))
    }
}

impl From<TagDescriptor> for Renderable {
    fn from(tag: TagDescriptor) -> Self {
        Renderable::Tag(Rc::new(tag))
    }
}

impl From<Vec<Renderable>> for Renderable {
    fn from(items: Vec<Renderable>) -> Self {
        Renderable::list(items)
    }
}

impl From<Outlet> for Renderable {
    fn from(outlet: Outlet) -> Self {
        Renderable::Outlet(outlet)
    }
}

impl From<&Outlet> for Renderable {
    fn from(outlet: &Outlet) -> Self {
        Renderable::Outlet(outlet.clone())
    }
}

impl<V> From<Rc<V>> for Renderable
where
    V: View + 'static,
{
    fn from(view: Rc<V>) -> Self {
        Renderable::View(view)
    }
}

impl<V> From<&Rc<V>> for Renderable
where
    V: View + 'static,
{
    fn from(view: &Rc<V>) -> Self {
        Renderable::View(Rc::clone(view) as ViewRef)
    }
}

/// Resolve `content`, make it the only content of `target`, then attach it.
pub fn mount<T>(surface: &dyn Surface, target: T, content: &Renderable) -> Result<()>
where
    T: Into<Target>,
{
    let target = target.into();
    let nodes = content.render(surface)?;

    log::debug!(
        "mounting {} node(s) of {} content into {target:?}",
        nodes.len(),
        content.kind()
    );

    surface.update(&target, &nodes)?;
    content.attach()
}

/// Clear `target`, and detach the `content` previously mounted into it.
pub fn unmount<T>(surface: &dyn Surface, target: T, content: &Renderable) -> Result<()>
where
    T: Into<Target>,
{
    surface.update(&target.into(), &[])?;
    content.detach()
}
