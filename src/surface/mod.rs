//! The visual-surface adapter. Outlets, views and the renderable walker only ever touch the
//! rendering backend through [`Surface`], which makes the backend swappable: [`MemorySurface`]
//! keeps an in-memory element tree, while `DomSurface` (on `wasm32`) drives the browser DOM.

mod arena;
#[cfg(target_arch = "wasm32")]
mod dom;
mod memory;
mod position;

use std::{collections::BTreeMap, fmt, rc::Rc};

#[cfg(target_arch = "wasm32")]
pub use dom::{ConsoleLogger, DomSurface};
pub use memory::MemorySurface;
pub use position::Position;

use crate::error::Result;

/// Element attributes. Ordered so that serialisation is deterministic.
pub type Attributes = BTreeMap<String, String>;

/// Opaque handle to a node produced by a [`Surface`]. Clones share identity, so a cached render
/// result can be compared with [`NodeHandle::ptr_eq()`].
#[derive(Clone)]
pub struct NodeHandle(Rc<usize>);

impl NodeHandle {
    /// Wrap a surface specific key. Only surfaces should create handles.
    pub fn new(key: usize) -> Self {
        Self(Rc::new(key))
    }

    /// The surface specific key this handle refers to.
    pub fn key(&self) -> usize {
        *self.0
    }

    /// Whether both handles are clones of the same handle.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }
}

impl fmt::Debug for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeHandle(#{})", self.key())
    }
}

/// Something addressable on the surface: an element by its `id` attribute, or a node directly.
#[derive(Clone, Debug)]
pub enum Target {
    Id(String),
    Node(NodeHandle),
}

impl From<&str> for Target {
    fn from(id: &str) -> Self {
        Target::Id(id.to_string())
    }
}

impl From<String> for Target {
    fn from(id: String) -> Self {
        Target::Id(id)
    }
}

impl From<&NodeHandle> for Target {
    fn from(node: &NodeHandle) -> Self {
        Target::Node(node.clone())
    }
}

impl From<NodeHandle> for Target {
    fn from(node: NodeHandle) -> Self {
        Target::Node(node)
    }
}

/// Operations required from a rendering backend.
///
/// Lookups by [`Target::Id`] only find elements that are part of the live tree, in the same way
/// as `document.getElementById()`. Inserting a node that already has a parent moves it.
pub trait Surface {
    /// A fresh identifier, unique for this surface.
    fn id(&self) -> String;

    /// Create a detached element with the given children.
    fn tag(&self, name: &str, attributes: &Attributes, content: &[NodeHandle])
        -> Result<NodeHandle>;

    /// Create detached nodes from markup, one handle per top-level node it parses into.
    fn markup(&self, markup: &str) -> Result<Vec<NodeHandle>>;

    /// Whether an element with this id is part of the live tree.
    fn contains(&self, id: &str) -> bool;

    /// Append `nodes` as the last children of `target`.
    fn append(&self, target: &Target, nodes: &[NodeHandle]) -> Result<()>;

    /// Insert `nodes` as siblings immediately before `target`.
    fn before(&self, target: &Target, nodes: &[NodeHandle]) -> Result<()>;

    /// Take `target` out of its parent. Removing a node without a parent does nothing.
    fn remove(&self, target: &Target) -> Result<()>;

    /// Replace every child of `target` with `nodes`.
    fn update(&self, target: &Target, nodes: &[NodeHandle]) -> Result<()>;

    /// Show or hide `target`.
    fn toggle(&self, target: &Target, visible: bool) -> Result<()>;
}

pub type SurfaceRef = Rc<dyn Surface>;
