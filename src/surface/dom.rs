use std::cell::RefCell;

use log::{Level, Log, Metadata, Record};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{console, Document, HtmlElement, HtmlTemplateElement, Node};

use super::{arena::Arena, Attributes, NodeHandle, Surface, Target};
use crate::{
    error::{Result, SurfaceError},
    util::IdGenerator,
};

fn backend(err: JsValue) -> SurfaceError {
    SurfaceError::Backend(format!("{err:?}"))
}

/// A [`Surface`] driving the browser DOM. Created nodes are kept in an arena, and handed out as
/// [`NodeHandle`]s indexing into it. The DOM owns the tree structure, so a slot is freed as soon
/// as its handle is dropped.
pub struct DomSurface {
    document: Document,
    nodes: RefCell<Arena<Node>>,
    body: RefCell<Option<NodeHandle>>,
    ids: IdGenerator,
}

impl DomSurface {
    pub fn new(document: &Document) -> Self {
        Self {
            document: document.clone(),
            nodes: RefCell::new(Arena::new()),
            body: RefCell::new(None),
            ids: IdGenerator::default(),
        }
    }

    /// A handle to `document.body`, to mount into.
    pub fn body(&self) -> Result<NodeHandle> {
        if let Some(body) = self.body.borrow().as_ref() {
            return Ok(body.clone());
        }

        let body = self
            .document
            .body()
            .ok_or_else(|| SurfaceError::UnknownTarget("body".into()))?;
        let handle = self.store(body.into());
        self.body.replace(Some(handle.clone()));

        Ok(handle)
    }

    fn store(&self, node: Node) -> NodeHandle {
        let mut nodes = self.nodes.borrow_mut();

        if nodes.needs_sweep() {
            for key in nodes.released() {
                nodes.free(key);
            }
            nodes.swept();
        }

        nodes.insert(node)
    }

    fn node(&self, handle: &NodeHandle) -> Result<Node, SurfaceError> {
        let nodes = self.nodes.borrow();

        nodes
            .key(handle)
            .and_then(|key| nodes.get(key))
            .cloned()
            .ok_or(SurfaceError::UnknownNode(handle.key()))
    }

    fn resolve(&self, target: &Target) -> Result<Node, SurfaceError> {
        match target {
            Target::Id(id) => self
                .document
                .get_element_by_id(id)
                .map(Node::from)
                .ok_or_else(|| SurfaceError::UnknownTarget(id.clone())),
            Target::Node(handle) => self.node(handle),
        }
    }
}

impl Surface for DomSurface {
    fn id(&self) -> String {
        self.ids.next_id()
    }

    fn tag(
        &self,
        name: &str,
        attributes: &Attributes,
        content: &[NodeHandle],
    ) -> Result<NodeHandle> {
        let element = self.document.create_element(name).map_err(backend)?;

        for (attribute, value) in attributes {
            element.set_attribute(attribute, value).map_err(backend)?;
        }

        for child in content {
            element.append_child(&self.node(child)?).map_err(backend)?;
        }

        Ok(self.store(element.into()))
    }

    fn markup(&self, markup: &str) -> Result<Vec<NodeHandle>> {
        let template = self
            .document
            .create_element("template")
            .map_err(backend)?
            .dyn_into::<HtmlTemplateElement>()
            .map_err(|_| SurfaceError::Backend("`template` is not a template element".into()))?;
        template.set_inner_html(markup);

        // Each top-level node is stored on its own, so that it can be removed or anchored by
        // handle once the fragment has emptied itself into the tree.
        let fragment = template.content();
        let mut children = Vec::new();
        let mut child = fragment.first_child();
        while let Some(node) = child {
            child = node.next_sibling();
            children.push(node);
        }

        Ok(children.into_iter().map(|node| self.store(node)).collect())
    }

    fn contains(&self, id: &str) -> bool {
        self.document.get_element_by_id(id).is_some()
    }

    fn append(&self, target: &Target, nodes: &[NodeHandle]) -> Result<()> {
        let parent = self.resolve(target)?;

        for node in nodes {
            parent.append_child(&self.node(node)?).map_err(backend)?;
        }

        Ok(())
    }

    fn before(&self, target: &Target, nodes: &[NodeHandle]) -> Result<()> {
        let sibling = self.resolve(target)?;
        let parent = sibling.parent_node().ok_or_else(|| {
            SurfaceError::Backend("cannot insert before a node without a parent".into())
        })?;

        for node in nodes {
            parent
                .insert_before(&self.node(node)?, Some(&sibling))
                .map_err(backend)?;
        }

        Ok(())
    }

    fn remove(&self, target: &Target) -> Result<()> {
        let node = self.resolve(target)?;

        if let Some(parent) = node.parent_node() {
            parent.remove_child(&node).map_err(backend)?;
        }

        Ok(())
    }

    fn update(&self, target: &Target, nodes: &[NodeHandle]) -> Result<()> {
        let parent = self.resolve(target)?;

        while let Some(child) = parent.first_child() {
            parent.remove_child(&child).map_err(backend)?;
        }

        self.append(target, nodes)
    }

    fn toggle(&self, target: &Target, visible: bool) -> Result<()> {
        let node = self.resolve(target)?;
        let element = node
            .dyn_ref::<HtmlElement>()
            .ok_or_else(|| SurfaceError::Backend("only elements can be toggled".into()))?;

        element
            .style()
            .set_property("display", if visible { "" } else { "none" })
            .map_err(backend)?;

        Ok(())
    }
}

/// Forwards `log` records to the browser console.
pub struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;

impl ConsoleLogger {
    pub fn init(level: log::LevelFilter) -> Result<(), log::SetLoggerError> {
        log::set_logger(&LOGGER)?;
        log::set_max_level(level);

        Ok(())
    }
}

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let message = JsValue::from(format!("[{}] {}", record.target(), record.args()));

        match record.level() {
            Level::Error => console::error_1(&message),
            Level::Warn => console::warn_1(&message),
            Level::Info => console::info_1(&message),
            Level::Debug | Level::Trace => console::log_1(&message),
        }
    }

    fn flush(&self) {}
}
