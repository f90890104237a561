use std::{cell::RefCell, fmt::Write};

use super::{arena::Arena, Attributes, NodeHandle, Surface, Target};
use crate::{
    error::{Result, SurfaceError},
    util::IdGenerator,
};

enum Kind {
    Element { tag: String, attributes: Attributes },
    Markup(String),
}

struct Node {
    kind: Kind,
    parent: Option<usize>,
    children: Vec<usize>,
    visible: bool,
}

impl Node {
    fn new(kind: Kind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            visible: true,
        }
    }

    fn id(&self) -> Option<&str> {
        match &self.kind {
            Kind::Element { attributes, .. } => attributes.get("id").map(String::as_str),
            Kind::Markup(_) => None,
        }
    }
}

/// A [`Surface`] backed by an in-memory element tree. Useful for tests, and for rendering
/// outside of a browser.
///
/// Nodes that are neither reachable through a [`NodeHandle`] nor linked into a held subtree are
/// freed, and their slots reused.
pub struct MemorySurface {
    nodes: RefCell<Arena<Node>>,
    ids: IdGenerator,
    root: NodeHandle,
}

impl MemorySurface {
    /// A surface whose live tree is a single `<body id="body">` element.
    pub fn new() -> Self {
        Self::with_root("body", "body")
    }

    /// A surface whose live tree starts at an element with the given tag and id.
    pub fn with_root<T, I>(tag: T, id: I) -> Self
    where
        T: AsRef<str>,
        I: AsRef<str>,
    {
        let mut nodes = Arena::new();
        let root = nodes.insert(Node::new(Kind::Element {
            tag: tag.as_ref().to_string(),
            attributes: Attributes::from([("id".to_string(), id.as_ref().to_string())]),
        }));

        Self {
            nodes: RefCell::new(nodes),
            ids: IdGenerator::default(),
            root,
        }
    }

    /// Serialise `target` and its descendants as markup.
    pub fn html<T>(&self, target: T) -> Result<String>
    where
        T: Into<Target>,
    {
        let index = self.resolve(&target.into())?;
        let mut out = String::new();
        Self::write_html(&self.nodes.borrow(), index, &mut out);

        Ok(out)
    }

    /// The ids of the element children of `target`, in order. Children without an id are skipped.
    pub fn child_ids<T>(&self, target: T) -> Result<Vec<String>>
    where
        T: Into<Target>,
    {
        let index = self.resolve(&target.into())?;
        let nodes = self.nodes.borrow();

        Ok(nodes[index]
            .children
            .iter()
            .filter_map(|child| nodes[*child].id().map(str::to_string))
            .collect())
    }

    /// Whether `target` itself is currently shown.
    pub fn is_visible<T>(&self, target: T) -> Result<bool>
    where
        T: Into<Target>,
    {
        let index = self.resolve(&target.into())?;

        Ok(self.nodes.borrow()[index].visible)
    }

    /// Whether `node` is part of the live tree.
    pub fn is_live(&self, node: &NodeHandle) -> bool {
        let nodes = self.nodes.borrow();
        let mut current = nodes.key(node);

        while let Some(index) = current {
            if index == self.root.key() {
                return true;
            }
            current = nodes.get(index).and_then(|node| node.parent);
        }

        false
    }

    /// Number of nodes currently stored, live or not.
    pub fn node_count(&self) -> usize {
        self.nodes.borrow().len()
    }

    /// Free every node that can no longer be reached. Returns how many were freed.
    pub fn collect(&self) -> usize {
        Self::sweep(&mut self.nodes.borrow_mut())
    }

    fn sweep(nodes: &mut Arena<Node>) -> usize {
        let mut candidates = nodes.released();
        let mut freed = 0;

        while let Some(key) = candidates.pop() {
            if !nodes.contains(key) || nodes.is_held(key) || nodes[key].parent.is_some() {
                continue;
            }

            if let Some(node) = nodes.free(key) {
                freed += 1;
                for child in node.children {
                    nodes[child].parent = None;
                    candidates.push(child);
                }
            }
        }
        nodes.swept();
        log::trace!("freed {freed} surface node(s), {} left", nodes.len());

        freed
    }

    fn write_html(nodes: &Arena<Node>, index: usize, out: &mut String) {
        let node = &nodes[index];

        match &node.kind {
            Kind::Markup(markup) => out.push_str(markup),
            Kind::Element { tag, attributes } => {
                out.push('<');
                out.push_str(tag);
                attributes.iter().for_each(|(name, value)| {
                    let _ = write!(out, r#" {name}="{value}""#);
                });
                out.push('>');

                node.children
                    .iter()
                    .for_each(|child| Self::write_html(nodes, *child, out));

                let _ = write!(out, "</{tag}>");
            }
        }
    }

    fn push(&self, node: Node) -> NodeHandle {
        let mut nodes = self.nodes.borrow_mut();
        if nodes.needs_sweep() {
            Self::sweep(&mut nodes);
        }

        nodes.insert(node)
    }

    /// Depth first search of the live tree for an element id.
    fn find(&self, id: &str) -> Option<usize> {
        let nodes = self.nodes.borrow();
        let mut stack = vec![self.root.key()];

        while let Some(index) = stack.pop() {
            let node = &nodes[index];
            if node.id() == Some(id) {
                return Some(index);
            }
            stack.extend(node.children.iter().rev());
        }

        None
    }

    fn resolve(&self, target: &Target) -> Result<usize, SurfaceError> {
        match target {
            Target::Id(id) => self
                .find(id)
                .ok_or_else(|| SurfaceError::UnknownTarget(id.clone())),
            Target::Node(node) => self
                .nodes
                .borrow()
                .key(node)
                .ok_or(SurfaceError::UnknownNode(node.key())),
        }
    }

    fn check_nodes(&self, handles: &[NodeHandle]) -> Result<Vec<usize>, SurfaceError> {
        let nodes = self.nodes.borrow();

        handles
            .iter()
            .map(|handle| {
                nodes
                    .key(handle)
                    .ok_or(SurfaceError::UnknownNode(handle.key()))
            })
            .collect()
    }

    fn detach(nodes: &mut Arena<Node>, index: usize) {
        if let Some(parent) = nodes[index].parent.take() {
            nodes[parent].children.retain(|child| *child != index);
        }
    }

    /// Insert `children` into `parent` at `position`, moving any child that already has a parent.
    fn insert(
        nodes: &mut Arena<Node>,
        parent: usize,
        position: Option<usize>,
        children: &[usize],
    ) -> Result<(), SurfaceError> {
        if matches!(nodes[parent].kind, Kind::Markup(_)) {
            return Err(SurfaceError::Backend(
                "cannot insert children into a markup node".into(),
            ));
        }

        let mut ancestor = Some(parent);
        while let Some(index) = ancestor {
            if children.contains(&index) {
                return Err(SurfaceError::Backend(
                    "cannot insert a node into its own subtree".into(),
                ));
            }
            ancestor = nodes[index].parent;
        }

        children.iter().for_each(|child| Self::detach(nodes, *child));

        // Detaching may have shifted the anchor, so resolve it afterwards.
        let mut at = match position {
            Some(anchor) => nodes[parent]
                .children
                .iter()
                .position(|child| *child == anchor)
                .unwrap_or(nodes[parent].children.len()),
            None => nodes[parent].children.len(),
        };

        for child in children {
            nodes[parent].children.insert(at, *child);
            nodes[*child].parent = Some(parent);
            at += 1;
        }

        Ok(())
    }
}

impl Default for MemorySurface {
    fn default() -> Self {
        Self::new()
    }
}

impl Surface for MemorySurface {
    fn id(&self) -> String {
        self.ids.next_id()
    }

    fn tag(
        &self,
        name: &str,
        attributes: &Attributes,
        content: &[NodeHandle],
    ) -> Result<NodeHandle> {
        let children = self.check_nodes(content)?;

        let handle = self.push(Node::new(Kind::Element {
            tag: name.to_string(),
            attributes: attributes.clone(),
        }));

        Self::insert(
            &mut self.nodes.borrow_mut(),
            handle.key(),
            None,
            &children,
        )?;

        Ok(handle)
    }

    fn markup(&self, markup: &str) -> Result<Vec<NodeHandle>> {
        Ok(vec![self.push(Node::new(Kind::Markup(markup.to_string())))])
    }

    fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    fn append(&self, target: &Target, nodes: &[NodeHandle]) -> Result<()> {
        let parent = self.resolve(target)?;
        let children = self.check_nodes(nodes)?;

        Self::insert(&mut self.nodes.borrow_mut(), parent, None, &children)?;

        Ok(())
    }

    fn before(&self, target: &Target, nodes: &[NodeHandle]) -> Result<()> {
        let sibling = self.resolve(target)?;
        let children = self.check_nodes(nodes)?;
        let mut tree = self.nodes.borrow_mut();

        let parent = tree[sibling].parent.ok_or_else(|| {
            SurfaceError::Backend(format!("node #{sibling} has no parent to insert into"))
        })?;

        Self::insert(&mut tree, parent, Some(sibling), &children)?;

        Ok(())
    }

    fn remove(&self, target: &Target) -> Result<()> {
        let index = self.resolve(target)?;
        Self::detach(&mut self.nodes.borrow_mut(), index);

        Ok(())
    }

    fn update(&self, target: &Target, nodes: &[NodeHandle]) -> Result<()> {
        let parent = self.resolve(target)?;
        let children = self.check_nodes(nodes)?;
        let mut tree = self.nodes.borrow_mut();

        std::mem::take(&mut tree[parent].children)
            .into_iter()
            .for_each(|child| tree[child].parent = None);

        Self::insert(&mut tree, parent, None, &children)?;

        Ok(())
    }

    fn toggle(&self, target: &Target, visible: bool) -> Result<()> {
        let index = self.resolve(target)?;
        self.nodes.borrow_mut()[index].visible = visible;

        Ok(())
    }
}
