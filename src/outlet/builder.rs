use std::rc::Rc;

use super::Outlet;
use crate::{
    renderable::Renderable,
    surface::{Attributes, SurfaceRef},
};

/// Behaviour switches for an [`Outlet`], fixed at construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutletOptions {
    /// Removing a renderable the outlet does not hold fails with [`crate::Error::Consistency`]
    /// instead of being ignored.
    pub strict: bool,
}

/// Builder for an [`Outlet`].
pub struct OutletBuilder {
    surface: SurfaceRef,
    tag_name: String,
    attributes: Attributes,
    content: Renderable,
    options: OutletOptions,
}

impl OutletBuilder {
    /// Create a new builder. Without further configuration, builds an empty `div`.
    pub fn new(surface: &SurfaceRef) -> Self {
        Self {
            surface: Rc::clone(surface),
            tag_name: "div".to_string(),
            attributes: Attributes::new(),
            content: Renderable::empty(),
            options: OutletOptions::default(),
        }
    }

    /// Name of the wrapping element.
    pub fn tag<S>(mut self, tag_name: S) -> Self
    where
        S: AsRef<str>,
    {
        self.tag_name = tag_name.as_ref().to_string();
        self
    }

    pub fn attribute<K, V>(mut self, name: K, value: V) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.attributes
            .insert(name.as_ref().to_string(), value.as_ref().to_string());
        self
    }

    pub fn attributes(mut self, attributes: Attributes) -> Self {
        self.attributes.extend(attributes);
        self
    }

    /// Fix the outlet id instead of generating one.
    pub fn id<S>(self, id: S) -> Self
    where
        S: AsRef<str>,
    {
        self.attribute("id", id)
    }

    /// Content rendered before the held renderables.
    pub fn content<C>(mut self, content: C) -> Self
    where
        C: Into<Renderable>,
    {
        self.content = content.into();
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.options.strict = strict;
        self
    }

    pub fn options(mut self, options: OutletOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> Outlet {
        Outlet::with_options(
            &self.surface,
            self.tag_name,
            self.attributes,
            self.content,
            self.options,
        )
    }
}
