use std::rc::Rc;

use super::Renderable;
use crate::surface::Attributes;

/// Describes an element to create: tag name, attributes, and nested content.
#[derive(Clone)]
pub struct TagDescriptor {
    name: String,
    attributes: Attributes,
    content: Renderable,
}

impl TagDescriptor {
    pub fn new<S>(name: S) -> Self
    where
        S: AsRef<str>,
    {
        Self {
            name: name.as_ref().to_string(),
            attributes: Attributes::new(),
            content: Renderable::empty(),
        }
    }

    pub fn with_attribute<K, V>(mut self, name: K, value: V) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.attributes
            .insert(name.as_ref().to_string(), value.as_ref().to_string());
        self
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes.extend(attributes);
        self
    }

    pub fn with_content<C>(mut self, content: C) -> Self
    where
        C: Into<Renderable>,
    {
        self.content = content.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn content(&self) -> &Renderable {
        &self.content
    }

    /// The `id` attribute, which makes the element addressable on the surface.
    pub fn id(&self) -> Option<&str> {
        self.attributes.get("id").map(String::as_str)
    }
}

/// Shorthand for a [`Renderable::Tag`].
pub fn tag<N, C>(name: N, attributes: Attributes, content: C) -> Renderable
where
    N: AsRef<str>,
    C: Into<Renderable>,
{
    Renderable::Tag(Rc::new(
        TagDescriptor::new(name)
            .with_attributes(attributes)
            .with_content(content),
    ))
}
