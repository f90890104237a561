use std::any::Any;

use super::{AddOptions, Outlet};
use crate::{error::Result, renderable::Renderable};

/// The outlet capability. Types holding an [`Outlet`] implement [`HasOutlet::outlet()`] and get
/// the content operations for free, delegating to the held outlet.
pub trait HasOutlet {
    fn outlet(&self) -> &Outlet;

    fn add(&self, renderable: Renderable, options: AddOptions) -> Result<()> {
        self.outlet().add(renderable, options)
    }

    fn remove(&self, renderable: Renderable) -> Result<bool> {
        self.outlet().remove(renderable)
    }

    fn reorder(&self, order: &[Renderable]) -> Result<()> {
        self.outlet().reorder(order)
    }

    fn reset(&self) -> Result<()> {
        self.outlet().reset()
    }

    fn at(&self, index: usize) -> Option<Renderable> {
        self.outlet().at(index)
    }

    fn show(&self, index: Option<usize>, context: Option<&dyn Any>) -> Result<()> {
        self.outlet().show(index, context)
    }

    fn hide(&self, index: Option<usize>, context: Option<&dyn Any>) -> Result<()> {
        self.outlet().hide(index, context)
    }

    fn len(&self) -> usize {
        self.outlet().len()
    }

    fn is_empty(&self) -> bool {
        self.outlet().is_empty()
    }
}

impl HasOutlet for Outlet {
    fn outlet(&self) -> &Outlet {
        self
    }
}
