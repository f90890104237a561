mod base;
mod binding;
mod placeholder;

use std::{any::Any, rc::Rc};

pub use base::ViewBase;
pub use binding::{same_model, Bindings, Model, ModelHandler, ModelRef};
pub use placeholder::Placeholder;

#[cfg(test)]
pub(crate) use binding::tests::RecordingModel;

use crate::{
    error::{Error, Result},
    event::{Emitter, Event},
    surface::NodeHandle,
};

/// A stateful renderable. Views own their visual result, and take part in the lifecycle driven by
/// whatever outlet or tree currently holds them.
pub trait View {
    /// The id of the view's element on the surface.
    fn id(&self) -> &str;

    fn emitter(&self) -> &Emitter;

    /// Produce the visual result. Repeated calls return the cached result without emitting.
    fn render(&self) -> Result<NodeHandle>;

    /// Notify the view that its visual result is now part of the live surface.
    fn attach(&self) -> Result<()>;

    /// Notify the view that its visual result left the live surface.
    fn detach(&self) -> Result<()>;

    /// Show or hide the view. `context` is passed through untouched for views that need it.
    fn toggle(&self, visible: bool, context: Option<&dyn Any>) -> Result<()>;

    /// Release the view's resources and remove it from the surface.
    fn destroy(&self) -> Result<()>;

    /// Bind a model into the view. Only views used as collection children need this.
    fn bind(&self, _model: &ModelRef) -> Result<()> {
        Err(Error::Capability {
            capability: "bind",
            kind: "view",
        })
    }

    fn emit(&self, event: &Event) -> usize {
        self.emitter().emit(event)
    }
}

pub type ViewRef = Rc<dyn View>;

/// Whether both references point at the same view instance.
pub fn same_view(a: &ViewRef, b: &ViewRef) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}
