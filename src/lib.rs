//! A view-tree rendering layer: compose markup, element descriptors, sequences, outlets and views
//! into one element, and carry render, attach, visibility and destroy notifications through the
//! composition however deeply it nests.

pub mod collection;
pub mod error;
pub mod event;
pub mod outlet;
pub mod renderable;
pub mod surface;
pub mod util;
pub mod view;

pub use collection::{
    CollectionBinding, CollectionChange, CollectionHooks, CollectionView, NoHooks,
    RemoveBoundViews,
};
pub use error::{Error, Result, SurfaceError};
pub use event::{Emitter, Event, EventKind, ListenerId};
pub use outlet::{AddOptions, HasOutlet, Outlet, OutletBuilder, OutletOptions, State};
pub use renderable::{mount, tag, unmount, Renderable, TagDescriptor};
pub use surface::{Attributes, MemorySurface, NodeHandle, Position, Surface, SurfaceRef, Target};
pub use view::{Model, ModelRef, Placeholder, View, ViewBase, ViewRef};

/// Build a sequence [`Renderable`] from items convertible into renderables.
///
/// ```
/// # use viewtree::{content, tag, Attributes, Renderable};
/// let content = content!["<div>a</div>", tag("h1", Attributes::new(), "Foo")];
/// assert_eq!(content.kind(), "list");
/// ```
#[macro_export]
macro_rules! content {
    ($($item:expr),* $(,)?) => {
        $crate::Renderable::list(vec![$($crate::Renderable::from($item)),*])
    };
}

#[cfg(target_arch = "wasm32")]
mod start {
    use std::rc::Rc;

    use wasm_bindgen::prelude::*;
    use web_sys::window;

    use crate::{
        surface::{ConsoleLogger, DomSurface},
        AddOptions, Outlet, Placeholder, SurfaceRef,
    };

    #[wasm_bindgen(start)]
    pub fn main() -> Result<(), JsValue> {
        // Configure the panic hook to log to console.error
        std::panic::set_hook(Box::new(console_error_panic_hook::hook));
        ConsoleLogger::init(log::LevelFilter::Debug)
            .map_err(|e| JsValue::from(e.to_string()))?;

        let document = window()
            .and_then(|window| window.document())
            .ok_or_else(|| JsValue::from("no document on window"))?;
        let to_js = |e: crate::Error| JsValue::from(e.to_string());

        let dom = Rc::new(DomSurface::new(&document));
        let body = dom.body().map_err(to_js)?;
        let surface = dom as SurfaceRef;

        let list = Outlet::build(&surface)
            .tag("section")
            .content("<h1>viewtree</h1>")
            .build();
        for text in ["first", "third"] {
            list.push(Placeholder::new(&surface, text)).map_err(to_js)?;
        }

        // Mount in the body, then keep mutating the live element
        crate::mount(&*surface, body, &(&list).into()).map_err(to_js)?;
        list.add(Placeholder::new(&surface, "second"), AddOptions::at(1))
            .map_err(to_js)?;
        list.hide(Some(2), None).map_err(to_js)?;

        Ok(())
    }
}
