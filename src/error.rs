use thiserror::Error;

/// Errors raised by the surface adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurfaceError {
    /// No element on the surface carries the requested id.
    #[error("no element with id `{0}` on the surface")]
    UnknownTarget(String),

    /// A node handle that the surface never produced (or has since dropped).
    #[error("unknown node handle #{0}")]
    UnknownNode(usize),

    /// The rendering backend refused the operation.
    #[error("surface backend failure: {0}")]
    Backend(String),
}

/// All failures surfaced by outlets, views and the renderable walker.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A structural invariant would be broken by the requested operation.
    #[error("consistency error: {0}")]
    Consistency(String),

    /// `contents` of an outlet was mutated while the same outlet was being traversed.
    #[error("outlet `{id}` mutated during {operation}")]
    Reentrancy { id: String, operation: &'static str },

    /// The renderable cannot perform the requested operation.
    #[error("{kind} renderable has no `{capability}` capability")]
    Capability {
        capability: &'static str,
        kind: &'static str,
    },

    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
