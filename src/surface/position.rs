use super::{NodeHandle, Surface, Target};
use crate::error::Result;

/// Possible places nodes can be inserted at on a [`Surface`].
#[derive(Clone, Debug)]
pub enum Position {
    /// Insert as the last children of the target.
    Append(Target),

    /// Insert as siblings immediately before the target.
    Before(Target),

    /// Replace all children of the target.
    Replace(Target),

    /// The container is not on the surface yet. Do not insert.
    None,
}

impl Position {
    /// Insert `nodes` at this position. Returns whether anything touched the surface.
    pub fn insert(&self, surface: &dyn Surface, nodes: &[NodeHandle]) -> Result<bool> {
        use Position::*;

        match self {
            Append(target) => surface.append(target, nodes)?,
            Before(target) => surface.before(target, nodes)?,
            Replace(target) => surface.update(target, nodes)?,
            None => return Ok(false),
        }

        Ok(true)
    }

    pub fn target(&self) -> Option<&Target> {
        use Position::*;

        match self {
            Append(target) | Before(target) | Replace(target) => Some(target),
            None => Option::None,
        }
    }
}
