use std::cell::Cell;

/// Produces unique identifiers for anonymous surface elements, eg `v1`, `v2`, ...
#[derive(Debug)]
pub struct IdGenerator {
    prefix: String,
    next: Cell<usize>,
}

impl IdGenerator {
    pub fn new<S>(prefix: S) -> Self
    where
        S: AsRef<str>,
    {
        Self {
            prefix: prefix.as_ref().to_string(),
            next: Cell::new(1),
        }
    }

    /// Returns the next identifier. Never repeats for the lifetime of the generator.
    pub fn next_id(&self) -> String {
        let id = self.next.get();
        self.next.set(id + 1);

        format!("{}{id}", self.prefix)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new("v")
    }
}
