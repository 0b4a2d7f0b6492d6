use std::collections::HashMap;

use super::GfxError;

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
        pub struct $name(pub(crate) u32);
    };
}

handle!(
    /// A vertex attribute or index buffer.
    BufferHandle
);
handle!(
    /// One compiled shader stage.
    ShaderHandle
);
handle!(
    /// A linked vertex + fragment program.
    ProgramHandle
);
handle!(
    /// A sampled 2D texture.
    TextureHandle
);

/// Id-keyed storage for one kind of context object.
///
/// Ids start at 1 and are never reused within a table.
#[derive(Debug)]
pub(crate) struct HandleTable<T> {
    kind: &'static str,
    next: u32,
    items: HashMap<u32, T>,
}

impl<T> HandleTable<T> {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            next: 1,
            items: HashMap::new(),
        }
    }

    pub fn insert(&mut self, item: T) -> u32 {
        let id = self.next;
        self.next += 1;
        self.items.insert(id, item);
        id
    }

    pub fn get(&self, id: u32) -> Result<&T, GfxError> {
        self.items.get(&id).ok_or(GfxError::UnknownHandle { kind: self.kind, id })
    }

    pub fn get_mut(&mut self, id: u32) -> Result<&mut T, GfxError> {
        let kind = self.kind;
        self.items.get_mut(&id).ok_or(GfxError::UnknownHandle { kind, id })
    }

    pub fn remove(&mut self, id: u32) -> Result<T, GfxError> {
        self.items.remove(&id).ok_or(GfxError::UnknownHandle { kind: self.kind, id })
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.items.len()
    }
}
