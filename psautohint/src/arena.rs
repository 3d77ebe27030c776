//! Per-glyph storage for path elements and hint records.

use crate::{
    error::HintError,
    path::{ElementIx, HintIx, HintNode, PathElement},
};

/// Default arena capacity in bytes.
pub const DEFAULT_ARENA_CAPACITY: usize = 1_000_000;

/// Bump storage that is emptied in one step when a glyph completes.
///
/// Items are never freed individually; removing an element from a path only
/// unlinks it. Each allocation is charged its in-memory size against the
/// capacity and exceeding the capacity is reported as
/// [`HintError::ArenaExhausted`].
#[derive(Clone, Debug)]
pub(crate) struct Arena {
    elements: Vec<PathElement>,
    hints: Vec<HintNode>,
    used: usize,
    capacity: usize,
}

impl Arena {
    pub fn new(capacity: usize) -> Self {
        Self {
            elements: Vec::new(),
            hints: Vec::new(),
            used: 0,
            capacity,
        }
    }

    pub fn alloc_element(&mut self, element: PathElement) -> Result<ElementIx, HintError> {
        self.charge(core::mem::size_of::<PathElement>())?;
        let ix = ElementIx(self.elements.len() as u32);
        self.elements.push(element);
        Ok(ix)
    }

    pub fn alloc_hint(&mut self, hint: HintNode) -> Result<HintIx, HintError> {
        self.charge(core::mem::size_of::<HintNode>())?;
        let ix = HintIx(self.hints.len() as u32);
        self.hints.push(hint);
        Ok(ix)
    }

    pub fn element(&self, ix: ElementIx) -> &PathElement {
        &self.elements[ix.0 as usize]
    }

    pub fn element_mut(&mut self, ix: ElementIx) -> &mut PathElement {
        &mut self.elements[ix.0 as usize]
    }

    pub fn hint(&self, ix: HintIx) -> &HintNode {
        &self.hints[ix.0 as usize]
    }

    pub fn hint_mut(&mut self, ix: HintIx) -> &mut HintNode {
        &mut self.hints[ix.0 as usize]
    }

    /// Bytes handed out since the last reset.
    pub fn used(&self) -> usize {
        self.used
    }

    /// Releases every item, keeping the allocation for the next glyph.
    pub fn reset(&mut self) {
        self.elements.clear();
        self.hints.clear();
        self.used = 0;
    }

    fn charge(&mut self, bytes: usize) -> Result<(), HintError> {
        let used = self.used.saturating_add(bytes);
        // Indices are 32 bits wide
        if used > self.capacity || self.elements.len().max(self.hints.len()) >= u32::MAX as usize
        {
            return Err(HintError::ArenaExhausted {
                capacity: self.capacity,
            });
        }
        self.used = used;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::ElementKind;
    use bez_types::Point;

    fn element() -> PathElement {
        PathElement::new(ElementKind::LineTo, Point::from_i32(1, 2))
    }

    #[test]
    fn charges_item_size() {
        let mut arena = Arena::new(DEFAULT_ARENA_CAPACITY);
        let first = arena.alloc_element(element()).unwrap();
        let second = arena.alloc_element(element()).unwrap();
        assert_ne!(first, second);
        assert_eq!(arena.element(second).end, Point::from_i32(1, 2));
        assert_eq!(arena.used(), 2 * core::mem::size_of::<PathElement>());
    }

    #[test]
    fn exhaustion_and_reset() {
        let size = core::mem::size_of::<PathElement>();
        let capacity = size * 2 + size / 2;
        let mut arena = Arena::new(capacity);
        arena.alloc_element(element()).unwrap();
        arena.alloc_element(element()).unwrap();
        assert_eq!(
            arena.alloc_element(element()),
            Err(HintError::ArenaExhausted { capacity })
        );
        arena.reset();
        assert_eq!(arena.used(), 0);
        assert_eq!(arena.alloc_element(element()), Ok(ElementIx(0)));
    }
}
