/// Cursor over a scene's arrow positions.
///
/// The index is always in `[0, len)` and wraps at both ends. An empty menu has no selection and
/// ignores moves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ArrowMenu {
    len: usize,
    index: usize,
}

impl ArrowMenu {
    pub fn new(len: usize) -> Self {
        Self { len, index: 0 }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn reset(&mut self) {
        self.index = 0;
    }

    pub fn move_up(&mut self) -> Option<usize> {
        if self.len == 0 {
            return None;
        }
        self.index = (self.index + self.len - 1) % self.len;
        Some(self.index)
    }

    pub fn move_down(&mut self) -> Option<usize> {
        if self.len == 0 {
            return None;
        }
        self.index = (self.index + 1) % self.len;
        Some(self.index)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/menu.rs"]
mod tests;
