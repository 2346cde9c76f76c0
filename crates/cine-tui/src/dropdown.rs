//! Suggestion dropdown: open/closed plus the keyboard highlight.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DropdownState {
    #[default]
    Closed,
    Open { highlight: Option<usize> },
}

#[derive(Debug, Default)]
pub struct Dropdown {
    state: DropdownState,
    len: usize,
}

impl Dropdown {
    #[cfg(test)]
    pub fn state(&self) -> DropdownState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, DropdownState::Open { .. })
    }

    pub fn highlight(&self) -> Option<usize> {
        match self.state {
            DropdownState::Open { highlight } => highlight,
            DropdownState::Closed => None,
        }
    }

    /// Open over `len` rows with no highlight. Zero rows closes instead.
    pub fn open(&mut self, len: usize) {
        self.len = len;
        self.state = if len == 0 {
            DropdownState::Closed
        } else {
            DropdownState::Open { highlight: None }
        };
    }

    pub fn close(&mut self) {
        self.state = DropdownState::Closed;
    }

    pub fn highlight_next(&mut self) {
        if let DropdownState::Open { highlight } = &mut self.state {
            *highlight = Some(match *highlight {
                Some(i) if i + 1 < self.len => i + 1,
                _ => 0,
            });
        }
    }

    pub fn highlight_prev(&mut self) {
        if let DropdownState::Open { highlight } = &mut self.state {
            *highlight = Some(match *highlight {
                Some(i) if i > 0 => i - 1,
                _ => self.len - 1,
            });
        }
    }

    /// Pointer hover moves the highlight without any other effect.
    pub fn hover(&mut self, index: usize) {
        if let DropdownState::Open { highlight } = &mut self.state {
            if index < self.len {
                *highlight = Some(index);
            }
        }
    }

    /// Close and return `index` if it names a visible row.
    pub fn pick(&mut self, index: usize) -> Option<usize> {
        if !self.is_open() || index >= self.len {
            return None;
        }
        self.close();
        Some(index)
    }
}
