/// A region over a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span<'a> {
    pub s: &'a str,
    pub start: usize,
    pub end: usize,
}

impl<'a> Span<'a> {
    pub fn as_str(&self) -> &'a str {
        &self.s[self.start..self.end]
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Check if this span contains the entirety of the other span. Both spans
    /// should be referencing the same input.
    pub fn contains(&self, other: &Self) -> bool {
        std::ptr::eq(self.s, other.s) && self.start <= other.start && self.end >= other.end
    }
}
