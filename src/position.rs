use crate::span::Span;

/// Keep track of a position within a str, updating as input is consumed.
#[derive(Debug, Clone)]
pub struct Position<'a> {
    pub input: &'a str,
    pub idx: usize,
}

impl<'a> Position<'a> {
    /// Create a new cursor, ensuring that `start` is within bounds and on a
    /// char boundary.
    pub fn new(input: &'a str, start: usize) -> Option<Self> {
        if input.is_char_boundary(start) {
            Some(Position { input, idx: start })
        } else {
            None
        }
    }

    /// The unconsumed part of the input.
    pub fn rest(&self) -> &'a str {
        &self.input[self.idx..]
    }

    pub fn is_eof(&self) -> bool {
        self.idx >= self.input.len()
    }

    /// Check if a string matches the current input starting at the current
    /// index. The index will be updated on match.
    pub fn match_str(&mut self, s: &str) -> bool {
        let end = self.idx + s.len();
        if self.input.get(self.idx..end) == Some(s) {
            self.idx = end;
            true
        } else {
            false
        }
    }

    /// Move the cursor to the start of `rest`, which must be a suffix of the
    /// input (as returned by a nom parser run on `self.rest()`).
    pub fn advance_to(&mut self, rest: &'a str) {
        debug_assert!(rest.len() <= self.input.len() - self.idx);
        self.idx = self.input.len() - rest.len();
    }

    /// Span from byte `start` up to the current index.
    pub fn span_from(&self, start: usize) -> Span<'a> {
        Span {
            s: self.input,
            start,
            end: self.idx,
        }
    }

    /// 1-based line and column of the current index. Columns count chars,
    /// not bytes.
    pub fn line_col(&self) -> (usize, usize) {
        let before = &self.input[..self.idx];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let col = before[line_start..].chars().count() + 1;
        (line, col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_match_str_simple() {
        let tests = vec![
            ("", 0, "", true),
            ("pub", 0, "mod", false),
            ("pub", 0, "pub", true),
            ("pub", 0, "ub", false),
            ("pub", 1, "ub", true),
        ];
        for test in tests {
            let mut c = Position::new(test.0, test.1).unwrap();
            let got = c.match_str(test.2);
            assert_eq!(got, test.3, "test case: {:?}", test);
        }
    }

    #[test]
    fn position_match_str_idx_multiple() {
        let mut c = Position::new("mod m", 0).unwrap();
        let got1 = c.match_str("mo");
        let got2 = c.match_str("d");
        assert!(got1);
        assert!(got2, "cursor: {:?}", c);
        assert_eq!(c.rest(), " m");
    }

    #[test]
    fn position_rejects_out_of_bounds() {
        assert!(Position::new("abc", 4).is_none());
        assert!(Position::new("é", 1).is_none());
        assert!(Position::new("abc", 3).unwrap().is_eof());
    }

    #[test]
    fn position_advance_to() {
        let input = "foo = bar";
        let mut c = Position::new(input, 0).unwrap();
        c.advance_to(&input[4..]);
        assert_eq!(c.idx, 4);
        assert_eq!(c.rest(), "= bar");

        c.match_str("= ");
        assert_eq!(c.span_from(4).as_str(), "= ");
    }

    #[test]
    fn position_line_col() {
        let input = "a = b\n  c = \"é\" d\n";
        let tests = vec![(0, (1, 1)), (4, (1, 5)), (6, (2, 1)), (8, (2, 3)), (15, (2, 9))];
        for (idx, expected) in tests {
            let c = Position::new(input, idx).unwrap();
            assert_eq!(c.line_col(), expected, "idx: {}", idx);
        }
    }
}
